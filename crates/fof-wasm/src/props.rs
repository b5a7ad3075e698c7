//! Inspector property parsing.
//!
//! The webview sends `(key, value)` pairs where `key` is the camelCase wire
//! name of a field and `value` is a JSON value. Custom metadata entries use
//! `metadata.<name>`; a `null` value removes them.

use fof_core::model::{EntityKind, FlowDirection, LineStyle, NodeShape, PathType, PaymentRail, Port};
use fof_editor::mutation::{EdgeField, NodeField};
use serde_json::Value;

fn string(v: &Value) -> Option<String> {
    v.as_str().map(str::to_string)
}

/// `null` and `""` clear an optional text field.
fn opt_string(v: &Value) -> Option<Option<String>> {
    match v {
        Value::Null => Some(None),
        Value::String(s) if s.is_empty() => Some(None),
        Value::String(s) => Some(Some(s.clone())),
        _ => None,
    }
}

fn number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn opt_number(v: &Value) -> Option<Option<f64>> {
    match v {
        Value::Null => Some(None),
        Value::String(s) if s.trim().is_empty() => Some(None),
        _ => number(v).filter(|n| n.is_finite()).map(Some),
    }
}

fn opt_u32(v: &Value) -> Option<Option<u32>> {
    opt_number(v).map(|n| n.filter(|n| *n >= 0.0).map(|n| n as u32))
}

fn port(v: &Value) -> Option<Port> {
    v.as_u64()
        .and_then(|i| u8::try_from(i).ok())
        .and_then(Port::from_index)
}

fn metadata_key(key: &str) -> Option<&str> {
    key.strip_prefix("metadata.").filter(|k| !k.is_empty())
}

pub fn node_field(key: &str, value: &Value) -> Option<NodeField> {
    if let Some(name) = metadata_key(key) {
        return opt_string(value).map(|v| NodeField::Metadata(name.to_string(), v));
    }
    let field = match key {
        "label" => NodeField::Label(string(value)?),
        "type" => NodeField::Kind(EntityKind::from_wire(value.as_str()?)?),
        "shape" => NodeField::Shape(NodeShape::from_wire(value.as_str()?)?),
        "color" => NodeField::Color(opt_string(value)?),
        "accountType" => NodeField::AccountType(opt_string(value)?),
        "description" => NodeField::Description(opt_string(value)?),
        "width" => NodeField::Width(opt_number(value)?.map(|n| n as f32)),
        "height" => NodeField::Height(opt_number(value)?.map(|n| n as f32)),
        "zIndex" => NodeField::ZIndex(number(value)? as i32),
        "swimlaneId" => NodeField::Swimlane(opt_u32(value)?),
        _ => return None,
    };
    Some(field)
}

pub fn edge_field(key: &str, value: &Value) -> Option<EdgeField> {
    if let Some(name) = metadata_key(key) {
        return opt_string(value).map(|v| EdgeField::Metadata(name.to_string(), v));
    }
    let field = match key {
        "label" => EdgeField::Label(string(value)?),
        "rail" => EdgeField::Rail(PaymentRail::from_wire(value.as_str()?).unwrap_or_default()),
        "direction" => EdgeField::Direction(FlowDirection::from_wire(value.as_str()?)?),
        "style" => EdgeField::Style(LineStyle::from_wire(value.as_str()?)?),
        "pathType" => EdgeField::PathType(PathType::from_wire(value.as_str()?)?),
        "thickness" => EdgeField::Thickness(number(value)? as f32),
        "showArrowHead" => EdgeField::ShowArrowHead(value.as_bool()?),
        "showMidArrow" => EdgeField::ShowMidArrow(value.as_bool()?),
        "curvature" => EdgeField::Curvature(opt_number(value)?.map(|n| n as f32)),
        "sequence" => EdgeField::Sequence(opt_u32(value)?),
        "amount" => EdgeField::Amount(opt_number(value)?),
        "currency" => EdgeField::Currency(opt_string(value)?),
        "isFX" => EdgeField::IsFx(value.as_bool()?),
        "isExceptionPath" => EdgeField::IsExceptionPath(value.as_bool()?),
        "timing" => EdgeField::Timing(opt_string(value)?),
        "notes" => EdgeField::Notes(opt_string(value)?),
        "sourcePortIdx" => EdgeField::SourcePort(port(value)?),
        "targetPortIdx" => EdgeField::TargetPort(port(value)?),
        _ => return None,
    };
    Some(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn node_props() {
        assert_eq!(
            node_field("label", &json!("Sponsor")),
            Some(NodeField::Label("Sponsor".into()))
        );
        assert_eq!(
            node_field("type", &json!("sponsorBank")),
            Some(NodeField::Kind(EntityKind::SponsorBank))
        );
        assert_eq!(node_field("color", &json!("")), Some(NodeField::Color(None)));
        assert_eq!(node_field("width", &json!("240")), Some(NodeField::Width(Some(240.0))));
        assert_eq!(node_field("swimlaneId", &json!(null)), Some(NodeField::Swimlane(None)));
        assert_eq!(node_field("shape", &json!("blob")), None);
        assert_eq!(node_field("position", &json!({"x": 1})), None);
    }

    #[test]
    fn edge_props() {
        assert_eq!(edge_field("amount", &json!(12.5)), Some(EdgeField::Amount(Some(12.5))));
        assert_eq!(edge_field("amount", &json!("")), Some(EdgeField::Amount(None)));
        assert_eq!(edge_field("sequence", &json!(3)), Some(EdgeField::Sequence(Some(3))));
        assert_eq!(edge_field("isFX", &json!(true)), Some(EdgeField::IsFx(true)));
        assert_eq!(edge_field("targetPortIdx", &json!(2)), Some(EdgeField::TargetPort(Port::Bottom)));
        assert_eq!(edge_field("targetPortIdx", &json!(7)), None);
        assert_eq!(edge_field("style", &json!("dashed")), Some(EdgeField::Style(LineStyle::Dashed)));
    }

    #[test]
    fn unknown_rail_falls_back_to_blank() {
        assert_eq!(
            edge_field("rail", &json!("carrier pigeon")),
            Some(EdgeField::Rail(PaymentRail::Blank))
        );
        assert_eq!(edge_field("rail", &json!("ACH")), Some(EdgeField::Rail(PaymentRail::Ach)));
    }

    #[test]
    fn metadata_entries() {
        assert_eq!(
            node_field("metadata.owner", &json!("treasury")),
            Some(NodeField::Metadata("owner".into(), Some("treasury".into())))
        );
        assert_eq!(
            edge_field("metadata.owner", &json!(null)),
            Some(EdgeField::Metadata("owner".into(), None))
        );
        assert_eq!(node_field("metadata.", &json!("x")), None);
    }
}
