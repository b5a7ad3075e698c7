//! The diagram a fresh canvas opens with.

use crate::id::{EdgeId, NodeId};
use crate::model::{Diagram, Edge, EntityKind, Node, NodeShape, PaymentRail, Port, Position};

/// Customer → Processor → Sponsor Bank, joined left-to-right.
pub fn starter_diagram() -> Diagram {
    let customer = NodeId::intern("starter_customer");
    let processor = NodeId::intern("starter_processor");
    let bank = NodeId::intern("starter_sponsor_bank");

    let mut bank_node = Node::new(
        bank,
        EntityKind::SponsorBank,
        "Sponsor Bank",
        Position::new(680.0, 120.0),
    )
    .with_shape(NodeShape::Cylinder);
    bank_node.account_type = Some("FBO".into());

    let mut card = Edge::new(
        EdgeId::intern("starter_card"),
        customer,
        Port::Right,
        processor,
        Port::Left,
    );
    card.rail = PaymentRail::Card;
    card.label = "Card payment".into();
    card.sequence = Some(1);

    let mut settle = Edge::new(
        EdgeId::intern("starter_settlement"),
        processor,
        Port::Right,
        bank,
        Port::Left,
    );
    settle.rail = PaymentRail::Ach;
    settle.label = "Settlement".into();
    settle.sequence = Some(2);

    Diagram {
        nodes: vec![
            Node::new(customer, EntityKind::Customer, "Customer", Position::new(80.0, 120.0))
                .with_shape(NodeShape::RoundedRect),
            Node::new(processor, EntityKind::Processor, "Processor", Position::new(380.0, 120.0)),
            bank_node,
        ],
        edges: vec![card, settle],
        drawings: Vec::new(),
    }
}
