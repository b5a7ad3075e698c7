//! WASM bridge for FoF: exposes the canvas editor to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. The page forwards DOM
//! pointer, wheel and keyboard events together with `performance.now()`,
//! calls `animation_frame` from `requestAnimationFrame`, and redraws
//! whenever a call reports a change.

mod props;
mod render2d;
mod storage;

use fof_core::id::{EdgeId, NodeId};
use fof_core::layout::{LaneGrouping, LayoutSettings};
use fof_core::model::EntityKind;
use fof_core::viewport::ContainerRect;
use fof_editor::input::{InputEvent, Modifiers, PointerButton};
use fof_editor::shortcuts::{ShortcutAction, ShortcutMap};
use fof_editor::{Editor, HistoryConfig, InspectorTarget, SaveStatus, ToolKind};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

pub use render2d::CanvasPalette;
pub use storage::{DEFAULT_STORAGE_KEY, LocalStorageStore};

/// Result of a pointer-up or key event, serialized for the webview.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventResult<'a> {
    changed: bool,
    tool: &'a str,
    tool_switched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct SelectionJson {
    nodes: Vec<String>,
    edge: Option<String>,
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        log::warn!("response serialization failed: {e}");
        "null".to_string()
    })
}

fn modifiers(shift: bool, ctrl: bool, alt: bool, meta: bool) -> Modifiers {
    Modifiers { shift, ctrl, alt, meta }
}

/// The main WASM-facing canvas controller.
///
/// Owns the editor (document, history, canvas engine) and the canvas size.
/// All interaction from the page goes through this struct.
#[wasm_bindgen]
pub struct FofCanvas {
    editor: Editor,
    width: f64,
    height: f64,
    palette: CanvasPalette,
}

#[wasm_bindgen]
impl FofCanvas {
    /// Create a canvas controller for a container at `(left, top)`.
    ///
    /// Restores the last saved diagram from `localStorage` when there is
    /// one, otherwise starts from the starter diagram.
    #[wasm_bindgen(constructor)]
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        console_error_panic_hook_setup();

        let rect = ContainerRect::new(left as f32, top as f32, width as f32, height as f32);
        let mut editor = Editor::with_config(
            fof_core::starter::starter_diagram(),
            HistoryConfig::default(),
            rect,
        );
        if let Some(store) = LocalStorageStore::open(DEFAULT_STORAGE_KEY) {
            editor.attach_store(Box::new(store));
            editor.load();
        }
        Self {
            editor,
            width,
            height,
            palette: CanvasPalette::default(),
        }
    }

    /// Render the canvas to a Canvas2D context.
    pub fn render(&self, ctx: &CanvasRenderingContext2d) {
        render2d::render_scene(ctx, &self.editor, self.width, self.height, &self.palette);
    }

    /// The container moved or resized.
    pub fn resize(&mut self, left: f64, top: f64, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.editor
            .resize(ContainerRect::new(left as f32, top as f32, width as f32, height as f32));
    }

    // ─── Pointer / wheel ─────────────────────────────────────────────────

    /// Handle pointer down (`button` is `PointerEvent.button`). Returns true
    /// if the canvas needs a redraw.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_down(
        &mut self,
        x: f32,
        y: f32,
        button: i16,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
        time_ms: f64,
    ) -> bool {
        let event = InputEvent::from_pointer_down(
            x,
            y,
            PointerButton::from_dom(button),
            modifiers(shift, ctrl, alt, meta),
        );
        self.editor.handle(&event, time_ms)
    }

    /// Handle pointer move. Returns true if the canvas needs a redraw.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_move(
        &mut self,
        x: f32,
        y: f32,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
        time_ms: f64,
    ) -> bool {
        let event = InputEvent::from_pointer_move(x, y, modifiers(shift, ctrl, alt, meta));
        self.editor.handle(&event, time_ms)
    }

    /// Handle pointer up. Returns a JSON string:
    /// `{"changed":bool, "tool":"<name>", "toolSwitched":bool}`
    ///
    /// The connector tool hands back to select once a connector is drawn.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_up(
        &mut self,
        x: f32,
        y: f32,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
        time_ms: f64,
    ) -> String {
        let before = self.editor.session().tool;
        let event = InputEvent::from_pointer_up(x, y, modifiers(shift, ctrl, alt, meta));
        let changed = self.editor.handle(&event, time_ms);
        let tool = self.editor.session().tool;
        to_json(&EventResult {
            changed,
            tool: tool.name(),
            tool_switched: tool != before,
            action: None,
        })
    }

    /// Wheel / trackpad scroll. Ctrl or Cmd zooms around the pointer.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_wheel(&mut self, x: f32, y: f32, dx: f32, dy: f32, ctrl: bool, meta: bool, time_ms: f64) -> bool {
        let event = InputEvent::Wheel {
            x,
            y,
            dx,
            dy,
            modifiers: modifiers(false, ctrl, false, meta),
        };
        self.editor.handle(&event, time_ms)
    }

    /// Call once per `requestAnimationFrame`. Commits coalesced drag
    /// positions; returns true if the diagram changed.
    pub fn animation_frame(&mut self, time_ms: f64) -> bool {
        self.editor.animation_frame(time_ms)
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    /// Handle a keyboard event. Returns a JSON string:
    /// `{"changed":bool, "action":"<name>", "tool":"<name>", "toolSwitched":bool}`
    pub fn handle_key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool, time_ms: f64) -> String {
        let mods = modifiers(shift, ctrl, alt, meta);
        let before = self.editor.session().tool;
        let action = ShortcutMap::resolve(key, &mods).map(action_to_name);
        let changed = self.editor.handle(&InputEvent::key_down(key, mods), time_ms);
        let tool = self.editor.session().tool;
        to_json(&EventResult {
            changed,
            tool: tool.name(),
            tool_switched: tool != before,
            action: Some(action.unwrap_or("none")),
        })
    }

    pub fn handle_key_up(&mut self, key: &str, time_ms: f64) {
        self.editor.handle(&InputEvent::KeyUp { key: key.to_string() }, time_ms);
    }

    // ─── Tools & commands ────────────────────────────────────────────────

    /// Switch the active tool by name. Unknown names select.
    pub fn set_tool(&mut self, name: &str, time_ms: f64) -> bool {
        let tool = ToolKind::from_name(name).unwrap_or_default();
        self.editor.set_tool(tool, time_ms)
    }

    pub fn get_tool_name(&self) -> String {
        self.editor.session().tool.name().to_string()
    }

    pub fn undo(&mut self) -> bool {
        self.editor.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.editor.redo()
    }

    pub fn can_undo(&self) -> bool {
        self.editor.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.editor.can_redo()
    }

    pub fn delete_selected(&mut self, time_ms: f64) -> bool {
        self.editor.delete_selection(time_ms)
    }

    pub fn select_all(&mut self) -> bool {
        self.editor.select_all()
    }

    /// Palette drop: create an entity of `kind` (wire name, e.g.
    /// `"sponsorBank"`) centred on the client point. Returns the new node
    /// id, or an empty string if nothing was created.
    pub fn drop_entity(&mut self, kind: &str, x: f32, y: f32, time_ms: f64) -> String {
        let kind = EntityKind::from_wire(kind).unwrap_or_default();
        self.editor
            .drop_entity(kind, x, y, time_ms)
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    // ─── Selection & inspector ───────────────────────────────────────────

    /// `{"nodes":["id",…], "edge":"id"|null}`
    pub fn get_selection_json(&self) -> String {
        let selection = self.editor.selection();
        to_json(&SelectionJson {
            nodes: selection.nodes().map(|id| id.as_str().to_string()).collect(),
            edge: selection.edge().map(|id| id.as_str().to_string()),
        })
    }

    /// The entity shown in the inspector, serialized in wire format, or
    /// `null` when nothing is inspected.
    pub fn get_inspected_json(&self) -> String {
        let diagram = self.editor.diagram();
        match self.editor.selection().inspector() {
            Some(InspectorTarget::Node(id)) => diagram.node(id).map(to_json),
            Some(InspectorTarget::Edge(id)) => diagram.edge(id).map(to_json),
            None => None,
        }
        .unwrap_or_else(|| "null".to_string())
    }

    /// Inspector edit of a node field. `value` is JSON text.
    pub fn set_node_prop(&mut self, node_id: &str, key: &str, value: &str, time_ms: f64) -> bool {
        let Ok(value) = serde_json::from_str(value) else {
            log::warn!("node prop {key}: value is not JSON");
            return false;
        };
        let Some(field) = props::node_field(key, &value) else {
            log::warn!("node prop {key}: unsupported value {value}");
            return false;
        };
        self.editor
            .set_node_field(NodeId::intern(node_id), field, time_ms)
            .unwrap_or(false)
    }

    /// Inspector edit of an edge field. `value` is JSON text.
    pub fn set_edge_prop(&mut self, edge_id: &str, key: &str, value: &str, time_ms: f64) -> bool {
        let Ok(value) = serde_json::from_str(value) else {
            log::warn!("edge prop {key}: value is not JSON");
            return false;
        };
        let Some(field) = props::edge_field(key, &value) else {
            log::warn!("edge prop {key}: unsupported value {value}");
            return false;
        };
        self.editor
            .set_edge_field(EdgeId::intern(edge_id), field, time_ms)
            .unwrap_or(false)
    }

    // ─── View ────────────────────────────────────────────────────────────

    /// Keyboard-style zoom around the container centre.
    pub fn zoom_in(&mut self) -> bool {
        self.editor.handle(&InputEvent::key_down("+", Modifiers::NONE), 0.0)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.editor.handle(&InputEvent::key_down("-", Modifiers::NONE), 0.0)
    }

    pub fn fit_to_content(&mut self) -> bool {
        self.editor.fit_to_content()
    }

    pub fn get_zoom(&self) -> f32 {
        self.editor.viewport().zoom()
    }

    /// Grid and swimlane settings from the toolbar.
    pub fn set_layout(&mut self, grid_visible: bool, snap: bool, grid_size: f32, lanes: bool, lane_height: f32) {
        let mut layout: LayoutSettings = self.editor.session().layout();
        layout.grid.visible = grid_visible;
        layout.grid.snap = snap;
        if grid_size > 0.0 {
            layout.grid.size = grid_size;
        }
        layout.swimlanes.grouping = if lanes {
            LaneGrouping::Manual
        } else {
            LaneGrouping::Off
        };
        if lane_height > 0.0 {
            layout.swimlanes.lane_height = lane_height;
        }
        self.editor.set_layout(layout);
    }

    // ─── Import / export / persistence ───────────────────────────────────

    /// Import an envelope. Returns `{"ok":true,"fallbacks":n,…}` or
    /// `{"ok":false,"error":"…"}`; on error the diagram is unchanged.
    pub fn import_json(&mut self, text: &str, time_ms: f64) -> String {
        match self.editor.import_json(text, time_ms) {
            Ok(report) => serde_json::json!({
                "ok": true,
                "fallbacks": report.fallbacks,
                "droppedNodes": report.dropped_nodes,
                "droppedEdges": report.dropped_edges,
                "droppedDrawings": report.dropped_drawings,
                "prunedHandles": report.pruned_handles,
            })
            .to_string(),
            Err(e) => serde_json::json!({ "ok": false, "error": e.to_string() }).to_string(),
        }
    }

    /// Current diagram as a versioned envelope, or an empty string on
    /// failure.
    pub fn export_json(&self) -> String {
        self.editor.export_json().unwrap_or_else(|e| {
            log::warn!("export failed: {e}");
            String::new()
        })
    }

    /// `{"x":…,"y":…,"width":…,"height":…}` for the raster exporter, or
    /// `null` for an empty diagram.
    pub fn export_bounds_json(&self) -> String {
        match self.editor.export_bounds() {
            Some(b) => serde_json::json!({
                "x": b.x,
                "y": b.y,
                "width": b.width,
                "height": b.height,
            })
            .to_string(),
            None => "null".to_string(),
        }
    }

    /// Persist to `localStorage`: `"saved"`, `"notSaved"` or `"noStore"`.
    pub fn save(&mut self) -> String {
        match self.editor.save() {
            SaveStatus::Saved => "saved",
            SaveStatus::NotSaved => "notSaved",
            SaveStatus::NoStore => "noStore",
        }
        .to_string()
    }

    pub fn load(&mut self) -> bool {
        self.editor.load()
    }
}

fn action_to_name(action: ShortcutAction) -> &'static str {
    match action {
        ShortcutAction::Tool(_) => "tool",
        ShortcutAction::Undo => "undo",
        ShortcutAction::Redo => "redo",
        ShortcutAction::Delete => "delete",
        ShortcutAction::SelectAll => "selectAll",
        ShortcutAction::Escape => "escape",
        ShortcutAction::Nudge { .. } => "nudge",
        ShortcutAction::ZoomIn => "zoomIn",
        ShortcutAction::ZoomOut => "zoomOut",
        ShortcutAction::ZoomReset => "zoomReset",
        ShortcutAction::ZoomToFit => "zoomToFit",
        ShortcutAction::ToggleGrid => "toggleGrid",
        ShortcutAction::ToggleSnap => "toggleSnap",
        ShortcutAction::PanStart => "panStart",
    }
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("FoF WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

// ─── Standalone validation (no canvas needed) ────────────────────────────

/// Validate an import envelope without touching any canvas. Returns
/// `{"ok":true,"version":n,"nodes":n,"edges":n}` or
/// `{"ok":false,"error":"…"}`.
#[wasm_bindgen]
pub fn validate(text: &str) -> String {
    match fof_core::interchange::import_json(text) {
        Ok(imported) => serde_json::json!({
            "ok": true,
            "version": imported.version,
            "nodes": imported.diagram.nodes.len(),
            "edges": imported.diagram.edges.len(),
            "clean": imported.report.is_clean(),
        })
        .to_string(),
        Err(e) => serde_json::json!({ "ok": false, "error": e.to_string() }).to_string(),
    }
}
