//! Keyboard shortcut mapping.
//!
//! Maps `KeyboardEvent.key` + modifiers to semantic `ShortcutAction`s. The
//! map lives in Rust so the wasm bridge and native tests share it.

use crate::input::Modifiers;
use crate::tools::ToolKind;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Tool switching ──
    Tool(ToolKind),

    // ── Edit ──
    Undo,
    Redo,
    Delete,
    SelectAll,
    /// Cancel pending connection, clear selection.
    Escape,
    /// Move the selection by one unit (or one grid cell when `coarse`).
    Nudge { dx: i8, dy: i8, coarse: bool },

    // ── View ──
    ZoomIn,
    ZoomOut,
    ZoomReset,
    ZoomToFit,
    ToggleGrid,
    ToggleSnap,
    /// Space pressed: left drag pans until released.
    PanStart,
}

fn arrow(key: &str) -> Option<(i8, i8)> {
    match key {
        "ArrowLeft" => Some((-1, 0)),
        "ArrowRight" => Some((1, 0)),
        "ArrowUp" => Some((0, -1)),
        "ArrowDown" => Some((0, 1)),
        _ => None,
    }
}

pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action, or `None` if unbound.
    pub fn resolve(key: &str, modifiers: &Modifiers) -> Option<ShortcutAction> {
        let cmd = modifiers.command();
        let shift = modifiers.shift;

        // Arrows nudge whatever else is held; Shift picks the coarse step.
        if !cmd && let Some((dx, dy)) = arrow(key) {
            return Some(ShortcutAction::Nudge {
                dx,
                dy,
                coarse: shift,
            });
        }

        // ── Modifier combos first (most specific) ──
        if cmd && shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                "+" | "=" => Some(ShortcutAction::ZoomIn),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "a" | "A" => Some(ShortcutAction::SelectAll),
                "=" | "+" => Some(ShortcutAction::ZoomIn),
                "-" => Some(ShortcutAction::ZoomOut),
                "0" => Some(ShortcutAction::ZoomReset),
                "1" => Some(ShortcutAction::ZoomToFit),
                _ => None,
            };
        }

        if shift {
            return match key {
                "g" | "G" => Some(ShortcutAction::ToggleSnap),
                "+" => Some(ShortcutAction::ZoomIn),
                _ => None,
            };
        }

        // ── Single keys (no modifiers) ──
        match key {
            "v" | "V" => Some(ShortcutAction::Tool(ToolKind::Select)),
            "c" | "C" => Some(ShortcutAction::Tool(ToolKind::Connect)),
            "l" | "L" => Some(ShortcutAction::Tool(ToolKind::Connector)),
            "p" | "P" => Some(ShortcutAction::Tool(ToolKind::Pen)),
            "h" | "H" => Some(ShortcutAction::Tool(ToolKind::Hand)),
            "g" | "G" => Some(ShortcutAction::ToggleGrid),
            "+" | "=" => Some(ShortcutAction::ZoomIn),
            "-" => Some(ShortcutAction::ZoomOut),
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Escape),
            " " => Some(ShortcutAction::PanStart),
            _ => None,
        }
    }
}
