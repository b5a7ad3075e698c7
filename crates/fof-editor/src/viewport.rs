//! Pan and zoom controller.
//!
//! Holds the live `ViewportTransform` and the container rect it is measured
//! against. Panning uses raw screen deltas; zooming always preserves the
//! world point under its pivot.

use fof_core::model::{Bounds, Position};
use fof_core::viewport::{ContainerRect, ViewportTransform, screen_to_world, world_to_screen};

/// Wheel zoom factors per notch.
pub const WHEEL_ZOOM_IN: f32 = 1.08;
pub const WHEEL_ZOOM_OUT: f32 = 0.92;
/// Keyboard zoom step.
pub const KEY_ZOOM_STEP: f32 = 1.2;
/// Screen padding around content for fit-to-content.
pub const FIT_PADDING: f32 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct PanStart {
    client: Position,
    origin: ViewportTransform,
}

#[derive(Debug, Clone, Default)]
pub struct ViewportController {
    transform: ViewportTransform,
    rect: ContainerRect,
    pan: Option<PanStart>,
}

impl ViewportController {
    pub fn new(rect: ContainerRect) -> Self {
        Self {
            rect,
            ..Self::default()
        }
    }

    pub fn transform(&self) -> ViewportTransform {
        self.transform
    }

    pub fn set_transform(&mut self, transform: ViewportTransform) {
        self.transform = transform;
    }

    pub fn rect(&self) -> ContainerRect {
        self.rect
    }

    /// Host resized or scrolled the canvas element.
    pub fn set_rect(&mut self, rect: ContainerRect) {
        self.rect = rect;
    }

    pub fn zoom(&self) -> f32 {
        self.transform.zoom
    }

    pub fn to_world(&self, client_x: f32, client_y: f32) -> Position {
        screen_to_world(client_x, client_y, &self.rect, &self.transform)
    }

    pub fn to_screen(&self, world: Position) -> Position {
        world_to_screen(world, &self.rect, &self.transform)
    }

    // ── Pan ──

    pub fn begin_pan(&mut self, client: Position) {
        self.pan = Some(PanStart {
            client,
            origin: self.transform,
        });
    }

    /// Returns false when no pan is in progress.
    pub fn update_pan(&mut self, client: Position) -> bool {
        let Some(start) = self.pan else {
            return false;
        };
        self.transform = start
            .origin
            .panned(client.x - start.client.x, client.y - start.client.y);
        true
    }

    pub fn end_pan(&mut self) -> bool {
        self.pan.take().is_some()
    }

    pub fn is_panning(&self) -> bool {
        self.pan.is_some()
    }

    // ── Zoom ──

    /// Wheel: with the command key, zoom at the pointer; otherwise scroll.
    pub fn wheel(&mut self, client: Position, dx: f32, dy: f32, command: bool) {
        if command {
            let factor = if dy < 0.0 { WHEEL_ZOOM_IN } else { WHEEL_ZOOM_OUT };
            self.zoom_at(client, self.transform.zoom * factor);
        } else {
            self.transform = self.transform.panned(-dx, -dy);
        }
    }

    pub fn zoom_at(&mut self, client_pivot: Position, zoom: f32) {
        self.transform = self.transform.zoomed_at(client_pivot, &self.rect, zoom);
        log::trace!("zoom {:.3}", self.transform.zoom);
    }

    pub fn zoom_in(&mut self) {
        self.zoom_at(self.rect.center(), self.transform.zoom * KEY_ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_at(self.rect.center(), self.transform.zoom / KEY_ZOOM_STEP);
    }

    /// Back to 100 % around the container centre.
    pub fn reset_zoom(&mut self) {
        self.zoom_at(self.rect.center(), 1.0);
    }

    /// Frame `content`; no-op for an empty diagram.
    pub fn fit(&mut self, content: Option<Bounds>) {
        if let Some(bounds) = content {
            self.transform = ViewportTransform::fit(&bounds, &self.rect, FIT_PADDING);
        }
    }
}
