//! Screen ⟷ world coordinate transform.
//!
//! The world layer is rendered with `translate(x, y) scale(zoom)` inside the
//! canvas container, so `screen = world * zoom + (x, y) + container origin`.
//! Every pointer-driven feature converts through `screen_to_world`.

use crate::model::{Bounds, Position};
use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: f32 = 0.3;
pub const MAX_ZOOM: f32 = 2.5;

pub fn clamp_zoom(zoom: f32) -> f32 {
    if zoom.is_nan() {
        return 1.0;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Client-space rectangle of the canvas container (a DOMRect).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ContainerRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Center of the container in client coordinates.
    pub fn center(&self) -> Position {
        Position::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }
}

impl Default for ContainerRect {
    fn default() -> Self {
        Self::new(0.0, 0.0, 800.0, 600.0)
    }
}

/// Affine world → screen map: translate `(x, y)` then uniform `zoom`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportTransform {
    pub x: f32,
    pub y: f32,
    pub zoom: f32,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

impl ViewportTransform {
    pub fn new(x: f32, y: f32, zoom: f32) -> Self {
        Self {
            x,
            y,
            zoom: clamp_zoom(zoom),
        }
    }

    /// Zoom to `new_zoom` (clamped) keeping the world point under the
    /// client point `pivot` fixed on screen.
    pub fn zoomed_at(&self, pivot: Position, rect: &ContainerRect, new_zoom: f32) -> Self {
        let world = screen_to_world(pivot.x, pivot.y, rect, self);
        let zoom = clamp_zoom(new_zoom);
        Self {
            x: pivot.x - rect.left - world.x * zoom,
            y: pivot.y - rect.top - world.y * zoom,
            zoom,
        }
    }

    /// Translate by a raw screen-space delta.
    pub fn panned(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            zoom: self.zoom,
        }
    }

    /// Transform that frames `content` inside `rect` with `padding` screen
    /// pixels of margin, zoom clamped to the usual range.
    pub fn fit(content: &Bounds, rect: &ContainerRect, padding: f32) -> Self {
        let avail_w = (rect.width - padding * 2.0).max(1.0);
        let avail_h = (rect.height - padding * 2.0).max(1.0);
        let zoom_w = if content.width > 0.0 { avail_w / content.width } else { MAX_ZOOM };
        let zoom_h = if content.height > 0.0 { avail_h / content.height } else { MAX_ZOOM };
        let zoom = clamp_zoom(zoom_w.min(zoom_h));
        let center = content.center();
        Self {
            x: rect.width / 2.0 - center.x * zoom,
            y: rect.height / 2.0 - center.y * zoom,
            zoom,
        }
    }
}

/// Client coordinates → world coordinates.
pub fn screen_to_world(
    client_x: f32,
    client_y: f32,
    rect: &ContainerRect,
    viewport: &ViewportTransform,
) -> Position {
    Position::new(
        (client_x - rect.left - viewport.x) / viewport.zoom,
        (client_y - rect.top - viewport.y) / viewport.zoom,
    )
}

/// World coordinates → client coordinates. Exact inverse of `screen_to_world`.
pub fn world_to_screen(world: Position, rect: &ContainerRect, viewport: &ViewportTransform) -> Position {
    Position::new(
        world.x * viewport.zoom + viewport.x + rect.left,
        world.y * viewport.zoom + viewport.y + rect.top,
    )
}
