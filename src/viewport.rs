//! Pan and zoom transform between canvas pixels and grid world coordinates.
//!
//! The offset is kept in world units: `world = screen / scale - offset`.

use crate::constants::{MAX_ZOOM, MIN_ZOOM, ZOOM_IN_FACTOR, ZOOM_OUT_FACTOR};
use egui::{Pos2, Vec2};

/// Current view onto the grid plus the state of an in-progress canvas drag.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    /// Zoom factor, always inside `[MIN_ZOOM, MAX_ZOOM]`
    scale: f32,
    /// World-space pan
    offset: Vec2,
    /// Whether the canvas is being dragged
    is_dragging: bool,
    /// Last pointer position seen while dragging, in canvas pixels
    last_pointer: Option<Pos2>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
            is_dragging: false,
            last_pointer: None,
        }
    }
}

impl Viewport {
    /// Creates an unzoomed, unpanned viewport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current zoom factor.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Current world-space pan.
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Whether a canvas drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.is_dragging
    }

    /// Converts a canvas-relative pixel position to world coordinates.
    pub fn screen_to_world(&self, screen: Pos2) -> Pos2 {
        Pos2::new(
            screen.x / self.scale - self.offset.x,
            screen.y / self.scale - self.offset.y,
        )
    }

    /// Converts world coordinates to a canvas-relative pixel position.
    pub fn world_to_screen(&self, world: Pos2) -> Pos2 {
        Pos2::new(
            (world.x + self.offset.x) * self.scale,
            (world.y + self.offset.y) * self.scale,
        )
    }

    /// Starts a canvas drag at `pointer`.
    pub fn begin_drag(&mut self, pointer: Pos2) {
        self.is_dragging = true;
        self.last_pointer = Some(pointer);
    }

    /// Ends any canvas drag.
    pub fn end_drag(&mut self) {
        self.is_dragging = false;
        self.last_pointer = None;
    }

    /// Pans by the pointer movement since the last call. No-op unless dragging.
    pub fn drag_to(&mut self, pointer: Pos2) {
        if !self.is_dragging {
            return;
        }
        if let Some(last) = self.last_pointer {
            self.pan(pointer - last);
        }
        self.last_pointer = Some(pointer);
    }

    /// Moves the view by a screen-space delta. Only applies while dragging.
    pub fn pan(&mut self, delta_screen: Vec2) {
        if !self.is_dragging {
            return;
        }
        self.offset += delta_screen / self.scale;
    }

    /// Zooms one notch in or out, keeping the world point under `anchor` fixed.
    pub fn zoom(&mut self, anchor: Pos2, zoom_in: bool) {
        let world = self.screen_to_world(anchor);

        let factor = if zoom_in {
            ZOOM_IN_FACTOR
        } else {
            ZOOM_OUT_FACTOR
        };
        self.scale = (self.scale * factor).clamp(MIN_ZOOM, MAX_ZOOM);

        self.offset = Vec2::new(
            anchor.x / self.scale - world.x,
            anchor.y / self.scale - world.y,
        );
    }

    /// Pans so content of `content` size is centered in a viewport of `viewport` size.
    pub fn center_on(&mut self, viewport: Vec2, content: Vec2) {
        self.offset = (viewport / self.scale - content) / 2.0;
    }

    /// Restores scale 1 and zero offset.
    pub fn reset_view(&mut self) {
        self.scale = 1.0;
        self.offset = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Pos2, b: Pos2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn test_screen_world_round_trip_after_pan_and_zoom() {
        let mut viewport = Viewport::new();
        viewport.begin_drag(Pos2::new(10.0, 10.0));
        viewport.drag_to(Pos2::new(40.0, 30.0));
        viewport.end_drag();
        viewport.zoom(Pos2::new(200.0, 150.0), true);

        let screen = Pos2::new(123.0, 321.0);
        let back = viewport.world_to_screen(viewport.screen_to_world(screen));
        assert!(approx(screen, back));
    }

    #[test]
    fn test_pan_requires_drag() {
        let mut viewport = Viewport::new();
        viewport.pan(Vec2::new(50.0, 50.0));
        assert_eq!(viewport.offset(), Vec2::ZERO);

        viewport.begin_drag(Pos2::ZERO);
        viewport.pan(Vec2::new(50.0, -20.0));
        assert_eq!(viewport.offset(), Vec2::new(50.0, -20.0));
    }

    #[test]
    fn test_pan_is_divided_by_scale() {
        let mut viewport = Viewport::new();
        for _ in 0..20 {
            viewport.zoom(Pos2::ZERO, true);
        }
        let scale = viewport.scale();
        viewport.begin_drag(Pos2::ZERO);
        viewport.drag_to(Pos2::new(30.0, 0.0));
        assert!((viewport.offset().x - 30.0 / scale).abs() < 1e-4);
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let mut viewport = Viewport::new();
        let anchor = Pos2::new(300.0, 200.0);
        let before = viewport.screen_to_world(anchor);

        viewport.zoom(anchor, true);
        assert!((viewport.scale() - 1.05).abs() < 1e-6);
        assert!(approx(viewport.screen_to_world(anchor), before));

        viewport.zoom(anchor, false);
        assert!(approx(viewport.screen_to_world(anchor), before));
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut viewport = Viewport::new();
        for _ in 0..200 {
            viewport.zoom(Pos2::new(10.0, 10.0), true);
        }
        assert_eq!(viewport.scale(), MAX_ZOOM);

        for _ in 0..200 {
            viewport.zoom(Pos2::new(10.0, 10.0), false);
        }
        assert_eq!(viewport.scale(), MIN_ZOOM);
    }

    #[test]
    fn test_center_on_and_reset() {
        let mut viewport = Viewport::new();
        viewport.center_on(Vec2::new(800.0, 600.0), Vec2::new(500.0, 500.0));
        assert_eq!(viewport.offset(), Vec2::new(150.0, 50.0));
        // Grid origin lands at the centered position on screen.
        assert!(approx(
            viewport.world_to_screen(Pos2::ZERO),
            Pos2::new(150.0, 50.0)
        ));

        viewport.zoom(Pos2::ZERO, true);
        viewport.reset_view();
        assert_eq!(viewport.scale(), 1.0);
        assert_eq!(viewport.offset(), Vec2::ZERO);
    }
}
