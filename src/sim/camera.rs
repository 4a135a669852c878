//! Smoothly-following camera
//!
//! Holds the visible-region transform: exponential follow/zoom smoothing,
//! world-bounds clamping, and the world↔screen affine transforms. The
//! camera never moves on `follow()` or `set_zoom()`; it only approaches
//! its targets when `update()` runs once per tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::circle_intersects_rect;

/// Smallest accepted smoothing coefficient. Zero or negative smoothing
/// would freeze the camera or diverge, so setters clamp into
/// [MIN_SMOOTHING, 1.0].
pub const MIN_SMOOTHING: f32 = 0.001;

/// World-space rectangle currently visible (origin = min corner)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// The follow camera
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    /// Current world-space position (center of view)
    pub pos: Vec2,
    /// Follow target (world space)
    target: Vec2,
    /// Current zoom (world→screen scale factor)
    pub zoom: f32,
    target_zoom: f32,
    pos_smoothing: f32,
    zoom_smoothing: f32,
    min_zoom: f32,
    max_zoom: f32,
    /// World bounds the position is clamped into after smoothing
    bounds_min: Vec2,
    bounds_max: Vec2,
    /// Viewport size in screen units (pixels)
    screen_size: Vec2,
    /// Cached world-space view rectangle, recomputed by `update()`
    viewport: Viewport,
}

impl Camera {
    /// Create a camera for a screen of the given pixel size.
    ///
    /// Defaults: zoom 1.0 in [0.25, 4.0], smoothing 0.1 (position) and
    /// 0.08 (zoom), world bounds ±`half_extent`.
    pub fn new(screen_width: f32, screen_height: f32, half_extent: f32) -> Self {
        let mut cam = Self {
            pos: Vec2::ZERO,
            target: Vec2::ZERO,
            zoom: 1.0,
            target_zoom: 1.0,
            pos_smoothing: 0.1,
            zoom_smoothing: 0.08,
            min_zoom: 0.25,
            max_zoom: 4.0,
            bounds_min: Vec2::splat(-half_extent),
            bounds_max: Vec2::splat(half_extent),
            screen_size: Vec2::new(screen_width, screen_height),
            viewport: Viewport {
                x: 0.0,
                y: 0.0,
                width: screen_width,
                height: screen_height,
            },
        };
        cam.recompute_viewport();
        cam
    }

    /// Set the follow target. The camera does not move until `update()`.
    pub fn follow(&mut self, target: Vec2) {
        self.target = target;
    }

    /// Advance position and zoom toward their targets, clamp into world
    /// bounds, and recompute the visible rectangle. Call once per tick.
    pub fn update(&mut self) {
        self.pos += (self.target - self.pos) * self.pos_smoothing;
        self.zoom += (self.target_zoom - self.zoom) * self.zoom_smoothing;
        self.pos = self.pos.clamp(self.bounds_min, self.bounds_max);
        self.recompute_viewport();
    }

    /// Set the zoom target (clamped into zoom bounds before storage)
    pub fn set_zoom(&mut self, zoom: f32) {
        self.target_zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// Multiply the zoom target by `factor` (> 1 zooms in)
    pub fn zoom_in(&mut self, factor: f32) {
        self.set_zoom(self.target_zoom * factor.max(f32::EPSILON));
    }

    /// Divide the zoom target by `factor`
    pub fn zoom_out(&mut self, factor: f32) {
        self.set_zoom(self.target_zoom / factor.max(f32::EPSILON));
    }

    /// Set smoothing coefficients, clamped into `[MIN_SMOOTHING, 1.0]`
    pub fn set_smoothing(&mut self, position: f32, zoom: f32) {
        self.pos_smoothing = position.clamp(MIN_SMOOTHING, 1.0);
        self.zoom_smoothing = zoom.clamp(MIN_SMOOTHING, 1.0);
    }

    /// Set zoom bounds. Rejected (returns false) unless 0 < min <= max.
    pub fn set_zoom_bounds(&mut self, min: f32, max: f32) -> bool {
        if !(min > 0.0 && min <= max) {
            return false;
        }
        self.min_zoom = min;
        self.max_zoom = max;
        self.target_zoom = self.target_zoom.clamp(min, max);
        true
    }

    /// Set world bounds. Rejected (returns false) unless min <= max on
    /// both axes.
    pub fn set_world_bounds(&mut self, min: Vec2, max: Vec2) -> bool {
        if min.x > max.x || min.y > max.y {
            return false;
        }
        self.bounds_min = min;
        self.bounds_max = max;
        true
    }

    /// World-space point to screen-space pixels
    #[inline]
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        (world - self.pos) * self.zoom + self.screen_size * 0.5
    }

    /// Screen-space pixels to world-space point. Exact inverse of
    /// [`Camera::world_to_screen`] up to floating-point tolerance.
    #[inline]
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        (screen - self.screen_size * 0.5) / self.zoom + self.pos
    }

    /// The world-space rectangle currently visible
    pub fn visible_rect(&self) -> Viewport {
        self.viewport
    }

    /// True iff the circle at `pos` with `radius` intersects the visible
    /// rectangle. Exposed for render culling; correctness never depends
    /// on callers using it.
    pub fn is_visible(&self, pos: Vec2, radius: f32) -> bool {
        circle_intersects_rect(
            pos,
            radius,
            Vec2::new(self.viewport.x, self.viewport.y),
            Vec2::new(self.viewport.width, self.viewport.height),
        )
    }

    fn recompute_viewport(&mut self) {
        let world_size = self.screen_size / self.zoom;
        let min = self.pos - world_size * 0.5;
        self.viewport = Viewport {
            x: min.x,
            y: min.y,
            width: world_size.x,
            height: world_size.y,
        };
    }
}
