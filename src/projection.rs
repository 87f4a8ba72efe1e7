//! Sky-to-plane projection.
//!
//! A small-field equirectangular approximation around a fixed centre:
//!
//! ```text
//! x = -(lon - lon0) * cos(lat0)
//! y = -(lat - lat0)
//! ```
//!
//! `x` is negated so longitude increases toward the viewer's left, as on a
//! printed sky chart; `y` is negated so north (higher latitude) ends up at the
//! top once the plane is mapped into y-down viewport space.  Output units are
//! degrees and independent of the viewport.

use bevy::prelude::*;

/// Viewport-independent projected coordinate of one catalog star.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlatPoint {
    pub x: f32,
    pub y: f32,
}

impl FlatPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn as_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Fixed projection centre with its cosine factor computed once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    center_longitude: f32,
    center_latitude: f32,
    cos_factor: f32,
}

impl Projector {
    pub fn new(center_longitude: f32, center_latitude: f32) -> Self {
        Self {
            center_longitude,
            center_latitude,
            cos_factor: center_latitude.to_radians().cos(),
        }
    }

    /// Project `(longitude, latitude)` in degrees onto the flat plane.
    ///
    /// Pure: equal inputs always give bit-identical outputs.
    #[inline]
    pub fn project(&self, longitude: f32, latitude: f32) -> FlatPoint {
        FlatPoint {
            x: -(longitude - self.center_longitude) * self.cos_factor,
            y: -(latitude - self.center_latitude),
        }
    }
}
