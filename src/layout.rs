//! Scale-to-fit layout of projected stars into the current viewport.
//!
//! The flat-plane bounding box is computed once per catalog build.  Every
//! resize re-runs [`LayoutFitter::fit`], which only rewrites rest targets:
//! live positions and velocities are untouched, so nodes drift to their new
//! places instead of snapping.
//!
//! ## Fit
//!
//! ```text
//! usable = viewport * (1 - 2 * padding)
//! s      = min(usable_w / box_w, usable_h / box_h)      // uniform, never anisotropic
//! offset = (viewport - box * s) / 2                     // centred
//! rest_x = offset_x + (flat_x - box_min_x) * s + side * spread * viewport_w
//! rest_y = offset_y + (flat_y - box_min_y) * s
//! ```
//!
//! Ambient nodes ignore the box: `rest = fraction * viewport`.

use crate::node::{Node, NodeKind};
use crate::projection::FlatPoint;
use bevy::prelude::*;

/// Current drawing-surface size in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    /// Device-pixel ratio, already capped.
    pub pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            pixel_ratio: 1.0,
        }
    }

    /// Attach a device-pixel ratio, capped at `max_ratio` and floored at 1.
    pub fn with_pixel_ratio(mut self, ratio: f32, max_ratio: f32) -> Self {
        self.pixel_ratio = if ratio.is_finite() {
            ratio.clamp(1.0, max_ratio.max(1.0))
        } else {
            1.0
        };
        self
    }

    /// True when either side is zero or negative (e.g. a minimised window).
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Connect-distance threshold: a clamped fraction of the shorter side.
    pub fn connect_distance(&self, fraction: f32, min: f32, max: f32) -> f32 {
        (self.width.min(self.height) * fraction).clamp(min, max)
    }
}

/// Coarse viewport classification.  Only this, never the exact width,
/// decides the ambient node count and whether pointer forces apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    /// Mobile / touch-primary: fewer ambient nodes, no pointer force.
    Narrow,
    /// Desktop: full ambient field, pointer attraction enabled.
    Wide,
}

impl DeviceClass {
    pub fn from_width(width: f32, breakpoint: f32) -> Self {
        if width < breakpoint {
            Self::Narrow
        } else {
            Self::Wide
        }
    }

    pub fn pointer_enabled(self) -> bool {
        matches!(self, Self::Wide)
    }
}

/// Axis-aligned bounding box in the flat plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    /// Bounding box of `points`, or `None` when there are none.
    pub fn from_points(points: impl IntoIterator<Item = FlatPoint>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?.as_vec2();
        let (min, max) = iter.fold((first, first), |(min, max), p| {
            let p = p.as_vec2();
            (min.min(p), max.max(p))
        });
        Some(Self { min, max })
    }

    /// Grow outward on every side by `fraction` of the box's own extent.
    pub fn padded(self, fraction: f32) -> Self {
        let pad = self.size() * fraction;
        Self {
            min: self.min - pad,
            max: self.max + pad,
        }
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Zero (or invalid) width or height: fitting would divide by zero.
    pub fn is_degenerate(&self) -> bool {
        let size = self.size();
        !(size.x > 0.0 && size.y > 0.0)
    }
}

/// Scale and offset mapping the flat plane into one viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fit {
    pub scale: f32,
    pub offset: Vec2,
    pub origin: Vec2,
    /// Horizontal shift per unit of side bias (px).
    pub spread: f32,
}

impl Fit {
    /// Viewport-space rest position of a flat point with the given side bias.
    #[inline]
    pub fn place(&self, flat: FlatPoint, side_bias: f32) -> Vec2 {
        let base = self.offset + (flat.as_vec2() - self.origin) * self.scale;
        Vec2::new(base.x + side_bias * self.spread, base.y)
    }
}

/// Result of one [`LayoutFitter::fit`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitOutcome {
    /// Anchored and ambient rest positions were rewritten.
    Applied(Fit),
    /// The sky box is degenerate: anchored rests kept, ambient rests refit.
    Degenerate,
    /// The viewport has no area: nothing changed.
    EmptyViewport,
}

/// Holds the once-per-build flat-plane bounds and refits rest targets on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutFitter {
    bounds: Option<Bounds>,
    viewport_padding: f32,
    spread_fraction: f32,
}

impl LayoutFitter {
    /// Compute the padded bounding box of all anchored flat points.
    pub fn new(
        flat_points: impl IntoIterator<Item = FlatPoint>,
        bounds_padding: f32,
        viewport_padding: f32,
        spread_fraction: f32,
    ) -> Self {
        Self {
            bounds: Bounds::from_points(flat_points).map(|b| b.padded(bounds_padding)),
            viewport_padding,
            spread_fraction,
        }
    }

    /// Fitter over the anchored nodes of an already-built node list.
    pub fn for_nodes(
        nodes: &[Node],
        bounds_padding: f32,
        viewport_padding: f32,
        spread_fraction: f32,
    ) -> Self {
        Self::new(
            nodes.iter().filter_map(Node::flat),
            bounds_padding,
            viewport_padding,
            spread_fraction,
        )
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    /// The scale/offset for `viewport`, or `None` if fitting is impossible.
    pub fn compute(&self, viewport: Viewport) -> Option<Fit> {
        if viewport.is_empty() {
            return None;
        }
        let bounds = self.bounds.filter(|b| !b.is_degenerate())?;

        let box_size = bounds.size();
        let usable = viewport.size() * (1.0 - 2.0 * self.viewport_padding);
        let scale = (usable.x / box_size.x).min(usable.y / box_size.y);
        if !scale.is_finite() || scale <= 0.0 {
            return None;
        }

        Some(Fit {
            scale,
            offset: (viewport.size() - box_size * scale) * 0.5,
            origin: bounds.min,
            spread: self.spread_fraction * viewport.width,
        })
    }

    /// Rewrite rest targets for `viewport`.  Never touches position or velocity.
    pub fn fit(&self, nodes: &mut [Node], viewport: Viewport) -> FitOutcome {
        if viewport.is_empty() {
            return FitOutcome::EmptyViewport;
        }
        let fit = self.compute(viewport);

        for node in nodes.iter_mut() {
            match node.kind {
                NodeKind::Anchored { flat, .. } => {
                    if let Some(fit) = fit {
                        node.rest = fit.place(flat, node.side_bias);
                    }
                }
                NodeKind::Ambient { fraction } => {
                    node.rest = fraction * viewport.size();
                }
            }
        }

        match fit {
            Some(fit) => FitOutcome::Applied(fit),
            None => FitOutcome::Degenerate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchored(flat: FlatPoint, side: f32) -> Node {
        Node::anchored(flat, 0, 0, side, 2.0, 8.0, 0.0, Vec2::ZERO)
    }

    fn fitter_for(nodes: &[Node], padding: f32, spread: f32) -> LayoutFitter {
        LayoutFitter::for_nodes(nodes, 0.08, padding, spread)
    }

    fn triangle() -> Vec<Node> {
        vec![
            anchored(FlatPoint::new(-10.0, -4.0), 0.0),
            anchored(FlatPoint::new(12.0, 3.0), 0.0),
            anchored(FlatPoint::new(2.0, 9.0), 0.0),
        ]
    }

    #[test]
    fn bounds_track_extremes_and_pad_by_own_extent() {
        let b = Bounds::from_points([FlatPoint::new(0.0, 0.0), FlatPoint::new(10.0, 5.0)])
            .unwrap()
            .padded(0.1);
        assert_eq!(b.min, Vec2::new(-1.0, -0.5));
        assert_eq!(b.max, Vec2::new(11.0, 5.5));
    }

    #[test]
    fn rest_positions_stay_inside_viewport() {
        let mut nodes = vec![
            anchored(FlatPoint::new(-30.0, -20.0), -1.0),
            anchored(FlatPoint::new(40.0, 25.0), 1.0),
            anchored(FlatPoint::new(5.0, -3.0), 1.0),
            anchored(FlatPoint::new(-12.0, 18.0), -1.0),
        ];
        let fitter = fitter_for(&nodes, 0.06, 0.05);
        for &(w, h) in &[(1000.0, 800.0), (320.0, 640.0), (2560.0, 400.0), (50.0, 50.0)] {
            fitter.fit(&mut nodes, Viewport::new(w, h));
            for n in &nodes {
                assert!(
                    n.rest.x >= 0.0 && n.rest.x <= w && n.rest.y >= 0.0 && n.rest.y <= h,
                    "rest {:?} escaped {w}x{h}",
                    n.rest
                );
            }
        }
    }

    #[test]
    fn scaling_is_uniform() {
        let mut nodes = triangle();
        let flats: Vec<Vec2> = nodes.iter().filter_map(Node::flat).map(FlatPoint::as_vec2).collect();
        fitter_for(&nodes, 0.05, 0.0).fit(&mut nodes, Viewport::new(1200.0, 300.0));

        let flat_ratio = flats[0].distance(flats[1]) / flats[1].distance(flats[2]);
        let rest_ratio = nodes[0].rest.distance(nodes[1].rest) / nodes[1].rest.distance(nodes[2].rest);
        assert!(
            (flat_ratio - rest_ratio).abs() < 1e-4,
            "flat ratio {flat_ratio} vs rest ratio {rest_ratio}"
        );
    }

    #[test]
    fn fitting_twice_is_idempotent() {
        let mut nodes = triangle();
        let fitter = fitter_for(&nodes, 0.06, 0.05);
        let viewport = Viewport::new(900.0, 700.0);
        fitter.fit(&mut nodes, viewport);
        let first: Vec<Vec2> = nodes.iter().map(|n| n.rest).collect();
        fitter.fit(&mut nodes, viewport);
        let second: Vec<Vec2> = nodes.iter().map(|n| n.rest).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn fit_leaves_position_and_velocity_alone() {
        let mut nodes = triangle();
        nodes[0].position = Vec2::new(3.0, 4.0);
        nodes[0].velocity = Vec2::new(0.5, -0.5);
        fitter_for(&nodes, 0.06, 0.0).fit(&mut nodes, Viewport::new(800.0, 600.0));
        assert_eq!(nodes[0].position, Vec2::new(3.0, 4.0));
        assert_eq!(nodes[0].velocity, Vec2::new(0.5, -0.5));
    }

    #[test]
    fn single_star_is_degenerate_and_keeps_prior_rest() {
        let center = Vec2::new(500.0, 400.0);
        let mut nodes = vec![Node::anchored(FlatPoint::new(0.0, 0.0), 0, 0, 0.0, 2.0, 8.0, 0.0, center)];
        let fitter = LayoutFitter::for_nodes(&nodes, 0.08, 0.0, 0.0);
        let outcome = fitter.fit(&mut nodes, Viewport::new(1000.0, 800.0));
        assert_eq!(outcome, FitOutcome::Degenerate);
        assert_eq!(nodes[0].rest, center);
        assert!(nodes[0].rest.is_finite());
    }

    #[test]
    fn collinear_stars_are_degenerate() {
        let mut nodes = vec![
            anchored(FlatPoint::new(0.0, 1.0), 0.0),
            anchored(FlatPoint::new(5.0, 1.0), 0.0),
        ];
        let before: Vec<Vec2> = nodes.iter().map(|n| n.rest).collect();
        let outcome = fitter_for(&nodes, 0.0, 0.0).fit(&mut nodes, Viewport::new(640.0, 480.0));
        assert_eq!(outcome, FitOutcome::Degenerate);
        assert_eq!(nodes.iter().map(|n| n.rest).collect::<Vec<_>>(), before);
    }

    #[test]
    fn empty_catalog_still_places_ambient_nodes() {
        let mut nodes = vec![Node::ambient(Vec2::new(0.25, 0.5), 1.0, 4.0, 0.0, Vec2::ZERO, Vec2::ZERO)];
        let fitter = LayoutFitter::for_nodes(&nodes, 0.08, 0.06, 0.05);
        assert!(fitter.bounds().is_none());
        let outcome = fitter.fit(&mut nodes, Viewport::new(800.0, 600.0));
        assert_eq!(outcome, FitOutcome::Degenerate);
        assert_eq!(nodes[0].rest, Vec2::new(200.0, 300.0));
    }

    #[test]
    fn empty_viewport_changes_nothing() {
        let mut nodes = triangle();
        let outcome = fitter_for(&nodes, 0.06, 0.0).fit(&mut nodes, Viewport::new(0.0, 600.0));
        assert_eq!(outcome, FitOutcome::EmptyViewport);
        assert!(nodes.iter().all(|n| n.rest == Vec2::ZERO));
    }

    #[test]
    fn side_bias_parts_groups_by_twice_the_spread() {
        let layout = [FlatPoint::new(0.0, 0.0), FlatPoint::new(4.0, 3.0), FlatPoint::new(-2.0, 6.0)];
        let mut nodes: Vec<Node> = layout
            .iter()
            .map(|&f| anchored(f, -1.0))
            .chain(layout.iter().map(|&f| anchored(f, 1.0)))
            .collect();
        let fitter = fitter_for(&nodes, 0.06, 0.05);

        for &(w, h) in &[(1000.0, 800.0), (400.0, 900.0)] {
            fitter.fit(&mut nodes, Viewport::new(w, h));
            let mean = |range: std::ops::Range<usize>| {
                nodes[range.clone()].iter().map(|n| n.rest.x).sum::<f32>() / range.len() as f32
            };
            let gap = mean(3..6) - mean(0..3);
            let spread = 0.05 * w;
            assert!(
                (gap - 2.0 * spread).abs() < 1e-3,
                "gap {gap} should equal 2 * spread {spread} at {w}x{h}"
            );
        }
    }

    #[test]
    fn device_class_uses_breakpoint() {
        assert_eq!(DeviceClass::from_width(767.0, 768.0), DeviceClass::Narrow);
        assert_eq!(DeviceClass::from_width(768.0, 768.0), DeviceClass::Wide);
        assert!(!DeviceClass::Narrow.pointer_enabled());
    }

    #[test]
    fn pixel_ratio_is_capped() {
        assert_eq!(Viewport::new(10.0, 10.0).with_pixel_ratio(3.0, 2.0).pixel_ratio, 2.0);
        assert_eq!(Viewport::new(10.0, 10.0).with_pixel_ratio(0.5, 2.0).pixel_ratio, 1.0);
    }

    #[test]
    fn connect_distance_is_clamped() {
        let v = Viewport::new(1920.0, 1080.0);
        assert_eq!(v.connect_distance(0.22, 140.0, 180.0), 180.0);
        let v = Viewport::new(375.0, 667.0);
        assert_eq!(v.connect_distance(0.22, 140.0, 180.0), 140.0);
    }
}
