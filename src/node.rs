//! Simulation nodes and the one-time node build.
//!
//! All randomness in the field lives in [`build_nodes`]: per-node phase,
//! ambient fractional positions, ambient radii and initial velocities.  The
//! RNG is passed in, so a seeded build gives a fully deterministic field.
//!
//! Anchored nodes come first, grouped contiguously in catalog order; this is
//! what lets a [`GroupLabel`] describe its members as `start..start + count`.

use crate::catalog::Catalog;
use crate::projection::{FlatPoint, Projector};
use bevy::prelude::*;
use rand::Rng;
use std::f32::consts::TAU;

/// What a node is tied to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind {
    /// Catalog star: rest position comes from the sky layout.
    Anchored {
        flat: FlatPoint,
        group: usize,
        star: usize,
    },
    /// Decorative point: rest position is `fraction * viewport`.
    Ambient { fraction: Vec2 },
}

/// One animated point.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// Viewport-space target, rewritten by the layout fitter.
    pub rest: Vec2,
    /// Live position.
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub glow_radius: f32,
    /// Radians; desynchronises idle oscillation between nodes.
    pub phase: f32,
    /// Copied from the owning group (−1, 0, +1); always 0 for ambient nodes.
    pub side_bias: f32,
}

impl Node {
    #[allow(clippy::too_many_arguments)]
    pub fn anchored(
        flat: FlatPoint,
        group: usize,
        star: usize,
        side_bias: f32,
        radius: f32,
        glow_radius: f32,
        phase: f32,
        rest: Vec2,
    ) -> Self {
        Self {
            kind: NodeKind::Anchored { flat, group, star },
            rest,
            position: rest,
            velocity: Vec2::ZERO,
            radius,
            glow_radius,
            phase,
            side_bias,
        }
    }

    pub fn ambient(
        fraction: Vec2,
        radius: f32,
        glow_radius: f32,
        phase: f32,
        rest: Vec2,
        velocity: Vec2,
    ) -> Self {
        Self {
            kind: NodeKind::Ambient { fraction },
            rest,
            position: rest,
            velocity,
            radius,
            glow_radius,
            phase,
            side_bias: 0.0,
        }
    }

    #[inline]
    pub fn is_anchored(&self) -> bool {
        matches!(self.kind, NodeKind::Anchored { .. })
    }

    pub fn flat(&self) -> Option<FlatPoint> {
        match self.kind {
            NodeKind::Anchored { flat, .. } => Some(flat),
            NodeKind::Ambient { .. } => None,
        }
    }

    /// Index of the originating catalog group, `None` for ambient nodes.
    pub fn group(&self) -> Option<usize> {
        match self.kind {
            NodeKind::Anchored { group, .. } => Some(group),
            NodeKind::Ambient { .. } => None,
        }
    }
}

/// Constellation edge resolved to global node indices at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub is_primary: bool,
}

/// Label anchor: the group's members are `nodes[start..start + count]`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupLabel {
    pub name: String,
    pub start: usize,
    pub count: usize,
    pub is_primary: bool,
}

/// Parameters for the randomised part of the build.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildParams {
    pub ambient_count: usize,
    pub initial_speed: f32,
    pub radius_min: f32,
    pub radius_max: f32,
    pub glow_scale: f32,
}

/// Output of [`build_nodes`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeSet {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub labels: Vec<GroupLabel>,
}

impl NodeSet {
    pub fn anchored_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_anchored()).count()
    }
}

/// Core and glow radius for a catalog magnitude (lower is brighter).
///
/// Monotonic step function: a brighter star never gets a smaller disc.
pub fn brightness_radii(magnitude: f32) -> (f32, f32) {
    if magnitude < 0.0 {
        (3.2, 18.0)
    } else if magnitude < 1.5 {
        (2.6, 14.0)
    } else if magnitude < 2.5 {
        (2.1, 11.0)
    } else if magnitude < 3.5 {
        (1.7, 8.0)
    } else {
        (1.3, 6.0)
    }
}

/// Build the full node list, edges and labels for one catalog + ambient count.
///
/// Every node starts at `initial_rest` (normally the viewport centre) until
/// the first layout fit assigns real targets.
pub fn build_nodes<R: Rng + ?Sized>(
    catalog: &Catalog,
    projector: &Projector,
    params: &BuildParams,
    initial_rest: Vec2,
    rng: &mut R,
) -> NodeSet {
    let mut set = NodeSet {
        nodes: Vec::with_capacity(catalog.star_count() + params.ambient_count),
        ..Default::default()
    };

    for (group_index, group) in catalog.groups.iter().enumerate() {
        let start = set.nodes.len();
        let side = f32::from(group.side_bias);

        for (star_index, star) in group.stars.iter().enumerate() {
            let flat = projector.project(star.longitude, star.latitude);
            let (radius, glow_radius) = brightness_radii(star.brightness);
            set.nodes.push(Node::anchored(
                flat,
                group_index,
                star_index,
                side,
                radius,
                glow_radius,
                rng.gen_range(0.0..TAU),
                initial_rest,
            ));
        }

        // Catalog validation already guarantees both indices are in range.
        set.edges.extend(group.edges.iter().map(|&(a, b)| Edge {
            from: start + a,
            to: start + b,
            is_primary: group.is_primary,
        }));

        set.labels.push(GroupLabel {
            name: group.name.clone(),
            start,
            count: group.stars.len(),
            is_primary: group.is_primary,
        });
    }

    let speed = params.initial_speed.max(0.0);
    for _ in 0..params.ambient_count {
        let fraction = Vec2::new(rng.gen::<f32>(), rng.gen::<f32>());
        let radius = if params.radius_max > params.radius_min {
            rng.gen_range(params.radius_min..params.radius_max)
        } else {
            params.radius_min
        };
        let velocity = if speed > 0.0 {
            Vec2::new(rng.gen_range(-speed..speed), rng.gen_range(-speed..speed))
        } else {
            Vec2::ZERO
        };
        set.nodes.push(Node::ambient(
            fraction,
            radius,
            radius * params.glow_scale,
            rng.gen_range(0.0..TAU),
            initial_rest,
            velocity,
        ));
    }

    set
}
