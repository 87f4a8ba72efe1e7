//! Per-frame motion and the [`SkyField`] simulation context.
//!
//! ## Step order (per node, per frame)
//!
//! | # | Stage        | Effect                                                    |
//! |---|--------------|-----------------------------------------------------------|
//! | 1 | Oscillation  | Lissajous target around `rest`, amplitude by node class   |
//! | 2 | Spring       | `v += (target - x) * spring`                              |
//! | 3 | Pointer      | Linear-falloff attraction inside `pointer_radius`         |
//! | 4 | Damping      | `v *= damping` (`damping < 1` bounds the energy)          |
//! | 5 | Integration  | `x += v` (explicit Euler)                                 |
//!
//! `step` is deterministic: it reads no clock and no RNG, only the node
//! state, the pointer and the frame counter.

use crate::catalog::Catalog;
use crate::config::SkyConfig;
use crate::error::{SkyError, SkyResult};
use crate::layout::{DeviceClass, FitOutcome, LayoutFitter, Viewport};
use crate::node::{build_nodes, BuildParams, Edge, GroupLabel, Node};
use crate::projection::Projector;
use crate::rendering::{Renderer, Scene};
use crate::surface::Surface;
use bevy::prelude::*;
use rand::rngs::StdRng;

/// Motion tuning, extracted from [`SkyConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionParams {
    pub spring: f32,
    pub damping: f32,
    pub anchored_amplitude: f32,
    pub ambient_amplitude: f32,
    pub freq_x: f32,
    pub freq_y: f32,
    pub pointer_radius: f32,
    pub pointer_strength: f32,
    pub pointer_min_distance: f32,
}

impl MotionParams {
    pub fn from_config(config: &SkyConfig) -> Self {
        Self {
            spring: config.spring_constant,
            damping: config.damping,
            anchored_amplitude: config.anchored_amplitude,
            ambient_amplitude: config.ambient_amplitude,
            freq_x: config.oscillation_freq_x,
            freq_y: config.oscillation_freq_y,
            pointer_radius: config.pointer_radius,
            pointer_strength: config.pointer_strength,
            pointer_min_distance: config.pointer_min_distance,
        }
    }
}

impl Default for MotionParams {
    fn default() -> Self {
        Self::from_config(&SkyConfig::default())
    }
}

/// Spring-damper integrator.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Simulator {
    pub params: MotionParams,
}

impl Simulator {
    pub fn new(params: MotionParams) -> Self {
        Self { params }
    }

    /// Idle-oscillation target at `frame`: `rest` plus an out-of-phase
    /// sin/cos pair on different frequencies.
    pub fn oscillation_target(&self, node: &Node, frame: u64) -> Vec2 {
        let amplitude = if node.is_anchored() {
            self.params.anchored_amplitude
        } else {
            self.params.ambient_amplitude
        };
        // f64 keeps the angle precise for very long sessions.
        let t = frame as f64;
        let phase = f64::from(node.phase);
        let ox = (t * f64::from(self.params.freq_x) + phase).sin();
        let oy = (t * f64::from(self.params.freq_y) + phase * 1.3).cos();
        node.rest + Vec2::new(ox as f32, oy as f32) * amplitude
    }

    /// Attraction toward `pointer`, zero outside the radius and inside the
    /// minimum distance.
    pub fn pointer_force(&self, position: Vec2, pointer: Vec2) -> Vec2 {
        let delta = pointer - position;
        let distance = delta.length();
        if distance >= self.params.pointer_radius
            || distance <= self.params.pointer_min_distance
            || !distance.is_finite()
        {
            return Vec2::ZERO;
        }
        let falloff = 1.0 - distance / self.params.pointer_radius;
        delta / distance * (self.params.pointer_strength * falloff)
    }

    /// Advance every node by one frame.  `pointer` is `None` when absent or
    /// when pointer forces are disabled for the device.
    pub fn step(&self, nodes: &mut [Node], pointer: Option<Vec2>, frame: u64) {
        for node in nodes.iter_mut() {
            let target = self.oscillation_target(node, frame);
            let mut velocity = node.velocity + (target - node.position) * self.params.spring;
            if let Some(pointer) = pointer {
                velocity += self.pointer_force(node.position, pointer);
            }
            velocity *= self.params.damping;
            node.velocity = velocity;
            node.position += velocity;
        }
    }
}

/// What a [`SkyField::resize`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOutcome {
    /// Same viewport as before; nothing recomputed.
    Unchanged,
    /// Rest targets refit; nodes drift to them.
    Refit,
    /// Device class changed: nodes rebuilt with the new ambient count.
    Rebuilt,
}

/// The explicit simulation context: catalog, nodes, viewport, pointer and
/// frame clock in one owned value, passed to step/draw/fit by the host.
#[derive(Resource, Debug, Clone)]
pub struct SkyField {
    catalog: Catalog,
    config: SkyConfig,
    projector: Projector,
    simulator: Simulator,
    renderer: Renderer,
    fitter: LayoutFitter,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    labels: Vec<GroupLabel>,
    /// Reused rollback buffer for [`SkyField::tick`].
    snapshot: Vec<Node>,
    viewport: Viewport,
    device: DeviceClass,
    connect_distance: f32,
    pointer: Option<Vec2>,
    frame: u64,
    debug: bool,
    rng: StdRng,
}

impl SkyField {
    /// Build nodes, fit them to `viewport` and place every node at its rest.
    ///
    /// Constants outside their safe range are reset to defaults with a warning.
    pub fn new(catalog: Catalog, config: &SkyConfig, viewport: Viewport, rng: StdRng) -> Self {
        let (config, rejected) = config.clone().sanitized();
        for err in &rejected {
            warn!("{}; using default", err);
        }
        let config = &config;
        let mut field = Self {
            catalog,
            config: config.clone(),
            projector: Projector::new(config.center_longitude, config.center_latitude),
            simulator: Simulator::new(MotionParams::from_config(config)),
            renderer: Renderer::from_config(config),
            fitter: LayoutFitter::new(
                std::iter::empty(),
                config.bounds_padding_fraction,
                config.viewport_padding_fraction,
                config.spread_fraction,
            ),
            nodes: Vec::new(),
            edges: Vec::new(),
            labels: Vec::new(),
            snapshot: Vec::new(),
            viewport,
            device: DeviceClass::from_width(viewport.width, config.narrow_breakpoint),
            connect_distance: 0.0,
            pointer: None,
            frame: 0,
            debug: config.debug_overlay,
            rng,
        };
        field.rebuild();
        field
    }

    fn ambient_count(&self) -> usize {
        match self.device {
            DeviceClass::Narrow => self.config.ambient_count_narrow,
            DeviceClass::Wide => self.config.ambient_count_wide,
        }
    }

    /// Rebuild the node set for the current device class, fit it and snap
    /// positions to rest.  The bounding box is recomputed exactly here.
    fn rebuild(&mut self) {
        let params = BuildParams {
            ambient_count: self.ambient_count(),
            initial_speed: self.config.ambient_initial_speed,
            radius_min: self.config.ambient_radius_min,
            radius_max: self.config.ambient_radius_max,
            glow_scale: self.config.ambient_glow_scale,
        };
        let set = build_nodes(
            &self.catalog,
            &self.projector,
            &params,
            self.viewport.center(),
            &mut self.rng,
        );
        self.nodes = set.nodes;
        self.edges = set.edges;
        self.labels = set.labels;
        self.fitter = LayoutFitter::for_nodes(
            &self.nodes,
            self.config.bounds_padding_fraction,
            self.config.viewport_padding_fraction,
            self.config.spread_fraction,
        );
        self.refit();
        self.snap_to_rest();
    }

    fn refit(&mut self) {
        self.connect_distance = self.viewport.connect_distance(
            self.config.connect_fraction,
            self.config.connect_min,
            self.config.connect_max,
        );
        if self.fitter.fit(&mut self.nodes, self.viewport) == FitOutcome::Degenerate
            && self.nodes.iter().any(Node::is_anchored)
        {
            warn!("Sky bounding box is degenerate; keeping previous star positions");
        }
    }

    /// Move every node onto its rest target with zero velocity.
    ///
    /// Used after (re)builds and by reduced-motion mode after a resize.
    pub fn snap_to_rest(&mut self) {
        for node in &mut self.nodes {
            node.position = node.rest;
            node.velocity = Vec2::ZERO;
        }
    }

    /// Apply a new viewport.  Idempotent: the same viewport twice is a no-op.
    pub fn resize(&mut self, viewport: Viewport) -> ResizeOutcome {
        if viewport == self.viewport {
            return ResizeOutcome::Unchanged;
        }
        self.viewport = viewport;

        // A minimised window keeps its population; the next real size decides.
        if viewport.is_empty() {
            self.refit();
            return ResizeOutcome::Refit;
        }

        let device = DeviceClass::from_width(viewport.width, self.config.narrow_breakpoint);
        if device != self.device {
            self.device = device;
            self.rebuild();
            info!(
                "Device class changed to {:?}; rebuilt {} nodes",
                device,
                self.nodes.len()
            );
            return ResizeOutcome::Rebuilt;
        }

        self.refit();
        ResizeOutcome::Refit
    }

    /// Record the latest pointer position (`None` once it leaves the surface).
    pub fn set_pointer(&mut self, pointer: Option<Vec2>) {
        self.pointer = pointer;
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    /// Pointer as seen by the simulator: `None` on touch-primary devices.
    pub fn effective_pointer(&self) -> Option<Vec2> {
        self.pointer.filter(|_| self.device.pointer_enabled())
    }

    /// One animation step.  A step that yields a non-finite coordinate is
    /// rolled back so the previous valid state keeps rendering.
    pub fn tick(&mut self) -> SkyResult<()> {
        self.snapshot.clone_from(&self.nodes);
        let pointer = self.effective_pointer();
        self.simulator.step(&mut self.nodes, pointer, self.frame);

        if let Some(index) = self
            .nodes
            .iter()
            .position(|n| !(n.position.is_finite() && n.velocity.is_finite()))
        {
            std::mem::swap(&mut self.nodes, &mut self.snapshot);
            return Err(SkyError::NonFiniteState { node: index });
        }

        self.frame += 1;
        Ok(())
    }

    /// Issue the drawing calls for the current state.  Read-only.
    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S) {
        self.renderer.draw(
            surface,
            &Scene {
                catalog: &self.catalog,
                nodes: &self.nodes,
                edges: &self.edges,
                labels: &self.labels,
                connect_distance: self.connect_distance,
                debug: self.debug,
            },
        );
    }

    pub fn toggle_debug(&mut self) -> bool {
        self.debug = !self.debug;
        self.debug
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Mutable node access for embedders that seed custom state.
    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn labels(&self) -> &[GroupLabel] {
        &self.labels
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn device_class(&self) -> DeviceClass {
        self.device
    }

    pub fn connect_distance(&self) -> f32 {
        self.connect_distance
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }
}
