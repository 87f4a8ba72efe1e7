//! Host wiring: window → viewport/pointer → simulation → draw list → screen.
//!
//! ## System Order
//!
//! | System                    | Schedule | Purpose                                        |
//! |---------------------------|----------|------------------------------------------------|
//! | `load_sky_config`         | Startup  | Read `assets/sky.toml` + env overrides         |
//! | `setup_sky_field`         | Startup  | Load catalog, build + fit nodes for the window |
//! | `setup_camera`            | Startup  | Spawn the 2D camera                            |
//! | `init_shape_meshes`       | Startup  | Shared disc / glow / line-quad meshes          |
//! | `viewport_system`         | Update   | Resize / device-class tracking                 |
//! | `pointer_system`          | Update   | Cursor tracking (animated mode only)           |
//! | `debug_toggle_system`     | Update   | `D` flips the debug overlay                    |
//! | `step_system`             | Update   | One simulation step (animated mode only)       |
//! | `record_frame_system`     | Update   | Renderer → [`DrawList`]                        |
//! | `sync_gizmo_width_system` | Update   | Marker gizmo width from device-pixel ratio     |
//! | `present_gizmos_system`   | Update   | Debug circle outlines via gizmos               |
//! | `present_shapes_system`   | Update   | Pooled lines, glows, discs and labels          |
//!
//! ## Reduced Motion
//!
//! With `reduced_motion` set, no step runs and the pointer is never read.  A
//! single frame is recorded at startup and held; a resize snaps nodes to their
//! new rests and records exactly one more frame.
//!
//! Every per-frame system takes `Option<ResMut<SkyField>>`: when there was no
//! window at startup the field never exists and the loop does nothing.

use crate::catalog::load_catalog;
use crate::config::{load_sky_config, SkyConfig};
use crate::error::SkyError;
use crate::graphics::{self, PresentPool};
use crate::layout::Viewport;
use crate::simulation::{ResizeOutcome, SkyField};
use crate::surface::DrawList;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Whether the field animates or holds a single static frame.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionMode {
    #[default]
    Animated,
    Reduced,
}

impl MotionMode {
    pub fn from_config(config: &SkyConfig) -> Self {
        if config.reduced_motion {
            Self::Reduced
        } else {
            Self::Animated
        }
    }
}

/// Set when a held frame must be re-recorded (reduced motion, debug toggle).
#[derive(Resource, Debug, Clone, Default)]
pub struct FrameRequest {
    pub dirty: bool,
}

pub struct SkyPlugin;

impl Plugin for SkyPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(SkyConfig::default())
            .init_resource::<DrawList>()
            .init_resource::<PresentPool>()
            .init_resource::<FrameRequest>()
            .add_systems(
                Startup,
                (
                    // Config first so every other startup system sees the final values.
                    load_sky_config,
                    setup_sky_field.after(load_sky_config),
                    graphics::setup_camera,
                    graphics::init_shape_meshes,
                ),
            )
            .add_systems(
                Update,
                (
                    viewport_system,
                    pointer_system.run_if(motion_enabled),
                    debug_toggle_system,
                    step_system.run_if(motion_enabled),
                    record_frame_system,
                    graphics::sync_gizmo_width_system,
                    graphics::present_gizmos_system,
                    graphics::present_shapes_system,
                )
                    .chain(),
            );
    }
}

/// The primary window's logical size and capped device-pixel ratio.
pub fn window_viewport(window: &Window, max_pixel_ratio: f32) -> Viewport {
    Viewport::new(window.width(), window.height())
        .with_pixel_ratio(window.scale_factor(), max_pixel_ratio)
}

/// Build the [`SkyField`] for the primary window.
///
/// Without a window nothing is initialised and the per-frame systems idle.
pub fn setup_sky_field(
    mut commands: Commands,
    config: Res<SkyConfig>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    let Ok(window) = windows.single() else {
        error!("{}", SkyError::NoSurface);
        return;
    };
    let catalog = match load_catalog() {
        Ok(catalog) => catalog,
        Err(err) => {
            error!("{err}");
            return;
        }
    };

    let viewport = window_viewport(window, config.max_pixel_ratio);
    let field = SkyField::new(catalog, &config, viewport, StdRng::from_entropy());
    let mode = MotionMode::from_config(&config);
    info!(
        "[SETUP] Sky field ready: {} nodes, {} edges, {:?} device, {:?} motion",
        field.nodes().len(),
        field.edges().len(),
        field.device_class(),
        mode
    );

    commands.insert_resource(field);
    commands.insert_resource(mode);
    commands.insert_resource(FrameRequest { dirty: true });
}

/// Run condition: the simulation steps and follows the pointer.
pub fn motion_enabled(mode: Option<Res<MotionMode>>) -> bool {
    matches!(mode.as_deref(), Some(MotionMode::Animated))
}

/// Forward window size changes to the field.
pub fn viewport_system(
    windows: Query<&Window, With<PrimaryWindow>>,
    config: Res<SkyConfig>,
    mode: Option<Res<MotionMode>>,
    field: Option<ResMut<SkyField>>,
    mut request: ResMut<FrameRequest>,
) {
    let (Some(mut field), Ok(window)) = (field, windows.single()) else {
        return;
    };
    let viewport = window_viewport(window, config.max_pixel_ratio);
    if viewport == field.viewport() {
        return;
    }
    let outcome = field.resize(viewport);
    if outcome != ResizeOutcome::Unchanged && mode.as_deref() == Some(&MotionMode::Reduced) {
        field.snap_to_rest();
        request.dirty = true;
    }
}

/// Track the cursor; `None` once it leaves the window.
pub fn pointer_system(
    windows: Query<&Window, With<PrimaryWindow>>,
    field: Option<ResMut<SkyField>>,
) {
    let (Some(mut field), Ok(window)) = (field, windows.single()) else {
        return;
    };
    let pointer = window.cursor_position();
    if field.pointer() != pointer {
        field.set_pointer(pointer);
    }
}

pub fn debug_toggle_system(
    keys: Res<ButtonInput<KeyCode>>,
    field: Option<ResMut<SkyField>>,
    mut request: ResMut<FrameRequest>,
) {
    let Some(mut field) = field else {
        return;
    };
    if keys.just_pressed(KeyCode::KeyD) {
        let on = field.toggle_debug();
        info!("Debug overlay {}", if on { "on" } else { "off" });
        request.dirty = true;
    }
}

/// Advance the simulation one frame; a rolled-back step is logged and skipped.
pub fn step_system(field: Option<ResMut<SkyField>>) {
    let Some(mut field) = field else {
        return;
    };
    if let Err(err) = field.tick() {
        warn!("{err}; frame skipped");
    }
}

/// Record the current frame into the [`DrawList`].
///
/// Animated mode records every frame; reduced motion only on request.
pub fn record_frame_system(
    field: Option<Res<SkyField>>,
    mode: Option<Res<MotionMode>>,
    mut request: ResMut<FrameRequest>,
    mut frame: ResMut<DrawList>,
) {
    let Some(field) = field else {
        return;
    };
    let animated = mode.as_deref() != Some(&MotionMode::Reduced);
    if !(animated || request.dirty) {
        return;
    }
    frame.size = field.viewport().size();
    field.draw(&mut *frame);
    if request.dirty {
        request.dirty = false;
    }
}
