//! Runtime sky-field configuration loaded from `assets/sky.toml`.
//!
//! [`SkyConfig`] is a Bevy [`Resource`] that mirrors every constant in
//! [`crate::constants`].  At startup, [`load_sky_config`] reads
//! `assets/sky.toml` and overwrites the defaults with any values present in
//! the file.  Missing keys fall back to the compile-time defaults, so a minimal
//! TOML can override just the values you care about.
//!
//! Loaded values pass through [`SkyConfig::sanitized`]: any value outside its
//! safe range is logged and replaced by its default.
//!
//! ## Environment overrides
//!
//! | Variable                   | Effect                              |
//! |----------------------------|-------------------------------------|
//! | `ASTERISM_REDUCED_MOTION=1`| Force reduced motion (static frame) |
//! | `ASTERISM_DEBUG=1`         | Start with the debug overlay on     |

use crate::constants::*;
use crate::error::{
    validate_damping, validate_fraction, validate_positive, validate_spring, SkyError,
};
use bevy::prelude::*;
use serde::Deserialize;

/// Path of the optional on-disk configuration file.
pub const CONFIG_PATH: &str = "assets/sky.toml";

/// Runtime-tunable projection, layout, motion and rendering configuration.
#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SkyConfig {
    // ── Projection ───────────────────────────────────────────────────────────
    pub center_longitude: f32,
    pub center_latitude: f32,

    // ── Layout ───────────────────────────────────────────────────────────────
    pub bounds_padding_fraction: f32,
    pub viewport_padding_fraction: f32,
    pub spread_fraction: f32,
    pub narrow_breakpoint: f32,
    pub max_pixel_ratio: f32,

    // ── Ambient Nodes ────────────────────────────────────────────────────────
    pub ambient_count_narrow: usize,
    pub ambient_count_wide: usize,
    pub ambient_initial_speed: f32,
    pub ambient_radius_min: f32,
    pub ambient_radius_max: f32,
    pub ambient_glow_scale: f32,

    // ── Motion ───────────────────────────────────────────────────────────────
    pub spring_constant: f32,
    pub damping: f32,
    pub anchored_amplitude: f32,
    pub ambient_amplitude: f32,
    pub oscillation_freq_x: f32,
    pub oscillation_freq_y: f32,
    pub pointer_radius: f32,
    pub pointer_strength: f32,
    pub pointer_min_distance: f32,

    // ── Proximity Mesh ───────────────────────────────────────────────────────
    pub connect_fraction: f32,
    pub connect_min: f32,
    pub connect_max: f32,

    // ── Rendering ────────────────────────────────────────────────────────────
    pub mesh_alpha: f32,
    pub edge_alpha: f32,
    pub primary_edge_alpha: f32,
    pub anchored_glow_alpha: f32,
    pub ambient_glow_alpha: f32,
    pub anchored_core_alpha: f32,
    pub ambient_core_alpha: f32,
    pub primary_label_size: f32,
    pub label_size: f32,
    pub primary_label_alpha: f32,
    pub label_alpha: f32,
    pub label_offset: f32,
    pub debug_font_size: f32,

    // ── Modes ────────────────────────────────────────────────────────────────
    pub reduced_motion: bool,
    pub debug_overlay: bool,
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            // Projection
            center_longitude: CENTER_LONGITUDE,
            center_latitude: CENTER_LATITUDE,
            // Layout
            bounds_padding_fraction: BOUNDS_PADDING_FRACTION,
            viewport_padding_fraction: VIEWPORT_PADDING_FRACTION,
            spread_fraction: SPREAD_FRACTION,
            narrow_breakpoint: NARROW_BREAKPOINT,
            max_pixel_ratio: MAX_PIXEL_RATIO,
            // Ambient Nodes
            ambient_count_narrow: AMBIENT_COUNT_NARROW,
            ambient_count_wide: AMBIENT_COUNT_WIDE,
            ambient_initial_speed: AMBIENT_INITIAL_SPEED,
            ambient_radius_min: AMBIENT_RADIUS_MIN,
            ambient_radius_max: AMBIENT_RADIUS_MAX,
            ambient_glow_scale: AMBIENT_GLOW_SCALE,
            // Motion
            spring_constant: SPRING_CONSTANT,
            damping: DAMPING,
            anchored_amplitude: ANCHORED_AMPLITUDE,
            ambient_amplitude: AMBIENT_AMPLITUDE,
            oscillation_freq_x: OSCILLATION_FREQ_X,
            oscillation_freq_y: OSCILLATION_FREQ_Y,
            pointer_radius: POINTER_RADIUS,
            pointer_strength: POINTER_STRENGTH,
            pointer_min_distance: POINTER_MIN_DISTANCE,
            // Proximity Mesh
            connect_fraction: CONNECT_FRACTION,
            connect_min: CONNECT_MIN,
            connect_max: CONNECT_MAX,
            // Rendering
            mesh_alpha: MESH_ALPHA,
            edge_alpha: EDGE_ALPHA,
            primary_edge_alpha: PRIMARY_EDGE_ALPHA,
            anchored_glow_alpha: ANCHORED_GLOW_ALPHA,
            ambient_glow_alpha: AMBIENT_GLOW_ALPHA,
            anchored_core_alpha: ANCHORED_CORE_ALPHA,
            ambient_core_alpha: AMBIENT_CORE_ALPHA,
            primary_label_size: PRIMARY_LABEL_SIZE,
            label_size: LABEL_SIZE,
            primary_label_alpha: PRIMARY_LABEL_ALPHA,
            label_alpha: LABEL_ALPHA,
            label_offset: LABEL_OFFSET,
            debug_font_size: DEBUG_FONT_SIZE,
            // Modes
            reduced_motion: false,
            debug_overlay: false,
        }
    }
}

impl SkyConfig {
    /// Parse a TOML document, keeping defaults for absent keys.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<SkyConfig>(text)
    }

    /// Replace every unsafe value with its default, returning the rejections.
    ///
    /// The spread fraction is additionally capped at the viewport padding
    /// fraction so side-biased groups stay inside the viewport.
    pub fn sanitized(mut self) -> (Self, Vec<SkyError>) {
        let defaults = SkyConfig::default();
        let mut rejected = Vec::new();

        macro_rules! check {
            ($field:ident, $result:expr) => {
                if let Err(err) = $result {
                    rejected.push(err);
                    self.$field = defaults.$field;
                }
            };
        }

        check!(damping, validate_damping(self.damping));
        check!(spring_constant, validate_spring(self.spring_constant));
        check!(
            bounds_padding_fraction,
            validate_fraction("bounds_padding_fraction", self.bounds_padding_fraction)
        );
        check!(
            viewport_padding_fraction,
            validate_fraction("viewport_padding_fraction", self.viewport_padding_fraction)
        );
        check!(
            spread_fraction,
            validate_fraction("spread_fraction", self.spread_fraction)
        );
        check!(
            pointer_radius,
            validate_positive("pointer_radius", self.pointer_radius)
        );
        check!(
            pointer_min_distance,
            validate_positive("pointer_min_distance", self.pointer_min_distance)
        );
        check!(
            max_pixel_ratio,
            validate_positive("max_pixel_ratio", self.max_pixel_ratio)
        );
        check!(
            connect_min,
            validate_positive("connect_min", self.connect_min)
        );
        check!(
            connect_max,
            validate_positive("connect_max", self.connect_max)
        );

        if self.connect_max < self.connect_min {
            rejected.push(SkyError::UnsafeConstant {
                name: "connect_max",
                value: self.connect_max,
                safe_range: "[connect_min, ∞)",
            });
            self.connect_min = defaults.connect_min;
            self.connect_max = defaults.connect_max;
        }
        if self.ambient_radius_max < self.ambient_radius_min {
            rejected.push(SkyError::UnsafeConstant {
                name: "ambient_radius_max",
                value: self.ambient_radius_max,
                safe_range: "[ambient_radius_min, ∞)",
            });
            self.ambient_radius_min = defaults.ambient_radius_min;
            self.ambient_radius_max = defaults.ambient_radius_max;
        }
        if self.spread_fraction > self.viewport_padding_fraction {
            rejected.push(SkyError::UnsafeConstant {
                name: "spread_fraction",
                value: self.spread_fraction,
                safe_range: "[0.0, viewport_padding_fraction]",
            });
            self.spread_fraction = self.viewport_padding_fraction;
        }

        (self, rejected)
    }

    /// Apply `ASTERISM_REDUCED_MOTION` / `ASTERISM_DEBUG` environment switches.
    pub fn with_env_overrides(mut self) -> Self {
        if env_flag("ASTERISM_REDUCED_MOTION") {
            self.reduced_motion = true;
        }
        if env_flag("ASTERISM_DEBUG") {
            self.debug_overlay = true;
        }
        self
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Startup system: attempt to load `assets/sky.toml` and overwrite the
/// `SkyConfig` resource with any values present in the file.
///
/// Missing keys retain their compiled defaults.  TOML parse errors are logged
/// but do not abort startup.  A missing file is silently ignored (defaults are
/// already in place from `insert_resource`).
pub fn load_sky_config(mut config: ResMut<SkyConfig>) {
    let loaded = match std::fs::read_to_string(CONFIG_PATH) {
        Ok(contents) => match SkyConfig::from_toml_str(&contents) {
            Ok(loaded) => {
                info!("[SETUP] Loaded sky config from {CONFIG_PATH}");
                loaded
            }
            Err(e) => {
                warn!("Failed to parse {CONFIG_PATH}: {e}; using defaults");
                config.clone()
            }
        },
        Err(_) => {
            info!("[SETUP] No {CONFIG_PATH} found; using compiled defaults");
            config.clone()
        }
    };

    let (sanitized, rejected) = loaded.with_env_overrides().sanitized();
    for err in &rejected {
        warn!("{err}; restoring default");
    }
    *config = sanitized;
}
