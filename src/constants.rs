//! Centralised projection, layout, motion and rendering constants.
//!
//! All tuneable values live here so they can be found, reasoned-about, and
//! modified in one place without source-diving across multiple modules.
//! [`crate::config::SkyConfig::default`] mirrors every value below; override
//! any subset at runtime through `assets/sky.toml`.
//!
//! Distances are logical viewport pixels, times are animation frames.

// ── Projection ────────────────────────────────────────────────────────────────

/// Reference longitude (degrees) mapped to the flat-plane origin.
///
/// Chosen near the middle of the built-in catalog (longitudes 59°–211°).
/// Only the cosine factor derived from the centre latitude affects the final
/// layout shape; the fitter removes any constant offset.
pub const CENTER_LONGITUDE: f32 = 135.0;

/// Reference latitude (degrees) mapped to the flat-plane origin.
pub const CENTER_LATITUDE: f32 = -11.0;

// ── Layout ────────────────────────────────────────────────────────────────────

/// Outward padding of the flat-plane bounding box, as a fraction of its own extent.
///
/// Keeps the outermost stars off the exact edge of the usable area.
pub const BOUNDS_PADDING_FRACTION: f32 = 0.08;

/// Viewport padding on every side, as a fraction of the viewport dimension.
///
/// `usable = viewport * (1 - 2 * VIEWPORT_PADDING_FRACTION)`.
pub const VIEWPORT_PADDING_FRACTION: f32 = 0.06;

/// Horizontal spread applied per unit of side bias, as a fraction of viewport width.
///
/// Parts `side = -1` and `side = +1` groups around the central content corridor.
/// Must not exceed `VIEWPORT_PADDING_FRACTION` or biased groups can leave the viewport.
pub const SPREAD_FRACTION: f32 = 0.05;

/// Viewport widths below this (logical px) classify the device as narrow.
pub const NARROW_BREAKPOINT: f32 = 768.0;

/// Largest device-pixel ratio honoured by the backend.
pub const MAX_PIXEL_RATIO: f32 = 2.0;

// ── Ambient Nodes ─────────────────────────────────────────────────────────────

/// Ambient point count on narrow (mobile / touch) devices.
pub const AMBIENT_COUNT_NARROW: usize = 25;

/// Ambient point count on wide (desktop) devices.
pub const AMBIENT_COUNT_WIDE: usize = 45;

/// Maximum magnitude of the random initial velocity per axis (px/frame).
pub const AMBIENT_INITIAL_SPEED: f32 = 0.2;

/// Ambient core radius range (px).
pub const AMBIENT_RADIUS_MIN: f32 = 0.8;
pub const AMBIENT_RADIUS_MAX: f32 = 1.4;

/// Ambient glow radius as a multiple of the core radius.
pub const AMBIENT_GLOW_SCALE: f32 = 4.0;

// ── Motion: Spring / Damping ──────────────────────────────────────────────────

/// Spring constant pulling each node toward its oscillating rest target.
///
/// Per-frame velocity change per pixel of displacement.  Tested range
/// 0.005–0.03: lower drifts lazily, higher snaps.  Must stay well below
/// 0.5 or explicit Euler starts to overshoot.
pub const SPRING_CONSTANT: f32 = 0.012;

/// Velocity multiplier applied every frame after force accumulation.
///
/// Must lie strictly inside (0, 1).  At 0.92 a displaced node settles in
/// roughly 60 frames.
pub const DAMPING: f32 = 0.92;

// ── Motion: Idle Oscillation ──────────────────────────────────────────────────

/// Lissajous amplitude (px) for anchored nodes.
pub const ANCHORED_AMPLITUDE: f32 = 2.5;

/// Lissajous amplitude (px) for ambient nodes.
pub const AMBIENT_AMPLITUDE: f32 = 10.0;

/// Angular frequency (rad/frame) of the horizontal oscillation.
pub const OSCILLATION_FREQ_X: f32 = 0.007;

/// Angular frequency (rad/frame) of the vertical oscillation.
///
/// Deliberately incommensurate with `OSCILLATION_FREQ_X` so the path never
/// closes into a visible loop.
pub const OSCILLATION_FREQ_Y: f32 = 0.0053;

// ── Motion: Pointer ───────────────────────────────────────────────────────────

/// Radius (px) within which the pointer attracts nodes.
pub const POINTER_RADIUS: f32 = 200.0;

/// Peak attraction (px/frame²) at the pointer itself, falling linearly to zero at the radius.
pub const POINTER_STRENGTH: f32 = 0.02;

/// Pointer distances at or below this are ignored to avoid a singular unit vector.
pub const POINTER_MIN_DISTANCE: f32 = 1.0;

// ── Proximity Mesh ────────────────────────────────────────────────────────────

/// Connect distance as a fraction of `min(width, height)`.
pub const CONNECT_FRACTION: f32 = 0.22;

/// Lower clamp of the connect distance (px).
pub const CONNECT_MIN: f32 = 140.0;

/// Upper clamp of the connect distance (px).
pub const CONNECT_MAX: f32 = 180.0;

/// Node count above which mesh pairs are found with the spatial grid.
///
/// Below this the brute-force pass touches fewer pairs than the grid
/// bookkeeping costs.
pub const GRID_MIN_NODES: usize = 160;

// ── Rendering ─────────────────────────────────────────────────────────────────

/// Mesh line opacity at zero distance; decays linearly to zero at the connect distance.
pub const MESH_ALPHA: f32 = 0.12;

/// Opacity of non-primary constellation edges.
pub const EDGE_ALPHA: f32 = 0.22;

/// Opacity of both gradient stops on primary constellation edges.
pub const PRIMARY_EDGE_ALPHA: f32 = 0.55;

/// Inner opacity of anchored glows.
pub const ANCHORED_GLOW_ALPHA: f32 = 0.35;

/// Inner opacity of ambient glows.
pub const AMBIENT_GLOW_ALPHA: f32 = 0.15;

/// Core disc opacity of anchored nodes.
pub const ANCHORED_CORE_ALPHA: f32 = 0.95;

/// Core disc opacity of ambient nodes.
pub const AMBIENT_CORE_ALPHA: f32 = 0.8;

/// Label font sizes (px).
pub const PRIMARY_LABEL_SIZE: f32 = 14.0;
pub const LABEL_SIZE: f32 = 11.0;

/// Label opacities.
pub const PRIMARY_LABEL_ALPHA: f32 = 0.6;
pub const LABEL_ALPHA: f32 = 0.3;

/// Vertical gap (px) between a group's lowest star and its label.
pub const LABEL_OFFSET: f32 = 18.0;

/// Debug overlay font size (px).
pub const DEBUG_FONT_SIZE: f32 = 10.0;
