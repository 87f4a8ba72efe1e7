//! Animated constellation field library
//!
//! Projects catalog stars onto a plane, fits them into the viewport, animates
//! them together with ambient points through a spring-damper simulation and
//! renders the result (proximity mesh, constellation lines, glows, labels)
//! through a small drawing-surface abstraction presented with Bevy.

pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod graphics;
pub mod host;
pub mod layout;
pub mod node;
pub mod projection;
pub mod rendering;
pub mod simulation;
pub mod spatial_partition;
pub mod surface;
