//! Sky-field error types.
//!
//! Catalog problems are collected rather than raised so a single bad edge
//! never hides a whole constellation; only a missing drawing surface stops the
//! core from initializing.
//!
//! ## Usage
//!
//! ```rust
//! use asterism::error::{validate_damping, SkyResult};
//!
//! fn check() -> SkyResult<()> {
//!     validate_damping(0.92)?;
//!     Ok(())
//! }
//! ```

use std::fmt;

/// Top-level error enum for the constellation field.
#[derive(Debug, Clone, PartialEq)]
pub enum SkyError {
    /// The TOML catalog could not be parsed.
    CatalogParse {
        /// Where the text came from (file path or "built-in").
        source_name: String,
        /// Parser message.
        message: String,
    },

    /// A catalog group has no stars and was dropped.
    EmptyGroup {
        /// Group name.
        group: String,
    },

    /// A catalog edge referenced a star index outside its group.
    InvalidEdge {
        /// Group name.
        group: String,
        /// The rejected index pair.
        edge: (usize, usize),
        /// Number of stars in the group.
        star_count: usize,
    },

    /// A catalog star has a non-finite coordinate or brightness and was dropped.
    InvalidStar {
        /// Group name.
        group: String,
        /// Index of the star within its group as authored.
        star: usize,
    },

    /// No drawing surface (primary window) exists; the field is not created.
    NoSurface,

    /// A tick produced a non-finite node position and was rolled back.
    NonFiniteState {
        /// Index of the first offending node.
        node: usize,
    },

    /// Configuration value is outside its safe operating range.
    UnsafeConstant {
        /// Name of the config field (for logging).
        name: &'static str,
        /// The value that was rejected.
        value: f32,
        /// Human-readable description of the safe range.
        safe_range: &'static str,
    },
}

impl fmt::Display for SkyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkyError::CatalogParse {
                source_name,
                message,
            } => write!(f, "failed to parse catalog '{}': {}", source_name, message),
            SkyError::EmptyGroup { group } => {
                write!(f, "catalog group '{}' has no stars", group)
            }
            SkyError::InvalidEdge {
                group,
                edge,
                star_count,
            } => write!(
                f,
                "catalog group '{}' edge [{}, {}] is out of range (group has {} stars)",
                group, edge.0, edge.1, star_count
            ),
            SkyError::InvalidStar { group, star } => write!(
                f,
                "catalog group '{}' star {} has a non-finite coordinate or magnitude",
                group, star
            ),
            SkyError::NoSurface => write!(f, "no drawing surface available"),
            SkyError::NonFiniteState { node } => {
                write!(f, "node {} reached a non-finite position", node)
            }
            SkyError::UnsafeConstant {
                name,
                value,
                safe_range,
            } => write!(
                f,
                "constant '{}' = {} is outside safe range {}",
                name, value, safe_range
            ),
        }
    }
}

impl std::error::Error for SkyError {}

/// Convenience alias: a `Result` using `SkyError` as the error type.
pub type SkyResult<T> = Result<T, SkyError>;

// ── Validation helpers ────────────────────────────────────────────────────────

/// Returns an error unless `value` lies strictly inside (0, 1).
///
/// Damping of 1.0 or more lets the spring and pointer forces accumulate energy.
pub fn validate_damping(value: f32) -> SkyResult<()> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(SkyError::UnsafeConstant {
            name: "damping",
            value,
            safe_range: "(0.0, 1.0)",
        })
    }
}

/// Returns an error unless the spring constant lies in (0, 0.5].
pub fn validate_spring(value: f32) -> SkyResult<()> {
    if value > 0.0 && value <= 0.5 {
        Ok(())
    } else {
        Err(SkyError::UnsafeConstant {
            name: "spring_constant",
            value,
            safe_range: "(0.0, 0.5]",
        })
    }
}

/// Returns an error unless a padding-style fraction lies in [0, 0.5).
///
/// At 0.5 the usable area collapses to zero.
pub fn validate_fraction(name: &'static str, value: f32) -> SkyResult<()> {
    if (0.0..0.5).contains(&value) {
        Ok(())
    } else {
        Err(SkyError::UnsafeConstant {
            name,
            value,
            safe_range: "[0.0, 0.5)",
        })
    }
}

/// Returns an error unless `value` is finite and strictly positive.
pub fn validate_positive(name: &'static str, value: f32) -> SkyResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SkyError::UnsafeConstant {
            name,
            value,
            safe_range: "(0.0, ∞)",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damping_bounds_are_exclusive() {
        assert!(validate_damping(0.92).is_ok());
        assert!(validate_damping(1.0).is_err());
        assert!(validate_damping(0.0).is_err());
    }

    #[test]
    fn fraction_rejects_half_and_negative() {
        assert!(validate_fraction("padding", 0.0).is_ok());
        assert!(validate_fraction("padding", 0.5).is_err());
        assert!(validate_fraction("padding", -0.1).is_err());
    }

    #[test]
    fn positive_rejects_nan() {
        assert!(validate_positive("radius", f32::NAN).is_err());
        assert!(validate_positive("radius", 200.0).is_ok());
    }

    #[test]
    fn invalid_edge_message_names_group_and_indices() {
        let err = SkyError::InvalidEdge {
            group: "Vela".into(),
            edge: (2, 9),
            star_count: 8,
        };
        let msg = err.to_string();
        assert!(msg.contains("Vela") && msg.contains("[2, 9]"), "got {msg}");
    }
}
