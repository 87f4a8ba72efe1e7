//! Static star catalog: named groups of (longitude, latitude, brightness)
//! stars plus index-pair edges.
//!
//! The catalog is authored as TOML (`assets/catalog.toml`) and validated once
//! at load time.  Validation never fails the whole catalog: malformed edges,
//! non-finite stars and empty groups are collected in [`Catalog::rejected`] and skipped, so a
//! group with one bad edge still renders its valid stars and edges.
//!
//! ```toml
//! [[group]]
//! name = "Pyxis"
//! side = -1
//! lines = [[0, 1], [1, 2]]
//!
//! [[group.star]]
//! ra = 178.78
//! dec = -0.73
//! mag = 3.68
//! label = "α Pyx"
//! ```

use crate::error::{SkyError, SkyResult};
use bevy::prelude::*;
use serde::Deserialize;

/// Catalog compiled into the binary; `assets/catalog.toml` on disk overrides it.
pub const BUILTIN_CATALOG: &str = include_str!("../assets/catalog.toml");

/// Path of the optional on-disk catalog.
pub const CATALOG_PATH: &str = "assets/catalog.toml";

/// One catalog star.  Brightness follows the astronomical convention: lower is brighter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogStar {
    #[serde(rename = "ra")]
    pub longitude: f32,
    #[serde(rename = "dec")]
    pub latitude: f32,
    #[serde(rename = "mag")]
    pub brightness: f32,
    #[serde(default)]
    pub label: Option<String>,
}

/// A validated constellation.  Every edge index is `< stars.len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogGroup {
    pub name: String,
    pub is_primary: bool,
    /// −1, 0 or +1.
    pub side_bias: i8,
    pub stars: Vec<CatalogStar>,
    pub edges: Vec<(usize, usize)>,
}

/// The full validated catalog.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub groups: Vec<CatalogGroup>,
    /// Problems found while validating; the offending items were skipped.
    pub rejected: Vec<SkyError>,
}

// ── Raw (unvalidated) TOML shape ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    group: Vec<RawGroup>,
}

#[derive(Debug, Deserialize)]
struct RawGroup {
    name: String,
    #[serde(default)]
    primary: bool,
    #[serde(default)]
    side: i32,
    #[serde(default)]
    star: Vec<CatalogStar>,
    #[serde(default)]
    lines: Vec<[usize; 2]>,
}

impl CatalogStar {
    fn is_finite(&self) -> bool {
        self.longitude.is_finite() && self.latitude.is_finite() && self.brightness.is_finite()
    }
}

impl CatalogGroup {
    fn validate(raw: RawGroup, rejected: &mut Vec<SkyError>) -> Option<Self> {
        let star_count = raw.star.len();

        // Authored index -> index among the kept stars.
        let mut remap: Vec<Option<usize>> = Vec::with_capacity(star_count);
        let mut stars = Vec::with_capacity(star_count);
        for (index, star) in raw.star.into_iter().enumerate() {
            if star.is_finite() {
                remap.push(Some(stars.len()));
                stars.push(star);
            } else {
                remap.push(None);
                rejected.push(SkyError::InvalidStar {
                    group: raw.name.clone(),
                    star: index,
                });
            }
        }

        if stars.is_empty() {
            rejected.push(SkyError::EmptyGroup { group: raw.name });
            return None;
        }

        let mut edges = Vec::with_capacity(raw.lines.len());
        for [a, b] in raw.lines {
            if a >= star_count || b >= star_count {
                rejected.push(SkyError::InvalidEdge {
                    group: raw.name.clone(),
                    edge: (a, b),
                    star_count,
                });
                continue;
            }
            // Edges touching a dropped star go with it; the star was already reported.
            if let (Some(a), Some(b)) = (remap[a], remap[b]) {
                edges.push((a, b));
            }
        }

        Some(Self {
            name: raw.name,
            is_primary: raw.primary,
            side_bias: raw.side.signum() as i8,
            stars,
            edges,
        })
    }
}

impl Catalog {
    /// Parse and validate a TOML catalog.
    ///
    /// Only a syntax/shape error fails; data problems land in `rejected`.
    pub fn from_toml_str(text: &str, source_name: &str) -> SkyResult<Self> {
        let raw: RawCatalog = toml::from_str(text).map_err(|e| SkyError::CatalogParse {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })?;

        let mut rejected = Vec::new();
        let groups = raw
            .group
            .into_iter()
            .filter_map(|g| CatalogGroup::validate(g, &mut rejected))
            .collect();

        Ok(Self { groups, rejected })
    }

    /// The catalog compiled into the binary.
    pub fn builtin() -> SkyResult<Self> {
        Self::from_toml_str(BUILTIN_CATALOG, "built-in")
    }

    /// Build a catalog from already-validated groups (tests, embedders).
    pub fn from_groups(groups: Vec<CatalogGroup>) -> Self {
        Self {
            groups,
            rejected: Vec::new(),
        }
    }

    /// Total star count across all groups.
    pub fn star_count(&self) -> usize {
        self.groups.iter().map(|g| g.stars.len()).sum()
    }
}

/// Load `assets/catalog.toml` if present, falling back to the built-in catalog.
///
/// Rejected items are logged once here so later stages can stay silent.
pub fn load_catalog() -> SkyResult<Catalog> {
    let catalog = match std::fs::read_to_string(CATALOG_PATH) {
        Ok(text) => match Catalog::from_toml_str(&text, CATALOG_PATH) {
            Ok(catalog) => {
                info!("[SETUP] Loaded catalog from {CATALOG_PATH}");
                catalog
            }
            Err(err) => {
                warn!("{err}; using built-in catalog");
                Catalog::builtin()?
            }
        },
        Err(_) => Catalog::builtin()?,
    };

    for err in &catalog.rejected {
        warn!("Catalog: {err}; skipped");
    }
    info!(
        "[SETUP] Catalog: {} groups, {} stars",
        catalog.groups.len(),
        catalog.star_count()
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_GROUPS: &str = r#"
        [[group]]
        name = "Alpha"
        primary = true
        side = 1
        lines = [[0, 1], [1, 2]]

        [[group.star]]
        ra = 10.0
        dec = 5.0
        mag = 1.0
        label = "a"

        [[group.star]]
        ra = 11.0
        dec = 6.0
        mag = 2.0

        [[group.star]]
        ra = 12.0
        dec = 4.0
        mag = 3.0

        [[group]]
        name = "Beta"
        side = -3
        lines = [[0, 1], [0, 7]]

        [[group.star]]
        ra = 20.0
        dec = 0.0
        mag = -1.0

        [[group.star]]
        ra = 21.0
        dec = 1.0
        mag = 4.0
    "#;

    #[test]
    fn parses_groups_stars_and_flags() {
        let catalog = Catalog::from_toml_str(TWO_GROUPS, "test").unwrap();
        assert_eq!(catalog.groups.len(), 2);
        let alpha = &catalog.groups[0];
        assert!(alpha.is_primary);
        assert_eq!(alpha.side_bias, 1);
        assert_eq!(alpha.stars.len(), 3);
        assert_eq!(alpha.stars[0].label.as_deref(), Some("a"));
        assert_eq!(alpha.stars[1].label, None);
        assert_eq!(catalog.star_count(), 5);
    }

    #[test]
    fn out_of_range_edge_is_rejected_but_group_kept() {
        let catalog = Catalog::from_toml_str(TWO_GROUPS, "test").unwrap();
        let beta = &catalog.groups[1];
        assert_eq!(beta.edges, vec![(0, 1)], "valid edge must survive");
        assert_eq!(
            catalog.rejected,
            vec![SkyError::InvalidEdge {
                group: "Beta".into(),
                edge: (0, 7),
                star_count: 2,
            }]
        );
    }

    #[test]
    fn side_is_clamped_to_its_sign() {
        let catalog = Catalog::from_toml_str(TWO_GROUPS, "test").unwrap();
        assert_eq!(catalog.groups[1].side_bias, -1);
    }

    #[test]
    fn empty_group_is_dropped() {
        let text = "[[group]]\nname = \"Void\"\nlines = [[0, 1]]\n";
        let catalog = Catalog::from_toml_str(text, "test").unwrap();
        assert!(catalog.groups.is_empty());
        assert_eq!(
            catalog.rejected,
            vec![SkyError::EmptyGroup {
                group: "Void".into()
            }]
        );
    }

    #[test]
    fn non_finite_star_is_dropped_and_edges_remapped() {
        let text = r#"
            [[group]]
            name = "Gamma"
            lines = [[0, 1], [1, 2], [0, 2]]

            [[group.star]]
            ra = 30.0
            dec = 1.0
            mag = 2.0

            [[group.star]]
            ra = nan
            dec = 2.0
            mag = 2.0

            [[group.star]]
            ra = 32.0
            dec = 3.0
            mag = inf
            label = "c"

            [[group.star]]
            ra = 33.0
            dec = 0.0
            mag = 3.0
        "#;
        let catalog = Catalog::from_toml_str(text, "test").unwrap();
        let gamma = &catalog.groups[0];
        assert_eq!(gamma.stars.len(), 2);
        assert!(gamma
            .stars
            .iter()
            .all(|s| s.longitude.is_finite() && s.latitude.is_finite() && s.brightness.is_finite()));
        assert!(gamma.edges.is_empty(), "every edge touched a dropped star: {:?}", gamma.edges);
        assert_eq!(
            catalog.rejected,
            vec![
                SkyError::InvalidStar { group: "Gamma".into(), star: 1 },
                SkyError::InvalidStar { group: "Gamma".into(), star: 2 },
            ]
        );
    }

    #[test]
    fn edges_after_a_dropped_star_point_at_shifted_indices() {
        let text = r#"
            [[group]]
            name = "Delta"
            lines = [[0, 2], [2, 3]]

            [[group.star]]
            ra = 40.0
            dec = 0.0
            mag = 1.0

            [[group.star]]
            ra = 41.0
            dec = nan
            mag = 1.0

            [[group.star]]
            ra = 42.0
            dec = 2.0
            mag = 1.0

            [[group.star]]
            ra = 43.0
            dec = 3.0
            mag = 1.0
        "#;
        let catalog = Catalog::from_toml_str(text, "test").unwrap();
        let delta = &catalog.groups[0];
        assert_eq!(delta.edges, vec![(0, 1), (1, 2)]);
        assert_eq!(delta.stars[1].longitude, 42.0);
    }

    #[test]
    fn group_of_only_non_finite_stars_is_dropped() {
        let text = "[[group]]\nname = \"Ghost\"\n[[group.star]]\nra = nan\ndec = 0.0\nmag = 1.0\n";
        let catalog = Catalog::from_toml_str(text, "test").unwrap();
        assert!(catalog.groups.is_empty());
        assert_eq!(
            catalog.rejected,
            vec![
                SkyError::InvalidStar { group: "Ghost".into(), star: 0 },
                SkyError::EmptyGroup { group: "Ghost".into() },
            ]
        );
    }

    #[test]
    fn syntax_error_reports_source() {
        let err = Catalog::from_toml_str("[[group]\nname=", "broken.toml").unwrap_err();
        assert!(matches!(err, SkyError::CatalogParse { ref source_name, .. } if source_name == "broken.toml"));
    }

    #[test]
    fn builtin_catalog_is_clean() {
        let catalog = Catalog::builtin().expect("built-in catalog must parse");
        assert!(catalog.rejected.is_empty(), "{:?}", catalog.rejected);
        assert!(catalog.groups.iter().any(|g| g.is_primary));
        for group in &catalog.groups {
            for &(a, b) in &group.edges {
                assert!(a < group.stars.len() && b < group.stars.len());
            }
        }
    }
}
