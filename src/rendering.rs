//! Frame rendering: turns the current node state into [`Surface`] calls.
//!
//! ## Pass Order
//!
//! | # | Pass            | Primitive                         | Alpha                             |
//! |---|-----------------|-----------------------------------|-----------------------------------|
//! | 1 | Clear           | -                                 | -                                 |
//! | 2 | Proximity mesh  | `stroke_line` per close pair      | `mesh_alpha * (1 - d / connect)`  |
//! | 3 | Constellations  | gradient (primary) / flat line    | `primary_edge_alpha`/`edge_alpha` |
//! | 4 | Stars           | glow then core disc, per node     | anchored vs ambient constants     |
//! | 5 | Group labels    | centred text under lowest member  | primary vs other constants        |
//! | 6 | Debug overlay   | markers, per-star text, banner    | only when enabled                 |
//!
//! Rendering is read-only with respect to simulation state.

use crate::catalog::Catalog;
use crate::config::SkyConfig;
use crate::node::{Edge, GroupLabel, Node, NodeKind};
use crate::spatial_partition::proximity_pairs;
use crate::surface::{Surface, TextAlign, TextStyle};
use bevy::prelude::*;

const MESH_WIDTH: f32 = 1.0;
const EDGE_WIDTH: f32 = 1.0;
const PRIMARY_EDGE_WIDTH: f32 = 1.5;

fn star_color() -> Color {
    Color::srgb(0.92, 0.95, 1.0)
}

fn mesh_color() -> Color {
    Color::srgb(0.70, 0.80, 1.0)
}

/// Primary gradient endpoints (warm → cool).
fn primary_start_color() -> Color {
    Color::srgb(1.0, 0.82, 0.55)
}

fn primary_end_color() -> Color {
    Color::srgb(0.55, 0.72, 1.0)
}

fn edge_color() -> Color {
    Color::srgb(0.75, 0.82, 1.0)
}

fn label_color() -> Color {
    Color::srgb(0.80, 0.86, 1.0)
}

fn debug_color() -> Color {
    Color::srgb(1.0, 0.85, 0.3)
}

/// Opacities and font sizes, extracted from [`SkyConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStyle {
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
}

impl RenderStyle {
    pub fn from_config(config: &SkyConfig) -> Self {
        Self {
            mesh_alpha: config.mesh_alpha,
            edge_alpha: config.edge_alpha,
            primary_edge_alpha: config.primary_edge_alpha,
            anchored_glow_alpha: config.anchored_glow_alpha,
            ambient_glow_alpha: config.ambient_glow_alpha,
            anchored_core_alpha: config.anchored_core_alpha,
            ambient_core_alpha: config.ambient_core_alpha,
            primary_label_size: config.primary_label_size,
            label_size: config.label_size,
            primary_label_alpha: config.primary_label_alpha,
            label_alpha: config.label_alpha,
            label_offset: config.label_offset,
            debug_font_size: config.debug_font_size,
        }
    }
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self::from_config(&SkyConfig::default())
    }
}

/// Everything one frame needs, borrowed from the simulation context.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    /// Source data for the debug overlay.
    pub catalog: &'a Catalog,
    pub nodes: &'a [Node],
    pub edges: &'a [Edge],
    pub labels: &'a [GroupLabel],
    pub connect_distance: f32,
    pub debug: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Renderer {
    pub style: RenderStyle,
}

impl Renderer {
    pub fn new(style: RenderStyle) -> Self {
        Self { style }
    }

    pub fn from_config(config: &SkyConfig) -> Self {
        Self::new(RenderStyle::from_config(config))
    }

    /// Draw one complete frame onto `surface`.
    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S, scene: &Scene<'_>) {
        surface.clear();
        self.draw_mesh(surface, scene);
        self.draw_edges(surface, scene);
        self.draw_stars(surface, scene.nodes);
        self.draw_labels(surface, scene);
        if scene.debug {
            self.draw_debug(surface, scene);
        }
    }

    fn draw_mesh<S: Surface + ?Sized>(&self, surface: &mut S, scene: &Scene<'_>) {
        let positions: Vec<Vec2> = scene.nodes.iter().map(|n| n.position).collect();
        for pair in proximity_pairs(&positions, scene.connect_distance) {
            let alpha = self.style.mesh_alpha * (1.0 - pair.distance / scene.connect_distance);
            surface.stroke_line(
                positions[pair.a],
                positions[pair.b],
                mesh_color().with_alpha(alpha),
                MESH_WIDTH,
            );
        }
    }

    fn draw_edges<S: Surface + ?Sized>(&self, surface: &mut S, scene: &Scene<'_>) {
        for edge in scene.edges {
            let (Some(from), Some(to)) = (scene.nodes.get(edge.from), scene.nodes.get(edge.to))
            else {
                continue;
            };
            if edge.is_primary {
                let alpha = self.style.primary_edge_alpha;
                surface.stroke_gradient_line(
                    from.position,
                    to.position,
                    primary_start_color().with_alpha(alpha),
                    primary_end_color().with_alpha(alpha),
                    PRIMARY_EDGE_WIDTH,
                );
            } else {
                surface.stroke_line(
                    from.position,
                    to.position,
                    edge_color().with_alpha(self.style.edge_alpha),
                    EDGE_WIDTH,
                );
            }
        }
    }

    fn draw_stars<S: Surface + ?Sized>(&self, surface: &mut S, nodes: &[Node]) {
        for node in nodes {
            let (glow_alpha, core_alpha) = if node.is_anchored() {
                (self.style.anchored_glow_alpha, self.style.anchored_core_alpha)
            } else {
                (self.style.ambient_glow_alpha, self.style.ambient_core_alpha)
            };
            surface.fill_radial_gradient(
                node.position,
                node.glow_radius,
                star_color().with_alpha(glow_alpha),
            );
            surface.fill_circle(node.position, node.radius, star_color().with_alpha(core_alpha));
        }
    }

    fn draw_labels<S: Surface + ?Sized>(&self, surface: &mut S, scene: &Scene<'_>) {
        for label in scene.labels {
            let Some(anchor) = label_anchor(scene.nodes, label, self.style.label_offset) else {
                continue;
            };
            let (size, alpha) = if label.is_primary {
                (self.style.primary_label_size, self.style.primary_label_alpha)
            } else {
                (self.style.label_size, self.style.label_alpha)
            };
            surface.fill_text(
                &label.name,
                anchor,
                TextStyle {
                    size,
                    color: label_color().with_alpha(alpha),
                    align: TextAlign::Center,
                },
            );
        }
    }

    fn draw_debug<S: Surface + ?Sized>(&self, surface: &mut S, scene: &Scene<'_>) {
        let style = TextStyle {
            size: self.style.debug_font_size,
            color: debug_color().with_alpha(0.85),
            align: TextAlign::Left,
        };
        let line_height = self.style.debug_font_size + 2.0;

        for (index, node) in scene.nodes.iter().enumerate() {
            let NodeKind::Anchored { group, star, .. } = node.kind else {
                continue;
            };
            let Some(group) = scene.catalog.groups.get(group) else {
                continue;
            };
            let Some(source) = group.stars.get(star) else {
                continue;
            };

            surface.stroke_circle(
                node.position,
                (node.radius * 3.0).max(5.0),
                debug_color().with_alpha(0.6),
            );
            let name = source.label.as_deref().unwrap_or(group.name.as_str());
            let origin = node.position + Vec2::new(8.0, -line_height * 0.5);
            surface.fill_text(&format!("#{index} {name}"), origin, style);
            surface.fill_text(
                &format!(
                    "ra {:.2}  dec {:.2}  mag {:.2}",
                    source.longitude, source.latitude, source.brightness
                ),
                origin + Vec2::new(0.0, line_height),
                style,
            );
        }

        let banner = TextStyle {
            size: self.style.debug_font_size + 2.0,
            ..style
        };
        surface.fill_text(
            "DEBUG  [D] toggle overlay  |  #index label / ra dec mag per star",
            Vec2::new(12.0, 12.0 + banner.size),
            banner,
        );
    }
}

/// Centroid x of the group's members and their largest y plus `offset`.
///
/// `None` for an empty or out-of-range member range.
pub fn label_anchor(nodes: &[Node], label: &GroupLabel, offset: f32) -> Option<Vec2> {
    let members = nodes.get(label.start..label.start + label.count)?;
    if members.is_empty() {
        return None;
    }
    let sum_x: f32 = members.iter().map(|n| n.position.x).sum();
    let max_y = members
        .iter()
        .map(|n| n.position.y)
        .fold(f32::NEG_INFINITY, f32::max);
    Some(Vec2::new(sum_x / members.len() as f32, max_y + offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogGroup, CatalogStar};
    use crate::projection::FlatPoint;
    use crate::surface::{DrawCommand, DrawList};

    fn anchored_at(pos: Vec2, star: usize) -> Node {
        Node::anchored(FlatPoint::default(), 0, star, 0.0, 2.0, 8.0, 0.0, pos)
    }

    fn ambient_at(pos: Vec2) -> Node {
        Node::ambient(Vec2::ZERO, 1.0, 4.0, 0.0, pos, Vec2::ZERO)
    }

    fn catalog() -> Catalog {
        let star = |label: Option<&str>| CatalogStar {
            longitude: 84.91,
            latitude: -34.07,
            brightness: 2.65,
            label: label.map(str::to_owned),
        };
        Catalog::from_groups(vec![CatalogGroup {
            name: "Columba".into(),
            is_primary: true,
            side_bias: 0,
            stars: vec![star(Some("Phact")), star(None)],
            edges: vec![(0, 1)],
        }])
    }

    struct Fixture {
        catalog: Catalog,
        nodes: Vec<Node>,
        edges: Vec<Edge>,
        labels: Vec<GroupLabel>,
    }

    impl Fixture {
        fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
            let anchored = nodes.iter().filter(|n| n.is_anchored()).count();
            Self {
                catalog: catalog(),
                nodes,
                edges,
                labels: vec![GroupLabel {
                    name: "Columba".into(),
                    start: 0,
                    count: anchored,
                    is_primary: true,
                }],
            }
        }

        fn render(&self, debug: bool) -> DrawList {
            let mut list = DrawList::new(Vec2::new(800.0, 600.0));
            Renderer::default().draw(
                &mut list,
                &Scene {
                    catalog: &self.catalog,
                    nodes: &self.nodes,
                    edges: &self.edges,
                    labels: &self.labels,
                    connect_distance: 150.0,
                    debug,
                },
            );
            list
        }
    }

    fn pair() -> Fixture {
        Fixture::new(
            vec![
                anchored_at(Vec2::new(100.0, 100.0), 0),
                anchored_at(Vec2::new(175.0, 100.0), 1),
            ],
            vec![Edge {
                from: 0,
                to: 1,
                is_primary: true,
            }],
        )
    }

    #[test]
    fn mesh_alpha_decays_with_distance() {
        let list = pair().render(false);
        let DrawCommand::Line { color, .. } = list.lines().next().unwrap() else {
            unreachable!()
        };
        let expected = RenderStyle::default().mesh_alpha * 0.5;
        assert!((color.alpha() - expected).abs() < 1e-6);
    }

    #[test]
    fn distant_nodes_get_no_mesh_line() {
        let fixture = Fixture::new(
            vec![ambient_at(Vec2::new(0.0, 0.0)), ambient_at(Vec2::new(150.0, 0.0))],
            vec![],
        );
        assert_eq!(fixture.render(false).lines().count(), 0);
    }

    #[test]
    fn primary_edges_use_gradient() {
        let list = pair().render(false);
        let DrawCommand::GradientLine { start, end, .. } = list.gradient_lines().next().unwrap()
        else {
            unreachable!()
        };
        assert_ne!(start, end);
        assert!((start.alpha() - RenderStyle::default().primary_edge_alpha).abs() < 1e-6);
    }

    #[test]
    fn secondary_edges_use_flat_line() {
        let mut fixture = pair();
        fixture.edges[0].is_primary = false;
        fixture.nodes[1].position = Vec2::new(400.0, 400.0);
        let list = fixture.render(false);
        assert_eq!(list.gradient_lines().count(), 0);
        let DrawCommand::Line { color, .. } = list.lines().next().unwrap() else {
            unreachable!()
        };
        assert!((color.alpha() - RenderStyle::default().edge_alpha).abs() < 1e-6);
    }

    #[test]
    fn passes_draw_in_order() {
        let list = pair().render(false);
        let rank = |c: &DrawCommand| match c {
            DrawCommand::Line { .. } => 0,
            DrawCommand::GradientLine { .. } => 1,
            DrawCommand::Glow { .. } | DrawCommand::Disc { .. } => 2,
            DrawCommand::Text { .. } => 3,
            DrawCommand::CircleOutline { .. } => 4,
        };
        let ranks: Vec<u8> = list.commands.iter().map(rank).collect();
        assert!(ranks.windows(2).all(|w| w[0] <= w[1]), "{ranks:?}");
        assert!(matches!(list.commands[2], DrawCommand::Glow { .. }));
        assert!(matches!(list.commands[3], DrawCommand::Disc { .. }));
    }

    #[test]
    fn ambient_stars_are_dimmer_than_anchored() {
        let fixture = Fixture::new(
            vec![anchored_at(Vec2::new(10.0, 10.0), 0), ambient_at(Vec2::new(500.0, 500.0))],
            vec![],
        );
        let list = fixture.render(false);
        let alphas: Vec<f32> = list
            .discs()
            .map(|c| match c {
                DrawCommand::Disc { color, .. } => color.alpha(),
                _ => unreachable!(),
            })
            .collect();
        assert!(alphas[0] > alphas[1]);
    }

    #[test]
    fn label_sits_under_lowest_member_at_centroid() {
        let list = pair().render(false);
        let (text, pos, style) = list.texts().next().unwrap();
        assert_eq!(text, "Columba");
        assert_eq!(pos, Vec2::new(137.5, 100.0 + RenderStyle::default().label_offset));
        assert_eq!(style.align, TextAlign::Center);
        assert_eq!(style.size, RenderStyle::default().primary_label_size);
    }

    #[test]
    fn empty_label_range_is_skipped() {
        let nodes = vec![ambient_at(Vec2::ZERO)];
        let label = GroupLabel {
            name: "Gone".into(),
            start: 0,
            count: 0,
            is_primary: false,
        };
        assert_eq!(label_anchor(&nodes, &label, 18.0), None);
    }

    #[test]
    fn debug_overlay_appears_only_when_enabled() {
        let fixture = pair();
        let plain = fixture.render(false);
        let debug = fixture.render(true);
        assert_eq!(plain.texts().count(), 1);
        // Two lines per anchored star plus the banner.
        assert_eq!(debug.texts().count(), 1 + 2 * 2 + 1);
        assert!(debug.texts().any(|(t, _, _)| t == "#0 Phact"));
        assert!(debug.texts().any(|(t, _, _)| t == "#1 Columba"));
        assert!(debug.texts().any(|(t, _, _)| t.contains("mag 2.65")));
        let markers = debug
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::CircleOutline { .. }))
            .count();
        assert_eq!(markers, 2);
    }

    #[test]
    fn drawing_twice_gives_identical_frames() {
        let fixture = pair();
        assert_eq!(fixture.render(true), fixture.render(true));
    }
}
