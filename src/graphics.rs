//! Bevy presenter: replays the recorded [`DrawList`] on screen.
//!
//! | Command kind            | Backend                                              |
//! |-------------------------|------------------------------------------------------|
//! | lines                   | pooled `Mesh2d` quads, shared unit quad              |
//! | gradient lines          | pooled `Mesh2d` quads, per-slot vertex-coloured quad |
//! | glows, discs            | pooled `Mesh2d` entities, shared unit fans           |
//! | text                    | pooled `Text2d` entities                             |
//! | circle outlines         | Gizmos, re-issued every frame                        |
//!
//! Draw order becomes z order: command `i` sits at `SHAPE_Z + i * Z_STEP`, so
//! mesh and constellation lines stay under the star glows.  Gizmos always
//! render after every 2D mesh; only the debug markers use them, and those are
//! the last pass anyway.
//!
//! Pooled entities are only touched when the draw list changes, so a held
//! reduced-motion frame costs nothing beyond the marker replay.  Unused pool
//! slots are hidden, never despawned.

use crate::simulation::SkyField;
use crate::surface::{DrawCommand, DrawList, Surface, TextAlign};
use bevy::prelude::*;
use bevy_asset::RenderAssetUsages;
use bevy_mesh::{Indices, PrimitiveTopology};
use std::f32::consts::TAU;

const SHAPE_Z: f32 = 1.0;
const Z_STEP: f32 = 1e-4;
const TEXT_Z: f32 = 5.0;
const FAN_SIDES: usize = 24;

/// Shared unit meshes; every pooled shape scales one of these.
#[derive(Resource)]
pub struct ShapeMeshes {
    pub disc: Handle<Mesh>,
    pub glow: Handle<Mesh>,
    /// Unit square centred on the origin, for flat lines.
    pub quad: Handle<Mesh>,
    /// White material for gradient quads; their colour lives in the vertices.
    pub vertex_tint: Handle<ColorMaterial>,
}

/// Marks a pooled line, glow or disc entity.
#[derive(Component)]
pub struct PooledShape;

/// Marks a pooled text entity.
#[derive(Component)]
pub struct PooledLabel;

type ShapeQuery<'w, 's> =
    Query<'w, 's, (&'static mut Transform, &'static mut Visibility), (With<PooledShape>, Without<PooledLabel>)>;

#[derive(Debug)]
struct ShapeSlot {
    entity: Entity,
    material: Handle<ColorMaterial>,
}

#[derive(Debug)]
struct GradientSlot {
    entity: Entity,
    mesh: Handle<Mesh>,
    colors: (Color, Color),
}

/// Entities reused across frames, indexed by per-kind ordinal.
#[derive(Resource, Default, Debug)]
pub struct PresentPool {
    lines: Vec<ShapeSlot>,
    gradients: Vec<GradientSlot>,
    glows: Vec<ShapeSlot>,
    discs: Vec<ShapeSlot>,
    labels: Vec<Entity>,
}

/// Setup camera for 2D rendering
pub fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
    info!("[SETUP] Camera spawned");
}

/// Create the shared disc, glow and line meshes.
pub fn init_shape_meshes(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    commands.insert_resource(ShapeMeshes {
        disc: meshes.add(fan_mesh(FAN_SIDES, 1.0)),
        glow: meshes.add(fan_mesh(FAN_SIDES, 0.0)),
        quad: meshes.add(line_quad_mesh(Color::WHITE, Color::WHITE)),
        vertex_tint: materials.add(ColorMaterial::from_color(Color::WHITE)),
    });
}

/// Unit-radius triangle fan.  The centre vertex is opaque white and the rim
/// carries `rim_alpha`; the material colour tints both, so `rim_alpha = 0`
/// yields a radial fade.
pub fn fan_mesh(sides: usize, rim_alpha: f32) -> Mesh {
    let sides = sides.max(3);
    let mut positions: Vec<[f32; 3]> = Vec::with_capacity(sides + 1);
    let mut colors: Vec<[f32; 4]> = Vec::with_capacity(sides + 1);
    let mut indices: Vec<u32> = Vec::with_capacity(sides * 3);

    positions.push([0.0, 0.0, 0.0]);
    colors.push([1.0, 1.0, 1.0, 1.0]);
    for i in 0..sides {
        let angle = i as f32 / sides as f32 * TAU;
        positions.push([angle.cos(), angle.sin(), 0.0]);
        colors.push([1.0, 1.0, 1.0, rim_alpha]);
    }
    for i in 0..sides as u32 {
        let next = (i + 1) % sides as u32;
        indices.extend_from_slice(&[0, i + 1, next + 1]);
    }

    let normals = vec![[0.0, 0.0, 1.0]; positions.len()];
    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::RENDER_WORLD,
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, colors);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

/// Vertex colours for a line quad: `start` on the `-x` edge, `end` on `+x`.
fn quad_colors(start: Color, end: Color) -> Vec<[f32; 4]> {
    let start = start.to_linear().to_f32_array();
    let end = end.to_linear().to_f32_array();
    vec![start, end, end, start]
}

/// Unit square `[-0.5, 0.5]²` whose colour blends from `start` to `end` along x.
pub fn line_quad_mesh(start: Color, end: Color) -> Mesh {
    let positions: Vec<[f32; 3]> = vec![
        [-0.5, -0.5, 0.0],
        [0.5, -0.5, 0.0],
        [0.5, 0.5, 0.0],
        [-0.5, 0.5, 0.0],
    ];
    let normals = vec![[0.0, 0.0, 1.0]; 4];
    // RENDER_WORLD | MAIN_WORLD: gradient slots rewrite their colours in place.
    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, quad_colors(start, end));
    mesh.insert_indices(Indices::U32(vec![0, 1, 2, 0, 2, 3]));
    mesh
}

/// Viewport (top-left origin, y down) to world (centred, y up).
#[inline]
pub fn to_world(point: Vec2, size: Vec2) -> Vec2 {
    Vec2::new(point.x - size.x * 0.5, size.y * 0.5 - point.y)
}

/// Transform stretching the unit quad from world point `a` to `b`.
pub fn line_transform(a: Vec2, b: Vec2, width: f32, z: f32) -> Transform {
    let delta = b - a;
    let length = delta.length();
    let angle = if length > 0.0 { delta.y.atan2(delta.x) } else { 0.0 };
    Transform::from_translation(((a + b) * 0.5).extend(z))
        .with_rotation(Quat::from_rotation_z(angle))
        .with_scale(Vec3::new(length, width, 1.0))
}

/// Scale the debug-marker gizmo width by the capped device-pixel ratio.
pub fn sync_gizmo_width_system(
    mut store: ResMut<GizmoConfigStore>,
    field: Option<Res<SkyField>>,
) {
    let Some(field) = field else {
        return;
    };
    if !field.is_changed() {
        return;
    }
    let (config, _) = store.config_mut::<DefaultGizmoConfigGroup>();
    config.line.width = field.viewport().pixel_ratio;
}

/// Re-issue the circle outlines as gizmos.  Runs every frame.
pub fn present_gizmos_system(mut gizmos: Gizmos, frame: Res<DrawList>) {
    let size = frame.size;
    for command in &frame.commands {
        if let DrawCommand::CircleOutline {
            center,
            radius,
            color,
        } = command
        {
            gizmos.circle_2d(
                Isometry2d::from_translation(to_world(*center, size)),
                *radius,
                *color,
            );
        }
    }
}

/// Sync pooled line, glow, disc and text entities with the draw list.
#[allow(clippy::too_many_arguments)]
pub fn present_shapes_system(
    mut commands: Commands,
    shape_meshes: Option<Res<ShapeMeshes>>,
    frame: Res<DrawList>,
    mut pool: ResMut<PresentPool>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    mut shapes: ShapeQuery,
    mut labels: Query<
        (
            &mut Text2d,
            &mut TextFont,
            &mut TextColor,
            &mut Transform,
            &mut Visibility,
        ),
        (With<PooledLabel>, Without<PooledShape>),
    >,
) {
    if !frame.is_changed() {
        return;
    }
    let Some(shape_meshes) = shape_meshes else {
        return;
    };
    let size = frame.size;
    let pool = &mut *pool;
    let (mut line_count, mut gradient_count) = (0, 0);
    let (mut glow_count, mut disc_count, mut label_count) = (0, 0, 0);

    for (index, command) in frame.commands.iter().enumerate() {
        let z = SHAPE_Z + index as f32 * Z_STEP;
        match command {
            DrawCommand::Line {
                from,
                to,
                color,
                width,
            } => {
                let transform =
                    line_transform(to_world(*from, size), to_world(*to, size), *width, z);
                sync_shape(
                    &mut commands,
                    &mut pool.lines,
                    line_count,
                    &shape_meshes.quad,
                    &mut materials,
                    &mut shapes,
                    transform,
                    *color,
                );
                line_count += 1;
            }
            DrawCommand::GradientLine {
                from,
                to,
                start,
                end,
                width,
            } => {
                let transform =
                    line_transform(to_world(*from, size), to_world(*to, size), *width, z);
                sync_gradient(
                    &mut commands,
                    &mut pool.gradients,
                    gradient_count,
                    &shape_meshes.vertex_tint,
                    &mut meshes,
                    &mut shapes,
                    transform,
                    (*start, *end),
                );
                gradient_count += 1;
            }
            DrawCommand::Glow {
                center,
                radius,
                inner,
            } => {
                let transform = shape_transform(to_world(*center, size), *radius, z);
                sync_shape(
                    &mut commands,
                    &mut pool.glows,
                    glow_count,
                    &shape_meshes.glow,
                    &mut materials,
                    &mut shapes,
                    transform,
                    *inner,
                );
                glow_count += 1;
            }
            DrawCommand::Disc {
                center,
                radius,
                color,
            } => {
                let transform = shape_transform(to_world(*center, size), *radius, z);
                sync_shape(
                    &mut commands,
                    &mut pool.discs,
                    disc_count,
                    &shape_meshes.disc,
                    &mut materials,
                    &mut shapes,
                    transform,
                    *color,
                );
                disc_count += 1;
            }
            DrawCommand::Text {
                text,
                position,
                style,
            } => {
                let mut anchor = *position;
                if style.align == TextAlign::Left {
                    anchor.x += frame.measure_text(text, style.size) * 0.5;
                }
                let world = to_world(anchor, size);
                let transform = Transform::from_translation(world.extend(TEXT_Z));

                if let Some(&entity) = pool.labels.get(label_count) {
                    if let Ok((mut text2d, mut font, mut color, mut tf, mut vis)) =
                        labels.get_mut(entity)
                    {
                        if text2d.0 != *text {
                            text2d.0.clone_from(text);
                        }
                        if font.font_size != style.size {
                            font.font_size = style.size;
                        }
                        color.0 = style.color;
                        *tf = transform;
                        *vis = Visibility::Visible;
                    }
                } else {
                    let entity = commands
                        .spawn((
                            Text2d::new(text.clone()),
                            TextFont {
                                font_size: style.size,
                                ..default()
                            },
                            TextColor(style.color),
                            transform,
                            Visibility::Visible,
                            PooledLabel,
                        ))
                        .id();
                    pool.labels.push(entity);
                }
                label_count += 1;
            }
            DrawCommand::CircleOutline { .. } => {}
        }
    }

    hide_unused(pool.lines.iter().skip(line_count).map(|s| s.entity), &mut shapes);
    hide_unused(
        pool.gradients.iter().skip(gradient_count).map(|s| s.entity),
        &mut shapes,
    );
    hide_unused(pool.glows.iter().skip(glow_count).map(|s| s.entity), &mut shapes);
    hide_unused(pool.discs.iter().skip(disc_count).map(|s| s.entity), &mut shapes);
    for &entity in pool.labels.iter().skip(label_count) {
        if let Ok((_, _, _, _, mut vis)) = labels.get_mut(entity) {
            *vis = Visibility::Hidden;
        }
    }
}

fn shape_transform(world: Vec2, radius: f32, z: f32) -> Transform {
    Transform::from_translation(world.extend(z)).with_scale(Vec3::new(radius, radius, 1.0))
}

#[allow(clippy::too_many_arguments)]
fn sync_shape(
    commands: &mut Commands,
    slots: &mut Vec<ShapeSlot>,
    ordinal: usize,
    mesh: &Handle<Mesh>,
    materials: &mut Assets<ColorMaterial>,
    shapes: &mut ShapeQuery,
    transform: Transform,
    color: Color,
) {
    if let Some(slot) = slots.get(ordinal) {
        if let Some(material) = materials.get_mut(&slot.material) {
            material.color = color;
        }
        if let Ok((mut tf, mut vis)) = shapes.get_mut(slot.entity) {
            *tf = transform;
            *vis = Visibility::Visible;
        }
        return;
    }

    let material = materials.add(ColorMaterial::from_color(color));
    let entity = commands
        .spawn((
            Mesh2d(mesh.clone()),
            MeshMaterial2d(material.clone()),
            transform,
            Visibility::Visible,
            PooledShape,
        ))
        .id();
    slots.push(ShapeSlot { entity, material });
}

#[allow(clippy::too_many_arguments)]
fn sync_gradient(
    commands: &mut Commands,
    slots: &mut Vec<GradientSlot>,
    ordinal: usize,
    material: &Handle<ColorMaterial>,
    meshes: &mut Assets<Mesh>,
    shapes: &mut ShapeQuery,
    transform: Transform,
    colors: (Color, Color),
) {
    if let Some(slot) = slots.get_mut(ordinal) {
        if slot.colors != colors {
            if let Some(mesh) = meshes.get_mut(&slot.mesh) {
                mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, quad_colors(colors.0, colors.1));
            }
            slot.colors = colors;
        }
        if let Ok((mut tf, mut vis)) = shapes.get_mut(slot.entity) {
            *tf = transform;
            *vis = Visibility::Visible;
        }
        return;
    }

    let mesh = meshes.add(line_quad_mesh(colors.0, colors.1));
    let entity = commands
        .spawn((
            Mesh2d(mesh.clone()),
            MeshMaterial2d(material.clone()),
            transform,
            Visibility::Visible,
            PooledShape,
        ))
        .id();
    slots.push(GradientSlot {
        entity,
        mesh,
        colors,
    });
}

fn hide_unused(entities: impl Iterator<Item = Entity>, shapes: &mut ShapeQuery) {
    for entity in entities {
        if let Ok((_, mut vis)) = shapes.get_mut(entity) {
            *vis = Visibility::Hidden;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_mesh::VertexAttributeValues;

    #[test]
    fn world_conversion_centres_and_flips_y() {
        let size = Vec2::new(800.0, 600.0);
        assert_eq!(to_world(Vec2::new(400.0, 300.0), size), Vec2::ZERO);
        assert_eq!(to_world(Vec2::ZERO, size), Vec2::new(-400.0, 300.0));
        assert_eq!(to_world(Vec2::new(800.0, 600.0), size), Vec2::new(400.0, -300.0));
    }

    #[test]
    fn glow_fan_fades_to_transparent_rim() {
        let mesh = fan_mesh(8, 0.0);
        let Some(VertexAttributeValues::Float32x4(colors)) = mesh.attribute(Mesh::ATTRIBUTE_COLOR)
        else {
            panic!("fan mesh has no vertex colours");
        };
        assert_eq!(colors.len(), 9);
        assert_eq!(colors[0][3], 1.0);
        assert!(colors[1..].iter().all(|c| c[3] == 0.0));
        assert_eq!(mesh.indices().map(|i| i.len()), Some(8 * 3));
    }

    #[test]
    fn fan_has_at_least_three_sides() {
        let mesh = fan_mesh(1, 1.0);
        assert_eq!(mesh.count_vertices(), 4);
    }

    #[test]
    fn line_transform_maps_quad_ends_onto_endpoints() {
        let (a, b) = (Vec2::new(-30.0, 10.0), Vec2::new(50.0, 70.0));
        let tf = line_transform(a, b, 1.5, 1.0);
        let start = tf.transform_point(Vec3::new(-0.5, 0.0, 0.0)).truncate();
        let end = tf.transform_point(Vec3::new(0.5, 0.0, 0.0)).truncate();
        assert!(start.distance(a) < 1e-3, "{start:?} vs {a:?}");
        assert!(end.distance(b) < 1e-3, "{end:?} vs {b:?}");
        let edge = tf.transform_point(Vec3::new(0.0, 0.5, 0.0)).truncate();
        assert!((edge.distance((a + b) * 0.5) - 0.75).abs() < 1e-3);
    }

    #[test]
    fn zero_length_line_collapses_without_nan() {
        let tf = line_transform(Vec2::ONE, Vec2::ONE, 1.0, 1.0);
        assert!(tf.translation.is_finite() && tf.rotation.is_finite());
        assert_eq!(tf.scale.x, 0.0);
    }

    #[test]
    fn gradient_quad_blends_along_its_length() {
        let start = Color::srgb(1.0, 0.0, 0.0);
        let end = Color::srgb(0.0, 0.0, 1.0);
        let mesh = line_quad_mesh(start, end);
        let Some(VertexAttributeValues::Float32x4(colors)) = mesh.attribute(Mesh::ATTRIBUTE_COLOR)
        else {
            panic!("line quad has no vertex colours");
        };
        let Some(VertexAttributeValues::Float32x3(positions)) =
            mesh.attribute(Mesh::ATTRIBUTE_POSITION)
        else {
            panic!("line quad has no positions");
        };
        for (pos, color) in positions.iter().zip(colors) {
            let expected = if pos[0] < 0.0 { start } else { end };
            assert_eq!(*color, expected.to_linear().to_f32_array());
        }
    }

    #[test]
    fn draw_order_is_preserved_in_z() {
        let lines_z = SHAPE_Z;
        let glow_z = SHAPE_Z + 5.0 * Z_STEP;
        assert!(lines_z < glow_z && glow_z < TEXT_Z);
    }
}
