//! The drawing-surface seam between the renderer and a graphics backend.
//!
//! [`Renderer`](crate::rendering::Renderer) only ever talks to a [`Surface`].
//! The live app records into a [`DrawList`] which the Bevy presenter replays
//! each frame; tests inspect the same `DrawList` directly.
//!
//! Coordinates are logical viewport pixels, origin top-left, y down.

use bevy::prelude::*;

/// Horizontal anchoring of a text run relative to its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
}

/// Font size, colour and alignment of one text run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub color: Color,
    pub align: TextAlign,
}

/// Immediate-mode 2D drawing operations.
pub trait Surface {
    /// Discard everything drawn so far this frame.
    fn clear(&mut self);

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Color, width: f32);

    /// Line whose colour blends linearly from `start` at `from` to `end` at `to`.
    fn stroke_gradient_line(&mut self, from: Vec2, to: Vec2, start: Color, end: Color, width: f32);

    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Color);

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color);

    /// Radial fill: `inner` at the centre fading to fully transparent at `radius`.
    fn fill_radial_gradient(&mut self, center: Vec2, radius: f32, inner: Color);

    fn fill_text(&mut self, text: &str, position: Vec2, style: TextStyle);

    /// Advance width of `text` at `size`.  The default is a fixed-pitch
    /// estimate; backends with real font metrics override it.
    fn measure_text(&self, text: &str, size: f32) -> f32 {
        text.chars().count() as f32 * size * 0.55
    }
}

/// One recorded drawing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Line {
        from: Vec2,
        to: Vec2,
        color: Color,
        width: f32,
    },
    GradientLine {
        from: Vec2,
        to: Vec2,
        start: Color,
        end: Color,
        width: f32,
    },
    CircleOutline {
        center: Vec2,
        radius: f32,
        color: Color,
    },
    Disc {
        center: Vec2,
        radius: f32,
        color: Color,
    },
    Glow {
        center: Vec2,
        radius: f32,
        inner: Color,
    },
    Text {
        text: String,
        position: Vec2,
        style: TextStyle,
    },
}

/// Recording surface: the frame's commands in draw order.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    /// Viewport size the commands were recorded for.
    pub size: Vec2,
    pub commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            commands: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter().filter(|c| matches!(c, DrawCommand::Line { .. }))
    }

    pub fn gradient_lines(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::GradientLine { .. }))
    }

    pub fn discs(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter().filter(|c| matches!(c, DrawCommand::Disc { .. }))
    }

    pub fn glows(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter().filter(|c| matches!(c, DrawCommand::Glow { .. }))
    }

    /// Text runs as `(text, position, style)`.
    pub fn texts(&self) -> impl Iterator<Item = (&str, Vec2, TextStyle)> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text {
                text,
                position,
                style,
            } => Some((text.as_str(), *position, *style)),
            _ => None,
        })
    }
}

impl Surface for DrawList {
    fn clear(&mut self) {
        self.commands.clear();
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Color, width: f32) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            color,
            width,
        });
    }

    fn stroke_gradient_line(&mut self, from: Vec2, to: Vec2, start: Color, end: Color, width: f32) {
        self.commands.push(DrawCommand::GradientLine {
            from,
            to,
            start,
            end,
            width,
        });
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.commands.push(DrawCommand::CircleOutline {
            center,
            radius,
            color,
        });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.commands.push(DrawCommand::Disc {
            center,
            radius,
            color,
        });
    }

    fn fill_radial_gradient(&mut self, center: Vec2, radius: f32, inner: Color) {
        self.commands.push(DrawCommand::Glow {
            center,
            radius,
            inner,
        });
    }

    fn fill_text(&mut self, text: &str, position: Vec2, style: TextStyle) {
        self.commands.push(DrawCommand::Text {
            text: text.to_owned(),
            position,
            style,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_discards_recorded_commands_but_keeps_size() {
        let mut list = DrawList::new(Vec2::new(640.0, 480.0));
        list.fill_circle(Vec2::ZERO, 2.0, Color::WHITE);
        list.stroke_line(Vec2::ZERO, Vec2::ONE, Color::WHITE, 1.0);
        assert_eq!(list.len(), 2);
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.size, Vec2::new(640.0, 480.0));
    }

    #[test]
    fn filters_select_by_command_kind() {
        let mut list = DrawList::default();
        list.fill_radial_gradient(Vec2::ZERO, 8.0, Color::WHITE);
        list.fill_circle(Vec2::ZERO, 2.0, Color::WHITE);
        list.fill_text(
            "Columba",
            Vec2::new(5.0, 5.0),
            TextStyle {
                size: 14.0,
                color: Color::WHITE,
                align: TextAlign::Center,
            },
        );
        assert_eq!(list.glows().count(), 1);
        assert_eq!(list.discs().count(), 1);
        assert_eq!(list.lines().count(), 0);
        let (text, pos, style) = list.texts().next().unwrap();
        assert_eq!(text, "Columba");
        assert_eq!(pos, Vec2::new(5.0, 5.0));
        assert_eq!(style.align, TextAlign::Center);
    }

    #[test]
    fn default_text_measure_grows_with_length_and_size() {
        let list = DrawList::default();
        assert!(list.measure_text("Canis Major", 11.0) > list.measure_text("Vela", 11.0));
        assert!(list.measure_text("Vela", 14.0) > list.measure_text("Vela", 11.0));
        assert_eq!(list.measure_text("", 14.0), 0.0);
    }
}
