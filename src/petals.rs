//! Flower petal geometry
//!
//! Five petals at equal angular steps around the origin plus a centre accent.
//! Stateless, so attached blossoms and falling flower particles share it.

use crate::colors::flower_colors;
use crate::config::FlowerStyle;
use crate::surface::{Path, Surface, Vec2};
use std::f32::consts::TAU;

pub const PETAL_COUNT: usize = 5;
const CENTER_RATIO: f32 = 0.2;

/// Outline of one petal pointing up (negative y) from the origin
pub enum PetalShape {
    Ellipse { center: Vec2, rx: f32, ry: f32 },
    Outline(Path),
}

pub fn petal_shape(style: FlowerStyle, size: f32) -> PetalShape {
    let s = size;
    match style {
        FlowerStyle::Peach => PetalShape::Ellipse {
            center: Vec2::new(0.0, -s * 0.5),
            rx: s * 0.34,
            ry: s * 0.5,
        },
        // Pointed, curved petal with a shallow notch at the tip
        FlowerStyle::Sakura => PetalShape::Outline(
            Path::new()
                .move_to(Vec2::ZERO)
                .quad_to(Vec2::new(-s * 0.6, -s * 0.55), Vec2::new(-s * 0.14, -s))
                .line_to(Vec2::new(0.0, -s * 0.86))
                .line_to(Vec2::new(s * 0.14, -s))
                .quad_to(Vec2::new(s * 0.6, -s * 0.55), Vec2::ZERO)
                .close(),
        ),
        // Spoon: thin claw near the centre opening into a round blade
        FlowerStyle::Delonix => PetalShape::Outline(
            Path::new()
                .move_to(Vec2::ZERO)
                .cubic_to(Vec2::new(-s * 0.06, -s * 0.45), Vec2::new(-s * 0.62, -s * 1.05), Vec2::new(0.0, -s))
                .cubic_to(Vec2::new(s * 0.62, -s * 1.05), Vec2::new(s * 0.06, -s * 0.45), Vec2::ZERO)
                .close(),
        ),
    }
}

/// Draw a flower of `style` centred on the current origin
pub fn draw_petals(surface: &mut dyn Surface, style: FlowerStyle, size: f32, alpha: f32) {
    if !(size > 0.0) {
        return;
    }
    let (petal_color, center_color) = flower_colors(style);
    let petal_color = petal_color.with_alpha(alpha);

    let step = TAU / PETAL_COUNT as f32;
    for i in 0..PETAL_COUNT {
        surface.save();
        surface.rotate(step * i as f32);
        match petal_shape(style, size) {
            PetalShape::Ellipse { center, rx, ry } => {
                surface.fill_ellipse(center, rx, ry, 0.0, petal_color)
            }
            PetalShape::Outline(path) => surface.fill_path(&path, petal_color),
        }
        surface.restore();
    }

    let r = size * CENTER_RATIO;
    surface.fill_ellipse(Vec2::ZERO, r, r, 0.0, center_color.with_alpha(alpha));
}
