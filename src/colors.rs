use crate::config::FlowerStyle;
use crossterm::style::Color;

/// An RGB colour with straight (non-premultiplied) alpha in `[0, 1]`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a: a.clamp(0.0, 1.0), ..self }
    }

    /// Linear blend toward `other`; `t` is clamped to `[0, 1]`
    pub fn lerp(self, other: Rgba, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// Darken toward near-black, keeping alpha
    pub fn darken(self, amount: f32) -> Self {
        let a = self.a;
        self.lerp(palette::NEAR_BLACK, amount).with_alpha(a)
    }

    /// Composite this colour over an opaque background
    pub fn over(self, dst: Rgba) -> Rgba {
        let a = self.a.clamp(0.0, 1.0);
        let mix = |s: u8, d: u8| (s as f32 * a + d as f32 * (1.0 - a)).round() as u8;
        Rgba::rgb(mix(self.r, dst.r), mix(self.g, dst.g), mix(self.b, dst.b))
    }

    pub fn to_terminal(self) -> Color {
        Color::Rgb { r: self.r, g: self.g, b: self.b }
    }
}

/// Tree colours, dormant to thriving
pub mod palette {
    use super::Rgba;

    pub const BACKGROUND: Rgba = Rgba::rgb(0, 0, 0);
    pub const NEAR_BLACK: Rgba = Rgba::rgb(18, 14, 12);

    // Bark: grey-brown when dormant, warm brown when thriving
    pub const BARK_DORMANT: Rgba = Rgba::rgb(104, 96, 88);
    pub const BARK_THRIVING: Rgba = Rgba::rgb(139, 90, 43);

    pub const LEAF_YOUNG: Rgba = Rgba::rgb(154, 190, 92);
    pub const LEAF_LUSH: Rgba = Rgba::rgb(50, 168, 64);
    pub const LEAF_DEAD: Rgba = Rgba::rgb(150, 104, 46);
}

/// Petal and centre colours for a flower style
pub fn flower_colors(style: FlowerStyle) -> (Rgba, Rgba) {
    match style {
        FlowerStyle::Peach => (Rgba::rgb(255, 160, 170), Rgba::rgb(255, 214, 102)),
        FlowerStyle::Sakura => (Rgba::rgb(255, 205, 222), Rgba::rgb(214, 84, 124)),
        FlowerStyle::Delonix => (Rgba::rgb(232, 64, 38), Rgba::rgb(255, 226, 120)),
    }
}

/// Branch colour for the current bloom and wither factors
pub fn bark_color(bloom: f32, wither: f32) -> Rgba {
    palette::BARK_DORMANT
        .lerp(palette::BARK_THRIVING, bloom)
        .darken(wither * 0.85)
}

/// Attached leaf colour: young green to lush green, browning as the tree withers
pub fn leaf_color(bloom: f32, wither: f32) -> Rgba {
    palette::LEAF_YOUNG
        .lerp(palette::LEAF_LUSH, bloom)
        .lerp(palette::LEAF_DEAD, wither)
}
