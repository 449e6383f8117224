//! Braille-dot raster surface
//!
//! Each terminal cell holds a 2x4 grid of braille dots. The engine draws in
//! logical units; `scale` logical units map onto one dot so tree proportions
//! look the same whatever the terminal size.

use crate::colors::{palette, Rgba};
use crate::surface::{Affine, Path, Surface, TransformStack, Vec2};
use crate::terminal::Terminal;

const ELLIPSE_SEGMENTS: usize = 16;
const CURVE_STEPS: usize = 8;
/// Dots with less coverage than this are left unlit
const MIN_ALPHA: f32 = 0.08;

/// Dot bit for (column, row) inside a cell, in the Unicode braille order
const DOT_BITS: [[u8; 2]; 4] = [[0x01, 0x08], [0x02, 0x10], [0x04, 0x20], [0x40, 0x80]];

pub struct BrailleCanvas {
    cols: u16,
    rows: u16,
    scale: f32,
    dots: Vec<Option<Rgba>>,
    stack: TransformStack,
}

impl BrailleCanvas {
    pub fn new(cols: u16, rows: u16, scale: f32) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        Self {
            cols,
            rows,
            scale,
            dots: vec![None; cols as usize * 2 * rows as usize * 4],
            stack: TransformStack::new(),
        }
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        self.dots = vec![None; self.dot_width() * self.dot_height()];
        self.stack.reset();
    }

    pub fn cells(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    fn dot_width(&self) -> usize {
        self.cols as usize * 2
    }

    fn dot_height(&self) -> usize {
        self.rows as usize * 4
    }

    /// Unlight every dot and reset the transform
    pub fn clear(&mut self) {
        self.dots.fill(None);
        self.stack.reset();
    }

    pub fn dot(&self, x: usize, y: usize) -> Option<Rgba> {
        if x < self.dot_width() && y < self.dot_height() {
            self.dots[y * self.dot_width() + x]
        } else {
            None
        }
    }

    pub fn lit_count(&self) -> usize {
        self.dots.iter().filter(|d| d.is_some()).count()
    }

    fn plot(&mut self, x: i32, y: i32, color: Rgba) {
        if color.a < MIN_ALPHA || x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        let w = self.dot_width();
        if x >= w || y >= self.dot_height() {
            return;
        }
        let slot = &mut self.dots[y * w + x];
        let under = slot.unwrap_or(palette::BACKGROUND);
        *slot = Some(color.over(under));
    }

    /// Local point to dot space
    fn project(&self, p: Vec2) -> Vec2 {
        let s = self.stack.current().apply(p);
        Vec2::new(s.x / self.scale, s.y / self.scale)
    }

    /// Keeps far off-canvas coordinates from turning into huge walks
    fn clip(&self, v: f32, extent: usize) -> i32 {
        let limit = (extent * 2 + 16) as f32;
        v.floor().clamp(-limit, limit) as i32
    }

    fn line_dots(&mut self, a: Vec2, b: Vec2, color: Rgba) {
        let (w, h) = (self.dot_width(), self.dot_height());
        let (x0, y0) = (self.clip(a.x, w), self.clip(a.y, h));
        let (x1, y1) = (self.clip(b.x, w), self.clip(b.y, h));

        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x0, y0);

        loop {
            self.plot(x, y, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Even-odd scanline fill sampled at dot centres. Shapes smaller than a
    /// dot still light the dot under their centroid.
    fn fill_polygon(&mut self, points: &[Vec2], color: Rgba) {
        if points.len() < 3 {
            return;
        }
        let min_y = points.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
        let max_y = points.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);
        if !min_y.is_finite() || !max_y.is_finite() {
            return;
        }

        let top = min_y.floor().max(0.0) as i32;
        let bottom = (max_y.ceil() as i32).min(self.dot_height() as i32 - 1);
        let mut filled = 0usize;
        let mut crossings: Vec<f32> = Vec::with_capacity(8);

        for row in top..=bottom {
            let yc = row as f32 + 0.5;
            crossings.clear();
            for (i, a) in points.iter().enumerate() {
                let b = points[(i + 1) % points.len()];
                if (a.y <= yc) != (b.y <= yc) {
                    let t = (yc - a.y) / (b.y - a.y);
                    crossings.push(a.x + t * (b.x - a.x));
                }
            }
            crossings.sort_by(|l, r| l.total_cmp(r));
            for span in crossings.chunks_exact(2) {
                let start = (span[0] - 0.5).ceil() as i32;
                let end = (span[1] - 0.5).floor().min(self.dot_width() as f32) as i32;
                for col in start.max(0)..=end {
                    self.plot(col, row, color);
                    filled += 1;
                }
            }
        }

        if filled == 0 {
            let n = points.len() as f32;
            let cx = points.iter().map(|p| p.x).sum::<f32>() / n;
            let cy = points.iter().map(|p| p.y).sum::<f32>() / n;
            self.plot(cx.floor() as i32, cy.floor() as i32, color);
        }
    }

    /// Braille glyph and blended colour for one terminal cell
    pub fn cell(&self, cx: u16, cy: u16) -> Option<(char, Rgba)> {
        let (bx, by) = (cx as usize * 2, cy as usize * 4);
        let mut mask = 0u8;
        let mut sum = [0u32; 3];
        let mut lit = 0u32;

        for (dy, bits) in DOT_BITS.iter().enumerate() {
            for (dx, bit) in bits.iter().enumerate() {
                if let Some(c) = self.dot(bx + dx, by + dy) {
                    mask |= bit;
                    sum[0] += c.r as u32;
                    sum[1] += c.g as u32;
                    sum[2] += c.b as u32;
                    lit += 1;
                }
            }
        }
        if lit == 0 {
            return None;
        }
        let ch = char::from_u32(0x2800 + mask as u32).unwrap_or(' ');
        let avg = |v: u32| (v / lit) as u8;
        Some((ch, Rgba::rgb(avg(sum[0]), avg(sum[1]), avg(sum[2]))))
    }

    /// Copy lit cells into the terminal back buffer
    pub fn blit(&self, term: &mut Terminal) {
        for cy in 0..self.rows {
            for cx in 0..self.cols {
                if let Some((ch, color)) = self.cell(cx, cy) {
                    term.set(cx as i32, cy as i32, ch, Some(color.to_terminal()), false);
                }
            }
        }
    }
}

impl Surface for BrailleCanvas {
    fn width(&self) -> f32 {
        self.dot_width() as f32 * self.scale
    }

    fn height(&self) -> f32 {
        self.dot_height() as f32 * self.scale
    }

    fn save(&mut self) {
        self.stack.save();
    }

    fn restore(&mut self) {
        self.stack.restore();
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.stack.translate(dx, dy);
    }

    fn rotate(&mut self, radians: f32) {
        self.stack.rotate(radians);
    }

    fn scale(&mut self, sx: f32, sy: f32) {
        self.stack.scale(sx, sy);
    }

    fn transform(&self) -> Affine {
        self.stack.current()
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba) {
        let a = self.project(from);
        let b = self.project(to);
        let thickness = width * self.stack.current().scale_factor() / self.scale;

        if thickness > 1.5 {
            let dir = b - a;
            let len = dir.length();
            if len > f32::EPSILON {
                let n = Vec2::new(-dir.y / len, dir.x / len) * (thickness * 0.5);
                self.fill_polygon(&[a + n, b + n, b - n, a - n], color);
            }
        }
        self.line_dots(a, b, color);
    }

    fn fill_ellipse(&mut self, center: Vec2, rx: f32, ry: f32, rotation: f32, color: Rgba) {
        if !(rx > 0.0 && ry > 0.0) {
            return;
        }
        let points: Vec<Vec2> = (0..ELLIPSE_SEGMENTS)
            .map(|i| {
                let t = i as f32 / ELLIPSE_SEGMENTS as f32 * std::f32::consts::TAU;
                let local = center + Vec2::new(rx * t.cos(), ry * t.sin()).rotate(rotation);
                self.project(local)
            })
            .collect();
        self.fill_polygon(&points, color);
    }

    fn fill_path(&mut self, path: &Path, color: Rgba) {
        for sub in path.flatten(CURVE_STEPS) {
            let points: Vec<Vec2> = sub.iter().map(|&p| self.project(p)).collect();
            self.fill_polygon(&points, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba = Rgba::rgb(255, 0, 0);

    #[test]
    fn logical_size_follows_scale() {
        let c = BrailleCanvas::new(80, 24, 3.0);
        assert_eq!(c.width(), 480.0);
        assert_eq!(c.height(), 288.0);
    }

    #[test]
    fn single_dot_maps_to_braille_bits() {
        let mut c = BrailleCanvas::new(2, 1, 1.0);
        c.plot(0, 0, RED);
        assert_eq!(c.cell(0, 0).map(|(ch, _)| ch), Some('\u{2801}'));
        c.plot(1, 3, RED);
        assert_eq!(c.cell(0, 0).map(|(ch, _)| ch), Some('\u{2881}'));
        assert!(c.cell(1, 0).is_none());
    }

    #[test]
    fn line_is_connected() {
        let mut c = BrailleCanvas::new(20, 5, 1.0);
        c.stroke_line(Vec2::new(0.5, 0.5), Vec2::new(30.5, 15.5), 1.0, RED);
        for x in 0..=30 {
            assert!((0..20).any(|y| c.dot(x, y).is_some()), "gap at column {}", x);
        }
    }

    #[test]
    fn thick_lines_cover_more() {
        let mut thin = BrailleCanvas::new(20, 10, 1.0);
        thin.stroke_line(Vec2::new(5.0, 2.0), Vec2::new(5.0, 30.0), 1.0, RED);
        let mut thick = BrailleCanvas::new(20, 10, 1.0);
        thick.stroke_line(Vec2::new(5.0, 2.0), Vec2::new(5.0, 30.0), 6.0, RED);
        assert!(thick.lit_count() > thin.lit_count() * 4);
    }

    #[test]
    fn ellipse_fill_is_roughly_its_area() {
        let mut c = BrailleCanvas::new(40, 10, 1.0);
        c.fill_ellipse(Vec2::new(40.0, 20.0), 10.0, 6.0, 0.0, RED);
        let area = std::f32::consts::PI * 60.0;
        let lit = c.lit_count() as f32;
        assert!(lit > area * 0.8 && lit < area * 1.1, "lit {} area {}", lit, area);
    }

    #[test]
    fn tiny_shapes_still_show() {
        let mut c = BrailleCanvas::new(4, 4, 1.0);
        c.fill_ellipse(Vec2::new(3.2, 3.2), 0.2, 0.2, 0.0, RED);
        assert_eq!(c.lit_count(), 1);
        assert!(c.dot(3, 3).is_some());
    }

    #[test]
    fn transparent_draws_are_skipped() {
        let mut c = BrailleCanvas::new(4, 4, 1.0);
        c.fill_ellipse(Vec2::new(4.0, 4.0), 3.0, 3.0, 0.0, RED.with_alpha(0.0));
        assert_eq!(c.lit_count(), 0);
    }

    #[test]
    fn transforms_apply_before_scaling_to_dots() {
        let mut c = BrailleCanvas::new(10, 10, 2.0);
        c.save();
        c.translate(10.0, 10.0);
        c.stroke_line(Vec2::ZERO, Vec2::ZERO, 1.0, RED);
        c.restore();
        assert!(c.dot(5, 5).is_some());
        assert_eq!(c.lit_count(), 1);
    }

    #[test]
    fn off_canvas_drawing_is_clipped() {
        let mut c = BrailleCanvas::new(4, 2, 1.0);
        c.stroke_line(Vec2::new(-50.0, -50.0), Vec2::new(100.0, 100.0), 3.0, RED);
        c.fill_ellipse(Vec2::new(-20.0, 4.0), 5.0, 5.0, 0.0, RED);
        assert!(c.lit_count() <= 8 * 8);
    }

    #[test]
    fn clear_and_resize_reset_dots() {
        let mut c = BrailleCanvas::new(4, 4, 1.0);
        c.fill_ellipse(Vec2::new(4.0, 8.0), 3.0, 3.0, 0.0, RED);
        assert!(c.lit_count() > 0);
        c.clear();
        assert_eq!(c.lit_count(), 0);
        c.resize(10, 3);
        assert_eq!(c.cells(), (10, 3));
        assert_eq!(c.width(), 20.0);
    }
}
