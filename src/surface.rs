//! 2D drawing surface abstraction
//!
//! The engine draws through [`Surface`] only: a transform stack plus three
//! primitives (stroked line, filled ellipse, filled path). Backends decide how
//! those become pixels; see [`crate::canvas::BrailleCanvas`] for the terminal one.

use crate::colors::Rgba;
use std::ops::{Add, Mul, Sub};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn rotate(self, radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        Self::new(self.x * c - self.y * s, self.x * s + self.y * c)
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, k: f32) -> Vec2 {
        Vec2::new(self.x * k, self.y * k)
    }
}

/// Row-major 2x3 affine transform: `[a c e; b d f]`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Affine = Affine { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    pub fn translation(dx: f32, dy: f32) -> Self {
        Self { e: dx, f: dy, ..Self::IDENTITY }
    }

    pub fn rotation(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        Self { a: c, b: s, c: -s, d: c, e: 0.0, f: 0.0 }
    }

    pub fn scaling(sx: f32, sy: f32) -> Self {
        Self { a: sx, d: sy, ..Self::IDENTITY }
    }

    /// `self * other`: apply `other` first, then `self`
    pub fn then(self, other: Affine) -> Affine {
        Affine {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn apply(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// Geometric mean of the axis scales, used to size strokes
    pub fn scale_factor(&self) -> f32 {
        (self.a * self.d - self.b * self.c).abs().sqrt()
    }
}

/// Save/restore stack shared by surface implementations
#[derive(Clone, Debug, Default)]
pub struct TransformStack {
    current: Affine,
    saved: Vec<Affine>,
}

impl TransformStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Affine {
        self.current
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    pub fn save(&mut self) {
        self.saved.push(self.current);
    }

    /// Unbalanced restores are ignored
    pub fn restore(&mut self) {
        if let Some(t) = self.saved.pop() {
            self.current = t;
        }
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.current = self.current.then(Affine::translation(dx, dy));
    }

    pub fn rotate(&mut self, radians: f32) {
        self.current = self.current.then(Affine::rotation(radians));
    }

    pub fn scale(&mut self, sx: f32, sy: f32) {
        self.current = self.current.then(Affine::scaling(sx, sy));
    }

    pub fn reset(&mut self) {
        self.current = Affine::IDENTITY;
        self.saved.clear();
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCmd {
    MoveTo(Vec2),
    LineTo(Vec2),
    QuadTo(Vec2, Vec2),
    CubicTo(Vec2, Vec2, Vec2),
    Close,
}

/// Outline built from lines and Bézier curves, in local coordinates
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    cmds: Vec<PathCmd>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(mut self, p: Vec2) -> Self {
        self.cmds.push(PathCmd::MoveTo(p));
        self
    }

    pub fn line_to(mut self, p: Vec2) -> Self {
        self.cmds.push(PathCmd::LineTo(p));
        self
    }

    pub fn quad_to(mut self, ctrl: Vec2, p: Vec2) -> Self {
        self.cmds.push(PathCmd::QuadTo(ctrl, p));
        self
    }

    pub fn cubic_to(mut self, c1: Vec2, c2: Vec2, p: Vec2) -> Self {
        self.cmds.push(PathCmd::CubicTo(c1, c2, p));
        self
    }

    pub fn close(mut self) -> Self {
        self.cmds.push(PathCmd::Close);
        self
    }

    pub fn commands(&self) -> &[PathCmd] {
        &self.cmds
    }

    /// Convert to polylines, one per subpath, sampling each curve `steps` times
    pub fn flatten(&self, steps: usize) -> Vec<Vec<Vec2>> {
        let steps = steps.max(1);
        let mut out: Vec<Vec<Vec2>> = Vec::new();
        let mut current: Vec<Vec2> = Vec::new();
        let mut pen = Vec2::ZERO;

        for cmd in &self.cmds {
            match *cmd {
                PathCmd::MoveTo(p) => {
                    if current.len() > 1 {
                        out.push(std::mem::take(&mut current));
                    }
                    current.clear();
                    current.push(p);
                    pen = p;
                }
                PathCmd::LineTo(p) => {
                    if current.is_empty() {
                        current.push(pen);
                    }
                    current.push(p);
                    pen = p;
                }
                PathCmd::QuadTo(c, p) => {
                    if current.is_empty() {
                        current.push(pen);
                    }
                    for i in 1..=steps {
                        let t = i as f32 / steps as f32;
                        let u = 1.0 - t;
                        current.push(pen * (u * u) + c * (2.0 * u * t) + p * (t * t));
                    }
                    pen = p;
                }
                PathCmd::CubicTo(c1, c2, p) => {
                    if current.is_empty() {
                        current.push(pen);
                    }
                    for i in 1..=steps {
                        let t = i as f32 / steps as f32;
                        let u = 1.0 - t;
                        current.push(
                            pen * (u * u * u)
                                + c1 * (3.0 * u * u * t)
                                + c2 * (3.0 * u * t * t)
                                + p * (t * t * t),
                        );
                    }
                    pen = p;
                }
                PathCmd::Close => {
                    if let Some(&first) = current.first() {
                        pen = first;
                    }
                    if current.len() > 1 {
                        out.push(std::mem::take(&mut current));
                    }
                }
            }
        }

        if current.len() > 1 {
            out.push(current);
        }
        out
    }
}

/// Addressable 2D drawing surface with a save/restore transform stack.
///
/// Coordinates passed to the primitives are local; implementations map them
/// through [`Surface::transform`]. The y axis points down.
pub trait Surface {
    fn width(&self) -> f32;
    fn height(&self) -> f32;

    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, dx: f32, dy: f32);
    fn rotate(&mut self, radians: f32);
    fn scale(&mut self, sx: f32, sy: f32);
    fn transform(&self) -> Affine;

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba);
    fn fill_ellipse(&mut self, center: Vec2, rx: f32, ry: f32, rotation: f32, color: Rgba);
    fn fill_path(&mut self, path: &Path, color: Rgba);

    /// Local point to surface coordinates
    fn to_surface(&self, p: Vec2) -> Vec2 {
        self.transform().apply(p)
    }
}
