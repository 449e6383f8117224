//! Per-frame tree drawing
//!
//! Walks the skeleton from the bottom-centre anchor, bending each branch by
//! the shared wind angle scaled with its depth, colouring bark by the bloom and
//! wither factors, attaching leaves and flowers in the canopy, and seeding new
//! particles from branch tips.

use crate::colors::{bark_color, leaf_color};
use crate::config::{FlowerStyle, TreeConfig};
use crate::entropy::Entropy;
use crate::particles::{ParticleKind, ParticleStore};
use crate::petals::draw_petals;
use crate::skeleton::{in_canopy, BranchNode};
use crate::surface::{Surface, Vec2};

const AMBIENT_SWAY: f32 = 0.08;
const AMBIENT_RATE: f32 = 0.3;
const WIND_EXPONENT: f32 = 1.4;
const WIND_BEND: f32 = 0.22;
const WIND_OSCILLATION: f32 = 0.12;
const WIND_FREQUENCY: f32 = 2.5; // rad/s

const FLEX_ROOT: f32 = 0.05;
const FLEX_TIP: f32 = 1.3;

const LEAF_SPREAD: f32 = 0.7;
const FLOWER_MIN_BLOOM: f32 = 0.25;
const BREATH_RATE: f32 = 2.0;
const BREATH_DEPTH: f32 = 0.08;

const SHED_RATE: f32 = 0.012;
const DRIFT_RATE: f32 = 0.006;
const DRIFT_MIN_BLOOM: f32 = 0.3;
const SPAWN_NOISE_SCALE: f32 = 0.01;

/// Everything the walk needs that changes per frame
#[derive(Clone, Copy, Debug)]
pub struct FrameParams {
    pub time: f32,
    pub bloom: f32,
    pub wither: f32,
    /// Smoothed wind force, also used to launch particles
    pub wind: f32,
    pub wind_angle: f32,
    pub style: FlowerStyle,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub branches: usize,
    pub leaves: usize,
    pub flowers: usize,
    pub spawned: usize,
}

/// Ambient drift plus a nonlinear, oscillating response to the smoothed wind
pub fn wind_angle(time: f32, wind: f32, entropy: &dyn Entropy) -> f32 {
    let ambient = (entropy.noise2(time * AMBIENT_RATE, 3.7) - 0.5) * AMBIENT_SWAY;
    let curve = wind.signum() * wind.abs().powf(WIND_EXPONENT);
    let magnitude = curve.abs();
    let active = curve * WIND_BEND + (time * WIND_FREQUENCY).sin() * magnitude * WIND_OSCILLATION;
    ambient + active
}

/// Share of the wind angle a branch at `depth` takes on; grows toward the tips
pub fn flexibility(depth: u32, max_depth: u32) -> f32 {
    let t = if max_depth == 0 { 1.0 } else { (depth as f32 / max_depth as f32).min(1.0) };
    FLEX_ROOT + (FLEX_TIP - FLEX_ROOT) * t.powf(1.5)
}

/// Draw the tree and spawn particles. The surface stack is left as found.
pub fn render_tree(
    surface: &mut dyn Surface,
    root: &BranchNode,
    params: &FrameParams,
    config: &TreeConfig,
    entropy: &mut dyn Entropy,
    particles: &mut ParticleStore,
) -> RenderStats {
    let height = surface.height();
    let mut walk = Walk {
        params,
        config,
        entropy,
        particles,
        surface_height: height,
        flower_size: (height * 0.018).clamp(3.0, 12.0),
        stats: RenderStats::default(),
    };

    surface.save();
    surface.translate(surface.width() * 0.5, height * 0.98);
    walk.branch(surface, root);
    surface.restore();
    walk.stats
}

struct Walk<'a> {
    params: &'a FrameParams,
    config: &'a TreeConfig,
    entropy: &'a mut dyn Entropy,
    particles: &'a mut ParticleStore,
    surface_height: f32,
    flower_size: f32,
    stats: RenderStats,
}

impl Walk<'_> {
    fn branch(&mut self, surface: &mut dyn Surface, node: &BranchNode) {
        if node.length < self.config.min_branch_length {
            return;
        }
        let p = self.params;
        let max_depth = self.config.max_depth;

        surface.save();
        surface.rotate(node.angle_offset + p.wind_angle * flexibility(node.depth, max_depth));

        let tip = Vec2::new(0.0, -node.length);
        surface.stroke_line(Vec2::ZERO, tip, node.thickness, bark_color(p.bloom, p.wither));
        self.stats.branches += 1;
        surface.translate(0.0, -node.length);

        if in_canopy(node.depth, max_depth) {
            self.foliage(surface, node);
            self.maybe_spawn(surface, node);
        }

        for child in &node.children {
            self.branch(surface, child);
        }
        surface.restore();
    }

    fn foliage(&mut self, surface: &mut dyn Surface, node: &BranchNode) {
        let p = self.params;
        if p.bloom <= node.bloom_threshold {
            return;
        }

        let growth = ((p.bloom - node.bloom_threshold) * 2.0 + 0.5).clamp(0.5, 1.0);
        let leaf_len = (node.thickness * 2.0 + 3.0) * growth;
        let color = leaf_color(p.bloom, p.wither);
        for side in [-1.0f32, 1.0] {
            surface.save();
            surface.rotate(side * LEAF_SPREAD);
            surface.fill_ellipse(Vec2::new(0.0, -leaf_len * 0.5), leaf_len * 0.28, leaf_len * 0.5, 0.0, color);
            surface.restore();
        }
        self.stats.leaves += 2;

        if node.has_flower_slot && p.bloom > FLOWER_MIN_BLOOM {
            let breath = 1.0 + BREATH_DEPTH * (p.time * BREATH_RATE + node.bloom_threshold * 10.0).sin();
            draw_petals(surface, p.style, self.flower_size * breath * growth, 1.0);
            self.stats.flowers += 1;
        }
    }

    fn maybe_spawn(&mut self, surface: &mut dyn Surface, node: &BranchNode) {
        let p = self.params;
        let tip = surface.to_surface(Vec2::ZERO);
        let n = self.entropy.noise3(tip.x * SPAWN_NOISE_SCALE, tip.y * SPAWN_NOISE_SCALE, p.time * 0.5);

        let (probability, kind, dead) = if p.wither > p.bloom {
            // shedding: dead leaves drop fast
            (p.wither * SHED_RATE * (0.5 + n), ParticleKind::Leaf, true)
        } else if p.bloom > DRIFT_MIN_BLOOM {
            let kind = if node.has_flower_slot { ParticleKind::Flower } else { ParticleKind::Leaf };
            ((p.bloom - DRIFT_MIN_BLOOM) * DRIFT_RATE * (0.5 + n), kind, false)
        } else {
            return;
        };

        if self.entropy.chance(probability) {
            self.particles.spawn(tip, kind, dead, p.wind, self.surface_height, self.entropy);
            self.stats.spawned += 1;
        }
    }
}
