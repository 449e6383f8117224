//! Falling leaves and petals
//!
//! A bounded FIFO of particles with independent physical state. Flower
//! particles only remember that they are flowers; the petal geometry comes
//! from whatever style is current when they are drawn.

use crate::colors::{palette, Rgba};
use crate::config::{FlowerStyle, Lifecycle};
use crate::entropy::Entropy;
use crate::petals::draw_petals;
use crate::surface::{Surface, Vec2};
use std::collections::VecDeque;

// Physics, per frame
const GRAVITY_DEAD: f32 = 0.06;
const GRAVITY_FLOATING: f32 = 0.004;
const WIND_PUSH: f32 = 0.04;
const TURBULENCE: f32 = 0.05;
const TURBULENCE_SCALE: f32 = 0.012;
const DRAG_DEAD: f32 = 0.985;
const DRAG_FLOATING: f32 = 0.96;

const SIZE_MIN: f32 = 2.5;
const SIZE_MAX: f32 = 5.0;
const EDGE_MARGIN: f32 = 12.0;
const GROUNDED_SQUASH: f32 = 0.3;
const GROUNDED_ALPHA: f32 = 0.7;
const MIN_SQUASH: f32 = 0.08;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticleKind {
    Leaf,
    Flower,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Phase {
    Falling,
    Grounded,
}

/// Result of advancing one particle by one frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Moving,
    /// Touched its ground line this frame
    Landed,
    /// Already grounded, nothing integrated
    Resting,
    Expired,
}

#[derive(Clone, Debug)]
pub struct Particle {
    pub id: u64,
    pub pos: Vec2,
    pub vel: Vec2,
    pub acc: Vec2,
    pub kind: ParticleKind,
    /// Dead particles fall fast; live ones float
    pub dead: bool,
    pub size: f32,
    pub rotation: f32,
    pub spin: f32,
    pub flip: f32,
    pub flip_speed: f32,
    pub sway_phase: f32,
    pub sway_freq: f32,
    pub sway_amp: f32,
    pub ground_y: f32,
    pub life: f32,
    pub fade_rate: f32,
    pub phase: Phase,
}

impl Particle {
    /// Randomised particle at `pos`; horizontal launch follows the wind
    pub fn new(
        id: u64,
        pos: Vec2,
        kind: ParticleKind,
        dead: bool,
        wind: f32,
        surface_height: f32,
        entropy: &mut dyn Entropy,
    ) -> Self {
        let vx = wind * 1.2 + entropy.range(-0.4, 0.4);
        let vy = if dead { entropy.range(0.5, 1.5) } else { entropy.range(-0.3, 0.3) };
        let ground_band = (surface_height * 0.08).max(2.0);

        Self {
            id,
            pos,
            vel: Vec2::new(vx, vy),
            acc: Vec2::ZERO,
            kind,
            dead,
            size: entropy.range(SIZE_MIN, SIZE_MAX),
            rotation: entropy.range(0.0, std::f32::consts::TAU),
            spin: entropy.range(-0.08, 0.08),
            flip: entropy.range(0.0, std::f32::consts::TAU),
            flip_speed: entropy.range(0.03, 0.12),
            sway_phase: entropy.range(0.0, std::f32::consts::TAU),
            sway_freq: entropy.range(0.03, 0.09),
            sway_amp: entropy.range(0.01, 0.04),
            ground_y: surface_height - entropy.range(1.0, ground_band),
            life: 1.0,
            fade_rate: entropy.range(0.004, 0.010),
            phase: Phase::Falling,
        }
    }

    pub fn is_grounded(&self) -> bool {
        self.phase == Phase::Grounded
    }

    /// Vertical scale that fakes the out-of-plane tumble
    pub fn squash(&self) -> f32 {
        match self.phase {
            Phase::Grounded => GROUNDED_SQUASH,
            Phase::Falling => self.flip.cos().abs().max(MIN_SQUASH),
        }
    }

    pub fn alpha(&self, lifecycle: Lifecycle) -> f32 {
        match (lifecycle, self.phase) {
            (_, Phase::Grounded) => GROUNDED_ALPHA,
            (Lifecycle::Fading, Phase::Falling) => self.life.clamp(0.0, 1.0),
            (Lifecycle::Grounded, Phase::Falling) => 1.0,
        }
    }

    pub fn step(
        &mut self,
        wind: f32,
        frame: u64,
        bounds: (f32, f32),
        lifecycle: Lifecycle,
        entropy: &dyn Entropy,
    ) -> StepOutcome {
        let (width, height) = bounds;

        if self.phase == Phase::Grounded {
            return if self.pos.x < -EDGE_MARGIN || self.pos.x > width + EDGE_MARGIN {
                StepOutcome::Expired
            } else {
                StepOutcome::Resting
            };
        }

        let gravity = if self.dead { GRAVITY_DEAD } else { GRAVITY_FLOATING };
        let z = frame as f32 * 0.01;
        let tx = entropy.noise3(self.pos.x * TURBULENCE_SCALE, self.pos.y * TURBULENCE_SCALE, z) - 0.5;
        let ty = entropy.noise3(self.pos.x * TURBULENCE_SCALE + 31.7, self.pos.y * TURBULENCE_SCALE, z) - 0.5;

        self.acc.y += gravity + ty * TURBULENCE;
        self.acc.x += wind * WIND_PUSH + tx * TURBULENCE * 2.0;
        self.acc.x += self.sway_phase.sin() * self.sway_amp;
        self.sway_phase += self.sway_freq;

        let drag = if self.dead { DRAG_DEAD } else { DRAG_FLOATING };
        self.vel = (self.vel + self.acc) * drag;
        self.pos = self.pos + self.vel;
        self.acc = Vec2::ZERO;

        self.rotation += self.spin;
        self.flip += self.flip_speed;

        if self.pos.x < -EDGE_MARGIN || self.pos.x > width + EDGE_MARGIN {
            return StepOutcome::Expired;
        }

        match lifecycle {
            Lifecycle::Fading => {
                self.life -= self.fade_rate;
                if self.life <= 0.0 || self.pos.y > height + EDGE_MARGIN {
                    StepOutcome::Expired
                } else {
                    StepOutcome::Moving
                }
            }
            Lifecycle::Grounded => {
                if self.pos.y >= self.ground_y {
                    self.pos.y = self.ground_y;
                    self.vel = Vec2::ZERO;
                    self.phase = Phase::Grounded;
                    StepOutcome::Landed
                } else {
                    StepOutcome::Moving
                }
            }
        }
    }

    fn color(&self) -> Rgba {
        if self.dead {
            palette::LEAF_DEAD
        } else {
            palette::LEAF_YOUNG
        }
    }

    pub fn draw(&self, surface: &mut dyn Surface, style: FlowerStyle, lifecycle: Lifecycle) {
        let alpha = self.alpha(lifecycle);
        if alpha <= 0.0 {
            return;
        }
        surface.save();
        surface.translate(self.pos.x, self.pos.y);
        surface.rotate(self.rotation);
        surface.scale(1.0, self.squash());
        match self.kind {
            ParticleKind::Leaf => {
                surface.fill_ellipse(Vec2::ZERO, self.size * 0.45, self.size, 0.0, self.color().with_alpha(alpha))
            }
            ParticleKind::Flower => draw_petals(surface, style, self.size * 0.8, alpha),
        }
        surface.restore();
    }
}

/// Bounded particle collection; oldest entries are evicted first
pub struct ParticleStore {
    particles: VecDeque<Particle>,
    capacity: usize,
    lifecycle: Lifecycle,
    next_id: u64,
    frame: u64,
    landed: u64,
}

impl ParticleStore {
    pub fn new(capacity: usize, lifecycle: Lifecycle) -> Self {
        Self {
            particles: VecDeque::with_capacity(capacity.min(1024) + 1),
            capacity: capacity.max(1),
            lifecycle,
            next_id: 0,
            frame: 0,
            landed: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Particles that have touched ground since creation
    pub fn landed_total(&self) -> u64 {
        self.landed
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    /// Drop every particle and hand the buffer back to the allocator
    pub fn release(&mut self) {
        self.particles.clear();
        self.particles.shrink_to_fit();
    }

    /// Enqueue a new randomised particle, returning its id
    pub fn spawn(
        &mut self,
        pos: Vec2,
        kind: ParticleKind,
        dead: bool,
        wind: f32,
        surface_height: f32,
        entropy: &mut dyn Entropy,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let particle = Particle::new(id, pos, kind, dead, wind, surface_height, entropy);
        self.push(particle);
        id
    }

    /// Insert a prepared particle, evicting the oldest past capacity
    pub fn push(&mut self, particle: Particle) {
        self.next_id = self.next_id.max(particle.id + 1);
        self.particles.push_back(particle);
        while self.particles.len() > self.capacity {
            self.particles.pop_front();
        }
    }

    /// One physics step for every live particle; expired ones are dropped
    pub fn advance(&mut self, wind: f32, bounds: (f32, f32), entropy: &dyn Entropy) {
        let frame = self.frame;
        let lifecycle = self.lifecycle;
        let mut landed = 0;
        self.particles.retain_mut(|p| match p.step(wind, frame, bounds, lifecycle, entropy) {
            StepOutcome::Expired => false,
            StepOutcome::Landed => {
                landed += 1;
                true
            }
            StepOutcome::Moving | StepOutcome::Resting => true,
        });
        self.landed += landed;
        self.frame += 1;
    }

    pub fn draw(&self, surface: &mut dyn Surface, style: FlowerStyle) {
        for p in &self.particles {
            p.draw(surface, style, self.lifecycle);
        }
    }

    pub fn advance_and_draw(
        &mut self,
        surface: &mut dyn Surface,
        wind: f32,
        style: FlowerStyle,
        entropy: &dyn Entropy,
    ) {
        let bounds = (surface.width(), surface.height());
        self.advance(wind, bounds, entropy);
        self.draw(surface, style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::StdEntropy;
    use crate::surface::testing::{Op, RecordingSurface};

    const BOUNDS: (f32, f32) = (800.0, 600.0);

    #[test]
    fn capacity_keeps_most_recent() {
        let mut rng = StdEntropy::seeded(1);
        let mut store = ParticleStore::new(300, Lifecycle::Grounded);
        let ids: Vec<u64> = (0..450)
            .map(|i| store.spawn(Vec2::new(i as f32, 10.0), ParticleKind::Leaf, true, 0.0, 600.0, &mut rng))
            .collect();
        assert_eq!(store.len(), 300);
        let kept: Vec<u64> = store.iter().map(|p| p.id).collect();
        assert_eq!(kept, ids[150..].to_vec());
    }

    #[test]
    fn landed_total_counts_each_grounding() {
        let rng = StdEntropy::seeded(9);
        let mut spawn_rng = StdEntropy::seeded(9);
        let mut store = ParticleStore::new(10, Lifecycle::Grounded);
        for _ in 0..3 {
            store.spawn(Vec2::new(400.0, 560.0), ParticleKind::Leaf, true, 0.0, 600.0, &mut spawn_rng);
        }
        for _ in 0..500 {
            store.advance(0.0, BOUNDS, &rng);
        }
        let grounded = store.iter().filter(|p| p.is_grounded()).count() as u64;
        assert!(grounded > 0);
        assert_eq!(store.landed_total(), grounded);

        // resting particles are not counted again
        store.advance(0.0, BOUNDS, &rng);
        assert_eq!(store.landed_total(), grounded);
    }

    #[test]
    fn release_frees_the_buffer() {
        let mut rng = StdEntropy::seeded(8);
        let mut store = ParticleStore::new(300, Lifecycle::Grounded);
        for _ in 0..300 {
            store.spawn(Vec2::new(400.0, 100.0), ParticleKind::Leaf, false, 0.0, 600.0, &mut rng);
        }
        assert!(store.particles.capacity() >= 300);

        store.release();
        assert!(store.is_empty());
        assert!(store.particles.capacity() < 300);
        // still usable afterwards
        store.spawn(Vec2::new(400.0, 100.0), ParticleKind::Leaf, false, 0.0, 600.0, &mut rng);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn dead_particles_launch_faster_downward() {
        let mut rng = StdEntropy::seeded(2);
        for _ in 0..50 {
            let dead = Particle::new(0, Vec2::ZERO, ParticleKind::Leaf, true, 0.0, 600.0, &mut rng);
            let live = Particle::new(1, Vec2::ZERO, ParticleKind::Flower, false, 0.0, 600.0, &mut rng);
            assert!(dead.vel.y > live.vel.y);
            assert!((SIZE_MIN..=SIZE_MAX).contains(&dead.size));
        }
    }

    #[test]
    fn wind_biases_launch() {
        let mut rng = StdEntropy::seeded(3);
        let p = Particle::new(0, Vec2::ZERO, ParticleKind::Leaf, true, 1.0, 600.0, &mut rng);
        assert!(p.vel.x > 0.5);
    }

    #[test]
    fn grounding_happens_once_and_sticks() {
        let rng = StdEntropy::seeded(4);
        let mut spawn_rng = StdEntropy::seeded(4);
        let mut p = Particle::new(0, Vec2::new(400.0, 500.0), ParticleKind::Leaf, true, 0.0, 600.0, &mut spawn_rng);

        let mut landed = 0;
        let mut rest_y = None;
        for frame in 0..2000 {
            match p.step(0.0, frame, BOUNDS, Lifecycle::Grounded, &rng) {
                StepOutcome::Landed => {
                    landed += 1;
                    rest_y = Some(p.pos.y);
                }
                StepOutcome::Resting => {
                    assert_eq!(Some(p.pos.y), rest_y);
                    assert_eq!(p.vel, Vec2::ZERO);
                }
                StepOutcome::Moving => assert!(rest_y.is_none()),
                StepOutcome::Expired => panic!("particle left the surface"),
            }
        }
        assert_eq!(landed, 1);
        assert!(p.is_grounded());
        assert_eq!(p.pos.y, p.ground_y);
        assert_eq!(p.squash(), GROUNDED_SQUASH);
    }

    #[test]
    fn fading_particles_expire() {
        let rng = StdEntropy::seeded(5);
        let mut spawn_rng = StdEntropy::seeded(5);
        let mut store = ParticleStore::new(10, Lifecycle::Fading);
        store.spawn(Vec2::new(400.0, 100.0), ParticleKind::Flower, false, 0.0, 600.0, &mut spawn_rng);
        for _ in 0..300 {
            store.advance(0.0, BOUNDS, &rng);
        }
        assert!(store.is_empty());
    }

    #[test]
    fn leaving_horizontal_bounds_removes() {
        let rng = StdEntropy::seeded(6);
        let mut spawn_rng = StdEntropy::seeded(6);
        let mut store = ParticleStore::new(10, Lifecycle::Grounded);
        store.spawn(Vec2::new(795.0, 10.0), ParticleKind::Leaf, false, 1.5, 600.0, &mut spawn_rng);
        for _ in 0..400 {
            store.advance(1.5, BOUNDS, &rng);
        }
        assert!(store.is_empty());
    }

    #[test]
    fn flower_particles_follow_current_style() {
        let mut spawn_rng = StdEntropy::seeded(7);
        let mut store = ParticleStore::new(10, Lifecycle::Grounded);
        store.spawn(Vec2::new(100.0, 100.0), ParticleKind::Flower, false, 0.0, 600.0, &mut spawn_rng);

        let mut peach = RecordingSurface::new(800.0, 600.0);
        store.draw(&mut peach, FlowerStyle::Peach);
        assert_eq!(peach.count(|op| matches!(op, Op::Path { .. })), 0);

        let mut sakura = RecordingSurface::new(800.0, 600.0);
        store.draw(&mut sakura, FlowerStyle::Sakura);
        assert_eq!(sakura.count(|op| matches!(op, Op::Path { .. })), 5);
        assert_eq!(sakura.stack.depth(), 0);
    }
}
