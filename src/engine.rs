//! The tree engine handle
//!
//! Owns every piece of mutable render state (skeleton, smoothed signals,
//! latches, particles) so separate engines never interfere. Scheduling is
//! external: call [`TreeEngine::tick`] once per frame with increasing times.

use crate::config::TreeConfig;
use crate::entropy::{Entropy, StdEntropy};
use crate::error::{EngineError, Result};
use crate::particles::ParticleStore;
use crate::render::{self, FrameParams};
use crate::signal::{SignalState, TreeEvent};
use crate::skeleton::{self, BranchNode};
use crate::source::{StateSource, StyleSource};
use crate::surface::Surface;
use tracing::{debug, info, warn};

/// What happened during one `tick`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub event: Option<TreeEvent>,
    pub mood: f32,
    pub wind: f32,
    pub branches: usize,
    pub spawned: usize,
    pub particles: usize,
    /// Particles grounded since the engine was created
    pub landed: u64,
}

pub struct TreeEngine {
    config: TreeConfig,
    entropy: Box<dyn Entropy>,
    skeleton: Option<BranchNode>,
    size: (f32, f32),
    pending_resize: Option<(f32, f32)>,
    signal: SignalState,
    particles: ParticleStore,
    frame: u64,
    last_time: f32,
    sink: Option<Box<dyn FnMut(TreeEvent)>>,
}

impl TreeEngine {
    pub fn new(config: TreeConfig, entropy: Box<dyn Entropy>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            signal: SignalState::new(&config),
            particles: ParticleStore::new(config.particle_capacity, config.lifecycle),
            config,
            entropy,
            skeleton: None,
            size: (0.0, 0.0),
            pending_resize: None,
            frame: 0,
            last_time: 0.0,
            sink: None,
        })
    }

    /// Engine backed by [`StdEntropy`]; `None` means unseeded
    pub fn with_seed(config: TreeConfig, seed: Option<u64>) -> Result<Self> {
        Self::new(config, Box::new(StdEntropy::from_seed_option(seed)))
    }

    /// Called synchronously on every bloom/wither transition
    pub fn set_event_sink(&mut self, sink: impl FnMut(TreeEvent) + 'static) {
        self.sink = Some(Box::new(sink));
    }

    /// Attach a surface and build the skeleton for it
    pub fn on_surface_ready(&mut self, width: f32, height: f32) -> Result<()> {
        check_size(width, height)?;
        self.rebuild(width, height);
        Ok(())
    }

    /// Record a new size; the rebuild happens once, at the start of the next tick
    pub fn on_surface_resized(&mut self, width: f32, height: f32) {
        self.pending_resize = Some((width, height));
    }

    /// Release skeleton and particles. `tick` fails with `NotReady` until the next ready.
    pub fn on_teardown(&mut self) {
        self.skeleton = None;
        self.pending_resize = None;
        self.particles.release();
        debug!(frames = self.frame, "engine torn down");
    }

    pub fn is_ready(&self) -> bool {
        self.skeleton.is_some()
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn skeleton(&self) -> Option<&BranchNode> {
        self.skeleton.as_ref()
    }

    pub fn signal(&self) -> &SignalState {
        &self.signal
    }

    pub fn particles(&self) -> &ParticleStore {
        &self.particles
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn size(&self) -> (f32, f32) {
        self.size
    }

    fn rebuild(&mut self, width: f32, height: f32) {
        let root = skeleton::build(width, height, &self.config, self.entropy.as_mut());
        debug!(width, height, nodes = root.node_count(), "skeleton rebuilt");
        self.skeleton = Some(root);
        self.size = (width, height);
    }

    fn apply_pending_resize(&mut self) {
        let Some((w, h)) = self.pending_resize.take() else {
            return;
        };
        if (w, h) == self.size {
            return;
        }
        match check_size(w, h) {
            Ok(()) => self.rebuild(w, h),
            Err(e) => warn!("ignoring resize: {}", e),
        }
    }

    /// Run one frame: smooth the inputs, fire events, draw the tree, step particles
    pub fn tick(
        &mut self,
        surface: &mut dyn Surface,
        state: &dyn StateSource,
        style: &dyn StyleSource,
        now: f32,
    ) -> Result<FrameReport> {
        if self.skeleton.is_none() {
            return Err(EngineError::NotReady);
        }
        self.apply_pending_resize();
        check_size(surface.width(), surface.height())?;

        let now = now.max(self.last_time);
        self.last_time = now;

        let event = self.signal.update(state.mood_wind());
        if let Some(ev) = event {
            info!(event = %ev, mood = self.signal.mood(), frame = self.frame, "tree event");
            if let Some(sink) = self.sink.as_mut() {
                sink(ev);
            }
        }

        let wind = self.signal.wind();
        let params = FrameParams {
            time: now,
            bloom: self.signal.bloom_factor(),
            wither: self.signal.wither_factor(),
            wind,
            wind_angle: render::wind_angle(now, wind, self.entropy.as_ref()),
            style: style.flower_style(),
        };

        let stats = match self.skeleton.as_ref() {
            Some(root) => render::render_tree(
                surface,
                root,
                &params,
                &self.config,
                self.entropy.as_mut(),
                &mut self.particles,
            ),
            None => return Err(EngineError::NotReady),
        };

        self.particles
            .advance_and_draw(surface, wind, params.style, self.entropy.as_ref());

        let report = FrameReport {
            frame: self.frame,
            event,
            mood: self.signal.mood(),
            wind,
            branches: stats.branches,
            spawned: stats.spawned,
            particles: self.particles.len(),
            landed: self.particles.landed_total(),
        };
        self.frame += 1;
        Ok(report)
    }
}

fn check_size(width: f32, height: f32) -> Result<()> {
    if width >= 1.0 && height >= 1.0 && width.is_finite() && height.is_finite() {
        Ok(())
    } else {
        Err(EngineError::SurfaceUnavailable { width, height })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlowerStyle;
    use crate::source::MoodWind;
    use crate::surface::testing::RecordingSurface;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn engine(seed: u64) -> TreeEngine {
        TreeEngine::with_seed(TreeConfig::default(), Some(seed)).unwrap()
    }

    #[test]
    fn tick_before_ready_fails() {
        let mut e = engine(1);
        let mut s = RecordingSurface::new(800.0, 600.0);
        let err = e.tick(&mut s, &MoodWind::default(), &FlowerStyle::Peach, 0.0).unwrap_err();
        assert!(matches!(err, EngineError::NotReady));
    }

    #[test]
    fn zero_sized_surface_is_rejected() {
        let mut e = engine(1);
        assert!(matches!(
            e.on_surface_ready(0.0, 600.0),
            Err(EngineError::SurfaceUnavailable { .. })
        ));
        assert!(!e.is_ready());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = TreeConfig { particle_capacity: 0, ..TreeConfig::default() };
        assert!(matches!(
            TreeEngine::with_seed(cfg, Some(1)),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn resizes_coalesce_into_one_rebuild() {
        let mut e = engine(2);
        e.on_surface_ready(800.0, 600.0).unwrap();
        e.on_surface_resized(400.0, 300.0);
        e.on_surface_resized(500.0, 300.0);
        e.on_surface_resized(640.0, 480.0);
        // nothing changes until the next frame
        assert_eq!(e.size(), (800.0, 600.0));

        let mut s = RecordingSurface::new(640.0, 480.0);
        e.tick(&mut s, &MoodWind::default(), &FlowerStyle::Peach, 0.0).unwrap();
        assert_eq!(e.size(), (640.0, 480.0));
    }

    #[test]
    fn zero_resize_keeps_previous_skeleton() {
        let mut e = engine(3);
        e.on_surface_ready(800.0, 600.0).unwrap();
        e.on_surface_resized(0.0, 0.0);
        let mut s = RecordingSurface::new(800.0, 600.0);
        e.tick(&mut s, &MoodWind::default(), &FlowerStyle::Peach, 0.0).unwrap();
        assert_eq!(e.size(), (800.0, 600.0));
    }

    #[test]
    fn teardown_releases_state() {
        let mut e = engine(4);
        e.on_surface_ready(800.0, 600.0).unwrap();
        let mut s = RecordingSurface::new(800.0, 600.0);
        let hot = MoodWind::new(-1.0, 0.0);
        for i in 0..60 {
            e.tick(&mut s, &hot, &FlowerStyle::Peach, i as f32 / 30.0).unwrap();
        }
        assert!(!e.particles().is_empty());

        e.on_teardown();
        assert!(!e.is_ready());
        assert!(e.particles().is_empty());
        assert!(e.tick(&mut s, &hot, &FlowerStyle::Peach, 3.0).is_err());

        // ready again after teardown
        e.on_surface_ready(800.0, 600.0).unwrap();
        let report = e.tick(&mut s, &hot, &FlowerStyle::Peach, 3.0).unwrap();
        assert!(report.particles <= e.config().particle_capacity);
    }

    #[test]
    fn nan_snapshot_does_not_stall_the_tree() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut e = engine(9);
        let log = Rc::clone(&seen);
        e.set_event_sink(move |ev| log.borrow_mut().push(ev));
        e.on_surface_ready(800.0, 600.0).unwrap();

        let mut s = RecordingSurface::new(800.0, 600.0);
        let bad = MoodWind { mood: f32::NAN, wind_force: 0.0 };
        e.tick(&mut s, &bad, &FlowerStyle::Peach, 0.0).unwrap();
        let mut report = None;
        for i in 1..300 {
            report = Some(e.tick(&mut s, &MoodWind::new(0.9, 0.0), &FlowerStyle::Peach, i as f32 / 30.0).unwrap());
        }
        let report = report.unwrap();
        assert!(report.mood.is_finite());
        assert!(report.mood > 0.85);
        assert_eq!(*seen.borrow(), vec![TreeEvent::Bloom]);
    }

    #[test]
    fn report_carries_landed_total() {
        let mut e = engine(10);
        e.on_surface_ready(800.0, 600.0).unwrap();
        let mut s = RecordingSurface::new(800.0, 600.0);
        let sad = MoodWind::new(-1.0, 0.0);
        let mut last = 0;
        for i in 0..200 {
            let report = e.tick(&mut s, &sad, &FlowerStyle::Peach, i as f32 / 30.0).unwrap();
            assert_eq!(report.landed, e.particles().landed_total());
            assert!(report.landed >= last);
            last = report.landed;
        }
    }

    #[test]
    fn sink_sees_each_transition_once() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut e = engine(5);
        let log = Rc::clone(&seen);
        e.set_event_sink(move |ev| log.borrow_mut().push(ev));
        e.on_surface_ready(800.0, 600.0).unwrap();

        let mut s = RecordingSurface::new(800.0, 600.0);
        let mut t = 0.0;
        for target in [0.9, -0.9, 0.9] {
            for _ in 0..80 {
                e.tick(&mut s, &MoodWind::new(target, 0.0), &FlowerStyle::Peach, t).unwrap();
                t += 1.0 / 30.0;
            }
        }
        assert_eq!(
            *seen.borrow(),
            vec![TreeEvent::Bloom, TreeEvent::Wither, TreeEvent::Bloom]
        );
    }

    #[test]
    fn separate_engines_do_not_share_state() {
        let mut a = engine(6);
        let mut b = engine(6);
        a.on_surface_ready(800.0, 600.0).unwrap();
        b.on_surface_ready(800.0, 600.0).unwrap();
        let mut s = RecordingSurface::new(800.0, 600.0);
        for i in 0..20 {
            a.tick(&mut s, &MoodWind::new(1.0, 0.0), &FlowerStyle::Peach, i as f32).unwrap();
        }
        assert!(a.signal().mood() > 0.8);
        assert_eq!(b.signal().mood(), 0.0);
        assert_eq!(b.frame(), 0);
    }
}
