//! Mood/wind and style inputs
//!
//! The engine polls a [`StateSource`] and a [`StyleSource`] once per frame.
//! Producers (the demo wave, a JSON feed on stdin, or the keyboard) write into
//! single-slot cells on their own cadence; only the latest value matters.

use crate::config::FlowerStyle;
use serde::Deserialize;
use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Snapshot of the external emotional signal
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MoodWind {
    /// `[-1, 1]`, negative is distress
    pub mood: f32,
    /// Signed, roughly `[-1, 1]`
    pub wind_force: f32,
}

impl MoodWind {
    pub fn new(mood: f32, wind_force: f32) -> Self {
        let mood = if mood.is_finite() { mood.clamp(-1.0, 1.0) } else { 0.0 };
        let wind_force = if wind_force.is_finite() { wind_force } else { 0.0 };
        Self { mood, wind_force }
    }

    /// Cells only ever hold sanitised values
    fn pack(self) -> u64 {
        let v = Self::new(self.mood, self.wind_force);
        ((v.mood.to_bits() as u64) << 32) | v.wind_force.to_bits() as u64
    }

    fn unpack(bits: u64) -> Self {
        Self {
            mood: f32::from_bits((bits >> 32) as u32),
            wind_force: f32::from_bits(bits as u32),
        }
    }
}

pub trait StateSource {
    fn mood_wind(&self) -> MoodWind;
}

pub trait StyleSource {
    fn flower_style(&self) -> FlowerStyle;
}

impl StateSource for MoodWind {
    fn mood_wind(&self) -> MoodWind {
        *self
    }
}

impl StyleSource for FlowerStyle {
    fn flower_style(&self) -> FlowerStyle {
        *self
    }
}

impl<T: StateSource + ?Sized> StateSource for Arc<T> {
    fn mood_wind(&self) -> MoodWind {
        (**self).mood_wind()
    }
}

impl<T: StyleSource + ?Sized> StyleSource for Arc<T> {
    fn flower_style(&self) -> FlowerStyle {
        (**self).flower_style()
    }
}

/// Last-write-wins slot; both scalars live in one atomic word so reads never tear
#[derive(Debug)]
pub struct MoodCell(AtomicU64);

impl MoodCell {
    pub fn new(initial: MoodWind) -> Self {
        Self(AtomicU64::new(initial.pack()))
    }

    pub fn store(&self, value: MoodWind) {
        self.0.store(value.pack(), Ordering::Release);
    }

    pub fn load(&self) -> MoodWind {
        MoodWind::unpack(self.0.load(Ordering::Acquire))
    }

    /// Read-modify-write for the keyboard producer
    pub fn nudge(&self, d_mood: f32, d_wind: f32) -> MoodWind {
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            let old = MoodWind::unpack(current);
            let next = MoodWind::new(old.mood + d_mood, (old.wind_force + d_wind).clamp(-1.5, 1.5));
            match self.0.compare_exchange_weak(current, next.pack(), Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }
}

impl Default for MoodCell {
    fn default() -> Self {
        Self::new(MoodWind::default())
    }
}

impl StateSource for MoodCell {
    fn mood_wind(&self) -> MoodWind {
        self.load()
    }
}

#[derive(Debug, Default)]
pub struct StyleCell(AtomicU8);

impl StyleCell {
    pub fn new(style: FlowerStyle) -> Self {
        Self(AtomicU8::new(style.to_u8()))
    }

    pub fn store(&self, style: FlowerStyle) {
        self.0.store(style.to_u8(), Ordering::Relaxed);
    }

    pub fn load(&self) -> FlowerStyle {
        FlowerStyle::from_u8(self.0.load(Ordering::Relaxed))
    }
}

impl StyleSource for StyleCell {
    fn flower_style(&self) -> FlowerStyle {
        self.load()
    }
}

/// Background thread writing into the cells. Stopped and joined on drop.
pub struct Producer {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    joinable: bool,
}

impl Producer {
    /// Slow mood wave with occasional gusts, updated at ~10 Hz
    pub fn demo(cell: Arc<MoodCell>) -> io::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name("moodtree-demo".into())
            .spawn(move || {
                let start = Instant::now();
                while running_clone.load(Ordering::Relaxed) {
                    let t = start.elapsed().as_secs_f32();
                    cell.store(demo_signal(t));
                    thread::sleep(Duration::from_millis(100));
                }
            })?;

        Ok(Self { running, handle: Some(handle), joinable: true })
    }

    /// JSON lines on stdin: `{"mood": 0.4, "wind": -0.1, "style": "sakura"}`.
    /// Every field is optional; missing ones keep their previous value.
    pub fn stdin(cell: Arc<MoodCell>, style: Arc<StyleCell>) -> io::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name("moodtree-stdin".into())
            .spawn(move || {
                let stdin = io::stdin();
                for line in stdin.lock().lines() {
                    if !running_clone.load(Ordering::Relaxed) {
                        break;
                    }
                    let line = match line {
                        Ok(l) => l,
                        Err(e) => {
                            warn!("stdin source closed: {}", e);
                            break;
                        }
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match apply_update(&line, &cell, &style) {
                        Ok(state) => debug!(mood = state.mood, wind = state.wind_force, "stdin update"),
                        Err(e) => warn!("ignoring malformed input line: {}", e),
                    }
                }
                debug!("stdin source finished");
            })?;

        // A blocking read cannot be interrupted, so this thread is detached on drop
        Ok(Self { running, handle: Some(handle), joinable: false })
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if self.joinable {
                let _ = handle.join();
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Producer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The demo producer's signal at `t` seconds
pub fn demo_signal(t: f32) -> MoodWind {
    // ~60 s mood cycle so both latches get exercised
    let mood = (t * 0.105).sin() * 0.95 + (t * 0.41).sin() * 0.08;
    let gust = ((t * 0.23).sin() * (t * 0.071).cos()).max(0.0);
    let wind = (t * 0.17).sin() * 0.35 + gust * gust * 1.2;
    MoodWind::new(mood, wind)
}

#[derive(Debug, Deserialize)]
struct InputLine {
    mood: Option<f32>,
    #[serde(alias = "windForce", alias = "wind_force")]
    wind: Option<f32>,
    style: Option<String>,
}

/// Parse one JSON line and apply it to the cells
pub fn apply_update(line: &str, cell: &MoodCell, style: &StyleCell) -> Result<MoodWind, String> {
    let input: InputLine = serde_json::from_str(line).map_err(|e| e.to_string())?;

    if let Some(name) = input.style {
        let parsed: FlowerStyle = name.parse().map_err(|e: crate::error::EngineError| e.to_string())?;
        style.store(parsed);
    }

    let current = cell.load();
    let next = MoodWind::new(
        input.mood.unwrap_or(current.mood),
        input.wind.unwrap_or(current.wind_force),
    );
    cell.store(next);
    Ok(next)
}
