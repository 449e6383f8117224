use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Petal geometry for attached flowers and falling flower particles
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowerStyle {
    #[default]
    Peach,   // round ellipses
    Sakura,  // pointed, notched petals
    Delonix, // thin stem, round head
}

impl FlowerStyle {
    pub const ALL: [FlowerStyle; 3] = [FlowerStyle::Peach, FlowerStyle::Sakura, FlowerStyle::Delonix];

    pub fn name(self) -> &'static str {
        match self {
            FlowerStyle::Peach => "peach",
            FlowerStyle::Sakura => "sakura",
            FlowerStyle::Delonix => "delonix",
        }
    }

    pub fn next(self) -> Self {
        match self {
            FlowerStyle::Peach => FlowerStyle::Sakura,
            FlowerStyle::Sakura => FlowerStyle::Delonix,
            FlowerStyle::Delonix => FlowerStyle::Peach,
        }
    }

    pub(crate) fn to_u8(self) -> u8 {
        match self {
            FlowerStyle::Peach => 0,
            FlowerStyle::Sakura => 1,
            FlowerStyle::Delonix => 2,
        }
    }

    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            1 => FlowerStyle::Sakura,
            2 => FlowerStyle::Delonix,
            _ => FlowerStyle::Peach,
        }
    }
}

impl fmt::Display for FlowerStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FlowerStyle {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "peach" | "plum" => Ok(FlowerStyle::Peach),
            "sakura" | "cherry" => Ok(FlowerStyle::Sakura),
            "delonix" | "flamboyant" => Ok(FlowerStyle::Delonix),
            other => Err(EngineError::InvalidConfig(format!(
                "unknown flower style '{}' (expected peach, sakura or delonix)",
                other
            ))),
        }
    }
}

/// How falling particles end their life
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    /// Land at a ground offset and stay, flattened, until evicted
    #[default]
    Grounded,
    /// Fade out on a life counter, removed at zero or past the bottom edge
    Fading,
}

impl FromStr for Lifecycle {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "grounded" | "ground" => Ok(Lifecycle::Grounded),
            "fading" | "fade" => Ok(Lifecycle::Fading),
            other => Err(EngineError::InvalidConfig(format!(
                "unknown lifecycle '{}' (expected grounded or fading)",
                other
            ))),
        }
    }
}

/// Engine tuning. Every field has a default so partial TOML tables work.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    pub max_depth: u32,
    pub particle_capacity: usize,
    pub lifecycle: Lifecycle,
    pub mood_smoothing: f32,
    pub wind_smoothing: f32,
    pub bloom_on: f32,
    pub bloom_off: f32,
    pub wither_on: f32,
    pub wither_off: f32,
    /// Branches shorter than this (surface units) are not drawn
    pub min_branch_length: f32,
    /// Canvases narrower than this get the compact trunk proportions
    pub narrow_breakpoint: f32,
    pub fps: u32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 9,
            particle_capacity: 300,
            lifecycle: Lifecycle::Grounded,
            mood_smoothing: 0.10,
            wind_smoothing: 0.12,
            bloom_on: 0.6,
            bloom_off: 0.2,
            wither_on: -0.6,
            wither_off: -0.2,
            min_branch_length: 4.0,
            narrow_breakpoint: 600.0,
            fps: 30,
        }
    }
}

impl TreeConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        let mut problems = Vec::new();

        if self.max_depth == 0 || self.max_depth > 14 {
            problems.push(format!("max_depth must be 1..=14, got {}", self.max_depth));
        }
        if self.particle_capacity == 0 {
            problems.push("particle_capacity must be positive".to_string());
        }
        for (name, v) in [("mood_smoothing", self.mood_smoothing), ("wind_smoothing", self.wind_smoothing)] {
            if !(v > 0.0 && v <= 1.0) {
                problems.push(format!("{} must be in (0, 1], got {}", name, v));
            }
        }
        if self.bloom_off >= self.bloom_on {
            problems.push("bloom_off must be below bloom_on".to_string());
        }
        if self.wither_off <= self.wither_on {
            problems.push("wither_off must be above wither_on".to_string());
        }
        if self.min_branch_length < 0.0 {
            problems.push("min_branch_length must not be negative".to_string());
        }
        if self.fps == 0 || self.fps > 240 {
            problems.push(format!("fps must be 1..=240, got {}", self.fps));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(EngineError::InvalidConfig(problems.join("; ")))
        }
    }
}

/// Where the mood signal comes from in the interactive app
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Demo,   // built-in producer thread
    Manual, // arrow keys
    Stdin,  // JSON lines from another process
}

impl FromStr for SourceKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "demo" => Ok(SourceKind::Demo),
            "manual" | "keys" => Ok(SourceKind::Manual),
            "stdin" | "-" => Ok(SourceKind::Stdin),
            other => Err(EngineError::InvalidConfig(format!(
                "unknown source '{}' (expected demo, manual or stdin)",
                other
            ))),
        }
    }
}

/// Configuration for the interactive grow command
#[derive(Clone, Debug)]
pub struct GrowConfig {
    pub tree: TreeConfig,
    pub source: SourceKind,
    pub style: FlowerStyle,
    pub seed: Option<u64>,
    /// Surface units per braille dot
    pub zoom: f32,
}

/// Configuration for the one-shot print command
#[derive(Clone, Debug)]
pub struct PrintConfig {
    pub tree: TreeConfig,
    pub mood: f32,
    pub wind: f32,
    pub frames: u32,
    pub style: FlowerStyle,
    pub seed: Option<u64>,
    pub zoom: f32,
    /// Output size in terminal cells; `None` uses the attached terminal or 80x24
    pub size: Option<(u16, u16)>,
}
