//! Animated generative tree whose bloom, wither and sway follow an external
//! mood/wind signal, drawn with braille dots in the terminal.

pub mod app;
pub mod canvas;
pub mod colors;
pub mod config;
pub mod engine;
pub mod entropy;
pub mod error;
pub mod help;
pub mod logging;
pub mod particles;
pub mod petals;
pub mod render;
pub mod settings;
pub mod signal;
pub mod skeleton;
pub mod source;
pub mod surface;
pub mod terminal;

pub use config::{FlowerStyle, Lifecycle, TreeConfig};
pub use engine::{FrameReport, TreeEngine};
pub use error::{EngineError, Result};
pub use signal::TreeEvent;
pub use source::{MoodWind, StateSource, StyleSource};
pub use surface::Surface;
