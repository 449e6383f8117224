use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the tree engine and its terminal front end
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// Surface missing or zero-sized when the engine needs it
    #[error("render surface unavailable ({width}x{height})")]
    SurfaceUnavailable { width: f32, height: f32 },
    /// `tick` called before `on_surface_ready` or after teardown
    #[error("engine is not ready: no surface has been attached")]
    NotReady,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("cannot read settings from {}: {message}", path.display())]
    Settings { path: PathBuf, message: String },
    #[error("cannot start logging: {0}")]
    Logging(String),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
