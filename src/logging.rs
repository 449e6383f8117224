//! Log setup
//!
//! The interactive app owns the screen, so it can only log to a file. Print
//! mode writes the picture to stdout and may log to stderr.

use crate::error::{EngineError, Result};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::Level;

#[derive(Clone, Debug, PartialEq)]
pub enum LogTarget {
    Off,
    Stderr,
    File(PathBuf),
}

/// `-v` count to level; warnings are always on
pub fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the global subscriber. Call at most once per process.
pub fn init(target: &LogTarget, verbosity: u8) -> Result<()> {
    let level = level_for(verbosity);
    let installed = match target {
        LogTarget::Off => return Ok(()),
        LogTarget::Stderr => tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init(),
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| EngineError::Logging(format!("{}: {}", path.display(), e)))?;
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
        }
    };
    installed.map_err(|e| EngineError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(level_for(0), Level::WARN);
        assert_eq!(level_for(1), Level::INFO);
        assert_eq!(level_for(2), Level::DEBUG);
        assert_eq!(level_for(9), Level::TRACE);
    }

    #[test]
    fn off_installs_nothing() {
        init(&LogTarget::Off, 3).unwrap();
    }

    #[test]
    fn unwritable_file_is_an_error() {
        let target = LogTarget::File(PathBuf::from("/nonexistent-dir/moodtree.log"));
        assert!(matches!(init(&target, 0), Err(EngineError::Logging(_))));
    }
}
