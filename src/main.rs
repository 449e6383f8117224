use clap::{ArgAction, Parser, Subcommand};
use moodtree::app;
use moodtree::config::{GrowConfig, PrintConfig, SourceKind};
use moodtree::logging::{self, LogTarget};
use moodtree::settings::Settings;
use moodtree::{EngineError, FlowerStyle, Lifecycle, TreeConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;

#[derive(Parser)]
#[command(name = "moodtree")]
#[command(author = "Terminal Art Generator")]
#[command(version = "0.1.0")]
#[command(about = "A terminal tree that blooms, withers and sways with a mood signal", long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Animate the tree until q is pressed
    Grow {
        /// Mood source: demo, manual (arrow keys) or stdin (JSON lines)
        #[arg(long)]
        source: Option<String>,

        /// Flower style: peach, sakura or delonix
        #[arg(short = 'S', long)]
        style: Option<String>,

        /// Particle lifecycle: grounded or fading
        #[arg(short = 'L', long)]
        lifecycle: Option<String>,

        /// Frames per second
        #[arg(short, long)]
        fps: Option<u32>,

        /// Random seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,

        /// Surface units per braille dot (bigger = smaller tree detail)
        #[arg(short, long)]
        zoom: Option<f32>,

        /// Append logs to this file
        #[arg(long)]
        log: Option<PathBuf>,
    },

    /// Render a fixed mood for some frames and print the result to stdout
    Print {
        /// Mood in [-1, 1]
        #[arg(short, long, default_value = "0.8", allow_hyphen_values = true)]
        mood: f32,

        /// Wind force, roughly [-1, 1]
        #[arg(short, long, default_value = "0.0", allow_hyphen_values = true)]
        wind: f32,

        /// Frames to simulate before printing
        #[arg(short, long, default_value = "90")]
        frames: u32,

        /// Flower style: peach, sakura or delonix
        #[arg(short = 'S', long)]
        style: Option<String>,

        /// Particle lifecycle: grounded or fading
        #[arg(short = 'L', long)]
        lifecycle: Option<String>,

        /// Random seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,

        #[arg(short, long)]
        zoom: Option<f32>,

        /// Output width in columns (default: terminal width or 80)
        #[arg(long)]
        cols: Option<u16>,

        /// Output height in rows (default: terminal height or 24)
        #[arg(long)]
        rows: Option<u16>,
    },
}

fn parse_opt<T: std::str::FromStr<Err = EngineError>>(value: Option<String>, fallback: T) -> Result<T, EngineError> {
    value.map_or(Ok(fallback), |s| s.parse())
}

fn tree_config(base: &TreeConfig, lifecycle: Option<String>, fps: Option<u32>) -> Result<TreeConfig, EngineError> {
    let mut tree = base.clone();
    tree.lifecycle = parse_opt::<Lifecycle>(lifecycle, tree.lifecycle)?;
    if let Some(fps) = fps {
        tree.fps = fps;
    }
    tree.validate()?;
    Ok(tree)
}

fn run(cli: Cli) -> Result<(), EngineError> {
    let (settings, settings_err) = match Settings::try_load() {
        Ok(s) => (s, None),
        Err(e) => (Settings::default(), Some(e)),
    };
    let display = &settings.display;

    let target = match &cli.command {
        Commands::Grow { log, .. } => log
            .clone()
            .or_else(|| display.log_file.clone())
            .map_or(LogTarget::Off, LogTarget::File),
        Commands::Print { .. } => LogTarget::Stderr,
    };
    logging::init(&target, cli.verbose)?;
    if let Some(e) = settings_err {
        warn!("using defaults: {}", e);
        if target == LogTarget::Off {
            eprintln!("warning: using defaults: {}", e);
        }
    }

    match cli.command {
        Commands::Grow { source, style, lifecycle, fps, seed, zoom, .. } => {
            let config = GrowConfig {
                tree: tree_config(&settings.tree, lifecycle, fps)?,
                source: parse_opt::<SourceKind>(source, display.source)?,
                style: parse_opt::<FlowerStyle>(style, display.style)?,
                seed,
                zoom: zoom.unwrap_or(display.zoom),
            };
            app::run_grow(config)
        }
        Commands::Print { mood, wind, frames, style, lifecycle, seed, zoom, cols, rows } => {
            let size = match (cols, rows) {
                (None, None) => None,
                (c, r) => {
                    let (tw, th) = moodtree::terminal::Terminal::detect_size();
                    Some((c.unwrap_or(tw), r.unwrap_or(th)))
                }
            };
            let config = PrintConfig {
                tree: tree_config(&settings.tree, lifecycle, None)?,
                mood,
                wind,
                frames,
                style: parse_opt::<FlowerStyle>(style, display.style)?,
                seed,
                zoom: zoom.unwrap_or(display.zoom),
                size,
            };
            app::run_print(config)
        }
    }
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("moodtree: {}", e);
            ExitCode::FAILURE
        }
    }
}
