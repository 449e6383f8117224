//! Terminal front end: the interactive `grow` loop and one-shot `print`

use crate::canvas::BrailleCanvas;
use crate::config::{FlowerStyle, GrowConfig, PrintConfig, SourceKind};
use crate::engine::{FrameReport, TreeEngine};
use crate::error::{EngineError, Result};
use crate::help::{render_help_overlay, GROW_HELP};
use crate::signal::TreeEvent;
use crate::source::{MoodCell, MoodWind, Producer, StyleCell};
use crate::surface::Surface;
use crate::terminal::Terminal;
use crossterm::event::{KeyCode, KeyModifiers};
use crossterm::style::Color;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const MOOD_STEP: f32 = 0.1;
const WIND_STEP: f32 = 0.15;
const EVENT_FLASH: Duration = Duration::from_secs(3);

/// Keyboard-controlled state of the grow loop
pub struct GrowState {
    pub paused: bool,
    pub show_help: bool,
    pub manual: bool,
}

impl GrowState {
    pub fn new(source: SourceKind) -> Self {
        Self {
            paused: false,
            show_help: false,
            manual: source == SourceKind::Manual,
        }
    }

    /// Handle keypress, returns true if should quit
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers, mood: &MoodCell, style: &StyleCell) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Char('?') => self.show_help = !self.show_help,
            KeyCode::Char(' ') => self.paused = !self.paused,
            KeyCode::Char('s') => style.store(style.load().next()),
            KeyCode::Up if self.manual => {
                mood.nudge(MOOD_STEP, 0.0);
            }
            KeyCode::Down if self.manual => {
                mood.nudge(-MOOD_STEP, 0.0);
            }
            KeyCode::Left if self.manual => {
                mood.nudge(0.0, -WIND_STEP);
            }
            KeyCode::Right if self.manual => {
                mood.nudge(0.0, WIND_STEP);
            }
            _ => {}
        }
        false
    }
}

fn start_producer(source: SourceKind, mood: &Arc<MoodCell>, style: &Arc<StyleCell>) -> Result<Option<Producer>> {
    let producer = match source {
        SourceKind::Demo => Some(Producer::demo(Arc::clone(mood))?),
        SourceKind::Stdin => Some(Producer::stdin(Arc::clone(mood), Arc::clone(style))?),
        SourceKind::Manual => None,
    };
    Ok(producer)
}

/// One-line summary shown under the tree
pub fn status_line(report: &FrameReport, style: FlowerStyle, flash: Option<TreeEvent>, paused: bool) -> String {
    let mut line = format!(
        " mood {:+.2}  wind {:+.2}  {:<7}  particles {:>3}  landed {}",
        report.mood, report.wind, style, report.particles, report.landed
    );
    match flash {
        Some(TreeEvent::Bloom) => line.push_str("  * in bloom *"),
        Some(TreeEvent::Wither) => line.push_str("  ~ withering ~"),
        None => {}
    }
    if paused {
        line.push_str("  [paused]");
    }
    line.push_str("   ? help");
    line
}

/// Interactive animation until the user quits
pub fn run_grow(config: GrowConfig) -> Result<()> {
    let mood = Arc::new(MoodCell::default());
    let style = Arc::new(StyleCell::new(config.style));
    let mut producer = start_producer(config.source, &mood, &style)?;

    let mut engine = TreeEngine::with_seed(config.tree.clone(), config.seed)?;
    let flash: Rc<Cell<Option<(TreeEvent, Instant)>>> = Rc::new(Cell::new(None));
    let flash_sink = Rc::clone(&flash);
    engine.set_event_sink(move |ev| flash_sink.set(Some((ev, Instant::now()))));

    let mut term = Terminal::new(true)?;
    term.clear_screen()?;

    let (width, height) = term.size();
    let mut canvas = BrailleCanvas::new(width, height.saturating_sub(1), config.zoom);
    engine.on_surface_ready(canvas.width(), canvas.height())?;
    info!(cols = width, rows = height, source = ?config.source, "grow started");

    let mut state = GrowState::new(config.source);
    let frame_time = Duration::from_secs_f32(1.0 / config.tree.fps as f32);
    let dt = frame_time.as_secs_f32();
    let mut now = 0.0f32;
    let mut last: Option<FrameReport> = None;

    'frames: loop {
        let frame_start = Instant::now();

        let (w, h) = crossterm::terminal::size().unwrap_or(term.size());
        if (w, h) != term.size() {
            term.resize(w, h);
            term.clear_screen()?;
            canvas.resize(w, h.saturating_sub(1));
            engine.on_surface_resized(canvas.width(), canvas.height());
        }

        while let Some((code, mods)) = term.check_key()? {
            if state.handle_key(code, mods, &mood, &style) {
                break 'frames;
            }
        }

        if !state.paused {
            canvas.clear();
            match engine.tick(&mut canvas, mood.as_ref(), style.as_ref(), now) {
                Ok(report) => last = Some(report),
                // terminal too small to draw in; try again next frame
                Err(e @ EngineError::SurfaceUnavailable { .. }) => warn!("skipping frame: {}", e),
                Err(e) => return Err(e),
            }
            now += dt;
        }

        term.clear();
        canvas.blit(&mut term);
        if let Some(report) = &last {
            let event = flash.get().filter(|(_, at)| at.elapsed() < EVENT_FLASH).map(|(ev, _)| ev);
            let line = status_line(report, style.load(), event, state.paused);
            term.set_str(0, h as i32 - 1, &line, Some(Color::DarkGrey), false);
        }
        if state.show_help {
            render_help_overlay(&mut term, GROW_HELP);
        }
        if let Err(e) = term.present() {
            warn!("frame not shown: {}", e);
        }

        if let Some(rest) = frame_time.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    engine.on_teardown();
    if let Some(p) = producer.as_mut() {
        p.stop();
    }
    debug!(frames = engine.frame(), "grow finished");
    Ok(())
}

/// Run `frames` ticks against a constant input and return the last frame in a buffer
pub fn render_frames(config: &PrintConfig) -> Result<(Terminal, FrameReport)> {
    let (cols, rows) = config.size.unwrap_or_else(Terminal::detect_size);
    let mut canvas = BrailleCanvas::new(cols, rows, config.zoom);

    let mut engine = TreeEngine::with_seed(config.tree.clone(), config.seed)?;
    engine.on_surface_ready(canvas.width(), canvas.height())?;

    let input = MoodWind::new(config.mood, config.wind);
    let dt = 1.0 / config.tree.fps as f32;
    let mut report = None;
    for i in 0..config.frames.max(1) {
        canvas.clear();
        report = Some(engine.tick(&mut canvas, &input, &config.style, i as f32 * dt)?);
    }
    let report = report.ok_or(EngineError::NotReady)?;

    let mut term = Terminal::headless(cols, rows);
    canvas.blit(&mut term);
    info!(frames = config.frames, particles = report.particles, "print rendered");
    Ok((term, report))
}

pub fn run_print(config: PrintConfig) -> Result<()> {
    let (term, _) = render_frames(&config)?;
    term.print_to_stdout()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeConfig;

    fn print_config(mood: f32) -> PrintConfig {
        PrintConfig {
            tree: TreeConfig::default(),
            mood,
            wind: 0.2,
            frames: 40,
            style: FlowerStyle::Peach,
            seed: Some(11),
            zoom: 3.0,
            size: Some((100, 40)),
        }
    }

    #[test]
    fn keys_toggle_state() {
        let mood = MoodCell::default();
        let style = StyleCell::new(FlowerStyle::Peach);
        let mut s = GrowState::new(SourceKind::Demo);
        assert!(!s.handle_key(KeyCode::Char(' '), KeyModifiers::NONE, &mood, &style));
        assert!(s.paused);
        s.handle_key(KeyCode::Char('?'), KeyModifiers::NONE, &mood, &style);
        assert!(s.show_help);
        s.handle_key(KeyCode::Char('s'), KeyModifiers::NONE, &mood, &style);
        assert_eq!(style.load(), FlowerStyle::Sakura);
        assert!(s.handle_key(KeyCode::Esc, KeyModifiers::NONE, &mood, &style));
        assert!(s.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL, &mood, &style));
    }

    #[test]
    fn arrows_only_steer_in_manual_mode() {
        let mood = MoodCell::default();
        let style = StyleCell::default();
        let mut demo = GrowState::new(SourceKind::Demo);
        demo.handle_key(KeyCode::Up, KeyModifiers::NONE, &mood, &style);
        assert_eq!(mood.load(), MoodWind::default());

        let mut manual = GrowState::new(SourceKind::Manual);
        manual.handle_key(KeyCode::Up, KeyModifiers::NONE, &mood, &style);
        manual.handle_key(KeyCode::Right, KeyModifiers::NONE, &mood, &style);
        let v = mood.load();
        assert!((v.mood - MOOD_STEP).abs() < 1e-6);
        assert!((v.wind_force - WIND_STEP).abs() < 1e-6);
    }

    #[test]
    fn status_line_mentions_state() {
        let report = FrameReport {
            frame: 3,
            event: None,
            mood: 0.5,
            wind: -0.25,
            branches: 10,
            spawned: 0,
            particles: 42,
            landed: 1234,
        };
        let line = status_line(&report, FlowerStyle::Sakura, Some(TreeEvent::Bloom), true);
        assert!(line.contains("+0.50"));
        assert!(line.contains("-0.25"));
        assert!(line.contains("sakura"));
        assert!(line.contains("particles  42"));
        assert!(line.contains("landed 1234"));
        assert!(line.contains("bloom"));
        assert!(line.contains("paused"));
    }

    #[test]
    fn print_renders_a_tree() {
        let (term, report) = render_frames(&print_config(0.9)).unwrap();
        assert_eq!(term.size(), (100, 40));
        assert_eq!(report.frame, 39);
        let drawn: usize = (0..40).map(|y| term.row_text(y).chars().filter(|c| *c != ' ').count()).sum();
        assert!(drawn > 50);
        // trunk reaches the bottom rows
        assert!(term.row_text(39).chars().any(|c| c != ' '));
    }

    #[test]
    fn print_is_deterministic_with_a_seed() {
        let a = render_frames(&print_config(0.9)).unwrap().0;
        let b = render_frames(&print_config(0.9)).unwrap().0;
        for y in 0..40 {
            assert_eq!(a.row_text(y), b.row_text(y));
        }
    }
}
