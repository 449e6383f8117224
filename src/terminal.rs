use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{poll, read, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{
        disable_raw_mode, enable_raw_mode, size, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use std::io::{self, stdout, Write};
use std::time::Duration;

const FALLBACK_SIZE: (u16, u16) = (80, 24);

/// Back-buffered terminal. Draw with `set`, then `present` once per frame.
pub struct Terminal {
    width: u16,
    height: u16,
    buffer: Vec<Vec<Cell>>,
    alternate_screen: bool,
}

/// A single cell in the terminal buffer
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub fg: Option<Color>,
    pub bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self { ch: ' ', fg: None, bold: false }
    }
}

impl Terminal {
    /// Take over the real terminal; `alternate_screen` also enables raw mode
    pub fn new(alternate_screen: bool) -> io::Result<Self> {
        let (width, height) = size()?;

        if alternate_screen {
            enable_raw_mode()?;
            execute!(stdout(), EnterAlternateScreen, Hide)?;
        }

        Ok(Self {
            width,
            height,
            buffer: blank(width, height),
            alternate_screen,
        })
    }

    /// Buffer-only terminal for print mode and tests; never touches the tty
    pub fn headless(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            buffer: blank(width, height),
            alternate_screen: false,
        }
    }

    /// Size of the attached terminal, or 80x24 when there is none
    pub fn detect_size() -> (u16, u16) {
        match size() {
            Ok((w, h)) if w > 0 && h > 0 => (w, h),
            _ => FALLBACK_SIZE,
        }
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.buffer = blank(width, height);
    }

    pub fn clear(&mut self) {
        for row in &mut self.buffer {
            row.fill(Cell::default());
        }
    }

    /// Clear the actual terminal
    pub fn clear_screen(&self) -> io::Result<()> {
        execute!(stdout(), Clear(ClearType::All))?;
        Ok(())
    }

    pub fn set(&mut self, x: i32, y: i32, ch: char, fg: Option<Color>, bold: bool) {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            self.buffer[y as usize][x as usize] = Cell { ch, fg, bold };
        }
    }

    pub fn set_str(&mut self, x: i32, y: i32, s: &str, fg: Option<Color>, bold: bool) {
        for (i, ch) in s.chars().enumerate() {
            self.set(x + i as i32, y, ch, fg, bold);
        }
    }

    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.buffer.get(y as usize).and_then(|row| row.get(x as usize))
    }

    /// Row `y` as plain text, colours dropped
    pub fn row_text(&self, y: u16) -> String {
        self.buffer
            .get(y as usize)
            .map(|row| row.iter().map(|c| c.ch).collect())
            .unwrap_or_default()
    }

    /// Write the back buffer to the screen in one flush
    pub fn present(&self) -> io::Result<()> {
        let mut out = stdout().lock();
        for (y, row) in self.buffer.iter().enumerate() {
            queue!(out, MoveTo(0, y as u16))?;
            let mut current: Option<Color> = None;
            for cell in row {
                if cell.bold {
                    queue!(out, SetAttribute(Attribute::Bold))?;
                }
                if cell.fg != current {
                    match cell.fg {
                        Some(color) => queue!(out, SetForegroundColor(color))?,
                        None => queue!(out, ResetColor)?,
                    }
                    current = cell.fg;
                }
                queue!(out, Print(cell.ch))?;
                if cell.bold {
                    queue!(out, SetAttribute(Attribute::NormalIntensity))?;
                }
            }
            queue!(out, ResetColor)?;
        }
        out.flush()
    }

    /// Check for keypress (non-blocking)
    pub fn check_key(&self) -> io::Result<Option<(KeyCode, KeyModifiers)>> {
        if poll(Duration::from_millis(0))? {
            if let Event::Key(KeyEvent { code, modifiers, kind, .. }) = read()? {
                if kind != KeyEventKind::Release {
                    return Ok(Some((code, modifiers)));
                }
            }
        }
        Ok(None)
    }

    /// Buffer as ANSI-coloured text, one line per row (for print mode)
    pub fn write_ansi(&self, out: &mut impl Write) -> io::Result<()> {
        for row in &self.buffer {
            let line_end = row.iter().rposition(|c| c.ch != ' ').map_or(0, |i| i + 1);
            for cell in &row[..line_end] {
                if cell.ch == ' ' {
                    write!(out, " ")?;
                    continue;
                }
                if cell.bold {
                    write!(out, "\x1b[1m")?;
                }
                match cell.fg {
                    Some(Color::Rgb { r, g, b }) => write!(out, "\x1b[38;2;{};{};{}m", r, g, b)?,
                    Some(Color::AnsiValue(v)) => write!(out, "\x1b[38;5;{}m", v)?,
                    _ => {}
                }
                write!(out, "{}\x1b[0m", cell.ch)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    pub fn print_to_stdout(&self) -> io::Result<()> {
        let mut out = stdout().lock();
        self.write_ansi(&mut out)?;
        out.flush()
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.alternate_screen {
            let _ = execute!(stdout(), ResetColor, Show, LeaveAlternateScreen);
            let _ = disable_raw_mode();
        }
    }
}

fn blank(width: u16, height: u16) -> Vec<Vec<Cell>> {
    vec![vec![Cell::default(); width as usize]; height as usize]
}
