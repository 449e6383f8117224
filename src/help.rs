use crate::terminal::Terminal;
use crossterm::style::Color;

pub const GROW_HELP: &str = "\
moodtree - a tree that blooms and withers with your mood

  q / Esc       quit
  ?             toggle this help
  space         pause / resume
  s             next flower style (peach, sakura, delonix)
  Up / Down     raise / lower mood    (manual source)
  Left / Right  push the wind         (manual source)";

/// Top-left corner and size of a box wrapping `text` centred in the screen
pub fn overlay_rect(width: u16, height: u16, text: &str) -> (usize, usize, usize, usize) {
    let lines = text.lines().count();
    let max_width = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
    let box_width = max_width + 4; // 2 chars padding each side
    let box_height = lines + 2;
    let start_x = (width as usize).saturating_sub(box_width) / 2;
    let start_y = (height as usize).saturating_sub(box_height) / 2;
    (start_x, start_y, box_width, box_height)
}

/// Draw a centred help box into the back buffer
pub fn render_help_overlay(term: &mut Terminal, help_text: &str) {
    if help_text.is_empty() {
        return;
    }
    let (width, height) = term.size();
    let (x0, y0, box_width, box_height) = overlay_rect(width, height, help_text);
    let max_width = box_width - 4;

    let border = Some(Color::White);
    let text = Some(Color::Grey);
    let (left, right) = (x0 as i32, (x0 + box_width - 1) as i32);
    let (top, bottom) = (y0 as i32, (y0 + box_height - 1) as i32);

    for x in left + 1..right {
        term.set(x, top, '─', border, false);
        term.set(x, bottom, '─', border, false);
    }
    term.set(left, top, '┌', border, false);
    term.set(right, top, '┐', border, false);
    term.set(left, bottom, '└', border, false);
    term.set(right, bottom, '┘', border, false);

    for (i, line) in help_text.lines().enumerate() {
        let y = top + 1 + i as i32;
        let padding = max_width.saturating_sub(line.chars().count());
        term.set(left, y, '│', border, false);
        term.set_str(left + 1, y, &format!(" {}{} ", line, " ".repeat(padding)), text, false);
        term.set(right, y, '│', border, false);
    }
}
