//! Single-line terminal rendering.
//!
//! Shells redraw the command line on every keystroke (`\r`, backspace,
//! erase-in-line, cursor moves). Stripping escape sequences alone leaves
//! duplicated characters behind, so the bytes are replayed against a
//! one-row cursor model instead, producing what was visible on screen.

use unicode_width::UnicodeWidthChar;
use vte::{Params, Parser, Perform};

/// Column distance between tab stops.
const TAB_WIDTH: usize = 8;

/// Right margin for cursor movement. Printed text may run past it.
pub const MAX_COLUMNS: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Blank,
    Char(char),
    /// Right half of a double-width character
    WideTail,
}

/// One row of cells plus a cursor column.
#[derive(Debug, Default)]
struct LineState {
    cells: Vec<Cell>,
    col: usize,
    saved_col: usize,
    /// Lines finished by `\n` (streaming use)
    completed: Vec<String>,
}

impl LineState {
    fn limit(&self) -> usize {
        MAX_COLUMNS.max(self.cells.len())
    }

    /// Move the cursor, stopping at the right margin.
    fn move_to(&mut self, col: usize) {
        self.col = col.min(self.limit());
    }

    fn ensure_len(&mut self, len: usize) {
        if self.cells.len() < len {
            self.cells.resize(len, Cell::Blank);
        }
    }

    /// Blank out a cell, splitting any wide character it belongs to.
    fn clear_cell(&mut self, idx: usize) {
        match self.cells.get(idx).copied() {
            Some(Cell::WideTail) if idx > 0 => {
                self.cells[idx - 1] = Cell::Blank;
                self.cells[idx] = Cell::Blank;
            }
            Some(Cell::Char(c)) if c.width() == Some(2) => {
                self.cells[idx] = Cell::Blank;
                if let Some(next) = self.cells.get_mut(idx + 1) {
                    *next = Cell::Blank;
                }
            }
            Some(_) => self.cells[idx] = Cell::Blank,
            None => {}
        }
    }

    /// Blank a wide character if `idx` points at its right half.
    fn split_wide_at(&mut self, idx: usize) {
        if self.cells.get(idx) == Some(&Cell::WideTail) {
            self.clear_cell(idx);
        }
    }

    fn put(&mut self, c: char) {
        let width = match c.width() {
            Some(w) if w > 0 => w,
            // Zero-width and non-printing characters do not advance the cursor.
            _ => return,
        };
        self.ensure_len(self.col + width);
        for i in 0..width {
            self.clear_cell(self.col + i);
        }
        self.cells[self.col] = Cell::Char(c);
        if width == 2 {
            self.cells[self.col + 1] = Cell::WideTail;
        }
        self.col += width;
    }

    fn erase_in_line(&mut self, mode: u16) {
        match mode {
            0 => {
                if self.col < self.cells.len() {
                    self.clear_cell(self.col);
                    self.cells.truncate(self.col);
                }
            }
            1 => {
                let end = (self.col + 1).min(self.cells.len());
                for i in 0..end {
                    self.clear_cell(i);
                }
            }
            2 => self.cells.clear(),
            _ => {}
        }
    }

    fn delete_chars(&mut self, n: usize) {
        if self.col >= self.cells.len() {
            return;
        }
        self.split_wide_at(self.col);
        let end = (self.col + n).min(self.cells.len());
        self.split_wide_at(end);
        self.cells.drain(self.col..end);
    }

    fn insert_blanks(&mut self, n: usize) {
        if self.col >= self.cells.len() {
            return;
        }
        let limit = self.limit();
        self.split_wide_at(self.col);
        let n = n.min(limit - self.col);
        let tail = self.cells.split_off(self.col);
        self.cells.resize(self.col + n, Cell::Blank);
        self.cells.extend(tail);
        // Cells pushed past the margin are lost.
        self.cells.truncate(limit);
    }

    fn erase_chars(&mut self, n: usize) {
        let end = (self.col + n).min(self.cells.len());
        for i in self.col..end {
            self.clear_cell(i);
        }
    }

    fn render(&self) -> String {
        let mut line = String::with_capacity(self.cells.len());
        for cell in &self.cells {
            match cell {
                Cell::Blank => line.push(' '),
                Cell::Char(c) => line.push(*c),
                Cell::WideTail => {}
            }
        }
        line.truncate(line.trim_end().len());
        line
    }

    fn finish_line(&mut self) {
        let line = self.render();
        self.completed.push(line);
        self.cells.clear();
        self.col = 0;
        self.saved_col = 0;
    }
}

/// First parameter of a CSI sequence, with `0` treated as the default.
fn param_or(params: &Params, default: u16) -> u16 {
    params
        .iter()
        .next()
        .and_then(|p| p.first().copied())
        .filter(|v| *v != 0)
        .unwrap_or(default)
}

/// Raw first parameter, `0` when absent.
fn raw_param(params: &Params, idx: usize) -> u16 {
    params
        .iter()
        .nth(idx)
        .and_then(|p| p.first().copied())
        .unwrap_or(0)
}

impl Perform for LineState {
    fn print(&mut self, c: char) {
        self.put(c);
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            b'\n' => self.finish_line(),
            b'\r' => self.col = 0,
            0x08 => self.col = self.col.saturating_sub(1),
            b'\t' => self.move_to((self.col / TAB_WIDTH + 1) * TAB_WIDTH),
            // BEL, SO, SI, NUL and friends have no visible effect
            _ => {}
        }
    }

    fn csi_dispatch(&mut self, params: &Params, intermediates: &[u8], ignore: bool, action: char) {
        // Private modes (`?2004h` bracketed paste etc.) never touch the text.
        if ignore || !intermediates.is_empty() {
            return;
        }
        match action {
            'K' => self.erase_in_line(raw_param(params, 0)),
            'C' | 'a' => self.move_to(self.col + param_or(params, 1) as usize),
            'D' => self.col = self.col.saturating_sub(param_or(params, 1) as usize),
            'G' | '`' => self.move_to(param_or(params, 1) as usize - 1),
            'H' | 'f' => {
                let col = raw_param(params, 1).max(1);
                self.move_to(col as usize - 1);
            }
            'P' => self.delete_chars(param_or(params, 1) as usize),
            '@' => self.insert_blanks(param_or(params, 1) as usize),
            'X' => self.erase_chars(param_or(params, 1) as usize),
            _ => {}
        }
    }

    fn esc_dispatch(&mut self, intermediates: &[u8], _ignore: bool, byte: u8) {
        if !intermediates.is_empty() {
            return;
        }
        match byte {
            b'7' => self.saved_col = self.col,
            b'8' => self.move_to(self.saved_col),
            _ => {}
        }
    }
}

/// Render one raw line (no `\n`) to its visible text.
///
/// A fresh parser is used per line, so an unterminated escape sequence
/// only affects the rest of its own line.
pub fn render_line(raw: &[u8]) -> String {
    let mut state = LineState::default();
    let mut parser = Parser::new();
    parser.advance(&mut state, raw);
    state.render()
}

/// Streaming renderer for live terminal output.
///
/// Feed arbitrary chunks; complete lines come back as they are finished by
/// `\n`. Escape sequences split across chunks are handled by the parser.
pub struct LineRenderer {
    parser: Parser,
    state: LineState,
}

impl LineRenderer {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
            state: LineState::default(),
        }
    }

    /// Feed bytes, returning the lines completed by this chunk.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.parser.advance(&mut self.state, bytes);
        std::mem::take(&mut self.state.completed)
    }

    /// Whether a partially rendered line is pending.
    pub fn has_pending(&self) -> bool {
        !self.state.cells.is_empty()
    }

    /// Flush the pending partial line, if it has visible content.
    pub fn flush(&mut self) -> Option<String> {
        let line = self.state.render();
        self.state.cells.clear();
        self.state.col = 0;
        if line.is_empty() {
            None
        } else {
            Some(line)
        }
    }
}

impl Default for LineRenderer {
    fn default() -> Self {
        Self::new()
    }
}
