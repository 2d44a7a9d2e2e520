//! Capabilities the dispatch engine consumes from the rest of the monitor.

use ratatui::layout::Rect;

use crate::config::ConfigStore;
use crate::error::Result;
use crate::input::{History, Key, MousePosition, Token};
use crate::panel::Panel;

/// A request to move the process list selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    ScrollUp,
    ScrollDown,
    /// Jump so that list row `n` (0-based, below the header) is selected.
    Row(i64),
}

impl Movement {
    pub fn from_key(key: Key) -> Option<Movement> {
        Some(match key {
            Key::Up => Movement::Up,
            Key::Down => Movement::Down,
            Key::PageUp => Movement::PageUp,
            Key::PageDown => Movement::PageDown,
            Key::Home => Movement::Home,
            Key::End => Movement::End,
            Key::MouseScrollUp => Movement::ScrollUp,
            Key::MouseScrollDown => Movement::ScrollDown,
            _ => return None,
        })
    }
}

/// The process table and its selection.
pub trait ProcessView {
    /// Outer box of the process panel, border included.
    fn area(&self) -> Rect;

    /// Applies `movement`, storing the result in `proc_selected`.
    ///
    /// Returns the new index, or `None` when the selection cannot move.
    fn select(&mut self, config: &mut dyn ConfigStore, movement: Movement) -> Result<Option<i64>>;

    /// Pid shown on visible list row `row` (1-based), or 0 for none.
    fn pid_at(&self, row: i64) -> i64;

    fn expand(&mut self, pid: i64) -> Result<()>;
    fn collapse(&mut self, pid: i64) -> Result<()>;
}

/// Single-line text buffer used while editing the process filter.
pub trait LineEditor {
    /// Applies an editing key; `false` means the key is not an edit.
    fn command(&mut self, token: &Token) -> bool;
    fn text(&self) -> &str;
    fn reset(&mut self, text: &str);
}

/// Redraw and lifecycle requests toward the render side.
pub trait Runner {
    /// Redraws `panel`; `no_update` skips re-sampling, `force_redraw`
    /// repaints static parts as well.
    fn run(&self, panel: Panel, no_update: bool, force_redraw: bool) -> Result<()>;
    /// Recomputes panel geometry after a visibility change.
    fn resize(&self, force: bool) -> Result<()>;
    /// Blocks until no background recompute is in flight.
    fn wait_idle(&self);
    /// Ends the program.
    fn quit(&self);
}

/// Everything one `process` call may read or mutate.
pub struct Env<'a> {
    pub config: &'a mut dyn ConfigStore,
    pub procs: &'a mut dyn ProcessView,
    pub editor: &'a mut dyn LineEditor,
    pub runner: &'a dyn Runner,
    pub history: &'a History,
    pub mouse: MousePosition,
}
