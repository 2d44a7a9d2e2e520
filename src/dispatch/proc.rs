//! Process panel keys: sorting, filtering, tree folding, selection and the
//! detail view.

use crate::config::{BoolOpt, IntOpt, StrOpt, SORT_KEYS};
use crate::error::Result;
use crate::input::{Key, Token};

use super::{Env, Flow, Movement};

/// Rows the detail view takes from the top of the process list.
const DETAIL_HEIGHT: i64 = 8;

#[derive(Debug, Default)]
pub(super) struct ProcLayer {
    /// Committed filter at the moment editing started; restored on cancel.
    old_filter: String,
}

impl ProcLayer {
    pub(super) fn old_filter(&self) -> &str {
        &self.old_filter
    }

    pub(super) fn handle(&mut self, token: Token, env: &mut Env<'_>) -> Result<Flow> {
        if env.config.get_bool(BoolOpt::ProcFiltering) {
            return self.edit_filter(token, env);
        }

        match token {
            Token::Key(Key::Left) => cycle_sorting(env, -1)?,
            Token::Key(Key::Right) => cycle_sorting(env, 1)?,
            Token::Char('f') => self.start_filter(env)?,
            Token::Char('e') => env.config.flip(BoolOpt::ProcTree)?,
            Token::Char('r') => env.config.flip(BoolOpt::ProcReversed)?,
            Token::Char('c') => env.config.flip(BoolOpt::ProcPerCore)?,
            Token::Key(Key::Delete) if !env.config.get_str(StrOpt::ProcFilter).is_empty() => {
                env.config.set_str(StrOpt::ProcFilter, "")?;
            }
            t if t.is_mouse() => return mouse(t, env),
            Token::Key(Key::Enter) => return enter(env),
            Token::Char('+' | '-') | Token::Key(Key::Space)
                if env.config.get_bool(BoolOpt::ProcTree)
                    && env.config.get_int(IntOpt::ProcSelected) > 0 =>
            {
                fold(token, env)?;
            }
            Token::Char(c @ ('t' | 'k' | 's')) => {
                tracing::debug!(key = %c, "process action key");
                return Ok(Flow::Done);
            }
            Token::Key(
                key @ (Key::Up | Key::Down | Key::PageUp | Key::PageDown | Key::Home | Key::End),
            ) => return scroll(key, env),
            _ => return Ok(Flow::Next),
        }
        Ok(Flow::Refresh { redraw: true })
    }

    fn start_filter(&mut self, env: &mut Env<'_>) -> Result<()> {
        env.config.flip(BoolOpt::ProcFiltering)?;
        let committed = env.config.get_str(StrOpt::ProcFilter).to_string();
        env.editor.reset(&committed);
        self.old_filter = committed;
        Ok(())
    }

    fn edit_filter(&mut self, token: Token, env: &mut Env<'_>) -> Result<Flow> {
        match token {
            Token::Key(Key::Enter) => {
                let text = env.editor.text().to_string();
                env.config.set_str(StrOpt::ProcFilter, &text)?;
                env.config.set_bool(BoolOpt::ProcFiltering, false)?;
                self.old_filter.clear();
            }
            Token::Key(Key::Escape | Key::MouseClick) => {
                env.config.set_str(StrOpt::ProcFilter, &self.old_filter)?;
                env.config.set_bool(BoolOpt::ProcFiltering, false)?;
                self.old_filter.clear();
            }
            _ if env.editor.command(&token) => {
                if env.config.get_str(StrOpt::ProcFilter) != env.editor.text() {
                    let text = env.editor.text().to_string();
                    env.config.set_str(StrOpt::ProcFilter, &text)?;
                }
            }
            _ => return Ok(Flow::Done),
        }
        Ok(Flow::Refresh { redraw: true })
    }
}

fn cycle_sorting(env: &mut Env<'_>, delta: isize) -> Result<()> {
    let current = env.config.get_str(StrOpt::ProcSorting);
    let idx = SORT_KEYS.iter().position(|k| *k == current).unwrap_or(0);
    let next = (idx as isize + delta).rem_euclid(SORT_KEYS.len() as isize) as usize;
    env.config.set_str(StrOpt::ProcSorting, SORT_KEYS[next])
}

/// Opens the detail view for the selected process, or closes an open one
/// and restores the selection it replaced.
fn enter(env: &mut Env<'_>) -> Result<Flow> {
    let selected = env.config.get_int(IntOpt::ProcSelected);
    let detailed = env.config.get_bool(BoolOpt::ShowDetailed);

    if selected == 0 && !detailed {
        return Ok(Flow::Done);
    }

    let selected_pid = env.config.get_int(IntOpt::SelectedPid);
    if selected > 0 && env.config.get_int(IntOpt::DetailedPid) != selected_pid {
        env.config.set_int(IntOpt::DetailedPid, selected_pid)?;
        env.config.set_int(IntOpt::ProcLastSelected, selected)?;
        env.config.set_int(IntOpt::ProcSelected, 0)?;
        env.config.set_bool(BoolOpt::ShowDetailed, true)?;
    } else if detailed {
        let last = env.config.get_int(IntOpt::ProcLastSelected);
        if last > 0 {
            env.config.set_int(IntOpt::ProcSelected, last)?;
        }
        env.config.set_int(IntOpt::ProcLastSelected, 0)?;
        env.config.set_int(IntOpt::DetailedPid, 0)?;
        env.config.set_bool(BoolOpt::ShowDetailed, false)?;
    }
    Ok(Flow::Refresh { redraw: true })
}

fn fold(token: Token, env: &mut Env<'_>) -> Result<()> {
    env.runner.wait_idle();
    let pid = env.config.get_int(IntOpt::SelectedPid);
    if token.is_char('+') || token.is_key(Key::Space) {
        env.procs.expand(pid)?;
    }
    if token.is_char('-') || token.is_key(Key::Space) {
        env.procs.collapse(pid)?;
    }
    Ok(())
}

/// Moves the selection; a full redraw is only needed when moving to or
/// from "nothing selected".
fn scroll(key: Key, env: &mut Env<'_>) -> Result<Flow> {
    let Some(movement) = Movement::from_key(key) else {
        return Ok(Flow::Done);
    };
    step(movement, env)
}

fn step(movement: Movement, env: &mut Env<'_>) -> Result<Flow> {
    let old = env.config.get_int(IntOpt::ProcSelected);
    let Some(new) = env.procs.select(&mut *env.config, movement)? else {
        return Ok(Flow::Done);
    };
    let redraw = old != new && (old == 0 || new == 0);
    Ok(Flow::Refresh { redraw })
}

fn mouse(token: Token, env: &mut Env<'_>) -> Result<Flow> {
    let area = env.procs.area();
    let detail = if env.config.get_bool(BoolOpt::ShowDetailed) {
        DETAIL_HEIGHT
    } else {
        0
    };
    let x = i64::from(area.x);
    let width = i64::from(area.width);
    let y = i64::from(area.y) + detail;
    let height = i64::from(area.height) - detail;
    let col = i64::from(env.mouse.col);
    let line = i64::from(env.mouse.line);
    let click = token.is_key(Key::MouseClick);

    let in_list = col > x && col < x + width && line > y && line < y + height - 1;
    if !in_list {
        if click && env.config.get_int(IntOpt::ProcSelected) > 0 {
            env.config.set_int(IntOpt::ProcSelected, 0)?;
            return Ok(Flow::Refresh { redraw: true });
        }
        return Ok(Flow::Next);
    }

    if !click {
        return match token {
            Token::Key(key) => scroll(key, env),
            Token::Char(_) => Ok(Flow::Next),
        };
    }

    // The two rightmost columns are the scrollbar.
    if col < x + width - 2 {
        let row = line - y - 1;
        let current = env.config.get_int(IntOpt::ProcSelected);
        if current == row {
            return enter(env);
        }
        let redraw = current == 0 || row == 0;
        env.config.set_int(IntOpt::ProcSelected, row)?;
        env.config.set_int(IntOpt::SelectedPid, env.procs.pid_at(row))?;
        return Ok(Flow::Refresh { redraw });
    }

    let movement = if line == y + 1 {
        Movement::PageUp
    } else if line == y + height - 2 {
        Movement::PageDown
    } else {
        Movement::Row(line - y - 2)
    };
    Ok(match step(movement, env)? {
        Flow::Refresh { .. } => Flow::Refresh { redraw: false },
        other => other,
    })
}
