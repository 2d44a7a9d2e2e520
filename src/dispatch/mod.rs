//! Per-panel key dispatch.
//!
//! A token runs through four layers in order: global keys, the process
//! panel, the cpu panel, the mem panel. The first layer that claims the
//! token finishes it; hidden panels are skipped.

mod cpu;
mod global;
pub mod host;
pub mod line_edit;
mod mem;
mod proc;

use std::time::Instant;

use crate::error::Result;
use crate::input::Token;
use crate::panel::Panel;

pub use host::{Env, LineEditor, Movement, ProcessView, Runner};
pub use line_edit::TextEdit;

/// What a layer did with a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Handled; refresh the layer's panel without re-sampling.
    Refresh { redraw: bool },
    /// Handled, nothing to redraw.
    Done,
    /// Not for this layer.
    Next,
}

#[derive(Debug, Default)]
pub struct Dispatcher {
    proc: proc::ProcLayer,
    cpu: cpu::CpuLayer,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `token`. Collaborator failures come back wrapped with the
    /// token that triggered them.
    pub fn process(&mut self, token: Token, env: &mut Env<'_>) -> Result<()> {
        self.process_at(token, env, Instant::now())
    }

    pub fn process_at(&mut self, token: Token, env: &mut Env<'_>, now: Instant) -> Result<()> {
        self.dispatch(token, env, now)
            .map_err(|e| e.in_dispatch(token))
    }

    fn dispatch(&mut self, token: Token, env: &mut Env<'_>, now: Instant) -> Result<()> {
        if global::handle(token, env)? != Flow::Next {
            return Ok(());
        }

        if env.config.panel_shown(Panel::Proc) {
            let flow = self.proc.handle(token, env)?;
            if finish(Panel::Proc, flow, env)? {
                return Ok(());
            }
        }

        if env.config.panel_shown(Panel::Cpu) {
            let flow = self.cpu.handle(token, env, now)?;
            if finish(Panel::Cpu, flow, env)? {
                return Ok(());
            }
        }

        if env.config.panel_shown(Panel::Mem) {
            let flow = mem::handle(token, env)?;
            finish(Panel::Mem, flow, env)?;
        }
        Ok(())
    }

    /// Filter text committed before the current edit began.
    pub fn saved_filter(&self) -> &str {
        self.proc.old_filter()
    }
}

/// Issues the refresh a layer asked for; `true` when the token is finished.
fn finish(panel: Panel, flow: Flow, env: &mut Env<'_>) -> Result<bool> {
    match flow {
        Flow::Refresh { redraw } => {
            env.runner.run(panel, true, redraw)?;
            Ok(true)
        }
        Flow::Done => Ok(true),
        Flow::Next => Ok(false),
    }
}
