use std::time::Duration;

use super::rendering::lock;
use super::App;
use crate::config::{BoolOpt, ConfigStore};
use crate::dispatch::Env;
use crate::error::Result;
use crate::input::{DecodeContext, Token};

/// Upper bound on one poll so the quit flag is noticed promptly.
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

impl App {
    /// Reads and dispatches keys until quit is requested or the render
    /// thread stops.
    pub fn run(&mut self) -> Result<()> {
        tracing::info!("input loop started");

        while !self.runner.quit_requested() {
            if self.render.as_ref().map_or(true, |h| h.is_finished()) {
                tracing::warn!("render thread exited, stopping input loop");
                break;
            }

            if !self.input.poll(POLL_TIMEOUT)? {
                continue;
            }

            let ctx = DecodeContext {
                filtering: lock(&self.options).get_bool(BoolOpt::ProcFiltering),
                menu_active: false,
            };
            let Some(token) = self.input.get(ctx)? else {
                continue;
            };
            tracing::trace!(%token, "key");
            self.dispatch(token);
        }

        self.join_render()
    }

    fn dispatch(&mut self, token: Token) {
        let mut options = lock(&self.options);
        let mut procs = lock(&self.procs);
        let mut env = Env {
            config: &mut *options,
            procs: &mut *procs,
            editor: &mut self.editor,
            runner: &self.runner,
            history: self.input.history(),
            mouse: self.input.mouse_pos(),
        };
        if let Err(e) = self.dispatcher.process(token, &mut env) {
            tracing::warn!("{}", e);
        }
    }
}
