use crate::config::BoolOpt;
use crate::error::Result;
use crate::input::Token;
use crate::panel::Panel;

use super::{Env, Flow};

const QUIT: char = 'q';

/// Keys that mean the same thing whichever panel is visible. Inactive
/// while the process filter is being edited, so they can be typed.
pub(super) fn handle(token: Token, env: &mut Env<'_>) -> Result<Flow> {
    if env.config.get_bool(BoolOpt::ProcFiltering) {
        return Ok(Flow::Next);
    }

    let Token::Char(c) = token else {
        return Ok(Flow::Next);
    };

    if c == QUIT {
        tracing::info!("quit requested");
        env.runner.quit();
        return Ok(Flow::Done);
    }

    if let Some(panel) = Panel::from_digit(c) {
        env.config.toggle_panel(panel)?;
        tracing::debug!(%panel, shown = env.config.panel_shown(panel), "toggled panel");
        env.runner.resize(true)?;
        return Ok(Flow::Done);
    }

    Ok(Flow::Next)
}
