use std::time::{Duration, Instant};

use crate::config::{IntOpt, UPDATE_MS_MAX};
use crate::error::Result;
use crate::input::Token;

use super::{Env, Flow};

const SMALL_STEP: i64 = 100;
const LARGE_STEP: i64 = 1000;
/// Presses closer together than this count as a held key.
const HOLD_WINDOW: Duration = Duration::from_millis(200);

const RAISE_LIMIT: i64 = UPDATE_MS_MAX - SMALL_STEP;
const RAISE_FAST_LIMIT: i64 = UPDATE_MS_MAX - LARGE_STEP;
const LOWER_LIMIT: i64 = 200;
const LOWER_FAST_LIMIT: i64 = 2000;

/// Sampling interval keys `+` and `-`, accelerating while held.
#[derive(Debug, Default)]
pub(super) struct CpuLayer {
    last_press: Option<Instant>,
}

impl CpuLayer {
    pub(super) fn handle(&mut self, token: Token, env: &mut Env<'_>, now: Instant) -> Result<Flow> {
        let current = env.config.get_int(IntOpt::UpdateMs);

        let delta = match token {
            Token::Char('+') if current <= RAISE_LIMIT => {
                self.step(token, env, now, current <= RAISE_FAST_LIMIT)
            }
            Token::Char('-') if current >= LOWER_LIMIT => {
                -self.step(token, env, now, current >= LOWER_FAST_LIMIT)
            }
            _ => return Ok(Flow::Next),
        };

        env.config.set_int(IntOpt::UpdateMs, current + delta)?;
        self.last_press = Some(now);
        tracing::debug!(update_ms = current + delta, "sampling interval changed");
        Ok(Flow::Refresh { redraw: true })
    }

    fn step(&self, token: Token, env: &Env<'_>, now: Instant, room: bool) -> i64 {
        let held = self
            .last_press
            .is_some_and(|t| now.saturating_duration_since(t) <= HOLD_WINDOW);
        if room && held && env.history.all_eq(token) {
            LARGE_STEP
        } else {
            SMALL_STEP
        }
    }
}
