//! Raw terminal input: availability gate, burst decoding and the state the
//! decoder keeps between bursts (history ring, last mouse position).
//!
//! The input thread is the only writer of this state.

pub mod decoder;
pub mod history;
pub mod interrupt;
pub mod key;
pub mod mouse;
pub mod regions;
pub mod source;

use std::thread;
use std::time::Duration;

use crate::error::Result;

pub use history::{History, HISTORY_LEN};
pub use interrupt::Interrupt;
pub use key::{Key, Token};
pub use mouse::MousePosition;
pub use regions::MouseRegions;
pub use source::ByteSource;

/// Longest burst decoded at once; anything beyond is dropped unread.
pub const BURST_CAP: usize = 100;
const POLL_STEP: Duration = Duration::from_millis(10);

/// Modal state the decoder needs to route mouse events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeContext {
    /// The process filter is being edited.
    pub filtering: bool,
    /// A menu owns the screen and does its own hit-testing.
    pub menu_active: bool,
}

#[derive(Debug)]
pub struct Input<S: ByteSource> {
    source: S,
    history: History,
    mouse: MousePosition,
    regions: MouseRegions,
    interrupt: Interrupt,
}

impl<S: ByteSource> Input<S> {
    pub fn new(source: S, regions: MouseRegions, interrupt: Interrupt) -> Self {
        Self {
            source,
            history: History::new(),
            mouse: MousePosition::default(),
            regions,
            interrupt,
        }
    }

    /// Waits up to `timeout` for input or an interrupt.
    ///
    /// A zero timeout only reports current availability. An observed
    /// interrupt is cleared and reported as `true`.
    pub fn poll(&mut self, timeout: Duration) -> Result<bool> {
        let ready = self.source.available()? > 0;
        if ready || timeout.is_zero() {
            return Ok(ready);
        }

        let mut remaining = timeout;
        while !remaining.is_zero() {
            if self.interrupt.take() {
                return Ok(true);
            }
            if self.source.available()? > 0 {
                return Ok(true);
            }
            let step = remaining.min(POLL_STEP);
            thread::sleep(step);
            remaining -= step;
        }
        Ok(false)
    }

    /// Blocks until input arrives, then decodes it.
    ///
    /// Returns `Ok(None)` early if another thread raises the interrupt.
    pub fn wait(&mut self, ctx: DecodeContext) -> Result<Option<Token>> {
        loop {
            if self.interrupt.take() {
                return Ok(None);
            }
            if self.source.available()? > 0 {
                return self.get(ctx);
            }
            thread::sleep(POLL_STEP);
        }
    }

    /// Drains the pending burst and decodes it.
    ///
    /// Bytes past [`BURST_CAP`] are discarded. A successful decode is
    /// recorded in the history; a failed one changes nothing.
    pub fn get(&mut self, ctx: DecodeContext) -> Result<Option<Token>> {
        let mut burst = Vec::with_capacity(BURST_CAP);
        let mut buf = [0u8; BURST_CAP];
        while burst.len() < BURST_CAP {
            let available = self.source.available()?;
            if available == 0 {
                break;
            }
            let want = available.min(BURST_CAP - burst.len());
            let n = self.source.read(&mut buf[..want])?;
            if n == 0 {
                break;
            }
            burst.extend_from_slice(&buf[..n]);
        }
        if self.source.available()? > 0 {
            tracing::trace!("input burst over {} bytes, dropping the rest", BURST_CAP);
            self.source.discard()?;
        }

        let Some(decoded) = decoder::decode(&burst, ctx, &self.regions) else {
            if !burst.is_empty() {
                tracing::trace!("undecodable input burst: {:?}", String::from_utf8_lossy(&burst));
            }
            return Ok(None);
        };

        if let Some(pos) = decoded.mouse {
            self.mouse = pos;
        }
        self.history.push(decoded.token);
        Ok(Some(decoded.token))
    }

    /// Drops buffered input and forgets the key history.
    pub fn clear(&mut self) -> Result<()> {
        self.source.discard()?;
        self.history.clear();
        Ok(())
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn mouse_pos(&self) -> MousePosition {
        self.mouse
    }

    pub fn regions(&self) -> &MouseRegions {
        &self.regions
    }

    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ratatui::layout::Rect;
    use source::Scripted;
    use std::time::Instant;

    fn input() -> Input<Scripted> {
        Input::new(Scripted::new(), MouseRegions::new(), Interrupt::new())
    }

    fn feed(input: &mut Input<Scripted>, bytes: &[u8]) -> Option<Token> {
        input.source_mut().push(bytes);
        input.get(DecodeContext::default()).unwrap()
    }

    #[test]
    fn test_arrow_up_with_one_or_two_escapes() {
        let mut input = input();
        assert_eq!(feed(&mut input, b"\x1b[A"), Some(Token::Key(Key::Up)));
        assert_eq!(feed(&mut input, b"\x1b\x1b[A"), Some(Token::Key(Key::Up)));
        assert_eq!(input.history().last(), Some(&Token::Key(Key::Up)));
    }

    #[test]
    fn test_mouse_click_updates_position() {
        let mut input = input();
        assert_eq!(feed(&mut input, b"\x1b[<0;10;5M"), Some(Token::Key(Key::MouseClick)));
        assert_eq!(input.mouse_pos(), MousePosition::new(10, 5));
    }

    #[test]
    fn test_coalesced_wheel_burst_scrolls() {
        let mut input = input();
        assert_eq!(
            feed(&mut input, b"\x1b[<65;10;5M\x1b[<65;10;5M\x1b[<65;10;6M"),
            Some(Token::Key(Key::MouseScrollDown))
        );
        assert_eq!(input.mouse_pos(), MousePosition::new(10, 5));
    }

    #[test]
    fn test_mouse_click_in_region_yields_region_key() {
        let mut input = input();
        input.regions().register(Token::Char('e'), Rect::new(9, 5, 3, 1));
        assert_eq!(feed(&mut input, b"\x1b[<0;10;5M"), Some(Token::Char('e')));
        assert_eq!(input.mouse_pos(), MousePosition::new(10, 5));
    }

    #[test]
    fn test_failed_decode_changes_nothing() {
        let mut input = input();
        feed(&mut input, b"\x1b[<0;3;4M");
        feed(&mut input, b"x");
        let before: Vec<Option<Token>> = input.history().iter().map(|t| t.copied()).collect();

        let junk: [&[u8]; 4] = [b"abc", b"\x1b[<0;zz;4M", b"\x1b[99~", b"\xff\xfe"];
        for junk in junk {
            assert_eq!(feed(&mut input, junk), None);
        }

        let after: Vec<Option<Token>> = input.history().iter().map(|t| t.copied()).collect();
        assert_eq!(before, after);
        assert_eq!(input.mouse_pos(), MousePosition::new(3, 4));
    }

    #[test]
    fn test_suppressed_mouse_leaves_position() {
        let mut input = input();
        feed(&mut input, b"\x1b[<0;3;4M");
        input.source_mut().push(b"\x1b[<64;30;40M");
        let ctx = DecodeContext {
            filtering: true,
            menu_active: false,
        };
        assert_eq!(input.get(ctx).unwrap(), None);
        assert_eq!(input.mouse_pos(), MousePosition::new(3, 4));
    }

    #[test]
    fn test_overlong_burst_is_dropped() {
        let mut input = input();
        input.source_mut().push(vec![b'a'; 250]);
        assert_eq!(input.get(DecodeContext::default()).unwrap(), None);
        assert_eq!(input.source_mut().remaining(), 0);
        assert_eq!(input.history().last(), None);
    }

    #[test]
    fn test_clear_discards_and_resets_history() {
        let mut input = input();
        feed(&mut input, b"+");
        input.source_mut().push(b"\x1b[B");
        input.clear().unwrap();
        assert_eq!(input.source_mut().remaining(), 0);
        assert_eq!(input.history().len(), history::HISTORY_LEN);
        assert!(input.history().matches_all(|t| t.is_none()));
    }

    #[test]
    fn test_poll_immediate_when_available() {
        let mut input = input();
        assert!(!input.poll(Duration::ZERO).unwrap());
        input.source_mut().push(b"q");
        assert!(input.poll(Duration::ZERO).unwrap());
        assert!(input.poll(Duration::from_secs(10)).unwrap());
    }

    #[test]
    fn test_poll_times_out() {
        let mut input = input();
        let start = Instant::now();
        assert!(!input.poll(Duration::from_millis(35)).unwrap());
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_poll_woken_by_interrupt() {
        let mut input = input();
        let remote = input.interrupt().clone();
        let waker = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            remote.trigger();
        });

        let start = Instant::now();
        assert!(input.poll(Duration::from_secs(10)).unwrap());
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(!input.interrupt().is_set());
        waker.join().unwrap();
    }

    #[test]
    fn test_wait_returns_token() {
        let mut input = input();
        input.source_mut().push(b"\x1b[5~");
        assert_eq!(input.wait(DecodeContext::default()).unwrap(), Some(Token::Key(Key::PageUp)));
    }

    #[test]
    fn test_wait_interrupted() {
        let mut input = input();
        input.interrupt().trigger();
        assert_eq!(input.wait(DecodeContext::default()).unwrap(), None);
    }
}
