//! Classifies one raw input burst.
//!
//! Lookups are exact: a sequence that is not in the table fails instead of
//! matching a key it merely starts with.

use super::key::{Key, Token};
use super::mouse::{self, MousePosition};
use super::regions::MouseRegions;
use super::DecodeContext;

pub const ESC: u8 = 0x1b;

/// Single bytes that carry a key on their own.
static CONTROL_KEYS: &[(&[u8], Key)] = &[
    (b"\x1b", Key::Escape),
    (b"\n", Key::Enter),
    (b"\r", Key::Enter),
    (b" ", Key::Space),
    (b"\x7f", Key::Backspace),
    (b"\x08", Key::Backspace),
    (b"\t", Key::Tab),
];

/// CSI and SS3 sequences, without their leading escape byte.
static ESCAPE_SEQUENCES: &[(&[u8], Key)] = &[
    (b"[A", Key::Up),
    (b"OA", Key::Up),
    (b"[B", Key::Down),
    (b"OB", Key::Down),
    (b"[D", Key::Left),
    (b"OD", Key::Left),
    (b"[C", Key::Right),
    (b"OC", Key::Right),
    (b"[2~", Key::Insert),
    (b"[3~", Key::Delete),
    (b"[H", Key::Home),
    (b"[F", Key::End),
    (b"[5~", Key::PageUp),
    (b"[6~", Key::PageDown),
    (b"[Z", Key::ShiftTab),
    (b"OP", Key::F(1)),
    (b"OQ", Key::F(2)),
    (b"OR", Key::F(3)),
    (b"OS", Key::F(4)),
    (b"[15~", Key::F(5)),
    (b"[17~", Key::F(6)),
    (b"[18~", Key::F(7)),
    (b"[19~", Key::F(8)),
    (b"[20~", Key::F(9)),
    (b"[21~", Key::F(10)),
    (b"[23~", Key::F(11)),
    (b"[24~", Key::F(12)),
];

const MOUSE_PREFIX: &[u8] = b"[<";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub token: Token,
    /// Set only for mouse events.
    pub mouse: Option<MousePosition>,
}

impl Decoded {
    fn key(key: Key) -> Self {
        Self {
            token: Token::Key(key),
            mouse: None,
        }
    }
}

fn lookup(table: &[(&[u8], Key)], bytes: &[u8]) -> Option<Key> {
    table
        .iter()
        .find(|(seq, _)| *seq == bytes)
        .map(|(_, key)| *key)
}

/// Strips the escape introducer: one byte normally, two for terminals that
/// double it. A lone escape is left alone.
fn strip_escape(burst: &[u8]) -> Option<&[u8]> {
    match burst {
        [ESC, ESC, rest @ ..] if !rest.is_empty() => Some(rest),
        [ESC, rest @ ..] if !rest.is_empty() => Some(rest),
        _ => None,
    }
}

pub fn decode(burst: &[u8], ctx: DecodeContext, regions: &MouseRegions) -> Option<Decoded> {
    if burst.is_empty() {
        return None;
    }
    if let Some(key) = lookup(CONTROL_KEYS, burst) {
        return Some(Decoded::key(key));
    }

    let (escaped, rest) = match strip_escape(burst) {
        Some(rest) => (true, rest),
        None => (false, burst),
    };

    if escaped {
        if let Some(body) = rest.strip_prefix(MOUSE_PREFIX) {
            let body = std::str::from_utf8(body).ok()?;
            let (token, pos) = mouse::resolve(body, ctx, regions)?;
            return Some(Decoded {
                token,
                mouse: Some(pos),
            });
        }
        if let Some(key) = lookup(ESCAPE_SEQUENCES, rest).or_else(|| lookup(CONTROL_KEYS, rest)) {
            return Some(Decoded::key(key));
        }
    }

    let text = std::str::from_utf8(rest).ok()?;
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_control() => Some(Decoded {
            token: Token::Char(c),
            mouse: None,
        }),
        _ => None,
    }
}
