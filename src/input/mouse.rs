//! SGR mouse reports: `ESC [ < Cb ; Cx ; Cy M/m`.
//!
//! Only the button codes the monitor reacts to are recognised: left press
//! (`0`, `M`), left release (`0`, `m`) and the vertical wheel (`64`/`65`).
//! Anything else, including drags and modifier bits, fails the decode.

use super::key::{Key, Token};
use super::regions::MouseRegions;
use super::DecodeContext;

/// Last reported pointer position, as the terminal reports it (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MousePosition {
    pub col: u16,
    pub line: u16,
}

impl MousePosition {
    pub fn new(col: u16, line: u16) -> Self {
        Self { col, line }
    }
}

/// Classifies the report body that follows the `[<` prefix.
pub fn classify(body: &str) -> Option<(Key, MousePosition)> {
    let (key, coords) = if let Some(coords) = body.strip_prefix("0;") {
        if body.ends_with('M') {
            (Key::MouseClick, coords)
        } else if body.ends_with('m') {
            (Key::MouseRelease, coords)
        } else {
            return None;
        }
    } else if let Some(coords) = body.strip_prefix("64;") {
        (Key::MouseScrollUp, coords)
    } else if let Some(coords) = body.strip_prefix("65;") {
        (Key::MouseScrollDown, coords)
    } else {
        return None;
    };

    // A burst may hold several reports; the position comes from the first.
    let coords = coords.find(['M', 'm']).map_or(coords, |end| &coords[..end]);
    let (col, line) = coords.split_once(';')?;
    let col = col.parse::<u16>().ok()?;
    let line = line.parse::<u16>().ok()?;

    Some((key, MousePosition::new(col, line)))
}

/// Turns a classified report into the token dispatch should see.
///
/// Returns `None` when the event is suppressed; the caller must then leave
/// the stored position untouched.
pub fn resolve(
    body: &str,
    ctx: DecodeContext,
    regions: &MouseRegions,
) -> Option<(Token, MousePosition)> {
    let (key, pos) = classify(body)?;

    if ctx.filtering {
        return (key == Key::MouseClick).then_some((Token::Key(key), pos));
    }
    if ctx.menu_active || key != Key::MouseClick {
        return Some((Token::Key(key), pos));
    }

    let token = regions
        .contains(pos.col, pos.line)
        .unwrap_or(Token::Key(key));
    Some((token, pos))
}
