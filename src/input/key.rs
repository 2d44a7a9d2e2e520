//! Semantic key tokens produced by the decoder.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Space,
    Backspace,
    Tab,
    ShiftTab,
    Up,
    Down,
    Left,
    Right,
    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    F(u8),
    MouseClick,
    MouseRelease,
    MouseScrollUp,
    MouseScrollDown,
}

impl Key {
    const NAMED: &'static [Key] = &[
        Key::Escape,
        Key::Enter,
        Key::Space,
        Key::Backspace,
        Key::Tab,
        Key::ShiftTab,
        Key::Up,
        Key::Down,
        Key::Left,
        Key::Right,
        Key::Insert,
        Key::Delete,
        Key::Home,
        Key::End,
        Key::PageUp,
        Key::PageDown,
        Key::MouseClick,
        Key::MouseRelease,
        Key::MouseScrollUp,
        Key::MouseScrollDown,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Key::Escape => "escape",
            Key::Enter => "enter",
            Key::Space => "space",
            Key::Backspace => "backspace",
            Key::Tab => "tab",
            Key::ShiftTab => "shift_tab",
            Key::Up => "up",
            Key::Down => "down",
            Key::Left => "left",
            Key::Right => "right",
            Key::Insert => "insert",
            Key::Delete => "delete",
            Key::Home => "home",
            Key::End => "end",
            Key::PageUp => "page_up",
            Key::PageDown => "page_down",
            Key::F(1) => "f1",
            Key::F(2) => "f2",
            Key::F(3) => "f3",
            Key::F(4) => "f4",
            Key::F(5) => "f5",
            Key::F(6) => "f6",
            Key::F(7) => "f7",
            Key::F(8) => "f8",
            Key::F(9) => "f9",
            Key::F(10) => "f10",
            Key::F(11) => "f11",
            Key::F(12) => "f12",
            Key::F(_) => "f?",
            Key::MouseClick => "mouse_click",
            Key::MouseRelease => "mouse_release",
            Key::MouseScrollUp => "mouse_scroll_up",
            Key::MouseScrollDown => "mouse_scroll_down",
        }
    }

    pub fn is_mouse(&self) -> bool {
        matches!(
            self,
            Key::MouseClick | Key::MouseRelease | Key::MouseScrollUp | Key::MouseScrollDown
        )
    }
}

impl FromStr for Key {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(n) = s.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
            return if (1..=12).contains(&n) { Ok(Key::F(n)) } else { Err(()) };
        }
        Self::NAMED.iter().copied().find(|k| k.name() == s).ok_or(())
    }
}

/// A fully decoded input event: a named key or one printable character.
///
/// "No actionable input" is represented as `Option::<Token>::None` by the
/// decoder, never as a partially filled token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Key(Key),
    Char(char),
}

impl Token {
    pub fn is_char(&self, c: char) -> bool {
        matches!(self, Token::Char(ch) if *ch == c)
    }

    pub fn is_key(&self, key: Key) -> bool {
        matches!(self, Token::Key(k) if *k == key)
    }

    pub fn is_mouse(&self) -> bool {
        matches!(self, Token::Key(k) if k.is_mouse())
    }
}

impl From<Key> for Token {
    fn from(key: Key) -> Self {
        Token::Key(key)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Key(key) => f.write_str(key.name()),
            Token::Char(c) => write!(f, "{c}"),
        }
    }
}

/// Parses a key name (`"page_up"`) or a single character (`"m"`).
///
/// Used for hit-test mappings that are declared by name.
impl FromStr for Token {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Token::Char(c)),
            (Some(_), Some(_)) => s.parse::<Key>().map(Token::Key),
            _ => Err(()),
        }
    }
}
