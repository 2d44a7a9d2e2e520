use crate::input::{Key, Token};

use super::host::LineEditor;

/// Minimal single-line editor with a character cursor.
#[derive(Debug, Clone, Default)]
pub struct TextEdit {
    text: String,
    /// Cursor position in characters, `0..=len`.
    cursor: usize,
}

impl TextEdit {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            cursor: text.chars().count(),
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_at(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map_or(self.text.len(), |(i, _)| i)
    }

    fn insert(&mut self, c: char) {
        let at = self.byte_at(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    fn remove(&mut self, char_idx: usize) {
        let at = self.byte_at(char_idx);
        self.text.remove(at);
    }
}

impl LineEditor for TextEdit {
    fn command(&mut self, token: &Token) -> bool {
        match token {
            Token::Char(c) => self.insert(*c),
            Token::Key(Key::Space) => self.insert(' '),
            Token::Key(Key::Backspace) if self.cursor > 0 => {
                self.cursor -= 1;
                self.remove(self.cursor);
            }
            Token::Key(Key::Delete) if self.cursor < self.len() => self.remove(self.cursor),
            Token::Key(Key::Left) if self.cursor > 0 => self.cursor -= 1,
            Token::Key(Key::Right) if self.cursor < self.len() => self.cursor += 1,
            Token::Key(Key::Home) => self.cursor = 0,
            Token::Key(Key::End) => self.cursor = self.len(),
            _ => return false,
        }
        true
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn reset(&mut self, text: &str) {
        *self = Self::new(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_all(edit: &mut TextEdit, tokens: &[Token]) {
        for token in tokens {
            edit.command(token);
        }
    }

    #[test]
    fn test_typing_appends() {
        let mut edit = TextEdit::default();
        type_all(
            &mut edit,
            &[Token::Char('b'), Token::Char('a'), Token::Key(Key::Space), Token::Char('ş')],
        );
        assert_eq!(edit.text(), "ba ş");
        assert_eq!(edit.cursor(), 4);
    }

    #[test]
    fn test_cursor_editing() {
        let mut edit = TextEdit::new("bash");
        type_all(
            &mut edit,
            &[
                Token::Key(Key::Home),
                Token::Key(Key::Delete),
                Token::Char('d'),
                Token::Key(Key::End),
                Token::Key(Key::Backspace),
            ],
        );
        assert_eq!(edit.text(), "das");
    }

    #[test]
    fn test_noop_edits_report_false() {
        let mut edit = TextEdit::new("");
        assert!(!edit.command(&Token::Key(Key::Backspace)));
        assert!(!edit.command(&Token::Key(Key::Delete)));
        assert!(!edit.command(&Token::Key(Key::Left)));
        assert!(!edit.command(&Token::Key(Key::F(5))));
        assert!(!edit.command(&Token::Key(Key::MouseScrollUp)));
    }

    #[test]
    fn test_reset_moves_cursor_to_end() {
        let mut edit = TextEdit::new("abc");
        edit.command(&Token::Key(Key::Home));
        edit.reset("xy");
        assert_eq!(edit.text(), "xy");
        assert_eq!(edit.cursor(), 2);
    }
}
