//! Screen rectangles that turn mouse clicks into named keys.
//!
//! The draw side repopulates the registry whenever panel geometry changes;
//! the input thread only ever reads it while resolving a `mouse_click`.

use std::sync::{Arc, RwLock};

use ratatui::layout::{Position, Rect};

use super::key::Token;

#[derive(Debug, Clone, Default)]
pub struct MouseRegions {
    inner: Arc<RwLock<Vec<(Token, Rect)>>>,
}

impl MouseRegions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `area` to `token`, replacing any earlier area for the same token.
    pub fn register(&self, token: Token, area: Rect) {
        let mut regions = self.inner.write().unwrap_or_else(|e| e.into_inner());
        regions.retain(|(t, _)| *t != token);
        regions.push((token, area));
    }

    /// Swaps the whole mapping in one write.
    pub fn replace(&self, mappings: Vec<(Token, Rect)>) {
        let mut regions = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *regions = mappings;
    }

    pub fn clear(&self) {
        self.replace(Vec::new());
    }

    /// First registered token whose rectangle contains the point.
    pub fn contains(&self, col: u16, line: u16) -> Option<Token> {
        let regions = self.inner.read().unwrap_or_else(|e| e.into_inner());
        regions
            .iter()
            .find(|(_, area)| area.contains(Position::new(col, line)))
            .map(|(token, _)| *token)
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|r| r.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::key::Key;

    #[test]
    fn test_contains_uses_half_open_bounds() {
        let regions = MouseRegions::new();
        regions.register(Token::Char('m'), Rect::new(10, 5, 4, 2));

        assert_eq!(regions.contains(10, 5), Some(Token::Char('m')));
        assert_eq!(regions.contains(13, 6), Some(Token::Char('m')));
        assert_eq!(regions.contains(14, 5), None);
        assert_eq!(regions.contains(10, 7), None);
        assert_eq!(regions.contains(9, 5), None);
    }

    #[test]
    fn test_register_replaces_same_token() {
        let regions = MouseRegions::new();
        regions.register(Token::Key(Key::PageUp), Rect::new(0, 0, 2, 2));
        regions.register(Token::Key(Key::PageUp), Rect::new(20, 20, 2, 2));

        assert_eq!(regions.len(), 1);
        assert_eq!(regions.contains(0, 0), None);
        assert_eq!(regions.contains(21, 21), Some(Token::Key(Key::PageUp)));
    }

    #[test]
    fn test_shared_between_clones() {
        let draw_side = MouseRegions::new();
        let input_side = draw_side.clone();
        draw_side.replace(vec![(Token::Char('e'), Rect::new(1, 1, 1, 1))]);
        assert_eq!(input_side.contains(1, 1), Some(Token::Char('e')));
        draw_side.clear();
        assert_eq!(input_side.contains(1, 1), None);
    }
}
