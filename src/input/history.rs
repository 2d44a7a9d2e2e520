use std::collections::VecDeque;

use super::key::Token;

pub const HISTORY_LEN: usize = 50;

/// Fixed-size record of the most recent tokens, oldest first.
///
/// Always holds exactly [`HISTORY_LEN`] slots; `None` marks a slot that has
/// not been filled since startup or the last [`History::clear`].
#[derive(Debug, Clone)]
pub struct History {
    slots: VecDeque<Option<Token>>,
}

impl History {
    pub fn new() -> Self {
        Self {
            slots: std::iter::repeat(None).take(HISTORY_LEN).collect(),
        }
    }

    pub fn push(&mut self, token: Token) {
        self.slots.pop_front();
        self.slots.push_back(Some(token));
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    pub fn matches_all(&self, pred: impl Fn(Option<&Token>) -> bool) -> bool {
        self.slots.iter().all(|slot| pred(slot.as_ref()))
    }

    /// True when every slot holds `token`.
    pub fn all_eq(&self, token: Token) -> bool {
        self.matches_all(|slot| slot == Some(&token))
    }

    pub fn last(&self) -> Option<&Token> {
        self.slots.back().and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&Token>> {
        self.slots.iter().map(Option::as_ref)
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
