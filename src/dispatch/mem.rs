use crate::config::BoolOpt;
use crate::error::Result;
use crate::input::Token;

use super::{Env, Flow};

/// Last layer: `i` switches the disk io view, and whatever reached this
/// far still refreshes the panel.
pub(super) fn handle(token: Token, env: &mut Env<'_>) -> Result<Flow> {
    if token.is_char('i') {
        env.config.flip(BoolOpt::IoMode)?;
    }
    Ok(Flow::Refresh { redraw: true })
}

#[cfg(test)]
mod tests {
    use super::super::testing::{Call, Harness};
    use super::*;
    use crate::config::ConfigStore;
    use crate::input::Key;
    use crate::panel::Panel;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_io_mode_toggle() {
        let mut h = Harness::new();
        h.press(Token::Char('i')).unwrap();
        assert!(h.options.get_bool(BoolOpt::IoMode));
        h.press(Token::Char('i')).unwrap();
        assert!(!h.options.get_bool(BoolOpt::IoMode));
        assert_eq!(
            h.calls(),
            vec![Call::Run(Panel::Mem, true, true), Call::Run(Panel::Mem, true, true)]
        );
    }

    #[test]
    fn test_any_token_refreshes() {
        let mut h = Harness::new();
        h.only_show(&[Panel::Mem]);
        h.press(Token::Key(Key::F(2))).unwrap();
        assert_eq!(h.calls(), vec![Call::Run(Panel::Mem, true, true)]);
    }

    #[test]
    fn test_hidden_mem_ignores_io_key() {
        let mut h = Harness::new();
        h.only_show(&[Panel::Net]);
        h.press(Token::Char('i')).unwrap();
        assert!(!h.options.get_bool(BoolOpt::IoMode));
        assert_eq!(h.calls(), vec![]);
    }
}
