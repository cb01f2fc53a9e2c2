use crate::input::KeyCode;
use crate::input::KeyEvent;
use crate::input::KeyModifiers;

/// A set of keys that trigger one surface action, plus the text shown for it in the help bar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub keys: Vec<KeyEvent>,
    pub help_key: String,
    pub help_desc: String,
}

impl Binding {
    pub fn new(
        help_key: impl Into<String>,
        help_desc: impl Into<String>,
        keys: Vec<KeyEvent>,
    ) -> Self {
        Self {
            keys,
            help_key: help_key.into(),
            help_desc: help_desc.into(),
        }
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.keys.iter().any(|k| key_event_matches(k, event))
    }
}

/// Looks up the action bound to `event`, first match wins.
pub fn lookup<A: Copy>(bindings: &[(Binding, A)], event: &KeyEvent) -> Option<A> {
    bindings
        .iter()
        .find(|(binding, _)| binding.matches(event))
        .map(|(_, action)| *action)
}

/// Shift is ignored for characters; the terminal already reports `G` rather than `g`.
pub fn key_event_matches(pattern: &KeyEvent, event: &KeyEvent) -> bool {
    if pattern.code != event.code {
        return false;
    }
    match event.code {
        KeyCode::Char(_) => {
            pattern.modifiers.ctrl == event.modifiers.ctrl
                && pattern.modifiers.alt == event.modifiers.alt
        }
        _ => pattern.modifiers == event.modifiers,
    }
}

pub fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code)
}

pub fn key_char(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c))
}

pub fn key_ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c)).with_modifiers(KeyModifiers::ctrl())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Act {
        Toggle,
        Quit,
    }

    #[test]
    fn binding_matches_exact_modifiers() {
        let b = Binding::new("^e", "toggle", vec![key_ctrl('e')]);
        assert!(b.matches(&key_ctrl('e')));
        assert!(!b.matches(&key_char('e')));
    }

    #[test]
    fn lookup_returns_first_bound_action() {
        let bindings = vec![
            (Binding::new("^e", "toggle", vec![key_ctrl('e')]), Act::Toggle),
            (
                Binding::new("^q", "quit", vec![key_ctrl('q'), key(KeyCode::Esc)]),
                Act::Quit,
            ),
        ];
        assert_eq!(lookup(&bindings, &key(KeyCode::Esc)), Some(Act::Quit));
        assert_eq!(lookup(&bindings, &key_ctrl('e')), Some(Act::Toggle));
        assert_eq!(lookup(&bindings, &key_char('x')), None);
    }

    #[test]
    fn shifted_characters_match_their_case() {
        let b = Binding::new("G", "bottom", vec![key_char('G')]);
        let shifted = key_char('G').with_modifiers(KeyModifiers {
            shift: true,
            ..KeyModifiers::none()
        });
        assert!(b.matches(&shifted));
        assert!(!b.matches(&key_char('g')));
    }
}
