//! Key routing for the timeline.
//!
//! Keys arrive as host-independent identifiers (the DOM names: `ArrowUp`,
//! `PageDown`, …) so that any host, terminal or otherwise, can feed them in.

#![allow(missing_docs)]

use crate::timeline::scale::ZoomDirection;
use crate::timeline::viewport::NavStep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    PageUp,
    PageDown,
    Home,
    End,
    Enter,
    Escape,
    Char(char),
    Unidentified,
}

impl Key {
    /// Parse a key identifier such as `ArrowLeft` or `q`.
    #[must_use]
    pub fn from_identifier(raw: &str) -> Self {
        match raw {
            "ArrowUp" | "Up" => Self::ArrowUp,
            "ArrowDown" | "Down" => Self::ArrowDown,
            "ArrowLeft" | "Left" => Self::ArrowLeft,
            "ArrowRight" | "Right" => Self::ArrowRight,
            "PageUp" => Self::PageUp,
            "PageDown" => Self::PageDown,
            "Home" => Self::Home,
            "End" => Self::End,
            "Enter" => Self::Enter,
            "Escape" | "Esc" => Self::Escape,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Self::Char(ch),
                    _ => Self::Unidentified,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub ctrl: bool,
}

impl KeyInput {
    #[must_use]
    pub const fn plain(key: Key) -> Self {
        Self { key, ctrl: false }
    }

    #[must_use]
    pub const fn ctrl(key: Key) -> Self {
        Self { key, ctrl: true }
    }
}

impl From<Key> for KeyInput {
    fn from(key: Key) -> Self {
        Self::plain(key)
    }
}

/// Scroll direction in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    /// Toward earlier dates; positive offset delta.
    Backward,
    /// Toward later dates; negative offset delta.
    Forward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Scroll(ScrollDirection),
    Zoom(ZoomDirection),
    Navigate(NavStep),
    SelectClosest,
    Quit,
}

/// Outcome of routing one key.
///
/// `consumed` tells the host to suppress its native handling of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputResolution {
    pub action: Option<InputAction>,
    pub consumed: bool,
}

impl InputResolution {
    const fn action(action: InputAction) -> Self {
        Self {
            action: Some(action),
            consumed: false,
        }
    }

    const fn consumed(action: InputAction) -> Self {
        Self {
            action: Some(action),
            consumed: true,
        }
    }

    const fn passthrough() -> Self {
        Self {
            action: None,
            consumed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelpBinding {
    pub keys: &'static str,
    pub description: &'static str,
}

pub const KEY_BINDINGS: &[HelpBinding] = &[
    HelpBinding {
        keys: "Up / Down",
        description: "scroll half a screen back / forward in time",
    },
    HelpBinding {
        keys: "PgUp / PgDn",
        description: "zoom in / out (month, year, decade)",
    },
    HelpBinding {
        keys: "Left / Right",
        description: "previous / next event",
    },
    HelpBinding {
        keys: "Home / End",
        description: "first / last event",
    },
    HelpBinding {
        keys: "c / Enter",
        description: "select the event nearest the center",
    },
    HelpBinding {
        keys: "q / Esc / Ctrl-C",
        description: "quit",
    },
];

/// Map a key to a timeline action.
#[must_use]
pub fn resolve_key(input: &KeyInput) -> InputResolution {
    match input.key {
        Key::Char('c' | 'C') if input.ctrl => InputResolution::consumed(InputAction::Quit),
        Key::Char('q') | Key::Escape => InputResolution::consumed(InputAction::Quit),
        Key::ArrowUp => InputResolution::action(InputAction::Scroll(ScrollDirection::Backward)),
        Key::ArrowDown => InputResolution::action(InputAction::Scroll(ScrollDirection::Forward)),
        Key::PageUp => InputResolution::action(InputAction::Zoom(ZoomDirection::In)),
        Key::PageDown => InputResolution::action(InputAction::Zoom(ZoomDirection::Out)),
        Key::ArrowLeft => InputResolution::consumed(InputAction::Navigate(NavStep::Prev)),
        Key::ArrowRight => InputResolution::consumed(InputAction::Navigate(NavStep::Next)),
        Key::Home => InputResolution::action(InputAction::Navigate(NavStep::First)),
        Key::End => InputResolution::action(InputAction::Navigate(NavStep::Last)),
        Key::Char('c') | Key::Enter => InputResolution::action(InputAction::SelectClosest),
        _ => InputResolution::passthrough(),
    }
}
