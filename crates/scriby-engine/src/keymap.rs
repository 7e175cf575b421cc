//! Fixed keyboard shortcut table.
//!
//! Front ends translate their key events into a [`KeyChord`] and dispatch
//! the resulting [`Action`]; a chord that resolves to an action is consumed.

use std::fmt;

use crate::editing::FormatCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Bold,
    Italic,
    Underline,
    NewPage,
    FocusSearch,
    Undo,
    Redo,
    Save,
    ToggleTheme,
    Export,
    OpenHistory,
    CollapseSidebar,
    ClearFormatting,
}

impl Action {
    /// The formatting command behind formatting shortcuts
    pub fn format_command(self) -> Option<FormatCommand> {
        match self {
            Action::Bold => Some(FormatCommand::Bold),
            Action::Italic => Some(FormatCommand::Italic),
            Action::Underline => Some(FormatCommand::Underline),
            Action::ClearFormatting => Some(FormatCommand::ClearFormatting),
            _ => None,
        }
    }
}

/// A modifier + letter combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub ctrl: bool,
    pub shift: bool,
    pub key: char,
}

impl KeyChord {
    pub const fn ctrl(key: char) -> Self {
        Self {
            ctrl: true,
            shift: false,
            key,
        }
    }

    pub const fn ctrl_shift(key: char) -> Self {
        Self {
            ctrl: true,
            shift: true,
            key,
        }
    }

    fn normalized(self) -> Self {
        Self {
            key: self.key.to_ascii_lowercase(),
            ..self
        }
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            write!(f, "Ctrl+")?;
        }
        if self.shift {
            write!(f, "Shift+")?;
        }
        write!(f, "{}", self.key.to_ascii_uppercase())
    }
}

pub const SHORTCUTS: &[(KeyChord, Action)] = &[
    (KeyChord::ctrl('b'), Action::Bold),
    (KeyChord::ctrl('i'), Action::Italic),
    (KeyChord::ctrl('u'), Action::Underline),
    (KeyChord::ctrl('n'), Action::NewPage),
    (KeyChord::ctrl('p'), Action::FocusSearch),
    (KeyChord::ctrl('z'), Action::Undo),
    (KeyChord::ctrl('y'), Action::Redo),
    (KeyChord::ctrl_shift('z'), Action::Redo),
    (KeyChord::ctrl('s'), Action::Save),
    (KeyChord::ctrl('m'), Action::ToggleTheme),
    (KeyChord::ctrl('f'), Action::FocusSearch),
    (KeyChord::ctrl('e'), Action::Export),
    (KeyChord::ctrl('h'), Action::OpenHistory),
    (KeyChord::ctrl('l'), Action::CollapseSidebar),
    (KeyChord::ctrl('r'), Action::ClearFormatting),
];

pub fn lookup(chord: KeyChord) -> Option<Action> {
    let chord = chord.normalized();
    SHORTCUTS
        .iter()
        .find(|(candidate, _)| *candidate == chord)
        .map(|(_, action)| *action)
}
