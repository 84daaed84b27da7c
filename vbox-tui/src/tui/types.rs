use std::fmt;

use crossterm::event::KeyCode;

/// Registered screens. `Nil` only ever appears as the bottom history frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ScreenId {
    #[default]
    Nil,
    Vm,
    Props,
    Usb,
}

impl ScreenId {
    pub fn label(&self) -> &'static str {
        match self {
            ScreenId::Nil => "nil",
            ScreenId::Vm => "vm",
            ScreenId::Props => "props",
            ScreenId::Usb => "usb",
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One navigation position: which screen, and what it was opened with.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct NavigationFrame {
    pub screen: ScreenId,
    pub args: Vec<String>,
}

impl NavigationFrame {
    pub fn new(screen: ScreenId, args: Vec<String>) -> Self {
        Self { screen, args }
    }

    pub fn nil() -> Self {
        Self::default()
    }

    pub fn is_nil(&self) -> bool {
        self.screen == ScreenId::Nil
    }
}

/// A row of a screen: `key` identifies the record, `text` is what gets drawn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayItem {
    pub key: String,
    pub text: String,
}

/// Logical commands, independent of the key that triggered them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    FocusDown,
    FocusUp,
    Drill,
    DrillUsb,
    Back,
    Refresh,
    ToggleVerbose,
    OpenEdit,
    ToggleAttachment,
}

impl Command {
    pub fn from_key(code: KeyCode) -> Option<Self> {
        let command = match code {
            KeyCode::Char('q') | KeyCode::Char('Q') => Command::Quit,
            KeyCode::Char('j') | KeyCode::Down => Command::FocusDown,
            KeyCode::Char('k') | KeyCode::Up => Command::FocusUp,
            KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => Command::Drill,
            KeyCode::Char('u') => Command::DrillUsb,
            KeyCode::Char('h') | KeyCode::Left | KeyCode::Backspace | KeyCode::Esc => {
                Command::Back
            }
            KeyCode::Char('r') => Command::Refresh,
            KeyCode::Char('v') => Command::ToggleVerbose,
            KeyCode::Char('e') => Command::OpenEdit,
            KeyCode::Char(' ') | KeyCode::Char('a') => Command::ToggleAttachment,
            _ => return None,
        };
        Some(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vi_keys_and_arrows_move_focus() {
        assert_eq!(Command::from_key(KeyCode::Char('j')), Some(Command::FocusDown));
        assert_eq!(Command::from_key(KeyCode::Down), Some(Command::FocusDown));
        assert_eq!(Command::from_key(KeyCode::Char('k')), Some(Command::FocusUp));
        assert_eq!(Command::from_key(KeyCode::Up), Some(Command::FocusUp));
    }

    #[test]
    fn unbound_keys_map_to_nothing() {
        assert_eq!(Command::from_key(KeyCode::Char('z')), None);
        assert_eq!(Command::from_key(KeyCode::F(1)), None);
    }

    #[test]
    fn only_the_sentinel_frame_is_nil() {
        let frame = NavigationFrame::new(ScreenId::Usb, vec!["web".into()]);
        assert!(!frame.is_nil());
        assert!(NavigationFrame::nil().is_nil());
        assert!(NavigationFrame::nil().args.is_empty());
    }
}
