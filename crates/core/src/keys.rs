/// A key press as seen by the controller, independent of the event source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Up,
    Down,
    Tab,
    Enter,
    Other,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { ctrl: false, shift: false, alt: false };
    pub const CTRL: Modifiers = Modifiers { ctrl: true, shift: false, alt: false };
}

/// Keys the controller owns. Everything else is ordinary text editing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyCommand {
    ClearScreen,
    Interrupt,
    HistoryUp,
    HistoryDown,
    SuppressTab,
    Submit,
}

impl KeyCommand {
    pub fn resolve(key: Key, mods: Modifiers) -> Option<Self> {
        match key {
            Key::Char(c) if mods.ctrl && c.eq_ignore_ascii_case(&'l') => Some(KeyCommand::ClearScreen),
            Key::Char(c) if mods.ctrl && c.eq_ignore_ascii_case(&'c') => Some(KeyCommand::Interrupt),
            Key::Up => Some(KeyCommand::HistoryUp),
            Key::Down => Some(KeyCommand::HistoryDown),
            Key::Tab => Some(KeyCommand::SuppressTab),
            Key::Enter => Some(KeyCommand::Submit),
            _ => None,
        }
    }
}
