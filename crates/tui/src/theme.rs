use ratatui::style::Color;

pub struct Theme {
    pub border_focus: Color,
    pub border_inactive: Color,
    pub transcript_border: Color,
    pub prompt: Color,
    pub error: Color,
    pub status: Color,
}

pub const THEME: Theme = Theme {
    border_focus: Color::Cyan,
    border_inactive: Color::DarkGray,
    transcript_border: Color::DarkGray,
    prompt: Color::Green,
    error: Color::Red,
    status: Color::DarkGray,
};
