use std::time::{Duration, Instant};

pub const CURSOR_GLYPH: &str = "│";
const HIDDEN_GLYPH: &str = " ";

pub const DEFAULT_BLINK_INTERVAL: Duration = Duration::from_millis(500);

/// How the text cursor is presented in the display line. One variant is
/// active per controller, so blinking and static rendering never mix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CursorStyle {
    #[default]
    Static,
    Blink { interval: Duration },
}

impl CursorStyle {
    pub fn blink() -> Self {
        CursorStyle::Blink { interval: DEFAULT_BLINK_INTERVAL }
    }

    pub fn from_name(name: &str, interval: Option<Duration>) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "static" => Some(CursorStyle::Static),
            "blink" => Some(CursorStyle::Blink {
                interval: interval.unwrap_or(DEFAULT_BLINK_INTERVAL),
            }),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CursorBlink {
    style: CursorStyle,
    visible: bool,
    last_toggle: Option<Instant>,
}

impl CursorBlink {
    pub fn new(style: CursorStyle) -> Self {
        Self { style, visible: true, last_toggle: None }
    }

    pub fn glyph(&self) -> &'static str {
        if self.visible {
            CURSOR_GLYPH
        } else {
            HIDDEN_GLYPH
        }
    }

    /// Advances the blink clock. Returns true when visibility flipped.
    pub fn tick(&mut self, now: Instant) -> bool {
        let CursorStyle::Blink { interval } = self.style else {
            return false;
        };
        let Some(last) = self.last_toggle else {
            self.last_toggle = Some(now);
            return false;
        };
        if now.saturating_duration_since(last) < interval {
            return false;
        }
        self.visible = !self.visible;
        self.last_toggle = Some(now);
        true
    }

    /// Shows the glyph again and restarts the interval.
    pub fn reset(&mut self, now: Instant) {
        self.visible = true;
        if matches!(self.style, CursorStyle::Blink { .. }) {
            self.last_toggle = Some(now);
        }
    }
}
