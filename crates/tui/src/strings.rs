// Centralized UI strings and labels. ASCII-friendly by default.

use unicode_width::UnicodeWidthStr;

pub const INPUT_HINT: &str = "Type a command, Enter to run";

// UI block titles (keep surrounding spaces for visual padding)
pub const TITLE_TERMINAL: &str = " Terminal ";
pub const TITLE_HELP: &str = " Help / Shortcuts ";

pub const STICK_BOTTOM: &str = "Bottom";

pub fn build_stick_label(scroll: usize) -> String {
    if scroll == 0 {
        STICK_BOTTOM.to_string()
    } else {
        format!("+{} lines", scroll)
    }
}

// Status bar line with width-aware compaction: segments are dropped from the
// end once they no longer fit in `max_width`.
pub fn build_status_line(
    server: &str,
    stick: &str,
    history_len: usize,
    pending_newlines: u32,
    in_flight: usize,
    max_width: u16,
) -> String {
    let mut segments: Vec<String> = Vec::new();
    segments.push(format!("[{}][{}]", server, stick));
    segments.push(format!("Hist:{}", history_len));
    if pending_newlines > 0 {
        segments.push(format!("NL:{}", pending_newlines));
    }
    if in_flight > 0 {
        segments.push(format!("Busy:{}", in_flight));
    }
    let hints: [&str; 4] = [
        "Enter: run",
        "Up/Down: history",
        "Ctrl+L: clear; Ctrl+C: interrupt",
        "F1: help",
    ];
    for h in hints {
        segments.push(h.to_string());
    }

    let sep = "  |  ";
    let sepw = UnicodeWidthStr::width(sep);
    let mut out = String::new();
    let mut used = 0usize;
    for (i, seg) in segments.iter().enumerate() {
        let segw = UnicodeWidthStr::width(seg.as_str());
        let addw = segw + if i == 0 { 0 } else { sepw };
        if used + addw > max_width as usize {
            break;
        }
        if i > 0 {
            out.push_str(sep);
            used += sepw;
        }
        out.push_str(seg);
        used += segw;
    }
    out
}

// ASCII help lines content; UI maps to styled lines.
pub fn help_lines_ascii() -> &'static [&'static str] {
    &[
        "Basic",
        "  Enter: Run command    Esc/Ctrl+D: Quit",
        "  Up/Down: Command history    Tab: (ignored)",
        "  Ctrl+L: Clear screen    Ctrl+C: Interrupt (drop current line)",
        "Input Editing",
        "  Left/Right: Cursor move    Backspace/Delete: Delete prev/next char",
        "  Home/End: Line start/end    Ctrl+A/E: Line start/end",
        "  Ctrl+Left/Right: Word move    Ctrl+W: Delete prev word",
        "  Ctrl+U/K: Kill to line start/end",
        "Scrolling",
        "  Mouse wheel: Scroll    PgUp/PgDn: Page    New output: back to bottom",
        "Help",
        "  F1: Open this panel    Esc/F1: Close it",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn stick_label() {
        assert_eq!(build_stick_label(0), "Bottom");
        assert_eq!(build_stick_label(7), "+7 lines");
    }

    #[test]
    fn status_line_compacts_to_width() {
        let full = build_status_line("http://localhost:8080/", "Bottom", 3, 2, 1, 400);
        assert!(full.starts_with("[http://localhost:8080/][Bottom]  |  Hist:3  |  NL:2  |  Busy:1"));
        assert!(full.ends_with("F1: help"));

        let narrow = build_status_line("srv", "Bottom", 3, 0, 0, 30);
        assert_eq!(narrow, "[srv][Bottom]  |  Hist:3");
    }
}
