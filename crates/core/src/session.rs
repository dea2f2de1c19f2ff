use unicode_segmentation::UnicodeSegmentation;

use crate::history::CommandHistory;

/// Per-client session state. `command_text` is the source of truth; the
/// surface is reconciled against it, never the other way round.
#[derive(Clone, Debug, Default)]
pub struct SessionState {
    command_text: String,
    cursor_offset: usize,
    pub history: CommandHistory,
    pending_newline_count: u32,
}

/// Number of grapheme clusters in `s`; offsets and lengths use this unit.
pub fn grapheme_len(s: &str) -> usize {
    s.graphemes(true).count()
}

/// Byte index of the grapheme boundary at `offset`, clamped to the end.
pub fn byte_index(s: &str, offset: usize) -> usize {
    s.grapheme_indices(true)
        .nth(offset)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command_text(&self) -> &str {
        &self.command_text
    }

    pub fn cursor_offset(&self) -> usize {
        self.cursor_offset
    }

    pub fn pending_newline_count(&self) -> u32 {
        self.pending_newline_count
    }

    /// Replaces the command text; the caret is clamped into range.
    pub fn set_text(&mut self, text: impl Into<String>, caret: usize) {
        self.command_text = text.into();
        self.cursor_offset = caret.min(grapheme_len(&self.command_text));
    }

    pub fn set_caret(&mut self, caret: usize) {
        self.cursor_offset = caret.min(grapheme_len(&self.command_text));
    }

    /// Loads `text` with the caret at its end.
    pub fn load(&mut self, text: &str) {
        let end = grapheme_len(text);
        self.set_text(text, end);
    }

    pub fn clear(&mut self) {
        self.command_text.clear();
        self.cursor_offset = 0;
    }

    pub fn is_blank(&self) -> bool {
        self.command_text.trim().is_empty()
    }

    pub fn split_at_cursor(&self) -> (&str, &str) {
        self.command_text
            .split_at(byte_index(&self.command_text, self.cursor_offset))
    }

    pub fn record_empty_submit(&mut self) {
        self.pending_newline_count = self.pending_newline_count.saturating_add(1);
    }

    /// Hands out the pending count (if any) and resets it to zero.
    pub fn take_pending_newlines(&mut self) -> Option<u32> {
        match std::mem::take(&mut self.pending_newline_count) {
            0 => None,
            n => Some(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn caret_is_clamped_to_text_length() {
        let mut s = SessionState::new();
        s.set_text("pwd", 10);
        assert_eq!(s.cursor_offset(), 3);
        s.set_caret(99);
        assert_eq!(s.cursor_offset(), 3);
        s.set_caret(1);
        assert_eq!(s.split_at_cursor(), ("p", "wd"));
    }

    #[test]
    fn split_respects_grapheme_boundaries() {
        let mut s = SessionState::new();
        s.set_text("cat é🇸🇪x", 6);
        assert_eq!(s.split_at_cursor(), ("cat é🇸🇪", "x"));
        assert_eq!(grapheme_len(s.command_text()), 7);
    }

    #[test]
    fn pending_newlines_are_taken_once() {
        let mut s = SessionState::new();
        assert_eq!(s.take_pending_newlines(), None);
        s.record_empty_submit();
        s.record_empty_submit();
        assert_eq!(s.take_pending_newlines(), Some(2));
        assert_eq!(s.take_pending_newlines(), None);
        assert_eq!(s.pending_newline_count(), 0);
    }

    #[test]
    fn blank_means_whitespace_only() {
        let mut s = SessionState::new();
        assert!(s.is_blank());
        s.set_text(" \t ", 0);
        assert!(s.is_blank());
        s.set_text(" ls ", 0);
        assert!(!s.is_blank());
    }
}
