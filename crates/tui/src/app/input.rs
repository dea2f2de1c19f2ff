use unicode_segmentation::UnicodeSegmentation;

use super::App;

// Line editing on the text control. Each edit yields the new control value
// and caret (in graphemes); the controller is told afterwards, the same way
// a browser input fires its events after changing its own value.

pub fn insert(text: &str, caret: usize, s: &str) -> (String, usize) {
    let parts: Vec<&str> = text.graphemes(true).collect();
    let idx = caret.min(parts.len());
    let mut out = String::new();
    for g in &parts[..idx] {
        out.push_str(g);
    }
    out.push_str(s);
    for g in &parts[idx..] {
        out.push_str(g);
    }
    let added = s.graphemes(true).count();
    let total = out.graphemes(true).count();
    (out, (idx + added).min(total))
}

pub fn delete_left(text: &str, caret: usize) -> (String, usize) {
    let mut parts: Vec<&str> = text.graphemes(true).collect();
    let idx = caret.min(parts.len());
    if idx == 0 {
        return (text.to_string(), 0);
    }
    parts.remove(idx - 1);
    (parts.concat(), idx - 1)
}

pub fn delete_right(text: &str, caret: usize) -> (String, usize) {
    let mut parts: Vec<&str> = text.graphemes(true).collect();
    let idx = caret.min(parts.len());
    if idx < parts.len() {
        parts.remove(idx);
    }
    (parts.concat(), idx)
}

pub fn word_left(text: &str, caret: usize) -> usize {
    let parts: Vec<&str> = text.graphemes(true).collect();
    let mut i = caret.min(parts.len());
    while i > 0 && parts[i - 1].trim().is_empty() {
        i -= 1;
    }
    while i > 0 && !parts[i - 1].trim().is_empty() {
        i -= 1;
    }
    i
}

pub fn word_right(text: &str, caret: usize) -> usize {
    let parts: Vec<&str> = text.graphemes(true).collect();
    let mut i = caret.min(parts.len());
    while i < parts.len() && parts[i].trim().is_empty() {
        i += 1;
    }
    while i < parts.len() && !parts[i].trim().is_empty() {
        i += 1;
    }
    i
}

pub fn delete_prev_word(text: &str, caret: usize) -> (String, usize) {
    let mut parts: Vec<&str> = text.graphemes(true).collect();
    let end = caret.min(parts.len());
    let start = word_left(text, end);
    parts.drain(start..end);
    (parts.concat(), start)
}

pub fn kill_to_start(text: &str, caret: usize) -> (String, usize) {
    let mut parts: Vec<&str> = text.graphemes(true).collect();
    let end = caret.min(parts.len());
    parts.drain(..end);
    (parts.concat(), 0)
}

pub fn kill_to_end(text: &str, caret: usize) -> (String, usize) {
    let mut parts: Vec<&str> = text.graphemes(true).collect();
    let start = caret.min(parts.len());
    parts.truncate(start);
    (parts.concat(), start)
}

/// A text input holds a single line: pasted line breaks are dropped.
pub fn single_line(s: &str) -> String {
    s.chars().filter(|c| *c != '\n' && *c != '\r').collect()
}

impl App {
    fn control(&self) -> (&str, usize) {
        let screen = self.controller.surface();
        (screen.control.as_str(), screen.caret)
    }

    fn apply_edit(&mut self, text: String, caret: usize) {
        let changed = text != self.controller.surface().control;
        {
            let screen = self.controller.surface_mut();
            screen.control.clone_from(&text);
            screen.caret = caret;
        }
        if changed {
            self.controller.on_raw_input(text, caret);
        } else {
            self.controller.on_caret_moved(caret);
        }
        self.dirty = true;
    }

    fn move_caret(&mut self, caret: usize) {
        self.controller.surface_mut().caret = caret;
        self.controller.on_caret_moved(caret);
        self.dirty = true;
    }

    pub fn insert_text(&mut self, s: &str) {
        let s = single_line(s);
        if s.is_empty() {
            return;
        }
        let (text, caret) = self.control();
        let (text, caret) = insert(text, caret, &s);
        self.apply_edit(text, caret);
    }

    pub fn delete_left_grapheme(&mut self) {
        let (text, caret) = self.control();
        let (text, caret) = delete_left(text, caret);
        self.apply_edit(text, caret);
    }

    pub fn delete_right_grapheme(&mut self) {
        let (text, caret) = self.control();
        let (text, caret) = delete_right(text, caret);
        self.apply_edit(text, caret);
    }

    pub fn move_cursor_left(&mut self) {
        let (_, caret) = self.control();
        self.move_caret(caret.saturating_sub(1));
    }

    pub fn move_cursor_right(&mut self) {
        let (text, caret) = self.control();
        let len = text.graphemes(true).count();
        self.move_caret((caret + 1).min(len));
    }

    pub fn move_cursor_line_start(&mut self) {
        self.move_caret(0);
    }

    pub fn move_cursor_line_end(&mut self) {
        let (text, _) = self.control();
        let len = text.graphemes(true).count();
        self.move_caret(len);
    }

    pub fn move_cursor_word_left(&mut self) {
        let (text, caret) = self.control();
        let caret = word_left(text, caret);
        self.move_caret(caret);
    }

    pub fn move_cursor_word_right(&mut self) {
        let (text, caret) = self.control();
        let caret = word_right(text, caret);
        self.move_caret(caret);
    }

    pub fn delete_prev_word(&mut self) {
        let (text, caret) = self.control();
        let (text, caret) = delete_prev_word(text, caret);
        self.apply_edit(text, caret);
    }

    pub fn kill_to_line_start(&mut self) {
        let (text, caret) = self.control();
        let (text, caret) = kill_to_start(text, caret);
        self.apply_edit(text, caret);
    }

    pub fn kill_to_line_end(&mut self) {
        let (text, caret) = self.control();
        let (text, caret) = kill_to_end(text, caret);
        self.apply_edit(text, caret);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn insert_in_middle() {
        assert_eq!(insert("cd", 1, "at "), ("cat d".to_string(), 4));
        assert_eq!(insert("", 9, "ls"), ("ls".to_string(), 2));
    }

    #[test]
    fn delete_around_caret() {
        assert_eq!(delete_left("ls", 0), ("ls".to_string(), 0));
        assert_eq!(delete_left("ls", 2), ("l".to_string(), 1));
        assert_eq!(delete_right("ls", 0), ("s".to_string(), 0));
        assert_eq!(delete_right("ls", 2), ("ls".to_string(), 2));
    }

    #[test]
    fn deletes_whole_graphemes() {
        assert_eq!(delete_left("cat 🇸🇪", 5), ("cat ".to_string(), 4));
    }

    #[test]
    fn word_motions() {
        let text = "cat  projects/readme";
        assert_eq!(word_left(text, text.len()), 5);
        assert_eq!(word_left(text, 5), 0);
        assert_eq!(word_right(text, 0), 3);
        assert_eq!(word_right(text, 3), text.len());
        assert_eq!(delete_prev_word("ls -la", 6), ("ls ".to_string(), 3));
    }

    #[test]
    fn kills() {
        assert_eq!(kill_to_start("echo hi", 5), ("hi".to_string(), 0));
        assert_eq!(kill_to_end("echo hi", 4), ("echo".to_string(), 4));
    }

    #[test]
    fn paste_is_flattened() {
        assert_eq!(single_line("ls\r\n-a\n"), "ls-a");
    }
}
