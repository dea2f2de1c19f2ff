/// One block in the transcript output region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputEntry {
    /// An HTML fragment returned by the server, kept verbatim.
    Fragment(String),
    /// A locally synthesized empty command line.
    EmptyCommand { prompt: String },
    /// Transcript restored from a page load, already flattened.
    Lines(Vec<String>),
}

/// The page elements the controller writes to: the text-entry control, the
/// mirrored display line, the prompt label and the transcript.
pub trait Surface {
    fn control_value(&self) -> &str;
    fn set_control(&mut self, value: &str, caret: usize);
    fn set_display(&mut self, text: &str);
    fn prompt(&self) -> &str;
    fn set_prompt(&mut self, prompt: &str);
    fn append_output(&mut self, entry: OutputEntry);
    fn replace_output(&mut self, fragment: &str);
    fn restore_output(&mut self, lines: Vec<String>);
    fn scroll_to_end(&mut self);
    fn focus_input(&mut self);
}

/// In-memory surface. The terminal host draws from it directly.
#[derive(Clone, Debug, Default)]
pub struct Screen {
    pub control: String,
    pub caret: usize,
    pub display: String,
    pub prompt: String,
    pub output: Vec<OutputEntry>,
    pub focused: bool,
    /// Set by `scroll_to_end`; the host clears it once it has scrolled.
    pub scroll_pending: bool,
    /// Bumped on every control rewrite.
    pub control_writes: usize,
    /// Bumped whenever `output` changes.
    pub output_revision: u64,
}

impl Screen {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), focused: true, ..Self::default() }
    }
}

impl Surface for Screen {
    fn control_value(&self) -> &str {
        &self.control
    }

    fn set_control(&mut self, value: &str, caret: usize) {
        self.control.clear();
        self.control.push_str(value);
        self.caret = caret;
        self.control_writes += 1;
    }

    fn set_display(&mut self, text: &str) {
        if self.display != text {
            self.display.clear();
            self.display.push_str(text);
        }
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn set_prompt(&mut self, prompt: &str) {
        self.prompt = prompt.to_string();
    }

    fn append_output(&mut self, entry: OutputEntry) {
        self.output.push(entry);
        self.output_revision += 1;
    }

    fn replace_output(&mut self, fragment: &str) {
        self.output.clear();
        if !fragment.is_empty() {
            self.output.push(OutputEntry::Fragment(fragment.to_string()));
        }
        self.output_revision += 1;
    }

    fn restore_output(&mut self, lines: Vec<String>) {
        self.output.clear();
        if !lines.is_empty() {
            self.output.push(OutputEntry::Lines(lines));
        }
        self.output_revision += 1;
    }

    fn scroll_to_end(&mut self) {
        self.scroll_pending = true;
    }

    fn focus_input(&mut self) {
        self.focused = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn replace_with_empty_fragment_clears_transcript() {
        let mut s = Screen::new("$ ");
        s.append_output(OutputEntry::Fragment("<div>a</div>".into()));
        s.append_output(OutputEntry::EmptyCommand { prompt: "$ ".into() });
        s.replace_output("");
        assert!(s.output.is_empty());
        assert_eq!(s.output_revision, 3);
    }

    #[test]
    fn restore_replaces_everything() {
        let mut s = Screen::new("$ ");
        s.append_output(OutputEntry::Fragment("<div>a</div>".into()));
        s.restore_output(vec!["$ pwd".into(), "/home".into()]);
        assert_eq!(s.output, vec![OutputEntry::Lines(vec!["$ pwd".into(), "/home".into()])]);
        s.restore_output(Vec::new());
        assert!(s.output.is_empty());
    }

    #[test]
    fn control_writes_are_counted() {
        let mut s = Screen::new("$ ");
        s.set_control("ls", 2);
        s.set_control("ls", 1);
        assert_eq!((s.control.as_str(), s.caret, s.control_writes), ("ls", 1, 2));
    }
}
