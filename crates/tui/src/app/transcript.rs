use textwrap::{wrap, Options};
use zterm_core::html::fragment_text;
use zterm_core::surface::OutputEntry;

use super::App;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    Prompt,
    Output,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptLine {
    pub kind: LineKind,
    pub text: String,
}

/// Wrapped transcript, rebuilt when the output or the width changes.
#[derive(Debug, Default)]
pub struct TranscriptCache {
    revision: u64,
    width: u16,
    pub lines: Vec<TranscriptLine>,
}

impl App {
    pub fn ensure_transcript_wrapped(&mut self, width: u16) {
        let width = width.max(1);
        let revision = self.controller.surface().output_revision;
        if self.transcript.width == width && self.transcript.revision == revision {
            return;
        }
        let mut lines = Vec::new();
        for entry in &self.controller.surface().output {
            for line in entry_lines(entry) {
                wrap_into(&mut lines, line, width);
            }
        }
        self.transcript = TranscriptCache { revision, width, lines };
    }

    pub fn max_scroll(&self, viewport: usize) -> usize {
        self.transcript.lines.len().saturating_sub(viewport)
    }
}

fn wrap_into(out: &mut Vec<TranscriptLine>, line: TranscriptLine, width: u16) {
    if line.text.is_empty() {
        out.push(line);
        return;
    }
    let opts = Options::new(width as usize).break_words(true);
    for piece in wrap(&line.text, opts) {
        out.push(TranscriptLine { kind: line.kind, text: piece.into_owned() });
    }
}

pub fn entry_lines(entry: &OutputEntry) -> Vec<TranscriptLine> {
    match entry {
        OutputEntry::EmptyCommand { prompt } => vec![TranscriptLine {
            kind: LineKind::Prompt,
            text: prompt.trim_end().to_string(),
        }],
        OutputEntry::Fragment(html) => {
            let text = fragment_text(html);
            let kind = if text.error { LineKind::Error } else { LineKind::Output };
            classify(text.lines, kind)
        }
        OutputEntry::Lines(lines) => classify(lines.clone(), LineKind::Output),
    }
}

fn classify(lines: Vec<String>, kind: LineKind) -> Vec<TranscriptLine> {
    lines
        .into_iter()
        .map(|text| {
            let kind = if looks_like_prompt(&text) { LineKind::Prompt } else { kind };
            TranscriptLine { kind, text }
        })
        .collect()
}

fn looks_like_prompt(text: &str) -> bool {
    text.split_once("$ ")
        .map(|(head, _)| head.contains('@') && !head.contains(' '))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn line(kind: LineKind, text: &str) -> TranscriptLine {
        TranscriptLine { kind, text: text.into() }
    }

    #[test]
    fn empty_command_renders_prompt_line() {
        let lines = entry_lines(&OutputEntry::EmptyCommand { prompt: "guest@machine:~$ ".into() });
        assert_eq!(lines, vec![line(LineKind::Prompt, "guest@machine:~$")]);
    }

    #[test]
    fn command_fragment_splits_prompt_and_output() {
        let html = "<div class=\"command-line\"><div class=\"command-prompt\">guest@machine:~$ </div>ls -a</div><div class=\"command-output\">README.md</div>";
        assert_eq!(
            entry_lines(&OutputEntry::Fragment(html.into())),
            vec![
                line(LineKind::Prompt, "guest@machine:~$ ls -a"),
                line(LineKind::Output, "README.md"),
            ]
        );
    }

    #[test]
    fn error_fragments_are_marked() {
        let lines = entry_lines(&OutputEntry::Fragment(
            "<div class=\"command-output error\">shell: foo: command not found...</div>".into(),
        ));
        assert_eq!(lines[0].kind, LineKind::Error);
    }

    #[test]
    fn restored_lines_keep_prompt_styling() {
        let lines = entry_lines(&OutputEntry::Lines(vec![
            "guest@machine:~$ pwd".into(),
            "home".into(),
        ]));
        assert_eq!(
            lines,
            vec![line(LineKind::Prompt, "guest@machine:~$ pwd"), line(LineKind::Output, "home")]
        );
    }

    #[test]
    fn long_lines_wrap_to_width() {
        let mut out = Vec::new();
        wrap_into(&mut out, line(LineKind::Output, "abcdefgh"), 3);
        assert_eq!(out.iter().map(|l| l.text.as_str()).collect::<Vec<_>>(), vec!["abc", "def", "gh"]);
    }
}
