use std::sync::{Arc, Mutex};

use htmd::{
    options::{CodeBlockStyle, HeadingStyle, Options},
    Element, HtmlToMarkdown,
};
use tracing::warn;

use crate::wire::PageSnapshot;

const PROMPT_ID: &str = "prompt";
const OUTPUT_ID: &str = "command-output";

/// A server fragment flattened to display lines.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FragmentText {
    pub lines: Vec<String>,
    /// Some element in the fragment carried the `error` class.
    pub error: bool,
}

#[derive(Debug, Default)]
struct Capture {
    error: bool,
    prompt: Option<String>,
    output: Option<String>,
}

fn attr<'a>(element: &'a Element, name: &str) -> Option<&'a str> {
    element
        .attrs
        .iter()
        .find(|a| &*a.name.local == name)
        .map(|a| &*a.value)
}

fn has_class(element: &Element, class: &str) -> bool {
    attr(element, "class")
        .map(|v| v.split_whitespace().any(|c| c == class))
        .unwrap_or(false)
}

fn class_mentions(element: &Element, needle: &str) -> bool {
    attr(element, "class").map(|v| v.contains(needle)).unwrap_or(false)
}

// Records the marked elements, then renders the element like htmd would:
// prompt containers inline, everything else as a block.
fn visit(capture: &Mutex<Capture>, element: Element, block: bool) -> Option<String> {
    let content = element.content;
    if let Ok(mut cap) = capture.lock() {
        if has_class(&element, "error") {
            cap.error = true;
        }
        match attr(&element, "id") {
            Some(PROMPT_ID) => cap.prompt = Some(format!("{} ", content.trim())),
            Some(OUTPUT_ID) => cap.output = Some(content.to_string()),
            _ => {}
        }
    }
    if class_mentions(&element, "prompt") {
        return Some(format!("{} ", content.trim()));
    }
    if block {
        Some(format!("\n\n{}\n\n", content.trim_matches('\n')))
    } else {
        Some(content.to_string())
    }
}

fn convert(html: &str) -> (String, Capture) {
    let capture = Arc::new(Mutex::new(Capture::default()));
    let (c_block, c_inline) = (capture.clone(), capture.clone());
    let options = Options {
        heading_style: HeadingStyle::Atx,
        code_block_style: CodeBlockStyle::Fenced,
        ..Default::default()
    };
    let converter = HtmlToMarkdown::builder()
        .options(options)
        .skip_tags(vec!["script", "style", "head", "noscript"])
        .add_handler(vec!["div", "section", "main", "header", "footer"], move |element: Element| {
            visit(&c_block, element, true)
        })
        .add_handler(vec!["span"], move |element: Element| visit(&c_inline, element, false))
        .add_handler(vec!["br"], |_: Element| Some("\n".to_string()))
        .build();
    let markdown = match converter.convert(html) {
        Ok(md) => md,
        Err(e) => {
            warn!(target: "core::html", "html conversion failed: {}", e);
            html.to_string()
        }
    };
    let capture = capture
        .lock()
        .map(|mut c| std::mem::take(&mut *c))
        .unwrap_or_default();
    (markdown, capture)
}

// Markdown escapes are a backslash before ASCII punctuation.
fn unescape(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.peek().copied().filter(char::is_ascii_punctuation) {
                out.push(next);
                chars.next();
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Splits converted markdown into display lines. Code fences are dropped but
/// their contents keep layout and blank lines; elsewhere lines are trimmed,
/// unescaped and blank ones skipped.
fn to_lines(markdown: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut in_fence = false;
    for line in markdown.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            lines.push(line.trim_end().to_string());
            continue;
        }
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            lines.push(unescape(trimmed));
        }
    }
    lines
}

/// Flattens a `/command` reply or error body.
pub fn fragment_text(html: &str) -> FragmentText {
    let (markdown, capture) = convert(html);
    FragmentText { lines: to_lines(&markdown), error: capture.error }
}

/// Reads the terminal page: the live prompt and the transcript rendered so
/// far for this session.
pub fn parse_page(html: &str) -> PageSnapshot {
    let (_, capture) = convert(html);
    PageSnapshot {
        prompt: capture.prompt.filter(|p| !p.trim().is_empty()),
        transcript: capture.output.as_deref().map(to_lines).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn blocks_become_lines() {
        let html = "<div class=\"entry\">\n\t<div>one</div>\n\t<div>two words</div>\n</div>";
        assert_eq!(fragment_text(html).lines, vec!["one", "two words"]);
    }

    #[test]
    fn prompt_stays_inline_with_command() {
        let html = "<div class=\"command-line\"><div class=\"command-prompt\">guest@machine:~$ </div>ls</div><div class=\"command-output\">notes</div>";
        assert_eq!(fragment_text(html).lines, vec!["guest@machine:~$ ls", "notes"]);
    }

    #[test]
    fn pre_keeps_layout() {
        let html = "<pre>drwx projects\nfile about\n\nnotes</pre>";
        assert_eq!(
            fragment_text(html).lines,
            vec!["drwx projects", "file about", "", "notes"]
        );
    }

    #[test]
    fn entities_are_decoded() {
        let lines = fragment_text("<div>fish &amp; chips</div>").lines;
        assert_eq!(lines, vec!["fish & chips"]);
    }

    #[test]
    fn error_class_only_when_declared() {
        assert!(fragment_text("<div class=\"command-output error\">nope</div>").error);
        assert!(!fragment_text("<div class=\"file-content\">error log</div>").error);
    }

    #[test]
    fn unescape_drops_markdown_escapes() {
        assert_eq!(unescape(r"README\_FIRST\.md"), "README_FIRST.md");
        assert_eq!(unescape(r"C:\dir"), r"C:\dir");
    }

    #[test]
    fn page_yields_prompt_and_transcript() {
        let html = concat!(
            "<html><head><title>zorcal</title><script>var x = 1;</script></head><body>",
            "<div id=\"command-history\"><div id=\"command-output\">",
            "<div class=\"command-line\"><div class=\"command-prompt\">guest@machine:~$ </div>pwd</div>",
            "<div class=\"command-output\">home</div>",
            "</div></div>",
            "<div class=\"input-line\"><span id=\"prompt\">guest@machine:~$ </span></div>",
            "</body></html>"
        );
        let page = parse_page(html);
        assert_eq!(page.prompt.as_deref(), Some("guest@machine:~$ "));
        assert_eq!(page.transcript, vec!["guest@machine:~$ pwd", "home"]);
    }

    #[test]
    fn page_without_markers_is_empty() {
        let page = parse_page("<html><body><p>maintenance</p></body></html>");
        assert_eq!(page, PageSnapshot::default());
    }
}
