use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap,
    },
    Frame,
};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::app::transcript::LineKind;
use crate::app::App;
use crate::strings::{
    build_status_line, build_stick_label, help_lines_ascii, INPUT_HINT, TITLE_HELP,
    TITLE_TERMINAL,
};
use crate::theme::THEME;

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(f.area());

    app.transcript_area = Some(chunks[0]);
    draw_transcript(f, chunks[0], app);
    draw_input(f, chunks[1], app);
    draw_status(f, chunks[2], app);

    if app.show_help {
        draw_help(f, f.area());
    }
}

fn draw_transcript(f: &mut Frame, area: Rect, app: &mut App) {
    let block = Block::default()
        .title(TITLE_TERMINAL)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(THEME.transcript_border));

    let inner = block.inner(area);
    app.ensure_transcript_wrapped(inner.width);
    let viewport = inner.height as usize;
    app.viewport = viewport;
    app.scroll = app.scroll.min(app.max_scroll(viewport));

    let total = app.transcript.lines.len();
    let end = total.saturating_sub(app.scroll);
    let start = end.saturating_sub(viewport);
    let lines: Vec<Line> = app.transcript.lines[start..end]
        .iter()
        .map(|l| {
            let style = match l.kind {
                LineKind::Prompt => Style::default().fg(THEME.prompt),
                LineKind::Output => Style::default(),
                LineKind::Error => Style::default().fg(THEME.error),
            };
            Line::from(Span::styled(l.text.clone(), style))
        })
        .collect();

    f.render_widget(Paragraph::new(lines).block(block), area);

    if total > viewport {
        let mut sb_state = ScrollbarState::new(total.saturating_sub(viewport)).position(start);
        let sb = Scrollbar::default().orientation(ScrollbarOrientation::VerticalRight);
        f.render_stateful_widget(sb, inner, &mut sb_state);
    }
}

fn draw_input(f: &mut Frame, area: Rect, app: &App) {
    let screen = app.controller.surface();
    let border_style = if screen.focused {
        Style::default().fg(THEME.border_focus)
    } else {
        Style::default().fg(THEME.border_inactive)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner_width = block.inner(area).width as usize;

    let prompt = screen.prompt.as_str();
    let prompt_style = Style::default()
        .fg(THEME.prompt)
        .add_modifier(Modifier::BOLD);
    let avail = inner_width.saturating_sub(UnicodeWidthStr::width(prompt));
    let caret = app.controller.state().cursor_offset();
    let mut spans = vec![Span::styled(prompt.to_string(), prompt_style)];
    spans.push(Span::raw(input_window(&screen.display, caret, avail)));
    if app.controller.state().command_text().is_empty() {
        spans.push(Span::styled(INPUT_HINT, Style::default().fg(Color::DarkGray)));
    }

    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

/// Slice of the rendered input that keeps the glyph (at grapheme `caret`)
/// inside `avail` columns, dropping leading graphemes as needed.
fn input_window(display: &str, caret: usize, avail: usize) -> String {
    let graphemes: Vec<&str> = display.graphemes(true).collect();
    let through_glyph = (caret + 1).min(graphemes.len());
    let mut start = 0usize;
    let mut width: usize = graphemes[..through_glyph]
        .iter()
        .map(|g| UnicodeWidthStr::width(*g))
        .sum();
    while width > avail && start < through_glyph {
        width -= UnicodeWidthStr::width(graphemes[start]);
        start += 1;
    }
    graphemes[start..].concat()
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let stick = build_stick_label(app.scroll);
    let state = app.controller.state();
    let tips = build_status_line(
        &app.server_label,
        &stick,
        state.history.len(),
        state.pending_newline_count(),
        app.in_flight.len(),
        area.width.saturating_sub(2),
    );
    let info = Line::from(Span::styled(tips, Style::default().fg(THEME.status)));
    let para = Paragraph::new(info).block(Block::default().borders(Borders::ALL));
    f.render_widget(para, area);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(70, 70, area);
    let block = Block::default()
        .title(Span::styled(
            TITLE_HELP,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL);

    let lines = help_lines_ascii()
        .iter()
        .map(|s| Line::from(*s))
        .collect::<Vec<Line>>();
    let para = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, popup_area);
    f.render_widget(para, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vert[1]);
    horiz[1]
}
