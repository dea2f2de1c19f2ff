use std::time::Instant;

use tracing::{debug, info, warn};

use crate::cursor::{CursorBlink, CursorStyle};
use crate::history::{Direction, HistoryStep};
use crate::keys::{Key, KeyCommand, Modifiers};
use crate::session::SessionState;
use crate::surface::{OutputEntry, Surface};
use crate::wire::{CommandReply, CommandRequest, PageSnapshot, RemoteError, Swap};

const CLEAR_COMMAND: &str = "clear";

/// What happens to unacknowledged empty submits when the client shuts down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnloadPolicy {
    /// Fire one `/newline` request and forget about it.
    #[default]
    Beacon,
    /// Keep the count in local storage and flush it on the next start.
    Persist,
}

impl UnloadPolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "beacon" => Some(UnloadPolicy::Beacon),
            "persist" => Some(UnloadPolicy::Persist),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ControllerConfig {
    pub cursor: CursorStyle,
    pub unload: UnloadPolicy,
}

/// Side effects the host carries out on the controller's behalf.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// GET the terminal page. It opens the server session, so nothing else
    /// is requested before it.
    LoadPage,
    /// Replies carrying an older `seq` than the latest fetch are dropped.
    FetchHistory { seq: u64 },
    Submit(CommandRequest),
    /// POST the count to `/newline`; errors are ignored. With `then_reload`
    /// the host dispatches `Event::Reload` once the request settles.
    FlushNewlines { count: u32, then_reload: bool },
    StorePendingNewlines(u32),
    ClearStoredNewlines,
    OpenUrl(String),
}

#[derive(Clone, Debug)]
pub enum Event {
    Startup { stored_newlines: Option<u32> },
    RawInput { text: String, caret: usize },
    CaretMoved(usize),
    Key { key: Key, mods: Modifiers },
    Submit,
    SubmitSucceeded(CommandReply),
    SubmitFailed(RemoteError),
    PageLoaded(Result<PageSnapshot, RemoteError>),
    HistoryLoaded { seq: u64, result: Result<Vec<String>, RemoteError> },
    PromptUpdated(String),
    Reload,
    Tick(Instant),
    Unload,
}

pub struct Controller<S: Surface> {
    state: SessionState,
    surface: S,
    cursor: CursorBlink,
    config: ControllerConfig,
    // Set while a clear-screen submission is in flight.
    suppress_render: bool,
    history_seq: u64,
    // Count recovered from the previous run, flushed after the first page load.
    startup_newlines: Option<u32>,
}

impl<S: Surface> Controller<S> {
    pub fn new(surface: S, config: ControllerConfig) -> Self {
        Self {
            state: SessionState::new(),
            surface,
            cursor: CursorBlink::new(config.cursor),
            config,
            suppress_render: false,
            history_seq: 0,
            startup_newlines: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn dispatch(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::Startup { stored_newlines } => self.on_startup(stored_newlines),
            Event::RawInput { text, caret } => {
                self.on_raw_input(text, caret);
                Vec::new()
            }
            Event::CaretMoved(caret) => {
                self.on_caret_moved(caret);
                Vec::new()
            }
            Event::Key { key, mods } => self.on_key_command(key, mods).unwrap_or_default(),
            Event::Submit => self.submit(),
            Event::SubmitSucceeded(reply) => self.on_submit_succeeded(reply),
            Event::SubmitFailed(err) => self.on_submit_failed(&err),
            Event::PageLoaded(result) => self.on_page_loaded(result),
            Event::HistoryLoaded { seq, result } => {
                self.on_history_loaded(seq, result);
                Vec::new()
            }
            Event::PromptUpdated(prompt) => {
                self.on_prompt_update(&prompt);
                Vec::new()
            }
            Event::Reload => self.on_reload(),
            Event::Tick(now) => {
                self.on_tick(now);
                Vec::new()
            }
            Event::Unload => self.flush_pending_newlines_on_unload(),
        }
    }

    /// The stored count is cleared right away and flushed once the page
    /// load has opened the session.
    pub fn on_startup(&mut self, stored_newlines: Option<u32>) -> Vec<Effect> {
        self.render();
        let mut effects = Vec::new();
        if let Some(count) = stored_newlines {
            effects.push(Effect::ClearStoredNewlines);
            self.startup_newlines = Some(count).filter(|n| *n > 0);
        }
        effects.push(Effect::LoadPage);
        effects
    }

    pub fn on_page_loaded(&mut self, result: Result<PageSnapshot, RemoteError>) -> Vec<Effect> {
        match result {
            Ok(page) => {
                debug!(
                    target: "core::controller",
                    "page loaded: {} transcript lines",
                    page.transcript.len()
                );
                if let Some(prompt) = page.prompt {
                    self.surface.set_prompt(&prompt);
                }
                self.surface.restore_output(page.transcript);
                self.surface.scroll_to_end();
            }
            Err(e) => warn!(target: "core::controller", "page load failed: {}", e),
        }
        self.surface.focus_input();
        self.render();
        if let Some(count) = self.startup_newlines.take() {
            info!(target: "core::controller", "startup: flushing {} stored newlines", count);
            return vec![Effect::FlushNewlines { count, then_reload: true }];
        }
        vec![self.fetch_history()]
    }

    fn fetch_history(&mut self) -> Effect {
        self.history_seq += 1;
        Effect::FetchHistory { seq: self.history_seq }
    }

    pub fn on_raw_input(&mut self, text: String, caret: usize) {
        self.state.set_text(text, caret);
        self.cursor.reset(Instant::now());
        self.render();
    }

    pub fn on_caret_moved(&mut self, caret: usize) {
        self.state.set_caret(caret);
        self.cursor.reset(Instant::now());
        self.render();
    }

    /// Mirrors the state into the display line and, only if it drifted,
    /// into the control.
    pub fn render(&mut self) {
        if self.suppress_render {
            return;
        }
        let (before, after) = self.state.split_at_cursor();
        let display = format!("{}{}{}", before, self.cursor.glyph(), after);
        self.surface.set_display(&display);
        if self.surface.control_value() != self.state.command_text() {
            self.surface
                .set_control(self.state.command_text(), self.state.cursor_offset());
        }
    }

    // Explicit loads also move the caret, so the control is always rewritten.
    fn load_control(&mut self) {
        self.surface
            .set_control(self.state.command_text(), self.state.cursor_offset());
        self.render();
    }

    pub fn navigate_history(&mut self, direction: Direction) {
        let next = match self.state.history.step(direction) {
            HistoryStep::Load(entry) => Some(entry.to_string()),
            HistoryStep::Clear => None,
            HistoryStep::Stay => return,
        };
        match next {
            Some(entry) => self.state.load(&entry),
            None => self.state.clear(),
        }
        self.load_control();
    }

    pub fn submit(&mut self) -> Vec<Effect> {
        if self.state.is_blank() {
            let prompt = self.surface.prompt().to_string();
            self.surface.append_output(OutputEntry::EmptyCommand { prompt });
            self.state.record_empty_submit();
            debug!(
                target: "core::controller",
                "empty submit kept local, pending={}",
                self.state.pending_newline_count()
            );
            self.state.clear();
            self.load_control();
            self.surface.scroll_to_end();
            self.surface.focus_input();
            return Vec::new();
        }

        // The control must carry the plain command, never the glyph.
        if self.surface.control_value() != self.state.command_text() {
            self.surface
                .set_control(self.state.command_text(), self.state.cursor_offset());
        }
        let newlines = self.state.take_pending_newlines();
        info!(
            target: "core::controller",
            "submit: input_len={} newlines={}",
            self.state.command_text().len(),
            newlines.unwrap_or(0)
        );
        vec![Effect::Submit(CommandRequest {
            command: self.state.command_text().to_string(),
            newlines,
        })]
    }

    pub fn on_submit_succeeded(&mut self, reply: CommandReply) -> Vec<Effect> {
        let mut effects = Vec::new();
        match reply.swap {
            Swap::Replace => self.surface.replace_output(&reply.body),
            Swap::Append if !reply.body.is_empty() => {
                self.surface.append_output(OutputEntry::Fragment(reply.body))
            }
            Swap::Append => {}
        }
        if let Some(prompt) = reply.prompt {
            self.surface.set_prompt(&prompt);
        }
        if let Some(url) = reply.open_url {
            info!(target: "core::controller", "server asked to open {}", url);
            effects.push(Effect::OpenUrl(url));
        }

        self.state.clear();
        self.surface.set_control("", 0);
        self.surface.set_display("");
        self.surface.scroll_to_end();
        self.surface.focus_input();
        self.suppress_render = false;
        self.render();

        effects.push(self.fetch_history());
        effects
    }

    /// Appends the server's error body as-is. The command stays in the
    /// input so it can be edited and resent.
    pub fn on_submit_failed(&mut self, err: &RemoteError) -> Vec<Effect> {
        let body = err.transcript_text();
        warn!(target: "core::controller", "submit failed: {}, body_len={}", err, body.len());
        self.surface.append_output(OutputEntry::Fragment(body));
        self.surface.scroll_to_end();
        self.suppress_render = false;
        self.render();
        err.open_url()
            .map(|url| vec![Effect::OpenUrl(url.to_string())])
            .unwrap_or_default()
    }

    /// Returns `None` when the key is not one the controller owns, in which
    /// case the host applies its default editing behaviour.
    pub fn on_key_command(&mut self, key: Key, mods: Modifiers) -> Option<Vec<Effect>> {
        let command = KeyCommand::resolve(key, mods)?;
        let effects = match command {
            KeyCommand::ClearScreen => {
                self.suppress_render = true;
                self.state.load(CLEAR_COMMAND);
                self.submit()
            }
            KeyCommand::Interrupt => {
                self.state.clear();
                self.load_control();
                Vec::new()
            }
            KeyCommand::HistoryUp => {
                self.navigate_history(Direction::Up);
                Vec::new()
            }
            KeyCommand::HistoryDown => {
                self.navigate_history(Direction::Down);
                Vec::new()
            }
            KeyCommand::SuppressTab => Vec::new(),
            KeyCommand::Submit => self.submit(),
        };
        Some(effects)
    }

    pub fn on_history_loaded(&mut self, seq: u64, result: Result<Vec<String>, RemoteError>) {
        if seq != self.history_seq {
            debug!(
                target: "core::controller",
                "dropping stale history reply seq={} latest={}",
                seq,
                self.history_seq
            );
            return;
        }
        match result {
            Ok(entries) => {
                debug!(target: "core::controller", "history loaded: {} entries", entries.len());
                self.state.history.replace(entries);
            }
            Err(e) => {
                warn!(target: "core::controller", "history fetch failed, using empty history: {}", e);
                self.state.history.replace(Vec::new());
            }
        }
    }

    pub fn on_prompt_update(&mut self, prompt: &str) {
        self.surface.set_prompt(prompt);
    }

    /// Fresh input state; the transcript and prompt come back with the
    /// page, which also triggers the history fetch.
    pub fn on_reload(&mut self) -> Vec<Effect> {
        self.state.clear();
        self.suppress_render = false;
        self.load_control();
        vec![Effect::LoadPage]
    }

    pub fn on_tick(&mut self, now: Instant) {
        if self.cursor.tick(now) {
            self.render();
        }
    }

    pub fn flush_pending_newlines_on_unload(&mut self) -> Vec<Effect> {
        let Some(count) = self.state.take_pending_newlines() else {
            return Vec::new();
        };
        match self.config.unload {
            UnloadPolicy::Beacon => vec![Effect::FlushNewlines { count, then_reload: false }],
            UnloadPolicy::Persist => vec![Effect::StorePendingNewlines(count)],
        }
    }
}
