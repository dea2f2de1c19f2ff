use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::layout::Rect;
use remote::HttpRemote;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::time::Instant;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};
use zterm_core::controller::{Controller, Effect, Event};
use zterm_core::keys::{Key, Modifiers};
use zterm_core::surface::Screen;
use zterm_core::wire::{CommandReply, PageSnapshot, RemoteError, TerminalRemote};

pub mod input;
pub mod transcript;

use transcript::TranscriptCache;

// Shown until the page load brings the session's prompt.
const FALLBACK_PROMPT: &str = "$ ";

/// Requests running on the runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pending {
    Page,
    History,
    Submit,
    Newlines,
}

/// Network completions, handed back to the UI thread.
#[derive(Debug)]
pub enum Completion {
    Page(Result<PageSnapshot, RemoteError>),
    History { seq: u64, result: Result<Vec<String>, RemoteError> },
    Submitted(Result<CommandReply, RemoteError>),
    NewlinesFlushed { reload: bool },
}

impl Completion {
    fn pending(&self) -> Pending {
        match self {
            Completion::Page(_) => Pending::Page,
            Completion::History { .. } => Pending::History,
            Completion::Submitted(_) => Pending::Submit,
            Completion::NewlinesFlushed { .. } => Pending::Newlines,
        }
    }

    fn into_event(self) -> Option<Event> {
        match self {
            Completion::Page(res) => Some(Event::PageLoaded(res)),
            Completion::History { seq, result } => Some(Event::HistoryLoaded { seq, result }),
            Completion::Submitted(Ok(reply)) => Some(Event::SubmitSucceeded(reply)),
            Completion::Submitted(Err(e)) => Some(Event::SubmitFailed(e)),
            Completion::NewlinesFlushed { reload: true } => Some(Event::Reload),
            Completion::NewlinesFlushed { reload: false } => None,
        }
    }
}

pub struct App {
    pub controller: Controller<Screen>,
    remote: HttpRemote,
    rt: Handle,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    // Where `pendingNewlines` is kept; `None` when there is no data dir.
    store: Option<PathBuf>,
    pub in_flight: Vec<Pending>,
    pub server_label: String,
    pub should_quit: bool,
    pub show_help: bool,
    pub dirty: bool,
    pub transcript: TranscriptCache,
    pub transcript_area: Option<Rect>,
    /// Lines scrolled up from the bottom; 0 follows new output.
    pub scroll: usize,
    pub viewport: usize,
}

impl App {
    pub fn new(remote: HttpRemote, rt: Handle, stored_newlines: Option<u32>) -> Self {
        Self::with_store(remote, rt, stored_newlines, crate::persist::pending_path())
    }

    pub fn with_store(
        remote: HttpRemote,
        rt: Handle,
        stored_newlines: Option<u32>,
        store: Option<PathBuf>,
    ) -> Self {
        let config = remote.config().controller;
        let server_label = remote.config().base_url.to_string();
        let (tx, rx) = mpsc::channel();
        let mut app = Self {
            controller: Controller::new(Screen::new(FALLBACK_PROMPT), config),
            remote,
            rt,
            tx,
            rx,
            store,
            in_flight: Vec::new(),
            server_label,
            should_quit: false,
            show_help: false,
            dirty: true,
            transcript: TranscriptCache::default(),
            transcript_area: None,
            scroll: 0,
            viewport: 0,
        };
        app.dispatch(Event::Startup { stored_newlines });
        app
    }

    pub fn dispatch(&mut self, event: Event) {
        let effects = self.controller.dispatch(event);
        self.run_effects(effects);
        self.dirty = true;
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::LoadPage => {
                    let remote = self.remote.clone();
                    let tx = self.tx.clone();
                    self.in_flight.push(Pending::Page);
                    self.rt.spawn(async move {
                        let res = remote.load_page().await;
                        let _ = tx.send(Completion::Page(res));
                    });
                }
                Effect::FetchHistory { seq } => {
                    let remote = self.remote.clone();
                    let tx = self.tx.clone();
                    self.in_flight.push(Pending::History);
                    self.rt.spawn(async move {
                        let result = remote.fetch_history().await;
                        let _ = tx.send(Completion::History { seq, result });
                    });
                }
                Effect::Submit(req) => {
                    let remote = self.remote.clone();
                    let tx = self.tx.clone();
                    self.in_flight.push(Pending::Submit);
                    self.rt.spawn(async move {
                        let res = remote.submit_command(&req).await;
                        if let Err(e) = &res {
                            error!(target: "tui", "submit error: {}", e);
                        }
                        let _ = tx.send(Completion::Submitted(res));
                    });
                }
                Effect::FlushNewlines { count, then_reload } => {
                    let remote = self.remote.clone();
                    let tx = self.tx.clone();
                    self.in_flight.push(Pending::Newlines);
                    self.rt.spawn(async move {
                        if let Err(e) = remote.post_newlines(count).await {
                            debug!(target: "tui", "newline flush dropped: {}", e);
                        }
                        let _ = tx.send(Completion::NewlinesFlushed { reload: then_reload });
                    });
                }
                Effect::StorePendingNewlines(count) => {
                    let Some(path) = &self.store else { continue };
                    if let Err(e) = crate::persist::store_pending_at(path, count) {
                        warn!(target: "tui", "store pending newlines: {:#}", e);
                    }
                }
                Effect::ClearStoredNewlines => {
                    let Some(path) = &self.store else { continue };
                    if let Err(e) = crate::persist::clear_pending_at(path) {
                        warn!(target: "tui", "clear pending newlines: {:#}", e);
                    }
                }
                Effect::OpenUrl(url) => {
                    if let Err(e) = webbrowser::open(&url) {
                        warn!(target: "tui", "open {}: {}", url, e);
                    }
                }
            }
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::F(1)) {
                self.show_help = false;
                self.dirty = true;
            }
            return;
        }

        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('d') if ctrl => {
                self.should_quit = true;
                return;
            }
            KeyCode::F(1) => {
                self.show_help = true;
                self.dirty = true;
                return;
            }
            KeyCode::PageUp => {
                self.scroll_up(self.viewport.max(1));
                return;
            }
            KeyCode::PageDown => {
                self.scroll_down(self.viewport.max(1));
                return;
            }
            _ => {}
        }

        if let Some(effects) = self.controller.on_key_command(map_key(key.code), map_mods(key.modifiers)) {
            if key.code == KeyCode::Enter {
                info!(target: "tui", "on_key: Enter => submit");
            }
            self.run_effects(effects);
            self.dirty = true;
            return;
        }

        match key.code {
            KeyCode::Backspace if ctrl => self.delete_prev_word(),
            KeyCode::Backspace => self.delete_left_grapheme(),
            KeyCode::Delete => self.delete_right_grapheme(),
            KeyCode::Left if ctrl => self.move_cursor_word_left(),
            KeyCode::Right if ctrl => self.move_cursor_word_right(),
            KeyCode::Left => self.move_cursor_left(),
            KeyCode::Right => self.move_cursor_right(),
            KeyCode::Home => self.move_cursor_line_start(),
            KeyCode::End => self.move_cursor_line_end(),
            KeyCode::Char('a') if ctrl => self.move_cursor_line_start(),
            KeyCode::Char('e') if ctrl => self.move_cursor_line_end(),
            KeyCode::Char('w') if ctrl => self.delete_prev_word(),
            KeyCode::Char('u') if ctrl => self.kill_to_line_start(),
            KeyCode::Char('k') if ctrl => self.kill_to_line_end(),
            KeyCode::Char(c) if !ctrl => {
                let mut buf = [0u8; 4];
                self.insert_text(c.encode_utf8(&mut buf));
            }
            _ => {}
        }
    }

    pub fn scroll_up(&mut self, lines: usize) {
        let max = self.max_scroll(self.viewport);
        self.scroll = (self.scroll + lines).min(max);
        self.dirty = true;
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_sub(lines);
        self.dirty = true;
    }

    pub fn focus_input(&mut self) {
        use zterm_core::surface::Surface as _;
        self.controller.surface_mut().focus_input();
        self.dirty = true;
    }

    pub fn on_tick(&mut self) {
        for _ in 0..64 {
            match self.rx.try_recv() {
                Ok(completion) => {
                    let kind = completion.pending();
                    if let Some(i) = self.in_flight.iter().position(|p| *p == kind) {
                        self.in_flight.remove(i);
                    }
                    self.dirty = true;
                    if let Some(event) = completion.into_event() {
                        self.dispatch(event);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        let screen = self.controller.surface_mut();
        if screen.scroll_pending {
            screen.scroll_pending = false;
            self.scroll = 0;
            self.dirty = true;
        }

        let display = self.controller.surface().display.clone();
        self.controller.on_tick(Instant::now());
        if display != self.controller.surface().display {
            self.dirty = true;
        }
    }

    /// Page teardown: the pending count is flushed (bounded wait) or stored.
    pub fn shutdown(&mut self) {
        let effects = self.controller.dispatch(Event::Unload);
        for effect in effects {
            match effect {
                Effect::FlushNewlines { count, .. } => {
                    info!(target: "tui", "unload: flushing {} newlines", count);
                    let remote = self.remote.clone();
                    self.rt.block_on(async move { remote.flush_newlines_best_effort(count).await });
                }
                other => self.run_effects(vec![other]),
            }
        }
    }
}

fn map_key(code: KeyCode) -> Key {
    match code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Tab | KeyCode::BackTab => Key::Tab,
        KeyCode::Enter => Key::Enter,
        _ => Key::Other,
    }
}

fn map_mods(m: KeyModifiers) -> Modifiers {
    Modifiers {
        ctrl: m.contains(KeyModifiers::CONTROL),
        shift: m.contains(KeyModifiers::SHIFT),
        alt: m.contains(KeyModifiers::ALT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use remote::http::config::ClientFileConfig;
    use remote::ClientConfig;
    use zterm_core::surface::OutputEntry;

    // Spawned requests are queued on a runtime nobody drives, so completions
    // arrive only when a test sends them.
    fn test_app(
        file_cfg: ClientFileConfig,
        stored: Option<u32>,
        store: Option<PathBuf>,
    ) -> (App, tokio::runtime::Runtime) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let cfg = ClientConfig::resolve(Some("http://127.0.0.1:9".into()), file_cfg, None).unwrap();
        let remote = HttpRemote::new(cfg).unwrap();
        let app = App::with_store(remote, rt.handle().clone(), stored, store);
        (app, rt)
    }

    fn complete(app: &mut App, completion: Completion) {
        app.tx.send(completion).unwrap();
        app.on_tick();
    }

    fn press(app: &mut App, code: KeyCode) {
        app.on_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn stored_newlines_clear_flush_then_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pending_newlines.json");
        crate::persist::store_pending_at(&path, 3).unwrap();

        let (mut app, _rt) = test_app(ClientFileConfig::default(), Some(3), Some(path.clone()));
        assert!(!path.exists());
        assert_eq!(app.in_flight, vec![Pending::Page]);

        complete(
            &mut app,
            Completion::Page(Ok(PageSnapshot {
                prompt: Some("guest@machine:~$ ".into()),
                transcript: vec!["welcome".into()],
            })),
        );
        assert_eq!(app.in_flight, vec![Pending::Newlines]);
        assert_eq!(app.controller.surface().prompt, "guest@machine:~$ ");

        complete(&mut app, Completion::NewlinesFlushed { reload: true });
        assert_eq!(app.in_flight, vec![Pending::Page]);

        complete(&mut app, Completion::Page(Ok(PageSnapshot::default())));
        assert_eq!(app.in_flight, vec![Pending::History]);
        assert!(app.controller.surface().output.is_empty());
    }

    #[test]
    fn history_reply_fills_navigation() {
        let (mut app, _rt) = test_app(ClientFileConfig::default(), None, None);
        complete(&mut app, Completion::Page(Err(RemoteError::Network("refused".into()))));
        assert_eq!(app.in_flight, vec![Pending::History]);
        assert_eq!(app.controller.surface().prompt, FALLBACK_PROMPT);

        complete(
            &mut app,
            Completion::History { seq: 1, result: Ok(vec!["ls".into(), "pwd".into()]) },
        );
        assert!(app.in_flight.is_empty());
        press(&mut app, KeyCode::Up);
        assert_eq!(app.controller.state().command_text(), "pwd");
    }

    #[test]
    fn failed_submit_lands_in_transcript() {
        let (mut app, _rt) = test_app(ClientFileConfig::default(), None, None);
        complete(&mut app, Completion::Page(Ok(PageSnapshot::default())));
        complete(&mut app, Completion::History { seq: 1, result: Ok(Vec::new()) });

        app.insert_text("cat nope");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.in_flight, vec![Pending::Submit]);

        let body = "<div class=\"error\">cat: nope: No such file</div>";
        complete(&mut app, Completion::Submitted(Err(RemoteError::status(404, body))));
        assert!(app.in_flight.is_empty());
        assert_eq!(
            app.controller.surface().output.last(),
            Some(&OutputEntry::Fragment(body.into()))
        );
        assert_eq!(app.controller.state().command_text(), "cat nope");
    }

    #[test]
    fn successful_submit_refetches_history() {
        let (mut app, _rt) = test_app(ClientFileConfig::default(), None, None);
        complete(&mut app, Completion::Page(Ok(PageSnapshot::default())));
        complete(&mut app, Completion::History { seq: 1, result: Ok(Vec::new()) });

        press(&mut app, KeyCode::Enter);
        app.insert_text("pwd");
        press(&mut app, KeyCode::Enter);
        complete(
            &mut app,
            Completion::Submitted(Ok(CommandReply { body: "<div>home</div>".into(), ..CommandReply::default() })),
        );
        assert_eq!(app.in_flight, vec![Pending::History]);
        assert_eq!(app.controller.state().pending_newline_count(), 0);
        assert_eq!(app.controller.surface().output.len(), 2);
    }

    #[test]
    fn persist_policy_stores_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pending_newlines.json");
        let file_cfg = ClientFileConfig { unload: Some("persist".into()), ..ClientFileConfig::default() };
        let (mut app, _rt) = test_app(file_cfg, None, Some(path.clone()));

        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
        app.shutdown();
        assert_eq!(crate::persist::load_pending_from(&path).unwrap(), Some(2));
    }

    #[test]
    fn key_mapping() {
        assert_eq!(map_key(KeyCode::Char('l')), Key::Char('l'));
        assert_eq!(map_key(KeyCode::BackTab), Key::Tab);
        assert_eq!(map_key(KeyCode::F(5)), Key::Other);
        assert_eq!(
            map_mods(KeyModifiers::CONTROL | KeyModifiers::SHIFT),
            Modifiers { ctrl: true, shift: true, alt: false }
        );
    }
}
