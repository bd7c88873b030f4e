//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard events into core::Action values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Streaming
//!
//! Each turn spawns two tasks: the stream session itself, and a forwarder
//! that turns its `SessionUpdate`s into `Action`s on the event loop's
//! channel. Esc aborts both through their `AbortHandle`s.

mod event;
mod ui;

use log::{debug, info, warn};
use std::io::stdout;
use std::sync::{Arc, mpsc};

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste};
use crossterm::execute;

use crate::core::action::{Action, Effect, update};
use crate::core::config::ResolvedConfig;
use crate::core::history::{self, HistoryStore};
use crate::core::state::App;
use crate::stream::{ChatTransport, HttpTransport, SessionUpdate, run_session};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// TUI-specific presentation state (not part of core business logic)
#[derive(Default)]
pub struct TuiState {
    pub input: String,
    /// Lines scrolled up from the bottom of the conversation.
    pub scroll_back: u16,
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        execute!(
            stdout(),
            EnableBracketedPaste,
            Show,                        // Show cursor for input editing
            SetCursorStyle::SteadyBlock, // Non-blinking: avoids blink timer reset from continuous redraws
        )?;
        info!("Terminal modes enabled (bracketed paste, steady block cursor)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), DisableBracketedPaste, Hide);
    }
}

pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let transport: Arc<dyn ChatTransport> = Arc::new(
        HttpTransport::new(config.base_url.clone(), config.connect_timeout)
            .map_err(std::io::Error::other)?,
    );

    let store = config
        .persist_history
        .then(|| HistoryStore::new(config.history_file.clone()));
    let saved = match store.as_ref().map(HistoryStore::load) {
        Some(Ok(messages)) => messages,
        Some(Err(e)) => {
            warn!("Ignoring unreadable history: {}", e);
            Vec::new()
        }
        None => Vec::new(),
    };

    let mut app = App::with_history(transport, saved);
    let mut tui = TuiState::default();

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    // Channel for actions from background tasks
    let (tx, rx) = mpsc::channel();

    // Abort handles for the current turn (used by Escape-to-cancel)
    let mut active_abort_handles: Vec<tokio::task::AbortHandle> = Vec::new();

    let start_time = std::time::Instant::now();
    let mut needs_redraw = true; // Force first frame

    'main: loop {
        if app.busy {
            needs_redraw = true;
        }

        if needs_redraw {
            let spinner_frame = (start_time.elapsed().as_secs_f32() * 12.0) as usize;
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui, spinner_frame))?;
            needs_redraw = false;
        }

        // Short timeout while a reply streams in, long when idle
        let timeout = if app.busy {
            std::time::Duration::from_millis(80)
        } else {
            std::time::Duration::from_millis(500)
        };
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }

        let mut actions = Vec::new();
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            match event {
                TuiEvent::ForceQuit => actions.push(Action::Quit),
                TuiEvent::Escape if app.busy => {
                    for handle in active_abort_handles.drain(..) {
                        handle.abort();
                    }
                    actions.push(Action::Cancel);
                }
                TuiEvent::Escape => actions.push(Action::Quit),
                TuiEvent::ClearHistory => actions.push(Action::ClearHistory),
                TuiEvent::ExportHistory => actions.push(Action::ExportHistory),
                TuiEvent::Submit => {
                    let text = std::mem::take(&mut tui.input);
                    if app.busy {
                        // Keep what the user typed until the lock is released
                        tui.input = text;
                    } else {
                        tui.scroll_back = 0;
                        actions.push(Action::Submit(text));
                    }
                }
                TuiEvent::InputChar(c) => tui.input.push(c),
                TuiEvent::Paste(data) => tui.input.push_str(&data),
                TuiEvent::Backspace => {
                    tui.input.pop();
                }
                TuiEvent::ScrollUp => tui.scroll_back = tui.scroll_back.saturating_add(3),
                TuiEvent::ScrollDown => tui.scroll_back = tui.scroll_back.saturating_sub(3),
                TuiEvent::Resize => {}
            }
        }

        // Handle background task actions (streaming responses)
        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {:?}", action);
            actions.push(action);
        }

        for action in actions {
            match update(&mut app, action) {
                Effect::None => {}
                Effect::Quit => break 'main,
                Effect::SpawnRequest { turn, text } => {
                    active_abort_handles = spawn_request(&app, turn, text, tx.clone());
                }
                Effect::SaveHistory => {
                    if let Some(store) = &store {
                        history::save_quietly(store, app.conversation.messages());
                    }
                }
                Effect::ClearHistory => {
                    if let Some(store) = &store
                        && let Err(e) = store.clear()
                    {
                        warn!("Failed to clear history: {}", e);
                    }
                }
                Effect::ExportHistory => {
                    match history::export_transcript(app.conversation.messages(), &config.export_dir) {
                        Ok(Some(path)) => {
                            app.status_message = format!("Exporté: {}", path.display());
                        }
                        Ok(None) => {}
                        Err(e) => {
                            warn!("Export failed: {}", e);
                            app.status_message = format!("Export échoué: {}", e);
                        }
                    }
                }
            }
        }
    }

    for handle in active_abort_handles.drain(..) {
        handle.abort();
    }

    // Save on exit if there's content
    if let Some(store) = &store {
        history::save_quietly(store, app.conversation.messages());
    }

    ratatui::restore();
    Ok(())
}

fn spawn_request(
    app: &App,
    turn: u64,
    text: String,
    tx: mpsc::Sender<Action>,
) -> Vec<tokio::task::AbortHandle> {
    info!("Spawning chat request for turn {}", turn);

    let transport = app.transport.clone();

    // Async channel for session updates
    let (update_tx, mut update_rx) = tokio::sync::mpsc::channel::<SessionUpdate>(100);

    let session_handle = tokio::spawn(async move {
        match run_session(transport.as_ref(), &text, update_tx).await {
            Ok(phase) => info!("Session ended in {:?}", phase),
            Err(e) => warn!("Session aborted: {}", e),
        }
    });

    // Forward updates to the Action channel, tagged with the turn that spawned them
    let forward_handle = tokio::spawn(async move {
        let mut forwarded = 0usize;
        while let Some(update) = update_rx.recv().await {
            forwarded += 1;
            if tx.send(Action::Session { turn, update }).is_err() {
                warn!("Failed to forward session update: receiver dropped");
                return;
            }
        }
        debug!("Forwarded {} session updates", forwarded);
    });

    vec![session_handle.abort_handle(), forward_handle.abort_handle()]
}
