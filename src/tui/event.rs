use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};

/// TUI-specific input events
#[derive(Debug, Clone, PartialEq)]
pub enum TuiEvent {
    // Core actions (passed to core::update)
    ForceQuit,
    Submit,
    Escape,
    ClearHistory,
    ExportHistory,

    // TUI-local events (handled directly in TUI)
    InputChar(char),
    Paste(String), // Bracketed paste - newlines folded into spaces
    Backspace,
    ScrollUp,
    ScrollDown,
    Resize,
}

/// Poll for an event without blocking (returns immediately)
pub fn poll_event_immediate() -> Option<TuiEvent> {
    poll_event_timeout(std::time::Duration::ZERO)
}

pub fn poll_event_timeout(timeout: std::time::Duration) -> Option<TuiEvent> {
    if !event::poll(timeout).unwrap_or(false) {
        return None;
    }
    match event::read().ok()? {
        Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
            log::debug!(
                "Key event: {:?} with modifiers {:?}",
                key_event.code,
                key_event.modifiers
            );
            match (key_event.modifiers, key_event.code) {
                (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(TuiEvent::ForceQuit),
                (KeyModifiers::CONTROL, KeyCode::Char('l')) => Some(TuiEvent::ClearHistory),
                (KeyModifiers::CONTROL, KeyCode::Char('e')) => Some(TuiEvent::ExportHistory),
                (_, KeyCode::Char(c)) => Some(TuiEvent::InputChar(c)),
                (_, KeyCode::Backspace) => Some(TuiEvent::Backspace),
                (_, KeyCode::Enter) => Some(TuiEvent::Submit),
                (_, KeyCode::Esc) => Some(TuiEvent::Escape),
                (_, KeyCode::PageUp) | (_, KeyCode::Up) => Some(TuiEvent::ScrollUp),
                (_, KeyCode::PageDown) | (_, KeyCode::Down) => Some(TuiEvent::ScrollDown),
                _ => None,
            }
        }
        Event::Paste(data) => Some(TuiEvent::Paste(data.replace(['\r', '\n'], " "))),
        Event::Resize(_, _) => Some(TuiEvent::Resize),
        _ => None,
    }
}
