//! # Actions
//!
//! Everything that can happen in Dalil becomes an `Action`.
//! User presses Enter? That's `Action::Submit(text)`.
//! A chunk of the answer arrives? That's `Action::Session { turn, update: SessionUpdate::Replaced { .. } }`.
//!
//! Session updates carry the turn they belong to. Anything from a turn that
//! was cancelled or superseded is dropped, so only the session in flight
//! touches the live reply.
//!
//! `update()` applies an action to the state and returns the single side
//! effect the caller must perform. No I/O happens here.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```

use log::{debug, info, warn};

use crate::core::state::App;
use crate::stream::{ChatMessage, SessionUpdate};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// User sends the input box contents.
    Submit(String),
    /// Progress from the streaming session spawned for `turn`.
    Session { turn: u64, update: SessionUpdate },
    /// User aborts the in-flight turn.
    Cancel,
    ClearHistory,
    ExportHistory,
    Quit,
}

/// The side effect the adapter must carry out after `update()`.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    /// Start a stream session for this question, tagged with `turn`.
    SpawnRequest { turn: u64, text: String },
    SaveHistory,
    ClearHistory,
    ExportHistory,
    Quit,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::Submit(text) => {
            if text.trim().is_empty() {
                return Effect::None;
            }
            if app.busy {
                debug!("Submit ignored: a response is still streaming");
                return Effect::None;
            }
            app.conversation.push(ChatMessage::user(text.clone()));
            app.busy = true;
            app.turn += 1;
            app.status_message = String::from("Consultation en cours...");
            Effect::SpawnRequest {
                turn: app.turn,
                text,
            }
        }

        Action::Session { turn, update } => {
            if !app.busy || turn != app.turn {
                debug!(
                    "Dropping update from turn {} (current turn {}, busy={})",
                    turn, app.turn, app.busy
                );
                return Effect::None;
            }
            apply_session_update(app, update)
        }

        Action::Cancel => {
            if !app.busy {
                return Effect::None;
            }
            info!("Turn {} cancelled by user", app.turn);
            finish_turn(app, "Annulé.");
            Effect::SaveHistory
        }

        Action::ClearHistory => {
            if app.busy {
                app.status_message = String::from("Attendez la fin de la réponse.");
                return Effect::None;
            }
            app.conversation.clear();
            app.status_message = String::from("Historique effacé.");
            Effect::ClearHistory
        }

        Action::ExportHistory => {
            if app.conversation.is_empty() {
                return Effect::None;
            }
            Effect::ExportHistory
        }

        Action::Quit => Effect::Quit,
    }
}

/// Folds an update from the turn in flight.
fn apply_session_update(app: &mut App, update: SessionUpdate) -> Effect {
    match update {
        SessionUpdate::Started(reply) => {
            if app.live_reply.is_some() {
                warn!("Dropping second placeholder {} for turn {}", reply.id, app.turn);
                return Effect::None;
            }
            app.live_reply = Some(reply.id.clone());
            app.conversation.push(reply);
            Effect::None
        }

        SessionUpdate::Replaced { id, content } => {
            if app.live_reply.as_deref() != Some(id.as_str()) {
                warn!("Dropping update for {} (not the live reply)", id);
                return Effect::None;
            }
            app.conversation.replace_content(&id, content);
            Effect::None
        }

        SessionUpdate::Completed { id } => {
            if app.live_reply.as_deref() != Some(id.as_str()) {
                warn!("Dropping completion for {} (not the live reply)", id);
                return Effect::None;
            }
            info!("Reply {} complete", id);
            finish_turn(app, "Prêt.");
            Effect::SaveHistory
        }

        SessionUpdate::Failed { error, reason } => {
            warn!("Turn {} failed: {}", app.turn, reason);
            app.conversation.push(error);
            finish_turn(app, "Erreur de connexion au serveur.");
            Effect::SaveHistory
        }
    }
}

/// Releases the input lock; the reply stays exactly as streamed.
fn finish_turn(app: &mut App, status: &str) {
    app.busy = false;
    app.live_reply = None;
    app.status_message = status.to_string();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{APOLOGY, Role};
    use crate::test_support::test_app;

    /// Delivers an update tagged with the current turn.
    fn deliver(app: &mut App, session_update: SessionUpdate) -> Effect {
        let turn = app.turn;
        update(app, Action::Session { turn, update: session_update })
    }

    fn start_turn(app: &mut App) -> String {
        assert!(matches!(
            update(app, Action::Submit("Quels sont mes droits ?".to_string())),
            Effect::SpawnRequest { .. }
        ));
        let reply = ChatMessage::assistant_placeholder();
        let id = reply.id.clone();
        deliver(app, SessionUpdate::Started(reply));
        id
    }

    #[test]
    fn test_submit_blank_is_noop() {
        let mut app = test_app();
        assert_eq!(update(&mut app, Action::Submit("   \n".to_string())), Effect::None);
        assert!(app.conversation.is_empty());
        assert!(!app.busy);
    }

    #[test]
    fn test_submit_appends_user_message_and_locks() {
        let mut app = test_app();
        let effect = update(&mut app, Action::Submit(" hello ".to_string()));
        assert_eq!(
            effect,
            Effect::SpawnRequest {
                turn: 1,
                text: " hello ".to_string()
            }
        );
        assert!(app.busy);
        assert_eq!(app.conversation.len(), 1);
        assert_eq!(app.conversation.messages()[0].role, Role::User);
    }

    #[test]
    fn test_submit_while_busy_is_noop() {
        let mut app = test_app();
        start_turn(&mut app);
        let before = app.conversation.len();
        assert_eq!(update(&mut app, Action::Submit("again".to_string())), Effect::None);
        assert_eq!(app.conversation.len(), before);
    }

    #[test]
    fn test_replaced_rewrites_live_reply() {
        let mut app = test_app();
        let id = start_turn(&mut app);
        deliver(
            &mut app,
            SessionUpdate::Replaced {
                id: id.clone(),
                content: "Hello".to_string(),
            },
        );
        deliver(
            &mut app,
            SessionUpdate::Replaced {
                id: id.clone(),
                content: "Hello world".to_string(),
            },
        );
        assert_eq!(app.conversation.get(&id).unwrap().content, "Hello world");
    }

    #[test]
    fn test_replaced_for_other_message_is_ignored() {
        let mut app = test_app();
        start_turn(&mut app);
        let user_id = app.conversation.messages()[0].id.clone();
        deliver(
            &mut app,
            SessionUpdate::Replaced {
                id: user_id.clone(),
                content: "hijacked".to_string(),
            },
        );
        assert_eq!(
            app.conversation.get(&user_id).unwrap().content,
            "Quels sont mes droits ?"
        );
    }

    #[test]
    fn test_completed_releases_lock() {
        let mut app = test_app();
        let id = start_turn(&mut app);
        let effect = deliver(&mut app, SessionUpdate::Completed { id });
        assert_eq!(effect, Effect::SaveHistory);
        assert!(!app.busy);
        assert!(app.live_reply.is_none());
    }

    #[test]
    fn test_failed_appends_error_and_keeps_partial() {
        let mut app = test_app();
        let id = start_turn(&mut app);
        deliver(
            &mut app,
            SessionUpdate::Replaced {
                id: id.clone(),
                content: "partial".to_string(),
            },
        );
        let effect = deliver(
            &mut app,
            SessionUpdate::Failed {
                error: ChatMessage::failure(),
                reason: "network error: reset".to_string(),
            },
        );
        assert_eq!(effect, Effect::SaveHistory);
        assert!(!app.busy);
        assert_eq!(app.conversation.len(), 3);
        assert_eq!(app.conversation.get(&id).unwrap().content, "partial");
        let last = app.conversation.messages().last().unwrap();
        assert!(last.is_error);
        assert_eq!(last.content, APOLOGY);
    }

    #[test]
    fn test_cancel_only_when_busy() {
        let mut app = test_app();
        assert_eq!(update(&mut app, Action::Cancel), Effect::None);
        start_turn(&mut app);
        assert_eq!(update(&mut app, Action::Cancel), Effect::SaveHistory);
        assert!(!app.busy);
    }

    #[test]
    fn test_completion_from_cancelled_turn_leaves_next_turn_streaming() {
        let mut app = test_app();
        let first = start_turn(&mut app);
        let first_turn = app.turn;
        update(&mut app, Action::Cancel);
        let second = start_turn(&mut app);

        let effect = update(
            &mut app,
            Action::Session {
                turn: first_turn,
                update: SessionUpdate::Completed { id: first },
            },
        );
        assert_eq!(effect, Effect::None);
        assert!(app.busy);
        assert_eq!(app.live_reply.as_deref(), Some(second.as_str()));
    }

    #[test]
    fn test_started_after_cancel_is_dropped() {
        let mut app = test_app();
        update(&mut app, Action::Submit("q".to_string()));
        update(&mut app, Action::Cancel);

        deliver(&mut app, SessionUpdate::Started(ChatMessage::assistant_placeholder()));
        assert!(app.live_reply.is_none());
        assert_eq!(app.conversation.len(), 1);
    }

    #[test]
    fn test_failure_from_superseded_turn_is_dropped() {
        let mut app = test_app();
        start_turn(&mut app);
        let first_turn = app.turn;
        update(&mut app, Action::Cancel);
        let second = start_turn(&mut app);
        let before = app.conversation.len();

        let effect = update(
            &mut app,
            Action::Session {
                turn: first_turn,
                update: SessionUpdate::Failed {
                    error: ChatMessage::failure(),
                    reason: "network error: reset".to_string(),
                },
            },
        );
        assert_eq!(effect, Effect::None);
        assert!(app.busy);
        assert_eq!(app.conversation.len(), before);
        assert_eq!(app.live_reply.as_deref(), Some(second.as_str()));
    }

    #[test]
    fn test_second_placeholder_in_same_turn_is_dropped() {
        let mut app = test_app();
        let id = start_turn(&mut app);
        deliver(&mut app, SessionUpdate::Started(ChatMessage::assistant_placeholder()));
        assert_eq!(app.conversation.len(), 2);
        assert_eq!(app.live_reply.as_deref(), Some(id.as_str()));
    }

    #[test]
    fn test_completed_for_other_id_keeps_lock() {
        let mut app = test_app();
        let id = start_turn(&mut app);
        let effect = deliver(
            &mut app,
            SessionUpdate::Completed {
                id: "someone-else".to_string(),
            },
        );
        assert_eq!(effect, Effect::None);
        assert!(app.busy);
        assert_eq!(app.live_reply.as_deref(), Some(id.as_str()));
    }

    #[test]
    fn test_clear_history_refused_while_busy() {
        let mut app = test_app();
        start_turn(&mut app);
        assert_eq!(update(&mut app, Action::ClearHistory), Effect::None);
        assert_eq!(app.conversation.len(), 2);
    }

    #[test]
    fn test_clear_history() {
        let mut app = test_app();
        let id = start_turn(&mut app);
        deliver(&mut app, SessionUpdate::Completed { id });
        assert_eq!(update(&mut app, Action::ClearHistory), Effect::ClearHistory);
        assert!(app.conversation.is_empty());
    }

    #[test]
    fn test_export_requires_messages() {
        let mut app = test_app();
        assert_eq!(update(&mut app, Action::ExportHistory), Effect::None);
        update(&mut app, Action::Submit("q".to_string()));
        assert_eq!(update(&mut app, Action::ExportHistory), Effect::ExportHistory);
    }

    #[test]
    fn test_quit() {
        let mut app = test_app();
        assert_eq!(update(&mut app, Action::Quit), Effect::Quit);
    }
}
