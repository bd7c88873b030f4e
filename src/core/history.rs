//! # Chat History
//!
//! Keeps the conversation across restarts in a single JSON file
//! (`~/.dalil/history.json` by default) and exports plain-text transcripts.
//!
//! Writes use atomic rename (write `.tmp`, then `rename()`) for crash safety.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Local, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::stream::{ChatMessage, Role};

/// On-disk layout of the history file.
#[derive(Serialize, Deserialize, Default, Debug)]
struct HistoryFile {
    saved_at: i64,
    messages: Vec<ChatMessage>,
}

pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads saved messages. A missing file is an empty history.
    pub fn load(&self) -> io::Result<Vec<ChatMessage>> {
        if !self.path.exists() {
            debug!("No history at {}", self.path.display());
            return Ok(Vec::new());
        }
        let json = fs::read_to_string(&self.path)?;
        let file: HistoryFile =
            serde_json::from_str(&json).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        info!(
            "Loaded {} messages from {}",
            file.messages.len(),
            self.path.display()
        );
        Ok(file.messages)
    }

    /// Saves the conversation. An empty conversation is not written.
    pub fn save(&self, messages: &[ChatMessage]) -> io::Result<()> {
        if messages.is_empty() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = HistoryFile {
            saved_at: Utc::now().timestamp(),
            messages: messages.to_vec(),
        };
        atomic_write_json(&self.path, &file)?;
        debug!("History saved: {} messages", messages.len());
        Ok(())
    }

    /// Removes the history file, if any.
    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("History cleared: {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Atomically write `data` as JSON to `path` (via `.tmp` + rename).
fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> io::Result<()> {
    let tmp_path = path.with_extension("tmp");
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "المستخدم",
        Role::Assistant => "المستشار القانوني",
    }
}

/// Renders the conversation as a plain-text transcript.
pub fn format_transcript(messages: &[ChatMessage]) -> String {
    let separator = "-".repeat(40);
    messages
        .iter()
        .map(|m| {
            let time = m.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S");
            format!(
                "[{}] {}:\n{}\n\n{}\n",
                time,
                role_label(m.role),
                m.content,
                separator
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Writes `consultation_juridique_<date>.txt` into `dir`.
/// Returns `None` when there is nothing to export.
pub fn export_transcript(messages: &[ChatMessage], dir: &Path) -> io::Result<Option<PathBuf>> {
    if messages.is_empty() {
        return Ok(None);
    }
    fs::create_dir_all(dir)?;
    let name = format!(
        "consultation_juridique_{}.txt",
        Local::now().format("%Y-%m-%d")
    );
    let path = dir.join(name);
    fs::write(&path, format_transcript(messages))?;
    info!("Exported {} messages to {}", messages.len(), path.display());
    Ok(Some(path))
}

/// Saves the conversation, logging instead of failing.
pub fn save_quietly(store: &HistoryStore, messages: &[ChatMessage]) {
    if let Err(e) = store.save(messages) {
        warn!("Failed to save history: {}", e);
    }
}
