//! Member directory snapshot
//!
//! The roster is loaded once at startup from a JSON file and handed to each
//! session as a read-only view. A missing or unreadable roster is tolerated:
//! the assistant still runs, every name lookup just fails politely.

use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// One directory entry: a person who can be invited into a call via SMS
#[derive(Debug, Clone, Deserialize)]
pub struct RosterEntry {
    /// Display name, e.g. "Dave"
    pub name: String,

    /// Alternate spellings/nicknames the recognizer may produce
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Phone number in E.164 digits, with or without a leading '+'
    pub phone_number: String,
}

impl RosterEntry {
    /// All lowercase forms this entry answers to, own name included.
    /// Doubles as the recognition vocabulary for the transcription provider.
    pub fn hints(&self) -> Vec<String> {
        let mut hints: Vec<String> = self
            .aliases
            .iter()
            .map(|a| a.trim().to_lowercase())
            .filter(|a| !a.is_empty())
            .collect();
        hints.push(self.name.to_lowercase());
        hints
    }
}

/// Strip the leading '+' so numbers compare equal regardless of how the
/// SMS gateway formats them.
pub fn normalize_phone(tel: &str) -> &str {
    tel.strip_prefix('+').unwrap_or(tel)
}

/// Load the roster snapshot. Failures degrade to an empty roster.
pub fn load(path: &str) -> Vec<RosterEntry> {
    if !Path::new(path).exists() {
        warn!("No roster file at {}, starting with an empty roster", path);
        return Vec::new();
    }

    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Failed to read roster file {}: {}", path, e);
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<RosterEntry>>(&raw) {
        Ok(mut entries) => {
            for entry in &mut entries {
                entry.phone_number = normalize_phone(&entry.phone_number).to_string();
            }
            info!("Loaded {} roster members from {}", entries.len(), path);
            entries
        }
        Err(e) => {
            warn!("Failed to parse roster file {}: {}", path, e);
            Vec::new()
        }
    }
}
