use crate::roster::{normalize_phone, RosterEntry};

/// Where a member sits in the SMS relay workflow.
///
/// At most one workflow is outstanding per member; a new ask overwrites any
/// pending state, and every reply (or send failure) resets to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberState {
    Idle,
    AwaitingJoinResponse,
    AwaitingAnswer,
}

/// A session's private view of one roster member
#[derive(Debug, Clone)]
pub struct Member {
    pub name: String,
    aliases: Vec<String>,
    pub phone_number: String,
    pub state: MemberState,
}

impl Member {
    pub fn from_roster(entry: &RosterEntry) -> Self {
        Self {
            name: entry.name.clone(),
            aliases: entry.hints(),
            phone_number: normalize_phone(&entry.phone_number).to_string(),
            state: MemberState::Idle,
        }
    }

    /// Case-insensitive match against the alias set (own name included)
    pub fn matches_alias(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.aliases.iter().any(|alias| *alias == name)
    }
}
