use crate::command::CommandParser;
use crate::config::{AssistantConfig, TranscriptionConfig};
use crate::roster::RosterEntry;
use crate::session::SessionRegistry;
use crate::telephony::CallControl;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub assistant: AssistantConfig,
    pub transcription: TranscriptionConfig,

    /// Active sessions, injected rather than global
    pub registry: Arc<SessionRegistry>,

    pub control: Arc<dyn CallControl>,
    pub parser: Arc<CommandParser>,

    /// Startup snapshot of the member directory; may be empty
    pub roster: Arc<Vec<RosterEntry>>,
}
