//! Per-call session engine
//!
//! This module owns the heart of the assistant:
//! - `Member`/`MemberState` — per-member workflow status, private to a session
//! - `Session` — one call: transcription link lifecycle, command execution,
//!   SMS relay workflow
//! - `SessionRegistry` — process-wide table routing inbound SMS replies back
//!   to the call that asked for them

mod member;
mod registry;
mod session;

pub use member::{Member, MemberState};
pub use registry::{DuplicateSessionError, SessionRegistry};
pub use session::Session;
