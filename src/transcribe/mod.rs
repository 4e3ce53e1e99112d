//! Real-time transcription link
//!
//! One `TranscriptionLink` per call. It exchanges app credentials for a
//! short-lived token, streams call audio to the provider over a websocket,
//! and delivers typed [`LinkEvent`]s to the owning session:
//! - `Connected` / `ConnectFailed` — connection lifecycle
//! - `FinalTranscript` — stable recognition results (interim ones are dropped)
//! - `Closed` — link torn down, locally or by the provider

pub mod auth;
pub mod link;
pub mod messages;

pub use auth::TokenError;
pub use link::{ConnectError, LinkEvent, LinkState, TranscriptionLink};
pub use messages::{classify, ParseError, ProviderEvent};
