//! HTTP surface for the telephony platform
//!
//! - GET /listen - websocket audio stream for one call (metadata frame first)
//! - POST /sms - inbound SMS delivery webhook
//! - GET /health - health check

mod handlers;
mod routes;
mod state;

pub use handlers::{InboundSms, StreamMetadata};
pub use routes::create_router;
pub use state::AppState;
