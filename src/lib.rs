pub mod command;
pub mod config;
pub mod http;
pub mod roster;
pub mod session;
pub mod telephony;
pub mod transcribe;

pub use command::{Command, CommandParser, RelayVerb};
pub use config::Config;
pub use http::{create_router, AppState};
pub use roster::RosterEntry;
pub use session::{DuplicateSessionError, Member, MemberState, Session, SessionRegistry};
pub use telephony::{CallControl, RestClient, SendError};
pub use transcribe::{ConnectError, LinkEvent, LinkState, TranscriptionLink};
