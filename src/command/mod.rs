//! Spoken-command recognition
//!
//! Final transcripts are matched against a fixed set of wake-word patterns.
//! There is no NLU here: a transcript either matches one of the command
//! shapes or it is discarded.

mod parser;

pub use parser::{Command, CommandParser, RelayVerb};
