//! Call-control and SMS side effects
//!
//! The engine only ever needs two outbound operations: speak text into a
//! live call, and send an SMS. Both sit behind [`CallControl`] so sessions
//! can be exercised without a telephony platform on the other end.

mod client;

pub use client::{CallControl, RestClient, SendError};
