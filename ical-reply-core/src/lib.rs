//! Core types for ical-reply.
//!
//! This crate turns a calendar invitation into an iTIP reply:
//! - `ics` parses and serializes calendar text into an owned property bag
//! - `invitation` and `attendee` give typed access to the parsed event
//! - `reply` builds the REPLY object, `message` and `transfer` ship it

pub mod attendee;
pub mod config;
pub mod error;
pub mod ics;
pub mod invitation;
pub mod message;
pub mod reply;
pub mod response;
pub mod transfer;

pub use error::{ReplyError, ReplyResult};
pub use invitation::Invitation;
pub use reply::{PreparedReply, Reply, ReplyBuilder};
pub use response::ResponseState;
