//! Error types for invitation replies.

use thiserror::Error;

/// Errors that can occur while turning an invitation into a reply.
#[derive(Error, Debug)]
pub enum ReplyError {
    #[error("Could not read invitation: {0}")]
    Input(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("No organizer in event")]
    NoOrganizer,

    #[error("Malformed calendar address: {0:?}")]
    MalformedAttendee(String),

    #[error("Seems like you have not been invited to this event! ({0} is not an attendee)")]
    NotInvited(String),

    #[error("Sendmail command is not configured: {0}")]
    TransferConfig(String),

    #[error("Could not start {command}: {source}")]
    TransferSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to send reply, {command} exited with exit code {code}")]
    TransferExecution { command: String, code: i32 },

    #[error("aborted")]
    UserCancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Message error: {0}")]
    Message(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for reply operations.
pub type ReplyResult<T> = Result<T, ReplyError>;
