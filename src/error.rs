//! Error types for the conversation controller and its collaborators

use thiserror::Error;

/// Failure reported by a reply provider.
///
/// The controller never shows these to the user; every variant collapses into
/// the same transcript entry and the detail only goes to the log.
#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("assistant returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode assistant reply: {0}")]
    Decode(String),

    #[error("reply task ended without an answer")]
    Unavailable,

    #[error("scripted failure: {0}")]
    Scripted(String),
}

/// Errors raised by the controller, export and storage layers
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("a reply is still pending; wait for it before replacing the transcript")]
    TurnInFlight,

    #[error("invalid timestamp in transcript: {value}")]
    InvalidTimestamp { value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ChatResult<T> = std::result::Result<T, ChatError>;
