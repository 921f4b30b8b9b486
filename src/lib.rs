//! Terminal chat client for a Docker & Kubernetes assistant.
//!
//! [`session::ConversationSession`] owns the transcript and turn-taking
//! state; everything else is glue around it.

pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod export;
pub mod llm;
pub mod llm_mock;
pub mod logging;
pub mod session;
pub mod storage;
pub mod timefmt;
pub mod tui;
pub mod ui;

pub use error::{ChatError, ReplyError};
pub use events::{ConversationRole, Message, TurnOutcome};
pub use export::TranscriptExport;
pub use llm::{HttpReplyProvider, ReplyProvider};
pub use session::ConversationSession;
