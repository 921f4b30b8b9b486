//! Conversation controller: transcript, draft and turn-taking state

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::oneshot::{self, error::TryRecvError};

use crate::commands::extract_commands;
use crate::error::{ChatError, ChatResult, ReplyError};
use crate::events::{Message, TurnOutcome};
use crate::export::TranscriptExport;
use crate::llm::ReplyProvider;

pub const WELCOME_MESSAGE: &str = "👋 Welcome! I'm your Docker & Kubernetes assistant. I can help you with:\n\n• Container management and troubleshooting\n• Kubernetes cluster operations\n• YAML configuration files\n• Best practices and optimization\n\nTry asking me something like \"How do I scale a deployment?\" or paste your kubectl/docker commands!";

pub const CLEARED_MESSAGE: &str = "👋 Chat cleared! How can I help you with Docker and Kubernetes today?";

pub const REPLY_FAILURE_MESSAGE: &str =
    "❌ Sorry, I encountered an error while processing your request. Please try again.";

/// Handle on the single in-flight provider call
struct PendingTurn {
    rx: oneshot::Receiver<Result<String, ReplyError>>,
    started_at: Instant,
}

/// Owns the transcript and enforces single-flight turn taking.
///
/// A turn moves `Idle -> AwaitingReply -> Idle`. While a reply is pending
/// `send_turn` is a no-op, so every user message is immediately followed by
/// its own reply or error entry.
pub struct ConversationSession {
    transcript: Vec<Message>,
    draft: String,
    pending: Option<PendingTurn>,
    health_rx: Option<oneshot::Receiver<bool>>,
    connected: bool,
    provider: Arc<dyn ReplyProvider>,
}

impl ConversationSession {
    pub fn new(provider: Arc<dyn ReplyProvider>) -> Self {
        Self {
            transcript: vec![Message::assistant(WELCOME_MESSAGE)],
            draft: String::new(),
            pending: None,
            health_rx: None,
            connected: true,
            provider,
        }
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn awaiting_reply(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Non-empty draft and no reply pending
    pub fn can_send(&self) -> bool {
        !self.draft.trim().is_empty() && !self.awaiting_reply()
    }

    pub fn update_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Start a turn with `text`.
    ///
    /// Returns `false` without touching any state when `text` is blank or a
    /// reply is already pending. Must be called from within a tokio runtime.
    pub fn send_turn(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() || self.awaiting_reply() {
            return false;
        }

        self.draft.clear();
        self.transcript.push(Message::user(text));

        let (tx, rx) = oneshot::channel();
        let provider = Arc::clone(&self.provider);
        let utterance = text.to_string();
        tokio::spawn(async move {
            let result = provider.ask(&utterance).await;
            let _ = tx.send(result);
        });

        self.pending = Some(PendingTurn {
            rx,
            started_at: Instant::now(),
        });
        tracing::debug!(chars = text.chars().count(), "turn started");

        true
    }

    /// Send whatever is in the draft
    pub fn submit_draft(&mut self) -> bool {
        let text = self.draft.clone();
        self.send_turn(&text)
    }

    /// Settle the pending turn if its reply has arrived, without blocking.
    pub fn poll_reply(&mut self) -> Option<TurnOutcome> {
        let pending = self.pending.as_mut()?;
        let result = match pending.rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => Err(ReplyError::Unavailable),
        };
        Some(self.settle(result))
    }

    /// Wait for the pending turn to settle. Returns `None` when idle.
    pub async fn wait_for_reply(&mut self) -> Option<TurnOutcome> {
        let pending = self.pending.as_mut()?;
        let result = (&mut pending.rx)
            .await
            .unwrap_or_else(|_| Err(ReplyError::Unavailable));
        Some(self.settle(result))
    }

    fn settle(&mut self, result: Result<String, ReplyError>) -> TurnOutcome {
        let elapsed_ms = self
            .pending
            .take()
            .map(|pending| pending.started_at.elapsed().as_millis() as u64)
            .unwrap_or_default();

        match result {
            Ok(reply) => {
                tracing::info!(elapsed_ms, chars = reply.chars().count(), "reply received");
                self.transcript.push(Message::assistant(reply));
                self.connected = true;
                TurnOutcome::Replied
            }
            Err(e) => {
                tracing::warn!(elapsed_ms, error = %e, "reply failed");
                self.transcript.push(Message::assistant(REPLY_FAILURE_MESSAGE));
                self.connected = false;
                TurnOutcome::Failed
            }
        }
    }

    /// Replace the transcript with a single confirmation message.
    pub fn clear_transcript(&mut self) {
        tracing::info!(dropped = self.transcript.len(), "transcript cleared");
        self.transcript = vec![Message::assistant(CLEARED_MESSAGE)];
    }

    pub fn export_transcript(&self) -> TranscriptExport {
        TranscriptExport::capture(&self.transcript, Utc::now())
    }

    /// Replace the transcript with the messages of an export.
    ///
    /// Refused while a reply is pending, since that reply would land after
    /// the imported history.
    pub fn import_transcript(&mut self, export: &TranscriptExport) -> ChatResult<()> {
        if self.awaiting_reply() {
            return Err(ChatError::TurnInFlight);
        }

        let messages = export.to_messages()?;
        tracing::info!(messages = messages.len(), "transcript imported");
        self.transcript = if messages.is_empty() {
            vec![Message::assistant(WELCOME_MESSAGE)]
        } else {
            messages
        };
        Ok(())
    }

    /// Commands found in the most recent assistant message
    pub fn last_reply_commands(&self) -> Vec<String> {
        self.transcript
            .iter()
            .rev()
            .find(|message| !message.from_user())
            .map(|message| extract_commands(message.content()))
            .unwrap_or_default()
    }

    /// Start a background health check. Returns `false` if one is already
    /// running. Must be called from within a tokio runtime.
    pub fn start_connection_check(&mut self) -> bool {
        if self.health_rx.is_some() {
            return false;
        }

        let (tx, rx) = oneshot::channel();
        let provider = Arc::clone(&self.provider);
        tokio::spawn(async move {
            let _ = tx.send(provider.health_check().await);
        });
        self.health_rx = Some(rx);
        true
    }

    pub fn checking_connection(&self) -> bool {
        self.health_rx.is_some()
    }

    /// Record the health check result as the connection state once it is in.
    pub fn poll_connection_check(&mut self) -> Option<bool> {
        let rx = self.health_rx.as_mut()?;
        let healthy = match rx.try_recv() {
            Ok(healthy) => healthy,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => false,
        };
        Some(self.record_health(healthy))
    }

    /// Check provider health and wait for the result.
    pub async fn check_connection(&mut self) -> bool {
        self.start_connection_check();
        let healthy = match self.health_rx.as_mut() {
            Some(rx) => rx.await.unwrap_or(false),
            None => false,
        };
        self.record_health(healthy)
    }

    fn record_health(&mut self, healthy: bool) -> bool {
        self.health_rx = None;
        tracing::info!(healthy, "connection checked");
        self.connected = healthy;
        healthy
    }
}
