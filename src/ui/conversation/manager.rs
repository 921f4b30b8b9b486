use crate::commands::suggestion;
use crate::events::{TuiEvent, TurnOutcome};
use crate::session::ConversationSession;
use crate::storage::{StorageManager, read_export};
use crate::ui::conversation::commands::{get_help_text, suggestions_text};
use crate::ui::conversation::{
    ComposerResult, ConversationComposer, ConversationHistory, ParsedCommand, PendingIndicator,
    SlashCommand,
};
use anyhow::Result;
use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};
use std::path::PathBuf;

/// Actions that can be requested by the conversation manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationAction {
    None,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// Feedback from slash commands. Shown above the composer, never part of the
/// transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

/// Connects the terminal UI to the conversation session
pub struct ConversationManager {
    session: ConversationSession,
    history: ConversationHistory,
    composer: ConversationComposer,
    pending: PendingIndicator,
    storage: StorageManager,
    notice: Option<Notice>,
    show_suggestions: bool,
}

impl ConversationManager {
    pub fn new(session: ConversationSession, storage: StorageManager, show_suggestions: bool) -> Self {
        Self {
            session,
            history: ConversationHistory::new(),
            composer: ConversationComposer::new("Type a question or paste a kubectl/docker command..."),
            pending: PendingIndicator,
            storage,
            notice: None,
            show_suggestions,
        }
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Settle a finished reply and connection check, if any
    pub fn poll_replies(&mut self) -> Option<TurnOutcome> {
        if let Some(online) = self.session.poll_connection_check() {
            self.notice = Some(status_notice(online));
        }

        let outcome = self.session.poll_reply();
        if outcome.is_some() {
            self.history.scroll_to_bottom();
        }
        outcome
    }

    pub async fn handle_event(&mut self, event: TuiEvent) -> Result<ConversationAction> {
        match event {
            TuiEvent::Key(key) => self.handle_key(key).await,
            TuiEvent::Paste(text) => {
                self.composer.paste(&text);
                self.session.update_draft(self.composer.content());
                Ok(ConversationAction::None)
            }
            TuiEvent::Tick | TuiEvent::Resize(_, _) => {
                self.poll_replies();
                Ok(ConversationAction::None)
            }
        }
    }

    /// Handle key input
    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<ConversationAction> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Ok(ConversationAction::Exit);
        }

        match key.code {
            KeyCode::PageUp => {
                self.history.scroll_up(5);
                return Ok(ConversationAction::None);
            }
            KeyCode::PageDown => {
                self.history.scroll_down(5);
                return Ok(ConversationAction::None);
            }
            KeyCode::Esc if !self.composer.palette_visible() && self.notice.is_some() => {
                self.notice = None;
                return Ok(ConversationAction::None);
            }
            _ => {}
        }

        match self.composer.handle_key(key) {
            ComposerResult::Submitted(_) => {
                self.session.update_draft(self.composer.content());
                if self.session.submit_draft() {
                    self.composer.clear();
                    self.notice = None;
                    self.history.scroll_to_bottom();
                } else if self.session.awaiting_reply() {
                    self.notice = Some(Notice::info("Still waiting for the previous reply."));
                }
                Ok(ConversationAction::None)
            }
            ComposerResult::Command(command) => {
                self.session.update_draft(self.composer.content());
                self.handle_slash_command(command).await
            }
            ComposerResult::Edited => {
                self.session.update_draft(self.composer.content());
                Ok(ConversationAction::None)
            }
            ComposerResult::None => Ok(ConversationAction::None),
        }
    }

    /// Handle slash commands
    async fn handle_slash_command(&mut self, command: ParsedCommand) -> Result<ConversationAction> {
        if self.session.awaiting_reply() && !command.command.available_while_awaiting() {
            self.notice = Some(Notice::error(format!(
                "/{} is unavailable until the pending reply arrives.",
                command.command.command()
            )));
            return Ok(ConversationAction::None);
        }

        match command.command {
            SlashCommand::Clear => {
                self.session.clear_transcript();
                self.history.scroll_to_bottom();
                self.notice = None;
            }
            SlashCommand::Export => {
                let export = self.session.export_transcript();
                let result = match command.argument() {
                    Some(dir) => StorageManager::new(dir).write_export(&export, Utc::now()),
                    None => self.storage.write_export(&export, Utc::now()),
                };
                self.notice = Some(match result {
                    Ok(path) => Notice::info(format!(
                        "Exported {} messages to {}",
                        export.messages.len(),
                        path.display()
                    )),
                    Err(e) => {
                        tracing::error!(error = %e, "export failed");
                        Notice::error(format!("Export failed: {e}"))
                    }
                });
            }
            SlashCommand::Import => {
                let Some(path) = command.argument() else {
                    self.notice = Some(Notice::error("Usage: /import <path-to-export.json>"));
                    return Ok(ConversationAction::None);
                };
                let path = PathBuf::from(path);
                let result = read_export(&path).and_then(|export| self.session.import_transcript(&export));
                self.notice = Some(match result {
                    Ok(()) => {
                        self.history.scroll_to_bottom();
                        Notice::info(format!(
                            "Loaded {} messages from {}",
                            self.session.transcript().len(),
                            path.display()
                        ))
                    }
                    Err(e) => {
                        tracing::error!(error = %e, path = %path.display(), "import failed");
                        Notice::error(format!("Import failed: {e}"))
                    }
                });
            }
            SlashCommand::Commands => {
                let commands = self.session.last_reply_commands();
                self.notice = Some(if commands.is_empty() {
                    Notice::info("No commands in the last reply.")
                } else {
                    Notice::info(format!("Commands from the last reply:\n{}", commands.join("\n")))
                });
            }
            SlashCommand::Suggest => match command.suggestion_index().and_then(suggestion) {
                Some(text) => {
                    self.composer.set_content(text);
                    self.session.update_draft(text);
                    self.notice = None;
                }
                None => self.notice = Some(Notice::info(suggestions_text().trim_end().to_string())),
            },
            SlashCommand::Status => {
                if self.session.start_connection_check() {
                    self.notice = Some(Notice::info("Checking connection..."));
                }
            }
            SlashCommand::Help => {
                self.notice = Some(Notice::info(get_help_text()));
            }
            SlashCommand::Bye => return Ok(ConversationAction::Exit),
        }

        Ok(ConversationAction::None)
    }

    /// Render the conversation UI components
    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let awaiting = self.session.awaiting_reply();
        let notice_height = self
            .notice
            .as_ref()
            .map(|notice| (notice.text.lines().count() as u16 + 2).min(area.height / 2))
            .unwrap_or(0);
        let composer_height = self.composer.desired_height(area.height / 3);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),                          // History
                Constraint::Length(u16::from(awaiting)),     // Pending indicator
                Constraint::Length(notice_height),           // Notice
                Constraint::Length(composer_height),         // Composer
                Constraint::Length(1),                       // Status bar
            ])
            .split(area);

        self.history.render(
            self.session.transcript(),
            Utc::now(),
            self.show_suggestions,
            chunks[0],
            buf,
        );

        if awaiting {
            self.pending.render(chunks[1], buf);
        }

        if let Some(notice) = &self.notice {
            render_notice(notice, chunks[2], buf);
        }

        self.composer.render(chunks[3], buf, awaiting);
        self.composer.render_palette(chunks[3], buf);
        self.render_status_bar(chunks[4], buf);
    }

    fn render_status_bar(&self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 {
            return;
        }

        let (dot, label, color) = if self.session.is_connected() {
            ("●", "Online", Color::Green)
        } else {
            ("○", "Offline", Color::Red)
        };

        let hint = if self.session.awaiting_reply() {
            "waiting for reply"
        } else if self.session.can_send() {
            "Enter to send"
        } else {
            "type a message"
        };

        let line = Line::from(vec![
            Span::styled(format!(" {} {}", dot, label), Style::default().fg(color)),
            Span::styled(
                format!("  │ {} messages │ {} │ /help", self.session.transcript().len(), hint),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}

fn status_notice(online: bool) -> Notice {
    if online {
        Notice::info("● Assistant is reachable.")
    } else {
        Notice::error("○ Assistant is unreachable.")
    }
}

fn render_notice(notice: &Notice, area: Rect, buf: &mut Buffer) {
    let color = match notice.kind {
        NoticeKind::Info => Color::Cyan,
        NoticeKind::Error => Color::Red,
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Esc to dismiss")
        .style(Style::default().fg(color));
    let inner = block.inner(area);
    block.render(area, buf);

    for (i, text) in notice.text.lines().take(inner.height as usize).enumerate() {
        let line = Line::from(Span::raw(text.to_string()));
        buf.set_line(inner.x, inner.y + i as u16, &line, inner.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_mock::ScriptedReplyProvider;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn manager_with(provider: &ScriptedReplyProvider, dir: &TempDir) -> ConversationManager {
        let session = ConversationSession::new(Arc::new(provider.clone()));
        ConversationManager::new(session, StorageManager::new(dir.path()), true)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn type_line(manager: &mut ConversationManager, text: &str) -> ConversationAction {
        for c in text.chars() {
            manager.handle_key(key(KeyCode::Char(c))).await.unwrap();
        }
        // Close the palette first when typing a command.
        if text.starts_with('/') && !text.contains(' ') {
            manager.handle_key(key(KeyCode::Esc)).await.unwrap();
        }
        manager.handle_key(key(KeyCode::Enter)).await.unwrap()
    }

    #[tokio::test]
    async fn typing_mirrors_draft_and_enter_sends() {
        let provider = ScriptedReplyProvider::new();
        provider.push_reply("Try: kubectl get pods -A");
        let dir = TempDir::new().unwrap();
        let mut manager = manager_with(&provider, &dir);

        for c in "kubectl get pods".chars() {
            manager.handle_key(key(KeyCode::Char(c))).await.unwrap();
        }
        assert_eq!(manager.session().draft(), "kubectl get pods");
        assert!(manager.session().can_send());

        manager.handle_key(key(KeyCode::Enter)).await.unwrap();
        assert_eq!(manager.session().draft(), "");
        assert!(manager.session().awaiting_reply());
        assert_eq!(manager.composer.content(), "");

        let mut session_done = false;
        for _ in 0..100 {
            if manager.poll_replies().is_some() {
                session_done = true;
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(session_done);
        assert_eq!(manager.session().transcript().len(), 3);
    }

    #[tokio::test]
    async fn enter_while_awaiting_keeps_text() {
        let provider = ScriptedReplyProvider::new();
        let gate = provider.push_gated();
        let dir = TempDir::new().unwrap();
        let mut manager = manager_with(&provider, &dir);

        type_line(&mut manager, "first").await;
        type_line(&mut manager, "second").await;

        assert_eq!(manager.composer.content(), "second");
        assert_eq!(manager.session().draft(), "second");
        assert_eq!(manager.session().transcript().len(), 2);
        assert!(manager.notice().is_some());

        gate.reply("ok");
        manager.session.wait_for_reply().await;
        assert_eq!(manager.session().transcript().len(), 3);
        assert_eq!(manager.composer.content(), "second");
    }

    #[tokio::test]
    async fn clear_command_resets_transcript() {
        let provider = ScriptedReplyProvider::new();
        provider.push_reply("reply");
        let dir = TempDir::new().unwrap();
        let mut manager = manager_with(&provider, &dir);

        type_line(&mut manager, "hello").await;
        manager.session.wait_for_reply().await;
        assert_eq!(manager.session().transcript().len(), 3);

        type_line(&mut manager, "/clear").await;
        assert_eq!(manager.session().transcript().len(), 1);
    }

    #[tokio::test]
    async fn export_then_import_round_trip() {
        let provider = ScriptedReplyProvider::new();
        provider.push_reply("helm list -A");
        let dir = TempDir::new().unwrap();
        let mut manager = manager_with(&provider, &dir);

        type_line(&mut manager, "what releases exist?").await;
        manager.session.wait_for_reply().await;
        type_line(&mut manager, "/export").await;

        let path = dir.path().join(crate::export::export_file_name(Utc::now()));
        assert!(path.exists(), "notice: {:?}", manager.notice());

        type_line(&mut manager, "/clear").await;
        type_line(&mut manager, &format!("/import {}", path.display())).await;

        let contents: Vec<&str> = manager.session().transcript().iter().map(|m| m.content()).collect();
        assert_eq!(contents[1..], ["what releases exist?", "helm list -A"]);
        assert_eq!(manager.notice().map(|n| n.kind), Some(NoticeKind::Info));
    }

    #[tokio::test]
    async fn import_blocked_while_awaiting() {
        let provider = ScriptedReplyProvider::new();
        let _gate = provider.push_gated();
        let dir = TempDir::new().unwrap();
        let mut manager = manager_with(&provider, &dir);

        type_line(&mut manager, "pending").await;
        type_line(&mut manager, "/import some.json").await;

        assert_eq!(manager.notice().map(|n| n.kind), Some(NoticeKind::Error));
        assert_eq!(manager.session().transcript().len(), 2);
    }

    #[tokio::test]
    async fn suggest_fills_composer_and_draft() {
        let provider = ScriptedReplyProvider::new();
        let dir = TempDir::new().unwrap();
        let mut manager = manager_with(&provider, &dir);

        type_line(&mut manager, "/suggest 3").await;
        assert_eq!(manager.composer.content(), "How do I debug a crashloop?");
        assert_eq!(manager.session().draft(), "How do I debug a crashloop?");
        assert!(manager.session().can_send());
    }

    async fn poll_until<T>(
        manager: &mut ConversationManager,
        mut settled: impl FnMut(&ConversationManager) -> Option<T>,
    ) -> T {
        for _ in 0..100 {
            manager.poll_replies();
            if let Some(value) = settled(&*manager) {
                return value;
            }
            tokio::task::yield_now().await;
        }
        panic!("never settled");
    }

    #[tokio::test]
    async fn status_updates_connection() {
        let provider = ScriptedReplyProvider::new();
        provider.set_healthy(false);
        let dir = TempDir::new().unwrap();
        let mut manager = manager_with(&provider, &dir);

        type_line(&mut manager, "/status").await;
        let kind = poll_until(&mut manager, |m| {
            (!m.session().checking_connection()).then(|| m.notice().map(|n| n.kind))
        })
        .await;
        assert!(!manager.session().is_connected());
        assert_eq!(kind, Some(NoticeKind::Error));
    }

    #[tokio::test]
    async fn slow_status_check_keeps_ui_responsive() {
        let provider = ScriptedReplyProvider::new();
        let gate = provider.gate_health();
        provider.push_reply("kubectl get nodes");
        let dir = TempDir::new().unwrap();
        let mut manager = manager_with(&provider, &dir);

        assert_eq!(type_line(&mut manager, "/status").await, ConversationAction::None);
        assert!(manager.session().checking_connection());

        // Turns still go through while the health check hangs.
        type_line(&mut manager, "list nodes").await;
        poll_until(&mut manager, |m| (m.session().transcript().len() == 3).then_some(())).await;
        assert!(manager.session().checking_connection());

        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(manager.handle_key(ctrl_c).await.unwrap(), ConversationAction::Exit);

        gate.release(true);
        let kind = poll_until(&mut manager, |m| {
            (!m.session().checking_connection()).then(|| m.notice().map(|n| n.kind))
        })
        .await;
        assert_eq!(kind, Some(NoticeKind::Info));
        assert!(manager.session().is_connected());
    }

    #[tokio::test]
    async fn bye_and_ctrl_c_exit() {
        let provider = ScriptedReplyProvider::new();
        let dir = TempDir::new().unwrap();
        let mut manager = manager_with(&provider, &dir);

        assert_eq!(type_line(&mut manager, "/bye").await, ConversationAction::Exit);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(manager.handle_key(ctrl_c).await.unwrap(), ConversationAction::Exit);
    }

    #[tokio::test]
    async fn render_does_not_panic_on_small_area() {
        let provider = ScriptedReplyProvider::new();
        let dir = TempDir::new().unwrap();
        let mut manager = manager_with(&provider, &dir);
        type_line(&mut manager, "/help").await;

        let area = Rect::new(0, 0, 30, 12);
        let mut buf = Buffer::empty(area);
        manager.render(area, &mut buf);
    }
}
