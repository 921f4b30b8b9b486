use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::llm::ReplyProvider;
use crate::session::ConversationSession;
use crate::storage::StorageManager;
use crate::tui::{self, EventHandler, Tui};
use crate::ui::conversation::{ConversationAction, ConversationManager};

/// Run the interactive chat until the user quits
pub async fn run(config: &Config, provider: Arc<dyn ReplyProvider>) -> Result<()> {
    let session = ConversationSession::new(provider);
    let storage = StorageManager::new(config.export_dir());
    let mut manager = ConversationManager::new(session, storage, config.ui.show_suggestions);

    tui::install_panic_hook();
    let mut terminal = tui::init().context("Failed to initialize terminal")?;
    tracing::info!(api = %config.api_base_url, "chat session started");

    let result = event_loop(&mut terminal, &mut manager, Duration::from_millis(config.ui.tick_rate_ms)).await;

    tui::restore().context("Failed to restore terminal")?;
    tracing::info!(
        messages = manager.session().transcript().len(),
        "chat session ended"
    );
    result
}

async fn event_loop(terminal: &mut Tui, manager: &mut ConversationManager, tick_rate: Duration) -> Result<()> {
    let mut events = EventHandler::new(tick_rate);

    loop {
        manager.poll_replies();
        terminal.draw(|frame| {
            let area = frame.size();
            manager.render(area, frame.buffer_mut());
        })?;

        let Some(event) = events.next().await else {
            break;
        };

        if manager.handle_event(event).await? == ConversationAction::Exit {
            break;
        }
    }

    Ok(())
}
