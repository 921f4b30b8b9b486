use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kubechat::commands::extract_commands;
use kubechat::config::Config;
use kubechat::events::{Message, TurnOutcome};
use kubechat::llm::{HttpReplyProvider, ReplyProvider};
use kubechat::llm_mock::ScriptedReplyProvider;
use kubechat::session::ConversationSession;
use kubechat::storage::read_export;
use kubechat::timefmt::relative_label;
use kubechat::{app, logging};

#[derive(Parser)]
#[command(name = "kubechat")]
#[command(version)]
#[command(about = "Chat with a Docker & Kubernetes assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Assistant API base URL (overrides config and KUBECHAT_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Answer from built-in canned replies instead of the network
    #[arg(long, global = true)]
    demo: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the reply
    Ask {
        #[arg(required = true)]
        question: Vec<String>,
    },
    /// Print a transcript exported with /export
    View { file: PathBuf },
    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(url) = cli.api_url {
        config.set_api_url(url);
    }
    logging::init(&config.log_dir(), &config.log_level)?;

    match cli.command {
        None => {
            let provider = build_provider(&config, cli.demo)?;
            app::run(&config, provider).await
        }
        Some(Commands::Ask { question }) => {
            let provider = build_provider(&config, cli.demo)?;
            ask(provider, &question.join(" ")).await
        }
        Some(Commands::View { file }) => view(&file),
        Some(Commands::Config) => {
            println!("# {}", config.config_path().display());
            print!("{}", toml::to_string_pretty(&config).context("Failed to serialize config")?);
            Ok(())
        }
    }
}

fn build_provider(config: &Config, demo: bool) -> Result<Arc<dyn ReplyProvider>> {
    if demo {
        tracing::info!("using canned demo replies");
        return Ok(Arc::new(ScriptedReplyProvider::new()));
    }

    let provider = HttpReplyProvider::from_config(config).context("Failed to create HTTP client")?;
    Ok(Arc::new(provider))
}

async fn ask(provider: Arc<dyn ReplyProvider>, question: &str) -> Result<()> {
    let mut session = ConversationSession::new(provider);
    if !session.send_turn(question) {
        bail!("Nothing to ask: the question is empty");
    }

    let outcome = session.wait_for_reply().await;
    let Some(reply) = session.transcript().last() else {
        bail!("Transcript is unexpectedly empty");
    };

    println!("{}", reply.content());
    if outcome == Some(TurnOutcome::Failed) {
        bail!("The assistant did not answer; see the log for details");
    }

    let commands = extract_commands(reply.content());
    if !commands.is_empty() {
        println!();
        println!("📋 Commands:");
        for command in commands {
            println!("  {}", command);
        }
    }

    Ok(())
}

fn view(file: &Path) -> Result<()> {
    let export = read_export(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let messages = export.to_messages()?;

    println!("💬 Transcript exported {} ({} messages)", export.export_date, messages.len());
    println!("{}", "=".repeat(50));

    let now = Utc::now();
    for message in &messages {
        print_message(message, now);
    }

    Ok(())
}

fn print_message(message: &Message, now: chrono::DateTime<Utc>) {
    let icon = if message.from_user() { "👤" } else { "🤖" };
    println!(
        "{} {} · {}",
        icon,
        message.role().display_name(),
        relative_label(message.created_at(), now)
    );
    for line in message.content().lines() {
        println!("   {}", line);
    }
    println!();
}
