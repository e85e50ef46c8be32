//! mistral-chat main binary.

mod commands;
mod config;
mod repl;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use config::ChatConfig;
use mc_chat::{Conversation, ConversationOptions, Mode};
use mc_llm::{CompletionService, LlmClient};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Debug, Parser)]
#[command(name = "mistral-chat", version, about = "Chat with Mistral models from the terminal")]
struct Cli {
    /// Config file (default: ~/.mistral-chat/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive chat (default).
    Chat(SessionArgs),
    /// Send one message and print the reply.
    Ask {
        /// Message text (default: demo.text from config).
        text: Option<String>,
        #[command(flatten)]
        session: SessionArgs,
    },
    /// List modes and their models.
    Models,
}

#[derive(Debug, Clone, Default, Args)]
struct SessionArgs {
    /// 1/text or 2/image; prompted for when not configured.
    #[arg(long)]
    mode: Option<String>,
    #[arg(long)]
    model: Option<String>,
    /// Image to attach in image mode (default: demo.image_path from config).
    #[arg(long)]
    image: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing()?;
    install_panic_hook();

    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Chat(SessionArgs::default()));

    match command {
        Command::Models => {
            for mode in Mode::ALL {
                println!(
                    "{} ({}): {}",
                    mode.selector(),
                    mode,
                    mode.allowed_models().join(", ")
                );
            }
            Ok(())
        }
        Command::Chat(session) => {
            let cfg = ChatConfig::load(cli.config).await?;
            let mut input = BufReader::new(tokio::io::stdin()).lines();
            let mut stdout = std::io::stdout();
            let mut conversation =
                open_conversation(&cfg, &session, &mut input, &mut stdout).await?;
            let default_image = session.image.or_else(|| cfg.demo.image_path.clone());
            repl::run_chat(
                &mut conversation,
                default_image.as_deref(),
                &mut input,
                &mut stdout,
            )
            .await
        }
        Command::Ask { text, session } => {
            let cfg = ChatConfig::load(cli.config).await?;
            let mut input = BufReader::new(tokio::io::stdin()).lines();
            let mut stdout = std::io::stdout();
            let mut conversation =
                open_conversation(&cfg, &session, &mut input, &mut stdout).await?;

            let text = text.unwrap_or_else(|| cfg.demo.text.clone());
            let image = match conversation.mode() {
                Mode::Text => session.image,
                Mode::Image => session.image.or_else(|| cfg.demo.image_path.clone()),
            };
            repl::run_once(&mut conversation, &text, image.as_deref(), &mut stdout).await
        }
    }
}

async fn open_conversation<R, W>(
    cfg: &ChatConfig,
    session: &SessionArgs,
    input: &mut tokio::io::Lines<R>,
    out: &mut W,
) -> anyhow::Result<Conversation>
where
    R: tokio::io::AsyncBufRead + Unpin,
    W: std::io::Write,
{
    let api_key = cfg.api_key()?;
    let mode = match session.mode.clone().or_else(|| cfg.general.mode.clone()) {
        Some(mode) => mode,
        None => repl::prompt_mode(input, out).await?,
    };

    let service: Arc<dyn CompletionService> = Arc::new(LlmClient::with_options(
        &api_key,
        &cfg.general.base_url,
        Duration::from_secs(cfg.general.request_timeout_secs),
    ));
    let options = ConversationOptions {
        mode,
        model: session.model.clone().or_else(|| cfg.general.model.clone()),
        system_prompt: cfg.general.system_prompt.clone(),
    };
    Conversation::new(service, options).context("cannot start conversation")
}

const DEFAULT_LOG_FILTER: &str = "warn,mistral_chat=info,mc_chat=info,mc_llm=info";

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(v) => v,
        Err(_) => EnvFilter::new(DEFAULT_LOG_FILTER),
    };
    let log_format = std::env::var("MISTRAL_CHAT_LOG_FORMAT")
        .unwrap_or_else(|_| "compact".to_string())
        .to_ascii_lowercase();

    // stdout carries the conversation; logs go to stderr.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_span_list(true)
                .init();
        }
        "pretty" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .pretty()
                .init();
        }
        "compact" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact()
                .init();
        }
        other => {
            return Err(anyhow::anyhow!(
                "unsupported MISTRAL_CHAT_LOG_FORMAT={other:?}; expected one of: json, pretty, compact"
            ));
        }
    }

    tracing::debug!(
        log_format = %log_format,
        env_filter = ?std::env::var("RUST_LOG").ok(),
        "tracing initialized"
    );
    Ok(())
}

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_payload_to_string(panic_info.payload());
        tracing::error!(
            panic_location = %location,
            panic_payload = %payload,
            "panic captured"
        );
        default_hook(panic_info);
    }));
}

fn panic_payload_to_string(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        return msg.to_string();
    }
    if let Some(msg) = payload.downcast_ref::<String>() {
        return msg.clone();
    }
    "non-string panic payload".to_string()
}
