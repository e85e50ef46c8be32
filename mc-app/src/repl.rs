//! Console front end: the one-time mode prompt and the line-based chat loop.

use crate::commands::{CommandOutcome, handle_command, split_image_reference};
use anyhow::Result;
use mc_chat::{Conversation, Mode};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

pub async fn prompt_mode<R, W>(input: &mut Lines<R>, out: &mut W) -> Result<String>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "Select a mode:")?;
    for mode in Mode::ALL {
        writeln!(
            out,
            "  {} - {} ({})",
            mode.selector(),
            mode,
            mode.default_model()
        )?;
    }
    write!(out, "mode> ")?;
    out.flush()?;

    let line = input
        .next_line()
        .await?
        .ok_or_else(|| anyhow::anyhow!("stdin closed before a mode was selected"))?;
    Ok(line.trim().to_string())
}

/// Runs until `/quit` or end of input. Failed turns are reported and skipped.
pub async fn run_chat<R, W>(
    conversation: &mut Conversation,
    default_image: Option<&Path>,
    input: &mut Lines<R>,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(
        out,
        "[{} mode, model {}] Type a message, /history, /status or /quit.",
        conversation.mode(),
        conversation.model()
    )?;
    if conversation.mode() == Mode::Image {
        writeln!(
            out,
            "Attach an image with `<text> @<file.ext>`; otherwise the default image is used."
        )?;
    }

    loop {
        write!(out, "you> ")?;
        out.flush()?;
        let Some(line) = input.next_line().await? else {
            writeln!(out)?;
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match handle_command(conversation, line) {
            Some(CommandOutcome::Quit) => break,
            Some(CommandOutcome::Reply(text)) => {
                writeln!(out, "{text}")?;
                continue;
            }
            None => {}
        }

        let (text, image) = match conversation.mode() {
            Mode::Text => (line, None),
            Mode::Image => {
                let (text, explicit) = split_image_reference(line);
                let image = explicit
                    .map(PathBuf::from)
                    .or_else(|| default_image.map(Path::to_path_buf));
                (text, image)
            }
        };

        match conversation.ask(text, image.as_deref()).await {
            Ok(reply) => writeln!(out, "assistant> {}", reply.content.text().trim())?,
            Err(e) => {
                tracing::error!(error = %e, "turn failed");
                writeln!(out, "error: {e}")?;
            }
        }
    }
    Ok(())
}

/// One-shot turn: prints only the reply. An unreadable image is already
/// reported by the encoder, so nothing is added here.
pub async fn run_once<W: Write>(
    conversation: &mut Conversation,
    text: &str,
    image: Option<&Path>,
    out: &mut W,
) -> Result<()> {
    let reply = conversation.ask(text, image).await?;
    writeln!(out, "{}", reply.content.text().trim())?;
    Ok(())
}
