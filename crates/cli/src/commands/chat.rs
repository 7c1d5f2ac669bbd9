use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use concierge_agent::conversation::{ConciergeError, ConciergeSession, GREETING};
use concierge_core::config::LoadOptions;
use concierge_core::errors::ApplicationError;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::warn;

use crate::commands::{llm_client, load_catalog_for, load_config, runtime, CommandResult};

const COMMAND: &str = "chat";

const HELP: &str = "Commands: /recommend ranks the catalog for what you've said so far, \
/reset forgets extracted requirements, /quit exits.";

#[derive(Debug, Clone, Args)]
pub struct ChatArgs {
    #[arg(long, help = "Catalog JSON file to use instead of the configured one")]
    pub catalog: Option<PathBuf>,
    #[arg(long, help = "Matches shown by /recommend (defaults to catalog.default_limit)")]
    pub limit: Option<usize>,
}

pub fn run(args: &ChatArgs, mut options: LoadOptions) -> CommandResult {
    if let Some(path) = &args.catalog {
        options.overrides.catalog_path = Some(path.clone());
    }

    let config = match load_config(COMMAND, options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let client = match llm_client(COMMAND, &config) {
        Ok(client) => client,
        Err(failure) => return failure,
    };
    let catalog = match load_catalog_for(COMMAND, &config) {
        Ok(catalog) => catalog,
        Err(failure) => return failure,
    };

    let session = match ConciergeSession::new(client, Arc::new(catalog)) {
        Ok(session) => session,
        Err(error) => return CommandResult::failure(COMMAND, "session_init", error.to_string(), 1),
    };
    let mut session =
        session.with_recommendation_limit(args.limit.unwrap_or(config.catalog.default_limit));

    let runtime = match runtime(COMMAND) {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let outcome = runtime.block_on(run_session(
        &mut session,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    ));

    match outcome {
        Ok(turns) => CommandResult::success(
            COMMAND,
            format!("chat session {} ended after {turns} turns", session.session_id()),
        ),
        Err(error) => CommandResult::failure(COMMAND, "chat_io", format!("{error:#}"), 1),
    }
}

/// Drives one session over line-oriented input until EOF or `/quit`.
/// Returns the number of user turns handled.
pub async fn run_session<R, W>(
    session: &mut ConciergeSession,
    input: R,
    mut output: W,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    write_block(&mut output, &format!("{GREETING}\n{HELP}")).await?;

    let mut lines = input.lines();
    let mut turns = 0;

    loop {
        output.write_all(b"> ").await.context("failed to write prompt")?;
        output.flush().await.context("failed to flush prompt")?;

        let Some(line) = lines.next_line().await.context("failed to read input")? else {
            break;
        };

        let reply = match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/reset" => {
                session.forget_requirement();
                "Okay, I'll re-read your requirements from the conversation next time."
                    .to_string()
            }
            "/recommend" => match session.recommend_now().await {
                Ok(rendered) => rendered,
                Err(error) => failure_text(session.session_id(), error),
            },
            message => {
                turns += 1;
                match session.handle_user_message(message).await {
                    Ok(reply) => reply.text,
                    Err(error) => failure_text(session.session_id(), error),
                }
            }
        };

        write_block(&mut output, &reply).await?;
    }

    Ok(turns)
}

/// Detail goes to the log; the buyer only sees the interface-level message.
fn failure_text(session_id: &str, error: ConciergeError) -> String {
    warn!(
        event_name = "agent.concierge.turn_failed",
        correlation_id = %session_id,
        error = %error,
        "concierge turn failed"
    );
    let interface = ApplicationError::from(error).into_interface(session_id);
    format!("Sorry, something went wrong. {}", interface.user_message())
}

async fn write_block<W>(output: &mut W, text: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    output.write_all(text.as_bytes()).await.context("failed to write reply")?;
    output.write_all(b"\n\n").await.context("failed to write reply")?;
    output.flush().await.context("failed to flush reply")?;
    Ok(())
}
