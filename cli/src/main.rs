//! Terminal front end for the healthcare assistant chat.
//!
//! `chat` (the default) runs the interactive loop, `ask` runs one turn on a
//! fresh session, `ping` probes the backend's `/health` endpoint.

mod transcript;

use std::io::{self, Write};
use std::sync::Arc;

use carechat::config::{DEFAULT_BASE_URL, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS};
use carechat::{ChatSession, ClientConfig, ClientTimeouts, HttpChatClient, IgnoreReason, SubmitOutcome};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use transcript::Transcript;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] carechat::ConfigError),
    #[error("chat backend error: {0}")]
    Exchange(#[from] carechat::ExchangeError),
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("message is empty; type something to ask")]
    EmptyMessage,
    #[error("the assistant could not answer; try again")]
    TurnFailed,
}

#[derive(Parser, Debug)]
#[command(name = "carechat", about = "Chat with the healthcare appointment assistant")]
struct Cli {
    #[arg(long, env = "CARECHAT_API_BASE", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[arg(long, env = "CARECHAT_REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    request_timeout_secs: u64,

    #[arg(long, env = "CARECHAT_CONNECT_TIMEOUT_SECS", default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS)]
    connect_timeout_secs: u64,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive chat (default).
    Chat,
    /// Send one message on a fresh session and print the reply.
    Ask {
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
    /// Check that the backend is up.
    Ping,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    init_logging();

    let cli = Cli::parse();
    let config = ClientConfig::new(&cli.base_url)?.with_timeouts(ClientTimeouts {
        request_secs: cli.request_timeout_secs,
        connect_secs: cli.connect_timeout_secs,
    });
    let client = Arc::new(HttpChatClient::new(&config)?);
    tracing::debug!(url = client.chat_url(), "cli: client ready");

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => run_chat(ChatSession::new(client)).await,
        Command::Ask { message } => run_ask(ChatSession::new(client), &message.join(" ")).await,
        Command::Ping => run_ping(&client).await,
    }
}

/// Logs go to stderr so stdout carries only the transcript. Quiet unless
/// `RUST_LOG` asks for more.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run_chat(session: ChatSession) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    let mut rx = session.subscribe();
    let mut transcript = Transcript::default();

    writeln!(stdout, "--- Healthcare Assistant ---")?;
    writeln!(stdout, "Type 'exit' or 'quit' to stop.\n")?;
    transcript.render(&rx.borrow_and_update(), &mut stdout)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        write!(stdout, "You: ")?;
        stdout.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(stdout)?;
            break;
        };
        if is_exit_command(&line) {
            writeln!(stdout, "Goodbye!")?;
            break;
        }

        session.update_input(line);
        run_turn(&session, &mut rx, &mut transcript, &mut stdout).await?;
    }
    Ok(())
}

/// Submit the pending input, re-rendering on every state change until the
/// turn settles.
async fn run_turn(
    session: &ChatSession,
    rx: &mut watch::Receiver<carechat::SessionState>,
    transcript: &mut Transcript,
    out: &mut impl Write,
) -> Result<SubmitOutcome, CliError> {
    let submit = session.submit_pending();
    tokio::pin!(submit);

    let outcome = loop {
        tokio::select! {
            outcome = &mut submit => break outcome,
            changed = rx.changed() => {
                if changed.is_ok() {
                    transcript.render(&rx.borrow_and_update(), out)?;
                }
            }
        }
    };
    transcript.render(&rx.borrow_and_update(), out)?;
    Ok(outcome)
}

async fn run_ask(session: ChatSession, message: &str) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    let mut rx = session.subscribe();
    let mut transcript = Transcript::echoing_user();
    rx.borrow_and_update();

    session.update_input(message);
    let outcome = run_turn(&session, &mut rx, &mut transcript, &mut stdout).await?;

    if let Some(thread_id) = session.thread_id() {
        eprintln!("thread: {thread_id}");
    }
    match outcome {
        SubmitOutcome::Replied => Ok(()),
        SubmitOutcome::Ignored(IgnoreReason::Empty) => Err(CliError::EmptyMessage),
        SubmitOutcome::Failed | SubmitOutcome::Ignored(IgnoreReason::Busy) => Err(CliError::TurnFailed),
    }
}

async fn run_ping(client: &HttpChatClient) -> Result<(), CliError> {
    let health = client.health().await?;
    println!("{}", health.status);
    Ok(())
}

fn is_exit_command(line: &str) -> bool {
    let word = line.trim();
    word.eq_ignore_ascii_case("exit") || word.eq_ignore_ascii_case("quit")
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
