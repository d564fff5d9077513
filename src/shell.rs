//! Interactive shell.
//!
//! Keeps one [`Orchestrator`] alive across commands so `analyze` can work on
//! the result set of the last `search`:
//!
//! ```text
//! catchall> search AI layoffs
//! Found 3 records (Showing top 3).
//! ...
//! catchall> analyze group by industry
//! ```

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::orchestrator::Orchestrator;

const PROMPT: &str = "catchall> ";

const HELP: &str = "\
Commands:
  search <text>    Find articles (runs a CatchAll job, may take minutes)
  analyze <text>   Ask a question about the last search results
  status           Show what is cached
  help             Show this message
  quit             Leave the shell";

/// One parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Search(String),
    Analyze(String),
    Status,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

/// Parse a single input line. Command words are case-insensitive.
pub fn parse_command(line: &str) -> ShellCommand {
    let line = line.trim();
    if line.is_empty() {
        return ShellCommand::Empty;
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "search" | "s" if !rest.is_empty() => ShellCommand::Search(rest.to_string()),
        "analyze" | "ask" | "a" if !rest.is_empty() => ShellCommand::Analyze(rest.to_string()),
        "status" => ShellCommand::Status,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        _ => ShellCommand::Unknown(line.to_string()),
    }
}

/// Run the read-eval-print loop until `quit` or end of input.
///
/// Domain failures (timeouts, completion errors) are printed and the session
/// continues; only I/O errors end it.
pub async fn run_shell<R, W>(orchestrator: &Orchestrator, input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    loop {
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            output.write_all(b"\n").await?;
            break;
        };

        let reply = match parse_command(&line) {
            ShellCommand::Empty => continue,
            ShellCommand::Quit => break,
            ShellCommand::Help => HELP.to_string(),
            ShellCommand::Status => status_line(orchestrator),
            ShellCommand::Unknown(text) => {
                format!("Unknown command: {}. Type 'help' for commands.", text)
            }
            ShellCommand::Search(text) => match orchestrator.search(&text).await {
                Ok(summary) => summary,
                Err(e) => format!("Error: {}", e),
            },
            ShellCommand::Analyze(text) => match orchestrator.analyze(&text).await {
                Ok(answer) => answer,
                Err(e) => format!("Error: {}", e),
            },
        };

        output.write_all(reply.as_bytes()).await?;
        output.write_all(b"\n").await?;
    }

    output.flush().await?;
    Ok(())
}

fn status_line(orchestrator: &Orchestrator) -> String {
    match orchestrator.store().get() {
        Some(cached) => format!(
            "Cached {} of {} records for job {} (query: {}), cached at {}",
            cached.results.len(),
            cached.results.total_found,
            cached.job_id,
            cached.query,
            cached.cached_at.format("%Y-%m-%d %H:%M:%S UTC"),
        ),
        None => "Nothing cached yet.".to_string(),
    }
}
