//! # CatchAll CLI (`catchall`)
//!
//! Runs news searches against the CatchAll API and answers questions about
//! the results.
//!
//! ## Usage
//!
//! ```bash
//! catchall --config ./config/catchall.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `catchall search "<query>"` | Run a search and print the summary |
//! | `catchall search "<query>" --ask "<question>"` | Search, then analyze the results |
//! | `catchall shell` | Interactive session with a persistent cache |
//! | `catchall serve` | Start the HTTP tool server |
//! | `catchall tools` | List the agent tools and their schemas |
//! | `catchall prompt` | Print the agent system prompt |
//! | `catchall completions <shell>` | Generate shell completions |
//!
//! ## Examples
//!
//! ```bash
//! # One-shot search with two follow-up questions
//! catchall search "AI layoffs" --ask "group by industry" --ask "which were largest?"
//!
//! # Machine-readable progress on stderr
//! catchall --progress json search "EV battery recalls"
//!
//! # Serve the tools for an agent runtime
//! catchall serve --config ./config/catchall.toml
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tokio::io::BufReader;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use catchall_core::prompts::AGENT_PROMPT;
use catchall_harness::config::{self, Config};
use catchall_harness::orchestrator::Orchestrator;
use catchall_harness::progress::ProgressMode;
use catchall_harness::tools::ToolRegistry;
use catchall_harness::{server, shell};

/// CatchAll: asynchronous news search with LLM analysis, as a CLI and as
/// agent tools.
///
/// Reads `CATCHALL_API_KEY` and `OPENAI_API_KEY` from the environment
/// unless the config file sets them. See `config/catchall.example.toml`.
#[derive(Parser)]
#[command(
    name = "catchall",
    about = "CatchAll: asynchronous news search with LLM analysis",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/catchall.toml`. A missing file means defaults.
    #[arg(long, global = true, default_value = "./config/catchall.toml")]
    config: PathBuf,

    /// Poll progress on stderr: `auto`, `human`, `json`, or `off`.
    #[arg(long, global = true, default_value = "auto")]
    progress: String,

    /// Only log warnings and errors; disables progress output.
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a search and print the result summary.
    ///
    /// Submits a CatchAll job and waits for it (this can take several
    /// minutes). Each `--ask` is answered against the results afterwards.
    Search {
        /// What to look for, e.g. "AI layoffs in the last two weeks".
        query: String,

        /// Analytical question to ask about the results. Repeatable.
        #[arg(long = "ask")]
        ask: Vec<String>,
    },

    /// Interactive session; results stay cached between commands.
    Shell,

    /// Start the HTTP tool server on `[server].bind`.
    Serve,

    /// List the agent tools with their parameter schemas.
    Tools,

    /// Print the agent system prompt.
    Prompt,

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Cancel the orchestrator's in-flight search on ctrl-c.
fn cancel_on_ctrl_c(orchestrator: &Orchestrator) {
    let token = orchestrator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling search");
            token.cancel();
        }
    });
}

fn build_orchestrator(cfg: &Config, progress: ProgressMode) -> anyhow::Result<Arc<Orchestrator>> {
    let orchestrator = Orchestrator::from_config(cfg, progress)?;
    Ok(Arc::new(orchestrator))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that don't require config
    match &cli.command {
        Commands::Prompt => {
            println!("{}", AGENT_PROMPT);
            return Ok(());
        }
        Commands::Tools => {
            let infos = ToolRegistry::with_builtins().infos();
            println!("{}", serde_json::to_string_pretty(&infos)?);
            return Ok(());
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(*shell, &mut cmd, name, &mut std::io::stdout());
            return Ok(());
        }
        _ => {}
    }

    let mut cfg = config::load_config_or_minimal(&cli.config)?;
    if cli.quiet {
        cfg.output.verbose = false;
    }
    init_tracing(cfg.output.verbose);

    let progress = if cli.quiet {
        ProgressMode::Off
    } else {
        ProgressMode::parse(&cli.progress).with_context(|| {
            format!(
                "Invalid --progress value '{}': expected auto, human, json, or off",
                cli.progress
            )
        })?
    };

    match cli.command {
        Commands::Search { query, ask } => {
            let orchestrator = build_orchestrator(&cfg, progress)?;
            cancel_on_ctrl_c(&orchestrator);

            let summary = orchestrator.search(&query).await?;
            if progress == ProgressMode::Human && atty::is(atty::Stream::Stderr) {
                eprintln!();
            }
            println!("{}", summary);

            for question in ask {
                println!();
                println!("> {}", question);
                println!("{}", orchestrator.analyze(&question).await?);
            }
        }
        Commands::Shell => {
            let orchestrator = build_orchestrator(&cfg, progress)?;
            let stdin = BufReader::new(tokio::io::stdin());
            shell::run_shell(&orchestrator, stdin, tokio::io::stdout()).await?;
        }
        Commands::Serve => {
            let orchestrator = build_orchestrator(&cfg, progress)?;
            server::run_server(&cfg, orchestrator).await?;
        }
        Commands::Prompt | Commands::Tools | Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
