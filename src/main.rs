//! # Dockyard Assist CLI (`dockyard`)
//!
//! ## Usage
//!
//! ```bash
//! dockyard --config ./config/dockyard.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dockyard chat` | Interactive chatbot session |
//! | `dockyard ask "<query>"` | Ask the chatbot a single question |
//! | `dockyard search ["<query>"]` | Hero search; restores the last open search |
//! | `dockyard popular` | List suggested searches |
//! | `dockyard serve proxy` | Start the chat proxy server |
//! | `dockyard completions <shell>` | Print shell completions |
//!
//! ## Examples
//!
//! ```bash
//! # Start the proxy in front of the backend
//! dockyard serve proxy --config ./config/dockyard.toml
//!
//! # Search, then restore the open search on the next run
//! dockyard search "Seed Funding"
//! dockyard search
//!
//! # Open a suggested search without fetching
//! dockyard search --try "Tech Mentors"
//! ```

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use dockyard_assist::search::SearchAction;
use dockyard_assist::{chat, config, proxy, search};

/// Dockyard Assist CLI — search and chat widgets for a startup knowledge base.
///
/// All commands except `completions` and `popular` read a TOML
/// configuration file given by `--config`.
#[derive(Parser)]
#[command(
    name = "dockyard",
    about = "Dockyard Assist — search and chat widgets for a startup knowledge base",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/dockyard.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant interactively.
    ///
    /// Reads one question per line from stdin. Type `/quit` or send EOF
    /// to leave.
    Chat,

    /// Ask the assistant a single question and print the answer.
    Ask {
        /// The question.
        query: String,
    },

    /// Run the hero search.
    ///
    /// Restores a previously open search from the session file. With a
    /// QUERY, submits it and prints the results.
    Search {
        /// Query to submit.
        #[arg(conflicts_with_all = ["popular", "close"])]
        query: Option<String>,

        /// Open a suggested search by label or query, without fetching.
        #[arg(long = "try", value_name = "POPULAR", conflicts_with = "close")]
        popular: Option<String>,

        /// Close the search and forget the saved session.
        #[arg(long)]
        close: bool,
    },

    /// List suggested searches.
    Popular,

    /// Start a server.
    Serve {
        #[command(subcommand)]
        service: ServeService,
    },

    /// Print shell completions to stdout.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ServeService {
    /// Start the chat proxy.
    ///
    /// Binds to `[proxy].bind` and forwards `POST /api/chat` to the
    /// backend's ask endpoint.
    Proxy,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,dockyard_assist=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    // Commands that don't require config
    match &cli.command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "dockyard", &mut std::io::stdout());
            return Ok(());
        }
        Commands::Popular => {
            search::list_popular();
            return Ok(());
        }
        _ => {}
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Chat => {
            chat::run_chat(&cfg).await?;
        }
        Commands::Ask { query } => {
            chat::run_ask(&cfg, &query).await?;
        }
        Commands::Search {
            query,
            popular,
            close,
        } => {
            let action = if close {
                SearchAction::Close
            } else if let Some(name) = popular {
                SearchAction::Popular(name)
            } else if let Some(query) = query {
                SearchAction::Submit(query)
            } else {
                SearchAction::Show
            };
            search::run_search(&cfg, action).await?;
        }
        Commands::Serve { service } => match service {
            ServeService::Proxy => {
                proxy::run_proxy(&cfg).await?;
            }
        },
        Commands::Completions { .. } | Commands::Popular => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
