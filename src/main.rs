use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use todo_cli::config::Config;
use todo_cli::transport::cli::{self, StorageOverride};

#[derive(Parser)]
#[command(name = "todo")]
#[command(author, version, about = "Todo - single-screen to-do list manager", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default: <config dir>/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store todos in this JSON file
    #[arg(long, global = true, conflicts_with = "memory")]
    file: Option<PathBuf>,

    /// Keep todos in memory only
    #[arg(long, global = true)]
    memory: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive shell (default)
    Shell,

    /// Print the list
    List {
        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Add an item
    Add {
        /// Item name
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Check or uncheck the item at a row
    Toggle {
        /// 1-based row as shown by `todo list`
        row: usize,
    },

    /// Rename the item at a row
    Rename {
        row: usize,

        /// New name
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Delete the item at a row
    Rm {
        row: usize,
    },

    /// Show the effective configuration
    Config {
        /// Write it to the config file (the --config path if given)
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "todo_cli=debug,todo=debug"
    } else {
        "todo_cli=info,todo=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    StorageOverride {
        file: cli.file.clone(),
        memory: cli.memory,
    }
    .apply(&mut config);

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => {
            tracing::debug!("Starting shell with {:?} backend", config.storage.backend);
            cli::run_shell(&config).await?;
        }
        Commands::List { format } => {
            cli::run_list(&config, &format)?;
        }
        Commands::Add { text } => {
            cli::run_add(&config, &text.join(" "))?;
        }
        Commands::Toggle { row } => {
            cli::run_toggle(&config, row)?;
        }
        Commands::Rename { row, text } => {
            cli::run_rename(&config, row, &text.join(" "))?;
        }
        Commands::Rm { row } => {
            cli::run_remove(&config, row)?;
        }
        Commands::Config { save } => {
            cli::run_config(&config, save, cli.config.as_deref())?;
        }
    }

    Ok(())
}
