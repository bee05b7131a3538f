//! expensectl CLI - manage expense records in MongoDB
//!
//! This binary is the composition root: it loads configuration, builds one
//! `ConnectionProvider`, and hands it to the expense repository for each
//! command.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use expensectl_core::{ConnectionProvider, MongoBackend, StoreConfig};
use tracing::debug;

mod commands;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "expensectl",
    author,
    version,
    about = "Store, list and delete expense records in MongoDB"
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// MongoDB connection string (overrides config file and environment)
    #[arg(long, global = true, value_name = "URI")]
    uri: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect and run the liveness check
    Ping,
    /// Store a single expense
    Add(commands::expenses::AddArgs),
    /// Store every expense from a JSON array file in one bulk insert
    Import(commands::expenses::ImportArgs),
    /// Show the expense with the given external id
    Get(commands::expenses::GetArgs),
    /// Show all stored expenses
    List(commands::expenses::ListArgs),
    /// Delete the expense with the given external id
    Delete(commands::expenses::DeleteArgs),
    /// Delete every stored expense
    Clear(commands::expenses::ClearArgs),
    /// Inspect expensectl configuration
    Config(commands::config::ConfigArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)] // PowerShell is a proper noun, not a suffix
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

/// Effective configuration: file, then environment, then `--uri`.
fn load_config(uri: Option<String>) -> Result<StoreConfig> {
    let mut config = StoreConfig::load().context("Failed to load configuration")?;
    if let Some(uri) = uri {
        config.connection.uri = uri;
    }
    Ok(config)
}

fn build_provider(config: &StoreConfig) -> ConnectionProvider<MongoBackend> {
    let backend = match &config.connection.app_name {
        Some(name) => MongoBackend::new().with_app_name(name.clone()),
        None => MongoBackend::new(),
    };
    let provider = ConnectionProvider::from_config(backend, &config.connection);
    debug!(endpoint = %provider.endpoint(), policy = ?provider.policy(), "provider ready");
    provider
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug }).ok();
    expensectl_core::load_dotenv()?;

    let config = load_config(cli.uri)?;

    // Connects lazily, so commands that never touch the store cost nothing.
    let provider = build_provider(&config);

    match cli.command {
        Commands::Ping => commands::expenses::run_ping(&provider).await?,
        Commands::Add(args) => commands::expenses::run_add(&provider, args).await?,
        Commands::Import(args) => commands::expenses::run_import(&provider, args).await?,
        Commands::Get(args) => commands::expenses::run_get(&provider, args).await?,
        Commands::List(args) => commands::expenses::run_list(&provider, args).await?,
        Commands::Delete(args) => commands::expenses::run_delete(&provider, args).await?,
        Commands::Clear(args) => commands::expenses::run_clear(&provider, args).await?,
        Commands::Config(args) => commands::config::run_config(args, &config)?,
        Commands::Completions(args) => run_completions(args)?,
    }
    Ok(())
}

fn run_completions(args: CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell as CompletionShell};
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    let shell = match args.shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    };

    generate(shell, &mut cmd, bin_name, &mut io::stdout());

    Ok(())
}
