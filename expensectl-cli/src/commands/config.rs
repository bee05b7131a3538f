use anyhow::Result;
use clap::{Parser, Subcommand};
use expensectl_core::StoreConfig;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration (passwords masked)
    Show,
    /// Show config file path
    Path,
}

pub fn run_config(args: ConfigArgs, config: &StoreConfig) -> Result<()> {
    match args.command {
        ConfigCommands::Show => run_show(config),
        ConfigCommands::Path => run_path(),
    }
}

fn run_show(config: &StoreConfig) -> Result<()> {
    print!("{}", config.to_redacted_toml()?);
    Ok(())
}

fn run_path() -> Result<()> {
    let path = StoreConfig::config_path();
    let state = if path.exists() { "exists" } else { "not created, defaults in use" };
    println!("{} ({})", path.display(), state);
    Ok(())
}
