mod cli;
mod commands;
mod observability;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    observability::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Key { plugin } => commands::key(&plugin)?,
        Commands::Ensure { plugin, base } => commands::ensure(&plugin, base)?,
        Commands::SitePaths { key, base } => commands::site_paths(&key, base)?,
        Commands::Run {
            plugin,
            base,
            command,
        } => {
            let code = commands::run(&plugin, base, &command)?;
            std::process::exit(code);
        }
    }

    Ok(())
}
