use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Plugo - per-plugin isolated Python environments
#[derive(Parser, Debug)]
#[command(name = "plugo")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Plugin identity shared by every command that derives a key.
#[derive(Args, Debug, Clone)]
pub struct PluginArgs {
    /// Plugin name (sanitized into the key prefix)
    #[arg(long)]
    pub name: String,

    /// Plugin version; omitted and empty are equivalent
    #[arg(long = "plugin-version", value_name = "VERSION")]
    pub plugin_version: Option<String>,

    /// Requirement specifier, repeatable (e.g. -r 'requests>=2')
    #[arg(short = 'r', long = "requirement", value_name = "SPEC")]
    pub requirements: Vec<String>,

    /// requirements.txt to merge into the requirement set
    #[arg(long, value_name = "FILE")]
    pub requirements_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the environment key for a plugin
    Key {
        #[command(flatten)]
        plugin: PluginArgs,
    },

    /// Create or reuse the plugin's environment and install its requirements
    Ensure {
        #[command(flatten)]
        plugin: PluginArgs,

        /// Environment home (default: PLUGO_VENV_HOME / VENV_HOME / ./.plugo/venvs)
        #[arg(long, value_name = "DIR")]
        base: Option<PathBuf>,
    },

    /// Print the site-packages directories of an existing environment
    SitePaths {
        /// Environment key as printed by `plugo key`
        #[arg(long)]
        key: String,

        /// Environment home (default: PLUGO_VENV_HOME / VENV_HOME / ./.plugo/venvs)
        #[arg(long, value_name = "DIR")]
        base: Option<PathBuf>,
    },

    /// Ensure the environment, expose it on PYTHONPATH, and run a command
    Run {
        #[command(flatten)]
        plugin: PluginArgs,

        /// Environment home (default: PLUGO_VENV_HOME / VENV_HOME / ./.plugo/venvs)
        #[arg(long, value_name = "DIR")]
        base: Option<PathBuf>,

        /// Command and arguments, after `--`
        #[arg(last = true, required = true, value_name = "CMD")]
        command: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "plugo", "run", "--name", "demo", "--plugin-version", "1.0.0", "-r", "rich", "-r",
            "requests>=2", "--", "python", "-c", "import rich",
        ])
        .unwrap();
        match cli.command {
            Commands::Run { plugin, base, command } => {
                assert_eq!(plugin.name, "demo");
                assert_eq!(plugin.plugin_version.as_deref(), Some("1.0.0"));
                assert_eq!(plugin.requirements, vec!["rich", "requests>=2"]);
                assert!(base.is_none());
                assert_eq!(command, vec!["python", "-c", "import rich"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_key_takes_plugin_version() {
        let cli =
            Cli::try_parse_from(["plugo", "key", "--name", "demo", "--plugin-version", "2.1"])
                .unwrap();
        match cli.command {
            Commands::Key { plugin } => assert_eq!(plugin.plugin_version.as_deref(), Some("2.1")),
            other => panic!("unexpected command: {other:?}"),
        }
        // `--version` is the binary's own flag, not the plugin's
        let err = Cli::try_parse_from(["plugo", "key", "--name", "demo", "--version", "2.1"]);
        assert!(err.is_err());
    }

    #[test]
    fn test_run_requires_command() {
        assert!(Cli::try_parse_from(["plugo", "run", "--name", "demo"]).is_err());
    }
}
