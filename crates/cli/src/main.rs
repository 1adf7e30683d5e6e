mod commands;
mod host;
mod pipeline;

use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "snapshot-kit")]
#[command(version, long_about = None)]
#[command(about = "Locale-aware static snapshots of client-rendered sites")]
struct Cli {
    /// Path to snapshot.toml
    #[arg(short, long, global = true, default_value = commands::init::CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Write a sample snapshot.toml
    Init {
        /// Directory to write snapshot.toml into
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing snapshot.toml
        #[arg(long)]
        force: bool,
    },

    /// Check the built site against the configuration
    Validate,

    /// Patch per-locale metadata into the built template (no browser)
    Patch,

    /// Render every route in a headless browser and write script-free HTML
    Render {
        /// Port for the local file server (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Serve the built site with locale rewrites
    Preview {
        /// Port to serve on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Init { path, force } => commands::init::run(path, force).await,
        Command::Validate => commands::validate::run(cli.config).await,
        Command::Patch => commands::patch::run(cli.config).await,
        Command::Render { port } => commands::render::run(cli.config, port).await,
        Command::Preview { port } => commands::preview::run(cli.config, port).await,
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "snapshot-kit", &mut io::stdout());
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from([
            "snapshot-kit",
            "render",
            "--config",
            "site/snapshot.toml",
            "-p",
            "4000",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("site/snapshot.toml"));
        assert!(matches!(cli.command, Command::Render { port: Some(4000) }));
    }

    #[test]
    fn test_config_defaults() {
        let cli = Cli::try_parse_from(["snapshot-kit", "patch"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("snapshot.toml"));
    }
}
