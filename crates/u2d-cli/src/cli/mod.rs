//! CLI for u2d.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use u2d_core::config;

use commands::{run_completions, run_fetch, run_man, run_relay, run_upload};

/// Top-level CLI for u2d.
#[derive(Debug, Parser)]
#[command(name = "u2d", version)]
#[command(about = "u2d: fetch a URL and save it to Google Drive", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download a URL and upload it to Drive under its remote file name.
    Relay {
        /// URL of the file to relay.
        url: String,
        /// OAuth2 access token (falls back to `token_file` from the config).
        #[arg(long, env = "U2D_TOKEN", hide_env_values = true)]
        token: Option<String>,
        /// Keep the downloaded local copy instead of deleting it.
        #[arg(long)]
        keep: bool,
    },

    /// Download a URL to a local temp file only.
    Fetch {
        /// URL of the file to download.
        url: String,
        /// Directory for the downloaded file (default: config or system temp dir).
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Upload an existing local file to Drive.
    Upload {
        /// Path of the local file.
        path: PathBuf,
        /// Name to give the file in Drive (default: the local file name).
        #[arg(long)]
        name: Option<String>,
        /// OAuth2 access token (falls back to `token_file` from the config).
        #[arg(long, env = "U2D_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Print a shell completion script.
    Completions {
        /// Target shell.
        shell: Shell,
    },

    /// Print the man page (roff).
    Man,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        // These need no config.
        match cli.command {
            CliCommand::Completions { shell } => return run_completions(shell),
            CliCommand::Man => return run_man(),
            _ => {}
        }

        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Relay { url, token, keep } => run_relay(&cfg, &url, token, keep).await?,
            CliCommand::Fetch { url, dir } => run_fetch(&cfg, &url, dir).await?,
            CliCommand::Upload { path, name, token } => {
                run_upload(&cfg, &path, name, token).await?
            }
            CliCommand::Completions { .. } | CliCommand::Man => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
