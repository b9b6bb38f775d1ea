//! CLI for the segfetch segmented downloader.

mod commands;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

use commands::{run_completions, run_fetch, run_man, run_probe, FetchArgs};

/// Top-level CLI for segfetch.
#[derive(Debug, Parser)]
#[command(name = "segfetch", version)]
#[command(
    about = "Download one HTTP resource over several concurrent byte-range connections",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download a resource into a local file.
    Fetch {
        /// HTTP/HTTPS URL of the resource.
        #[arg(short, long)]
        url: String,

        /// Number of segments (0 = one per connection).
        #[arg(short, long, value_name = "N", allow_negative_numbers = true)]
        segments: Option<i64>,

        /// Number of concurrent connections.
        #[arg(short, long, value_name = "N", allow_negative_numbers = true)]
        connections: Option<i64>,

        /// Output file path.
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Print a JSON summary instead of the final notice.
        #[arg(long)]
        json: bool,
    },

    /// Print the size of a resource without downloading it.
    Probe {
        /// HTTP/HTTPS URL of the resource.
        url: String,
    },

    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },

    /// Print a roff man page to stdout.
    Man,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Fetch {
                url,
                segments,
                connections,
                output,
                json,
            } => {
                let args = FetchArgs {
                    url,
                    segments,
                    connections,
                    output,
                    json,
                };
                run_fetch(args).await?;
            }
            CliCommand::Probe { url } => run_probe(&url).await?,
            CliCommand::Completions { shell } => run_completions(shell, &mut Cli::command()),
            CliCommand::Man => run_man(Cli::command())?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
