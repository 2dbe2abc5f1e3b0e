use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use autorel::publish::BuildInfo;
use autorel::{cli, config, pager, publish, ui};

#[derive(Parser)]
#[command(
    name = "autorel",
    about = "Derive RPM release numbers and changelog entries from git history"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate changelog entries from git commit logs
    GenerateChangelog {
        /// Path to the package worktree or the spec file within
        #[arg(default_value = ".")]
        spec_or_path: PathBuf,

        /// Fail instead of printing a best-effort changelog when the
        /// spec file at HEAD cannot be parsed
        #[arg(long)]
        error_on_unparseable_spec: bool,

        /// Pipe the changelog through a pager
        #[arg(long)]
        pager: bool,
    },

    /// Calculate the release of the package at HEAD
    CalculateRelease {
        /// Path to the package worktree or the spec file within
        #[arg(default_value = ".")]
        spec_or_path: PathBuf,
    },

    /// Create a tag for a finished build in its source repository
    PublishTag {
        #[arg(long, help = "Package name of the build")]
        name: String,

        #[arg(long, default_value_t = 0, help = "Epoch of the build")]
        epoch: u64,

        #[arg(long, help = "Version of the build")]
        version: String,

        #[arg(long, help = "Release of the build")]
        release: String,

        #[arg(long, help = "Source URL the build was made from")]
        source: Option<String>,

        #[arg(short, long, help = "Custom configuration file path")]
        config: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::GenerateChangelog {
            spec_or_path,
            error_on_unparseable_spec,
            pager: use_pager,
        } => {
            let changelog = match cli::produce_changelog(&spec_or_path, error_on_unparseable_spec)
            {
                Ok(changelog) => changelog,
                Err(e) => {
                    ui::display_error(&e.to_string());
                    std::process::exit(1);
                }
            };
            pager::page(&changelog, use_pager);
        }

        Command::CalculateRelease { spec_or_path } => {
            match cli::calculate_release(&spec_or_path) {
                Ok(evr) => println!("{}", evr),
                Err(e) => {
                    ui::display_error(&e.to_string());
                    std::process::exit(1);
                }
            }
        }

        Command::PublishTag {
            name,
            epoch,
            version,
            release,
            source,
            config: config_path,
        } => {
            let config = match config::load_config(config_path.as_deref()) {
                Ok(config) => config,
                Err(e) => {
                    ui::display_error(&e.to_string());
                    std::process::exit(1);
                }
            };
            let build = BuildInfo {
                name,
                epoch,
                version,
                release,
                source,
            };
            // Tagging problems never fail the caller's pipeline.
            match publish::publish_tag(&config.pagure, &build) {
                publish::PublishOutcome::Posted { tag } => {
                    ui::display_success(&format!("Created tag: {}", tag));
                }
                outcome => ui::display_status(&outcome.to_string()),
            }
        }
    }

    Ok(())
}
