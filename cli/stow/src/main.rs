//! Stow CLI — publish manifests to content-addressable stores.

mod commands;
mod config;
mod confirmation;

use std::io;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::manifest::PushOptions;
use confirmation::Confirmation;

#[derive(Parser)]
#[command(name = "stow", version, about = "Publish manifests to content-addressable stores")]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file (default: nearest stow.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manifest operations
    Manifest {
        #[command(subcommand)]
        action: ManifestAction,
    },
}

#[derive(Subcommand)]
enum ManifestAction {
    /// Push a manifest, skipping the upload if the reference already points at it
    Push {
        /// Target reference: name[:tag|@digest]
        target: String,
        /// Manifest file
        file: PathBuf,
        /// Media type of the manifest (default: read from the file)
        #[arg(long)]
        media_type: Option<String>,
        /// Print the descriptor instead of a summary
        #[arg(long)]
        descriptor: bool,
        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
        /// Ask for confirmation before pushing
        #[arg(long)]
        confirm: bool,
        /// Do not prompt for confirmation
        #[arg(short, long)]
        yes: bool,
        /// Store root directory (default: from stow.toml, else .stow)
        #[arg(long)]
        store_root: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let (config, config_dir) = config::load_config(&cwd, cli.config.as_deref())?;

    match cli.command {
        Commands::Manifest { action } => match action {
            ManifestAction::Push {
                target,
                file,
                media_type,
                descriptor,
                pretty,
                confirm,
                yes,
                store_root,
            } => {
                let opts = PushOptions {
                    target,
                    file,
                    media_type,
                    descriptor,
                    pretty,
                    confirm,
                    store_root,
                };
                let mut gate = Confirmation::new(yes, io::stdin().lock(), io::stdout());
                commands::manifest::push(
                    &opts,
                    &config,
                    &config_dir,
                    &mut gate,
                    &mut io::stdout().lock(),
                )?;
                Ok(())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_push_arguments() {
        let cli = Cli::try_parse_from([
            "stow",
            "-vv",
            "manifest",
            "push",
            "--media-type",
            "application/vnd.oci.image.manifest.v1+json",
            "--descriptor",
            "--pretty",
            "localhost:5000/hello:latest",
            "manifest.json",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let Commands::Manifest {
            action:
                ManifestAction::Push {
                    target,
                    file,
                    media_type,
                    descriptor,
                    pretty,
                    confirm,
                    yes,
                    ..
                },
        } = cli.command;
        assert_eq!(target, "localhost:5000/hello:latest");
        assert_eq!(file, PathBuf::from("manifest.json"));
        assert_eq!(
            media_type.as_deref(),
            Some("application/vnd.oci.image.manifest.v1+json")
        );
        assert!(descriptor && pretty);
        assert!(!confirm && !yes);
    }

    #[test]
    fn push_requires_target_and_file() {
        assert!(Cli::try_parse_from(["stow", "manifest", "push", "hello:latest"]).is_err());
    }
}
