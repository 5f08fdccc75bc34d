//! pairgate CLI: config digests, one-shot deploys, and journal inspection.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{attest, deploy, digest, list, verify};

#[derive(Parser)]
#[command(name = "pairgate")]
#[command(about = "Owner-gated provisioning of pricing-curve and token pairs")]
struct Cli {
    /// Log filter directive, e.g. `info` or `pairgate_core=debug`
    #[arg(long, global = true, env = "PAIRGATE_LOG", default_value = "info")]
    log: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the V1 digest of a configuration
    Digest {
        /// Configuration JSON file
        config: PathBuf,
        /// Output the digest as JSON
        #[arg(long)]
        json: bool,
    },
    /// Sign an attestation approving a configuration
    Attest {
        /// Configuration JSON file
        config: PathBuf,
        /// File holding the hex-encoded 32-byte Ed25519 secret key
        #[arg(long)]
        key: PathBuf,
        /// Issuer key id, as listed in `trusted_verifiers`
        #[arg(long)]
        issuer: String,
    },
    /// Deploy one pair from a configuration
    Deploy {
        /// Configuration JSON file
        config: PathBuf,
        /// Factory settings JSON file
        #[arg(long)]
        settings: PathBuf,
        /// Calling principal, e.g. `org:launchpad`
        #[arg(long)]
        caller: String,
        /// Attestation JSON file
        #[arg(long)]
        attestation: Option<PathBuf>,
        /// Journal receiving the audit event (overrides settings)
        #[arg(long)]
        journal: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List events in a journal
    List {
        /// Path to journal file
        journal: PathBuf,
        /// Only events for this token index
        #[arg(long)]
        token: Option<u64>,
        /// Only events for this curve index
        #[arg(long)]
        curve: Option<u64>,
        /// Treat a truncated tail as end of journal
        #[arg(long)]
        permissive: bool,
        /// Output as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Verify every event in a journal
    Verify {
        /// Path to journal file
        journal: PathBuf,
        /// Exit with an error if any record fails
        #[arg(long)]
        strict: bool,
        /// Treat a truncated tail as end of journal
        #[arg(long)]
        permissive: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cli.log))
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Digest { config, json } => digest::run(&config, json),
        Commands::Attest {
            config,
            key,
            issuer,
        } => attest::run(&config, &key, issuer),
        Commands::Deploy {
            config,
            settings,
            caller,
            attestation,
            journal,
            json,
        } => deploy::run(deploy::DeployArgs {
            config,
            settings,
            caller,
            attestation,
            journal,
            json,
        }),
        Commands::List {
            journal,
            token,
            curve,
            permissive,
            json,
        } => list::run(&journal, token, curve, permissive, json),
        Commands::Verify {
            journal,
            strict,
            permissive,
            json,
        } => verify::run(&journal, strict, permissive, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
