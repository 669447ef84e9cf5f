//! Coherence Field CLI
//!
//! In-process driver for the coherence field engine. Everything runs inside
//! this process; the only output surface is ND-JSON on stdout, with all
//! logging on stderr so streams stay machine-readable.
//!
//! # Commands
//!
//! - `run`: drive the live tick loop and stream each published state
//! - `perturb`: displace the field and report the measured return time
//! - `sweep`: find the noise configuration with the fastest recovery
//! - `status`: settle briefly and print the current state plus balance

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

/// Coherence Field - attractor dynamics and recovery measurement
#[derive(Parser)]
#[command(name = "coherence-field")]
#[command(version = "0.1.0")]
#[command(about = "Drive the coherence field engine and stream its states")]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML configuration file (defaults to layered loading)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive the live loop and print one JSON line per published state
    Run(commands::run::RunArgs),
    /// Displace the field and measure the return time
    Perturb(commands::perturb::PerturbArgs),
    /// Sweep noise candidates for the fastest average recovery
    Sweep(commands::sweep::SweepArgs),
    /// Print the settled field state and balance report
    Status(commands::status::StatusArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logging goes to stderr only; stdout carries the ND-JSON stream.
    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match cli.command {
        Commands::Run(args) => commands::run::handle_run(args, cli.config.as_deref()).await,
        Commands::Perturb(args) => {
            commands::perturb::handle_perturb(args, cli.config.as_deref()).await
        }
        Commands::Sweep(args) => commands::sweep::handle_sweep(args, cli.config.as_deref()).await,
        Commands::Status(args) => {
            commands::status::handle_status(args, cli.config.as_deref()).await
        }
    };

    std::process::exit(exit_code);
}
