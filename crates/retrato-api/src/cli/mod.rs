//! CLI command definitions for the `retrato` binary.
//!
//! Uses clap derive macros for argument parsing. `serve` runs the HTTP API;
//! `check` sends one request to each configured provider and reports.

pub mod check;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Run the Samantha interview assistant.
#[derive(Parser)]
#[command(name = "retrato", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the TOML config file (defaults to $RETRATO_CONFIG or ./retrato.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Also export spans through the OpenTelemetry stdout exporter.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API and static file server.
    Serve {
        /// Port to listen on (overrides config).
        #[arg(long, env = "PORT")]
        port: Option<u16>,

        /// Host to bind to (overrides config).
        #[arg(long)]
        host: Option<String>,
    },

    /// Test connectivity to each configured provider.
    Check,
}

impl Cli {
    /// Default log filter for the chosen verbosity; `RUST_LOG` still wins.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 if self.quiet => "error",
            0 => "info",
            1 => "info,retrato=debug,retrato_core=debug,retrato_infra=debug",
            _ => "trace",
        }
    }
}
