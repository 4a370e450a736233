//! Command line interface definition

use clap::{Parser, Subcommand};
use cscan_types::{ColorChoice, Severity};
use std::path::PathBuf;

/// cscan - container image vulnerability scan client
#[derive(Parser)]
#[command(name = "cscan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Scan container images for vulnerabilities through a scan backend")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Scan backend base URL
    #[arg(long, global = true, value_name = "URL")]
    pub backend_url: Option<String>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Scan an image and wait for the result
    Scan {
        /// Image reference, e.g. nginx:latest
        image: String,

        /// Only list vulnerabilities of this severity
        #[arg(short, long, value_enum)]
        severity: Option<Severity>,

        /// Maximum number of vulnerabilities to list
        #[arg(short, long)]
        limit: Option<usize>,

        /// Milliseconds between status polls
        #[arg(long, value_name = "MS")]
        poll_interval_ms: Option<u64>,
    },

    /// Show a report the backend has stored under a name
    Report {
        /// Report name, e.g. nginx-scan
        name: String,

        /// Only list vulnerabilities of this severity
        #[arg(short, long, value_enum)]
        severity: Option<Severity>,

        /// Maximum number of vulnerabilities to list
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// List example images offered by the backend
    #[command(alias = "examples")]
    Catalog,

    /// Compare two images, scanning both side by side
    Compare {
        /// Image (or stored report) to compare against
        baseline: String,

        /// Image (or stored report) expected to be more secure
        candidate: String,

        /// Treat both arguments as stored report names instead of scanning
        #[arg(long)]
        stored: bool,
    },

    /// Check that the scan backend is reachable
    Health,
}
