// CLI module for handling command-line interface

use ccpkg::constants;
use ccpkg::platform::Platform;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ccpkg")]
#[command(about = "Resolve the Creative Cloud product catalog and download offline package sets")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to a ccpkg.toml config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List products available for a platform
    List {
        #[arg(long, value_enum)]
        platform: Platform,
        /// Include products hidden from the platform listing
        #[arg(long)]
        all: bool,
    },
    /// Show the versions of a product, newest first
    Versions {
        #[arg(long, value_enum)]
        platform: Platform,
        sap_code: String,
    },
    /// Download a product version and its dependencies
    Download {
        #[arg(long, value_enum)]
        platform: Platform,
        #[arg(long)]
        sap_code: String,
        #[arg(long)]
        version: String,
        #[arg(long, default_value = constants::DEFAULT_LANGUAGE)]
        language: String,
        #[arg(long, value_name = "DIR")]
        destination: PathBuf,
        /// Print the download plan without fetching any package
        #[arg(long)]
        dry_run: bool,
        /// Skip writing driver.xml
        #[arg(long)]
        no_driver: bool,
        /// Number of products downloaded at the same time
        #[arg(long, short = 'j')]
        jobs: Option<usize>,
    },
}
