//! Command-line argument parsing for the Fire_cci fetcher
//!
//! This module defines the CLI structure using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::constants::synthetic::DEFAULT_SEED;

/// Fire_cci Fetcher - Download and summarize ESA Fire_cci burned area grids
#[derive(Parser, Debug)]
#[command(
    name = "fire_cci_fetcher",
    version,
    about = "Download, cache and summarize ESA Fire_cci burned area grids",
    long_about = "Fetches monthly MODIS Fire_cci v5.1 burned area grids from the CEDA archive into a local cache,
then loads them, cuts them to continental regions and reports summary statistics."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Cache directory path
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download one month or a whole year into the cache
    Fetch(FetchArgs),

    /// Summarize a cached month, optionally for one region (needs the `netcdf` feature)
    ///
    /// Reading real grid files requires a build with `--features netcdf`
    /// and the system libnetcdf library. Other builds fail with a "NetCDF
    /// support not compiled in" error; the `demo` command works in every
    /// build.
    Stats(StatsArgs),

    /// Summarize a synthetic month for every continent
    Demo(DemoArgs),

    /// Cache management and verification
    Cache(CacheArgs),

    /// Show product information
    Info(InfoArgs),
}

/// Arguments for the fetch command
#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Year to download
    #[arg(short, long)]
    pub year: i32,

    /// Month to download (1-12); the whole year when omitted
    #[arg(short, long)]
    pub month: Option<u32>,

    /// Download again even if the file is cached
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the stats command
#[derive(Args, Debug, Clone)]
pub struct StatsArgs {
    /// Year of the grid
    #[arg(short, long)]
    pub year: i32,

    /// Month of the grid (1-12)
    #[arg(short, long)]
    pub month: u32,

    /// Region name, e.g. "Africa" or "North America"
    #[arg(short, long)]
    pub region: Option<String>,

    /// Download the grid first if it is not cached
    #[arg(long)]
    pub fetch: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the demo command
#[derive(Args, Debug, Clone)]
pub struct DemoArgs {
    /// Year stamped on the synthetic grid
    #[arg(short, long, default_value = "2022")]
    pub year: i32,

    /// Month stamped on the synthetic grid
    #[arg(short, long, default_value = "6")]
    pub month: u32,

    /// Random seed
    #[arg(short, long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Print the reports as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for cache management
#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache management actions
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cached months
    List,

    /// Verify cached files against their checksums
    Verify,

    /// Show cache statistics and information
    Info,

    /// Remove leftover partial downloads, or everything with --all
    Clean {
        /// Remove all cached files
        #[arg(long)]
        all: bool,
    },
}

/// Arguments for the info command
#[derive(Args, Debug, Clone)]
pub struct InfoArgs {
    /// List the months available for this year
    #[arg(short, long)]
    pub year: Option<i32>,

    /// Print the effective configuration as TOML
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log level forced by the verbosity flags, if any
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }
}

impl FetchArgs {
    /// Check the month range before touching the network
    pub fn validate(&self) -> Result<(), String> {
        match self.month {
            Some(month) if !(1..=12).contains(&month) => {
                Err(format!("Month must be between 1 and 12, got {}", month))
            }
            _ => Ok(()),
        }
    }
}
