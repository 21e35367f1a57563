//! Command-line interface components
//!
//! This module contains CLI-specific code for the Fire_cci fetcher,
//! namely argument parsing and the command handlers that print results.

pub mod args;
pub mod commands;

pub use args::{
    CacheAction, CacheArgs, Cli, Commands, DemoArgs, FetchArgs, GlobalArgs, InfoArgs, StatsArgs,
};
pub use commands::{
    handle_cache, handle_demo, handle_fetch, handle_info, handle_stats, regional_reports,
};
