//! Fire_cci Fetcher CLI application
//!
//! Command-line interface for downloading ESA Fire_cci burned area grids
//! and summarizing them by continent.

use std::process;

use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use fire_cci_fetcher::cli::{
    handle_cache, handle_demo, handle_fetch, handle_info, handle_stats, Cli, Commands,
};
use fire_cci_fetcher::config::AppConfig;
use fire_cci_fetcher::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        error!("{} error: {}", e.category(), e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    let mut config = AppConfig::load(cli.global.config.clone()).await?;
    if let Some(dir) = &cli.global.cache_dir {
        config.cache.cache_root = Some(dir.clone());
    }

    init_logging(&cli, &config);

    info!("Fire_cci Fetcher v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Fetch(args) => {
            info!("Executing fetch command");
            handle_fetch(args, &config).await
        }
        Commands::Stats(args) => {
            info!("Executing stats command");
            handle_stats(args, &config).await
        }
        Commands::Demo(args) => {
            info!("Executing demo command");
            handle_demo(args).await
        }
        Commands::Cache(args) => {
            info!("Executing cache command");
            handle_cache(args, &config).await
        }
        Commands::Info(args) => {
            info!("Executing info command");
            handle_info(args, &config).await
        }
    }
}

/// Initialize logging from the verbosity flags, falling back to the config level
fn init_logging(cli: &Cli, config: &AppConfig) {
    let level = cli
        .log_level()
        .map(|level| level.to_string().to_lowercase())
        .unwrap_or_else(|| config.logging.level.clone());

    let mut filter = EnvFilter::from_default_env();
    match format!("fire_cci_fetcher={}", level).parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(_) => eprintln!("Ignoring invalid log level: {}", level),
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
