//! Command handlers for the Fire_cci fetcher CLI
//!
//! This module implements the command handlers that connect CLI arguments
//! to the library pipeline. Handlers print their results; the library
//! itself only logs.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::app::cache::format_bytes;
use crate::app::{
    aggregate, available_months, load, subset, synthesize, CacheStore, FireCciClient,
    GridDataset, Region, StatisticsReport, YearMonth, FIRE_CCI_PRODUCT,
};
use crate::cli::{CacheAction, CacheArgs, DemoArgs, FetchArgs, InfoArgs, StatsArgs};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Handle the fetch command
pub async fn handle_fetch(args: FetchArgs, config: &AppConfig) -> Result<()> {
    args.validate().map_err(AppError::generic)?;
    let client = build_client(config).await?;
    let start = Instant::now();

    if let Some(month) = args.month {
        let spinner = spinner(format!("Fetching {}-{:02}...", args.year, month));
        let result = client.fetch(args.year, month, args.force).await;
        spinner.finish_and_clear();

        let path = result?;
        println!("✅ {}-{:02}: {}", args.year, month, path.display());
        return Ok(());
    }

    if available_months(args.year).is_empty() {
        return Err(AppError::generic(format!(
            "No data for {}: the product covers {}",
            args.year,
            FIRE_CCI_PRODUCT.time_range()
        )));
    }

    let spinner = spinner(format!(
        "Fetching 12 months of {} ({} at a time)...",
        args.year,
        client.config().concurrency
    ));
    let results = client.fetch_year(args.year, args.force).await;
    spinner.finish_and_clear();

    let mut failed = 0;
    for (key, result) in &results {
        match result {
            Ok(path) => println!("✅ {}: {}", key, path.display()),
            Err(e) => {
                failed += 1;
                println!("❌ {}: {}", key, e);
            }
        }
    }

    println!();
    println!("📊 Fetch Summary:");
    println!("  Months: {}", results.len());
    println!("  Succeeded: {}", results.len() - failed);
    println!("  Failed: {}", failed);
    println!("  Time: {:.1}s", start.elapsed().as_secs_f64());

    if failed > 0 {
        return Err(AppError::generic(format!(
            "{} of {} downloads failed",
            failed,
            results.len()
        )));
    }
    Ok(())
}

/// Output record of the stats command
#[derive(Serialize)]
struct RegionReport<'a> {
    month: String,
    region: &'a str,
    statistics: StatisticsReport,
}

/// Handle the stats command
pub async fn handle_stats(args: StatsArgs, config: &AppConfig) -> Result<()> {
    let key = YearMonth::new(args.year, args.month)?;
    let client = build_client(config).await?;

    let path = if client.cache().exists(&key) {
        client.cache().path_for(&key)
    } else if args.fetch {
        let spinner = spinner(format!("Fetching {}...", key));
        let result = client.fetch_key(key, false).await;
        spinner.finish_and_clear();
        result?
    } else {
        return Err(AppError::generic(format!(
            "{} is not cached. Run `fire_cci_fetcher fetch --year {} --month {}` or pass --fetch",
            key, args.year, args.month
        )));
    };

    let dataset = tokio::task::spawn_blocking(move || load(&path))
        .await
        .map_err(|e| AppError::generic(format!("Loader task failed: {}", e)))??;

    let (dataset, region_name) = match args.region.as_deref() {
        Some(name) => (subset(&dataset, name)?, name),
        None => (dataset, "Global"),
    };

    let report = RegionReport {
        month: key.to_string(),
        region: region_name,
        statistics: aggregate(&dataset),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("🔥 Burned Area Statistics: {} ({})", report.month, report.region);
        println!("==========================================");
        print_report(&report.statistics);
    }
    Ok(())
}

/// Handle the demo command
pub async fn handle_demo(args: DemoArgs) -> Result<()> {
    let (year, month, seed) = (args.year, args.month, args.seed);

    let spinner = spinner("Generating synthetic global grid...".to_string());
    let dataset = tokio::task::spawn_blocking(move || synthesize(year, month, seed))
        .await
        .map_err(|e| AppError::generic(format!("Generator task failed: {}", e)))??;
    spinner.finish_and_clear();

    let reports = regional_reports(&dataset);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    println!("🧪 Synthetic Fire_cci grid for {} (seed {})", dataset.time().format("%Y-%m"), seed);
    println!("   Values are simulated, not observations.");
    println!();
    for (region, report) in &reports {
        println!("🌍 {}", region);
        print_report(report);
        println!();
    }
    Ok(())
}

/// Statistics for every predefined region
pub fn regional_reports(dataset: &GridDataset) -> BTreeMap<&'static str, StatisticsReport> {
    Region::all()
        .iter()
        .map(|region| {
            let report = aggregate(&crate::app::subset_region(dataset, region));
            debug!("{}: {} cells", region.name, report.total_cells);
            (region.name, report)
        })
        .collect()
}

fn print_report(report: &StatisticsReport) {
    for (name, value) in report.to_map() {
        if value.fract() == 0.0 && value.abs() < 1e15 {
            println!("  {:<24} {}", name, value as i64);
        } else {
            println!("  {:<24} {:.6}", name, value);
        }
    }
}

/// Handle cache management commands
pub async fn handle_cache(args: CacheArgs, config: &AppConfig) -> Result<()> {
    let cache = open_cache(config).await?;
    match args.action {
        CacheAction::List => handle_cache_list(&cache).await,
        CacheAction::Verify => handle_cache_verify(&cache).await,
        CacheAction::Info => handle_cache_info(&cache).await,
        CacheAction::Clean { all } => handle_cache_clean(&cache, all).await,
    }
}

async fn handle_cache_list(cache: &CacheStore) -> Result<()> {
    let entries = cache.entries().await;
    if entries.is_empty() {
        println!("ℹ️  No cached months in {}", cache.cache_root().display());
        return Ok(());
    }

    println!("📦 Cached months ({})", entries.len());
    for key in entries {
        let size = tokio::fs::metadata(cache.path_for(&key))
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        println!("  {}  {:>10}", key, format_bytes(size));
    }
    Ok(())
}

async fn handle_cache_verify(cache: &CacheStore) -> Result<()> {
    println!("🔍 Cache Verification");
    println!("====================");

    let spinner = spinner("Checking file digests...".to_string());
    let report = cache.verify_all().await?;
    spinner.finish_and_clear();

    println!("Files checked: {}", report.files_checked);
    println!("Verified: {}", report.files_verified);
    println!("Without checksum: {}", report.files_without_sidecar);
    println!("Failed: {}", report.files_failed);
    println!(
        "Verification time: {:.2}s",
        report.verification_time.as_secs_f64()
    );

    if report.is_successful() {
        println!();
        println!("✅ All cached files verified successfully!");
        return Ok(());
    }

    println!();
    println!("⚠️  Corrupted Files:");
    for failure in &report.failed_files {
        println!("  {}: {}", failure.key, failure.reason);
    }
    println!();
    println!("💡 Re-download them with `fire_cci_fetcher fetch --force`.");

    Err(AppError::generic(format!(
        "Cache verification found {} corrupted files",
        report.files_failed
    )))
}

async fn handle_cache_info(cache: &CacheStore) -> Result<()> {
    let stats = cache.stats().await;

    println!("💾 Cache Information");
    println!("===================");
    println!("Location: {}", stats.cache_root.display());
    println!("Cached files: {}", stats.cached_files_count);
    println!("Cache size: {}", stats.format_cache_size());
    println!("Partial downloads: {}", stats.partial_files_count);
    Ok(())
}

async fn handle_cache_clean(cache: &CacheStore, all: bool) -> Result<()> {
    println!("🧹 Cache Cleanup");
    println!("===============");

    let partial = cache.remove_partial_files().await?;
    println!("🗑️  Removed {} partial downloads", partial);

    if all {
        let mut removed = 0;
        for key in cache.entries().await {
            if cache.remove(&key).await? {
                removed += 1;
            }
        }
        println!("🗑️  Removed {} cached months", removed);
    }
    Ok(())
}

/// Handle the info command
pub async fn handle_info(args: InfoArgs, config: &AppConfig) -> Result<()> {
    let product = FIRE_CCI_PRODUCT;

    println!("🛰️  {}", product.product);
    println!("Version: {}", product.version);
    println!("Spatial resolution: {}", product.spatial_resolution);
    println!("Temporal resolution: {}", product.temporal_resolution);
    println!("Coverage: {}", product.time_range());
    println!("License: {}", product.license);
    println!("DOI: {}", product.doi);
    println!("Archive: {}", config.client.base_url);

    if let Some(year) = args.year {
        let months = available_months(year);
        println!();
        if months.is_empty() {
            println!("No months available for {}", year);
        } else {
            let list: Vec<String> = months.iter().map(|m| format!("{:02}", m)).collect();
            println!("Months available for {}: {}", year, list.join(" "));
        }
    }

    if args.show_config {
        println!();
        println!("# Effective configuration");
        print!("{}", config.to_toml());
    }
    Ok(())
}

async fn open_cache(config: &AppConfig) -> Result<Arc<CacheStore>> {
    let (cache_config, _, _) = config.to_runtime_config()?;
    let cache = CacheStore::new(cache_config).await?;
    Ok(Arc::new(cache))
}

async fn build_client(config: &AppConfig) -> Result<FireCciClient> {
    let (cache_config, client_config, resolver) = config.to_runtime_config()?;
    let cache = Arc::new(CacheStore::new(cache_config).await?);

    info!(
        "Using cache {} and archive {}",
        cache.cache_root().display(),
        resolver.base_url()
    );
    if client_config.concurrency > crate::constants::workers::DEFAULT_CONCURRENCY * 2 {
        warn!(
            "High concurrency ({}) may be throttled by the archive",
            client_config.concurrency
        );
    }

    Ok(FireCciClient::with_config(cache, resolver, client_config)?)
}

fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style.tick_strings(&["◐", "◓", "◑", "◒", "✓"]));
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::synthesize_on;
    use ndarray::Array1;

    #[test]
    fn test_regional_reports_cover_all_regions() {
        let dataset = synthesize_on(
            Array1::range(-40.0, 41.0, 1.0),
            Array1::range(-30.0, 70.0, 1.0),
            2022,
            6,
            1,
        )
        .unwrap();

        let reports = regional_reports(&dataset);
        assert_eq!(reports.len(), 5);
        // Africa is fully inside the synthetic window
        assert_eq!(reports["Africa"].total_cells, 76 * 76);
        assert_eq!(reports["North America"].total_cells, 0);
    }

    #[tokio::test]
    async fn test_cache_commands_on_empty_cache() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.cache.cache_root = Some(temp_dir.path().to_path_buf());

        for action in [
            CacheAction::List,
            CacheAction::Verify,
            CacheAction::Info,
            CacheAction::Clean { all: true },
        ] {
            handle_cache(CacheArgs { action }, &config).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_stats_requires_cached_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.cache.cache_root = Some(temp_dir.path().to_path_buf());

        let args = StatsArgs {
            year: 2022,
            month: 6,
            region: None,
            fetch: false,
            json: false,
        };
        let result = handle_stats(args, &config).await;
        assert!(matches!(result, Err(AppError::Generic { .. })));
    }
}
