//! # Topic Crawler
//!
//! Command-line front end for the topic crawler engine. Every subcommand
//! prints JSON to stdout; logs go to stderr so the output can be piped.
//!
//! ## Usage
//!
//! ```sh
//! topic_crawler topics
//! topic_crawler crawl gaming_news -m 20 -j ./json
//! RUST_LOG=topic_crawler=debug topic_crawler test-source "PC Gamer"
//! ```

use clap::Parser;
use serde::Serialize;
use std::error::Error;
use topic_crawler::config::ConfigFile;
use topic_crawler::http::ReqwestFetcher;
use topic_crawler::models::CrawlerResult;
use topic_crawler::outputs::json;
use topic_crawler::registry::TopicRegistry;
use topic_crawler::service::CrawlerService;
use topic_crawler::utils::ensure_writable_dir;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;

use cli::{Cli, Command};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();

    let args = Cli::parse();
    debug!(?args.command, ?args.config, "Parsed CLI arguments");

    // Early check: ensure JSON output dir is writable
    if let Some(dir) = &args.json_output_dir {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "JSON output directory is not writable");
            return Err(e);
        }
    }

    let config = ConfigFile::load_or_builtin(args.config.as_deref()).await?;
    let registry = TopicRegistry::from_config(&config)?;
    let mut settings = config.settings;
    if let Some(n) = args.max_concurrent {
        settings.max_concurrent_sources = usize::from(n);
    }
    if let Command::Crawl { timeout: Some(secs), .. } = &args.command {
        settings.request_timeout_secs = *secs;
    }
    info!(
        topics = registry.configs().len(),
        max_concurrent = settings.max_concurrent_sources,
        timeout_secs = settings.request_timeout_secs,
        "Loaded configuration"
    );

    match args.command {
        Command::Topics => print_json(&registry.topics())?,
        Command::Configs => print_json(&registry.summaries())?,
        Command::Stats => print_json(&registry.stats())?,
        Command::Crawl { topic, max_articles, .. } => {
            let fetcher = ReqwestFetcher::new(&settings)?;
            let service = CrawlerService::new(registry, fetcher, settings);
            let result = service.crawl(&topic, usize::from(max_articles)).await;
            emit_result(&result, args.json_output_dir.as_deref()).await?;
        }
        Command::Search { query, max_articles } => {
            let fetcher = ReqwestFetcher::new(&settings)?;
            let service = CrawlerService::new(registry, fetcher, settings);
            let result = service.crawl(&query, usize::from(max_articles)).await;
            emit_result(&result, args.json_output_dir.as_deref()).await?;
        }
        Command::TestSource { name } => {
            let fetcher = ReqwestFetcher::new(&settings)?;
            let service = CrawlerService::new(registry, fetcher, settings);
            let report = service.test_source(&name).await?;
            print_json(&report)?;
        }
    }

    let elapsed = start_time.elapsed();
    info!(?elapsed, secs = elapsed.as_secs(), millis = elapsed.subsec_millis(), "Execution complete");
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a crawl result and, when asked, keep a JSON copy on disk.
async fn emit_result(
    result: &CrawlerResult,
    json_output_dir: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    info!(
        topic = %result.topic,
        total_found = result.total_found,
        sources_used = ?result.sources_used,
        error_count = result.error_count,
        "Crawl finished"
    );
    print_json(result)?;
    if let Some(dir) = json_output_dir {
        if let Err(e) = json::write_result(result, dir).await {
            error!(error = %e, "Failed to write JSON result");
        }
    }
    Ok(())
}
