//! Command-line interface definitions for Topic Crawler.
//!
//! This module defines the CLI arguments and subcommands using the `clap`
//! crate. Global options may appear before or after the subcommand.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the Topic Crawler application.
///
/// # Examples
///
/// ```sh
/// # List the topics the built-in table supports
/// topic_crawler topics
///
/// # Crawl a topic and keep a JSON copy of the result
/// topic_crawler crawl gaming_news --max-articles 20 -j ./json
///
/// # Free-text search through the topic resolver
/// topic_crawler search "video games"
///
/// # Use a custom topic table
/// TOPIC_CRAWLER_CONFIG=./topics.yaml topic_crawler stats
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a topics YAML file replacing the built-in table
    #[arg(short, long, env = "TOPIC_CRAWLER_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Maximum number of sources crawled at the same time
    #[arg(long, global = true, value_parser = clap::value_parser!(u16).range(1..=64))]
    pub max_concurrent: Option<u16>,

    /// Also write crawl results as JSON under this directory
    #[arg(short, long, global = true)]
    pub json_output_dir: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// List supported topics
    Topics,

    /// Show each topic's keywords and sources
    Configs,

    /// Crawl content for a topic
    Crawl {
        /// Topic key, or free text resolved to the closest topic
        topic: String,

        /// Maximum number of items to return
        #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(1..=50))]
        max_articles: u16,

        /// Per-request timeout in seconds (overrides the config file)
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(10..=120))]
        timeout: Option<u64>,
    },

    /// Crawl whichever topic best matches a free-text query
    Search {
        #[arg(value_parser = parse_query)]
        query: String,

        /// Maximum number of items to return
        #[arg(short, long, default_value_t = 5, value_parser = clap::value_parser!(u16).range(1..=20))]
        max_articles: u16,
    },

    /// Crawl a single named source and report what it yields
    TestSource {
        /// Source name, case-insensitive
        name: String,
    },

    /// Topic and source counts
    Stats,
}

fn parse_query(raw: &str) -> Result<String, String> {
    let query = raw.trim();
    if query.chars().count() < 2 {
        return Err("query must be at least 2 characters".to_string());
    }
    Ok(query.to_string())
}
