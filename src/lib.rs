//! # Topic Crawler
//!
//! An on-demand crawler that gathers topical content from news pages, RSS
//! and Atom feeds and a trending-papers API, scores it against a topic's
//! keywords, removes near-duplicate stories and returns a ranked, bounded
//! result set.
//!
//! ## Architecture
//!
//! 1. **Resolve**: [`registry::TopicRegistry`] maps a topic name or free
//!    text to a configured topic
//! 2. **Fetch**: [`scrapers`] run one strategy per source, concurrently but
//!    bounded, each pacing its own requests
//! 3. **Score**: [`relevance::relevance_score`] rejects weak or excluded
//!    candidates inside each strategy
//! 4. **Rank and dedup**: [`service::CrawlerService`] merges sources, sorts,
//!    removes near-duplicate titles ([`dedup`]) and truncates
//!
//! ## Example
//!
//! ```no_run
//! use topic_crawler::config::ConfigFile;
//! use topic_crawler::http::ReqwestFetcher;
//! use topic_crawler::registry::TopicRegistry;
//! use topic_crawler::service::CrawlerService;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigFile::builtin()?;
//! let registry = TopicRegistry::from_config(&config)?;
//! let fetcher = ReqwestFetcher::new(&config.settings)?;
//! let service = CrawlerService::new(registry, fetcher, config.settings);
//! let result = service.crawl("video games", 10).await;
//! println!("{} items, {} errors", result.total_found, result.error_count);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dedup;
pub mod error;
pub mod http;
pub mod models;
pub mod outputs;
pub mod registry;
pub mod relevance;
pub mod scrapers;
pub mod service;
pub mod similarity;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;
