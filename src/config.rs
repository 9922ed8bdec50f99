//! Crawler settings and config-file loading.
//!
//! A config file is YAML with an optional `settings` block and a `topics`
//! list:
//!
//! ```yaml
//! settings:
//!   max_concurrent_sources: 5
//!   request_timeout_secs: 30
//! topics:
//!   - topic: gaming_news
//!     keywords: [gaming, esports]
//!     sources:
//!       - name: Example
//!         base_url: https://news.example/rss.xml
//!         content_type: news
//! ```
//!
//! The built-in table ships as `config/topics.yaml` and is compiled into the
//! binary; `--config` (or `TOPIC_CRAWLER_CONFIG`) replaces it wholesale.

use crate::error::ConfigError;
use crate::models::TopicCrawlerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

pub const DEFAULT_USER_AGENT: &str = "TopicCrawler/0.1 (Educational Content Aggregator)";

const BUILTIN_CONFIG: &str = include_str!("../config/topics.yaml");

/// Minimum relevance score a candidate needs, per strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Full articles scored on title plus extracted body.
    pub article: f64,
    /// Feed entries scored on title plus summary.
    pub feed: f64,
    /// Papers scored on title plus abstract.
    pub paper: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            article: 0.2,
            feed: 0.3,
            paper: 0.3,
        }
    }
}

/// Runtime knobs for a crawl.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerSettings {
    /// Upper bound on sources crawled at the same time.
    pub max_concurrent_sources: usize,
    /// Total timeout for each HTTP request.
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub thresholds: Thresholds,
    /// Extracted bodies shorter than this (in characters) are not articles.
    pub min_article_chars: usize,
    pub summary_chars: usize,
    /// Title similarity at or above which two items are the same story.
    pub duplicate_threshold: f64,
    /// Drop items published before `freshness_hours` ago.
    pub enforce_freshness: bool,
}

impl Default for CrawlerSettings {
    fn default() -> Self {
        Self {
            max_concurrent_sources: 5,
            request_timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            thresholds: Thresholds::default(),
            min_article_chars: 100,
            summary_chars: 300,
            duplicate_threshold: 0.8,
            enforce_freshness: false,
        }
    }
}

impl CrawlerSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidTopic {
            topic: "settings".to_string(),
            reason: reason.to_string(),
        };
        if self.max_concurrent_sources == 0 {
            return Err(invalid("max_concurrent_sources must be at least 1"));
        }
        if self.request_timeout_secs == 0 {
            return Err(invalid("request_timeout_secs must be at least 1"));
        }
        let t = self.thresholds;
        if [t.article, t.feed, t.paper, self.duplicate_threshold]
            .iter()
            .any(|v| !(0.0..=1.0).contains(v))
        {
            return Err(invalid("thresholds must lie in [0, 1]"));
        }
        Ok(())
    }
}

/// Parsed contents of a config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub settings: CrawlerSettings,
    pub topics: Vec<TopicCrawlerConfig>,
}

impl ConfigFile {
    /// The topic table compiled into the crate.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_yaml(BUILTIN_CONFIG)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_yaml::from_str(yaml)?;
        file.settings.validate()?;
        Ok(file)
    }

    #[instrument(level = "info")]
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let yaml = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let file = Self::from_yaml(&yaml)?;
        info!(topics = file.topics.len(), "Loaded crawler config");
        Ok(file)
    }

    /// Loads `path` when given, otherwise the built-in table.
    pub async fn load_or_builtin(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path).await,
            None => Self::builtin(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_config_loads() {
        let file = ConfigFile::builtin().unwrap();
        assert_eq!(file.settings, CrawlerSettings::default());
        assert!(file.topics.iter().any(|t| t.topic == "gaming_news"));
        assert!(file.topics.iter().any(|t| t.topic == "research_deep_learning"));
    }

    #[test]
    fn test_partial_settings_use_defaults() {
        let yaml = "settings:\n  max_concurrent_sources: 2\n  thresholds:\n    feed: 0.25\ntopics: []\n";
        let file = ConfigFile::from_yaml(yaml).unwrap();
        assert_eq!(file.settings.max_concurrent_sources, 2);
        assert_eq!(file.settings.thresholds.feed, 0.25);
        assert_eq!(file.settings.thresholds.article, 0.2);
        assert_eq!(file.settings.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let yaml = "settings:\n  max_concurrent_sources: 0\ntopics: []\n";
        assert!(ConfigFile::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_out_of_range_threshold_rejected() {
        let yaml = "settings:\n  duplicate_threshold: 1.5\ntopics: []\n";
        assert!(ConfigFile::from_yaml(yaml).is_err());
    }

    #[tokio::test]
    async fn test_missing_file_reports_path() {
        let err = ConfigFile::load(Path::new("/nonexistent/topics.yaml"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/topics.yaml"));
    }
}
