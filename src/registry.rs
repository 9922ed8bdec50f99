//! The table of supported topics and free-text topic resolution.
//!
//! A caller may name a topic loosely. [`TopicRegistry::resolve`] tries, in
//! order:
//!
//! | Tier | Match | Example input |
//! |------|-------|---------------|
//! | [`MatchKind::Exact`] | the topic key itself | `gaming_news` |
//! | [`MatchKind::Keyword`] | some topic keyword occurs in the input (case-insensitive) | `Video Games this week` |
//! | [`MatchKind::Fuzzy`] | best topic-key similarity above `0.5` | `gamng_news` |
//!
//! The keyword tier scans topics in table order and returns the first hit.

use crate::config::ConfigFile;
use crate::error::ConfigError;
use crate::models::{ContentType, CrawlerSource, StrategyKind, TopicCrawlerConfig};
use crate::similarity::TextSimilarity;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};
use url::Url;

/// Similarity a topic key must exceed to be picked by fuzzy matching.
pub const FUZZY_MATCH_THRESHOLD: f64 = 0.5;

/// How a free-text topic was matched to a configured one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Keyword,
    Fuzzy,
}

#[derive(Debug, Clone, Copy)]
pub struct Resolution<'a> {
    pub config: &'a TopicCrawlerConfig,
    pub matched_by: MatchKind,
}

/// Immutable, validated set of topic configurations.
#[derive(Debug, Clone)]
pub struct TopicRegistry {
    topics: Vec<TopicCrawlerConfig>,
}

impl TopicRegistry {
    /// Rejects duplicate topic keys and topics without keywords or sources.
    pub fn new(topics: Vec<TopicCrawlerConfig>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for topic in &topics {
            let invalid = |reason: &str| ConfigError::InvalidTopic {
                topic: topic.topic.clone(),
                reason: reason.to_string(),
            };
            if topic.topic.trim().is_empty() {
                return Err(invalid("topic key must not be empty"));
            }
            if !seen.insert(topic.topic.as_str()) {
                return Err(invalid("defined more than once"));
            }
            if topic.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(invalid("needs at least one keyword"));
            }
            if topic.sources.is_empty() {
                return Err(invalid("needs at least one source"));
            }
        }
        Ok(Self { topics })
    }

    pub fn from_config(file: &ConfigFile) -> Result<Self, ConfigError> {
        Self::new(file.topics.clone())
    }

    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_config(&ConfigFile::builtin()?)
    }

    /// Topic keys in table order.
    pub fn topics(&self) -> Vec<&str> {
        self.topics.iter().map(|t| t.topic.as_str()).collect()
    }

    pub fn configs(&self) -> &[TopicCrawlerConfig] {
        &self.topics
    }

    pub fn get(&self, topic: &str) -> Option<&TopicCrawlerConfig> {
        self.topics.iter().find(|t| t.topic == topic)
    }

    /// Resolve a possibly free-text topic to a configuration.
    pub fn resolve(
        &self,
        topic: &str,
        metric: &dyn TextSimilarity,
    ) -> Result<Resolution<'_>, ConfigError> {
        if let Some(config) = self.get(topic) {
            return Ok(Resolution { config, matched_by: MatchKind::Exact });
        }

        let wanted = topic.to_lowercase();

        let by_keyword = self.topics.iter().find(|t| {
            t.keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .any(|k| !k.is_empty() && wanted.contains(&k))
        });
        if let Some(config) = by_keyword {
            info!(requested = topic, resolved = %config.topic, "Resolved topic by keyword");
            return Ok(Resolution { config, matched_by: MatchKind::Keyword });
        }

        let mut best: Option<(&TopicCrawlerConfig, f64)> = None;
        for config in &self.topics {
            let score = metric.similarity(&wanted, &config.topic.to_lowercase());
            debug!(candidate = %config.topic, score, "Fuzzy topic candidate");
            if score > FUZZY_MATCH_THRESHOLD && best.is_none_or(|(_, s)| score > s) {
                best = Some((config, score));
            }
        }
        match best {
            Some((config, score)) => {
                info!(requested = topic, resolved = %config.topic, score, "Resolved topic by similarity");
                Ok(Resolution { config, matched_by: MatchKind::Fuzzy })
            }
            None => Err(ConfigError::TopicNotFound(topic.to_string())),
        }
    }

    /// Find a source by name (case-insensitive) together with its topic.
    pub fn find_source(
        &self,
        name: &str,
    ) -> Result<(&TopicCrawlerConfig, &CrawlerSource), ConfigError> {
        self.topics
            .iter()
            .flat_map(|t| t.sources.iter().map(move |s| (t, s)))
            .find(|(_, s)| s.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| ConfigError::SourceNotFound(name.to_string()))
    }

    pub fn summaries(&self) -> Vec<TopicSummary> {
        self.topics.iter().map(TopicSummary::from).collect()
    }

    pub fn stats(&self) -> CrawlerStats {
        CrawlerStats {
            total_topics: self.topics.len(),
            total_sources: self.topics.iter().map(|t| t.sources.len()).sum(),
            topics: self
                .topics
                .iter()
                .map(|t| {
                    let stats = TopicStats {
                        sources_count: t.sources.len(),
                        keywords: t.keywords.clone(),
                        max_articles: t.max_articles,
                    };
                    (t.topic.clone(), stats)
                })
                .collect(),
        }
    }
}

/// Public view of one topic's configuration.
#[derive(Debug, Clone, Serialize)]
pub struct TopicSummary {
    pub topic: String,
    pub keywords: Vec<String>,
    pub exclude_keywords: Vec<String>,
    pub max_articles: usize,
    pub freshness_hours: u32,
    pub sources: Vec<SourceSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub name: String,
    pub base_url: Url,
    pub content_type: ContentType,
    pub strategy: StrategyKind,
}

impl From<&TopicCrawlerConfig> for TopicSummary {
    fn from(config: &TopicCrawlerConfig) -> Self {
        Self {
            topic: config.topic.clone(),
            keywords: config.keywords.clone(),
            exclude_keywords: config.exclude_keywords.clone(),
            max_articles: config.max_articles,
            freshness_hours: config.freshness_hours,
            sources: config
                .sources
                .iter()
                .map(|s| SourceSummary {
                    name: s.name.clone(),
                    base_url: s.base_url.clone(),
                    content_type: s.content_type,
                    strategy: s.strategy(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CrawlerStats {
    pub total_topics: usize,
    pub total_sources: usize,
    pub topics: BTreeMap<String, TopicStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicStats {
    pub sources_count: usize,
    pub keywords: Vec<String>,
    pub max_articles: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::SequenceRatio;
    use crate::testing::{feed_source, topic, web_source};

    fn registry() -> TopicRegistry {
        TopicRegistry::new(vec![
            topic(
                "gaming_news",
                &["gaming", "video games", "esports"],
                &["casino"],
                vec![web_source("IGN", "https://ign.test/"), feed_source("Kotaku", "https://kotaku.test/rss")],
            ),
            topic(
                "climate_environment",
                &["carbon emissions", "renewable energy"],
                &[],
                vec![web_source("Climate Desk", "https://climate.test/")],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_resolve_exact() {
        let reg = registry();
        let r = reg.resolve("gaming_news", &SequenceRatio).unwrap();
        assert_eq!(r.config.topic, "gaming_news");
        assert_eq!(r.matched_by, MatchKind::Exact);
    }

    #[test]
    fn test_resolve_keyword_is_case_insensitive() {
        let reg = registry();
        let r = reg.resolve("Best VIDEO GAMES of the year", &SequenceRatio).unwrap();
        assert_eq!(r.config.topic, "gaming_news");
        assert_eq!(r.matched_by, MatchKind::Keyword);
    }

    #[test]
    fn test_resolve_fuzzy_picks_closest_topic() {
        let reg = registry();
        let r = reg.resolve("Climate_Enviroment", &SequenceRatio).unwrap();
        assert_eq!(r.config.topic, "climate_environment");
        assert_eq!(r.matched_by, MatchKind::Fuzzy);
    }

    #[test]
    fn test_resolve_unknown_topic() {
        let reg = registry();
        let err = reg.resolve("xyzzy", &SequenceRatio).unwrap_err();
        assert_eq!(err.to_string(), "no crawler configuration for topic: xyzzy");
    }

    #[test]
    fn test_resolve_builtin_free_text() {
        let reg = TopicRegistry::builtin().unwrap();
        let r = reg.resolve("video games", &SequenceRatio).unwrap();
        assert_eq!(r.config.topic, "gaming_news");
    }

    #[test]
    fn test_new_rejects_duplicate_topics() {
        let t = topic("dup", &["a"], &[], vec![web_source("A", "https://a.test/")]);
        let err = TopicRegistry::new(vec![t.clone(), t]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTopic { .. }));
    }

    #[test]
    fn test_new_rejects_topic_without_sources() {
        let err = TopicRegistry::new(vec![topic("empty", &["a"], &[], vec![])]).unwrap_err();
        assert!(err.to_string().contains("at least one source"));
    }

    #[test]
    fn test_find_source_ignores_case() {
        let reg = registry();
        let (topic, source) = reg.find_source("kotaku").unwrap();
        assert_eq!(topic.topic, "gaming_news");
        assert_eq!(source.name, "Kotaku");
        assert!(matches!(reg.find_source("nope"), Err(ConfigError::SourceNotFound(_))));
    }

    #[test]
    fn test_summaries_and_stats() {
        let reg = registry();
        let summaries = reg.summaries();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].sources[1].strategy, StrategyKind::Feed);

        let stats = reg.stats();
        assert_eq!(stats.total_topics, 2);
        assert_eq!(stats.total_sources, 3);
        assert_eq!(stats.topics["gaming_news"].sources_count, 2);
        assert_eq!(reg.topics(), ["gaming_news", "climate_environment"]);
    }
}
