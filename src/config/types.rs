use crate::document::AttributeVocabulary;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure
///
/// Every section is optional; an empty file yields the reference behaviour
/// (sequential crawl, 3 attempts per fetch, 1s between attempts).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub vocabulary: AttributeVocabulary,
}

/// Network fetch behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Total attempts per URL, including the first one
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Fixed delay between two attempts (milliseconds)
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,

    /// Upper bound on the time spent retrying one URL (milliseconds)
    #[serde(rename = "max-retry-elapsed-ms")]
    pub max_retry_elapsed_ms: u64,

    /// Timeout applied to each single attempt (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 1000,
            max_retry_elapsed_ms: 5000,
            timeout_secs: 5,
        }
    }
}

impl FetcherConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn max_retry_elapsed(&self) -> Duration {
        Duration::from_millis(self.max_retry_elapsed_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// How already-seen links are excluded while expanding datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupScope {
    /// Only skip a link pointing back at the dataset that referenced it
    Parent,
    /// Skip any link already resolved within the same seed's crawl tree
    #[default]
    Seed,
}

/// Crawler behaviour configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of fetches in flight at once
    #[serde(rename = "max-concurrent-fetches")]
    pub max_concurrent_fetches: u32,

    /// Maximum number of catalog entries resolved at once
    #[serde(rename = "max-concurrent-seeds")]
    pub max_concurrent_seeds: u32,

    #[serde(rename = "dedup-scope")]
    pub dedup_scope: DedupScope,

    /// Maximum dataset nesting below a seed
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Capacity of the visited set kept for one seed
    #[serde(rename = "max-visited-urls")]
    pub max_visited_urls: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 1,
            max_concurrent_seeds: 1,
            dedup_scope: DedupScope::Seed,
            max_depth: 32,
            max_visited_urls: 10_000,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    #[serde(rename = "contact-url")]
    pub contact_url: String,

    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: env!("CARGO_PKG_NAME").to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: String::new(),
            contact_email: String::new(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL; ContactEmail)`
    ///
    /// The parenthesised part is omitted when no contact is configured.
    pub fn header_value(&self) -> String {
        let contacts: Vec<&str> = [self.contact_url.as_str(), self.contact_email.as_str()]
            .into_iter()
            .filter(|c| !c.is_empty())
            .collect();

        if contacts.is_empty() {
            format!("{}/{}", self.crawler_name, self.crawler_version)
        } else {
            format!(
                "{}/{} (+{})",
                self.crawler_name,
                self.crawler_version,
                contacts.join("; ")
            )
        }
    }
}
