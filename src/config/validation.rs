use crate::config::types::{Config, CrawlerConfig, FetcherConfig, UserAgentConfig};
use crate::document::AttributeVocabulary;
use crate::ConfigError;
use url::Url;

/// Upper bound for both concurrency knobs
const MAX_CONCURRENCY: u32 = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetcher_config(&config.fetcher)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_vocabulary(&config.vocabulary)?;
    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.max_attempts > 1 && config.max_retry_elapsed_ms < config.retry_delay_ms {
        return Err(ConfigError::Validation(format!(
            "max_retry_elapsed_ms ({}) leaves no room for a single retry delay of {}ms",
            config.max_retry_elapsed_ms, config.retry_delay_ms
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("max_concurrent_fetches", config.max_concurrent_fetches),
        ("max_concurrent_seeds", config.max_concurrent_seeds),
    ] {
        if value < 1 || value > MAX_CONCURRENCY {
            return Err(ConfigError::Validation(format!(
                "{} must be between 1 and {}, got {}",
                name, MAX_CONCURRENCY, value
            )));
        }
    }

    if config.max_depth < 1 {
        return Err(ConfigError::Validation(
            "max_depth must be >= 1".to_string(),
        ));
    }

    if config.max_visited_urls < 1 {
        return Err(ConfigError::Validation(
            "max_visited_urls must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if !config.contact_url.is_empty() {
        Url::parse(&config.contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    if !config.contact_email.is_empty() {
        validate_email(&config.contact_email)?;
    }

    Ok(())
}

/// Every canonical attribute needs at least one non-empty tag name
fn validate_vocabulary(vocabulary: &AttributeVocabulary) -> Result<(), ConfigError> {
    for (canonical, synonyms) in vocabulary.entries() {
        if synonyms.is_empty() {
            return Err(ConfigError::Validation(format!(
                "vocabulary entry '{}' has no tag names",
                canonical
            )));
        }

        if synonyms.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "vocabulary entry '{}' contains an empty tag name",
                canonical
            )));
        }
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
