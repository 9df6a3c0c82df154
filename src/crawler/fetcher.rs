//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured user agent and timeout
//! - Retrying failed attempts according to a [`RetryPolicy`]
//! - Correcting the response charset before handing text to the parser
//! - Error classification

use crate::config::{FetcherConfig, UserAgentConfig};
use crate::crawler::retry::RetryPolicy;
use crate::document::decode_document;
use crate::FetchError;
use encoding_rs::Encoding;
use reqwest::{header::CONTENT_TYPE, Client};
use std::time::Instant;

/// A successfully fetched and decoded document
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// URL that was requested
    pub url: String,
    /// Final URL after redirects
    pub final_url: String,
    pub status_code: u16,
    /// Declared Content-Type, kept for diagnostics only
    pub content_type: Option<String>,
    /// Body decoded with the detected encoding
    pub text: String,
    /// Encoding the body was decoded with
    pub encoding: &'static Encoding,
    /// Attempts it took, including the successful one
    pub attempts: u32,
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `fetcher` - Timeout settings; the timeout bounds each single attempt
/// * `user_agent` - The user agent configuration
///
/// # Example
///
/// ```no_run
/// use l190_crawler::config::{FetcherConfig, UserAgentConfig};
/// use l190_crawler::crawler::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default(), &UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    fetcher: &FetcherConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(fetcher.timeout())
        .connect_timeout(fetcher.timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches documents with bounded retries
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
}

impl Fetcher {
    /// Creates a fetcher from configuration
    pub fn new(config: &FetcherConfig, user_agent: &UserAgentConfig) -> Result<Self, FetchError> {
        let client = build_http_client(config, user_agent)?;
        Ok(Self::with_client(client, RetryPolicy::from_config(config)))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches a URL, retrying per the policy
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Non-2xx status | Retry until the policy gives up |
    /// | Timeout | Retry until the policy gives up |
    /// | Connection/transport error | Retry until the policy gives up |
    /// | URL rejected by the client | Fail immediately |
    ///
    /// # Returns
    ///
    /// * `Ok(RawDocument)` - Body fetched and decoded
    /// * `Err(FetchError::RetriesExhausted)` - Every allowed attempt failed
    pub async fn fetch(&self, url: &str) -> Result<RawDocument, FetchError> {
        let started = Instant::now();
        let mut attempts = 0;

        loop {
            attempts += 1;

            let error = match self.attempt(url).await {
                Ok(mut document) => {
                    document.attempts = attempts;
                    tracing::info!("Successfully fetched XML content from {}", url);
                    return Ok(document);
                }
                Err(FetchError::Http { url, source }) if source.is_builder() => {
                    return Err(FetchError::Http { url, source });
                }
                Err(error) => error,
            };

            match self.policy.next_delay(attempts, started.elapsed()) {
                Some(delay) => {
                    tracing::warn!(
                        "Attempt {}/{} for {} failed: {}; retrying in {:?}",
                        attempts,
                        self.policy.max_attempts(),
                        url,
                        error,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    return Err(FetchError::RetriesExhausted {
                        url: url.to_string(),
                        attempts,
                        last: Box::new(error),
                    });
                }
            }
        }
    }

    /// Performs a single GET
    async fn attempt(&self, url: &str) -> Result<RawDocument, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.bytes().await.map_err(|e| classify_error(url, e))?;
        let decoded = decode_document(&body);

        Ok(RawDocument {
            url: url.to_string(),
            final_url,
            status_code: status.as_u16(),
            content_type,
            text: decoded.text,
            encoding: decoded.encoding,
            attempts: 1,
        })
    }
}

/// Maps a reqwest error onto a fetch error
fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
