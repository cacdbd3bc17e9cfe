//! Plain HTTP fetching with retry policy and per-domain pacing.
//!
//! Retry policy, by failure class:
//! - 429: exponential backoff, up to `max_retries` attempts
//! - 5xx: one retry after a fixed delay
//! - 403/401, timeouts, connection failures: fail immediately
//!
//! Successful pages are cached as serialized [`MenuContent`] under the
//! HTML namespace so the locator can revisit a URL within one search
//! for free.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::html;
use super::rate_limit::DomainLimiter;
use crate::cache::{CacheKind, MenuCache};
use crate::config::FetchConfig;
use crate::error::{FetchError, FetchResult};
use crate::types::menu::{FetchOutcome, MenuContent, MenuSource};

/// Fetcher for server-rendered pages and raw downloads.
pub struct StaticFetcher {
    client: reqwest::Client,
    limiter: Arc<DomainLimiter>,
    cache: MenuCache,
    config: FetchConfig,
}

impl StaticFetcher {
    /// Build a fetcher with a browser-like request profile.
    pub fn new(
        config: FetchConfig,
        cache: MenuCache,
        limiter: Arc<DomainLimiter>,
    ) -> FetchResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/pdf;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("ru-RU,ru;q=0.9,en-US;q=0.8,en;q=0.7"),
        );
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| FetchError::Http(Box::new(e)))?;
        Ok(Self {
            client,
            limiter,
            cache,
            config,
        })
    }

    /// Fetch a page and extract its visible text, consulting the
    /// cache first. Expected failures come back as
    /// [`FetchOutcome::Failure`].
    pub async fn fetch_page(&self, url: &str) -> FetchOutcome {
        if let Some(cached) = self.cache.get(CacheKind::Html, url).await {
            match serde_json::from_str::<MenuContent>(&cached) {
                Ok(content) => return FetchOutcome::Success(content),
                Err(_) => self.cache.invalidate(CacheKind::Html, url).await,
            }
        }
        match self.fetch_html(url).await {
            Ok(content) => {
                if let Ok(json) = serde_json::to_string(&content) {
                    self.cache.set(CacheKind::Html, url, &json).await;
                }
                FetchOutcome::Success(content)
            }
            Err(e) => {
                debug!(url = %url, error = %e, "static fetch failed");
                FetchOutcome::failure(e.to_string())
            }
        }
    }

    async fn fetch_html(&self, url: &str) -> FetchResult<MenuContent> {
        let response = self.get_with_retry(url).await?;
        let final_url = response.url().to_string();
        let content_type = header_str(response.headers(), reqwest::header::CONTENT_TYPE);
        if content_type.contains("application/pdf") {
            return Err(FetchError::ContentType {
                url: url.to_string(),
                content_type,
            });
        }
        let html = response
            .text()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))?;
        let text = html::html_to_text(&html);
        debug!(url = %url, final_url = %final_url, text_len = text.chars().count(), "fetched page");
        Ok(MenuContent::new(text, url, MenuSource::StaticHtml)
            .with_html(html)
            .with_final_url(final_url))
    }

    /// Download a URL as raw bytes (used for PDFs). Returns the body,
    /// the post-redirect URL, and the Content-Type header.
    pub async fn fetch_bytes(&self, url: &str) -> FetchResult<(Vec<u8>, String, String)> {
        let response = self.get_with_retry(url).await?;
        let final_url = response.url().to_string();
        let content_type = header_str(response.headers(), reqwest::header::CONTENT_TYPE);
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))?;
        Ok((body.to_vec(), final_url, content_type))
    }

    async fn get_with_retry(&self, url: &str) -> FetchResult<reqwest::Response> {
        let mut rate_limit_attempt: u32 = 0;
        let mut server_retry_used = false;
        loop {
            self.limiter.acquire(url).await;
            let response = match self.client.get(url).send().await {
                Ok(r) => r,
                Err(e) if e.is_timeout() => {
                    return Err(FetchError::Timeout {
                        url: url.to_string(),
                    })
                }
                Err(e) if e.is_connect() => {
                    return Err(FetchError::Network {
                        url: url.to_string(),
                        reason: e.to_string(),
                    })
                }
                Err(e) => return Err(FetchError::Http(Box::new(e))),
            };
            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }
            if status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED {
                return Err(FetchError::Forbidden {
                    url: url.to_string(),
                });
            }
            if status == StatusCode::TOO_MANY_REQUESTS {
                rate_limit_attempt += 1;
                if rate_limit_attempt >= self.config.max_retries {
                    return Err(FetchError::RetriesExhausted {
                        url: url.to_string(),
                    });
                }
                let delay = Duration::from_secs(2u64.saturating_pow(rate_limit_attempt));
                warn!(url = %url, attempt = rate_limit_attempt, delay_s = delay.as_secs(), "rate limited, backing off");
                tokio::time::sleep(delay).await;
                continue;
            }
            if status.is_server_error() {
                if server_retry_used {
                    return Err(FetchError::RetriesExhausted {
                        url: url.to_string(),
                    });
                }
                server_retry_used = true;
                debug!(url = %url, status = %status, "server error, retrying once");
                tokio::time::sleep(self.config.server_error_delay).await;
                continue;
            }
            return Err(FetchError::Http(
                format!("unexpected status {status} for {url}").into(),
            ));
        }
    }
}

fn header_str(headers: &HeaderMap, name: reqwest::header::HeaderName) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_lowercase()
}
