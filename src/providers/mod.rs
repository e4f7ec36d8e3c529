/*!
 * Provider implementations for different translation services.
 *
 * This module contains client implementations for online dictionaries:
 * - MyMemory: public translation memory API (the default)
 * - LibreTranslate: hosted or self-hosted machine translation
 * - Mock: scripted provider for tests
 */

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{TranslationConfig, TranslationProvider};
use crate::errors::ProviderError;

pub mod libretranslate;
pub mod mock;
pub mod mymemory;

pub use libretranslate::LibreTranslate;
pub use mock::{MockBehavior, MockProvider};
pub use mymemory::MyMemory;

/// A single word lookup
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupRequest {
    /// Normalized word to translate
    pub word: String,
    /// ISO 639-1 source language
    pub source_language: String,
    /// ISO 639-1 target language
    pub target_language: String,
}

impl LookupRequest {
    /// Create a new lookup request
    pub fn new(
        word: impl Into<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            word: word.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
        }
    }
}

/// Common trait for all translation providers
///
/// A provider performs exactly one request per call; retries and caching
/// belong to the translator.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Look up a translation
    ///
    /// # Returns
    /// * `Ok(Some(text))` - The provider returned a translation
    /// * `Ok(None)` - The provider answered but had nothing useful
    /// * `Err(ProviderError)` - The request failed
    async fn lookup(&self, request: &LookupRequest) -> Result<Option<String>, ProviderError>;

    /// Short provider name used in logs
    fn name(&self) -> &str;
}

/// Build the provider selected in the configuration
pub fn create_provider(config: &TranslationConfig) -> Arc<dyn Provider> {
    let timeout = Duration::from_secs(config.timeout_secs);
    let endpoint = config.get_endpoint();

    match config.provider {
        TranslationProvider::MyMemory => Arc::new(MyMemory::new(
            endpoint,
            timeout,
            non_empty(&config.email),
            non_empty(&config.api_key),
        )),
        TranslationProvider::LibreTranslate => Arc::new(LibreTranslate::new(
            endpoint,
            timeout,
            non_empty(&config.api_key),
        )),
    }
}

fn non_empty(value: &str) -> Option<String> {
    Some(value.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}

/// HTTP client shared by the online providers
pub(crate) fn build_http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("bilinguo/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_default()
}

/// Classify a transport-level failure
pub(crate) fn classify_transport_error(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout(error.to_string())
    } else if error.is_decode() {
        ProviderError::ParseError(error.to_string())
    } else if error.is_builder() {
        ProviderError::InvalidRequest(error.to_string())
    } else {
        ProviderError::Unavailable(error.to_string())
    }
}

/// Classify a non-success HTTP status
///
/// Server errors are worth retrying; other client errors are not.
pub(crate) fn classify_status(
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
) -> ProviderError {
    let message = format!("HTTP {}: {}", status, body.trim());

    if status == StatusCode::TOO_MANY_REQUESTS {
        ProviderError::RateLimited {
            message,
            retry_after_secs: parse_retry_after(headers),
        }
    } else if status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::GATEWAY_TIMEOUT {
        ProviderError::Timeout(message)
    } else if status.is_server_error() {
        ProviderError::Unavailable(message)
    } else {
        ProviderError::InvalidRequest(message)
    }
}

/// Read a `Retry-After` header given in seconds or as an HTTP date
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

    if let Ok(secs) = value.parse::<u64>() {
        return Some(secs);
    }

    let at = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    let wait = at.with_timezone(&chrono::Utc) - chrono::Utc::now();
    Some(wait.num_seconds().max(0) as u64)
}

/// Drop answers that are blank or just repeat the word
pub(crate) fn meaningful_translation(word: &str, translated: &str) -> Option<String> {
    let translated = translated.trim();
    if translated.is_empty() || translated.eq_ignore_ascii_case(word.trim()) {
        None
    } else {
        Some(translated.to_string())
    }
}
