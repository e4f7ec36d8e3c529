/*!
 * Core translator implementation.
 *
 * The translator turns a word into a translation string or a classified
 * failure. It consults the cache, calls the provider, and applies the retry
 * policy. It never touches the word store: persisting a result is the
 * caller's job, so a failed lookup cannot leave a half-applied write.
 */

use log::{debug, error, warn};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::cache::TranslationCache;
use super::retry::RetryPolicy;
use crate::app_config::TranslationConfig;
use crate::database::normalize_word;
use crate::errors::TranslationError;
use crate::language_utils;
use crate::providers::{self, LookupRequest, Provider};

/// Word translator
#[derive(Clone, Debug)]
pub struct Translator {
    /// Provider used for lookups
    provider: Arc<dyn Provider>,
    /// Retry policy for transient failures
    retry: RetryPolicy,
    /// Session cache of successful lookups
    cache: TranslationCache,
    /// Maximum number of lookups in flight during a batch
    pub(crate) concurrent_requests: usize,
}

impl Translator {
    /// Create a translator with default retry policy and an enabled cache
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            retry: RetryPolicy::default(),
            cache: TranslationCache::default(),
            concurrent_requests: 4,
        }
    }

    /// Create the translator described by the config section
    pub fn from_config(config: &TranslationConfig) -> Self {
        Self::new(providers::create_provider(config))
            .with_retry_policy(RetryPolicy::from_config(config))
            .with_cache(TranslationCache::new(config.cache_enabled))
            .with_concurrency(config.concurrent_requests)
    }

    /// Replace the retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the cache
    pub fn with_cache(mut self, cache: TranslationCache) -> Self {
        self.cache = cache;
        self
    }

    /// Set the batch concurrency (at least 1)
    pub fn with_concurrency(mut self, concurrent_requests: usize) -> Self {
        self.concurrent_requests = concurrent_requests.max(1);
        self
    }

    /// The session cache
    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    /// Name of the underlying provider
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Translate one word
    pub async fn translate(
        &self,
        word: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslationError> {
        self.translate_with_cancel(word, source_language, target_language, None)
            .await
    }

    /// Translate one word; a cancelled token stops any pending retry
    pub(crate) async fn translate_with_cancel(
        &self,
        word: &str,
        source_language: &str,
        target_language: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<String, TranslationError> {
        let request = build_request(word, source_language, target_language)?;

        if let Some(cached) =
            self.cache
                .get(&request.word, &request.source_language, &request.target_language)
        {
            return Ok(cached);
        }

        let mut attempt = 1;
        loop {
            match self.provider.lookup(&request).await {
                Ok(Some(translation)) => {
                    debug!("Translated '{}' via {}", request.word, self.provider.name());
                    self.cache.store(
                        &request.word,
                        &request.source_language,
                        &request.target_language,
                        &translation,
                    );
                    return Ok(translation);
                }
                Ok(None) => {
                    debug!("No translation found for '{}'", request.word);
                    return Err(TranslationError::NoTranslationFound(request.word));
                }
                Err(e) => {
                    let Some(delay) = self.retry.delay_for(&e, attempt) else {
                        error!("Lookup of '{}' failed after {} attempt(s): {}", request.word, attempt, e);
                        return Err(e.into());
                    };

                    warn!(
                        "Lookup of '{}' failed ({}), retrying in {:?} (attempt {}/{})",
                        request.word,
                        e,
                        delay,
                        attempt + 1,
                        self.retry.max_retries + 1
                    );

                    match cancel {
                        Some(token) => {
                            tokio::select! {
                                _ = token.cancelled() => return Err(e.into()),
                                _ = tokio::time::sleep(delay) => {}
                            }
                        }
                        None => tokio::time::sleep(delay).await,
                    }
                    attempt += 1;
                }
            }
        }
    }
}

/// Validate the word and language pair and build the provider request
fn build_request(
    word: &str,
    source_language: &str,
    target_language: &str,
) -> Result<LookupRequest, TranslationError> {
    let word = normalize_word(word).ok_or_else(|| TranslationError::InvalidWord(word.to_string()))?;

    let source = language_utils::normalize_to_part1(source_language)
        .map_err(|_| TranslationError::InvalidLanguage(source_language.to_string()))?;
    let target = language_utils::normalize_to_part1(target_language)
        .map_err(|_| TranslationError::InvalidLanguage(target_language.to_string()))?;

    Ok(LookupRequest::new(word, source, target))
}
