/*!
 * Mock provider implementations for testing.
 *
 * This module provides mock providers that simulate different behaviors:
 * - `MockProvider::working()` - Always answers (dictionary entry or a tagged echo)
 * - `MockProvider::dictionary()` - Answers only words it was given
 * - `MockProvider::intermittent(n)` - Every nth request is unavailable
 * - `MockProvider::failing()` - Always unavailable
 *
 * Per-word scripts (`with_failures`, `with_permanent_failure`) make retry
 * behavior deterministic in tests.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::{LookupRequest, Provider};

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Dictionary entries, otherwise `[<target>] <word>`
    Working,
    /// Dictionary entries, otherwise no translation
    Dictionary,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Answers without a translation
    Empty,
    /// Simulates slow response (for timeout and cancellation testing)
    Slow { delay_ms: u64 },
}

/// Per-word failure scripts
#[derive(Debug, Default)]
struct Scripts {
    /// Failures returned (in order) before the word falls back to the behavior
    queued: HashMap<String, VecDeque<ProviderError>>,
    /// Failures returned on every call
    permanent: HashMap<String, ProviderError>,
    /// Calls received per word
    calls: HashMap<String, usize>,
}

/// Mock provider for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Known translations
    dictionary: Arc<HashMap<String, String>>,
    /// Request counter shared between clones
    request_count: Arc<AtomicUsize>,
    /// Scripted failures and per-word call counts
    scripts: Arc<Mutex<Scripts>>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            dictionary: Arc::new(HashMap::new()),
            request_count: Arc::new(AtomicUsize::new(0)),
            scripts: Arc::new(Mutex::new(Scripts::default())),
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a provider that only knows the given pairs
    pub fn dictionary<I, W, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (W, T)>,
        W: Into<String>,
        T: Into<String>,
    {
        Self::new(MockBehavior::Dictionary).with_entries(entries)
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that never has a translation
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Create a mock that waits before answering
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Add dictionary entries
    pub fn with_entries<I, W, T>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (W, T)>,
        W: Into<String>,
        T: Into<String>,
    {
        let dictionary = Arc::make_mut(&mut self.dictionary);
        for (word, translation) in entries {
            dictionary.insert(word.into(), translation.into());
        }
        self
    }

    /// Fail the next lookups of `word` with these errors, in order
    pub fn with_failures(self, word: &str, errors: Vec<ProviderError>) -> Self {
        self.scripts
            .lock()
            .queued
            .entry(word.to_string())
            .or_default()
            .extend(errors);
        self
    }

    /// Fail every lookup of `word`
    pub fn with_permanent_failure(self, word: &str, error: ProviderError) -> Self {
        self.scripts.lock().permanent.insert(word.to_string(), error);
        self
    }

    /// Total number of lookups received
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Number of lookups received for one word
    pub fn requests_for(&self, word: &str) -> usize {
        self.scripts.lock().calls.get(word).copied().unwrap_or(0)
    }

    fn dictionary_answer(&self, request: &LookupRequest) -> Option<String> {
        self.dictionary.get(&request.word).cloned()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn lookup(&self, request: &LookupRequest) -> Result<Option<String>, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);

        let scripted = {
            let mut scripts = self.scripts.lock();
            *scripts.calls.entry(request.word.clone()).or_insert(0) += 1;

            match scripts.permanent.get(&request.word) {
                Some(error) => Some(error.clone()),
                None => scripts
                    .queued
                    .get_mut(&request.word)
                    .and_then(|queue| queue.pop_front()),
            }
        };
        if let Some(error) = scripted {
            return Err(error);
        }

        match self.behavior {
            MockBehavior::Working => Ok(Some(self.dictionary_answer(request).unwrap_or_else(
                || format!("[{}] {}", request.target_language, request.word),
            ))),

            MockBehavior::Dictionary => Ok(self.dictionary_answer(request)),

            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(ProviderError::Unavailable(format!(
                        "Simulated intermittent failure (request #{})",
                        count + 1
                    )))
                } else {
                    Ok(Some(format!("[{}] {}", request.target_language, request.word)))
                }
            }

            MockBehavior::Failing => Err(ProviderError::Unavailable(
                "Simulated provider failure".to_string(),
            )),

            MockBehavior::Empty => Ok(None),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Ok(self.dictionary_answer(request).or_else(|| {
                    Some(format!("[{}] {}", request.target_language, request.word))
                }))
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
