/*!
 * Batch translation processing.
 *
 * Words are translated independently with bounded concurrency. Each word
 * gets its own outcome; a failure never affects its neighbours. Cancelling
 * the token stops words that have not been sent yet (they are reported as
 * skipped) while outcomes that already completed stay in the report.
 */

use futures::stream::{self, StreamExt};
use log::info;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

use super::core::Translator;
use crate::errors::TranslationError;

/// Outcome of a batch translation
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Per-word outcomes, keyed by the word as given
    pub outcomes: HashMap<String, Result<String, TranslationError>>,
    /// Words never sent because the batch was cancelled
    pub skipped: Vec<String>,
}

impl BatchReport {
    /// Words that were translated, with their translation
    pub fn successes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|(word, outcome)| outcome.as_ref().ok().map(|t| (word.as_str(), t.as_str())))
    }

    /// Words that failed, with the reason
    pub fn failures(&self) -> impl Iterator<Item = (&str, &TranslationError)> {
        self.outcomes
            .iter()
            .filter_map(|(word, outcome)| outcome.as_ref().err().map(|e| (word.as_str(), e)))
    }

    /// Number of translated words
    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    /// Number of failed words
    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// Whether any word was skipped by cancellation
    pub fn was_cancelled(&self) -> bool {
        !self.skipped.is_empty()
    }
}

impl Translator {
    /// Translate several words
    pub async fn translate_batch<I, S>(
        &self,
        words: I,
        source_language: &str,
        target_language: &str,
    ) -> BatchReport
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.translate_batch_with_cancel(
            words,
            source_language,
            target_language,
            &CancellationToken::new(),
            |_, _| {},
        )
        .await
    }

    /// Translate several words until done or cancelled
    ///
    /// `progress_callback` receives `(completed, total)` after each word.
    pub async fn translate_batch_with_cancel<I, S, F>(
        &self,
        words: I,
        source_language: &str,
        target_language: &str,
        cancel: &CancellationToken,
        progress_callback: F,
    ) -> BatchReport
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(usize, usize) + Send + Sync,
    {
        let mut seen = HashSet::new();
        let words: Vec<String> = words
            .into_iter()
            .map(Into::into)
            .filter(|w| seen.insert(w.clone()))
            .collect();

        let total = words.len();
        let completed = AtomicUsize::new(0);

        // Futures are created lazily by buffer_unordered, so the cancellation
        // check below runs right before a word would be sent.
        let results = stream::iter(words)
            .map(|word| {
                let completed = &completed;
                let progress_callback = &progress_callback;
                async move {
                    if cancel.is_cancelled() {
                        return (word, None);
                    }

                    let outcome = self
                        .translate_with_cancel(&word, source_language, target_language, Some(cancel))
                        .await;

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress_callback(done, total);

                    (word, Some(outcome))
                }
            })
            .buffer_unordered(self.concurrent_requests)
            .collect::<Vec<_>>()
            .await;

        let mut report = BatchReport::default();
        for (word, outcome) in results {
            match outcome {
                Some(outcome) => {
                    report.outcomes.insert(word, outcome);
                }
                None => report.skipped.push(word),
            }
        }

        info!(
            "Batch translation: {} translated, {} failed, {} skipped",
            report.success_count(),
            report.failure_count(),
            report.skipped.len()
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProviderError;
    use crate::providers::MockProvider;
    use crate::translation::RetryPolicy;
    use std::sync::Arc;
    use std::time::Duration;

    fn translator(provider: &MockProvider, concurrency: usize) -> Translator {
        Translator::new(Arc::new(provider.clone()))
            .with_retry_policy(RetryPolicy::new(2, Duration::from_millis(1), Duration::from_secs(1)))
            .with_concurrency(concurrency)
    }

    #[tokio::test]
    async fn test_translateBatch_withMiddleFailure_shouldKeepIndependentOutcomes() {
        let provider = MockProvider::dictionary([("cat", "گربه"), ("dog", "سگ")]);

        let report = translator(&provider, 2)
            .translate_batch(["cat", "zzqxnotaword", "dog"], "en", "fa")
            .await;

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.outcomes["cat"], Ok("گربه".to_string()));
        assert_eq!(report.outcomes["dog"], Ok("سگ".to_string()));
        assert!(matches!(
            report.outcomes["zzqxnotaword"],
            Err(TranslationError::NoTranslationFound(_))
        ));
        assert!(!report.was_cancelled());
    }

    #[tokio::test]
    async fn test_translateBatch_withTransientFailure_shouldReportAfterRetries() {
        let provider = MockProvider::dictionary([("cat", "گربه")])
            .with_permanent_failure("dog", ProviderError::Unavailable("down".to_string()));

        let report = translator(&provider, 4).translate_batch(["cat", "dog"], "en", "fa").await;

        assert_eq!(report.success_count(), 1);
        assert!(report.outcomes["dog"].as_ref().is_err_and(|e| e.is_transient()));
        assert_eq!(provider.requests_for("dog"), 3);
    }

    #[tokio::test]
    async fn test_translateBatch_withDuplicates_shouldLookUpOnce() {
        let provider = MockProvider::working();

        let report = translator(&provider, 1).translate_batch(["cat", "cat"], "en", "fa").await;

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(provider.request_count(), 1);
    }

    #[tokio::test]
    async fn test_translateBatchWithCancel_whenCancelledUpfront_shouldSendNothing() {
        let provider = MockProvider::working();
        let token = CancellationToken::new();
        token.cancel();

        let report = translator(&provider, 2)
            .translate_batch_with_cancel(["a", "b", "c"], "en", "fa", &token, |_, _| {})
            .await;

        assert!(report.outcomes.is_empty());
        assert_eq!(report.skipped.len(), 3);
        assert_eq!(provider.request_count(), 0);
    }

    #[tokio::test]
    async fn test_translateBatchWithCancel_midway_shouldKeepCompletedOutcomes() {
        let provider = MockProvider::slow(20);
        let token = CancellationToken::new();
        let cancel_after_first = token.clone();

        let report = translator(&provider, 1)
            .translate_batch_with_cancel(
                ["one", "two", "three", "four"],
                "en",
                "fa",
                &token,
                move |done, _| {
                    if done == 1 {
                        cancel_after_first.cancel();
                    }
                },
            )
            .await;

        assert_eq!(report.outcomes.len(), 1);
        assert!(report.outcomes["one"].is_ok());
        assert_eq!(report.skipped.len(), 3);
        assert_eq!(provider.request_count(), 1);
    }

    #[tokio::test]
    async fn test_translateBatch_shouldReportProgressForEveryWord() {
        let provider = MockProvider::working();
        let calls = AtomicUsize::new(0);

        translator(&provider, 3)
            .translate_batch_with_cancel(
                ["a1", "b2", "c3", "d4"],
                "en",
                "fa",
                &CancellationToken::new(),
                |_, total| {
                    assert_eq!(total, 4);
                    calls.fetch_add(1, Ordering::SeqCst);
                },
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
