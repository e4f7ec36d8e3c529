/*!
 * Translation of vocabulary words through an online provider.
 *
 * - `core`: the `Translator` (single-word lookup with retries)
 * - `batch`: concurrent, cancellable lookups of many words
 * - `cache`: session cache of successful lookups
 * - `retry`: the retry policy
 */

pub use self::batch::BatchReport;
pub use self::cache::{CacheStats, TranslationCache};
pub use self::core::Translator;
pub use self::retry::RetryPolicy;

// Submodules
pub mod batch;
pub mod cache;
pub mod core;
pub mod retry;
