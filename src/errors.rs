/*!
 * Error types for the bilinguo application.
 *
 * Each component owns an error enum built with thiserror. Per-item failures
 * (a malformed import record, one word the provider could not translate) are
 * absorbed into summaries by the importer and translator; the variants here
 * describe failures that abort a single call.
 */

use std::time::Duration;

use thiserror::Error;

/// Errors raised by the word store
#[derive(Error, Debug)]
pub enum StoreError {
    /// The word is empty once normalized
    #[error("Invalid word: {0:?}")]
    InvalidWord(String),

    /// The operation referenced a word that is not in the store
    #[error("Word not found: {0}")]
    NotFound(String),

    /// A batch could not be applied to every listed word; nothing was committed
    #[error("Conflict: expected to update {expected} entries, {changed} were eligible")]
    Conflict {
        /// Number of words the caller asked for
        expected: usize,
        /// Number of words that could have been updated
        changed: usize,
    },

    /// The storage write or read failed; nothing from the call was committed
    #[error("Persistence failure: {0}")]
    Persistence(String),
}

impl StoreError {
    /// Wrap any infrastructure error as a persistence failure
    pub fn persistence(error: impl std::fmt::Display) -> Self {
        Self::Persistence(error.to_string())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(error: rusqlite::Error) -> Self {
        Self::persistence(error)
    }
}

impl From<anyhow::Error> for StoreError {
    fn from(error: anyhow::Error) -> Self {
        // Keep typed store errors raised inside a database closure
        match error.downcast::<StoreError>() {
            Ok(store_error) => store_error,
            Err(other) => Self::Persistence(format!("{:#}", other)),
        }
    }
}

/// Errors returned by a translation provider for a single lookup
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The provider could not be reached or answered with a server error
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// The request did not complete in time
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The provider refused the request because of its quota
    #[error("Rate limit exceeded: {message}")]
    RateLimited {
        /// Message reported by the provider
        message: String,
        /// Wait suggested by the provider, if any
        retry_after_secs: Option<u64>,
    },

    /// The provider rejected the request itself
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The response could not be understood
    #[error("Failed to parse provider response: {0}")]
    ParseError(String),
}

impl ProviderError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::Timeout(_) | Self::RateLimited { .. }
        )
    }

    /// Retry-after hint carried by a rate-limit failure
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after_secs, .. } => retry_after_secs.map(Duration::from_secs),
            _ => None,
        }
    }
}

/// Errors that can occur while translating one word
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    /// The provider had no answer; the word stays untranslated
    #[error("No translation found for '{0}'")]
    NoTranslationFound(String),

    /// The word is empty once normalized
    #[error("Invalid word: {0:?}")]
    InvalidWord(String),

    /// Unsupported or malformed language code
    #[error("Invalid language code: {0}")]
    InvalidLanguage(String),

    /// Provider failure, surfaced after the retry policy gave up
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl TranslationError {
    /// Whether this outcome is a transient provider failure
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Provider(e) if e.is_transient())
    }
}

/// Errors that abort a whole import
#[derive(Error, Debug)]
pub enum ImportError {
    /// The input does not have the expected shape at the top level
    #[error("Invalid import format: {0}")]
    InvalidFormat(String),

    /// The input file could not be read
    #[error("File error: {0}")]
    File(String),

    /// The batch write failed; nothing was imported
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors that abort an export
#[derive(Error, Debug)]
pub enum ExportError {
    /// Reading candidates or marking them failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Serializing the artifact failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Writing the artifact file failed
    #[error("File error: {0}")]
    File(String),
}

impl From<csv::Error> for ExportError {
    fn from(error: csv::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the word store
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error from an import
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Error from an export
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Whether the failure risks data loss and must be shown to the user right away
    pub fn is_persistence_failure(&self) -> bool {
        matches!(
            self,
            Self::Store(StoreError::Persistence(_))
                | Self::Import(ImportError::Store(StoreError::Persistence(_)))
                | Self::Export(ExportError::Store(StoreError::Persistence(_)))
        )
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
