/*!
 * Database module for persistent storage of vocabulary entries.
 *
 * This module provides SQLite-based persistence for:
 * - Vocabulary entries keyed by normalized word
 * - Export status tracking for flashcard generation
 */

pub mod schema;
pub mod connection;
pub mod models;
pub mod word_store;

// Re-export main types
pub use connection::DatabaseConnection;
pub use models::{
    normalize_translation, normalize_word, Candidate, EntryFilter, EntrySource, SortKey,
    UpsertOutcome, VocabularyEntry, WordStats,
};
pub use word_store::{EntryIter, EntryQuery, WordStore};
