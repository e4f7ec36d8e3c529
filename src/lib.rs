/*!
 * # Bilinguo - bilingual vocabulary builder
 *
 * A Rust library that keeps a persistent vocabulary store, fills in
 * translations through an online dictionary service and exports flashcards
 * so that every word is exported exactly once.
 *
 * ## Features
 *
 * - Import words from structured word lists (JSON) and free text
 * - Translate words through online providers:
 *   - MyMemory
 *   - LibreTranslate
 * - Concurrent, cancellable batch translation with retries
 * - CSV flashcard export that never repeats a word
 * - ISO 639-1 and ISO 639-2 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `database`: The SQLite-backed word store
 * - `importer`: Word extraction from structured and unstructured sources
 * - `translation`: Provider lookups:
 *   - `translation::core`: Single-word translation with retries
 *   - `translation::batch`: Concurrent batch translation
 *   - `translation::cache`: Session cache of lookups
 *   - `translation::retry`: Retry policy
 * - `export_tracker`: Flashcard export and exported-state tracking
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `providers`: Clients for the dictionary services
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod database;
pub mod errors;
pub mod export_tracker;
pub mod file_utils;
pub mod importer;
pub mod language_utils;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, TranslateSummary};
pub use database::{EntryFilter, EntrySource, SortKey, VocabularyEntry, WordStats, WordStore};
pub use errors::{AppError, ExportError, ImportError, ProviderError, StoreError, TranslationError};
pub use export_tracker::{ExportArtifact, ExportTracker, Flashcard};
pub use importer::{ImportSource, ImportSummary, Importer};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part1};
pub use translation::{BatchReport, Translator};
