/*!
 * Importer: turns structured and unstructured sources into store entries.
 *
 * Both kinds of source go through one entry point, [`Importer::import`],
 * which extracts candidates and hands them to the store as a single batch.
 * Malformed structured records are skipped and counted; they never abort the
 * import. A failed batch write does abort it, and nothing is committed.
 */

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::database::{normalize_word, Candidate, EntrySource, WordStore};
use crate::errors::ImportError;
use crate::file_utils::{FileManager, ImportFormat};

/// Runs of characters that are neither whitespace, punctuation nor symbols
static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\s\p{P}\p{S}]+").expect("valid token regex"));

/// Tokens made only of letters
static LETTERS_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\p{L}+$").expect("valid letters regex"));

/// Default minimum token length for free text
pub const DEFAULT_MIN_WORD_LENGTH: usize = 2;

/// Input to an import
#[derive(Debug, Clone, PartialEq)]
pub enum ImportSource {
    /// A JSON document expected to hold an array of `{word, translation}` records
    Structured(Value),
    /// Free text
    Unstructured(String),
}

impl ImportSource {
    /// Parse a JSON document into a structured source
    pub fn structured_from_str(json: &str) -> Result<Self, ImportError> {
        serde_json::from_str(json)
            .map(Self::Structured)
            .map_err(|e| ImportError::InvalidFormat(format!("Invalid JSON: {}", e)))
    }

    /// Free text source
    pub fn text(text: impl Into<String>) -> Self {
        Self::Unstructured(text.into())
    }
}

/// Counts reported by an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// New entries created
    pub inserted: usize,
    /// Candidates that matched an existing entry (including repeats within the batch)
    pub merged: usize,
    /// Merged candidates that filled in a missing translation
    pub translations_filled: usize,
    /// Structured records skipped as malformed
    pub rejected: usize,
    /// Files skipped during a directory import because they could not be read or parsed
    pub failed_files: usize,
}

impl ImportSummary {
    /// Number of candidates handed to the store
    pub fn accepted(&self) -> usize {
        self.inserted + self.merged
    }
}

impl std::ops::AddAssign for ImportSummary {
    fn add_assign(&mut self, other: Self) {
        self.inserted += other.inserted;
        self.merged += other.merged;
        self.translations_filled += other.translations_filled;
        self.rejected += other.rejected;
        self.failed_files += other.failed_files;
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} new, {} merged ({} translations filled), {} rejected",
            self.inserted, self.merged, self.translations_filled, self.rejected
        )?;
        if self.failed_files > 0 {
            write!(f, ", {} files failed", self.failed_files)?;
        }
        Ok(())
    }
}

/// Candidates extracted from a source, before they reach the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub candidates: Vec<Candidate>,
    pub rejected: usize,
}

/// Extract candidate entries from a structured document
///
/// A top level that is not an array is a format error. Records that are not
/// objects, lack a string `word`, have a non-string `translation`, or whose
/// word is empty once normalized are rejected.
pub fn extract_structured(document: &Value) -> Result<Extraction, ImportError> {
    let records = document.as_array().ok_or_else(|| {
        ImportError::InvalidFormat("JSON file must contain a list of objects".to_string())
    })?;

    let mut extraction = Extraction::default();
    for (index, record) in records.iter().enumerate() {
        match parse_record(record) {
            Some(candidate) => extraction.candidates.push(candidate),
            None => {
                warn!("Skipping malformed record #{}: {}", index + 1, record);
                extraction.rejected += 1;
            }
        }
    }

    Ok(extraction)
}

fn parse_record(record: &Value) -> Option<Candidate> {
    let object = record.as_object()?;

    let word = object.get("word")?.as_str()?;
    normalize_word(word)?;

    let translation = match object.get("translation") {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(_) => return None,
    };

    Some(Candidate::new(word, translation, EntrySource::ImportedStructured))
}

/// Extract unique words from free text
///
/// Splits on whitespace, punctuation and symbols, keeps tokens made only of
/// letters with at least `min_length` characters, lowercases them and keeps
/// the first occurrence of each.
pub fn extract_unstructured(text: &str, min_length: usize) -> Vec<String> {
    let mut seen = HashSet::new();

    TOKEN
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|token| LETTERS_ONLY.is_match(token))
        .filter_map(normalize_word)
        .filter(|word| word.chars().count() >= min_length)
        .filter(|word| seen.insert(word.clone()))
        .collect()
}

/// Importer bound to a word store
#[derive(Debug, Clone)]
pub struct Importer {
    store: WordStore,
    min_word_length: usize,
}

impl Importer {
    /// Create an importer writing into `store`
    pub fn new(store: WordStore) -> Self {
        Self {
            store,
            min_word_length: DEFAULT_MIN_WORD_LENGTH,
        }
    }

    /// Override the minimum token length for free text
    pub fn with_min_word_length(mut self, min_word_length: usize) -> Self {
        self.min_word_length = min_word_length.max(1);
        self
    }

    /// Extract candidates from any source
    pub fn extract(&self, source: &ImportSource) -> Result<Extraction, ImportError> {
        match source {
            ImportSource::Structured(document) => extract_structured(document),
            ImportSource::Unstructured(text) => Ok(Extraction {
                candidates: extract_unstructured(text, self.min_word_length)
                    .into_iter()
                    .map(|word| Candidate::new(word, None, EntrySource::ImportedUnstructured))
                    .collect(),
                rejected: 0,
            }),
        }
    }

    /// Import a source in a single store transaction
    pub async fn import(&self, source: ImportSource) -> Result<ImportSummary, ImportError> {
        let Extraction { candidates, rejected } = self.extract(&source)?;
        debug!("Extracted {} candidates ({} rejected)", candidates.len(), rejected);

        let mut summary = ImportSummary {
            rejected,
            ..Default::default()
        };

        for outcome in self.store.upsert_batch(candidates).await? {
            if outcome.created {
                summary.inserted += 1;
            } else {
                summary.merged += 1;
                if outcome.translation_filled {
                    summary.translations_filled += 1;
                }
            }
        }

        info!("Import finished: {}", summary);
        Ok(summary)
    }

    /// Import a file: `.json` as structured, anything else as free text
    pub async fn import_file<P: AsRef<Path>>(&self, path: P) -> Result<ImportSummary, ImportError> {
        let path = path.as_ref();
        let content = FileManager::read_to_string_lossy(path)
            .map_err(|e| ImportError::File(format!("{:#}", e)))?;

        let source = match FileManager::detect_import_format(path) {
            ImportFormat::Structured => ImportSource::structured_from_str(&content)?,
            ImportFormat::Unstructured => ImportSource::Unstructured(content),
        };

        info!("Importing {:?}", path);
        self.import(source).await
    }
}
