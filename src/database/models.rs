/*!
 * Database entity models and DTOs.
 *
 * These structures map directly to the `words` table and provide
 * type-safe access to persisted vocabulary entries.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Leading or trailing characters that are neither word characters nor apostrophes
static EDGE_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\w']+|[^\w']+$").expect("valid edge punctuation regex"));

/// How an entry first entered the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySource {
    /// Word/translation pairs from a structured file
    ImportedStructured,
    /// Word extracted from free text
    ImportedUnstructured,
    /// Added by hand
    Manual,
}

impl fmt::Display for EntrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntrySource::ImportedStructured => write!(f, "imported_structured"),
            EntrySource::ImportedUnstructured => write!(f, "imported_unstructured"),
            EntrySource::Manual => write!(f, "manual"),
        }
    }
}

impl std::str::FromStr for EntrySource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "imported_structured" => Ok(EntrySource::ImportedStructured),
            "imported_unstructured" => Ok(EntrySource::ImportedUnstructured),
            "manual" => Ok(EntrySource::Manual),
            _ => Err(anyhow::anyhow!("Invalid entry source: {}", s)),
        }
    }
}

/// One vocabulary record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    /// Normalized lowercase word, unique in the store
    pub word: String,
    /// Translation, absent until supplied or fetched
    pub translation: Option<String>,
    /// Origin of the entry
    pub source: EntrySource,
    /// Whether the entry has been written to a flashcard export
    pub exported: bool,
    /// First insertion timestamp (RFC 3339, UTC, microseconds)
    pub created_at: String,
    /// Timestamp of the export that included this entry
    pub exported_at: Option<String>,
}

impl VocabularyEntry {
    /// Whether the entry has a non-empty translation
    pub fn is_translated(&self) -> bool {
        self.translation.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Map a row selected with [`ENTRY_COLUMNS`]
    pub(crate) fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            word: row.get(0)?,
            translation: row.get(1)?,
            source: row.get::<_, String>(2)?.parse().map_err(|e: anyhow::Error| {
                rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, e.into())
            })?,
            exported: row.get::<_, i64>(3)? != 0,
            created_at: row.get(4)?,
            exported_at: row.get(5)?,
        })
    }
}

/// Column list matching [`VocabularyEntry::from_row`]
pub(crate) const ENTRY_COLUMNS: &str = "word, translation, source, exported, created_at, exported_at";

/// A parsed import result not yet committed to the store
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Raw word as found in the input
    pub word: String,
    /// Translation supplied by the input, if any
    pub translation: Option<String>,
    /// Origin of the candidate
    pub source: EntrySource,
}

impl Candidate {
    /// Create a new candidate
    pub fn new(word: impl Into<String>, translation: Option<String>, source: EntrySource) -> Self {
        Self {
            word: word.into(),
            translation,
            source,
        }
    }
}

/// Result of a single upsert
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertOutcome {
    /// Entry as stored after the call
    pub entry: VocabularyEntry,
    /// Whether a new row was inserted
    pub created: bool,
    /// Whether an empty translation was filled in on an existing row
    pub translation_filled: bool,
}

/// Filter applied by `WordStore::get_all`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryFilter {
    /// Only entries with this export status
    pub exported: Option<bool>,
    /// Case-insensitive substring matched against word or translation
    pub search: Option<String>,
}

impl EntryFilter {
    /// Filter on export status
    pub fn exported(mut self, exported: bool) -> Self {
        self.exported = Some(exported);
        self
    }

    /// Filter on a substring of the word or translation
    pub fn search(mut self, needle: impl Into<String>) -> Self {
        self.search = Some(needle.into());
        self
    }
}

/// Ordering applied by `WordStore::get_all`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Alphabetical by word
    #[default]
    Word,
    /// Oldest first
    CreatedAt,
    /// Unexported first
    Exported,
}

impl SortKey {
    /// SQL ORDER BY clause; every ordering ends on the unique word column
    pub(crate) fn order_clause(&self) -> &'static str {
        match self {
            SortKey::Word => "word ASC",
            SortKey::CreatedAt => "created_at ASC, word ASC",
            SortKey::Exported => "exported ASC, word ASC",
        }
    }
}

impl std::str::FromStr for SortKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "word" => Ok(SortKey::Word),
            "created_at" | "created" | "date" => Ok(SortKey::CreatedAt),
            "exported" | "status" => Ok(SortKey::Exported),
            _ => Err(anyhow::anyhow!("Invalid sort key: {}", s)),
        }
    }
}

/// Summary counts over the whole store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WordStats {
    /// Number of entries
    pub total: i64,
    /// Entries already exported as flashcards
    pub exported: i64,
    /// Entries with a translation
    pub translated: i64,
    /// Translated entries not yet exported
    pub pending_export: i64,
}

impl fmt::Display for WordStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Words: {} | Flashcards: {} | Translated: {} | Ready to export: {}",
            self.total, self.exported, self.translated, self.pending_export
        )
    }
}

/// Normalize a word into its store key
///
/// Trims, maps typographic quotes to ASCII, strips surrounding punctuation
/// (apostrophes are kept) and lowercases. Returns `None` when nothing is left.
pub fn normalize_word(raw: &str) -> Option<String> {
    let replaced = raw
        .trim()
        .replace('\u{2019}', "'")
        .replace(['\u{201C}', '\u{201D}'], "\"");
    let stripped = EDGE_PUNCTUATION.replace_all(&replaced, "");
    let normalized = stripped.trim().to_lowercase();

    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Normalize an optional translation: trimmed, empty means absent
pub fn normalize_translation(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|t| !t.is_empty()).map(str::to_string)
}
