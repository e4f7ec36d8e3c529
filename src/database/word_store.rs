/*!
 * Word store: the durable keyed collection of vocabulary entries.
 *
 * Every mutating operation runs as one statement or one transaction on the
 * blocking pool, so a call either commits entirely or leaves the store as it
 * was. The store is handed explicitly to the importer, the controller and the
 * export tracker; there is no global connection.
 */

use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::collections::{HashSet, VecDeque};
use std::path::Path;

use super::connection::DatabaseConnection;
use super::models::{
    normalize_translation, normalize_word, Candidate, EntryFilter, EntrySource, SortKey,
    UpsertOutcome, VocabularyEntry, WordStats, ENTRY_COLUMNS,
};
use crate::errors::StoreError;

/// Rows fetched per round trip when iterating lazily
const DEFAULT_PAGE_SIZE: usize = 64;

/// Current time in the fixed-width format stored in `created_at`
fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Normalize and de-duplicate a list of words, keeping first-seen order
fn normalize_word_set<I, S>(words: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    words
        .into_iter()
        .filter_map(|w| normalize_word(w.as_ref()))
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

/// Store for vocabulary entries
#[derive(Clone, Debug)]
pub struct WordStore {
    /// Database connection
    db: DatabaseConnection,
}

impl WordStore {
    /// Create a store over an existing connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Open the store backed by the database file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Ok(Self::new(DatabaseConnection::new(path)?))
    }

    /// Create a store with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self, StoreError> {
        Ok(Self::new(DatabaseConnection::new_in_memory()?))
    }

    /// Underlying connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    // =========================================================================
    // Insert / merge
    // =========================================================================

    /// Insert a word, or merge into the existing entry
    ///
    /// An existing entry only changes when it has no translation and the
    /// incoming one is non-empty; otherwise the stored record wins.
    pub async fn upsert(
        &self,
        word: &str,
        translation: Option<&str>,
        source: EntrySource,
    ) -> Result<UpsertOutcome, StoreError> {
        let candidate = Candidate::new(word, translation.map(str::to_string), source);

        let outcome = self
            .db
            .transaction_async(move |tx| Self::upsert_sync(tx, &candidate, &now_timestamp()))
            .await?;

        Ok(outcome)
    }

    /// Upsert a batch of candidates in a single transaction
    ///
    /// Either every candidate is applied or, if any write fails, none is.
    pub async fn upsert_batch(
        &self,
        candidates: Vec<Candidate>,
    ) -> Result<Vec<UpsertOutcome>, StoreError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let total = candidates.len();
        let outcomes = self
            .db
            .transaction_async(move |tx| {
                let now = now_timestamp();
                candidates
                    .iter()
                    .map(|candidate| Self::upsert_sync(tx, candidate, &now))
                    .collect::<anyhow::Result<Vec<_>>>()
            })
            .await?;

        debug!("Upserted batch of {} candidates", total);
        Ok(outcomes)
    }

    /// Upsert one candidate (synchronous version for use within transactions)
    fn upsert_sync(
        conn: &Connection,
        candidate: &Candidate,
        now: &str,
    ) -> anyhow::Result<UpsertOutcome> {
        let word = normalize_word(&candidate.word)
            .ok_or_else(|| StoreError::InvalidWord(candidate.word.clone()))?;
        let translation = normalize_translation(candidate.translation.as_deref());

        match Self::get_sync(conn, &word)? {
            None => {
                conn.execute(
                    r#"
                    INSERT INTO words (word, translation, source, exported, created_at)
                    VALUES (?1, ?2, ?3, 0, ?4)
                    "#,
                    params![word, translation, candidate.source.to_string(), now],
                )?;

                Ok(UpsertOutcome {
                    entry: VocabularyEntry {
                        word,
                        translation,
                        source: candidate.source,
                        exported: false,
                        created_at: now.to_string(),
                        exported_at: None,
                    },
                    created: true,
                    translation_filled: false,
                })
            }
            Some(mut existing) => {
                let fill = match (&translation, existing.is_translated()) {
                    (Some(_), false) => translation,
                    _ => None,
                };

                let translation_filled = fill.is_some();
                if let Some(fill) = fill {
                    conn.execute(
                        "UPDATE words SET translation = ?1 WHERE word = ?2",
                        params![fill, word],
                    )?;
                    existing.translation = Some(fill);
                }

                Ok(UpsertOutcome {
                    entry: existing,
                    created: false,
                    translation_filled,
                })
            }
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Get an entry by word (normalized before lookup)
    pub async fn get(&self, word: &str) -> Result<Option<VocabularyEntry>, StoreError> {
        let Some(word) = normalize_word(word) else {
            return Ok(None);
        };

        let entry = self
            .db
            .execute_async(move |conn| Self::get_sync(conn, &word))
            .await?;

        Ok(entry)
    }

    /// Get an entry by normalized word (synchronous version for use within transactions)
    fn get_sync(conn: &Connection, word: &str) -> anyhow::Result<Option<VocabularyEntry>> {
        let entry = conn
            .query_row(
                &format!("SELECT {} FROM words WHERE word = ?1", ENTRY_COLUMNS),
                [word],
                VocabularyEntry::from_row,
            )
            .optional()?;

        Ok(entry)
    }

    /// Query entries lazily
    ///
    /// Nothing is read until the returned query is iterated. Each iteration
    /// re-runs the query from the start, fetching rows page by page.
    pub fn get_all(&self, filter: EntryFilter, sort: SortKey) -> EntryQuery {
        EntryQuery {
            db: self.db.clone(),
            filter,
            sort,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Translated, unexported entries, oldest first with ties broken by word
    pub async fn select_export_candidates(
        &self,
        limit: usize,
    ) -> Result<Vec<VocabularyEntry>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let entries = self
            .db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    r#"
                    SELECT {}
                    FROM words
                    WHERE exported = 0
                      AND translation IS NOT NULL
                      AND translation <> ''
                    ORDER BY created_at ASC, word ASC
                    LIMIT ?1
                    "#,
                    ENTRY_COLUMNS
                ))?;

                let entries = stmt
                    .query_map([limit as i64], VocabularyEntry::from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(entries)
            })
            .await?;

        Ok(entries)
    }

    /// Words without a translation, oldest first
    pub async fn untranslated_words(&self, limit: Option<usize>) -> Result<Vec<String>, StoreError> {
        let limit = limit.map(|l| l as i64).unwrap_or(-1);

        let words = self
            .db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT word FROM words
                    WHERE translation IS NULL OR translation = ''
                    ORDER BY created_at ASC, word ASC
                    LIMIT ?1
                    "#,
                )?;

                let words = stmt
                    .query_map([limit], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<String>>>()?;
                Ok(words)
            })
            .await?;

        Ok(words)
    }

    /// Counts over the whole store
    pub async fn stats(&self) -> Result<WordStats, StoreError> {
        let stats = self
            .db
            .execute_async(|conn| {
                let stats = conn.query_row(
                    r#"
                    SELECT
                        COUNT(*),
                        COALESCE(SUM(exported), 0),
                        COALESCE(SUM(CASE WHEN translation IS NOT NULL AND translation <> '' THEN 1 ELSE 0 END), 0),
                        COALESCE(SUM(CASE WHEN exported = 0 AND translation IS NOT NULL AND translation <> '' THEN 1 ELSE 0 END), 0)
                    FROM words
                    "#,
                    [],
                    |row| {
                        Ok(WordStats {
                            total: row.get(0)?,
                            exported: row.get(1)?,
                            translated: row.get(2)?,
                            pending_export: row.get(3)?,
                        })
                    },
                )?;
                Ok(stats)
            })
            .await?;

        Ok(stats)
    }

    // =========================================================================
    // Updates
    // =========================================================================

    /// Overwrite the translation of an existing word
    ///
    /// A blank translation clears it. Fails with `NotFound` when the word is absent.
    pub async fn set_translation(&self, word: &str, translation: &str) -> Result<(), StoreError> {
        let normalized = normalize_word(word).ok_or_else(|| StoreError::NotFound(word.to_string()))?;
        let translation = normalize_translation(Some(translation));

        let changed = self
            .db
            .execute_async({
                let normalized = normalized.clone();
                move |conn| {
                    let changed = conn.execute(
                        "UPDATE words SET translation = ?1 WHERE word = ?2",
                        params![translation, normalized],
                    )?;
                    Ok(changed)
                }
            })
            .await?;

        if changed == 0 {
            return Err(StoreError::NotFound(normalized));
        }

        debug!("Updated translation for '{}'", normalized);
        Ok(())
    }

    /// Mark words as exported; returns how many flipped from unexported
    ///
    /// Idempotent: already-exported and unknown words are skipped.
    pub async fn mark_exported<I, S>(&self, words: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = normalize_word_set(words);
        if words.is_empty() {
            return Ok(0);
        }

        let changed = self
            .db
            .transaction_async(move |tx| Self::mark_exported_sync(tx, &words, &now_timestamp()))
            .await?;

        Ok(changed)
    }

    /// Mark every listed word as exported, or none of them
    ///
    /// Fails with `Conflict` (and rolls back) unless each word exists and was
    /// still unexported.
    pub async fn mark_exported_exact<I, S>(&self, words: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = normalize_word_set(words);
        if words.is_empty() {
            return Ok(0);
        }

        let expected = words.len();
        let changed = self
            .db
            .transaction_async(move |tx| {
                let changed = Self::mark_exported_sync(tx, &words, &now_timestamp())?;
                if changed != expected {
                    return Err(StoreError::Conflict { expected, changed }.into());
                }
                Ok(changed)
            })
            .await?;

        info!("Marked {} entries as exported", changed);
        Ok(changed)
    }

    /// Flip `exported` for the given normalized words (synchronous version for use within transactions)
    fn mark_exported_sync(conn: &Connection, words: &[String], now: &str) -> anyhow::Result<usize> {
        let mut stmt = conn.prepare(
            "UPDATE words SET exported = 1, exported_at = ?1 WHERE word = ?2 AND exported = 0",
        )?;

        let mut changed = 0;
        for word in words {
            changed += stmt.execute(params![now, word])?;
        }
        Ok(changed)
    }

    /// Delete entries; returns how many rows were removed
    pub async fn delete<I, S>(&self, words: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = normalize_word_set(words);
        if words.is_empty() {
            return Ok(0);
        }

        let deleted = self
            .db
            .transaction_async(move |tx| {
                let mut stmt = tx.prepare("DELETE FROM words WHERE word = ?1")?;
                let mut deleted = 0;
                for word in &words {
                    deleted += stmt.execute([word])?;
                }
                Ok(deleted)
            })
            .await?;

        info!("Deleted {} entries", deleted);
        Ok(deleted)
    }
}

/// A lazy, restartable query over the store
#[derive(Clone, Debug)]
pub struct EntryQuery {
    db: DatabaseConnection,
    filter: EntryFilter,
    sort: SortKey,
    page_size: usize,
}

impl EntryQuery {
    /// Override the number of rows fetched per page
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Iterate over the matching entries
    ///
    /// Pages are read with a blocking lock on the connection; from async code
    /// prefer [`EntryQuery::fetch_all`].
    pub fn iter(&self) -> EntryIter {
        EntryIter {
            query: self.clone(),
            offset: 0,
            buffer: VecDeque::new(),
            done: false,
        }
    }

    /// Read every matching entry on the blocking pool
    pub async fn fetch_all(&self) -> Result<Vec<VocabularyEntry>, StoreError> {
        let (sql, values) = self.build_sql(None);

        let entries = self
            .db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let entries = stmt
                    .query_map(params_from_iter(values), VocabularyEntry::from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(entries)
            })
            .await?;

        Ok(entries)
    }

    /// Build the SELECT statement, optionally restricted to one page
    fn build_sql(&self, page: Option<(usize, usize)>) -> (String, Vec<Value>) {
        let mut clauses = Vec::new();
        let mut values = Vec::new();

        if let Some(exported) = self.filter.exported {
            values.push(Value::Integer(exported as i64));
            clauses.push(format!("exported = ?{}", values.len()));
        }

        if let Some(needle) = self.filter.search.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            // LIKE folds ASCII case only; words are stored lowercased, so fold the needle here
            let pattern = |text: &str| {
                let escaped = text
                    .replace('\\', "\\\\")
                    .replace('%', "\\%")
                    .replace('_', "\\_");
                Value::Text(format!("%{}%", escaped))
            };
            values.push(pattern(&needle.to_lowercase()));
            let lowered = values.len();
            values.push(pattern(needle));
            let verbatim = values.len();
            clauses.push(format!(
                "(word LIKE ?{lowered} ESCAPE '\\' OR translation LIKE ?{lowered} ESCAPE '\\' \
                 OR translation LIKE ?{verbatim} ESCAPE '\\')"
            ));
        }

        let mut sql = format!("SELECT {} FROM words", ENTRY_COLUMNS);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY ");
        sql.push_str(self.sort.order_clause());

        if let Some((limit, offset)) = page {
            values.push(Value::Integer(limit as i64));
            values.push(Value::Integer(offset as i64));
            sql.push_str(&format!(" LIMIT ?{} OFFSET ?{}", values.len() - 1, values.len()));
        }

        (sql, values)
    }

    /// Read one page synchronously
    fn fetch_page(&self, offset: usize) -> Result<Vec<VocabularyEntry>, StoreError> {
        let (sql, values) = self.build_sql(Some((self.page_size, offset)));

        let entries = self.db.execute(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let entries = stmt
                .query_map(params_from_iter(values), VocabularyEntry::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(entries)
        })?;

        Ok(entries)
    }
}

impl<'a> IntoIterator for &'a EntryQuery {
    type Item = Result<VocabularyEntry, StoreError>;
    type IntoIter = EntryIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over an [`EntryQuery`], fetching one page at a time
pub struct EntryIter {
    query: EntryQuery,
    offset: usize,
    buffer: VecDeque<VocabularyEntry>,
    done: bool,
}

impl Iterator for EntryIter {
    type Item = Result<VocabularyEntry, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.done {
            match self.query.fetch_page(self.offset) {
                Ok(page) => {
                    if page.len() < self.query.page_size {
                        self.done = true;
                    }
                    self.offset += page.len();
                    self.buffer.extend(page);
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }

        self.buffer.pop_front().map(Ok)
    }
}
