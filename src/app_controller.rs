use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::fmt;
use std::path::Path;
use tokio_util::sync::CancellationToken;

use crate::app_config::Config;
use crate::database::{
    EntryFilter, EntrySource, SortKey, UpsertOutcome, VocabularyEntry, WordStats, WordStore,
};
use crate::errors::{AppError, ImportError, StoreError, TranslationError};
use crate::export_tracker::{ExportArtifact, ExportTracker};
use crate::file_utils::FileManager;
use crate::importer::{ImportSummary, Importer};
use crate::translation::Translator;

// @module: Application controller wiring the vocabulary components

/// Counts reported after translating pending words
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslateSummary {
    /// Words translated and saved
    pub translated: usize,
    /// Words the provider had no answer for
    pub not_found: usize,
    /// Words that failed (provider errors after retries, invalid input)
    pub failed: usize,
    /// Words never sent because the run was cancelled
    pub skipped: usize,
}

impl fmt::Display for TranslateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} translated, {} without translation, {} failed, {} skipped",
            self.translated, self.not_found, self.failed, self.skipped
        )
    }
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
    store: WordStore,
    importer: Importer,
    translator: Translator,
    exporter: ExportTracker,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self, AppError> {
        let db_path = config.resolve_database_path()?;
        let store = WordStore::open(&db_path)?;
        let translator = Translator::from_config(&config.translation);

        Ok(Self::with_components(config, store, translator))
    }

    /// Create a controller around an existing store and translator
    pub fn with_components(config: Config, store: WordStore, translator: Translator) -> Self {
        let importer =
            Importer::new(store.clone()).with_min_word_length(config.import.min_word_length);
        let exporter = ExportTracker::new(store.clone()).with_header(config.export.include_header);

        Self {
            config,
            store,
            importer,
            translator,
            exporter,
        }
    }

    /// The active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The word store
    pub fn store(&self) -> &WordStore {
        &self.store
    }

    /// Import a file, or every importable file under a directory
    ///
    /// In a directory, files that cannot be read or parsed are counted in
    /// `failed_files` and skipped. Store failures abort the import.
    pub async fn import_path(&self, path: &Path) -> Result<ImportSummary, AppError> {
        if FileManager::dir_exists(path) {
            let files = FileManager::find_import_files(path)?;
            info!("Found {} importable files in {:?}", files.len(), path);

            let file_count = files.len();
            let mut total = ImportSummary::default();
            for file in files {
                match self.importer.import_file(&file).await {
                    Ok(summary) => total += summary,
                    Err(e @ (ImportError::InvalidFormat(_) | ImportError::File(_))) => {
                        warn!("Skipping {:?}: {}", file, e);
                        total.failed_files += 1;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            info!("Accepted {} words from {} files", total.accepted(), file_count);
            return Ok(total);
        }

        Ok(self.importer.import_file(path).await?)
    }

    /// Add a word by hand
    pub async fn add_word(
        &self,
        word: &str,
        translation: Option<&str>,
    ) -> Result<UpsertOutcome, AppError> {
        Ok(self.store.upsert(word, translation, EntrySource::Manual).await?)
    }

    /// List entries
    pub async fn list(
        &self,
        filter: EntryFilter,
        sort: SortKey,
        limit: Option<usize>,
    ) -> Result<Vec<VocabularyEntry>, AppError> {
        let query = self.store.get_all(filter, sort);
        let mut entries = query.fetch_all().await?;
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        Ok(entries)
    }

    /// Translate one stored word and save the result
    pub async fn translate_word(&self, word: &str) -> Result<String, AppError> {
        let entry = self
            .store
            .get(word)
            .await?
            .ok_or_else(|| StoreError::NotFound(word.to_string()))?;

        let translation = self
            .translator
            .translate(&entry.word, &self.config.source_language, &self.config.target_language)
            .await?;

        self.store.set_translation(&entry.word, &translation).await?;
        info!("{} → {}", entry.word, translation);
        Ok(translation)
    }

    /// Translate every untranslated word (oldest first) and save the successes
    pub async fn translate_pending(
        &self,
        limit: Option<usize>,
        cancel: &CancellationToken,
        show_progress: bool,
    ) -> Result<TranslateSummary, AppError> {
        let words = self.store.untranslated_words(limit).await?;
        if words.is_empty() {
            info!("Nothing to translate");
            return Ok(TranslateSummary::default());
        }

        info!(
            "Translating {} words with {} ({} → {})",
            words.len(),
            self.translator.provider_name(),
            self.config.source_language,
            self.config.target_language
        );

        let progress_bar = if show_progress {
            let pb = ProgressBar::new(words.len() as u64);
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} words ({percent}%) {eta}")
                .unwrap_or_else(|_| ProgressStyle::default_bar());
            pb.set_style(style.progress_chars("█▓▒░"));
            pb
        } else {
            ProgressBar::hidden()
        };

        let pb = progress_bar.clone();
        let report = self
            .translator
            .translate_batch_with_cancel(
                words,
                &self.config.source_language,
                &self.config.target_language,
                cancel,
                move |completed, _total| pb.set_position(completed as u64),
            )
            .await;
        progress_bar.finish_and_clear();

        let mut summary = TranslateSummary {
            skipped: report.skipped.len(),
            ..Default::default()
        };

        for (word, outcome) in &report.outcomes {
            match outcome {
                Ok(translation) => match self.store.set_translation(word, translation).await {
                    Ok(()) => summary.translated += 1,
                    Err(StoreError::NotFound(_)) => {
                        warn!("'{}' was removed before its translation arrived", word);
                        summary.failed += 1;
                    }
                    Err(e) => return Err(e.into()),
                },
                Err(TranslationError::NoTranslationFound(_)) => summary.not_found += 1,
                Err(e) => {
                    warn!("Could not translate '{}': {}", word, e);
                    summary.failed += 1;
                }
            }
        }

        info!("Translation finished: {}", summary);
        let cache = self.translator.cache();
        if cache.is_enabled() {
            let stats = cache.stats();
            debug!(
                "Translation cache: {} entries, {:.0}% hit rate",
                stats.entries,
                stats.hit_rate() * 100.0
            );
        }
        Ok(summary)
    }

    /// Set a translation by hand
    pub async fn set_translation(&self, word: &str, translation: &str) -> Result<(), AppError> {
        Ok(self.store.set_translation(word, translation).await?)
    }

    /// Export flashcards to a CSV file; `None` uses the configured default limit
    pub async fn export(&self, limit: Option<i64>, path: &Path) -> Result<ExportArtifact, AppError> {
        let limit = limit.unwrap_or(self.config.export.default_limit);
        Ok(self.exporter.export_to_file(limit, path).await?)
    }

    /// Delete words
    pub async fn delete(&self, words: &[String]) -> Result<usize, AppError> {
        Ok(self.store.delete(words).await?)
    }

    /// Store statistics
    pub async fn stats(&self) -> Result<WordStats, AppError> {
        Ok(self.store.stats().await?)
    }

    /// Database location and size in bytes
    pub fn database_info(&self) -> (&Path, u64) {
        let db = self.store.connection();
        (db.path(), db.file_size_bytes())
    }
}
