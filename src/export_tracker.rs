/*!
 * Export tracker: turns translated, unexported entries into flashcards.
 *
 * An export selects candidates, serializes them, then marks exactly those
 * words as exported in one transaction. If the marking cannot flip every
 * selected word, nothing is marked and the export fails, so the marked set
 * always matches the artifact.
 */

use log::{debug, error, info};
use serde::Serialize;
use std::path::Path;

use crate::database::{VocabularyEntry, WordStore};
use crate::errors::ExportError;
use crate::file_utils::FileManager;

/// One flashcard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flashcard {
    /// Card front (the word)
    pub front: String,
    /// Card back (the translation)
    pub back: String,
}

impl Flashcard {
    fn from_entry(entry: VocabularyEntry) -> Option<Self> {
        let back = entry.translation.filter(|t| !t.is_empty())?;
        Some(Self {
            front: entry.word,
            back,
        })
    }
}

/// The result of an export: the cards and their CSV encoding
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportArtifact {
    /// Exported cards, oldest entry first
    pub cards: Vec<Flashcard>,
    /// UTF-8 CSV, one `front,back` row per card
    pub csv: Vec<u8>,
}

impl ExportArtifact {
    /// Number of cards
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether the export selected nothing
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Words in the artifact
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.cards.iter().map(|card| card.front.as_str())
    }

    /// CSV as text
    pub fn csv_text(&self) -> String {
        String::from_utf8_lossy(&self.csv).into_owned()
    }
}

/// Flashcard exporter bound to a word store
#[derive(Debug, Clone)]
pub struct ExportTracker {
    store: WordStore,
    include_header: bool,
}

impl ExportTracker {
    /// Create a tracker; CSV output has no header row
    pub fn new(store: WordStore) -> Self {
        Self {
            store,
            include_header: false,
        }
    }

    /// Write a `front,back` header row
    pub fn with_header(mut self, include_header: bool) -> Self {
        self.include_header = include_header;
        self
    }

    /// Translated, unexported entries in export order; a negative limit selects nothing
    pub async fn select_candidates(&self, limit: i64) -> Result<Vec<VocabularyEntry>, ExportError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self.store.select_export_candidates(limit).await?)
    }

    /// Export up to `limit` cards and mark them exported
    pub async fn export(&self, limit: i64) -> Result<ExportArtifact, ExportError> {
        let artifact = self.prepare(limit).await?;
        if artifact.is_empty() {
            info!("No new words available for export");
            return Ok(artifact);
        }

        self.mark(&artifact).await?;
        info!("Exported {} flashcards", artifact.len());
        Ok(artifact)
    }

    /// Export up to `limit` cards to `path`, then mark them exported
    ///
    /// An existing file at `path` is never replaced: the export fails before
    /// anything is selected. The new file is written atomically before any
    /// word is marked, and removed again if marking fails. Nothing is written
    /// when there is nothing to export.
    pub async fn export_to_file<P: AsRef<Path>>(
        &self,
        limit: i64,
        path: P,
    ) -> Result<ExportArtifact, ExportError> {
        let path = path.as_ref();
        if path.exists() {
            return Err(ExportError::File(format!(
                "{:?} already exists; choose another output file",
                path
            )));
        }

        let artifact = self.prepare(limit).await?;
        if artifact.is_empty() {
            info!("No new words available for export");
            return Ok(artifact);
        }

        FileManager::write_atomic(path, &artifact.csv)
            .map_err(|e| ExportError::File(format!("{:#}", e)))?;

        if let Err(e) = self.mark(&artifact).await {
            error!("Marking exported words failed, removing {:?}: {}", path, e);
            if let Err(cleanup) = FileManager::remove_if_exists(path) {
                error!("Failed to remove {:?}: {:#}", path, cleanup);
            }
            return Err(e);
        }

        info!("Exported {} flashcards to {:?}", artifact.len(), path);
        Ok(artifact)
    }

    /// Select candidates and serialize them
    async fn prepare(&self, limit: i64) -> Result<ExportArtifact, ExportError> {
        let cards: Vec<Flashcard> = self
            .select_candidates(limit)
            .await?
            .into_iter()
            .filter_map(Flashcard::from_entry)
            .collect();

        let csv = render_csv(&cards, self.include_header)?;
        debug!("Prepared {} cards ({} bytes)", cards.len(), csv.len());

        Ok(ExportArtifact { cards, csv })
    }

    /// Mark exactly the artifact's words as exported
    async fn mark(&self, artifact: &ExportArtifact) -> Result<(), ExportError> {
        let words: Vec<String> = artifact.words().map(str::to_string).collect();
        self.store.mark_exported_exact(words).await?;
        Ok(())
    }
}

/// Serialize cards as two-column CSV
pub fn render_csv(cards: &[Flashcard], include_header: bool) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(include_header)
        .from_writer(Vec::new());

    for card in cards {
        writer.serialize(card)?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Serialization(e.to_string()))
}
