use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

/// Default name of a flashcard export
pub const DEFAULT_EXPORT_FILENAME: &str = "anki_cards.csv";

/// Extensions picked up when importing a directory
const IMPORT_EXTENSIONS: &[&str] = &["json", "txt", "md", "csv"];

/// How an import file is parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    /// JSON array of word/translation records
    Structured,
    /// Free text
    Unstructured,
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Pick the import format from the file extension
    pub fn detect_import_format<P: AsRef<Path>>(path: P) -> ImportFormat {
        match path.as_ref().extension() {
            Some(ext) if ext.to_string_lossy().eq_ignore_ascii_case("json") => ImportFormat::Structured,
            _ => ImportFormat::Unstructured,
        }
    }

    /// Find importable files under a directory, sorted by path
    pub fn find_import_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            let importable = path.is_file()
                && path.extension().is_some_and(|ext| {
                    let ext = ext.to_string_lossy();
                    IMPORT_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known))
                });

            if importable {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    /// Read a file as UTF-8, replacing invalid sequences
    pub fn read_to_string_lossy<P: AsRef<Path>>(path: P) -> Result<String> {
        let bytes = fs::read(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))?;

        let text = String::from_utf8_lossy(&bytes);
        // Drop a UTF-8 byte order mark
        Ok(text.strip_prefix('\u{feff}').unwrap_or(&text).to_string())
    }

    /// Write a new file atomically: a temp file in the same directory moved into place
    ///
    /// Fails if `path` already exists; an existing file is never replaced.
    pub fn write_atomic<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
        let path = path.as_ref();
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self::ensure_dir(parent)?;

        let mut temp = tempfile::NamedTempFile::new_in(parent)
            .with_context(|| format!("Failed to create temporary file in {:?}", parent))?;
        temp.write_all(content)
            .with_context(|| format!("Failed to write temporary file for {:?}", path))?;
        temp.as_file()
            .sync_all()
            .with_context(|| format!("Failed to sync temporary file for {:?}", path))?;
        temp.persist_noclobber(path)
            .with_context(|| format!("Failed to move export into place: {:?}", path))?;

        Ok(())
    }

    /// Remove a file if it exists
    pub fn remove_if_exists<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if path.exists() {
            fs::remove_file(path).with_context(|| format!("Failed to remove file: {:?}", path))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detectImportFormat_shouldUseExtension() {
        assert_eq!(FileManager::detect_import_format("words.JSON"), ImportFormat::Structured);
        assert_eq!(FileManager::detect_import_format("notes.md"), ImportFormat::Unstructured);
        assert_eq!(FileManager::detect_import_format("README"), ImportFormat::Unstructured);
    }

    #[test]
    fn test_findImportFiles_shouldFilterAndSort() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::write(dir.path().join("a.json"), "[]").unwrap();
        fs::write(dir.path().join("image.png"), "x").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.md"), "c").unwrap();

        let files = FileManager::find_import_files(dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["a.json", "b.txt", "c.md"]);
    }

    #[test]
    fn test_readToStringLossy_shouldReplaceInvalidBytesAndBom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.txt");
        fs::write(&path, b"\xEF\xBB\xBFcat \xFF dog").unwrap();

        let text = FileManager::read_to_string_lossy(&path).unwrap();

        assert_eq!(text, "cat \u{FFFD} dog");
    }

    #[test]
    fn test_writeAtomic_withExistingFile_shouldKeepOldContent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("cards.csv");

        FileManager::write_atomic(&path, b"old").unwrap();
        let second = FileManager::write_atomic(&path, b"new");

        assert!(second.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }
}
