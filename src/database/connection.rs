/*!
 * Database connection management.
 *
 * This module handles SQLite database connection creation, initialization,
 * and provides async-safe access patterns using tokio's spawn_blocking.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::schema;

/// Default database filename
const DEFAULT_DB_FILENAME: &str = "vocab.db";

/// Default database directory name under user's data directory
const DEFAULT_DB_DIRNAME: &str = "bilinguo";

/// Path reported for in-memory databases
const IN_MEMORY_PATH: &str = ":memory:";

/// Database connection wrapper with thread-safe access
#[derive(Clone)]
pub struct DatabaseConnection {
    /// Path to the database file
    db_path: PathBuf,
    /// Thread-safe connection wrapped in Arc<Mutex>
    connection: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for DatabaseConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConnection")
            .field("db_path", &self.db_path)
            .finish()
    }
}

impl DatabaseConnection {
    /// Open (or create) the database at the specified path
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }

        info!("Opening vocabulary database at: {:?}", db_path);

        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open database: {:?}", db_path))?;

        schema::initialize_schema(&conn)?;

        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        debug!("Creating in-memory database");

        let conn =
            Connection::open_in_memory().context("Failed to create in-memory database")?;

        schema::initialize_schema(&conn)?;

        Ok(Self {
            db_path: PathBuf::from(IN_MEMORY_PATH),
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Get the default database path
    pub fn default_database_path() -> Result<PathBuf> {
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

        Ok(base_dir.join(DEFAULT_DB_DIRNAME).join(DEFAULT_DB_FILENAME))
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Whether this connection is backed by memory only
    pub fn is_in_memory(&self) -> bool {
        self.db_path.as_os_str() == IN_MEMORY_PATH
    }

    /// Execute a database operation with the connection
    ///
    /// This acquires the mutex and blocks the calling thread. For async
    /// contexts, use `execute_async`.
    pub fn execute<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .connection
            .lock()
            .map_err(|e| anyhow::anyhow!("Failed to acquire database lock: {}", e))?;

        f(&conn)
    }

    /// Execute a database operation asynchronously using spawn_blocking
    pub async fn execute_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.connection.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| anyhow::anyhow!("Failed to acquire database lock: {}", e))?;

            f(&conn)
        })
        .await
        .context("Database task panicked")?
    }

    /// Run `f` inside a transaction on the blocking pool; commits only if `f` succeeds
    ///
    /// Dropping the transaction on error rolls it back, so a failed batch
    /// leaves no rows behind.
    pub async fn transaction_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&rusqlite::Transaction) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.connection.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| anyhow::anyhow!("Failed to acquire database lock: {}", e))?;

            let tx = conn.transaction()?;
            let result = f(&tx)?;
            tx.commit()?;

            Ok(result)
        })
        .await
        .context("Database transaction task panicked")?
    }

    /// Size of the database file, zero for in-memory databases
    pub fn file_size_bytes(&self) -> u64 {
        if self.is_in_memory() {
            return 0;
        }
        std::fs::metadata(&self.db_path)
            .map(|m| m.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newInMemory_shouldCreateValidConnection() {
        let db = DatabaseConnection::new_in_memory().expect("Failed to create in-memory DB");
        assert!(db.is_in_memory());
        assert_eq!(db.file_size_bytes(), 0);
    }

    #[test]
    fn test_new_withFilePath_shouldCreateParentDirectories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("vocab.db");

        let db = DatabaseConnection::new(&path).expect("Failed to open file database");

        assert!(path.exists());
        assert!(!db.is_in_memory());
        assert_eq!(db.path(), path.as_path());
    }

    #[tokio::test]
    async fn test_transactionAsync_shouldCommitOnSuccess() {
        let db = DatabaseConnection::new_in_memory().expect("Failed to create DB");

        db.transaction_async(|tx| {
            tx.execute(
                "INSERT INTO words (word, source, created_at) VALUES ('tx', 'manual', '2024-01-01T00:00:00.000000Z')",
                [],
            )?;
            Ok(())
        })
        .await
        .expect("Transaction failed");

        let count: i64 = db
            .execute(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM words", [], |row| row.get(0))?))
            .unwrap();

        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_executeAsync_shouldRunInBlockingContext() {
        let db = DatabaseConnection::new_in_memory().expect("Failed to create DB");

        let result = db
            .execute_async(|conn| {
                let value: i64 = conn.query_row("SELECT 42", [], |row| row.get(0))?;
                Ok(value)
            })
            .await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_transactionAsync_withError_shouldLeaveNoRows() {
        let db = DatabaseConnection::new_in_memory().expect("Failed to create DB");

        let result = db
            .transaction_async(|tx| {
                tx.execute(
                    "INSERT INTO words (word, source, created_at) VALUES ('a', 'manual', '2024-01-01T00:00:00.000000Z')",
                    [],
                )?;
                // Duplicate key fails the second statement
                tx.execute(
                    "INSERT INTO words (word, source, created_at) VALUES ('a', 'manual', '2024-01-01T00:00:00.000000Z')",
                    [],
                )?;
                Ok(())
            })
            .await;
        assert!(result.is_err());

        let count: i64 = db
            .execute_async(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM words", [], |row| row.get(0))?))
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
