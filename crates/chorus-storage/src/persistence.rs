//! Result persistence layer
//!
//! Provides SQLite-based persistence for completed analyses with:
//! - One append-only row per analysis (`test_results`)
//! - A single writer connection behind a mutex, plus SQLite's busy timeout
//!   for writers in other processes
//! - Newest-first queries for history, disagreements, and statistics

use async_trait::async_trait;
use chorus_core::{
    Confidence, ConsensusVerdict, Error, ModelId, Result, ResultStore, StoreStats, StoredTestResult,
    StoredVote,
};
use parking_lot::Mutex;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS test_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    prompt TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    claude_safe INTEGER NOT NULL,
    claude_reasoning TEXT,
    gpt5_safe INTEGER NOT NULL,
    gpt5_reasoning TEXT,
    llama_safe INTEGER NOT NULL,
    llama_reasoning TEXT,
    consensus_verdict TEXT NOT NULL,
    consensus_confidence TEXT NOT NULL,
    flagged_by TEXT
);
CREATE INDEX IF NOT EXISTS idx_test_results_verdict ON test_results (consensus_verdict);
";

const SELECT_COLUMNS: &str = "SELECT id, prompt, timestamp,
    claude_safe, claude_reasoning, gpt5_safe, gpt5_reasoning, llama_safe, llama_reasoning,
    consensus_verdict, consensus_confidence, flagged_by
 FROM test_results";

/// Configuration for result persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// How long a writer waits on a locked database (seconds)
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            busy_timeout_secs: default_busy_timeout(),
        }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("chorus_results.db")
}

fn default_busy_timeout() -> u64 {
    30
}

/// SQLite-backed `ResultStore`
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (creating if needed) the database described by `config`
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let conn = Connection::open(&config.database_path).map_err(storage_error)?;
        conn.busy_timeout(Duration::from_secs(config.busy_timeout_secs))
            .map_err(storage_error)?;
        init_schema(&conn)?;

        info!("Result store opened at {:?}", config.database_path);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(config.database_path.clone()),
        })
    }

    /// Open a database at the given path with default settings
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(&StoreConfig {
            database_path: path.as_ref().to_path_buf(),
            ..Default::default()
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(storage_error)?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    /// Path of the backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run blocking SQLite work off the async executor
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&guard)
        })
        .await
        .map_err(|e| Error::internal(format!("storage task failed: {}", e)))?
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA).map_err(storage_error)
}

fn storage_error(e: rusqlite::Error) -> Error {
    Error::storage(e.to_string())
}

fn insert(conn: &Connection, record: &StoredTestResult) -> Result<i64> {
    let [claude, gpt5, llama] = &record.votes;
    conn.execute(
        "INSERT INTO test_results (
            prompt, timestamp,
            claude_safe, claude_reasoning,
            gpt5_safe, gpt5_reasoning,
            llama_safe, llama_reasoning,
            consensus_verdict, consensus_confidence, flagged_by
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            record.prompt,
            record.timestamp,
            claude.safe as i64,
            claude.reasoning,
            gpt5.safe as i64,
            gpt5.reasoning,
            llama.safe as i64,
            llama.reasoning,
            record.verdict.as_str(),
            record.confidence.as_str(),
            record.flagged_by_joined(),
        ],
    )
    .map_err(storage_error)?;

    Ok(conn.last_insert_rowid())
}

/// A row as SQLite returns it, before enum parsing
struct RawRow {
    id: i64,
    prompt: String,
    timestamp: String,
    votes: [(i64, Option<String>); 3],
    verdict: String,
    confidence: String,
    flagged_by: Option<String>,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            prompt: row.get(1)?,
            timestamp: row.get(2)?,
            votes: [
                (row.get(3)?, row.get(4)?),
                (row.get(5)?, row.get(6)?),
                (row.get(7)?, row.get(8)?),
            ],
            verdict: row.get(9)?,
            confidence: row.get(10)?,
            flagged_by: row.get(11)?,
        })
    }

    fn into_record(self) -> Result<StoredTestResult> {
        let [claude, gpt5, llama] = self.votes;
        let vote = |model: ModelId, (safe, reasoning): (i64, Option<String>)| StoredVote {
            model,
            safe: safe != 0,
            reasoning: reasoning.unwrap_or_default(),
        };

        let id = self.id;
        let corrupt = |e: Error| Error::storage(format!("row {} is corrupt: {}", id, e));

        Ok(StoredTestResult {
            id: Some(id),
            prompt: self.prompt,
            timestamp: self.timestamp,
            votes: [
                vote(ModelId::Claude, claude),
                vote(ModelId::Gpt5, gpt5),
                vote(ModelId::Llama, llama),
            ],
            verdict: self.verdict.parse::<ConsensusVerdict>().map_err(corrupt)?,
            confidence: self.confidence.parse::<Confidence>().map_err(corrupt)?,
            flagged_by: StoredTestResult::parse_flagged_by(
                self.flagged_by.as_deref().unwrap_or(""),
            )
            .map_err(corrupt)?,
        })
    }
}

fn query_rows(conn: &Connection, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<StoredTestResult>> {
    let mut stmt = conn.prepare_cached(sql).map_err(storage_error)?;
    let rows = stmt
        .query_map(args, RawRow::from_row)
        .map_err(storage_error)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(storage_error)?;

    rows.into_iter().map(RawRow::into_record).collect()
}

#[async_trait]
impl ResultStore for SqliteStore {
    async fn append(&self, record: &StoredTestResult) -> Result<i64> {
        let record = record.clone();
        let id = self.with_conn(move |conn| insert(conn, &record)).await?;
        debug!(row_id = id, "Stored analysis result");
        Ok(id)
    }

    async fn read_all(&self) -> Result<Vec<StoredTestResult>> {
        self.with_conn(|conn| {
            let sql = format!("{} ORDER BY timestamp DESC, id DESC", SELECT_COLUMNS);
            query_rows(conn, &sql, &[])
        })
        .await
    }

    async fn read_disagreements(&self) -> Result<Vec<StoredTestResult>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE consensus_verdict = ?1 ORDER BY timestamp DESC, id DESC",
                SELECT_COLUMNS
            );
            query_rows(conn, &sql, &[&ConsensusVerdict::ReviewRequired.as_str()])
        })
        .await
    }

    async fn read_stats(&self) -> Result<StoreStats> {
        self.with_conn(|conn| {
            let total: i64 = conn
                .query_row("SELECT COUNT(*) FROM test_results", [], |row| row.get(0))
                .map_err(storage_error)?;

            let mut stmt = conn
                .prepare_cached(
                    "SELECT consensus_verdict, COUNT(*) FROM test_results GROUP BY consensus_verdict",
                )
                .map_err(storage_error)?;
            let counts = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
                .map_err(storage_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(storage_error)?;

            let mut stats = StoreStats {
                total_tests: total as u64,
                ..Default::default()
            };
            for (verdict, count) in counts {
                let verdict = verdict
                    .parse::<ConsensusVerdict>()
                    .map_err(|e| Error::storage(format!("unknown stored verdict: {}", e)))?;
                stats.by_verdict.insert(verdict, count as u64);
            }
            Ok(stats)
        })
        .await
    }
}
