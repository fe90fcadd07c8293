//! SQLite store implementation (the persistent backend).
//!
//! Two append-only relations, provisioned at startup:
//!
//! ```text
//! survey_results(id, survey_name, survey_language, survey_data, submitted_at)
//! survey_impressions(id, survey_name, survey_language, impression_time)
//! ```
//!
//! All statements are parameterized. Timestamps are stored as RFC 3339 text;
//! the answer payload is stored as JSON text and round-trips unaltered.

use super::{ImpressionRecord, RecordId, ResultRecord, SurveyStore};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Persistent append-only store over a single SQLite database.
///
/// The connection is serialized behind a mutex; appends are single-statement
/// inserts, so no transaction spans a lock release.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and provision the relations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the database cannot be opened or the
    /// tables cannot be created. Startup treats this as fatal.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| Error::Storage(format!("failed to open database: {e}")))?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database (tests, ephemeral runs).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if provisioning fails.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Storage(format!("failed to open database: {e}")))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            CREATE TABLE IF NOT EXISTS survey_results (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              survey_name TEXT NOT NULL,
              survey_language TEXT NOT NULL,
              survey_data TEXT NOT NULL,
              submitted_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS survey_impressions (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              survey_name TEXT NOT NULL,
              survey_language TEXT NOT NULL,
              impression_time TEXT NOT NULL
            );
            ",
        )
        .map_err(|e| Error::Storage(format!("failed to provision tables: {e}")))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Number of stored results.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] on query failure.
    pub fn result_count(&self) -> Result<u64> {
        let conn = self.conn();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM survey_results", [], |row| row.get(0))
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(count.unsigned_abs())
    }

    /// Number of stored impressions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] on query failure.
    pub fn impression_count(&self) -> Result<u64> {
        let conn = self.conn();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM survey_impressions", [], |row| {
                row.get(0)
            })
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(count.unsigned_abs())
    }

    /// Read all stored results in append order.
    ///
    /// Verification/reporting helper; the serving path never reads this
    /// relation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] on query failure or on a row that does not
    /// parse back into a record.
    pub fn results(&self) -> Result<Vec<ResultRecord>> {
        let rows: Vec<(String, String, String, String)> = {
            let conn = self.conn();
            let mut stmt = conn
                .prepare(
                    "SELECT survey_name, survey_language, survey_data, submitted_at
                     FROM survey_results ORDER BY id",
                )
                .map_err(|e| Error::Storage(e.to_string()))?;
            let collected = stmt
                .query_map([], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
                })
                .map_err(|e| Error::Storage(e.to_string()))?
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| Error::Storage(e.to_string()))?;
            collected
        };

        rows.into_iter()
            .map(|(name, language, data, submitted_at)| {
                let data = serde_json::from_str(&data)
                    .map_err(|e| Error::Storage(format!("corrupt survey_data: {e}")))?;
                let submitted_at = parse_timestamp(&submitted_at)?;
                Ok(ResultRecord::new(name, language, data).with_submitted_at(submitted_at))
            })
            .collect()
    }

    /// Read all stored impressions in append order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] on query failure or on a row that does not
    /// parse back into a record.
    pub fn impressions(&self) -> Result<Vec<ImpressionRecord>> {
        let rows: Vec<(String, String, String)> = {
            let conn = self.conn();
            let mut stmt = conn
                .prepare(
                    "SELECT survey_name, survey_language, impression_time
                     FROM survey_impressions ORDER BY id",
                )
                .map_err(|e| Error::Storage(e.to_string()))?;
            let collected = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
                .map_err(|e| Error::Storage(e.to_string()))?
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| Error::Storage(e.to_string()))?;
            collected
        };

        rows.into_iter()
            .map(|(name, language, impression_time)| {
                let impression_time = parse_timestamp(&impression_time)?;
                Ok(ImpressionRecord::new(name, language).with_impression_time(impression_time))
            })
            .collect()
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Storage(format!("corrupt timestamp: {e}")))
}

impl SurveyStore for SqliteStore {
    async fn append_result(&self, record: ResultRecord) -> Result<RecordId> {
        let payload = serde_json::to_string(record.survey_data())
            .map_err(|e| Error::Storage(format!("unserializable survey_data: {e}")))?;
        let conn = self.conn();
        conn.execute(
            "INSERT INTO survey_results (survey_name, survey_language, survey_data, submitted_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.survey_name(),
                record.survey_language(),
                payload,
                record.submitted_at().to_rfc3339(),
            ],
        )
        .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(RecordId::new(conn.last_insert_rowid().unsigned_abs()))
    }

    async fn append_impression(&self, record: ImpressionRecord) -> Result<RecordId> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO survey_impressions (survey_name, survey_language, impression_time)
             VALUES (?1, ?2, ?3)",
            params![
                record.survey_name(),
                record.survey_language(),
                record.impression_time().to_rfc3339(),
            ],
        )
        .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(RecordId::new(conn.last_insert_rowid().unsigned_abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_result_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let data = serde_json::json!({"q1": 5, "comment": "fine"});

        store
            .append_result(ResultRecord::new("new-feature-poll-a", "en", data.clone()))
            .await
            .unwrap();

        let rows = store.results().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].survey_name(), "new-feature-poll-a");
        assert_eq!(rows[0].survey_data(), &data);
    }

    #[tokio::test]
    async fn test_sqlite_impression_append() {
        let store = SqliteStore::open_in_memory().unwrap();

        let first = store
            .append_impression(ImpressionRecord::new("customer-feedback-a", "en"))
            .await
            .unwrap();
        let second = store
            .append_impression(ImpressionRecord::new("customer-feedback-b", "en"))
            .await
            .unwrap();

        assert_ne!(first, second);
        assert_eq!(store.impression_count().unwrap(), 2);
        let rows = store.impressions().unwrap();
        assert_eq!(rows[0].survey_name(), "customer-feedback-a");
        assert_eq!(rows[1].survey_name(), "customer-feedback-b");
    }

    #[tokio::test]
    async fn test_provisioning_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rotor.sqlite");

        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .append_impression(ImpressionRecord::new("v", "en"))
                .await
                .unwrap();
        }

        // Reopening must keep existing rows.
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.impression_count().unwrap(), 1);
    }
}
