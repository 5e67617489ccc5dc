//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database. The loader, clusterer, and
//! runner call store methods — they never execute SQL directly.

mod candidates;
mod outputs;

pub use outputs::{structuring_score, AlertRow, ClusterRow};

use crate::config::OutputTables;
use crate::error::DetectResult;
use rusqlite::Connection;

pub struct DetectStore {
    conn: Connection,
}

impl DetectStore {
    /// Open (or create) the transaction database at `path`.
    pub fn open(path: &str) -> DetectResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> DetectResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Bootstrap the source schema (fixed external contract, carried
    /// verbatim). Production databases arrive with these relations already in
    /// place; tests and ad-hoc tooling start from empty files.
    pub fn migrate(&self) -> DetectResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_source_schema.sql"))?;
        Ok(())
    }

    /// Create the configured output relations if missing. Their schemas are a
    /// fixed external contract; only the names vary.
    pub fn ensure_output_tables(&self, tables: &OutputTables) -> DetectResult<()> {
        self.conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {clusters} (
               cluster_id TEXT PRIMARY KEY,
               account_id TEXT NOT NULL,
               customer_id TEXT,
               start_ts_utc TEXT NOT NULL,
               end_ts_utc TEXT NOT NULL,
               tx_count INTEGER NOT NULL,
               total_amount_minor INTEGER NOT NULL,
               params_json TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS {cluster_tx} (
               cluster_id TEXT NOT NULL,
               tx_id TEXT NOT NULL,
               PRIMARY KEY (cluster_id, tx_id)
             );
             CREATE TABLE IF NOT EXISTS {alert_tx} (
               alert_id TEXT NOT NULL,
               tx_id TEXT NOT NULL,
               PRIMARY KEY (alert_id, tx_id)
             );",
            clusters = tables.clusters,
            cluster_tx = tables.cluster_tx,
            alert_tx = tables.alert_tx,
        ))?;
        Ok(())
    }
}
