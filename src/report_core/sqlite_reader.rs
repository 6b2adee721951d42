//! SQLite store reader (read-only, full-table snapshot)
//!
//! Opens the game database with `SQLITE_OPEN_READ_ONLY` and `query_only`, then
//! reads every source table in one session. A missing table or column is fatal:
//! the pipeline aborts before anything is written.

use super::rows::{
    RunRow, SeasonHistoryRow, SeasonRow, StarActionRow, StarPurchaseRow, StoreRow, StoreSnapshot,
    UserBadgeRow, UserBroadcastRow, UserRow, UserSeasonStatsRow, UserStatsRow,
};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ReaderError {
    Open { path: PathBuf, source: rusqlite::Error },
    Database { table: &'static str, source: rusqlite::Error },
}

impl std::fmt::Display for ReaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReaderError::Open { path, source } => {
                write!(f, "Cannot open store {}: {}", path.display(), source)
            }
            ReaderError::Database { table, source } => {
                write!(f, "Database error reading {}: {}", table, source)
            }
        }
    }
}

impl std::error::Error for ReaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReaderError::Open { source, .. } | ReaderError::Database { source, .. } => Some(source),
        }
    }
}

/// Read-only session over the game database
pub struct StoreReader {
    conn: Connection,
}

impl StoreReader {
    /// Open the store read-only; never creates the file
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, ReaderError> {
        let path = db_path.as_ref();
        let open_err = |source| ReaderError::Open {
            path: path.to_path_buf(),
            source,
        };

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(open_err)?;

        // Reject writes at the connection level too
        conn.execute_batch("PRAGMA query_only = ON").map_err(open_err)?;

        log::debug!("📥 Store opened read-only: {}", path.display());
        Ok(Self { conn })
    }

    /// Fetch every row of one table in store (rowid) order
    pub fn read_table<T: StoreRow>(&self) -> Result<Vec<T>, ReaderError> {
        let db_err = |source| ReaderError::Database {
            table: T::TABLE,
            source,
        };

        let sql = format!("SELECT * FROM {} ORDER BY rowid", T::TABLE);
        let mut stmt = self.conn.prepare(&sql).map_err(db_err)?;
        let rows = stmt.query_map([], |row| T::from_row(row)).map_err(db_err)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(db_err)?);
        }
        Ok(out)
    }

    /// Read all ten source tables inside one deferred read transaction, so
    /// every table reflects the same database state
    pub fn read_snapshot(&self) -> Result<StoreSnapshot, ReaderError> {
        let tx_err = |source| ReaderError::Database {
            table: "snapshot transaction",
            source,
        };
        // Rolled back on drop if any table fails
        let tx = self.conn.unchecked_transaction().map_err(tx_err)?;

        let snapshot = StoreSnapshot {
            users: self.read_table::<UserRow>()?,
            runs: self.read_table::<RunRow>()?,
            user_stats: self.read_table::<UserStatsRow>()?,
            user_badges: self.read_table::<UserBadgeRow>()?,
            user_broadcasts: self.read_table::<UserBroadcastRow>()?,
            seasons: self.read_table::<SeasonRow>()?,
            user_season_stats: self.read_table::<UserSeasonStatsRow>()?,
            season_history: self.read_table::<SeasonHistoryRow>()?,
            star_purchases: self.read_table::<StarPurchaseRow>()?,
            star_actions: self.read_table::<StarActionRow>()?,
        };
        tx.commit().map_err(tx_err)?;

        log::info!(
            "📥 Read store: {} users, {} runs, {} seasons, {} purchases",
            snapshot.users.len(),
            snapshot.runs.len(),
            snapshot.seasons.len(),
            snapshot.star_purchases.len()
        );
        Ok(snapshot)
    }
}
