//! Catalogue store.
//!
//! # Data Flow
//! ```text
//! snapshot file (JSON)
//!     → Store::open (load tables, empty when missing)
//!     → Store::read (shared lock, lookups)
//!     → Store::transaction (exclusive lock, undo log)
//!         Ok    → commit, optional snapshot write after the lock is released
//!         Err   → rollback, nothing visible
//!         panic → rollback as the transaction unwinds
//! ```
//!
//! # Design Decisions
//! - One lock for the whole catalogue; a write transaction sees and blocks everything
//! - Check-then-write sequences run entirely inside one transaction
//! - Snapshot writes after commit are best effort; failures are logged

pub mod models;
pub mod tables;
pub mod transaction;

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use thiserror::Error;

use crate::config::StoreConfig;

pub use models::{
    Feature, GeneLink, NewGeneLink, Organism, Picture, PictureGeneId, PictureMgdb, PictureNote,
    SearchHistory, Tag, TagGroup, User, Variation,
};
pub use tables::{TableCounts, Tables};
pub use transaction::Transaction;

/// Errors raised by the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write would break a reference or uniqueness rule.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("no row {id} in {table}")]
    NotFound { table: &'static str, id: u64 },

    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot format error: {0}")]
    Format(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The catalogue behind a single read/write lock.
pub struct Store {
    tables: RwLock<Tables>,
    snapshot_path: Option<PathBuf>,
    persist_on_commit: bool,
    /// Serializes snapshot file writes in commit order.
    persist_lock: Mutex<()>,
}

impl Store {
    /// A store over the given tables, without persistence.
    pub fn new(tables: Tables) -> Self {
        Self {
            tables: RwLock::new(tables),
            snapshot_path: None,
            persist_on_commit: false,
            persist_lock: Mutex::new(()),
        }
    }

    /// Open the store described by the configuration.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let tables = match &config.snapshot_path {
            Some(path) => Self::load_snapshot(Path::new(path))?,
            None => Tables::default(),
        };
        Ok(Self {
            tables: RwLock::new(tables),
            snapshot_path: config.snapshot_path.as_ref().map(PathBuf::from),
            persist_on_commit: config.persist_on_commit,
            persist_lock: Mutex::new(()),
        })
    }

    /// Load tables from a snapshot file; a missing file is an empty catalogue.
    pub fn load_snapshot(path: &Path) -> StoreResult<Tables> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "No snapshot found, starting with an empty catalogue");
            return Ok(Tables::default());
        }
        let reader = BufReader::new(File::open(path)?);
        let tables: Tables = serde_json::from_reader(reader)?;
        let counts = tables.counts();
        tracing::info!(
            path = %path.display(),
            pictures = counts.pictures,
            tags = counts.tags,
            gene_links = counts.gene_links,
            "Loaded catalogue snapshot"
        );
        Ok(tables)
    }

    /// Write the tables to the configured snapshot path, if any.
    pub fn save(&self) -> StoreResult<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };
        // Tables lock before persist lock, as in `transaction`.
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let _persist = self.persist_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let bytes = serde_json::to_vec_pretty(&*tables);
        drop(tables);
        Self::write_snapshot(path, &bytes?)
    }

    fn write_snapshot(path: &Path, bytes: &[u8]) -> StoreResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(bytes)?;
        writer.flush()?;
        tracing::debug!(path = %path.display(), "Saved catalogue snapshot");
        Ok(())
    }

    /// Run a read-only closure against the tables.
    pub fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> T {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        f(&tables)
    }

    /// Run `f` inside a write transaction.
    ///
    /// All changes are kept when `f` returns `Ok` and undone when it returns
    /// `Err` or panics. With `persist_on_commit`, the snapshot is serialized
    /// under the write lock and written to disk after the lock is released.
    pub fn transaction<T, E>(
        &self,
        f: impl FnOnce(&mut Transaction<'_>) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let mut tx = Transaction::new(&mut tables);
        let value = match f(&mut tx) {
            Ok(value) => value,
            Err(e) => {
                tx.rollback();
                return Err(e);
            }
        };
        let changed = tx.change_count() > 0;
        tx.commit();

        let path = match &self.snapshot_path {
            Some(path) if changed && self.persist_on_commit => path,
            _ => return Ok(value),
        };
        let persist = self.persist_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let bytes = serde_json::to_vec_pretty(&*tables);
        drop(tables);

        let written = bytes
            .map_err(StoreError::from)
            .and_then(|bytes| Self::write_snapshot(path, &bytes));
        drop(persist);
        if let Err(e) = written {
            tracing::error!(error = %e, "Failed to persist snapshot after commit");
        }
        Ok(value)
    }

    pub fn counts(&self) -> TableCounts {
        self.read(Tables::counts)
    }
}
