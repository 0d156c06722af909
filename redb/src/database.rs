//! Ownership of the storage file and its scoped transactions.
//!
//! # Transactions
//!
//! [`Database::read`] runs a closure against a consistent MVCC snapshot.
//! Readers never wait for the writer. [`Database::write`] runs a closure in
//! the single write transaction: if the closure fails, every change it made is
//! rolled back; if it succeeds, the changes are committed before `write`
//! returns. redb serializes writers, so a read-modify-write sequence inside
//! one `write` call cannot interleave with another writer.
//!
//! # File lock
//!
//! redb holds an exclusive lock on the file while it is open. Opening waits at
//! most the configured lock timeout for another owner to let go, then fails
//! with `Busy`.

use crate::error::storage;
use redb::{ReadTransaction, TableDefinition, WriteTransaction};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use todokv_core::telemetry::STORAGE_ROLLBACKS_TOTAL;
use todokv_core::{TodoError, TodoResult};

/// A named, independently iterable keyspace: identifier to encoded record.
pub type Bucket = TableDefinition<'static, &'static str, &'static [u8]>;

/// Default bounded wait for the file lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(1);

/// Interval between attempts to take a held file lock.
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Storage file settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageConfig {
    /// Path of the database file; created if absent
    pub path: PathBuf,
    /// Bounded wait for the file lock
    pub lock_timeout: Duration,
}

impl StorageConfig {
    /// Settings for `path` with the default lock timeout.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Set the lock timeout.
    #[must_use]
    pub const fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }
}

/// The embedded key-value store.
///
/// Created once at process start, shared through an `Arc`, and closed exactly
/// once at shutdown with [`Database::close_shared`].
pub struct Database {
    inner: redb::Database,
    path: PathBuf,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database").field("path", &self.path).finish_non_exhaustive()
    }
}

impl Database {
    /// Opens (creating if absent) the database file at `path`.
    ///
    /// Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// - `Busy`: another owner kept the file lock for longer than `lock_timeout`
    /// - `Internal`: the file cannot be created or is not a valid database
    pub fn open(path: impl AsRef<Path>, lock_timeout: Duration) -> TodoResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                TodoError::internal_with_source(
                    format!("cannot create directory {}", parent.display()),
                    e,
                )
            })?;
        }

        let started = Instant::now();
        // None: the timeout is too large to represent, wait without bound
        let deadline = started.checked_add(lock_timeout);
        loop {
            match redb::Database::create(path) {
                Ok(inner) => {
                    tracing::info!(path = %path.display(), "Opened database");
                    return Ok(Self {
                        inner,
                        path: path.to_path_buf(),
                    });
                }
                Err(redb::DatabaseError::DatabaseAlreadyOpen) => {
                    let now = Instant::now();
                    if deadline.is_some_and(|d| now >= d) {
                        tracing::warn!(
                            path = %path.display(),
                            waited_ms = started.elapsed().as_millis(),
                            "Database lock not acquired"
                        );
                        return Err(TodoError::busy(format!(
                            "{} is locked; gave up after {lock_timeout:?}",
                            path.display()
                        )));
                    }
                    let remaining = deadline.map_or(LOCK_POLL_INTERVAL, |d| {
                        d.saturating_duration_since(now)
                    });
                    std::thread::sleep(LOCK_POLL_INTERVAL.min(remaining));
                }
                Err(e) => return Err(storage(e)),
            }
        }
    }

    /// Opens the database described by `config`.
    ///
    /// # Errors
    ///
    /// See [`Database::open`].
    pub fn open_with_config(config: &StorageConfig) -> TodoResult<Self> {
        Self::open(&config.path, config.lock_timeout)
    }

    /// Path of the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs `f` against a read-only snapshot.
    ///
    /// # Errors
    ///
    /// Propagates the closure's error, or `Internal` if no snapshot can be taken.
    pub fn read<T, F>(&self, f: F) -> TodoResult<T>
    where
        F: FnOnce(&ReadTransaction) -> TodoResult<T>,
    {
        let tx = self.inner.begin_read().map_err(storage)?;
        f(&tx)
    }

    /// Runs `f` inside the write transaction, committing on success and
    /// rolling back on failure.
    ///
    /// # Errors
    ///
    /// Propagates the closure's error after rolling back, or `Internal` if the
    /// transaction cannot begin or commit.
    pub fn write<T, F>(&self, f: F) -> TodoResult<T>
    where
        F: FnOnce(&WriteTransaction) -> TodoResult<T>,
    {
        let tx = self.inner.begin_write().map_err(storage)?;
        match f(&tx) {
            Ok(value) => {
                tx.commit().map_err(storage)?;
                Ok(value)
            }
            Err(err) => {
                metrics::counter!(STORAGE_ROLLBACKS_TOTAL, "reason" => err.kind().as_str())
                    .increment(1);
                if let Err(abort) = tx.abort() {
                    tracing::error!(error = %abort, "Failed to roll back transaction");
                }
                Err(err)
            }
        }
    }

    /// Creates `bucket` if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `Internal` on storage failure.
    pub fn ensure_bucket(&self, bucket: Bucket) -> TodoResult<()> {
        self.write(|tx| {
            tx.open_table(bucket).map_err(storage)?;
            Ok(())
        })
    }

    /// Closes the file, releasing its lock.
    ///
    /// # Errors
    ///
    /// Currently infallible; the signature leaves room for a final flush.
    pub fn close(self) -> TodoResult<()> {
        let Self { inner, path } = self;
        drop(inner);
        tracing::info!(path = %path.display(), "Closed database");
        Ok(())
    }

    /// Closes a shared database once every other owner has let go.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if other owners still hold the handle; the handle
    /// passed in is dropped either way.
    pub fn close_shared(db: Arc<Self>) -> TodoResult<()> {
        match Arc::try_unwrap(db) {
            Ok(db) => db.close(),
            Err(shared) => Err(TodoError::internal(format!(
                "database still in use by {} other owners",
                Arc::strong_count(&shared) - 1
            ))),
        }
    }
}
