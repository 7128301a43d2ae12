//! RocksDB-backed durable cache for Hydrazine.

use std::path::Path;

use hydrazine_core::{CacheError, DurableCache};
use rocksdb::{DB, Options};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("RocksDB error: {0}")]
pub struct RocksError(#[from] rocksdb::Error);

impl From<RocksError> for CacheError {
    fn from(err: RocksError) -> Self {
        CacheError::new(err)
    }
}

/// A persistent cache of space metadata backed by RocksDB.
pub struct RocksCache {
    db: DB,
}

impl RocksCache {
    /// Opens a RocksDB cache at the given path.
    ///
    /// Creates the database if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RocksError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path)?;
        Ok(Self { db })
    }
}

impl DurableCache for RocksCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.db.get(key.as_bytes()).map_err(RocksError)?)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        self.db.put(key.as_bytes(), value).map_err(RocksError)?;
        Ok(())
    }

    fn has(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.db.get_pinned(key.as_bytes()).map_err(RocksError)?.is_some())
    }
}
