//! On-disk chat history for the mentor client.
//!
//! The conversation is saved as one JSON document under a single key, so the
//! store only ever sees a handful of whole-value overwrites. A fjall keyspace
//! is enough for that and survives restarts without a server.

use std::path::Path;

use fjall::{Database, Keyspace, KeyspaceCreateOptions};
use mentor_core::Store;
use thiserror::Error;

/// Keyspace holding the history snapshot unless another one is requested.
pub const DEFAULT_KEYSPACE: &str = "mentor";

#[derive(Debug, Error)]
#[error("history database error: {0}")]
pub struct FjallError(#[from] fjall::Error);

/// History storage in a fjall keyspace.
pub struct FjallStore {
    keyspace: Keyspace,
    // The keyspace handle is only valid while its database is open
    _database: Database,
}

impl FjallStore {
    /// Opens (or creates) the history database in `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, FjallError> {
        Self::open_keyspace(dir, DEFAULT_KEYSPACE)
    }

    /// Opens the history database in `dir`, keeping values in `name`.
    ///
    /// Separate keyspaces let several profiles share one directory.
    pub fn open_keyspace(dir: impl AsRef<Path>, name: &str) -> Result<Self, FjallError> {
        let database = Database::builder(dir).open()?;
        let keyspace = database.keyspace(name, KeyspaceCreateOptions::default)?;
        Ok(Self {
            keyspace,
            _database: database,
        })
    }
}

impl Store for FjallStore {
    type Error = FjallError;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        Ok(self.keyspace.get(key.as_bytes())?.map(|v| v.to_vec()))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), Self::Error> {
        self.keyspace.insert(key.as_bytes(), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        self.keyspace.remove(key.as_bytes())?;
        Ok(())
    }
}
