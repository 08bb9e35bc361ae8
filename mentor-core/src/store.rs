use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::RwLock;

/// A string-keyed store for raw bytes.
///
/// Stores have no knowledge of the values they hold; serialization is handled
/// by higher layers (see [`crate::HistoryStore`]). Every key is a single
/// document, overwritten as a whole.
///
/// All methods take `&self` to support stores with internal locking.
pub trait Store {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Retrieves the bytes stored under a key, or None if not present.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Stores bytes under the given key, replacing any previous value.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), Self::Error>;

    /// Deletes the value under a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), Self::Error>;
}

impl<S: Store> Store for &S {
    type Error = S::Error;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        (*self).get(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), Self::Error> {
        (*self).put(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        (*self).remove(key)
    }
}

/// An in-memory store backed by a HashMap.
///
/// Useful for testing and for sessions that should not outlive the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Store for MemoryStore {
    type Error = Infallible;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        Ok(self.data.read().unwrap().get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), Self::Error> {
        self.data
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        self.data.write().unwrap().remove(key);
        Ok(())
    }
}
