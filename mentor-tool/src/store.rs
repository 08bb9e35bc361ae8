use std::path::{Path, PathBuf};

use mentor_core::{MemoryStore, Store};
use mentor_fjall::FjallStore;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnyStoreError {
    #[error("fjall error: {0}")]
    Fjall(#[from] mentor_fjall::FjallError),
}

impl From<std::convert::Infallible> for AnyStoreError {
    fn from(e: std::convert::Infallible) -> Self {
        match e {}
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreType {
    #[default]
    Fjall,
    Memory,
}

impl std::str::FromStr for StoreType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fjall" => Ok(StoreType::Fjall),
            "memory" | "mem" => Ok(StoreType::Memory),
            _ => Err(format!("unknown store type: {}", s)),
        }
    }
}

impl std::fmt::Display for StoreType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreType::Fjall => write!(f, "fjall"),
            StoreType::Memory => write!(f, "memory"),
        }
    }
}

pub enum AnyStore {
    Fjall(FjallStore),
    Memory(MemoryStore),
}

impl AnyStore {
    pub fn open(store_type: StoreType, path: impl AsRef<Path>) -> Result<Self, AnyStoreError> {
        match store_type {
            StoreType::Fjall => Ok(Self::Fjall(FjallStore::open(path)?)),
            StoreType::Memory => Ok(Self::Memory(MemoryStore::new())),
        }
    }
}

impl Store for AnyStore {
    type Error = AnyStoreError;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        match self {
            AnyStore::Fjall(s) => s.get(key).map_err(Into::into),
            AnyStore::Memory(s) => s.get(key).map_err(Into::into),
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), Self::Error> {
        match self {
            AnyStore::Fjall(s) => s.put(key, value).map_err(Into::into),
            AnyStore::Memory(s) => s.put(key, value).map_err(Into::into),
        }
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        match self {
            AnyStore::Fjall(s) => s.remove(key).map_err(Into::into),
            AnyStore::Memory(s) => s.remove(key).map_err(Into::into),
        }
    }
}

pub fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mentor")
        .join("store")
}
