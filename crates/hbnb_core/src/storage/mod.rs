//! Object registry abstractions and the JSON file implementation.
//!
//! # Responsibility
//! - Define the registry contract used by the service layer.
//! - Keep file format and locking details inside the storage boundary.
//!
//! # Invariants
//! - Registry keys are always `"<Kind>.<id>"` of the stored instance.
//! - After a successful `save()`, the file reflects the in-memory mapping.

use crate::model::instance::Instance;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod file_storage;

pub use file_storage::FileStorage;

pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence error for registry load/save.
#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    Serialize(serde_json::Error),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Serialize(err) => write!(f, "failed to serialize registry: {err}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Serialize(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

/// Registry interface for live instances.
pub trait ObjectStore {
    /// Inserts under the instance key, replacing any previous entry.
    fn new(&mut self, instance: Instance);
    fn all(&self) -> &BTreeMap<String, Instance>;
    fn get(&self, key: &str) -> Option<&Instance>;
    fn get_mut(&mut self, key: &str) -> Option<&mut Instance>;
    /// Removes one entry; returns whether it existed.
    fn delete(&mut self, key: &str) -> bool;
    /// Persists the full mapping.
    fn save(&self) -> StorageResult<()>;
    /// Replaces the in-memory mapping with persisted state.
    fn reload(&mut self) -> StorageResult<()>;
}
