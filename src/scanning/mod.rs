use std::path::PathBuf;

use enum_dispatch::enum_dispatch;
use serde_json::Value;
use thiserror::Error;

pub mod camera;
pub mod decoder;
pub mod record;
pub mod session;
pub mod storage;
pub mod store;

#[cfg(test)]
mod store_tests;

use storage::{FileStorage, MemoryStorage};

#[derive(Debug, PartialEq, Error)]
pub enum DecodeError {
    #[error("Invalid QR format: {0}")]
    InvalidFormat(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access store file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("store file {path} is not a JSON object: {source}")]
    MalformedFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("store entry `{key}` is not a list of scan records: {source}")]
    MalformedEntry {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode scan records: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A keyed map of JSON values, the persistence seam behind the scan store.
#[enum_dispatch]
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError>;
}

#[enum_dispatch(KeyValueStorage)]
pub enum Storage {
    FileStorage,
    MemoryStorage,
}

/// Yes/no decision taken by the user before a record is stored or deleted.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> bool;
}

/// Answers every question the same way, used for `--yes`.
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm(&mut self, _question: &str) -> bool {
        self.0
    }
}
