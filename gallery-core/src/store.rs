use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::object::{guess_content_type, ObjectEntry};

/// Errors carry the upstream message verbatim; callers surface it as-is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Upstream(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Read side of the bucket as the gateway sees it.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Every object in the bucket.
    async fn list_objects(&self) -> StoreResult<Vec<ObjectEntry>>;

    async fn get_object(&self, key: &str) -> StoreResult<StoredObject>;
}

/// Bucket held in memory, keyed like S3 (lexicographic listing order).
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    objects: BTreeMap<String, StoredObject>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, body: impl Into<Bytes>) {
        let key = key.into();
        let content_type = if key.ends_with('/') {
            None
        } else {
            Some(guess_content_type(&key).to_string())
        };
        self.objects.insert(
            key,
            StoredObject {
                content_type,
                body: body.into(),
            },
        );
    }

    pub fn with(mut self, key: impl Into<String>, body: impl Into<Bytes>) -> Self {
        self.insert(key, body);
        self
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_objects(&self) -> StoreResult<Vec<ObjectEntry>> {
        Ok(self
            .objects
            .iter()
            .map(|(key, obj)| ObjectEntry::new(key.clone(), obj.body.len() as u64))
            .collect())
    }

    async fn get_object(&self, key: &str) -> StoreResult<StoredObject> {
        self.objects
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("NoSuchKey: The specified key does not exist: {key}")))
    }
}
