mod memory;

pub use memory::{MemoryBlobStore, MemoryTrackStore};

use async_trait::async_trait;
use axum::body::Bytes;
use uuid::Uuid;

use crate::error::StorageError;
use crate::types::track::{NewTrack, TrackRecord, TrackUpdate};

/// Track records, scoped by owner. A record owned by someone else is
/// reported as [`StorageError::NotFound`].
#[async_trait]
pub trait TrackStore: Send + Sync {
    async fn insert(&self, track: NewTrack) -> Result<TrackRecord, StorageError>;

    async fn update(
        &self,
        id: Uuid,
        owner: &str,
        update: TrackUpdate,
    ) -> Result<TrackRecord, StorageError>;

    /// Removes the record and returns it so the caller can clean up its file.
    async fn delete(&self, id: Uuid, owner: &str) -> Result<TrackRecord, StorageError>;

    /// Newest upload first.
    async fn list_by_owner(&self, owner: &str) -> Result<Vec<TrackRecord>, StorageError>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fails with [`StorageError::Conflict`] if `path` is taken.
    async fn upload(&self, path: &str, bytes: Bytes) -> Result<(), StorageError>;

    async fn download(&self, path: &str) -> Result<Bytes, StorageError>;

    async fn remove(&self, path: &str) -> Result<(), StorageError>;

    fn public_url(&self, path: &str) -> String;
}
