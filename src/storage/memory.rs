use async_trait::async_trait;
use axum::body::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::StorageError;
use crate::storage::{BlobStore, TrackStore};
use crate::types::track::{NewTrack, TrackRecord, TrackUpdate};

#[derive(Default)]
pub struct MemoryTrackStore {
    records: DashMap<Uuid, TrackRecord>,
}

impl MemoryTrackStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TrackStore for MemoryTrackStore {
    async fn insert(&self, track: NewTrack) -> Result<TrackRecord, StorageError> {
        let record = track.into_record(Uuid::new_v4());
        self.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        id: Uuid,
        owner: &str,
        update: TrackUpdate,
    ) -> Result<TrackRecord, StorageError> {
        let mut record = self
            .records
            .get_mut(&id)
            .filter(|record| record.user_id == owner)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;

        if let Some(name) = update.name {
            record.name = name;
        }
        if let Some(description) = update.description {
            record.description = description;
        }

        Ok(record.clone())
    }

    async fn delete(&self, id: Uuid, owner: &str) -> Result<TrackRecord, StorageError> {
        self.records
            .remove_if(&id, |_, record| record.user_id == owner)
            .map(|(_, record)| record)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    async fn list_by_owner(&self, owner: &str) -> Result<Vec<TrackRecord>, StorageError> {
        let mut records: Vec<TrackRecord> = self
            .records
            .iter()
            .filter(|entry| entry.user_id == owner)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(records)
    }
}

pub struct MemoryBlobStore {
    base_url: String,
    objects: DashMap<String, Bytes>,
}

impl MemoryBlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, path: &str, bytes: Bytes) -> Result<(), StorageError> {
        match self.objects.entry(path.to_string()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(path.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(bytes);
                Ok(())
            }
        }
    }

    async fn download(&self, path: &str) -> Result<Bytes, StorageError> {
        self.objects
            .get(path)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn remove(&self, path: &str) -> Result<(), StorageError> {
        self.objects
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/files/{}", self.base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::track::TrackMetrics;
    use chrono::{Duration, TimeZone, Utc};

    fn new_track(owner: &str, name: &str, minutes: i64) -> NewTrack {
        NewTrack {
            user_id: owner.to_string(),
            name: name.to_string(),
            description: String::new(),
            gpx_path: format!("{owner}/{name}.gpx"),
            uploaded_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                + Duration::minutes(minutes),
            metrics: TrackMetrics::empty(),
        }
    }

    #[tokio::test]
    async fn lists_owner_tracks_newest_first() {
        let store = MemoryTrackStore::new();
        store.insert(new_track("alice", "old", 0)).await.unwrap();
        store.insert(new_track("alice", "new", 10)).await.unwrap();
        store.insert(new_track("bob", "other", 5)).await.unwrap();

        let names: Vec<_> = store
            .list_by_owner("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn update_and_delete_are_owner_scoped() {
        let store = MemoryTrackStore::new();
        let record = store.insert(new_track("alice", "ride", 0)).await.unwrap();

        let rename = TrackUpdate {
            name: Some("stolen".to_string()),
            description: None,
        };
        assert!(matches!(
            store.update(record.id, "bob", rename).await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            store.delete(record.id, "bob").await,
            Err(StorageError::NotFound(_))
        ));

        let rename = TrackUpdate {
            name: Some("morning ride".to_string()),
            description: Some("loop".to_string()),
        };
        let updated = store.update(record.id, "alice", rename).await.unwrap();
        assert_eq!(updated.name, "morning ride");
        assert_eq!(updated.description, "loop");

        let deleted = store.delete(record.id, "alice").await.unwrap();
        assert_eq!(deleted.id, record.id);
        assert!(store.list_by_owner("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blob_upload_rejects_existing_path() {
        let blobs = MemoryBlobStore::new("http://localhost:3000");
        blobs
            .upload("u/a.gpx", Bytes::from_static(b"<gpx/>"))
            .await
            .unwrap();
        assert!(matches!(
            blobs.upload("u/a.gpx", Bytes::from_static(b"x")).await,
            Err(StorageError::Conflict(_))
        ));
        assert_eq!(
            blobs.download("u/a.gpx").await.unwrap(),
            Bytes::from_static(b"<gpx/>")
        );
        assert_eq!(
            blobs.public_url("u/a.gpx"),
            "http://localhost:3000/files/u/a.gpx"
        );
        blobs.remove("u/a.gpx").await.unwrap();
        assert!(blobs.is_empty());
    }
}
