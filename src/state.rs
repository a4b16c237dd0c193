use std::sync::Arc;

use crate::config::Config;
use crate::pipeline::parse::{MarkupParser, XmlMarkupParser};
use crate::storage::{BlobStore, MemoryBlobStore, MemoryTrackStore, TrackStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tracks: Arc<dyn TrackStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub markup: Arc<dyn MarkupParser>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let blobs = Arc::new(MemoryBlobStore::new(config.public_base_url.clone()));
        Self::with_stores(config, Arc::new(MemoryTrackStore::new()), blobs)
    }

    pub fn with_stores(
        config: Config,
        tracks: Arc<dyn TrackStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            tracks,
            blobs,
            markup: Arc::new(XmlMarkupParser),
        }
    }
}
