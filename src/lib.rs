pub mod auth;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod routes;
pub mod state;
pub mod storage;
pub mod types;

pub use pipeline::process::compute_metrics;
pub use types::track::TrackMetrics;
