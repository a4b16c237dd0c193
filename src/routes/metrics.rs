use axum::{body::Bytes, extract::State, routing::post, Json, Router};

use crate::pipeline::process;
use crate::state::AppState;
use crate::types::track::TrackMetrics;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/metrics", post(metrics))
}

/// Preview of what an upload would record. Nothing is stored.
async fn metrics(State(state): State<AppState>, body: Bytes) -> Json<TrackMetrics> {
    let metrics =
        process::compute_metrics_with(state.markup.as_ref(), &String::from_utf8_lossy(&body));
    tracing::debug!("Computed metrics for {} trackpoints", metrics.point_count);
    Json(metrics)
}
