use axum::extract::Multipart;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::pipeline::process;
use crate::state::AppState;
use crate::types::track::{NewTrack, TrackRecord, TrackUpdate};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tracks", get(list_tracks).post(upload_track))
        .route("/api/tracks/:id", patch(update_track).delete(delete_track))
}

#[derive(Serialize)]
struct TrackView {
    #[serde(flatten)]
    record: TrackRecord,
    file_url: String,
}

impl TrackView {
    fn new(state: &AppState, record: TrackRecord) -> Self {
        let file_url = state.blobs.public_url(&record.gpx_path);
        Self { record, file_url }
    }
}

async fn upload_track(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<TrackView>), AppError> {
    let mut file_bytes = None;
    let mut filename: Option<String> = None;
    let mut name: Option<String> = None;
    let mut description = String::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                filename = field.file_name().map(|s| s.to_string());
                file_bytes = Some(field.bytes().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read file bytes: {}", e))
                })?);
            }
            "name" | "description" => {
                let value = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read field {}: {}", field_name, e))
                })?;
                if field_name == "name" {
                    name = Some(value);
                } else {
                    description = value;
                }
            }
            _ => {}
        }
    }

    let bytes = file_bytes.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;
    let filename =
        filename.ok_or_else(|| AppError::BadRequest("No filename provided".to_string()))?;

    if !is_gpx_filename(&filename) {
        return Err(AppError::BadRequest("Unsupported file format".to_string()));
    }

    let uploaded_at = Utc::now();
    let gpx_path = format!(
        "{}/{}_{}_{}",
        user.id,
        uploaded_at.timestamp_millis(),
        Uuid::new_v4(),
        sanitize_filename(&filename)
    );

    state.blobs.upload(&gpx_path, bytes.clone()).await?;

    let metrics = process::compute_metrics_with(
        state.markup.as_ref(),
        &String::from_utf8_lossy(&bytes),
    );

    let name = name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| filename.clone());

    let new_track = NewTrack {
        user_id: user.id.clone(),
        name,
        description,
        gpx_path: gpx_path.clone(),
        uploaded_at,
        metrics,
    };

    let record = match state.tracks.insert(new_track).await {
        Ok(record) => record,
        Err(e) => {
            if let Err(cleanup) = state.blobs.remove(&gpx_path).await {
                tracing::warn!("Failed to remove orphaned file {}: {}", gpx_path, cleanup);
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        "Stored track {} for user {} ({} points, {:?} m)",
        record.id,
        user.id,
        record.metrics.point_count,
        record.distance_meters
    );

    Ok((StatusCode::CREATED, Json(TrackView::new(&state, record))))
}

async fn list_tracks(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<TrackView>>, AppError> {
    let records = state.tracks.list_by_owner(&user.id).await?;
    let views = records
        .into_iter()
        .map(|record| TrackView::new(&state, record))
        .collect();
    Ok(Json(views))
}

async fn update_track(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(update): Json<TrackUpdate>,
) -> Result<Json<TrackView>, AppError> {
    let update = TrackUpdate {
        name: match update.name {
            Some(name) if name.trim().is_empty() => {
                return Err(AppError::BadRequest("Track name cannot be empty".to_string()));
            }
            other => other.map(|n| n.trim().to_string()),
        },
        description: update.description,
    };

    let record = state.tracks.update(id, &user.id, update).await?;

    Ok(Json(TrackView::new(&state, record)))
}

async fn delete_track(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let record = state.tracks.delete(id, &user.id).await?;

    if let Err(e) = state.blobs.remove(&record.gpx_path).await {
        tracing::warn!("Track {} deleted but its file was not: {}", id, e);
    }

    tracing::info!("Deleted track {} for user {}", id, user.id);
    Ok(StatusCode::NO_CONTENT)
}

fn is_gpx_filename(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("gpx"))
}

/// Keeps the last path component and replaces anything outside
/// `[A-Za-z0-9._-]` so the blob path stays URL-safe.
fn sanitize_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    base.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_only_gpx_extension() {
        assert!(is_gpx_filename("ride.gpx"));
        assert!(is_gpx_filename("Ride.GPX"));
        assert!(!is_gpx_filename("ride.fit"));
        assert!(!is_gpx_filename("gpx"));
    }

    #[test]
    fn sanitized_filename_is_path_safe() {
        assert_eq!(sanitize_filename("../../etc/passwd.gpx"), "passwd.gpx");
        assert_eq!(sanitize_filename("Morning ride (1).gpx"), "Morning_ride__1_.gpx");
        assert_eq!(sanitize_filename("C:\\tracks\\łąka.gpx"), "__ka.gpx");
    }
}
