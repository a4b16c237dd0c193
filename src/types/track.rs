use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    pub time: Option<DateTime<Utc>>,
}

/// Summary of one uploaded track file. Computed once at upload and stored
/// with the record as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackMetrics {
    pub point_count: usize,
    /// Rounded to whole meters. `None` when the track has no points.
    pub total_distance_meters: Option<f64>,
    /// Rounded to whole seconds. `None` without two timestamped endpoints
    /// or when the last timestamp precedes the first.
    pub duration_seconds: Option<u64>,
    /// Only present when the duration is strictly positive.
    pub average_speed_meters_per_second: Option<f64>,
    pub start_date: Option<NaiveDate>,
}

impl TrackMetrics {
    pub fn empty() -> Self {
        Self {
            point_count: 0,
            total_distance_meters: None,
            duration_seconds: None,
            average_speed_meters_per_second: None,
            start_date: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackRecord {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub description: String,
    pub gpx_path: String,
    pub uploaded_at: DateTime<Utc>,
    pub activity_date: Option<NaiveDate>,
    pub distance_meters: Option<f64>,
    pub duration_seconds: Option<u64>,
    pub avg_speed_m_s: Option<f64>,
    pub metrics: TrackMetrics,
}

#[derive(Debug, Clone)]
pub struct NewTrack {
    pub user_id: String,
    pub name: String,
    pub description: String,
    pub gpx_path: String,
    pub uploaded_at: DateTime<Utc>,
    pub metrics: TrackMetrics,
}

impl NewTrack {
    pub fn into_record(self, id: Uuid) -> TrackRecord {
        TrackRecord {
            id,
            user_id: self.user_id,
            name: self.name,
            description: self.description,
            gpx_path: self.gpx_path,
            uploaded_at: self.uploaded_at,
            activity_date: self.metrics.start_date,
            distance_meters: self.metrics.total_distance_meters,
            duration_seconds: self.metrics.duration_seconds,
            avg_speed_m_s: self.metrics.average_speed_meters_per_second,
            metrics: self.metrics,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}
