use chrono::{DateTime, NaiveDateTime, Utc};

use crate::pipeline::parse::{Element, MarkupParser, XmlMarkupParser};
use crate::types::track::{TrackMetrics, TrackPoint};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Computes metrics for the full text of a GPX file. Never fails: input that
/// cannot be parsed yields [`TrackMetrics::empty`].
pub fn compute_metrics(raw: &str) -> TrackMetrics {
    compute_metrics_with(&XmlMarkupParser, raw)
}

pub fn compute_metrics_with(parser: &dyn MarkupParser, raw: &str) -> TrackMetrics {
    let root = match parser.parse(raw) {
        Ok(root) => root,
        Err(e) => {
            tracing::warn!("Track file could not be parsed, metrics unknown: {}", e);
            return TrackMetrics::empty();
        }
    };

    summarize(&extract_points(&root))
}

/// Collects every `trkpt` in document order. Points without a usable
/// `lat`/`lon` pair are skipped.
pub fn extract_points(root: &Element) -> Vec<TrackPoint> {
    root.descendants("trkpt")
        .into_iter()
        .enumerate()
        .filter_map(|(idx, element)| {
            let point = read_point(element);
            if point.is_none() {
                tracing::debug!("Skipping trackpoint {} without a valid position", idx);
            }
            point
        })
        .collect()
}

fn read_point(element: &Element) -> Option<TrackPoint> {
    let lat = parse_coordinate(element.attr("lat")?, 90.0)?;
    let lon = parse_coordinate(element.attr("lon")?, 180.0)?;
    let time = element
        .find("time")
        .and_then(|time| parse_timestamp(&time.text()));

    Some(TrackPoint { lat, lon, time })
}

fn parse_coordinate(raw: &str, limit: f64) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && value.abs() <= limit)
}

/// RFC 3339 with any offset; a timestamp without an offset is read as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    raw.parse::<DateTime<Utc>>().ok().or_else(|| {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    })
}

pub fn summarize(points: &[TrackPoint]) -> TrackMetrics {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return TrackMetrics::empty();
    };

    let distance: f64 = points
        .windows(2)
        .map(|pair| haversine_distance(&pair[0], &pair[1]))
        .sum();

    let duration = match (first.time, last.time) {
        (Some(start), Some(end)) if points.len() >= 2 => {
            Some((end - start).num_milliseconds() as f64 / 1000.0)
        }
        _ => None,
    };

    let duration = duration.filter(|seconds| {
        if *seconds < 0.0 {
            tracing::debug!("Track ends {}s before it starts, duration unknown", -seconds);
            return false;
        }
        true
    });

    let average_speed = duration
        .filter(|seconds| *seconds > 0.0)
        .map(|seconds| distance / seconds);

    TrackMetrics {
        point_count: points.len(),
        total_distance_meters: Some(distance.round()),
        duration_seconds: duration.map(|seconds| seconds.round() as u64),
        average_speed_meters_per_second: average_speed,
        start_date: first.time.map(|time| time.date_naive()),
    }
}

/// Great-circle distance in meters.
pub fn haversine_distance(from: &TrackPoint, to: &TrackPoint) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lon = (to.lon - from.lon).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    // rounding can push `a` just outside [0, 1] near antipodes
    let a = a.clamp(0.0, 1.0);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64) -> TrackPoint {
        TrackPoint {
            lat,
            lon,
            time: None,
        }
    }

    #[test]
    fn haversine_is_zero_for_coincident_points() {
        assert_eq!(haversine_distance(&point(49.0, 20.0), &point(49.0, 20.0)), 0.0);
    }

    #[test]
    fn haversine_handles_antipodes() {
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_M;
        let across = haversine_distance(&point(0.0, 0.0), &point(0.0, 180.0));
        let pole_to_pole = haversine_distance(&point(90.0, 0.0), &point(-90.0, 0.0));
        assert!((across - half_circumference).abs() < 1e-6);
        assert!((pole_to_pole - half_circumference).abs() < 1e-6);
        let near = haversine_distance(&point(45.0, 10.0), &point(-45.0, -170.0));
        assert!(near.is_finite());
        assert!((near - half_circumference).abs() < 1.0);
    }

    #[test]
    fn haversine_at_pole_ignores_longitude() {
        let d = haversine_distance(&point(90.0, 0.0), &point(90.0, 180.0));
        assert!(d.is_finite());
        assert!(d < 1.0);
    }

    #[test]
    fn coordinates_must_be_finite_and_in_range() {
        assert_eq!(parse_coordinate(" 49.5 ", 90.0), Some(49.5));
        assert_eq!(parse_coordinate("-180", 180.0), Some(-180.0));
        assert_eq!(parse_coordinate("NaN", 90.0), None);
        assert_eq!(parse_coordinate("inf", 180.0), None);
        assert_eq!(parse_coordinate("90.1", 90.0), None);
        assert_eq!(parse_coordinate("12abc", 90.0), None);
        assert_eq!(parse_coordinate("", 90.0), None);
    }

    #[test]
    fn timestamps_accept_offsets_and_naive_values() {
        let zulu = parse_timestamp("2024-05-01T10:00:00Z").expect("zulu");
        let offset = parse_timestamp("2024-05-01T12:00:00+02:00").expect("offset");
        let naive = parse_timestamp("2024-05-01T10:00:00").expect("naive");
        let fractional = parse_timestamp("2024-05-01T10:00:00.500Z").expect("fractional");
        assert_eq!(zulu, offset);
        assert_eq!(zulu, naive);
        assert_eq!((fractional - zulu).num_milliseconds(), 500);
        assert!(parse_timestamp("yesterday").is_none());
    }
}
