//! Flight statistics derived from a pilot's track.

use chrono::{Duration, SecondsFormat};
use serde::{Deserialize, Serialize};

use crate::models::{PilotV1, Point};
use crate::spatial::distance_km;

/// A track point with the statistics accumulated up to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPoint {
    #[serde(flatten)]
    pub point: Point,
    /// Seconds since the first point
    pub flight_time_secs: i64,
    /// km from the first point
    pub take_off_dist: f64,
    /// km from the previous point
    pub leg_dist: f64,
    /// km along the track so far
    pub cum_dist: f64,
    /// km/h over the whole flight so far
    pub avg_speed: f64,
}

impl TrackPoint {
    fn start(point: Point) -> Self {
        Self {
            point,
            flight_time_secs: 0,
            take_off_dist: 0.0,
            leg_dist: 0.0,
            cum_dist: 0.0,
            avg_speed: 0.0,
        }
    }

    pub fn flight_time(&self) -> Duration {
        Duration::seconds(self.flight_time_secs)
    }
}

/// Annotate each point of an ascending track with running statistics.
///
/// The first point is the takeoff and carries zeros.
pub fn compute_statistics(points: &[Point]) -> Vec<TrackPoint> {
    let Some(first) = points.first() else {
        return Vec::new();
    };

    let mut with_stats: Vec<TrackPoint> = Vec::with_capacity(points.len());
    with_stats.push(TrackPoint::start(first.clone()));

    for point in &points[1..] {
        let previous = &with_stats[with_stats.len() - 1];

        let flight_time = point.date_time - first.date_time;
        let leg_dist = leg_distance(&previous.point, point);
        let cum_dist = previous.cum_dist + leg_dist;
        let hours = flight_time.num_milliseconds() as f64 / 3_600_000.0;
        let avg_speed = if hours > 0.0 { cum_dist / hours } else { 0.0 };

        with_stats.push(TrackPoint {
            point: point.clone(),
            flight_time_secs: flight_time.num_seconds(),
            take_off_dist: leg_distance(first, point),
            leg_dist,
            cum_dist,
            avg_speed,
        });
    }

    with_stats
}

/// Sum of all leg distances in km.
pub fn cumulative_distance(points: &[Point]) -> Option<f64> {
    if points.is_empty() {
        return None;
    }
    Some(
        points
            .windows(2)
            .map(|leg| leg_distance(&leg[0], &leg[1]))
            .sum(),
    )
}

/// Time between the first and the last point.
pub fn flight_time(points: &[Point]) -> Option<Duration> {
    let first = points.first()?;
    let last = points.last()?;
    Some(last.date_time - first.date_time)
}

/// Straight-line km between the first and the last point.
pub fn take_off_distance(points: &[Point]) -> Option<f64> {
    let first = points.first()?;
    let last = points.last()?;
    Some(leg_distance(first, last))
}

/// Compact duration text: `4h12m11s`, `5m0s`, `42s`, `0s`.
///
/// Sub-second parts are dropped.
pub fn format_flight_time(duration: Duration) -> String {
    let total = duration.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.unsigned_abs();

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{sign}{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{sign}{minutes}m{seconds}s")
    } else {
        format!("{sign}{seconds}s")
    }
}

impl PilotV1 {
    /// Build a display record from an ascending track. `None` when empty.
    pub fn from_track(name: impl Into<String>, color: impl Into<String>, points: &[Point]) -> Option<Self> {
        let last = points.last()?;
        Some(Self {
            color: color.into(),
            name: name.into(),
            altitude: f64::from(last.altitude),
            cum_dist: cumulative_distance(points)?,
            take_off_dist: take_off_distance(points)?,
            flight_time: format_flight_time(flight_time(points)?),
            last: last.date_time.to_rfc3339_opts(SecondsFormat::Secs, true),
        })
    }
}

fn leg_distance(from: &Point, to: &Point) -> f64 {
    distance_km(from.latitude, from.longitude, to.latitude, to.longitude)
}
