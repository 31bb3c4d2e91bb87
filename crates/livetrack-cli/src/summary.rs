//! Local summaries of tracks and pilot lists.

use anyhow::Result;
use livetrack_core::{Pilot, PilotV1, Point};

/// Build a v1 pilot record from a recorded track.
pub fn summarize(name: &str, color: &str, points: &[Point]) -> Result<PilotV1> {
    PilotV1::from_track(name, color, points)
        .ok_or_else(|| anyhow::anyhow!("track for {} has no points", name))
}

/// One display line per pilot.
pub fn describe(pilot: &Pilot) -> String {
    match pilot {
        Pilot::V1(p) => format!(
            "{:<16} v1  {:>6.0} m  {:>7.1} km flown  {:>7.1} km out  {:>10}  {}",
            p.name, p.altitude, p.cum_dist, p.take_off_dist, p.flight_time, p.last
        ),
        Pilot::V2(p) => format!(
            "{:<16} v2  {:>6.0} m  track {}  {}",
            p.name, p.altitude, p.track, p.last
        ),
    }
}
