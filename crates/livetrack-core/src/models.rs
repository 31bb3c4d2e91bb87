//! Core data models for the live pilot view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::schema::SchemaError;

/// Pilot record shape. Exactly one version is authoritative per registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    /// Distance and flight-time statistics
    #[default]
    V1,
    /// Track identifier instead of statistics
    V2,
}

impl SchemaVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaVersion::V1 => "v1",
            SchemaVersion::V2 => "v2",
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaVersion {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(SchemaVersion::V1),
            "v2" | "2" => Ok(SchemaVersion::V2),
            other => Err(SchemaError::UnknownVersion(other.to_string())),
        }
    }
}

/// Pilot as shown with flight statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PilotV1 {
    pub color: String,
    pub name: String,
    pub altitude: f64,
    /// Cumulative distance flown in km
    pub cum_dist: f64,
    /// Straight-line distance from the takeoff point in km
    pub take_off_dist: f64,
    /// Elapsed flight duration, already formatted for display
    pub flight_time: String,
    pub last: String,
}

/// Pilot as shown with a track reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PilotV2 {
    pub color: String,
    pub name: String,
    pub altitude: f64,
    pub track: String,
    pub last: String,
}

/// A pilot record tagged with its shape version.
///
/// On the wire the discriminant is carried in a `version` field:
/// `{"version":"v2","color":"#f00","name":"ana",...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "version", rename_all = "lowercase")]
pub enum Pilot {
    V1(PilotV1),
    V2(PilotV2),
}

impl Pilot {
    pub fn version(&self) -> SchemaVersion {
        match self {
            Pilot::V1(_) => SchemaVersion::V1,
            Pilot::V2(_) => SchemaVersion::V2,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Pilot::V1(p) => &p.name,
            Pilot::V2(p) => &p.name,
        }
    }

    pub fn color(&self) -> &str {
        match self {
            Pilot::V1(p) => &p.color,
            Pilot::V2(p) => &p.color,
        }
    }

    pub fn altitude(&self) -> f64 {
        match self {
            Pilot::V1(p) => p.altitude,
            Pilot::V2(p) => p.altitude,
        }
    }

    pub fn last(&self) -> &str {
        match self {
            Pilot::V1(p) => &p.last,
            Pilot::V2(p) => &p.last,
        }
    }
}

impl From<PilotV1> for Pilot {
    fn from(pilot: PilotV1) -> Self {
        Pilot::V1(pilot)
    }
}

impl From<PilotV2> for Pilot {
    fn from(pilot: PilotV2) -> Self {
        Pilot::V2(pilot)
    }
}

/// A single position report from a tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    pub date_time: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    /// Altitude in meters
    #[serde(default)]
    pub altitude: i32,
    #[serde(default)]
    pub msg_type: String,
    #[serde(default)]
    pub msg_content: String,
}

impl Point {
    pub fn new(date_time: DateTime<Utc>, latitude: f64, longitude: f64, altitude: i32) -> Self {
        Self {
            date_time,
            latitude,
            longitude,
            altitude,
            msg_type: String::new(),
            msg_content: String::new(),
        }
    }

    /// Markdown link with driving directions to this point.
    pub fn itinerary_url(&self) -> String {
        format!(
            "[Pick Me](https://www.google.com/maps/dir/?api=1&destination={:.6},{:.6}&travelmode=driving)",
            self.latitude, self.longitude
        )
    }
}

/// Markdown link to the live view focused on one pilot.
pub fn livetrack_url(base_url: &str, pilot_name: &str) -> String {
    format!("[Livetrack]({}?pilot={})", base_url, pilot_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_v2() -> Pilot {
        Pilot::V2(PilotV2 {
            color: "#ff0000".into(),
            name: "ana".into(),
            altitude: 1820.0,
            track: "trk-42".into(),
            last: "2023-01-14T07:47:09Z".into(),
        })
    }

    #[test]
    fn pilot_serializes_with_version_tag() {
        let json = serde_json::to_value(sample_v2()).unwrap();
        assert_eq!(json["version"], "v2");
        assert_eq!(json["track"], "trk-42");
        assert_eq!(json["name"], "ana");
    }

    #[test]
    fn v1_uses_camel_case_fields() {
        let pilot = Pilot::V1(PilotV1 {
            color: "blue".into(),
            name: "bob".into(),
            altitude: 2100.0,
            cum_dist: 12.5,
            take_off_dist: 4.0,
            flight_time: "1h2m0s".into(),
            last: "12:00".into(),
        });
        let json = serde_json::to_value(&pilot).unwrap();
        assert_eq!(json["cumDist"], 12.5);
        assert_eq!(json["takeOffDist"], 4.0);
        assert_eq!(json["flightTime"], "1h2m0s");

        let back: Pilot = serde_json::from_value(json).unwrap();
        assert_eq!(back, pilot);
    }

    #[test]
    fn accessors_cover_both_versions() {
        let pilot = sample_v2();
        assert_eq!(pilot.version(), SchemaVersion::V2);
        assert_eq!(pilot.name(), "ana");
        assert_eq!(pilot.color(), "#ff0000");
        assert_eq!(pilot.altitude(), 1820.0);
    }

    #[test]
    fn schema_version_parses_loosely() {
        assert_eq!("V2".parse::<SchemaVersion>().unwrap(), SchemaVersion::V2);
        assert_eq!(" 1 ".parse::<SchemaVersion>().unwrap(), SchemaVersion::V1);
        assert!("v3".parse::<SchemaVersion>().is_err());
    }

    #[test]
    fn itinerary_url_uses_six_decimals() {
        let point = Point::new(Utc.with_ymd_and_hms(2023, 1, 14, 7, 47, 9).unwrap(), 46.45669, 6.88411, 900);
        assert_eq!(
            point.itinerary_url(),
            "[Pick Me](https://www.google.com/maps/dir/?api=1&destination=46.456690,6.884110&travelmode=driving)"
        );
    }

    #[test]
    fn livetrack_url_links_pilot() {
        assert_eq!(
            livetrack_url("https://test.xyz/", "test"),
            "[Livetrack](https://test.xyz/?pilot=test)"
        );
    }
}
