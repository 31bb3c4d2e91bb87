//! Shape checks where raw pilot records enter a registry.
//!
//! The two pilot shapes are not union-compatible. Records coming from
//! outside carry no type information beyond their keys, so every record is
//! classified first and only then decoded into the registry's expected
//! version. Nothing here reconciles one shape into the other.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{Pilot, PilotV1, PilotV2, SchemaVersion};

/// Keys that only exist on v1 records.
pub const V1_ONLY_KEYS: [&str; 3] = ["cumDist", "takeOffDist", "flightTime"];

/// Keys that only exist on v2 records.
pub const V2_ONLY_KEYS: [&str; 1] = ["track"];

const VERSION_KEY: &str = "version";

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("pilot record is not a JSON object")]
    NotAnObject,

    #[error("pilot record has neither v1 nor v2 fields")]
    UnknownShape,

    #[error("pilot record mixes v1 fields ({v1_keys:?}) with v2 fields ({v2_keys:?})")]
    MixedShape {
        v1_keys: Vec<String>,
        v2_keys: Vec<String>,
    },

    #[error("pilot record has {found} shape, registry expects {expected}")]
    ShapeMismatch {
        expected: SchemaVersion,
        found: SchemaVersion,
    },

    #[error("unknown pilot schema version: {0}")]
    UnknownVersion(String),

    #[error("malformed {version} pilot record: {source}")]
    Malformed {
        version: SchemaVersion,
        #[source]
        source: serde_json::Error,
    },
}

/// Classify a raw record by its keys.
///
/// An explicit `version` tag wins over key inspection.
pub fn detect(value: &Value) -> Result<SchemaVersion, SchemaError> {
    let object = value.as_object().ok_or(SchemaError::NotAnObject)?;

    if let Some(tag) = object.get(VERSION_KEY) {
        let tag = tag
            .as_str()
            .ok_or_else(|| SchemaError::UnknownVersion(tag.to_string()))?;
        return tag.parse();
    }

    let v1_keys = present_keys(object, &V1_ONLY_KEYS);
    let v2_keys = present_keys(object, &V2_ONLY_KEYS);

    match (v1_keys.is_empty(), v2_keys.is_empty()) {
        (false, true) => Ok(SchemaVersion::V1),
        (true, false) => Ok(SchemaVersion::V2),
        (false, false) => Err(SchemaError::MixedShape { v1_keys, v2_keys }),
        (true, true) => Err(SchemaError::UnknownShape),
    }
}

/// Check a raw record against the expected version and decode it.
pub fn admit(value: Value, expected: SchemaVersion) -> Result<Pilot, SchemaError> {
    let found = detect(&value)?;
    if found != expected {
        return Err(SchemaError::ShapeMismatch { expected, found });
    }

    let mut value = value;
    if let Some(object) = value.as_object_mut() {
        object.remove(VERSION_KEY);
    }

    let malformed = |source| SchemaError::Malformed {
        version: expected,
        source,
    };
    let pilot = match expected {
        SchemaVersion::V1 => Pilot::V1(serde_json::from_value::<PilotV1>(value).map_err(malformed)?),
        SchemaVersion::V2 => Pilot::V2(serde_json::from_value::<PilotV2>(value).map_err(malformed)?),
    };
    Ok(pilot)
}

/// Admit every record or none. The error carries the failing index.
pub fn admit_all(
    values: Vec<Value>,
    expected: SchemaVersion,
) -> Result<Vec<Pilot>, (usize, SchemaError)> {
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| admit(value, expected).map_err(|err| (index, err)))
        .collect()
}

fn present_keys(object: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .filter(|key| object.contains_key(**key))
        .map(|key| key.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v1_record() -> Value {
        json!({
            "color": "#00ff00",
            "name": "ana",
            "altitude": 2200,
            "cumDist": 41.2,
            "takeOffDist": 12.9,
            "flightTime": "2h3m0s",
            "last": "14:02"
        })
    }

    fn v2_record() -> Value {
        json!({
            "color": "#0000ff",
            "name": "bob",
            "altitude": 1500.5,
            "track": "trk-7",
            "last": "14:03"
        })
    }

    #[test]
    fn detects_shapes_by_keys() {
        assert_eq!(detect(&v1_record()).unwrap(), SchemaVersion::V1);
        assert_eq!(detect(&v2_record()).unwrap(), SchemaVersion::V2);
    }

    #[test]
    fn explicit_tag_wins() {
        let mut record = v2_record();
        record["version"] = json!("v2");
        assert_eq!(detect(&record).unwrap(), SchemaVersion::V2);

        record["version"] = json!("v9");
        assert!(matches!(detect(&record), Err(SchemaError::UnknownVersion(_))));
    }

    #[test]
    fn v1_record_is_flagged_by_v2_boundary() {
        let err = admit(v1_record(), SchemaVersion::V2).unwrap_err();
        match err {
            SchemaError::ShapeMismatch { expected, found } => {
                assert_eq!(expected, SchemaVersion::V2);
                assert_eq!(found, SchemaVersion::V1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn mixed_records_are_rejected() {
        let mut record = v1_record();
        record["track"] = json!("trk-1");
        match detect(&record).unwrap_err() {
            SchemaError::MixedShape { v1_keys, v2_keys } => {
                assert_eq!(v1_keys.len(), 3);
                assert_eq!(v2_keys, vec!["track".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_and_non_object_records() {
        assert!(matches!(
            detect(&json!({"name": "ana", "color": "red"})),
            Err(SchemaError::UnknownShape)
        ));
        assert!(matches!(detect(&json!([1, 2])), Err(SchemaError::NotAnObject)));
    }

    #[test]
    fn missing_fields_are_malformed() {
        let record = json!({"name": "ana", "track": "trk-1"});
        assert!(matches!(
            admit(record, SchemaVersion::V2),
            Err(SchemaError::Malformed { version: SchemaVersion::V2, .. })
        ));
    }

    #[test]
    fn tagged_record_is_admitted() {
        let mut record = v2_record();
        record["version"] = json!("v2");
        let pilot = admit(record, SchemaVersion::V2).unwrap();
        assert_eq!(pilot.name(), "bob");
        assert_eq!(pilot.version(), SchemaVersion::V2);
    }

    #[test]
    fn admit_all_reports_first_failing_index() {
        let (index, err) =
            admit_all(vec![v2_record(), v2_record(), v1_record()], SchemaVersion::V2).unwrap_err();
        assert_eq!(index, 2);
        assert!(matches!(err, SchemaError::ShapeMismatch { .. }));

        let pilots = admit_all(vec![v1_record(), v1_record()], SchemaVersion::V1).unwrap();
        assert_eq!(pilots.len(), 2);
    }
}
