//! Reading pilot records and tracks from files.

use anyhow::{Context, Result};
use livetrack_core::Point;
use serde_json::Value;
use std::io::Read;
use std::path::Path;

fn read_source(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

/// Raw pilot records from a JSON file (`-` reads stdin).
///
/// A single object is treated as a list of one.
pub fn load_records(path: &Path) -> Result<Vec<Value>> {
    parse_records(&read_source(path)?)
}

/// Track points from a JSON array, sorted oldest first.
pub fn load_points(path: &Path) -> Result<Vec<Point>> {
    parse_points(&read_source(path)?)
}

pub(crate) fn parse_records(text: &str) -> Result<Vec<Value>> {
    match serde_json::from_str::<Value>(text).context("parsing pilot records")? {
        Value::Array(records) => Ok(records),
        record @ Value::Object(_) => Ok(vec![record]),
        other => anyhow::bail!("expected a JSON object or array, found {}", kind(&other)),
    }
}

pub(crate) fn parse_points(text: &str) -> Result<Vec<Point>> {
    let mut points: Vec<Point> = serde_json::from_str(text).context("parsing track points")?;
    points.sort_by_key(|p| p.date_time);
    Ok(points)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
