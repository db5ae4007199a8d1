//! Landmark payload returned by the analysis service.
//!
//! The wire shape is
//! `{ mesh1: { is_lower, centers: { id: { prep, num, center } } }, mesh2: {..}, id }`.
//! Parsing is strict at the top level and lenient below it: a missing mesh
//! or `centers` map is an empty set, and a record that lacks a required
//! field is dropped with a warning rather than carried forward half-filled.

use crate::error::{Result, ViewerError};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, warn};

/// Upstream response bundled with the viewer, used until a real payload arrives.
pub const SAMPLE_JSON: &str = include_str!("../fixtures/sample_analysis.json");

/// One detected point on one mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkRecord {
  /// Raw tooth number before notation mapping, `-1` when undetected.
  pub positional_number: i32,
  pub prep: bool,
  pub coordinate: [f64; 3],
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshLandmarkSet {
  pub is_lower: bool,
  /// Records keyed by their payload id, in payload order.
  pub records: IndexMap<String, LandmarkRecord>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnalysisPayload {
  pub id: Option<String>,
  pub mesh1: MeshLandmarkSet,
  pub mesh2: MeshLandmarkSet,
}

#[derive(Deserialize)]
struct RawRecord {
  #[serde(default)]
  prep: RawPrep,
  num: i32,
  center: [f64; 3],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPrep {
  Flag(bool),
  Level(i64),
  Fractional(f64),
  Unset(()),
}

impl Default for RawPrep {
  fn default() -> Self {
    RawPrep::Unset(())
  }
}

impl From<RawPrep> for bool {
  fn from(prep: RawPrep) -> bool {
    match prep {
      RawPrep::Flag(flag) => flag,
      RawPrep::Level(level) => level != 0,
      RawPrep::Fractional(level) => level != 0.0,
      RawPrep::Unset(()) => false,
    }
  }
}

impl AnalysisPayload {
  pub fn from_json(json: &str) -> Result<Self> {
    let value: Value = serde_json::from_str(json)?;
    Self::from_value(value)
  }

  pub fn from_slice(bytes: &[u8]) -> Result<Self> {
    let value: Value = serde_json::from_slice(bytes)?;
    Self::from_value(value)
  }

  pub fn from_value(value: Value) -> Result<Self> {
    let Value::Object(mut root) = value else {
      return Err(ViewerError::NotAnObject);
    };

    let id = match root.remove("id") {
      Some(Value::String(id)) => Some(id),
      Some(Value::Null) | None => None,
      Some(other) => Some(other.to_string()),
    };

    let mesh1 = MeshLandmarkSet::from_value("mesh1", root.remove("mesh1"));
    let mesh2 = MeshLandmarkSet::from_value("mesh2", root.remove("mesh2"));
    debug!(
      "parsed payload {:?}: {} + {} landmark(s)",
      id,
      mesh1.records.len(),
      mesh2.records.len()
    );

    Ok(AnalysisPayload { id, mesh1, mesh2 })
  }

  pub fn load(path: &Path) -> Result<Self> {
    let json = std::fs::read_to_string(path).map_err(|source| {
      ViewerError::LoadError { path: path.to_path_buf(), source }
    })?;
    Self::from_json(&json)
  }

  /// The bundled sample response.
  pub fn sample() -> Self {
    // SAMPLE_JSON is a checked-in fixture; a broken file falls back to empty.
    Self::from_json(SAMPLE_JSON).unwrap_or_else(|e| {
      warn!("bundled sample payload is unreadable: {}", e);
      AnalysisPayload::default()
    })
  }
}

impl MeshLandmarkSet {
  fn from_value(mesh: &str, value: Option<Value>) -> Self {
    let mut root = match value {
      Some(Value::Object(root)) => root,
      None | Some(Value::Null) => {
        warn!("{}: missing from payload, no landmarks", mesh);
        return MeshLandmarkSet::default();
      }
      Some(_) => {
        warn!("{}: not an object, no landmarks", mesh);
        return MeshLandmarkSet::default();
      }
    };

    let is_lower = match root.remove("is_lower") {
      Some(Value::Bool(is_lower)) => is_lower,
      None | Some(Value::Null) => false,
      Some(other) => {
        warn!("{}: is_lower is {}, assuming upper arch", mesh, other);
        false
      }
    };

    let centers = match root.remove("centers") {
      Some(Value::Object(centers)) => centers,
      None | Some(Value::Null) => Map::new(),
      Some(_) => {
        warn!("{}: centers is not an object, no landmarks", mesh);
        Map::new()
      }
    };

    let mut records = IndexMap::with_capacity(centers.len());
    for (key, value) in centers {
      match serde_json::from_value::<RawRecord>(value) {
        Ok(raw) => {
          records.insert(
            key,
            LandmarkRecord {
              positional_number: raw.num,
              prep: raw.prep.into(),
              coordinate: raw.center,
            },
          );
        }
        Err(e) => warn!("{}: dropping landmark {:?}: {}", mesh, key, e),
      }
    }

    MeshLandmarkSet { is_lower, records }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_sample_fixture() {
    let payload = AnalysisPayload::sample();
    assert_eq!(
      payload.id.as_deref(),
      Some("5a3898c8-1c23-4990-92e3-a030f34b0acd")
    );
    assert!(!payload.mesh1.is_lower);
    assert!(payload.mesh2.is_lower);
    assert_eq!(payload.mesh1.records.len(), 12);
    assert_eq!(payload.mesh2.records.len(), 13);

    let first = &payload.mesh1.records["0"];
    assert_eq!(first.positional_number, 8);
    assert!(!first.prep);
    assert!(payload.mesh1.records["4"].prep);
  }

  #[test]
  fn test_records_keep_payload_order() {
    let payload = AnalysisPayload::sample();
    let keys: Vec<&str> =
      payload.mesh1.records.keys().map(String::as_str).collect();
    assert_eq!(
      keys,
      ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11"]
    );

    let payload = AnalysisPayload::from_json(
      r#"{"mesh1": {"centers": {
        "b": {"num": 1, "center": [0, 0, 0]},
        "a": {"num": 2, "center": [0, 0, 0]}
      }}}"#,
    )
    .unwrap();
    let keys: Vec<&str> =
      payload.mesh1.records.keys().map(String::as_str).collect();
    assert_eq!(keys, ["b", "a"]);
  }

  #[test]
  fn test_missing_mesh_is_empty() {
    let payload = AnalysisPayload::from_json(
      r#"{"mesh1": {"is_lower": true, "centers": {}}, "id": "x"}"#,
    )
    .unwrap();
    assert!(payload.mesh1.is_lower);
    assert!(payload.mesh2.records.is_empty());
    assert!(!payload.mesh2.is_lower);

    let payload =
      AnalysisPayload::from_json(r#"{"mesh1": {"is_lower": false}}"#).unwrap();
    assert!(payload.mesh1.records.is_empty());
    assert_eq!(payload.id, None);
  }

  #[test]
  fn test_malformed_records_are_dropped() {
    let payload = AnalysisPayload::from_json(
      r#"{"mesh1": {"is_lower": false, "centers": {
        "0": {"prep": 0, "num": 3, "center": [1.0, 2.0, 3.0]},
        "1": {"prep": 0, "center": [1.0, 2.0, 3.0]},
        "2": {"prep": 0, "num": 4, "center": [1.0, 2.0]},
        "3": {"prep": 0, "num": "five", "center": [1.0, 2.0, 3.0]},
        "4": "not a record"
      }}}"#,
    )
    .unwrap();
    assert_eq!(payload.mesh1.records.len(), 1);
    assert_eq!(payload.mesh1.records["0"].coordinate, [1.0, 2.0, 3.0]);
  }

  #[test]
  fn test_prep_accepts_int_bool_or_absent() {
    let payload = AnalysisPayload::from_json(
      r#"{"mesh2": {"centers": {
        "0": {"prep": 2, "num": 1, "center": [0, 0, 0]},
        "1": {"prep": true, "num": 1, "center": [0, 0, 0]},
        "2": {"prep": false, "num": 1, "center": [0, 0, 0]},
        "3": {"num": 1, "center": [0, 0, 0]}
      }}}"#,
    )
    .unwrap();
    let preps: Vec<bool> =
      payload.mesh2.records.values().map(|r| r.prep).collect();
    assert_eq!(preps, [true, true, false, false]);
  }

  #[test]
  fn test_prep_null_or_float_keeps_record() {
    let payload = AnalysisPayload::from_json(
      r#"{"mesh1": {"centers": {
        "0": {"prep": null, "num": 1, "center": [0, 0, 0]},
        "1": {"prep": 1.0, "num": 2, "center": [0, 0, 0]},
        "2": {"prep": 0.0, "num": 3, "center": [0, 0, 0]},
        "3": {"prep": "yes", "num": 4, "center": [0, 0, 0]}
      }}}"#,
    )
    .unwrap();
    let preps: Vec<bool> =
      payload.mesh1.records.values().map(|r| r.prep).collect();
    assert_eq!(preps, [false, true, false]);
  }

  #[test]
  fn test_wrongly_typed_mesh_fields_default() {
    let payload = AnalysisPayload::from_json(
      r#"{"mesh1": {"is_lower": "yes", "centers": [1, 2]}, "mesh2": 7}"#,
    )
    .unwrap();
    assert!(!payload.mesh1.is_lower);
    assert!(payload.mesh1.records.is_empty());
    assert!(payload.mesh2.records.is_empty());
  }

  #[test]
  fn test_top_level_must_be_object() {
    assert!(matches!(
      AnalysisPayload::from_json("[1, 2, 3]"),
      Err(ViewerError::NotAnObject)
    ));
    assert!(matches!(
      AnalysisPayload::from_json("{not json"),
      Err(ViewerError::InvalidJson(_))
    ));
  }

  #[test]
  fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = AnalysisPayload::load(&dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, ViewerError::LoadError { .. }));
  }

  #[test]
  fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("landmarks.json");
    std::fs::write(&path, SAMPLE_JSON).unwrap();
    assert_eq!(AnalysisPayload::load(&path).unwrap(), AnalysisPayload::sample());
  }
}
