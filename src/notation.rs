//! Positional tooth index to two-digit FDI notation.

use serde::Serialize;

/// Raw tooth number meaning "no valid detection for this slot".
pub const UNDETECTED: i32 = -1;

/// Highest positional index the detector assigns.
pub const MAX_POSITIONAL: i32 = 14;

/// How the `num` field of a mesh's landmarks should be read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Numbering {
  /// Raw 0..=14 positional index, translated with [`map_to_fdi`].
  Positional,
  /// Already in final notation, used as-is.
  Fdi,
}

impl Numbering {
  pub fn resolve(self, raw: i32, is_lower: bool) -> i32 {
    match self {
      Numbering::Positional => map_to_fdi(raw, is_lower),
      Numbering::Fdi => raw,
    }
  }
}

/// Translate a positional index into FDI notation for the given arch.
///
/// Index 0 is the midline marker and stays 0 on both arches. Indices
/// outside `0..=14` are returned unchanged so that unexpected detector
/// output stays visible downstream instead of being coerced.
pub fn map_to_fdi(positional: i32, is_lower: bool) -> i32 {
  match (positional, is_lower) {
    (0, _) => 0,
    (1..=7, true) => 40 + positional,
    (8..=MAX_POSITIONAL, true) => 23 + positional,
    (1..=7, false) => 20 + positional,
    (8..=MAX_POSITIONAL, false) => 3 + positional,
    _ => positional,
  }
}
