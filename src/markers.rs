//! Display markers derived from a landmark payload.

use crate::color::{color_for_notation, Color};
use crate::notation::{Numbering, UNDETECTED};
use crate::payload::{AnalysisPayload, MeshLandmarkSet};
use serde::Serialize;
use std::collections::HashSet;

pub const MARKER_RADIUS: f32 = 0.5;
pub const PREP_MARKER_RADIUS: f32 = 0.8;

pub const MESH1_TINT: Color = Color::rgb(0x3b, 0x82, 0xf6);
pub const MESH2_TINT: Color = Color::rgb(0x10, 0xb9, 0x81);

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DisplayMarker {
  pub position: [f64; 3],
  pub notation_number: i32,
  pub prep: bool,
  pub color: Color,
  pub source_mesh: String,
  pub radius: f32,
}

/// One of the input meshes and how its landmarks are numbered.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MeshSlot {
  pub tag: String,
  pub label: String,
  pub numbering: Numbering,
  pub color: Color,
}

impl MeshSlot {
  pub fn new(tag: &str, label: &str, numbering: Numbering, color: Color) -> Self {
    MeshSlot {
      tag: tag.to_string(),
      label: label.to_string(),
      numbering,
      color,
    }
  }

  /// The first mesh carries raw positional indices.
  pub fn mesh1() -> Self {
    MeshSlot::new("mesh1", "Mesh 1", Numbering::Positional, MESH1_TINT)
  }

  /// The second mesh comes back from the service already in FDI notation.
  pub fn mesh2() -> Self {
    MeshSlot::new("mesh2", "Mesh 2", Numbering::Fdi, MESH2_TINT)
  }
}

/// Resolve, color and filter the landmarks of one mesh.
///
/// The sentinel check runs on the resolved number, after mapping.
pub fn normalize(
  set: &MeshLandmarkSet,
  source_tag: &str,
  numbering: Numbering,
) -> Vec<DisplayMarker> {
  set
    .records
    .values()
    .filter_map(|record| {
      let notation_number = numbering.resolve(record.positional_number, set.is_lower);
      let color = color_for_notation(notation_number);
      if notation_number == UNDETECTED {
        return None;
      }
      Some(DisplayMarker {
        position: record.coordinate,
        notation_number,
        prep: record.prep,
        color,
        source_mesh: source_tag.to_string(),
        radius: if record.prep { PREP_MARKER_RADIUS } else { MARKER_RADIUS },
      })
    })
    .collect()
}

/// Markers for the standard two-mesh layout: mesh1 mapped, mesh2 as-is.
pub fn assemble(mesh1: &MeshLandmarkSet, mesh2: &MeshLandmarkSet) -> Vec<DisplayMarker> {
  assemble_slots(&[(mesh1, &MeshSlot::mesh1()), (mesh2, &MeshSlot::mesh2())])
}

/// Concatenate the markers of each mesh, in the order given.
pub fn assemble_slots(meshes: &[(&MeshLandmarkSet, &MeshSlot)]) -> Vec<DisplayMarker> {
  meshes
    .iter()
    .flat_map(|(set, slot)| normalize(set, &slot.tag, slot.numbering))
    .collect()
}

/// Markers for a whole payload under the configured slots.
pub fn payload_markers(payload: &AnalysisPayload, slots: &[MeshSlot; 2]) -> Vec<DisplayMarker> {
  assemble_slots(&[(&payload.mesh1, &slots[0]), (&payload.mesh2, &slots[1])])
}

/// Which markers the viewer currently shows.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
  pub hidden_sources: HashSet<String>,
  pub show_markers: bool,
}

impl Default for ViewState {
  fn default() -> Self {
    ViewState {
      hidden_sources: HashSet::new(),
      show_markers: true,
    }
  }
}

impl ViewState {
  /// Build from a comma separated list of hidden mesh tags.
  pub fn from_query(hide: Option<&str>, show_markers: Option<bool>) -> Self {
    let hidden_sources = hide
      .unwrap_or_default()
      .split(',')
      .map(str::trim)
      .filter(|tag| !tag.is_empty())
      .map(str::to_string)
      .collect();
    ViewState {
      hidden_sources,
      show_markers: show_markers.unwrap_or(true),
    }
  }

  pub fn is_source_visible(&self, tag: &str) -> bool {
    !self.hidden_sources.contains(tag)
  }

  pub fn visible<'a>(
    &'a self,
    markers: &'a [DisplayMarker],
  ) -> impl Iterator<Item = &'a DisplayMarker> + 'a {
    markers
      .iter()
      .filter(move |m| self.show_markers && self.is_source_visible(&m.source_mesh))
  }
}
