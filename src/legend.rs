use crate::color::Color;
use crate::markers::{DisplayMarker, MeshSlot};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LegendEntry {
  pub notation_number: i32,
  pub prep: bool,
  pub color: Color,
}

/// Legend rows for one mesh.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LegendGroup {
  pub tag: String,
  pub label: String,
  pub tint: Color,
  pub entries: Vec<LegendEntry>,
}

/// Group markers by source mesh, one group per slot in slot order.
pub fn legend(markers: &[DisplayMarker], slots: &[MeshSlot]) -> Vec<LegendGroup> {
  slots
    .iter()
    .map(|slot| LegendGroup {
      tag: slot.tag.clone(),
      label: slot.label.clone(),
      tint: slot.color,
      entries: markers
        .iter()
        .filter(|m| m.source_mesh == slot.tag)
        .map(|m| LegendEntry {
          notation_number: m.notation_number,
          prep: m.prep,
          color: m.color,
        })
        .collect(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::markers::payload_markers;
  use crate::payload::{AnalysisPayload, MeshLandmarkSet};

  #[test]
  fn test_sample_legend() {
    let slots = [MeshSlot::mesh1(), MeshSlot::mesh2()];
    let markers = payload_markers(&AnalysisPayload::sample(), &slots);
    let groups = legend(&markers, &slots);

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].tag, "mesh1");
    assert_eq!(groups[0].label, "Mesh 1");
    assert_eq!(groups[0].entries.len(), 8);
    assert_eq!(groups[1].entries.len(), 13);

    let preps: Vec<bool> = groups[0].entries.iter().map(|e| e.prep).collect();
    assert_eq!(preps, [false, false, false, true, true, true, true, false]);
  }

  #[test]
  fn test_empty_mesh_still_has_group() {
    let slots = [MeshSlot::mesh1(), MeshSlot::mesh2()];
    let payload = AnalysisPayload {
      id: None,
      mesh1: MeshLandmarkSet::default(),
      mesh2: MeshLandmarkSet::default(),
    };
    let groups = legend(&payload_markers(&payload, &slots), &slots);
    assert_eq!(groups.len(), 2);
    assert!(groups.iter().all(|g| g.entries.is_empty()));
  }
}
