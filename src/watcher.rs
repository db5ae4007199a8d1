//! Live reload: STL changes in the scene directory and edits to the
//! landmark payload file.

use crate::payload::AnalysisPayload;
use crate::server::{is_stl, AppState, ViewerEvent};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const DEBOUNCE: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
  Create,
  Modify,
  Remove,
}

/// Reconcile a notify event with what is actually on disk.
///
/// A create or modify for a file that no longer exists is a remove, and a
/// remove for a file that still exists is ignored.
pub fn classify(kind: &EventKind, exists: bool) -> Option<ChangeKind> {
  let reported = match kind {
    EventKind::Create(_) => ChangeKind::Create,
    EventKind::Modify(_) => ChangeKind::Modify,
    EventKind::Remove(_) => ChangeKind::Remove,
    _ => return None,
  };
  match (reported, exists) {
    (ChangeKind::Remove, true) => None,
    (_, false) => Some(ChangeKind::Remove),
    (kind, true) => Some(kind),
  }
}

/// Drops repeats of the same change to the same file within a window.
pub struct Debouncer {
  window: Duration,
  last: HashMap<String, (ChangeKind, Instant)>,
}

impl Debouncer {
  pub fn new(window: Duration) -> Self {
    Debouncer {
      window,
      last: HashMap::new(),
    }
  }

  pub fn should_emit(&mut self, key: &str, kind: ChangeKind, now: Instant) -> bool {
    let emit = match self.last.get(key) {
      Some((last_kind, last_time)) => {
        *last_kind != kind || now.duration_since(*last_time) > self.window
      }
      None => true,
    };
    if emit {
      self.last.insert(key.to_string(), (kind, now));
    }
    emit
  }
}

/// Directory part of a path, `.` for a bare file name.
fn parent_dir(path: &Path) -> PathBuf {
  match path.parent() {
    Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
    _ => PathBuf::from("."),
  }
}

/// Same file name in the same directory. Directories are compared
/// canonically since the file itself may not exist yet.
fn is_payload_file(path: &Path, payload: Option<&Path>) -> bool {
  let Some(payload) = payload else {
    return false;
  };
  match (path.file_name(), payload.file_name()) {
    (Some(name), Some(payload_name)) if name == payload_name => {
      same_dir(&parent_dir(path), &parent_dir(payload))
    }
    _ => false,
  }
}

fn same_dir(a: &Path, b: &Path) -> bool {
  let a = a.canonicalize().unwrap_or_else(|_| a.to_path_buf());
  let b = b.canonicalize().unwrap_or_else(|_| b.to_path_buf());
  a == b
}

/// Start watching. The watcher lives as long as the spawned task.
pub fn spawn(state: AppState, payload_path: Option<PathBuf>) -> Result<()> {
  let (watch_tx, mut watch_rx) = tokio::sync::mpsc::channel(100);

  let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
    if let Ok(event) = res {
      let _ = watch_tx.blocking_send(event);
    }
  })
  .context("failed to create file watcher")?;

  watcher
    .watch(&state.scene_dir, RecursiveMode::NonRecursive)
    .with_context(|| format!("failed to watch scene directory {:?}", state.scene_dir))?;
  info!("watching {:?} for STL files", state.scene_dir);

  if let Some(path) = &payload_path {
    let dir = parent_dir(path);
    if !same_dir(&dir, &state.scene_dir) {
      watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("failed to watch payload directory {:?}", dir))?;
    }
    info!("watching {:?} for landmark updates", path);
  }

  tokio::spawn(async move {
    let _watcher = watcher;
    let mut debouncer = Debouncer::new(DEBOUNCE);
    while let Some(event) = watch_rx.recv().await {
      handle_event(&state, payload_path.as_deref(), &mut debouncer, event).await;
    }
  });

  Ok(())
}

pub async fn handle_event(
  state: &AppState,
  payload_path: Option<&Path>,
  debouncer: &mut Debouncer,
  event: Event,
) {
  for path in &event.paths {
    let Some(kind) = classify(&event.kind, path.exists()) else {
      continue;
    };

    if let Some(payload) = payload_path.filter(|p| is_payload_file(path, Some(*p))) {
      // Not debounced: the last write of a burst must always be read.
      reload_payload(state, payload, kind).await;
      continue;
    }

    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
      continue;
    };
    if !is_stl(file_name) {
      continue;
    }
    if !debouncer.should_emit(file_name, kind, Instant::now()) {
      debug!("debounced {:?} for {}", kind, file_name);
      continue;
    }

    let filename = file_name.to_string();
    info!("{:?}: {}", kind, filename);
    state.notify(match kind {
      ChangeKind::Create => ViewerEvent::FileAdded { filename },
      ChangeKind::Modify => ViewerEvent::FileModified { filename },
      ChangeKind::Remove => ViewerEvent::FileRemoved { filename },
    });
  }
}

async fn reload_payload(state: &AppState, path: &Path, kind: ChangeKind) {
  if kind == ChangeKind::Remove {
    info!("payload {:?} removed, keeping current landmarks", path);
    return;
  }
  match AnalysisPayload::load(path) {
    Ok(payload) => state.replace_payload(payload).await,
    Err(e) => warn!("keeping current landmarks: {}", e),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::markers::MeshSlot;
  use crate::server::Session;
  use notify::event::{CreateKind, ModifyKind, RemoveKind};

  fn test_state(scene_dir: &Path) -> AppState {
    let session = Session::new(
      AnalysisPayload::default(),
      [MeshSlot::mesh1(), MeshSlot::mesh2()],
    );
    AppState::new(scene_dir.to_path_buf(), session)
  }

  #[test]
  fn test_classify() {
    let create = EventKind::Create(CreateKind::File);
    let modify = EventKind::Modify(ModifyKind::Any);
    let remove = EventKind::Remove(RemoveKind::File);

    assert_eq!(classify(&create, true), Some(ChangeKind::Create));
    assert_eq!(classify(&modify, true), Some(ChangeKind::Modify));
    assert_eq!(classify(&create, false), Some(ChangeKind::Remove));
    assert_eq!(classify(&modify, false), Some(ChangeKind::Remove));
    assert_eq!(classify(&remove, false), Some(ChangeKind::Remove));
    assert_eq!(classify(&remove, true), None);
    assert_eq!(classify(&EventKind::Any, true), None);
  }

  #[test]
  fn test_debouncer() {
    let mut debouncer = Debouncer::new(DEBOUNCE);
    let t0 = Instant::now();

    assert!(debouncer.should_emit("a.stl", ChangeKind::Modify, t0));
    assert!(!debouncer.should_emit("a.stl", ChangeKind::Modify, t0 + Duration::from_millis(50)));
    // A different kind always passes.
    assert!(debouncer.should_emit("a.stl", ChangeKind::Remove, t0 + Duration::from_millis(60)));
    // Other files are independent.
    assert!(debouncer.should_emit("b.stl", ChangeKind::Remove, t0 + Duration::from_millis(60)));
    assert!(debouncer.should_emit("a.stl", ChangeKind::Remove, t0 + Duration::from_millis(200)));
  }

  #[test]
  fn test_payload_file_match() {
    let payload = Path::new("/data/landmarks.json");
    assert!(is_payload_file(Path::new("/data/landmarks.json"), Some(payload)));
    assert!(!is_payload_file(Path::new("/data/upper.stl"), Some(payload)));
    assert!(!is_payload_file(Path::new("/data/landmarks.json"), None));
    assert!(!is_payload_file(Path::new("/scene/landmarks.json"), Some(payload)));
  }

  #[test]
  fn test_payload_file_match_relative() {
    let dir = tempfile::tempdir().unwrap();
    let cwd = std::env::current_dir().unwrap();
    let relative = Path::new("landmarks.json");
    assert!(is_payload_file(&cwd.join("landmarks.json"), Some(relative)));
    assert!(!is_payload_file(&dir.path().join("landmarks.json"), Some(relative)));
  }

  #[tokio::test]
  async fn test_same_named_file_elsewhere_is_ignored() {
    let scene = tempfile::tempdir().unwrap();
    let other = tempfile::tempdir().unwrap();
    let payload_path = other.path().join("landmarks.json");
    std::fs::write(&payload_path, crate::payload::SAMPLE_JSON).unwrap();

    let state = test_state(scene.path());
    let mut debouncer = Debouncer::new(DEBOUNCE);

    let stray = scene.path().join("landmarks.json");
    std::fs::write(&stray, r#"{"id": "stray"}"#).unwrap();
    let event = Event::new(EventKind::Modify(ModifyKind::Any)).add_path(stray);
    handle_event(&state, Some(&payload_path), &mut debouncer, event).await;
    assert_eq!(state.session.read().await.payload.id, None);

    let event = Event::new(EventKind::Modify(ModifyKind::Any)).add_path(payload_path.clone());
    handle_event(&state, Some(&payload_path), &mut debouncer, event).await;
    assert_eq!(
      state.session.read().await.payload,
      AnalysisPayload::sample()
    );
  }

  #[tokio::test]
  async fn test_stl_change_is_broadcast() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("upper.stl");
    std::fs::write(&path, b"solid a\nendsolid a\n").unwrap();

    let state = test_state(dir.path());
    let mut rx = state.tx.subscribe();
    let mut debouncer = Debouncer::new(DEBOUNCE);
    let event = Event::new(EventKind::Create(CreateKind::File)).add_path(path.clone());
    handle_event(&state, None, &mut debouncer, event).await;

    assert_eq!(
      rx.try_recv().unwrap(),
      ViewerEvent::FileAdded {
        filename: "upper.stl".to_string()
      }
    );

    let other = dir.path().join("notes.txt");
    std::fs::write(&other, b"x").unwrap();
    let event = Event::new(EventKind::Create(CreateKind::File)).add_path(other);
    handle_event(&state, None, &mut debouncer, event).await;
    assert!(rx.try_recv().is_err());
  }

  #[tokio::test]
  async fn test_payload_edit_reloads_landmarks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("landmarks.json");
    let state = test_state(dir.path());
    let mut debouncer = Debouncer::new(DEBOUNCE);

    std::fs::write(&path, crate::payload::SAMPLE_JSON).unwrap();
    let event = Event::new(EventKind::Modify(ModifyKind::Any)).add_path(path.clone());
    handle_event(&state, Some(&path), &mut debouncer, event).await;
    assert_eq!(
      state.session.read().await.payload,
      AnalysisPayload::sample()
    );

    // A broken write keeps the last good payload.
    std::fs::write(&path, "{ truncated").unwrap();
    let event = Event::new(EventKind::Modify(ModifyKind::Any)).add_path(path.clone());
    handle_event(&state, Some(&path), &mut debouncer, event).await;
    assert_eq!(
      state.session.read().await.payload,
      AnalysisPayload::sample()
    );
  }
}
