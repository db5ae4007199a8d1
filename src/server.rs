use crate::error::{Result, ViewerError};
use crate::legend::{legend, LegendGroup};
use crate::markers::{payload_markers, DisplayMarker, MeshSlot, ViewState};
use crate::payload::AnalysisPayload;
use crate::viewer_html;
use axum::{
  body::Bytes,
  extract::{
    ws::{Message, WebSocket, WebSocketUpgrade},
    DefaultBodyLimit, Multipart, Query, State,
  },
  response::{Html, IntoResponse},
  routing::{get, post},
  Json, Router,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tower_http::services::ServeDir;
use tracing::{debug, info, warn};

#[derive(Serialize, Deserialize)]
pub struct FileInfo {
  pub name: String,
}

#[derive(Serialize)]
pub struct FileListResponse {
  pub files: Vec<FileInfo>,
}

/// Pushed to every connected viewer over `/ws`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewerEvent {
  FileAdded { filename: String },
  FileModified { filename: String },
  FileRemoved { filename: String },
  LandmarksUpdated { id: Option<String>, markers: usize },
  MeshesUploaded { files: Vec<String> },
}

/// What the viewer is currently showing: one payload over two meshes.
pub struct Session {
  pub payload: AnalysisPayload,
  pub slots: [MeshSlot; 2],
  pub mesh_files: [Option<String>; 2],
}

#[derive(Serialize)]
pub struct MeshInfo {
  #[serde(flatten)]
  pub slot: MeshSlot,
  pub file: Option<String>,
  pub visible: bool,
}

#[derive(Serialize)]
pub struct SessionView {
  pub id: Option<String>,
  pub meshes: Vec<MeshInfo>,
  pub markers: Vec<DisplayMarker>,
  pub legend: Vec<LegendGroup>,
}

impl Session {
  pub fn new(payload: AnalysisPayload, slots: [MeshSlot; 2]) -> Self {
    Session {
      payload,
      slots,
      mesh_files: [None, None],
    }
  }

  pub fn replace_payload(&mut self, payload: AnalysisPayload) -> ViewerEvent {
    let markers = payload_markers(&payload, &self.slots).len();
    self.payload = payload;
    ViewerEvent::LandmarksUpdated {
      id: self.payload.id.clone(),
      markers,
    }
  }

  /// Markers are recomputed from the payload on every call.
  pub fn view(&self, view: &ViewState) -> SessionView {
    let markers = payload_markers(&self.payload, &self.slots);
    let legend = legend(&markers, &self.slots);
    let meshes = self
      .slots
      .iter()
      .zip(&self.mesh_files)
      .map(|(slot, file)| MeshInfo {
        slot: slot.clone(),
        file: file.clone(),
        visible: view.is_source_visible(&slot.tag),
      })
      .collect();
    SessionView {
      id: self.payload.id.clone(),
      meshes,
      markers: view.visible(&markers).cloned().collect(),
      legend,
    }
  }
}

#[derive(Clone)]
pub struct AppState {
  pub scene_dir: PathBuf,
  pub session: Arc<RwLock<Session>>,
  pub tx: broadcast::Sender<ViewerEvent>,
}

impl AppState {
  pub fn new(scene_dir: PathBuf, session: Session) -> Self {
    let (tx, _rx) = broadcast::channel::<ViewerEvent>(100);
    AppState {
      scene_dir,
      session: Arc::new(RwLock::new(session)),
      tx,
    }
  }

  pub fn notify(&self, event: ViewerEvent) {
    // No receivers just means no browser is connected yet.
    let _ = self.tx.send(event);
  }

  pub async fn replace_payload(&self, payload: AnalysisPayload) {
    let event = self.session.write().await.replace_payload(payload);
    info!("landmarks updated: {:?}", event);
    self.notify(event);
  }
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
  let scene = ServeDir::new(&state.scene_dir);
  Router::new()
    .route("/", get(serve_html))
    .route("/api/files", get(list_files))
    .route("/api/session", get(get_session))
    .route("/api/landmarks", post(post_landmarks))
    .route("/api/upload", post(upload_meshes))
    .route("/ws", get(websocket_handler))
    .nest_service("/scene", scene)
    .layer(DefaultBodyLimit::max(max_upload_bytes))
    .with_state(state)
}

async fn websocket_handler(
  ws: WebSocketUpgrade,
  State(state): State<AppState>,
) -> impl IntoResponse {
  ws.on_upgrade(move |socket| handle_socket(socket, state.tx))
}

async fn handle_socket(socket: WebSocket, tx: broadcast::Sender<ViewerEvent>) {
  let (mut sender, mut receiver) = socket.split();
  let mut rx = tx.subscribe();

  let mut send_task = tokio::spawn(async move {
    loop {
      let event = match rx.recv().await {
        Ok(event) => event,
        Err(broadcast::error::RecvError::Lagged(n)) => {
          warn!("websocket client lagged, {} event(s) dropped", n);
          continue;
        }
        Err(broadcast::error::RecvError::Closed) => break,
      };
      let json = match serde_json::to_string(&event) {
        Ok(json) => json,
        Err(e) => {
          warn!("could not encode {:?}: {}", event, e);
          continue;
        }
      };
      if sender.send(Message::Text(json)).await.is_err() {
        break;
      }
    }
  });

  // Drain incoming frames so pings are answered.
  let mut recv_task = tokio::spawn(async move {
    while let Some(Ok(_msg)) = receiver.next().await {}
  });

  tokio::select! {
    _ = (&mut send_task) => recv_task.abort(),
    _ = (&mut recv_task) => send_task.abort(),
  };
}

pub fn is_stl(file_name: &str) -> bool {
  Path::new(file_name)
    .extension()
    .and_then(|ext| ext.to_str())
    .is_some_and(|ext| ext.eq_ignore_ascii_case("stl"))
}

async fn list_files(State(state): State<AppState>) -> Json<FileListResponse> {
  let mut files = Vec::new();

  if let Ok(entries) = fs::read_dir(&state.scene_dir) {
    for entry in entries.flatten() {
      let is_file = entry.metadata().map(|m| m.is_file()).unwrap_or(false);
      if let Some(file_name) = entry.file_name().to_str() {
        if is_file && is_stl(file_name) {
          files.push(FileInfo {
            name: file_name.to_string(),
          });
        }
      }
    }
  }

  files.sort_by(|a, b| a.name.cmp(&b.name));

  Json(FileListResponse { files })
}

#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
  pub hide: Option<String>,
  pub markers: Option<bool>,
}

impl ViewQuery {
  fn view_state(&self) -> ViewState {
    ViewState::from_query(self.hide.as_deref(), self.markers)
  }
}

async fn get_session(
  State(state): State<AppState>,
  Query(query): Query<ViewQuery>,
) -> Json<SessionView> {
  let session = state.session.read().await;
  Json(session.view(&query.view_state()))
}

async fn post_landmarks(
  State(state): State<AppState>,
  body: Bytes,
) -> Result<Json<SessionView>> {
  let payload = AnalysisPayload::from_slice(&body)?;
  state.replace_payload(payload).await;
  let session = state.session.read().await;
  Ok(Json(session.view(&ViewState::default())))
}

/// Reduce a client supplied file name to a bare `.stl` name.
pub fn stl_file_name(raw: Option<&str>) -> Option<String> {
  let name = Path::new(raw?).file_name()?.to_str()?;
  if name.starts_with('.') || !is_stl(name) {
    return None;
  }
  Some(name.to_string())
}

/// Write every upload to a hidden staging file first, and only move them
/// into place once all writes succeeded.
async fn store_uploads(dir: &Path, uploads: [&(String, Bytes); 2]) -> Result<()> {
  tokio::fs::create_dir_all(dir).await?;

  let mut staged = Vec::with_capacity(uploads.len());
  for (name, data) in uploads {
    let staging = dir.join(format!(".{}.upload", name));
    if let Err(e) = tokio::fs::write(&staging, data).await {
      staged.push((staging, PathBuf::new()));
      for (staging, _) in &staged {
        let _ = tokio::fs::remove_file(staging).await;
      }
      return Err(e.into());
    }
    staged.push((staging, dir.join(name)));
  }

  for (staging, target) in &staged {
    if tokio::fs::try_exists(target).await.unwrap_or(false) {
      warn!("replacing existing {:?}", target);
    }
    tokio::fs::rename(staging, target).await?;
    info!("stored upload {:?}", target);
  }
  Ok(())
}

async fn upload_meshes(
  State(state): State<AppState>,
  mut multipart: Multipart,
) -> Result<Json<SessionView>> {
  const TAGS: [&str; 2] = ["mesh1", "mesh2"];
  let mut uploads: [Option<(String, Bytes)>; 2] = [None, None];

  while let Some(field) = multipart.next_field().await? {
    let field_name = field.name().unwrap_or_default().to_string();
    let Some(slot) = TAGS.iter().position(|tag| *tag == field_name) else {
      debug!("ignoring multipart field {:?}", field_name);
      continue;
    };
    let file_name = stl_file_name(field.file_name()).ok_or_else(|| {
      ViewerError::Upload(format!("{} must be an .stl file", field_name))
    })?;
    let data = field.bytes().await?;
    if data.is_empty() {
      return Err(ViewerError::Upload(format!("{} is empty", field_name)));
    }
    uploads[slot] = Some((file_name, data));
  }

  let [Some(mesh1), Some(mut mesh2)] = uploads else {
    return Err(ViewerError::Upload(
      "both mesh1 and mesh2 are required".to_string(),
    ));
  };
  if mesh1.0 == mesh2.0 {
    mesh2.0 = format!("mesh2-{}", mesh2.0);
  }

  store_uploads(&state.scene_dir, [&mesh1, &mesh2]).await?;

  let files = vec![mesh1.0, mesh2.0];
  let view = {
    let mut session = state.session.write().await;
    for (i, name) in files.iter().enumerate() {
      session.slots[i].label = name.clone();
      session.mesh_files[i] = Some(name.clone());
    }
    session.view(&ViewState::default())
  };
  state.notify(ViewerEvent::MeshesUploaded { files });

  Ok(Json(view))
}

async fn serve_html() -> Html<&'static str> {
  Html(viewer_html::HTML)
}
