//! Error types for the viewer.

use axum::{
  extract::multipart::MultipartError,
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`ViewerError`].
pub type Result<T> = std::result::Result<T, ViewerError>;

#[derive(Error, Debug)]
pub enum ViewerError {
  /// The landmark payload could not be parsed as JSON.
  #[error("landmark payload is not valid JSON: {0}")]
  InvalidJson(#[from] serde_json::Error),

  /// The landmark payload parsed, but is not a JSON object.
  #[error("landmark payload must be a JSON object")]
  NotAnObject,

  /// Error reading a landmark payload from disk.
  #[error("failed to load landmark payload from {path}: {source}")]
  LoadError {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// A mesh upload was incomplete or named an unsupported file.
  #[error("upload rejected: {0}")]
  Upload(String),

  #[error("malformed multipart body: {0}")]
  Multipart(#[from] MultipartError),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}

impl ViewerError {
  pub fn status(&self) -> StatusCode {
    match self {
      ViewerError::InvalidJson(_)
      | ViewerError::NotAnObject
      | ViewerError::Upload(_)
      | ViewerError::Multipart(_) => StatusCode::BAD_REQUEST,
      ViewerError::LoadError { .. } | ViewerError::Io(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }
}

impl IntoResponse for ViewerError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!("{}", self);
    } else {
      tracing::warn!("{}", self);
    }
    let body = Json(serde_json::json!({ "error": self.to_string() }));
    (status, body).into_response()
  }
}
