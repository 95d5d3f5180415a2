//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure response carries a machine-readable `kind` and a
//! human-readable `message`; validation failures additionally list every
//! violation. A failure body never includes a partially-populated
//! assignment.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use triage_core::classify::ClassifyError;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("validation failed: {}", .0.join("; "))]
  Validation(Vec<String>),

  #[error("no active ontologies available")]
  NoCandidates,

  #[error("classification failed: {0}")]
  Classification(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(String),
}

impl ApiError {
  /// Stable machine-readable kind for the error body.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::NotFound(_) => "not_found",
      Self::Conflict(_) => "conflict",
      Self::Validation(_) => "validation",
      Self::NoCandidates => "no_candidates",
      Self::Classification(_) => "classification",
      Self::BadRequest(_) => "bad_request",
      Self::Store(_) => "store",
    }
  }

  fn status(&self) -> StatusCode {
    match self {
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::Conflict(_) | Self::NoCandidates => StatusCode::CONFLICT,
      Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
      Self::Classification(_) => StatusCode::BAD_GATEWAY,
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<triage_core::Error> for ApiError {
  fn from(e: triage_core::Error) -> Self {
    match e {
      triage_core::Error::NotFound(m) => Self::NotFound(m),
      triage_core::Error::Conflict { name, version } => {
        Self::Conflict(format!("ontology '{name}' v{version} already exists"))
      }
      triage_core::Error::Validation { violations } => Self::Validation(violations),
      triage_core::Error::NoCandidates => Self::NoCandidates,
      // The classifier's own empty-set refusal is the same terminal state.
      triage_core::Error::Classify(ClassifyError::NoCandidates) => Self::NoCandidates,
      triage_core::Error::Classify(inner) => Self::Classification(inner.to_string()),
      triage_core::Error::Store(m) => Self::Store(m),
    }
  }
}

/// Convert a store-level error through the core taxonomy.
pub fn store_err<E: Into<triage_core::Error>>(e: E) -> ApiError {
  ApiError::from(e.into())
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let mut error = json!({
      "kind": self.kind(),
      "message": self.to_string(),
    });
    if let ApiError::Validation(violations) = &self {
      error["violations"] = json!(violations);
    }
    (status, Json(json!({ "success": false, "error": error }))).into_response()
  }
}
