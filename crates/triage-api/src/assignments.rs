//! Handlers for assignment endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/assignments` | Body: [`SelectRequest`]; classifies and records |
//! | `POST` | `/assignments/override` | Body: [`OverrideRequest`]; bypasses the classifier |
//! | `GET`  | `/tickets/:ticket_id/assignments` | Newest first; optional `limit` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use triage_core::{
  assignment::AssignmentRecord,
  classify::Classifier,
  store::OntologyStore,
};

use crate::{
  ApiState,
  assign::{self, OverrideRequest, SelectRequest},
  error::{ApiError, store_err},
};

// ─── Select ───────────────────────────────────────────────────────────────────

/// `POST /assignments` — classify a ticket and record the decision.
pub async fn select<S, C>(
  State(state): State<ApiState<S, C>>,
  Json(body): Json<SelectRequest>,
) -> Result<impl IntoResponse, ApiError>
where
  S: OntologyStore,
  C: Classifier,
{
  let response =
    assign::select_for_ticket(&*state.store, &*state.classifier, body).await?;
  Ok((StatusCode::CREATED, Json(response)))
}

// ─── Override ─────────────────────────────────────────────────────────────────

/// `POST /assignments/override` — record a human decision.
pub async fn override_assignment<S, C>(
  State(state): State<ApiState<S, C>>,
  Json(body): Json<OverrideRequest>,
) -> Result<impl IntoResponse, ApiError>
where
  S: OntologyStore,
  C: Classifier,
{
  let response = assign::override_for_ticket(&*state.store, body).await?;
  Ok((StatusCode::CREATED, Json(response)))
}

// ─── History ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
  pub limit: Option<usize>,
}

/// `GET /tickets/:ticket_id/assignments[?limit=...]` — the full decision
/// history, newest first. An unknown ticket simply has an empty history.
pub async fn history<S, C>(
  State(state): State<ApiState<S, C>>,
  Path(ticket_id): Path<String>,
  Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<AssignmentRecord>>, ApiError>
where
  S: OntologyStore,
  C: Classifier,
{
  let records = state
    .store
    .ticket_history(&ticket_id, params.limit)
    .await
    .map_err(store_err)?;
  Ok(Json(records))
}
