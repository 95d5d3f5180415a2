//! Handlers for `/ontologies` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/ontologies` | Optional `category`, `tags`, `is_active`, `include_deleted`, `limit`, `offset` |
//! | `POST`   | `/ontologies` | Body: [`CreateBody`]; returns 201 + stored ontology |
//! | `GET`    | `/ontologies/names` | `?is_active=` (default `true`) |
//! | `POST`   | `/ontologies/validate` | Body: the document; returns the violation report |
//! | `GET`    | `/ontologies/by-name/:name` | `?version=`; latest version when omitted |
//! | `GET`    | `/ontologies/:id` | `?active_only=`; 404 if not found |
//! | `PATCH`  | `/ontologies/:id` | Body: [`OntologyPatch`] |
//! | `DELETE` | `/ontologies/:id` | Idempotent soft delete |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use triage_core::{
  classify::Classifier,
  document::{DocumentReport, validate_document},
  ontology::{NewOntology, Ontology, OntologyId, OntologyPatch, OntologySummary},
  store::{OntologyQuery, OntologyStore},
};

use crate::{
  ApiState,
  error::{ApiError, store_err},
};

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /ontologies`. Only `name` and `document` are
/// required; everything else falls back to the documented defaults.
#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:            String,
  pub document:        serde_json::Value,
  pub version:         Option<String>,
  pub category:        Option<String>,
  pub description:     Option<String>,
  pub tags:            Option<Vec<String>>,
  pub priority:        Option<i32>,
  pub matching_config: Option<serde_json::Value>,
  pub created_by:      Option<String>,
}

impl From<CreateBody> for NewOntology {
  fn from(b: CreateBody) -> Self {
    let mut input = NewOntology::new(b.name, b.document);
    if let Some(version) = b.version {
      input.version = version;
    }
    if let Some(category) = b.category {
      input.category = category;
    }
    if let Some(description) = b.description {
      input.description = description;
    }
    if let Some(tags) = b.tags {
      input.tags = tags;
    }
    if let Some(priority) = b.priority {
      input.priority = priority;
    }
    if let Some(created_by) = b.created_by {
      input.created_by = created_by;
    }
    input.matching_config = b.matching_config;
    input
  }
}

/// `POST /ontologies` — returns 201 + the stored [`Ontology`].
pub async fn create<S, C>(
  State(state): State<ApiState<S, C>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: OntologyStore,
  C: Classifier,
{
  let ontology = state
    .store
    .create_ontology(NewOntology::from(body))
    .await
    .map_err(store_err)?;
  tracing::info!(
    ontology_id = ontology.ontology_id,
    name = %ontology.name,
    version = %ontology.version,
    "ontology stored"
  );
  Ok((StatusCode::CREATED, Json(ontology)))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub category:        Option<String>,
  /// Comma-separated; all must be present on a returned row.
  pub tags:            Option<String>,
  pub is_active:       Option<bool>,
  #[serde(default)]
  pub include_deleted: bool,
  pub limit:           Option<usize>,
  pub offset:          Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
  pub ontologies: Vec<OntologySummary>,
  pub count:      usize,
  pub total:      u64,
  pub limit:      Option<usize>,
  pub offset:     Option<usize>,
}

/// `GET /ontologies[?category=...][&tags=a,b][&is_active=...][&limit=...]`
pub async fn list<S, C>(
  State(state): State<ApiState<S, C>>,
  Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, ApiError>
where
  S: OntologyStore,
  C: Classifier,
{
  let query = OntologyQuery {
    category:        params.category,
    tags:            params
      .tags
      .map(|s| s.split(',').map(|t| t.trim().to_owned()).collect())
      .unwrap_or_default(),
    is_active:       params.is_active,
    include_deleted: params.include_deleted,
    limit:           params.limit,
    offset:          params.offset,
  };

  let page = state
    .store
    .list_ontologies(&query)
    .await
    .map_err(store_err)?;

  Ok(Json(ListResponse {
    count:      page.items.len(),
    total:      page.total,
    ontologies: page.items,
    limit:      params.limit,
    offset:     params.offset,
  }))
}

// ─── Names ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NamesParams {
  #[serde(default = "default_true")]
  pub is_active: bool,
}

fn default_true() -> bool { true }

/// `GET /ontologies/names[?is_active=false]`
pub async fn names<S, C>(
  State(state): State<ApiState<S, C>>,
  Query(params): Query<NamesParams>,
) -> Result<Json<Vec<String>>, ApiError>
where
  S: OntologyStore,
  C: Classifier,
{
  let names = state
    .store
    .ontology_names(params.is_active)
    .await
    .map_err(store_err)?;
  Ok(Json(names))
}

// ─── Validate ─────────────────────────────────────────────────────────────────

/// `POST /ontologies/validate` — body is the document itself. Pure check;
/// never mutates state and never fails the request.
pub async fn validate(
  Json(document): Json<serde_json::Value>,
) -> Json<DocumentReport> {
  Json(validate_document(&document))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GetParams {
  /// When set, tombstoned rows are treated as absent. By default a lookup
  /// by id also finds soft-deleted rows, preserving access to history.
  #[serde(default)]
  pub active_only: bool,
}

/// `GET /ontologies/:id[?active_only=true]`
pub async fn get_one<S, C>(
  State(state): State<ApiState<S, C>>,
  Path(id): Path<OntologyId>,
  Query(params): Query<GetParams>,
) -> Result<Json<Ontology>, ApiError>
where
  S: OntologyStore,
  C: Classifier,
{
  let ontology = state
    .store
    .get_ontology(id, !params.active_only)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::NotFound(format!("ontology {id} not found")))?;
  Ok(Json(ontology))
}

// ─── Get by name ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ByNameParams {
  pub version: Option<String>,
}

/// `GET /ontologies/by-name/:name[?version=...]` — latest version when
/// `version` is omitted.
pub async fn get_by_name<S, C>(
  State(state): State<ApiState<S, C>>,
  Path(name): Path<String>,
  Query(params): Query<ByNameParams>,
) -> Result<Json<Ontology>, ApiError>
where
  S: OntologyStore,
  C: Classifier,
{
  let ontology = state
    .store
    .get_ontology_by_name(&name, params.version.as_deref())
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::NotFound(format!("ontology '{name}' not found")))?;
  Ok(Json(ontology))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PATCH /ontologies/:id` — body: [`OntologyPatch`]; returns the updated
/// record. Identity fields are not patchable.
pub async fn update<S, C>(
  State(state): State<ApiState<S, C>>,
  Path(id): Path<OntologyId>,
  Json(patch): Json<OntologyPatch>,
) -> Result<Json<Ontology>, ApiError>
where
  S: OntologyStore,
  C: Classifier,
{
  let ontology = state
    .store
    .update_ontology(id, patch)
    .await
    .map_err(store_err)?;
  tracing::info!(ontology_id = id, "ontology updated");
  Ok(Json(ontology))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
  pub ontology_id:     OntologyId,
  pub deleted_at:      DateTime<Utc>,
  /// True when the row was already tombstoned; the call is a no-op then.
  pub already_deleted: bool,
}

/// `DELETE /ontologies/:id` — soft delete; idempotent.
pub async fn delete<S, C>(
  State(state): State<ApiState<S, C>>,
  Path(id): Path<OntologyId>,
) -> Result<Json<DeleteResponse>, ApiError>
where
  S: OntologyStore,
  C: Classifier,
{
  let outcome = state
    .store
    .delete_ontology(id)
    .await
    .map_err(store_err)?;
  tracing::info!(ontology_id = id, "ontology soft-deleted");
  Ok(Json(DeleteResponse {
    ontology_id:     id,
    deleted_at:      outcome.deleted_at(),
    already_deleted: matches!(
      outcome,
      triage_core::store::DeleteOutcome::AlreadyDeleted { .. }
    ),
  }))
}
