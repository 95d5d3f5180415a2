//! The assignment orchestrator.
//!
//! One classification request runs: load candidates → classify → persist →
//! respond. Any failure before the persist step is terminal and writes
//! nothing — a failed classification must not pollute history with a
//! guessed assignment. The candidate read and the assignment write are
//! deliberately separate transactions; an ontology deactivated in between
//! is accepted staleness, not a correctness bug.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use triage_core::{
  assignment::NewAssignment,
  classify::{Classifier, Ticket},
  ontology::OntologyId,
  store::OntologyStore,
};

use crate::error::{ApiError, store_err};

// ─── Request/response types ──────────────────────────────────────────────────

/// Body of `POST /assignments`.
#[derive(Debug, Deserialize)]
pub struct SelectRequest {
  pub ticket_id:          String,
  pub ticket_title:       String,
  pub ticket_description: String,
  pub project_id:         Option<i64>,
}

/// Identity of the ontology a decision landed on.
#[derive(Debug, Serialize)]
pub struct SelectedOntology {
  pub ontology_id: OntologyId,
  pub name:        String,
  pub version:     String,
  pub category:    String,
}

/// The classification detail block returned alongside a new assignment.
#[derive(Debug, Serialize)]
pub struct ClassificationDetail {
  pub confidence:         f64,
  pub reasoning:          String,
  pub category:           String,
  pub keywords_found:     Vec<String>,
  pub llm_model:          String,
  pub processing_time_ms: i64,
}

#[derive(Debug, Serialize)]
pub struct SelectResponse {
  pub assignment_id:     i64,
  pub ticket_id:         String,
  pub selected_ontology: SelectedOntology,
  pub classification:    ClassificationDetail,
  pub assigned_at:       DateTime<Utc>,
}

/// Body of `POST /assignments/override`.
#[derive(Debug, Deserialize)]
pub struct OverrideRequest {
  pub ticket_id:       String,
  pub ontology_id:     OntologyId,
  pub override_reason: String,
  pub override_by:     String,
  pub project_id:      Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct OverrideResponse {
  pub assignment_id:   i64,
  pub ticket_id:       String,
  pub ontology:        SelectedOntology,
  pub override_reason: String,
  pub override_by:     String,
  pub assigned_at:     DateTime<Utc>,
}

// ─── Orchestration ───────────────────────────────────────────────────────────

/// Classify a ticket against the active candidate set and record the
/// decision.
pub async fn select_for_ticket<S, C>(
  store: &S,
  classifier: &C,
  request: SelectRequest,
) -> Result<SelectResponse, ApiError>
where
  S: OntologyStore,
  C: Classifier,
{
  let candidates = store
    .candidates(request.project_id)
    .await
    .map_err(store_err)?;

  if candidates.is_empty() {
    tracing::warn!(ticket_id = %request.ticket_id, "no active ontologies for selection");
    return Err(ApiError::NoCandidates);
  }
  tracing::info!(
    ticket_id = %request.ticket_id,
    candidates = candidates.len(),
    "classifying ticket"
  );

  let ticket = Ticket {
    ticket_id:   request.ticket_id.clone(),
    title:       request.ticket_title.clone(),
    description: request.ticket_description.clone(),
  };
  let classification = classifier
    .classify(&ticket, &candidates)
    .await
    .map_err(|e| ApiError::from(triage_core::Error::Classify(e)))?;

  // The classifier contract already rejects selections outside the
  // candidate set, but the implementation is swappable, so the verdict is
  // checked here too before anything is written.
  let selected = candidates
    .iter()
    .find(|c| c.ontology_id == classification.verdict.ontology_id)
    .ok_or_else(|| {
      ApiError::Classification(format!(
        "model selected unknown ontology id {}",
        classification.verdict.ontology_id
      ))
    })?;

  let assignment = store
    .record_assignment(NewAssignment::classified(
      request.ticket_id,
      request.ticket_title,
      request.ticket_description,
      request.project_id,
      &classification,
    ))
    .await
    .map_err(store_err)?;

  tracing::info!(
    ticket_id = %assignment.ticket_id,
    assignment_id = assignment.assignment_id,
    ontology = %selected.name,
    confidence = classification.verdict.confidence,
    "ontology selected and assigned"
  );

  Ok(SelectResponse {
    assignment_id:     assignment.assignment_id,
    ticket_id:         assignment.ticket_id,
    selected_ontology: SelectedOntology {
      ontology_id: selected.ontology_id,
      name:        selected.name.clone(),
      version:     selected.version.clone(),
      category:    selected.category.clone(),
    },
    classification:    ClassificationDetail {
      confidence:         classification.verdict.confidence,
      reasoning:          classification.verdict.reasoning,
      category:           classification.verdict.category,
      keywords_found:     classification.verdict.keywords_found,
      llm_model:          classification.model,
      processing_time_ms: classification.elapsed_ms,
    },
    assigned_at:       assignment.assigned_at,
  })
}

/// Record a human decision, bypassing the classifier entirely.
pub async fn override_for_ticket<S>(
  store: &S,
  request: OverrideRequest,
) -> Result<OverrideResponse, ApiError>
where
  S: OntologyStore,
{
  // The target must exist and not be tombstoned.
  let ontology = store
    .get_ontology(request.ontology_id, false)
    .await
    .map_err(store_err)?
    .ok_or_else(|| {
      ApiError::NotFound(format!("ontology {} not found", request.ontology_id))
    })?;

  let assignment = store
    .record_assignment(NewAssignment::manual_override(
      request.ticket_id,
      request.ontology_id,
      request.project_id,
      request.override_reason,
      request.override_by,
    ))
    .await
    .map_err(store_err)?;

  tracing::info!(
    ticket_id = %assignment.ticket_id,
    assignment_id = assignment.assignment_id,
    ontology = %ontology.name,
    "override recorded"
  );

  Ok(OverrideResponse {
    assignment_id:   assignment.assignment_id,
    ticket_id:       assignment.ticket_id,
    ontology:        SelectedOntology {
      ontology_id: ontology.ontology_id,
      name:        ontology.name,
      version:     ontology.version,
      category:    ontology.category,
    },
    // Always present on a manual override row.
    override_reason: assignment.override_reason.unwrap_or_default(),
    override_by:     assignment.override_by.unwrap_or_default(),
    assigned_at:     assignment.assigned_at,
  })
}
