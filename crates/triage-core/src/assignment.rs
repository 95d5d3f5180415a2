//! Assignment types — the append-only record of ticket → ontology decisions.
//!
//! Assignments are never updated or deleted. The current assignment for a
//! ticket is the row with the latest `assigned_at`; an override appends a new
//! row rather than touching the old one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  classify::Classification,
  ontology::OntologyId,
};

pub type AssignmentId = i64;

// ─── MatchMethod ─────────────────────────────────────────────────────────────

/// How the decision was made. The variant name serves as the discriminant
/// string stored in the `match_method` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
  LlmClassification,
  ManualOverride,
  RuleBased,
}

impl MatchMethod {
  /// The discriminant string stored in the database.
  /// Must match the `rename_all = "snake_case"` serde tags above.
  pub fn discriminant(&self) -> &'static str {
    match self {
      Self::LlmClassification => "llm_classification",
      Self::ManualOverride => "manual_override",
      Self::RuleBased => "rule_based",
    }
  }
}

// ─── Assignment ──────────────────────────────────────────────────────────────

/// One recorded decision. Once written, no field is ever updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
  pub assignment_id:      AssignmentId,
  /// External ticket identifier; not unique — a ticket may be reassigned.
  pub ticket_id:          String,
  pub ontology_id:        OntologyId,
  pub project_id:         Option<i64>,
  pub match_confidence:   Option<f64>,
  pub match_method:       MatchMethod,
  pub llm_reasoning:      Option<String>,
  pub llm_category:       Option<String>,
  pub llm_keywords_found: Vec<String>,
  pub llm_model:          Option<String>,
  pub processing_time_ms: Option<i64>,
  pub is_override:        bool,
  pub override_reason:    Option<String>,
  pub override_by:        Option<String>,
  /// Ticket text captured verbatim at assignment time; immutable even if
  /// the source ticket is later edited.
  pub ticket_title:       String,
  pub ticket_description: String,
  /// Server-assigned at insert; never changes.
  pub assigned_at:        DateTime<Utc>,
}

// ─── NewAssignment ───────────────────────────────────────────────────────────

/// Input to [`crate::store::OntologyStore::record_assignment`].
/// `assigned_at` is always set by the store; it is not accepted from callers.
#[derive(Debug, Clone)]
pub struct NewAssignment {
  pub ticket_id:          String,
  pub ontology_id:        OntologyId,
  pub project_id:         Option<i64>,
  pub match_confidence:   Option<f64>,
  pub match_method:       MatchMethod,
  pub llm_reasoning:      Option<String>,
  pub llm_category:       Option<String>,
  pub llm_keywords_found: Vec<String>,
  pub llm_model:          Option<String>,
  pub processing_time_ms: Option<i64>,
  pub is_override:        bool,
  pub override_reason:    Option<String>,
  pub override_by:        Option<String>,
  pub ticket_title:       String,
  pub ticket_description: String,
}

impl NewAssignment {
  /// Build the row for a model-made decision.
  pub fn classified(
    ticket_id: impl Into<String>,
    ticket_title: impl Into<String>,
    ticket_description: impl Into<String>,
    project_id: Option<i64>,
    classification: &Classification,
  ) -> Self {
    Self {
      ticket_id: ticket_id.into(),
      ontology_id: classification.verdict.ontology_id,
      project_id,
      match_confidence: Some(classification.verdict.confidence),
      match_method: MatchMethod::LlmClassification,
      llm_reasoning: Some(classification.verdict.reasoning.clone()),
      llm_category: Some(classification.verdict.category.clone()),
      llm_keywords_found: classification.verdict.keywords_found.clone(),
      llm_model: Some(classification.model.clone()),
      processing_time_ms: Some(classification.elapsed_ms),
      is_override: false,
      override_reason: None,
      override_by: None,
      ticket_title: ticket_title.into(),
      ticket_description: ticket_description.into(),
    }
  }

  /// Build the row for a human decision that supersedes (or replaces) the
  /// model's. Bypasses the classifier entirely.
  pub fn manual_override(
    ticket_id: impl Into<String>,
    ontology_id: OntologyId,
    project_id: Option<i64>,
    override_reason: impl Into<String>,
    override_by: impl Into<String>,
  ) -> Self {
    Self {
      ticket_id: ticket_id.into(),
      ontology_id,
      project_id,
      match_confidence: None,
      match_method: MatchMethod::ManualOverride,
      llm_reasoning: None,
      llm_category: None,
      llm_keywords_found: Vec::new(),
      llm_model: None,
      processing_time_ms: None,
      is_override: true,
      override_reason: Some(override_reason.into()),
      override_by: Some(override_by.into()),
      ticket_title: String::new(),
      ticket_description: String::new(),
    }
  }
}

// ─── AssignmentRecord ────────────────────────────────────────────────────────

/// An assignment joined with the selected ontology's identity, as returned
/// by the history read path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentRecord {
  pub assignment:       Assignment,
  pub ontology_name:    String,
  pub ontology_version: String,
  pub ontology_category: String,
}
