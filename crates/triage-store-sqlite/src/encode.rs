//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Structured fields (the
//! ontology document, tags, keyword lists, matching config) are stored as
//! compact JSON text.

use chrono::{DateTime, Utc};
use triage_core::{
  assignment::{Assignment, AssignmentRecord, MatchMethod},
  classify::Candidate,
  ontology::{Ontology, OntologySummary, Tombstone},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("bad timestamp {s:?}: {e}")))
}

// ─── String lists ────────────────────────────────────────────────────────────

pub fn encode_string_list(items: &[String]) -> Result<String> {
  Ok(serde_json::to_string(items)?)
}

pub fn decode_string_list(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── JSON values ─────────────────────────────────────────────────────────────

pub fn encode_json(value: &serde_json::Value) -> Result<String> {
  Ok(serde_json::to_string(value)?)
}

pub fn decode_json(s: &str) -> Result<serde_json::Value> {
  Ok(serde_json::from_str(s)?)
}

// ─── MatchMethod ─────────────────────────────────────────────────────────────

pub fn encode_match_method(m: MatchMethod) -> &'static str { m.discriminant() }

pub fn decode_match_method(s: &str) -> Result<MatchMethod> {
  match s {
    "llm_classification" => Ok(MatchMethod::LlmClassification),
    "manual_override" => Ok(MatchMethod::ManualOverride),
    "rule_based" => Ok(MatchMethod::RuleBased),
    other => Err(Error::Decode(format!("unknown match method: {other:?}"))),
  }
}

// ─── Tombstone ───────────────────────────────────────────────────────────────

pub fn decode_tombstone(deleted_at: Option<&str>) -> Result<Tombstone> {
  match deleted_at {
    None => Ok(Tombstone::Alive),
    Some(s) => Ok(Tombstone::Deleted { at: decode_dt(s)? }),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `ontologies` row.
pub struct RawOntology {
  pub ontology_id:     i64,
  pub name:            String,
  pub version:         String,
  pub document:        String,
  pub category:        String,
  pub description:     String,
  pub tags:            String,
  pub priority:        i32,
  pub matching_config: Option<String>,
  pub is_active:       bool,
  pub created_by:      String,
  pub created_at:      String,
  pub updated_at:      String,
  pub deleted_at:      Option<String>,
}

impl RawOntology {
  pub fn into_ontology(self) -> Result<Ontology> {
    Ok(Ontology {
      ontology_id:     self.ontology_id,
      name:            self.name,
      version:         self.version,
      document:        decode_json(&self.document)?,
      category:        self.category,
      description:     self.description,
      tags:            decode_string_list(&self.tags)?,
      priority:        self.priority,
      matching_config: self
        .matching_config
        .as_deref()
        .map(decode_json)
        .transpose()?,
      is_active:       self.is_active,
      tombstone:       decode_tombstone(self.deleted_at.as_deref())?,
      created_by:      self.created_by,
      created_at:      decode_dt(&self.created_at)?,
      updated_at:      decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read from an `ontologies` row without the document payload.
pub struct RawSummary {
  pub ontology_id: i64,
  pub name:        String,
  pub version:     String,
  pub category:    String,
  pub description: String,
  pub tags:        String,
  pub priority:    i32,
  pub is_active:   bool,
  pub created_by:  String,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawSummary {
  pub fn into_summary(self) -> Result<OntologySummary> {
    Ok(OntologySummary {
      ontology_id: self.ontology_id,
      name:        self.name,
      version:     self.version,
      category:    self.category,
      description: self.description,
      tags:        decode_string_list(&self.tags)?,
      priority:    self.priority,
      is_active:   self.is_active,
      created_by:  self.created_by,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw candidate columns plus the matching config needed for project
/// scoping; the config is not part of the [`Candidate`] handed to the
/// classifier.
pub struct RawCandidate {
  pub ontology_id:     i64,
  pub name:            String,
  pub version:         String,
  pub category:        String,
  pub description:     String,
  pub tags:            String,
  pub priority:        i32,
  pub matching_config: Option<String>,
}

impl RawCandidate {
  pub fn into_candidate(self) -> Result<(Candidate, Option<serde_json::Value>)> {
    let config = self
      .matching_config
      .as_deref()
      .map(decode_json)
      .transpose()?;
    let candidate = Candidate {
      ontology_id: self.ontology_id,
      name:        self.name,
      version:     self.version,
      category:    self.category,
      description: self.description,
      tags:        decode_string_list(&self.tags)?,
      priority:    self.priority,
    };
    Ok((candidate, config))
  }
}

/// Raw strings read from an `assignments` row joined with its ontology.
pub struct RawAssignmentRecord {
  // assignments columns
  pub assignment_id:      i64,
  pub ticket_id:          String,
  pub ontology_id:        i64,
  pub project_id:         Option<i64>,
  pub match_confidence:   Option<f64>,
  pub match_method:       String,
  pub llm_reasoning:      Option<String>,
  pub llm_category:       Option<String>,
  pub llm_keywords_found: String,
  pub llm_model:          Option<String>,
  pub processing_time_ms: Option<i64>,
  pub is_override:        bool,
  pub override_reason:    Option<String>,
  pub override_by:        Option<String>,
  pub ticket_title:       String,
  pub ticket_description: String,
  pub assigned_at:        String,
  // ontologies join
  pub ontology_name:      String,
  pub ontology_version:   String,
  pub ontology_category:  String,
}

impl RawAssignmentRecord {
  pub fn into_record(self) -> Result<AssignmentRecord> {
    let assignment = Assignment {
      assignment_id:      self.assignment_id,
      ticket_id:          self.ticket_id,
      ontology_id:        self.ontology_id,
      project_id:         self.project_id,
      match_confidence:   self.match_confidence,
      match_method:       decode_match_method(&self.match_method)?,
      llm_reasoning:      self.llm_reasoning,
      llm_category:       self.llm_category,
      llm_keywords_found: decode_string_list(&self.llm_keywords_found)?,
      llm_model:          self.llm_model,
      processing_time_ms: self.processing_time_ms,
      is_override:        self.is_override,
      override_reason:    self.override_reason,
      override_by:        self.override_by,
      ticket_title:       self.ticket_title,
      ticket_description: self.ticket_description,
      assigned_at:        decode_dt(&self.assigned_at)?,
    };
    Ok(AssignmentRecord {
      assignment,
      ontology_name:     self.ontology_name,
      ontology_version:  self.ontology_version,
      ontology_category: self.ontology_category,
    })
  }
}
