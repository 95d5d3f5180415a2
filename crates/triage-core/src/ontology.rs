//! Ontology types — versioned JSON documents with selection metadata.
//!
//! The document payload is opaque to the store beyond the structural shape
//! check in [`crate::document`]. Rows are never hard-deleted; removal is a
//! tombstone so historical assignments keep a valid reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, document};

/// Row identifier in the ontology store.
pub type OntologyId = i64;

/// Priority bounds, inclusive. Higher is preferred on ties.
pub const PRIORITY_MIN: i32 = 1;
pub const PRIORITY_MAX: i32 = 100;

// ─── Tombstone ───────────────────────────────────────────────────────────────

/// Soft-delete state. A deleted row stays in the store forever; only the
/// tombstone marks it ineligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Tombstone {
  Alive,
  Deleted { at: DateTime<Utc> },
}

impl Tombstone {
  pub fn is_deleted(&self) -> bool { matches!(self, Self::Deleted { .. }) }

  /// The deletion timestamp, if tombstoned.
  pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
    match self {
      Self::Alive => None,
      Self::Deleted { at } => Some(*at),
    }
  }
}

// ─── Ontology ────────────────────────────────────────────────────────────────

/// A stored ontology. `(name, version)` is unique among all rows ever
/// created, tombstoned ones included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ontology {
  pub ontology_id:     OntologyId,
  pub name:            String,
  pub version:         String,
  /// The entity/relationship document, stored verbatim.
  pub document:        serde_json::Value,
  pub category:        String,
  pub description:     String,
  pub tags:            Vec<String>,
  pub priority:        i32,
  /// Optional selection configuration, e.g. a `project_ids` allow-list.
  pub matching_config: Option<serde_json::Value>,
  pub is_active:       bool,
  pub tombstone:       Tombstone,
  pub created_by:      String,
  /// Server-assigned; never changes after creation.
  pub created_at:      DateTime<Utc>,
  /// Refreshed by the store on every mutation.
  pub updated_at:      DateTime<Utc>,
}

/// A listing/summary view — everything but the document payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OntologySummary {
  pub ontology_id: OntologyId,
  pub name:        String,
  pub version:     String,
  pub category:    String,
  pub description: String,
  pub tags:        Vec<String>,
  pub priority:    i32,
  pub is_active:   bool,
  pub created_by:  String,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

// ─── NewOntology ─────────────────────────────────────────────────────────────

/// Input to [`crate::store::OntologyStore::create_ontology`].
/// Timestamps and the id are always assigned by the store.
#[derive(Debug, Clone)]
pub struct NewOntology {
  pub name:            String,
  pub version:         String,
  pub document:        serde_json::Value,
  pub category:        String,
  pub description:     String,
  pub tags:            Vec<String>,
  pub priority:        i32,
  pub matching_config: Option<serde_json::Value>,
  pub created_by:      String,
}

impl NewOntology {
  /// Convenience constructor with the documented defaults.
  pub fn new(name: impl Into<String>, document: serde_json::Value) -> Self {
    Self {
      name: name.into(),
      version: "1.0.0".to_string(),
      document,
      category: "general".to_string(),
      description: String::new(),
      tags: Vec::new(),
      priority: 50,
      matching_config: None,
      created_by: "system".to_string(),
    }
  }

  /// Check the document shape and the priority range, collecting every
  /// violation found.
  pub fn validate(&self) -> Result<()> {
    let report = document::validate_document(&self.document);
    let mut violations = report.violations;
    if let Err(v) = check_priority(self.priority) {
      violations.push(v);
    }
    if violations.is_empty() {
      Ok(())
    } else {
      Err(Error::Validation { violations })
    }
  }
}

// ─── OntologyPatch ───────────────────────────────────────────────────────────

/// Partial update for [`crate::store::OntologyStore::update_ontology`].
/// Identity fields (id, name, version) are never patchable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OntologyPatch {
  pub document:        Option<serde_json::Value>,
  pub category:        Option<String>,
  pub description:     Option<String>,
  pub tags:            Option<Vec<String>>,
  pub priority:        Option<i32>,
  pub matching_config: Option<serde_json::Value>,
  pub is_active:       Option<bool>,
}

impl OntologyPatch {
  pub fn is_empty(&self) -> bool {
    self.document.is_none()
      && self.category.is_none()
      && self.description.is_none()
      && self.tags.is_none()
      && self.priority.is_none()
      && self.matching_config.is_none()
      && self.is_active.is_none()
  }

  /// Validate the fields being changed, same rules as creation.
  pub fn validate(&self) -> Result<()> {
    let mut violations = Vec::new();
    if let Some(doc) = &self.document {
      violations.extend(document::validate_document(doc).violations);
    }
    if let Some(p) = self.priority
      && let Err(v) = check_priority(p)
    {
      violations.push(v);
    }
    if violations.is_empty() {
      Ok(())
    } else {
      Err(Error::Validation { violations })
    }
  }
}

fn check_priority(priority: i32) -> std::result::Result<(), String> {
  if (PRIORITY_MIN..=PRIORITY_MAX).contains(&priority) {
    Ok(())
  } else {
    Err(format!(
      "priority must be between {PRIORITY_MIN} and {PRIORITY_MAX}, got {priority}"
    ))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn valid_document() -> serde_json::Value {
    json!({
      "entities": [{"name": "Server"}],
      "relationships": [{"source": "Server", "target": "Rack", "type": "HOSTED_IN"}],
    })
  }

  #[test]
  fn new_ontology_defaults() {
    let n = NewOntology::new("infra", valid_document());
    assert_eq!(n.version, "1.0.0");
    assert_eq!(n.category, "general");
    assert_eq!(n.priority, 50);
    assert_eq!(n.created_by, "system");
    assert!(n.validate().is_ok());
  }

  #[test]
  fn priority_out_of_range_is_a_violation() {
    let mut n = NewOntology::new("infra", valid_document());
    n.priority = 0;
    let err = n.validate().unwrap_err();
    assert!(matches!(err, Error::Validation { ref violations } if violations.len() == 1));
  }

  #[test]
  fn bad_document_and_bad_priority_both_reported() {
    let mut n = NewOntology::new("infra", json!({"entities": "nope"}));
    n.priority = 101;
    match n.validate().unwrap_err() {
      Error::Validation { violations } => assert!(violations.len() >= 2),
      other => panic!("expected Validation, got {other:?}"),
    }
  }

  #[test]
  fn empty_patch_is_empty_and_valid() {
    let p = OntologyPatch::default();
    assert!(p.is_empty());
    assert!(p.validate().is_ok());
  }

  #[test]
  fn tombstone_accessors() {
    assert!(!Tombstone::Alive.is_deleted());
    assert!(Tombstone::Alive.deleted_at().is_none());
    let at = Utc::now();
    let t = Tombstone::Deleted { at };
    assert!(t.is_deleted());
    assert_eq!(t.deleted_at(), Some(at));
  }
}
