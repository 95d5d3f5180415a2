//! Structural validation of ontology documents.
//!
//! The payload stays a semi-structured [`serde_json::Value`]; callers may
//! extend entity/relationship shapes freely. Validation only checks the
//! skeleton: `entities` is an array of objects each carrying a `name`, and
//! `relationships` is an array of objects each carrying `source`, `target`,
//! and `type`. Every violation is reported, not just the first.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a structural check. Never an error in itself; the create path
/// converts a failing report into [`crate::Error::Validation`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
  pub is_valid:           bool,
  pub violations:         Vec<String>,
  pub entity_count:       usize,
  pub relationship_count: usize,
}

/// Validate the skeleton of an ontology document.
pub fn validate_document(document: &Value) -> DocumentReport {
  let mut violations = Vec::new();
  let mut entity_count = 0;
  let mut relationship_count = 0;

  if !document.is_object() {
    violations.push("document must be a JSON object".to_string());
    return DocumentReport { is_valid: false, violations, entity_count, relationship_count };
  }

  match document.get("entities") {
    None => violations.push("missing required key: 'entities'".to_string()),
    Some(Value::Array(entities)) => {
      entity_count = entities.len();
      for (idx, entity) in entities.iter().enumerate() {
        match entity {
          Value::Object(obj) => {
            if !obj.contains_key("name") {
              violations.push(format!("entity at index {idx} missing 'name' field"));
            }
          }
          _ => violations.push(format!("entity at index {idx} must be an object")),
        }
      }
    }
    Some(_) => violations.push("'entities' must be an array".to_string()),
  }

  match document.get("relationships") {
    None => violations.push("missing required key: 'relationships'".to_string()),
    Some(Value::Array(relationships)) => {
      relationship_count = relationships.len();
      for (idx, rel) in relationships.iter().enumerate() {
        match rel {
          Value::Object(obj) => {
            for field in ["source", "target", "type"] {
              if !obj.contains_key(field) {
                violations.push(format!("relationship at index {idx} missing '{field}' field"));
              }
            }
          }
          _ => violations.push(format!("relationship at index {idx} must be an object")),
        }
      }
    }
    Some(_) => violations.push("'relationships' must be an array".to_string()),
  }

  DocumentReport {
    is_valid: violations.is_empty(),
    violations,
    entity_count,
    relationship_count,
  }
}
