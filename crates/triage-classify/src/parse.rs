//! Parsing the model's reply into a verdict.
//!
//! The contract asks for bare JSON, but models routinely wrap replies in
//! markdown fences or surrounding prose. Parsing is strict first; on
//! failure exactly one repair pass runs — fence stripping, then extraction
//! of the first balanced JSON object — before giving up.

use serde::Deserialize;
use triage_core::classify::{ClassifyError, Verdict};

/// The reply shape the prompt contracts for.
#[derive(Debug, Deserialize)]
struct RawVerdict {
  ontology_id:    i64,
  confidence:     f64,
  reasoning:      String,
  category:       String,
  #[serde(default)]
  keywords_found: Vec<String>,
}

impl From<RawVerdict> for Verdict {
  fn from(raw: RawVerdict) -> Self {
    Verdict {
      ontology_id:    raw.ontology_id,
      // The contract says [0, 1]; out-of-range values are clamped rather
      // than rejected.
      confidence:     raw.confidence.clamp(0.0, 1.0),
      reasoning:      raw.reasoning,
      category:       raw.category,
      keywords_found: raw.keywords_found,
    }
  }
}

/// Parse a model reply, strictly first, then via one repair pass.
pub fn parse_verdict(content: &str) -> Result<Verdict, ClassifyError> {
  if let Ok(raw) = serde_json::from_str::<RawVerdict>(content.trim()) {
    return Ok(raw.into());
  }

  let repaired = repair(content)
    .ok_or_else(|| ClassifyError::Malformed(snippet(content)))?;
  serde_json::from_str::<RawVerdict>(&repaired)
    .map(Verdict::from)
    .map_err(|_| ClassifyError::Malformed(snippet(content)))
}

/// One repair attempt: strip markdown fences, else pull out the first
/// balanced `{...}` fragment.
fn repair(content: &str) -> Option<String> {
  if let Some(fenced) = strip_fences(content) {
    return Some(fenced);
  }
  extract_json_object(content)
}

/// Strip a ```json ... ``` (or bare ```) fence, returning the inner text.
fn strip_fences(content: &str) -> Option<String> {
  let after_open = content
    .split_once("```json")
    .or_else(|| content.split_once("```"))?
    .1;
  let inner = after_open.split_once("```")?.0;
  Some(inner.trim().to_string())
}

/// Extract the first balanced top-level JSON object from free text.
/// Brace-counting respects string literals and escapes.
fn extract_json_object(content: &str) -> Option<String> {
  let start = content.find('{')?;
  let mut depth = 0usize;
  let mut in_string = false;
  let mut escaped = false;

  for (idx, ch) in content[start..].char_indices() {
    if in_string {
      match ch {
        _ if escaped => escaped = false,
        '\\' => escaped = true,
        '"' => in_string = false,
        _ => {}
      }
      continue;
    }
    match ch {
      '"' => in_string = true,
      '{' => depth += 1,
      '}' => {
        depth -= 1;
        if depth == 0 {
          return Some(content[start..start + idx + ch.len_utf8()].to_string());
        }
      }
      _ => {}
    }
  }
  None
}

/// Truncated copy of the offending reply for error messages.
fn snippet(content: &str) -> String {
  const MAX: usize = 200;
  let trimmed = content.trim();
  if trimmed.len() <= MAX {
    trimmed.to_string()
  } else {
    let mut cut = MAX;
    while !trimmed.is_char_boundary(cut) {
      cut -= 1;
    }
    format!("{}…", &trimmed[..cut])
  }
}
