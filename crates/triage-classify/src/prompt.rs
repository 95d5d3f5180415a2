//! Prompt construction for ontology selection.
//!
//! The template is fixed so repeated classifications of the same ticket stay
//! comparable. Candidates are embedded as a JSON array of summaries —
//! id, name, category, description, tags, priority — never the full
//! document, to bound prompt size. Priority is advisory context for the
//! model, not a rule the caller enforces.

use serde::Serialize;
use triage_core::classify::{Candidate, Ticket};

/// System message: the selection task and the exact reply contract.
pub const SYSTEM_PROMPT: &str = "\
You are an expert at matching IT support tickets to data ontologies.
Analyze the ticket and select the most appropriate ontology based on the
ticket's domain, category, and technical requirements.

Consider:
1. Technical domain (infrastructure, application, database, network, etc.)
2. Ticket type (incident, query, request, etc.)
3. Keywords and technical terms
4. Business context
5. Ontology priority (1-100, higher is preferred among equally good fits)

Respond ONLY with valid JSON matching this structure:
{
    \"ontology_id\": <selected_ontology_id>,
    \"confidence\": <0.0-1.0>,
    \"reasoning\": \"<brief explanation>\",
    \"category\": \"<identified_category>\",
    \"keywords_found\": [\"<keyword1>\", \"<keyword2>\"]
}";

/// The candidate fields shown to the model.
#[derive(Serialize)]
struct CandidateSummary<'a> {
  id:          i64,
  name:        &'a str,
  category:    &'a str,
  description: &'a str,
  tags:        &'a [String],
  priority:    i32,
}

/// Build the user message for one classification request.
pub fn build_user_prompt(ticket: &Ticket, candidates: &[Candidate]) -> String {
  let summaries: Vec<CandidateSummary<'_>> = candidates
    .iter()
    .map(|c| CandidateSummary {
      id:          c.ontology_id,
      name:        &c.name,
      category:    &c.category,
      description: &c.description,
      tags:        &c.tags,
      priority:    c.priority,
    })
    .collect();

  // Summaries are plain data; serialisation cannot fail.
  let options = serde_json::to_string_pretty(&summaries)
    .unwrap_or_else(|_| "[]".to_string());

  format!(
    "Ticket Information:\n\
     Title: {}\n\
     Description: {}\n\
     \n\
     Available Ontologies:\n\
     {}\n\
     \n\
     Select the most appropriate ontology for this ticket.",
    ticket.title, ticket.description, options
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ticket() -> Ticket {
    Ticket {
      ticket_id:   "TKT-1".to_string(),
      title:       "Production server connectivity issue".to_string(),
      description: "Packet loss between core switches".to_string(),
    }
  }

  fn candidate(id: i64, name: &str, priority: i32) -> Candidate {
    Candidate {
      ontology_id: id,
      name:        name.to_string(),
      version:     "1.0.0".to_string(),
      category:    "infrastructure".to_string(),
      description: "Network gear".to_string(),
      tags:        vec!["network".to_string()],
      priority,
    }
  }

  #[test]
  fn prompt_contains_ticket_text_and_candidates() {
    let prompt = build_user_prompt(&ticket(), &[candidate(1, "infra", 80)]);
    assert!(prompt.contains("Production server connectivity issue"));
    assert!(prompt.contains("Packet loss between core switches"));
    assert!(prompt.contains("\"name\": \"infra\""));
    assert!(prompt.contains("\"id\": 1"));
  }

  #[test]
  fn prompt_carries_priority_as_guidance() {
    let prompt = build_user_prompt(
      &ticket(),
      &[candidate(1, "a", 80), candidate(2, "b", 50)],
    );
    assert!(prompt.contains("\"priority\": 80"));
    assert!(prompt.contains("\"priority\": 50"));
    assert!(SYSTEM_PROMPT.contains("priority"));
  }

  #[test]
  fn prompt_never_includes_the_document() {
    let prompt = build_user_prompt(&ticket(), &[candidate(1, "infra", 80)]);
    assert!(!prompt.contains("entities"));
    assert!(!prompt.contains("relationships"));
  }

  #[test]
  fn candidates_appear_in_given_order() {
    let prompt = build_user_prompt(
      &ticket(),
      &[candidate(9, "first", 90), candidate(3, "second", 10)],
    );
    let first = prompt.find("\"first\"").unwrap();
    let second = prompt.find("\"second\"").unwrap();
    assert!(first < second);
  }
}
