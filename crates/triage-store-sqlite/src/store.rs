//! [`SqliteStore`] — the SQLite implementation of [`OntologyStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use rusqlite::types::Value as SqlValue;

use triage_core::{
  assignment::{Assignment, AssignmentRecord, NewAssignment},
  classify::Candidate,
  ontology::{NewOntology, Ontology, OntologyId, OntologyPatch, OntologySummary, Tombstone},
  store::{DeleteOutcome, OntologyPage, OntologyQuery, OntologyStore},
  version::compare_versions,
};

use crate::{
  Error, Result,
  encode::{
    RawAssignmentRecord, RawCandidate, RawOntology, RawSummary, encode_dt,
    encode_json, encode_match_method, encode_string_list,
  },
  schema::SCHEMA,
};

/// Default page size for [`OntologyStore::list_ontologies`].
const DEFAULT_LIMIT: usize = 100;

const ONTOLOGY_COLUMNS: &str = "ontology_id, name, version, document, category, \
   description, tags, priority, matching_config, is_active, created_by, \
   created_at, updated_at, deleted_at";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Triage ontology store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fetch one full row by id, tombstoned or not.
  async fn fetch_ontology(&self, id: OntologyId) -> Result<Option<Ontology>> {
    let raw: Option<RawOntology> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ONTOLOGY_COLUMNS} FROM ontologies WHERE ontology_id = ?1"),
              rusqlite::params![id],
              read_raw_ontology,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawOntology::into_ontology).transpose()
  }
}

/// Read a [`RawOntology`] from a row selected with [`ONTOLOGY_COLUMNS`].
fn read_raw_ontology(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawOntology> {
  Ok(RawOntology {
    ontology_id:     row.get(0)?,
    name:            row.get(1)?,
    version:         row.get(2)?,
    document:        row.get(3)?,
    category:        row.get(4)?,
    description:     row.get(5)?,
    tags:            row.get(6)?,
    priority:        row.get(7)?,
    matching_config: row.get(8)?,
    is_active:       row.get(9)?,
    created_by:      row.get(10)?,
    created_at:      row.get(11)?,
    updated_at:      row.get(12)?,
    deleted_at:      row.get(13)?,
  })
}

/// Whether a matching config admits `project_id`. A config without a
/// `project_ids` array is globally eligible.
fn project_allows(config: Option<&serde_json::Value>, project_id: i64) -> bool {
  match config.and_then(|c| c.get("project_ids")).and_then(|v| v.as_array()) {
    None => true,
    Some(ids) => ids.iter().filter_map(|v| v.as_i64()).any(|v| v == project_id),
  }
}

/// Build the WHERE clause and parameters shared by list and count queries.
fn list_filter(query: &OntologyQuery) -> (String, Vec<SqlValue>) {
  let mut conds: Vec<String> = Vec::new();
  let mut params: Vec<SqlValue> = Vec::new();

  if !query.include_deleted {
    conds.push("deleted_at IS NULL".to_string());
  }
  if let Some(active) = query.is_active {
    conds.push("is_active = ?".to_string());
    params.push(SqlValue::Integer(active as i64));
  }
  if let Some(category) = &query.category {
    conds.push("category = ?".to_string());
    params.push(SqlValue::Text(category.clone()));
  }
  // Tags are stored as a JSON array; membership is a LIKE over the quoted
  // element, the same phase-1 approach the text search takes.
  for tag in &query.tags {
    conds.push("tags LIKE ?".to_string());
    params.push(SqlValue::Text(format!("%\"{tag}\"%")));
  }

  let where_clause = if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  };
  (where_clause, params)
}

// ─── OntologyStore impl ──────────────────────────────────────────────────────

impl OntologyStore for SqliteStore {
  type Error = Error;

  // ── Ontologies ────────────────────────────────────────────────────────────

  async fn create_ontology(&self, input: NewOntology) -> Result<Ontology> {
    input.validate().map_err(Error::Core)?;

    let now = Utc::now();
    let name            = input.name.clone();
    let version         = input.version.clone();
    let document_str    = encode_json(&input.document)?;
    let tags_str        = encode_string_list(&input.tags)?;
    let config_str      = input
      .matching_config
      .as_ref()
      .map(encode_json)
      .transpose()?;
    let category        = input.category.clone();
    let description     = input.description.clone();
    let priority        = input.priority;
    let created_by      = input.created_by.clone();
    let now_str         = encode_dt(now);

    // Uniqueness check and insert run in one closure, serialised on the
    // connection thread, so concurrent creates cannot both pass the check.
    let inserted: Option<i64> = self
      .conn
      .call(move |conn| {
        let exists: bool = conn
          .query_row(
            "SELECT 1 FROM ontologies WHERE name = ?1 AND version = ?2",
            rusqlite::params![name, version],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if exists {
          return Ok(None);
        }

        conn.execute(
          "INSERT INTO ontologies (
             name, version, document, category, description, tags,
             priority, matching_config, is_active, created_by,
             created_at, updated_at, deleted_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9, ?10, ?10, NULL)",
          rusqlite::params![
            name,
            version,
            document_str,
            category,
            description,
            tags_str,
            priority,
            config_str,
            created_by,
            now_str,
          ],
        )?;
        Ok(Some(conn.last_insert_rowid()))
      })
      .await?;

    let ontology_id = inserted.ok_or_else(|| Error::Conflict {
      name:    input.name.clone(),
      version: input.version.clone(),
    })?;

    Ok(Ontology {
      ontology_id,
      name: input.name,
      version: input.version,
      document: input.document,
      category: input.category,
      description: input.description,
      tags: input.tags,
      priority: input.priority,
      matching_config: input.matching_config,
      is_active: true,
      tombstone: Tombstone::Alive,
      created_by: input.created_by,
      created_at: now,
      updated_at: now,
    })
  }

  async fn get_ontology(
    &self,
    id: OntologyId,
    include_deleted: bool,
  ) -> Result<Option<Ontology>> {
    let ontology = self.fetch_ontology(id).await?;
    Ok(ontology.filter(|o| include_deleted || !o.tombstone.is_deleted()))
  }

  async fn get_ontology_by_name(
    &self,
    name: &str,
    version: Option<&str>,
  ) -> Result<Option<Ontology>> {
    let name_owned = name.to_owned();
    let version_owned = version.map(str::to_owned);

    let raws: Vec<RawOntology> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(v) = version_owned {
          let mut stmt = conn.prepare(&format!(
            "SELECT {ONTOLOGY_COLUMNS} FROM ontologies
             WHERE name = ?1 AND version = ?2 AND deleted_at IS NULL"
          ))?;
          stmt
            .query_map(rusqlite::params![name_owned, v], read_raw_ontology)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {ONTOLOGY_COLUMNS} FROM ontologies
             WHERE name = ?1 AND deleted_at IS NULL"
          ))?;
          stmt
            .query_map(rusqlite::params![name_owned], read_raw_ontology)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    let ontologies: Vec<Ontology> = raws
      .into_iter()
      .map(RawOntology::into_ontology)
      .collect::<Result<_>>()?;

    // Highest version wins; ties cannot occur thanks to UNIQUE(name, version).
    Ok(
      ontologies
        .into_iter()
        .max_by(|a, b| compare_versions(&a.version, &b.version)),
    )
  }

  async fn list_ontologies(&self, query: &OntologyQuery) -> Result<OntologyPage> {
    let (where_clause, params) = list_filter(query);
    let limit  = query.limit.unwrap_or(DEFAULT_LIMIT) as i64;
    let offset = query.offset.unwrap_or(0) as i64;

    let (raws, total): (Vec<RawSummary>, u64) = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT ontology_id, name, version, category, description, tags,
                  priority, is_active, created_by, created_at, updated_at
           FROM ontologies
           {where_clause}
           ORDER BY priority DESC, created_at DESC
           LIMIT ? OFFSET ?"
        );

        let mut page_params = params.clone();
        page_params.push(SqlValue::Integer(limit));
        page_params.push(SqlValue::Integer(offset));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(page_params), |row| {
            Ok(RawSummary {
              ontology_id: row.get(0)?,
              name:        row.get(1)?,
              version:     row.get(2)?,
              category:    row.get(3)?,
              description: row.get(4)?,
              tags:        row.get(5)?,
              priority:    row.get(6)?,
              is_active:   row.get(7)?,
              created_by:  row.get(8)?,
              created_at:  row.get(9)?,
              updated_at:  row.get(10)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let count_sql = format!("SELECT COUNT(*) FROM ontologies {where_clause}");
        let total: u64 = conn.query_row(
          &count_sql,
          rusqlite::params_from_iter(params),
          |row| row.get(0),
        )?;

        Ok((rows, total))
      })
      .await?;

    let items = raws
      .into_iter()
      .map(RawSummary::into_summary)
      .collect::<Result<Vec<OntologySummary>>>()?;

    Ok(OntologyPage { items, total })
  }

  async fn update_ontology(
    &self,
    id: OntologyId,
    patch: OntologyPatch,
  ) -> Result<Ontology> {
    patch.validate().map_err(Error::Core)?;
    if patch.is_empty() {
      return Err(Error::Core(triage_core::Error::Validation {
        violations: vec!["no fields to update".to_string()],
      }));
    }

    let mut ontology = self
      .get_ontology(id, false)
      .await?
      .ok_or(Error::OntologyNotFound(id))?;

    if let Some(document) = patch.document {
      ontology.document = document;
    }
    if let Some(category) = patch.category {
      ontology.category = category;
    }
    if let Some(description) = patch.description {
      ontology.description = description;
    }
    if let Some(tags) = patch.tags {
      ontology.tags = tags;
    }
    if let Some(priority) = patch.priority {
      ontology.priority = priority;
    }
    if let Some(config) = patch.matching_config {
      ontology.matching_config = Some(config);
    }
    if let Some(is_active) = patch.is_active {
      ontology.is_active = is_active;
    }
    ontology.updated_at = Utc::now();

    let document_str = encode_json(&ontology.document)?;
    let tags_str     = encode_string_list(&ontology.tags)?;
    let config_str   = ontology
      .matching_config
      .as_ref()
      .map(encode_json)
      .transpose()?;
    let category     = ontology.category.clone();
    let description  = ontology.description.clone();
    let priority     = ontology.priority;
    let is_active    = ontology.is_active;
    let updated_str  = encode_dt(ontology.updated_at);

    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE ontologies
           SET document = ?1, category = ?2, description = ?3, tags = ?4,
               priority = ?5, matching_config = ?6, is_active = ?7,
               updated_at = ?8
           WHERE ontology_id = ?9 AND deleted_at IS NULL",
          rusqlite::params![
            document_str,
            category,
            description,
            tags_str,
            priority,
            config_str,
            is_active,
            updated_str,
            id,
          ],
        )?)
      })
      .await?;

    if affected == 0 {
      return Err(Error::OntologyNotFound(id));
    }
    Ok(ontology)
  }

  async fn delete_ontology(&self, id: OntologyId) -> Result<DeleteOutcome> {
    let existing = self
      .fetch_ontology(id)
      .await?
      .ok_or(Error::OntologyNotFound(id))?;

    if let Tombstone::Deleted { at } = existing.tombstone {
      return Ok(DeleteOutcome::AlreadyDeleted { at });
    }

    let now = Utc::now();
    let now_str = encode_dt(now);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE ontologies
           SET deleted_at = ?1, is_active = 0
           WHERE ontology_id = ?2 AND deleted_at IS NULL",
          rusqlite::params![now_str, id],
        )?;
        Ok(())
      })
      .await?;

    Ok(DeleteOutcome::Deleted { at: now })
  }

  async fn ontology_names(&self, is_active: bool) -> Result<Vec<String>> {
    let names = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT name FROM ontologies
           WHERE deleted_at IS NULL AND is_active = ?1
           ORDER BY name ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![is_active], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(names)
  }

  // ── Classification candidates ─────────────────────────────────────────────

  async fn candidates(&self, project_id: Option<i64>) -> Result<Vec<Candidate>> {
    let raws: Vec<RawCandidate> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT ontology_id, name, version, category, description, tags,
                  priority, matching_config
           FROM ontologies
           WHERE is_active = 1 AND deleted_at IS NULL
           ORDER BY priority DESC, created_at DESC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawCandidate {
              ontology_id:     row.get(0)?,
              name:            row.get(1)?,
              version:         row.get(2)?,
              category:        row.get(3)?,
              description:     row.get(4)?,
              tags:            row.get(5)?,
              priority:        row.get(6)?,
              matching_config: row.get(7)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut candidates = Vec::with_capacity(raws.len());
    for raw in raws {
      let (candidate, config) = raw.into_candidate()?;
      match project_id {
        Some(pid) if !project_allows(config.as_ref(), pid) => {}
        _ => candidates.push(candidate),
      }
    }
    Ok(candidates)
  }

  // ── Assignments — append-only ─────────────────────────────────────────────

  async fn record_assignment(&self, input: NewAssignment) -> Result<Assignment> {
    let assigned_at = Utc::now();
    let keywords_str = encode_string_list(&input.llm_keywords_found)?;

    let ticket_id          = input.ticket_id.clone();
    let ontology_id        = input.ontology_id;
    let project_id         = input.project_id;
    let match_confidence   = input.match_confidence;
    let method_str         = encode_match_method(input.match_method).to_owned();
    let llm_reasoning      = input.llm_reasoning.clone();
    let llm_category       = input.llm_category.clone();
    let llm_model          = input.llm_model.clone();
    let processing_time_ms = input.processing_time_ms;
    let is_override        = input.is_override;
    let override_reason    = input.override_reason.clone();
    let override_by        = input.override_by.clone();
    let ticket_title       = input.ticket_title.clone();
    let ticket_description = input.ticket_description.clone();
    let assigned_str       = encode_dt(assigned_at);

    let assignment_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO assignments (
             ticket_id, ontology_id, project_id, match_confidence,
             match_method, llm_reasoning, llm_category, llm_keywords_found,
             llm_model, processing_time_ms, is_override, override_reason,
             override_by, ticket_title, ticket_description, assigned_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
          rusqlite::params![
            ticket_id,
            ontology_id,
            project_id,
            match_confidence,
            method_str,
            llm_reasoning,
            llm_category,
            keywords_str,
            llm_model,
            processing_time_ms,
            is_override,
            override_reason,
            override_by,
            ticket_title,
            ticket_description,
            assigned_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Assignment {
      assignment_id,
      ticket_id: input.ticket_id,
      ontology_id: input.ontology_id,
      project_id: input.project_id,
      match_confidence: input.match_confidence,
      match_method: input.match_method,
      llm_reasoning: input.llm_reasoning,
      llm_category: input.llm_category,
      llm_keywords_found: input.llm_keywords_found,
      llm_model: input.llm_model,
      processing_time_ms: input.processing_time_ms,
      is_override: input.is_override,
      override_reason: input.override_reason,
      override_by: input.override_by,
      ticket_title: input.ticket_title,
      ticket_description: input.ticket_description,
      assigned_at,
    })
  }

  async fn ticket_history(
    &self,
    ticket_id: &str,
    limit: Option<usize>,
  ) -> Result<Vec<AssignmentRecord>> {
    let ticket_owned = ticket_id.to_owned();
    // SQLite treats a negative LIMIT as "no limit".
    let limit_val = limit.map(|l| l as i64).unwrap_or(-1);

    let raws: Vec<RawAssignmentRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT
             a.assignment_id, a.ticket_id, a.ontology_id, a.project_id,
             a.match_confidence, a.match_method, a.llm_reasoning,
             a.llm_category, a.llm_keywords_found, a.llm_model,
             a.processing_time_ms, a.is_override, a.override_reason,
             a.override_by, a.ticket_title, a.ticket_description,
             a.assigned_at,
             o.name     AS ontology_name,
             o.version  AS ontology_version,
             o.category AS ontology_category
           FROM assignments a
           JOIN ontologies o ON o.ontology_id = a.ontology_id
           WHERE a.ticket_id = ?1
           ORDER BY a.assigned_at DESC, a.assignment_id DESC
           LIMIT ?2",
        )?;

        let rows = stmt
          .query_map(rusqlite::params![ticket_owned, limit_val], |row| {
            Ok(RawAssignmentRecord {
              assignment_id:      row.get(0)?,
              ticket_id:          row.get(1)?,
              ontology_id:        row.get(2)?,
              project_id:         row.get(3)?,
              match_confidence:   row.get(4)?,
              match_method:       row.get(5)?,
              llm_reasoning:      row.get(6)?,
              llm_category:       row.get(7)?,
              llm_keywords_found: row.get(8)?,
              llm_model:          row.get(9)?,
              processing_time_ms: row.get(10)?,
              is_override:        row.get(11)?,
              override_reason:    row.get(12)?,
              override_by:        row.get(13)?,
              ticket_title:       row.get(14)?,
              ticket_description: row.get(15)?,
              assigned_at:        row.get(16)?,
              ontology_name:      row.get(17)?,
              ontology_version:   row.get(18)?,
              ontology_category:  row.get(19)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawAssignmentRecord::into_record)
      .collect()
  }
}
