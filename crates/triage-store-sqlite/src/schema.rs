//! SQL schema for the Triage SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Ontology rows are never hard-deleted; removal sets deleted_at.
-- (name, version) is unique among all rows ever created, tombstoned included.
CREATE TABLE IF NOT EXISTS ontologies (
    ontology_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    name            TEXT NOT NULL,
    version         TEXT NOT NULL,
    document        TEXT NOT NULL,     -- JSON payload, stored verbatim
    category        TEXT NOT NULL DEFAULT 'general',
    description     TEXT NOT NULL DEFAULT '',
    tags            TEXT NOT NULL DEFAULT '[]',
    priority        INTEGER NOT NULL DEFAULT 50,
    matching_config TEXT,              -- optional JSON or NULL
    is_active       INTEGER NOT NULL DEFAULT 1,
    created_by      TEXT NOT NULL DEFAULT 'system',
    created_at      TEXT NOT NULL,     -- ISO 8601 UTC; server-assigned
    updated_at      TEXT NOT NULL,     -- refreshed on every mutation
    deleted_at      TEXT,              -- NULL = alive
    UNIQUE (name, version),
    CHECK  (priority BETWEEN 1 AND 100)
);

-- Assignments are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
-- The FK carries no ON DELETE action: a referenced ontology cannot be
-- hard-removed while any assignment points at it.
CREATE TABLE IF NOT EXISTS assignments (
    assignment_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    ticket_id          TEXT NOT NULL,
    ontology_id        INTEGER NOT NULL REFERENCES ontologies(ontology_id),
    project_id         INTEGER,
    match_confidence   REAL,           -- in [0, 1] when present
    match_method       TEXT NOT NULL,  -- 'llm_classification' | 'manual_override' | 'rule_based'
    llm_reasoning      TEXT,
    llm_category       TEXT,
    llm_keywords_found TEXT NOT NULL DEFAULT '[]',
    llm_model          TEXT,
    processing_time_ms INTEGER,
    is_override        INTEGER NOT NULL DEFAULT 0,
    override_reason    TEXT,
    override_by        TEXT,
    ticket_title       TEXT NOT NULL DEFAULT '',
    ticket_description TEXT NOT NULL DEFAULT '',
    assigned_at        TEXT NOT NULL   -- ISO 8601 UTC; server-assigned
);

CREATE INDEX IF NOT EXISTS ontologies_name_idx     ON ontologies(name);
CREATE INDEX IF NOT EXISTS ontologies_category_idx ON ontologies(category);
CREATE INDEX IF NOT EXISTS ontologies_active_idx   ON ontologies(is_active, deleted_at);
CREATE INDEX IF NOT EXISTS ontologies_priority_idx ON ontologies(priority);

CREATE INDEX IF NOT EXISTS assignments_ticket_idx   ON assignments(ticket_id);
CREATE INDEX IF NOT EXISTS assignments_ontology_idx ON assignments(ontology_id);
CREATE INDEX IF NOT EXISTS assignments_project_idx  ON assignments(project_id);
CREATE INDEX IF NOT EXISTS assignments_assigned_idx ON assignments(assigned_at);
CREATE INDEX IF NOT EXISTS assignments_method_idx   ON assignments(match_method);
CREATE INDEX IF NOT EXISTS assignments_override_idx ON assignments(is_override);

PRAGMA user_version = 1;
";
