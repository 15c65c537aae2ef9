//! PostgreSQL schema for the orchestrator store.
//!
//! Two tables. `step_ids_by_name` and `pending_signals` are kept as
//! JSONB maps directly on the workflow row rather than a side table —
//! both are small, read-with-the-row, and written atomically with the
//! rest of the workflow's state inside the same transaction.

pub const CREATE_WORKFLOWS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS workflows (
    id                  UUID PRIMARY KEY,
    creation_time       TIMESTAMPTZ NOT NULL DEFAULT now(),
    name                TEXT NOT NULL,
    status              TEXT NOT NULL,
    input               JSONB NOT NULL,
    output              JSONB,
    error               TEXT,
    claimed_by          TEXT,
    claimed_at          TIMESTAMPTZ,
    lease_expires_at    TIMESTAMPTZ,
    sleep_until         TIMESTAMPTZ,
    step_ids_by_name    JSONB NOT NULL DEFAULT '{}'::jsonb,
    pending_signals     JSONB NOT NULL DEFAULT '{}'::jsonb
)
"#;

pub const CREATE_STEPS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS steps (
    id                  UUID PRIMARY KEY,
    creation_time       TIMESTAMPTZ NOT NULL DEFAULT now(),
    workflow_id         UUID NOT NULL REFERENCES workflows(id),
    name                TEXT NOT NULL,
    status              TEXT NOT NULL,
    output              JSONB,
    error               TEXT,
    sleep_until         TIMESTAMPTZ,
    awaiting_signal     TEXT,
    attempts            INT NOT NULL DEFAULT 1,
    started_at          TIMESTAMPTZ,
    completed_at        TIMESTAMPTZ
)
"#;

pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS workflows_status_idx ON workflows (status)",
    "CREATE INDEX IF NOT EXISTS workflows_status_lease_idx ON workflows (status, lease_expires_at)",
    "CREATE INDEX IF NOT EXISTS workflows_status_sleep_idx ON workflows (status, sleep_until)",
    "CREATE INDEX IF NOT EXISTS workflows_name_status_idx ON workflows (name, status)",
    "CREATE INDEX IF NOT EXISTS workflows_name_status_lease_idx ON workflows (name, status, lease_expires_at)",
    "CREATE INDEX IF NOT EXISTS workflows_name_status_sleep_idx ON workflows (name, status, sleep_until)",
    "CREATE INDEX IF NOT EXISTS steps_workflow_idx ON steps (workflow_id)",
    "CREATE INDEX IF NOT EXISTS steps_workflow_name_idx ON steps (workflow_id, name)",
];

/// Creates the tables and indexes if they do not already exist. Idempotent,
/// so it is safe to call on every process start rather than gating it
/// behind a separate migration step.
pub async fn apply_schema(pool: &sqlx::PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_WORKFLOWS_TABLE).execute(pool).await?;
    sqlx::query(CREATE_STEPS_TABLE).execute(pool).await?;
    for stmt in CREATE_INDEXES {
        sqlx::query(stmt).execute(pool).await?;
    }
    Ok(())
}
