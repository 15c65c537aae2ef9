//! PostgreSQL-backed [`OrchestratorStore`].
//!
//! Every operation that spans the `workflows` and `steps` tables runs
//! inside a single `sqlx::Transaction`, and ownership-guarded mutations
//! use `UPDATE ... WHERE claimed_by = $n AND status = 'running'` so the
//! row count tells us whether the claim was still held, mirroring the
//! `SELECT ... FOR UPDATE` + conditional `UPDATE` pattern used
//! throughout this backend.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use tokio::sync::watch;
use tracing::{error, instrument};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::model::{Step, StepStatus, Workflow, WorkflowStatus, CLAIM_TIMEOUT};
use crate::store::{
    ClaimedWorkflow, ListWorkflowsFilter, OrchestratorStore, SignalWaitOutcome, StepInfo,
};

pub struct PostgresOrchestratorStore {
    pool: PgPool,
    generation_tx: watch::Sender<u64>,
}

impl PostgresOrchestratorStore {
    pub fn new(pool: PgPool) -> Self {
        let (generation_tx, _rx) = watch::channel(0);
        Self { pool, generation_tx }
    }

    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPool::connect(database_url).await.map_err(|e| {
            error!(error = %e, "failed to connect to orchestrator database");
            StoreError::Database(e.to_string())
        })?;
        crate::schema::apply_schema(&pool).await.map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn bump_generation(&self) {
        self.generation_tx.send_modify(|g| *g = g.wrapping_add(1));
    }
}

fn workflow_from_row(row: &PgRow) -> StoreResult<Workflow> {
    let status_str: String = row.try_get("status").map_err(db_err)?;
    let step_ids_by_name: serde_json::Value = row.try_get("step_ids_by_name").map_err(db_err)?;
    let pending_signals: serde_json::Value = row.try_get("pending_signals").map_err(db_err)?;
    Ok(Workflow {
        id: row.try_get("id").map_err(db_err)?,
        creation_time: row.try_get("creation_time").map_err(db_err)?,
        name: row.try_get("name").map_err(db_err)?,
        status: WorkflowStatus::parse(&status_str)
            .ok_or_else(|| StoreError::Database(format!("unknown workflow status {status_str}")))?,
        input: row.try_get("input").map_err(db_err)?,
        output: row.try_get("output").map_err(db_err)?,
        error: row.try_get("error").map_err(db_err)?,
        claimed_by: row.try_get("claimed_by").map_err(db_err)?,
        claimed_at: row.try_get("claimed_at").map_err(db_err)?,
        lease_expires_at: row.try_get("lease_expires_at").map_err(db_err)?,
        sleep_until: row.try_get("sleep_until").map_err(db_err)?,
        step_ids_by_name: serde_json::from_value(step_ids_by_name)?,
        pending_signals: serde_json::from_value(pending_signals)?,
    })
}

fn step_from_row(row: &PgRow) -> StoreResult<Step> {
    let status_str: String = row.try_get("status").map_err(db_err)?;
    Ok(Step {
        id: row.try_get("id").map_err(db_err)?,
        creation_time: row.try_get("creation_time").map_err(db_err)?,
        workflow_id: row.try_get("workflow_id").map_err(db_err)?,
        name: row.try_get("name").map_err(db_err)?,
        status: StepStatus::parse(&status_str)
            .ok_or_else(|| StoreError::Database(format!("unknown step status {status_str}")))?,
        output: row.try_get("output").map_err(db_err)?,
        error: row.try_get("error").map_err(db_err)?,
        sleep_until: row.try_get("sleep_until").map_err(db_err)?,
        awaiting_signal: row.try_get("awaiting_signal").map_err(db_err)?,
        attempts: row.try_get("attempts").map_err(db_err)?,
        started_at: row.try_get("started_at").map_err(db_err)?,
        completed_at: row.try_get("completed_at").map_err(db_err)?,
    })
}

fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

#[async_trait]
impl OrchestratorStore for PostgresOrchestratorStore {
    #[instrument(skip(self, input))]
    async fn start_workflow(&self, name: &str, input: serde_json::Value) -> StoreResult<Uuid> {
        let id = Uuid::now_v7();
        sqlx::query(
            "INSERT INTO workflows (id, name, status, input) VALUES ($1, $2, 'pending', $3)",
        )
        .bind(id)
        .bind(name)
        .bind(&input)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        self.bump_generation();
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn claim(
        &self,
        workflow_names: &[String],
        worker_id: &str,
    ) -> StoreResult<Option<ClaimedWorkflow>> {
        let wildcard = workflow_names.iter().any(|n| n == "*");
        let names: Vec<String> = workflow_names.to_vec();
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        macro_rules! pick_one {
            ($filtered:expr, $wildcard_q:expr) => {{
                if wildcard {
                    sqlx::query($wildcard_q).fetch_optional(&mut *tx).await.map_err(db_err)?
                } else {
                    sqlx::query($filtered).bind(&names).fetch_optional(&mut *tx).await.map_err(db_err)?
                }
            }};
        }

        let row = pick_one!(
            "SELECT id FROM workflows WHERE status = 'pending' AND name = ANY($1) \
             ORDER BY creation_time LIMIT 1 FOR UPDATE SKIP LOCKED",
            "SELECT id FROM workflows WHERE status = 'pending' \
             ORDER BY creation_time LIMIT 1 FOR UPDATE SKIP LOCKED"
        );

        let row = match row {
            Some(r) => Some(r),
            None => pick_one!(
                "SELECT id FROM workflows WHERE status = 'sleeping' AND sleep_until <= now() \
                 AND name = ANY($1) ORDER BY sleep_until, creation_time LIMIT 1 FOR UPDATE SKIP LOCKED",
                "SELECT id FROM workflows WHERE status = 'sleeping' AND sleep_until <= now() \
                 ORDER BY sleep_until, creation_time LIMIT 1 FOR UPDATE SKIP LOCKED"
            ),
        };

        let row = match row {
            Some(r) => Some(r),
            None => pick_one!(
                "SELECT id FROM workflows WHERE status = 'running' AND lease_expires_at < now() \
                 AND name = ANY($1) ORDER BY creation_time LIMIT 1 FOR UPDATE SKIP LOCKED",
                "SELECT id FROM workflows WHERE status = 'running' AND lease_expires_at < now() \
                 ORDER BY creation_time LIMIT 1 FOR UPDATE SKIP LOCKED"
            ),
        };

        let row = match row {
            Some(r) => Some(r),
            None => pick_one!(
                "SELECT id FROM workflows WHERE status = 'running' AND lease_expires_at IS NULL \
                 AND claimed_at < now() - interval '30 seconds' AND name = ANY($1) \
                 ORDER BY creation_time LIMIT 1 FOR UPDATE SKIP LOCKED",
                "SELECT id FROM workflows WHERE status = 'running' AND lease_expires_at IS NULL \
                 AND claimed_at < now() - interval '30 seconds' \
                 ORDER BY creation_time LIMIT 1 FOR UPDATE SKIP LOCKED"
            ),
        };

        let Some(row) = row else {
            tx.commit().await.map_err(db_err)?;
            return Ok(None);
        };
        let id: Uuid = row.try_get("id").map_err(db_err)?;

        let updated = sqlx::query(
            "UPDATE workflows SET status = 'running', claimed_by = $2, claimed_at = now(), \
             lease_expires_at = now() + interval '30 seconds', sleep_until = NULL \
             WHERE id = $1 RETURNING name, input",
        )
        .bind(id)
        .bind(worker_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;

        Ok(Some(ClaimedWorkflow {
            workflow_id: id,
            name: updated.try_get("name").map_err(db_err)?,
            input: updated.try_get("input").map_err(db_err)?,
        }))
    }

    #[instrument(skip(self))]
    async fn heartbeat(&self, workflow_id: Uuid, worker_id: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE workflows SET lease_expires_at = now() + interval '30 seconds' \
             WHERE id = $1 AND claimed_by = $2 AND status = 'running'",
        )
        .bind(workflow_id)
        .bind(worker_id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            self.ensure_exists(workflow_id).await?;
        }
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, output))]
    async fn complete_workflow(
        &self,
        workflow_id: Uuid,
        worker_id: &str,
        output: serde_json::Value,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE workflows SET status = 'completed', output = $3, claimed_by = NULL, \
             claimed_at = NULL, lease_expires_at = NULL \
             WHERE id = $1 AND claimed_by = $2 AND status = 'running'",
        )
        .bind(workflow_id)
        .bind(worker_id)
        .bind(&output)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            self.ensure_exists(workflow_id).await?;
        }
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn fail_workflow(&self, workflow_id: Uuid, worker_id: &str, error: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE workflows SET status = 'failed', error = $3, claimed_by = NULL, \
             claimed_at = NULL, lease_expires_at = NULL \
             WHERE id = $1 AND claimed_by = $2 AND status = 'running'",
        )
        .bind(workflow_id)
        .bind(worker_id)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            self.ensure_exists(workflow_id).await?;
        }
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn sleep_workflow(
        &self,
        workflow_id: Uuid,
        worker_id: &str,
        sleep_until: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE workflows SET status = 'sleeping', sleep_until = $3, claimed_by = NULL, \
             claimed_at = NULL, lease_expires_at = NULL \
             WHERE id = $1 AND claimed_by = $2 AND status = 'running'",
        )
        .bind(workflow_id)
        .bind(worker_id)
        .bind(sleep_until)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            self.ensure_exists(workflow_id).await?;
        }
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn get_or_create_step(
        &self,
        workflow_id: Uuid,
        step_name: &str,
        worker_id: &str,
    ) -> StoreResult<StepInfo> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let row = sqlx::query(
            "SELECT status, claimed_by, step_ids_by_name FROM workflows WHERE id = $1 FOR UPDATE",
        )
        .bind(workflow_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?
        .ok_or(StoreError::WorkflowNotFound(workflow_id))?;

        let status: String = row.try_get("status").map_err(db_err)?;
        let claimed_by: Option<String> = row.try_get("claimed_by").map_err(db_err)?;
        if status != "running" || claimed_by.as_deref() != Some(worker_id) {
            return Err(StoreError::NotOwned(workflow_id, worker_id.to_string()));
        }

        let step_ids_by_name: serde_json::Value = row.try_get("step_ids_by_name").map_err(db_err)?;
        let mut map: HashMap<String, Uuid> = serde_json::from_value(step_ids_by_name)?;

        if let Some(step_id) = map.get(step_name).copied() {
            let step_row = sqlx::query("SELECT * FROM steps WHERE id = $1")
                .bind(step_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(db_err)?;
            let step = step_from_row(&step_row)?;
            tx.commit().await.map_err(db_err)?;
            return Ok(StepInfo {
                step_id,
                status: step.status,
                output: step.output,
                error: step.error,
                sleep_until: step.sleep_until,
                is_new: false,
            });
        }

        let step_id = Uuid::now_v7();
        sqlx::query(
            "INSERT INTO steps (id, workflow_id, name, status, attempts, started_at) \
             VALUES ($1, $2, $3, 'running', 1, now())",
        )
        .bind(step_id)
        .bind(workflow_id)
        .bind(step_name)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        map.insert(step_name.to_string(), step_id);
        sqlx::query("UPDATE workflows SET step_ids_by_name = $2 WHERE id = $1")
            .bind(workflow_id)
            .bind(serde_json::to_value(&map)?)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(StepInfo { step_id, status: StepStatus::Running, output: None, error: None, sleep_until: None, is_new: true })
    }

    #[instrument(skip(self, output))]
    async fn complete_step(
        &self,
        workflow_id: Uuid,
        step_id: Uuid,
        worker_id: &str,
        output: serde_json::Value,
    ) -> StoreResult<bool> {
        if !self.still_owns(workflow_id, worker_id).await? {
            return Ok(false);
        }
        let result = sqlx::query(
            "UPDATE steps SET status = 'completed', output = $3, completed_at = now() \
             WHERE id = $1 AND workflow_id = $2",
        )
        .bind(step_id)
        .bind(workflow_id)
        .bind(&output)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::StepNotFound(step_id));
        }
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn fail_step(&self, workflow_id: Uuid, step_id: Uuid, worker_id: &str, error: &str) -> StoreResult<bool> {
        if !self.still_owns(workflow_id, worker_id).await? {
            return Ok(false);
        }
        let result = sqlx::query(
            "UPDATE steps SET status = 'failed', error = $3, completed_at = now() \
             WHERE id = $1 AND workflow_id = $2",
        )
        .bind(step_id)
        .bind(workflow_id)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::StepNotFound(step_id));
        }
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn schedule_sleep(
        &self,
        workflow_id: Uuid,
        step_id: Uuid,
        worker_id: &str,
        sleep_until: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let owned: bool = sqlx::query(
            "SELECT 1 FROM workflows WHERE id = $1 AND claimed_by = $2 AND status = 'running' FOR UPDATE",
        )
        .bind(workflow_id)
        .bind(worker_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?
        .is_some();
        if !owned {
            return Ok(false);
        }

        // The marker fires once: keep any wake time already recorded on the step.
        let existing: Option<DateTime<Utc>> = sqlx::query("SELECT sleep_until FROM steps WHERE id = $1")
            .bind(step_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err)?
            .try_get("sleep_until")
            .map_err(db_err)?;
        let wake_at = existing.unwrap_or(sleep_until);

        sqlx::query("UPDATE steps SET sleep_until = $2 WHERE id = $1")
            .bind(step_id)
            .bind(wake_at)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        sqlx::query(
            "UPDATE workflows SET status = 'sleeping', sleep_until = $2, claimed_by = NULL, \
             claimed_at = NULL, lease_expires_at = NULL WHERE id = $1",
        )
        .bind(workflow_id)
        .bind(wake_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn wait_for_signal(
        &self,
        workflow_id: Uuid,
        step_id: Uuid,
        worker_id: &str,
        signal_name: &str,
    ) -> StoreResult<SignalWaitOutcome> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let row = sqlx::query(
            "SELECT status, claimed_by, pending_signals FROM workflows WHERE id = $1 FOR UPDATE",
        )
        .bind(workflow_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?
        .ok_or(StoreError::WorkflowNotFound(workflow_id))?;

        let status: String = row.try_get("status").map_err(db_err)?;
        let claimed_by: Option<String> = row.try_get("claimed_by").map_err(db_err)?;
        if status != "running" || claimed_by.as_deref() != Some(worker_id) {
            return Err(StoreError::NotOwned(workflow_id, worker_id.to_string()));
        }

        let pending_signals: serde_json::Value = row.try_get("pending_signals").map_err(db_err)?;
        let mut map: HashMap<String, serde_json::Value> = serde_json::from_value(pending_signals)?;

        if let Some(payload) = map.remove(signal_name) {
            sqlx::query("UPDATE workflows SET pending_signals = $2 WHERE id = $1")
                .bind(workflow_id)
                .bind(serde_json::to_value(&map)?)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
            sqlx::query(
                "UPDATE steps SET status = 'completed', output = $2, completed_at = now() WHERE id = $1",
            )
            .bind(step_id)
            .bind(&payload)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
            tx.commit().await.map_err(db_err)?;
            return Ok(SignalWaitOutcome::Signaled { payload });
        }

        sqlx::query("UPDATE steps SET awaiting_signal = $2 WHERE id = $1")
            .bind(step_id)
            .bind(signal_name)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        sqlx::query(
            "UPDATE workflows SET status = 'waiting', claimed_by = NULL, claimed_at = NULL, \
             lease_expires_at = NULL WHERE id = $1",
        )
        .bind(workflow_id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
        tx.commit().await.map_err(db_err)?;
        Ok(SignalWaitOutcome::Waiting)
    }

    #[instrument(skip(self, payload))]
    async fn signal_workflow(
        &self,
        workflow_id: Uuid,
        signal_name: &str,
        payload: serde_json::Value,
    ) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let row = sqlx::query("SELECT status, pending_signals FROM workflows WHERE id = $1 FOR UPDATE")
            .bind(workflow_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?
            .ok_or(StoreError::WorkflowNotFound(workflow_id))?;

        let status: String = row.try_get("status").map_err(db_err)?;
        if WorkflowStatus::parse(&status).is_some_and(WorkflowStatus::is_terminal) {
            return Ok(false);
        }

        let pending_signals: serde_json::Value = row.try_get("pending_signals").map_err(db_err)?;
        let mut map: HashMap<String, serde_json::Value> = serde_json::from_value(pending_signals)?;
        map.insert(signal_name.to_string(), payload);

        if status == "waiting" {
            sqlx::query(
                "UPDATE workflows SET status = 'pending', sleep_until = NULL, pending_signals = $2 \
                 WHERE id = $1",
            )
            .bind(workflow_id)
            .bind(serde_json::to_value(&map)?)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        } else {
            sqlx::query("UPDATE workflows SET pending_signals = $2 WHERE id = $1")
                .bind(workflow_id)
                .bind(serde_json::to_value(&map)?)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }
        tx.commit().await.map_err(db_err)?;
        self.bump_generation();
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn get_workflow(&self, workflow_id: Uuid) -> StoreResult<Workflow> {
        let row = sqlx::query("SELECT * FROM workflows WHERE id = $1")
            .bind(workflow_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or(StoreError::WorkflowNotFound(workflow_id))?;
        workflow_from_row(&row)
    }

    #[instrument(skip(self))]
    async fn list_workflows(&self, filter: ListWorkflowsFilter) -> StoreResult<Vec<Workflow>> {
        let status_str = filter.status.map(|s| s.to_string());
        let limit = if filter.limit <= 0 { 50 } else { filter.limit };
        let rows = sqlx::query(
            "SELECT * FROM workflows \
             WHERE ($1::text IS NULL OR name = $1) AND ($2::text IS NULL OR status = $2) \
             ORDER BY creation_time LIMIT $3 OFFSET $4",
        )
        .bind(&filter.name)
        .bind(&status_str)
        .bind(limit)
        .bind(filter.offset.max(0))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(workflow_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn get_workflow_steps(&self, workflow_id: Uuid) -> StoreResult<Vec<Step>> {
        self.ensure_exists(workflow_id).await?;
        let rows = sqlx::query("SELECT * FROM steps WHERE workflow_id = $1 ORDER BY creation_time")
            .bind(workflow_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(step_from_row).collect()
    }

    fn subscribe_pending_workflows(&self) -> watch::Receiver<u64> {
        self.generation_tx.subscribe()
    }

    #[instrument(skip(self))]
    async fn has_pending_work(&self, workflow_names: &[String]) -> StoreResult<bool> {
        let wildcard = workflow_names.iter().any(|n| n == "*");
        let names: Vec<String> = workflow_names.to_vec();
        let row = if wildcard {
            sqlx::query(
                "SELECT EXISTS (SELECT 1 FROM workflows WHERE status = 'pending' \
                 OR (status = 'sleeping' AND sleep_until <= now())) AS found",
            )
            .fetch_one(&self.pool)
            .await
        } else {
            sqlx::query(
                "SELECT EXISTS (SELECT 1 FROM workflows WHERE name = ANY($1) AND (status = 'pending' \
                 OR (status = 'sleeping' AND sleep_until <= now()))) AS found",
            )
            .bind(&names)
            .fetch_one(&self.pool)
            .await
        }
        .map_err(db_err)?;
        row.try_get("found").map_err(db_err)
    }
}

impl PostgresOrchestratorStore {
    async fn ensure_exists(&self, workflow_id: Uuid) -> StoreResult<()> {
        let exists: bool = sqlx::query("SELECT EXISTS (SELECT 1 FROM workflows WHERE id = $1) AS found")
            .bind(workflow_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?
            .try_get("found")
            .map_err(db_err)?;
        if exists {
            Ok(())
        } else {
            Err(StoreError::WorkflowNotFound(workflow_id))
        }
    }

    async fn still_owns(&self, workflow_id: Uuid, worker_id: &str) -> StoreResult<bool> {
        let row = sqlx::query("SELECT status, claimed_by FROM workflows WHERE id = $1")
            .bind(workflow_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or(StoreError::WorkflowNotFound(workflow_id))?;
        let status: String = row.try_get("status").map_err(db_err)?;
        let claimed_by: Option<String> = row.try_get("claimed_by").map_err(db_err)?;
        Ok(status == "running" && claimed_by.as_deref() == Some(worker_id))
    }
}
