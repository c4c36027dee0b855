use crate::error::CoreError;
use crate::models::{MaterializationSummary, Occurrence, Task};
use crate::recurrence::RecurrenceRule;
use crate::repository::{short_id_pattern, SqliteRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[async_trait]
impl super::OccurrenceRepository for SqliteRepository {
    async fn ensure_occurrences_up_to(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        horizon: DateTime<Utc>,
    ) -> Result<MaterializationSummary, CoreError> {
        let mut conn = self.pool().acquire().await?;
        let task = Self::find_visible_task(&mut conn, user_id, task_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("task {}", task_id)))?;

        Self::generate_occurrences(&mut conn, &task, horizon, Utc::now()).await
    }

    async fn list_occurrences(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Occurrence>, CoreError> {
        let mut conn = self.pool().acquire().await?;
        Self::find_visible_task(&mut conn, user_id, task_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("task {}", task_id)))?;

        let occurrences = sqlx::query_as(
            r#"SELECT * FROM task_occurrences
            WHERE task_id = $1 AND user_id = $2 AND due_at >= $3 AND due_at <= $4
            ORDER BY due_at ASC, id ASC"#,
        )
        .bind(task_id)
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&mut *conn)
        .await?;
        Ok(occurrences)
    }

    async fn set_occurrence_completed(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        occurrence_id: Uuid,
        completed: bool,
    ) -> Result<Occurrence, CoreError> {
        let now = Utc::now();
        let completed_at = completed.then_some(now);
        let mut conn = self.pool().acquire().await?;

        let result = sqlx::query(
            r#"UPDATE task_occurrences SET completed_at = $1, updated_at = $2
            WHERE id = $3 AND task_id = $4 AND user_id = $5
              AND EXISTS (
                SELECT 1 FROM tasks t
                WHERE t.id = $4 AND t.user_id = $5 AND t.deleted_at IS NULL
              )"#,
        )
        .bind(completed_at)
        .bind(now)
        .bind(occurrence_id)
        .bind(task_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("occurrence {}", occurrence_id)));
        }

        let occurrence: Occurrence = sqlx::query_as("SELECT * FROM task_occurrences WHERE id = $1")
            .bind(occurrence_id)
            .fetch_one(&mut *conn)
            .await?;

        info!(%task_id, %occurrence_id, completed, "occurrence completion set");
        Ok(occurrence)
    }

    async fn find_occurrences_by_short_id_prefix(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        short_id: &str,
    ) -> Result<Vec<Occurrence>, CoreError> {
        let Some(pattern) = short_id_pattern(short_id) else {
            return Ok(Vec::new());
        };

        let occurrences = sqlx::query_as(
            r#"SELECT * FROM task_occurrences
            WHERE user_id = $1 AND task_id = $2 AND lower(hex(id)) LIKE $3
            ORDER BY due_at ASC"#,
        )
        .bind(user_id)
        .bind(task_id)
        .bind(pattern)
        .fetch_all(self.pool())
        .await?;
        Ok(occurrences)
    }
}

impl SqliteRepository {
    /// Loads a task owned by `user_id` that is not soft-deleted.
    pub(crate) async fn find_visible_task(
        conn: &mut SqliteConnection,
        user_id: Uuid,
        task_id: Uuid,
    ) -> Result<Option<Task>, CoreError> {
        let task = sqlx::query_as(
            "SELECT * FROM tasks WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
        )
        .bind(task_id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(task)
    }

    /// Inserts one occurrence unless the (task, due) pair already exists.
    /// Returns whether a row was created.
    pub(crate) async fn insert_occurrence_if_absent(
        conn: &mut SqliteConnection,
        task: &Task,
        due_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<bool, CoreError> {
        let result = sqlx::query(
            r#"INSERT INTO task_occurrences (id, user_id, task_id, due_at, completed_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NULL, $5, $5)
            ON CONFLICT (task_id, due_at) DO NOTHING"#,
        )
        .bind(Uuid::now_v7())
        .bind(task.user_id)
        .bind(task.id)
        .bind(due_at)
        .bind(now)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Inserts every date of `rule` from `first` through `horizon`.
    async fn fill_schedule(
        conn: &mut SqliteConnection,
        task: &Task,
        rule: &RecurrenceRule,
        first: DateTime<Utc>,
        horizon: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<usize, CoreError> {
        let mut created = 0;
        for due_at in rule.schedule(first, horizon) {
            if Self::insert_occurrence_if_absent(conn, task, due_at, now).await? {
                created += 1;
            }
        }
        Ok(created)
    }

    /// Latest existing occurrence at or after `anchor`.
    async fn latest_occurrence_since(
        conn: &mut SqliteConnection,
        task_id: Uuid,
        anchor: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, CoreError> {
        let latest: Option<DateTime<Utc>> = sqlx::query_scalar(
            "SELECT MAX(due_at) FROM task_occurrences WHERE task_id = $1 AND due_at >= $2",
        )
        .bind(task_id)
        .bind(anchor)
        .fetch_one(&mut *conn)
        .await?;
        Ok(latest)
    }

    /// Core of `ensure_occurrences_up_to`, usable inside a caller's
    /// transaction.
    ///
    /// Rows before the anchor are ignored so a moved anchor restarts the
    /// series. Stepping resumes on the anchor's grid just past the latest
    /// row, and every insert is conflict-tolerant, so concurrent callers
    /// converge on the same row set.
    pub(crate) async fn generate_occurrences(
        conn: &mut SqliteConnection,
        task: &Task,
        horizon: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<MaterializationSummary, CoreError> {
        let Some(rule) = task.recurrence_rule()? else {
            return Ok(MaterializationSummary::default());
        };
        let anchor = task.recurrence_start_at.unwrap_or(now);

        let latest = Self::latest_occurrence_since(conn, task.id, anchor).await?;
        let first = match latest {
            None => Some(anchor),
            Some(latest) => rule.first_after(anchor, latest),
        };

        let occurrences_created = match first {
            Some(first) => Self::fill_schedule(conn, task, &rule, first, horizon, now).await?,
            None => 0,
        };

        // Rows before the anchor belong to an earlier series.
        let next_due_at = match Self::refresh_next_due(conn, task.id, anchor.max(now)).await {
            Ok(next_due_at) => next_due_at,
            Err(e) => {
                warn!(task_id = %task.id, error = %e, "next-due refresh failed");
                None
            }
        };

        debug!(
            task_id = %task.id,
            %horizon,
            occurrences_created,
            ?next_due_at,
            "occurrences ensured"
        );

        Ok(MaterializationSummary {
            occurrences_created,
            next_due_at,
        })
    }

    /// Recomputes the next-due cache: earliest incomplete occurrence at or
    /// after `since`.
    pub(crate) async fn refresh_next_due(
        conn: &mut SqliteConnection,
        task_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, CoreError> {
        let next_due_at: Option<DateTime<Utc>> = sqlx::query_scalar(
            r#"SELECT MIN(due_at) FROM task_occurrences
            WHERE task_id = $1 AND completed_at IS NULL AND due_at >= $2"#,
        )
        .bind(task_id)
        .bind(since)
        .fetch_one(&mut *conn)
        .await?;

        sqlx::query("UPDATE tasks SET next_due_at = $1 WHERE id = $2")
            .bind(next_due_at)
            .bind(task_id)
            .execute(&mut *conn)
            .await?;

        Ok(next_due_at)
    }

    /// Lays a recurring task's series onto `anchor` and `rule`. Used when the
    /// anchor moves, when the rule changes and when a task is promoted.
    ///
    /// Uncompleted rows at or after the anchor are discarded. Completed rows
    /// are kept as history, and the new series is filled from the anchor up
    /// to the latest of them so no gap is left before generation resumes.
    pub(crate) async fn reschedule_occurrences(
        conn: &mut SqliteConnection,
        task: &Task,
        rule: &RecurrenceRule,
        anchor: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<usize, CoreError> {
        let purged = sqlx::query(
            r#"DELETE FROM task_occurrences
            WHERE task_id = $1 AND completed_at IS NULL AND due_at >= $2"#,
        )
        .bind(task.id)
        .bind(anchor)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        let fill_until = Self::latest_occurrence_since(conn, task.id, anchor)
            .await?
            .unwrap_or(anchor);
        let created = Self::fill_schedule(conn, task, rule, anchor, fill_until, now).await?;

        info!(
            task_id = %task.id,
            %anchor,
            purged,
            created,
            "recurring task rescheduled"
        );
        Ok(created)
    }
}
