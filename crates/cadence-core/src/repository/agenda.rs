use crate::error::CoreError;
use crate::models::{AgendaItem, Task};
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

#[async_trait]
impl super::AgendaRepository for SqliteRepository {
    async fn agenda(
        &self,
        user_id: Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<AgendaItem>, CoreError> {
        let now = Utc::now();
        let (from, to) = self.materialization_manager().agenda_window(from, to, now)?;
        let mut conn = self.pool().acquire().await?;

        let recurring: Vec<Task> = sqlx::query_as(
            r#"SELECT * FROM tasks
            WHERE user_id = $1 AND deleted_at IS NULL AND repeat_every IS NOT NULL"#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        for task in &recurring {
            match Self::generate_occurrences(&mut conn, task, to, now).await {
                Ok(_) => {}
                // One corrupt rule should not hide everything else.
                Err(CoreError::InvalidRecurrenceRule(reason)) => {
                    warn!(task_id = %task.id, %reason, "skipping task with invalid recurrence rule");
                }
                Err(e) => return Err(e),
            }
        }

        let items: Vec<AgendaItem> = sqlx::query_as(
            r#"SELECT 'task' AS kind, t.id AS task_id, NULL AS occurrence_id,
                   t.project_id AS project_id, t.title AS title, t.due_at AS due_at
            FROM tasks t
            WHERE t.user_id = $1 AND t.deleted_at IS NULL
              AND t.repeat_every IS NULL AND t.completed_at IS NULL
              AND t.due_at IS NOT NULL AND t.due_at >= $2 AND t.due_at <= $3
            UNION ALL
            SELECT 'occurrence' AS kind, o.task_id AS task_id, o.id AS occurrence_id,
                   t.project_id AS project_id, t.title AS title, o.due_at AS due_at
            FROM task_occurrences o
            JOIN tasks t ON t.id = o.task_id
            WHERE o.user_id = $1 AND t.user_id = $1 AND t.deleted_at IS NULL
              AND t.repeat_every IS NOT NULL AND o.completed_at IS NULL
              AND o.due_at >= $2 AND o.due_at <= $3
            ORDER BY due_at ASC, task_id ASC, occurrence_id ASC"#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&mut *conn)
        .await?;

        debug!(%user_id, %from, %to, items = items.len(), "agenda built");
        Ok(items)
    }
}
