use crate::error::CoreError;
use crate::models::{NewTaskData, Task, UpdateTaskData};
use crate::recurrence::RecurrenceRule;
use crate::repository::{short_id_pattern, SqliteRepository};
use crate::transition::{TaskPatch, Transition};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::{info, warn};
use uuid::Uuid;

#[async_trait]
impl super::TaskRepository for SqliteRepository {
    async fn add_task(&self, user_id: Uuid, data: NewTaskData) -> Result<Task, CoreError> {
        if data.title.trim().is_empty() {
            return Err(CoreError::Validation("title cannot be empty".to_string()));
        }
        let rule = RecurrenceRule::from_input(data.repeat_every, data.repeat_unit.as_deref())?;
        if rule.is_some() && data.due_at.is_none() {
            return Err(CoreError::Validation(
                "due_at is required for recurring tasks".to_string(),
            ));
        }

        let now = Utc::now();
        let id = Uuid::now_v7();
        let mut tx = self.pool().begin().await?;

        let patch = match &rule {
            Some(rule) => {
                let (every, unit) = rule.to_columns();
                TaskPatch {
                    title: data.title,
                    description: data.description,
                    due_at: None,
                    completed_at: None,
                    repeat_every: Some(every),
                    repeat_unit: Some(unit),
                    recurrence_start_at: data.due_at,
                    next_due_at: data.due_at,
                }
            }
            None => TaskPatch {
                title: data.title,
                description: data.description,
                due_at: data.due_at,
                completed_at: None,
                repeat_every: None,
                repeat_unit: None,
                recurrence_start_at: None,
                next_due_at: None,
            },
        };

        sqlx::query(
            r#"INSERT INTO tasks (
                id, user_id, project_id, title, description, due_at, completed_at, deleted_at,
                repeat_every, repeat_unit, recurrence_start_at, next_due_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, NULL, NULL, $7, $8, $9, $10, $11, $11)"#,
        )
        .bind(id)
        .bind(user_id)
        .bind(data.project_id)
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(patch.due_at)
        .bind(patch.repeat_every)
        .bind(&patch.repeat_unit)
        .bind(patch.recurrence_start_at)
        .bind(patch.next_due_at)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let mut task = Self::find_visible_task(&mut tx, user_id, id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("task {}", id)))?;

        if let Some(anchor) = task.recurrence_start_at {
            Self::insert_occurrence_if_absent(&mut tx, &task, anchor, now).await?;
            let horizon = self.materialization_manager().default_horizon(now);
            Self::generate_occurrences(&mut tx, &task, horizon, now).await?;
            task = Self::find_visible_task(&mut tx, user_id, id)
                .await?
                .ok_or_else(|| CoreError::NotFound(format!("task {}", id)))?;
        }

        tx.commit().await?;
        info!(task_id = %task.id, %user_id, mode = ?task.mode(), "task created");
        Ok(task)
    }

    async fn find_task(&self, user_id: Uuid, id: Uuid) -> Result<Option<Task>, CoreError> {
        let mut conn = self.pool().acquire().await?;
        Self::find_visible_task(&mut conn, user_id, id).await
    }

    async fn get_task(&self, user_id: Uuid, id: Uuid) -> Result<Task, CoreError> {
        let mut conn = self.pool().acquire().await?;
        let task = Self::find_visible_task(&mut conn, user_id, id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("task {}", id)))?;

        if !task.is_recurring() {
            return Ok(task);
        }

        let now = Utc::now();
        self.refresh_best_effort(&mut conn, &task, now).await;
        Self::find_visible_task(&mut conn, user_id, id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("task {}", id)))
    }

    async fn find_tasks_by_short_id_prefix(
        &self,
        user_id: Uuid,
        short_id: &str,
    ) -> Result<Vec<Task>, CoreError> {
        let Some(pattern) = short_id_pattern(short_id) else {
            return Ok(Vec::new());
        };

        let tasks = sqlx::query_as(
            r#"SELECT * FROM tasks
            WHERE user_id = $1 AND deleted_at IS NULL AND lower(hex(id)) LIKE $2
            ORDER BY created_at ASC"#,
        )
        .bind(user_id)
        .bind(pattern)
        .fetch_all(self.pool())
        .await?;
        Ok(tasks)
    }

    async fn list_tasks(
        &self,
        user_id: Uuid,
        project_id: Option<Uuid>,
    ) -> Result<Vec<Task>, CoreError> {
        let mut conn = self.pool().acquire().await?;
        let tasks = Self::select_tasks(&mut conn, user_id, project_id).await?;

        let recurring: Vec<&Task> = tasks.iter().filter(|t| t.is_recurring()).collect();
        if recurring.is_empty() {
            return Ok(tasks);
        }

        let now = Utc::now();
        for task in recurring {
            self.refresh_best_effort(&mut conn, task, now).await;
        }
        Self::select_tasks(&mut conn, user_id, project_id).await
    }

    async fn update_task(
        &self,
        user_id: Uuid,
        id: Uuid,
        data: UpdateTaskData,
    ) -> Result<Task, CoreError> {
        let now = Utc::now();
        let mut tx = self.pool().begin().await?;

        let current = Self::find_visible_task(&mut tx, user_id, id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("task {}", id)))?;

        let transition = Transition::plan(&current, &data)?;
        let patch = transition.patch(&current, &data, now);

        sqlx::query(
            r#"UPDATE tasks SET
                title = $1, description = $2, due_at = $3, completed_at = $4,
                repeat_every = $5, repeat_unit = $6, recurrence_start_at = $7, next_due_at = $8,
                updated_at = $9
            WHERE id = $10 AND user_id = $11"#,
        )
        .bind(&patch.title)
        .bind(&patch.description)
        .bind(patch.due_at)
        .bind(patch.completed_at)
        .bind(patch.repeat_every)
        .bind(&patch.repeat_unit)
        .bind(patch.recurrence_start_at)
        .bind(patch.next_due_at)
        .bind(now)
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let mut task = Self::find_visible_task(&mut tx, user_id, id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("task {}", id)))?;

        match &transition {
            // Rows from an earlier recurring period may sit past the anchor.
            Transition::NormalToRecurring { rule, anchor } => {
                Self::reschedule_occurrences(&mut tx, &task, rule, *anchor, now).await?;
            }
            Transition::RecurringToRecurring { rule, reschedule } => {
                let rule_changed = current.recurrence_rule().ok().flatten() != Some(*rule);
                let anchor = match reschedule {
                    Some(anchor) => Some(*anchor),
                    None if rule_changed => task.recurrence_start_at,
                    None => None,
                };
                if let Some(anchor) = anchor {
                    Self::reschedule_occurrences(&mut tx, &task, rule, anchor, now).await?;
                }
            }
            _ => {}
        }

        if task.is_recurring() {
            let horizon = self.materialization_manager().default_horizon(now);
            Self::generate_occurrences(&mut tx, &task, horizon, now).await?;
            task = Self::find_visible_task(&mut tx, user_id, id)
                .await?
                .ok_or_else(|| CoreError::NotFound(format!("task {}", id)))?;
        }

        tx.commit().await?;

        if transition.from_mode() != transition.to_mode() {
            info!(
                task_id = %id,
                from = ?transition.from_mode(),
                to = ?transition.to_mode(),
                "task mode changed"
            );
        }
        Ok(task)
    }

    async fn delete_task(&self, user_id: Uuid, id: Uuid) -> Result<(), CoreError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"UPDATE tasks SET deleted_at = $1, updated_at = $1
            WHERE id = $2 AND user_id = $3 AND deleted_at IS NULL"#,
        )
        .bind(now)
        .bind(id)
        .bind(user_id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("task {}", id)));
        }
        info!(task_id = %id, "task deleted");
        Ok(())
    }
}

impl SqliteRepository {
    async fn select_tasks(
        conn: &mut SqliteConnection,
        user_id: Uuid,
        project_id: Option<Uuid>,
    ) -> Result<Vec<Task>, CoreError> {
        let tasks = sqlx::query_as(
            r#"SELECT * FROM tasks
            WHERE user_id = $1 AND deleted_at IS NULL AND ($2 IS NULL OR project_id = $2)
            ORDER BY created_at ASC, id ASC"#,
        )
        .bind(user_id)
        .bind(project_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(tasks)
    }

    /// Generates to the default horizon, logging instead of failing.
    async fn refresh_best_effort(
        &self,
        conn: &mut SqliteConnection,
        task: &Task,
        now: DateTime<Utc>,
    ) {
        let horizon = self.materialization_manager().default_horizon(now);
        if let Err(e) = Self::generate_occurrences(conn, task, horizon, now).await {
            warn!(task_id = %task.id, error = %e, "occurrence refresh skipped");
        }
    }
}
