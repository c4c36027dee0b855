use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{
    AgendaItem, MaterializationSummary, NewTaskData, Occurrence, Task, UpdateTaskData,
};
use crate::recurrence::MaterializationManager;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod agenda;
pub mod occurrences;
pub mod tasks;

// Every operation is scoped by the calling user. Rows owned by someone else
// are reported exactly like missing or soft-deleted ones.

/// Task lifecycle operations.
#[async_trait]
pub trait TaskRepository {
    async fn add_task(&self, user_id: Uuid, data: NewTaskData) -> Result<Task, CoreError>;
    /// Plain read, no generation.
    async fn find_task(&self, user_id: Uuid, id: Uuid) -> Result<Option<Task>, CoreError>;
    /// Read that first refreshes a recurring task's occurrences and next-due
    /// cache, best-effort.
    async fn get_task(&self, user_id: Uuid, id: Uuid) -> Result<Task, CoreError>;
    async fn find_tasks_by_short_id_prefix(
        &self,
        user_id: Uuid,
        short_id: &str,
    ) -> Result<Vec<Task>, CoreError>;
    async fn list_tasks(
        &self,
        user_id: Uuid,
        project_id: Option<Uuid>,
    ) -> Result<Vec<Task>, CoreError>;
    async fn update_task(
        &self,
        user_id: Uuid,
        id: Uuid,
        data: UpdateTaskData,
    ) -> Result<Task, CoreError>;
    /// Soft delete.
    async fn delete_task(&self, user_id: Uuid, id: Uuid) -> Result<(), CoreError>;
}

/// Occurrence generation and access.
#[async_trait]
pub trait OccurrenceRepository {
    /// Guarantees an occurrence row for every scheduled date from the anchor
    /// through `horizon`, inclusive, then refreshes the next-due cache.
    async fn ensure_occurrences_up_to(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        horizon: DateTime<Utc>,
    ) -> Result<MaterializationSummary, CoreError>;
    /// Occurrences due in `[from, to]`, ordered by due date then id. Does not
    /// generate.
    async fn list_occurrences(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Occurrence>, CoreError>;
    async fn set_occurrence_completed(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        occurrence_id: Uuid,
        completed: bool,
    ) -> Result<Occurrence, CoreError>;
    async fn find_occurrences_by_short_id_prefix(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        short_id: &str,
    ) -> Result<Vec<Occurrence>, CoreError>;
}

/// Combined view of everything due in a window.
#[async_trait]
pub trait AgendaRepository {
    /// Missing bounds take the configured defaults.
    async fn agenda(
        &self,
        user_id: Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<AgendaItem>, CoreError>;
}

/// Main repository trait that composes all domain traits
pub trait Repository: TaskRepository + OccurrenceRepository + AgendaRepository {}

/// SQLite implementation of the repository pattern
pub struct SqliteRepository {
    pool: DbPool,
    materialization_manager: MaterializationManager,
}

impl SqliteRepository {
    pub fn new(pool: DbPool, materialization_manager: MaterializationManager) -> Self {
        Self {
            pool,
            materialization_manager,
        }
    }

    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub(crate) fn materialization_manager(&self) -> &MaterializationManager {
        &self.materialization_manager
    }
}

impl Repository for SqliteRepository {}

/// Turns a user-typed id prefix into a `LIKE` pattern over `lower(hex(id))`.
/// `None` when the prefix cannot match any id.
pub(crate) fn short_id_pattern(short_id: &str) -> Option<String> {
    let hex: String = short_id
        .chars()
        .filter(|c| *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if hex.is_empty() || hex.len() > 32 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(format!("{}%", hex))
}
