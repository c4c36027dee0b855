//! # Cadence Core Library
//!
//! Task tracking where a recurring task is a template carrying a fixed
//! cadence (every N days, weeks or months) and each concrete instance is a
//! stored occurrence row, created lazily up to a horizon.
//!
//! ## Core Modules
//!
//! - [`db`]: Database connection and migration management
//! - [`models`]: Tasks, occurrences, agenda items and update payloads
//! - [`recurrence`]: Rule stepping and materialization windows
//! - [`transition`]: Normal/recurring transitions applied on update
//! - [`repository`]: Data access layer with Repository pattern
//! - [`deadline`]: Per-operation time limits
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use cadence_core::{
//!     db, models::NewTaskData,
//!     recurrence::MaterializationManager,
//!     repository::{TaskRepository, SqliteRepository},
//! };
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), cadence_core::error::CoreError> {
//!     let pool = db::establish_connection("cadence.db").await?;
//!     let repo = SqliteRepository::new(pool, MaterializationManager::with_defaults());
//!
//!     let user = Uuid::now_v7();
//!     let task = repo
//!         .add_task(user, NewTaskData {
//!             title: "Water plants".to_string(),
//!             due_at: Some(chrono::Utc::now()),
//!             repeat_every: Some(3),
//!             repeat_unit: Some("days".to_string()),
//!             ..Default::default()
//!         })
//!         .await?;
//!     println!("next due: {:?}", task.effective_due_at());
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod deadline;
pub mod error;
pub mod models;
pub mod recurrence;
pub mod repository;
pub mod transition;
