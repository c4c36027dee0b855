use cadence_core::recurrence::MaterializationManager;
use uuid::Uuid;

use crate::config::Config;

pub mod add;
pub mod agenda;
pub mod delete;
pub mod edit;
pub mod list;
pub mod occurrences;
pub mod show;

/// Per-invocation settings shared by every command.
pub struct Context {
    pub user_id: Uuid,
    pub default_project: Option<Uuid>,
    /// Same windows the repository uses, for the defaults the CLI fills in
    /// itself.
    pub materialization: MaterializationManager,
}

impl Context {
    pub fn from_config(config: &Config) -> Self {
        Self {
            user_id: config.user_id,
            default_project: config.default_project,
            materialization: MaterializationManager::new(config.materialization()),
        }
    }
}
