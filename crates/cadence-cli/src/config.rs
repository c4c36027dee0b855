use cadence_core::recurrence::MaterializationConfig;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

/// Settings layered from `cadence.toml` (or `$CADENCE_CONFIG`) and
/// `CADENCE_*` environment variables. Nested keys use `__`, e.g.
/// `CADENCE_RECURRENCE__LOOKAHEAD_DAYS=30`.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub database_path: String,
    /// Owner of every task this CLI touches
    pub user_id: Uuid,
    /// Project for new tasks when `--project` is not given
    pub default_project: Option<Uuid>,
    pub recurrence: RecurrenceSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "cadence.db".to_string(),
            user_id: Uuid::nil(),
            default_project: None,
            recurrence: RecurrenceSettings::default(),
        }
    }
}

/// The `[recurrence]` table.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct RecurrenceSettings {
    pub lookahead_days: u32,
    pub occurrence_lookback_days: u32,
    pub occurrence_lookahead_days: u32,
    pub agenda_lookback_days: u32,
    pub agenda_lookahead_days: u32,
    pub agenda_max_span_days: u32,
    pub operation_timeout_secs: u64,
}

impl Default for RecurrenceSettings {
    fn default() -> Self {
        let core = MaterializationConfig::default();
        Self {
            lookahead_days: core.lookahead_days,
            occurrence_lookback_days: core.occurrence_lookback_days,
            occurrence_lookahead_days: core.occurrence_lookahead_days,
            agenda_lookback_days: core.agenda_lookback_days,
            agenda_lookahead_days: core.agenda_lookahead_days,
            agenda_max_span_days: core.agenda_max_span_days,
            operation_timeout_secs: core.operation_timeout.as_secs(),
        }
    }
}

impl From<&RecurrenceSettings> for MaterializationConfig {
    fn from(settings: &RecurrenceSettings) -> Self {
        MaterializationConfig {
            lookahead_days: settings.lookahead_days,
            occurrence_lookback_days: settings.occurrence_lookback_days,
            occurrence_lookahead_days: settings.occurrence_lookahead_days,
            agenda_lookback_days: settings.agenda_lookback_days,
            agenda_lookahead_days: settings.agenda_lookahead_days,
            agenda_max_span_days: settings.agenda_max_span_days,
            operation_timeout: Duration::from_secs(settings.operation_timeout_secs.max(1)),
        }
    }
}

impl Config {
    pub fn new() -> Result<Self, figment::Error> {
        Self::from_figment(Self::figment())
    }

    pub fn figment() -> Figment {
        Figment::new()
            .merge(Toml::file(Env::var_or("CADENCE_CONFIG", "cadence.toml")))
            .merge(Env::prefixed("CADENCE_").split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, figment::Error> {
        figment.extract()
    }

    pub fn materialization(&self) -> MaterializationConfig {
        MaterializationConfig::from(&self.recurrence)
    }

    pub fn operation_timeout(&self) -> Duration {
        self.materialization().operation_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = Config::from_figment(Figment::new()).unwrap();
        assert_eq!(config.database_path, "cadence.db");
        assert_eq!(config.user_id, Uuid::nil());
        assert_eq!(config.default_project, None);
        assert_eq!(config.materialization().lookahead_days, 60);
        assert_eq!(config.operation_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_toml_overrides() {
        let toml = r#"
            database_path = "/tmp/tasks.db"
            user_id = "0190c3a2-7d4e-7b1a-9f00-123456789abc"

            [recurrence]
            lookahead_days = 14
            agenda_max_span_days = 30
            operation_timeout_secs = 3
        "#;
        let config = Config::from_figment(Figment::new().merge(Toml::string(toml))).unwrap();
        assert_eq!(config.database_path, "/tmp/tasks.db");
        assert_eq!(
            config.user_id,
            "0190c3a2-7d4e-7b1a-9f00-123456789abc".parse::<Uuid>().unwrap()
        );

        let core = config.materialization();
        assert_eq!(core.lookahead_days, 14);
        assert_eq!(core.agenda_max_span_days, 30);
        assert_eq!(core.agenda_lookahead_days, 7);
        assert_eq!(core.operation_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let toml = "[recurrence]\noperation_timeout_secs = 0\n";
        let config = Config::from_figment(Figment::new().merge(Toml::string(toml))).unwrap();
        assert_eq!(config.operation_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_bad_value_is_an_error() {
        let toml = "user_id = \"not-a-uuid\"\n";
        assert!(Config::from_figment(Figment::new().merge(Toml::string(toml))).is_err());
    }
}
