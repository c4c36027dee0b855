#![allow(dead_code)]

use assert_cmd::Command;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test harness for running CLI commands against a temporary database
pub struct CliTestHarness {
    temp_dir: TempDir,
    db_path: PathBuf,
}

impl CliTestHarness {
    /// Create a new test harness with a temporary database
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");

        Self { temp_dir, db_path }
    }

    /// Get a Command instance configured for testing. The working directory
    /// is the temp dir, so only a `cadence.toml` written there is picked up.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("cadence").expect("Failed to find cadence binary");
        cmd.current_dir(self.temp_dir.path())
            .env_remove("CADENCE_CONFIG")
            .env_remove("CADENCE_USER_ID")
            .env_remove("CADENCE_DEFAULT_PROJECT")
            .env_remove("CADENCE_LOG")
            .env("CADENCE_DATABASE_PATH", &self.db_path);
        cmd
    }

    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Helper to run a command and assert success
    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    /// Helper to run a command and assert failure
    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }

    /// Runs a `--json` command and parses its stdout.
    pub fn run_json(&self, args: &[&str]) -> Value {
        let output = self.run_success(args).get_output().stdout.clone();
        serde_json::from_slice(&output).expect("command did not print valid JSON")
    }

    /// ID of the only task with `title`.
    pub fn task_id(&self, title: &str) -> String {
        let tasks = self.run_json(&["list", "--json"]);
        let matches: Vec<&Value> = tasks
            .as_array()
            .expect("task list is not an array")
            .iter()
            .filter(|t| t["title"] == title)
            .collect();
        assert_eq!(matches.len(), 1, "expected exactly one task titled {}", title);
        matches[0]["id"].as_str().unwrap().to_string()
    }

    /// Occurrences of a task inside an explicit window.
    pub fn occurrences(&self, task_id: &str, from: &str, to: &str) -> Vec<Value> {
        self.run_json(&["occurrences", "list", task_id, "--from", from, "--to", to, "--json"])
            .as_array()
            .expect("occurrence list is not an array")
            .clone()
    }
}

/// Utility functions for test assertions
pub mod assertions {
    use predicates::prelude::*;

    /// Predicate to check if output indicates successful task creation
    pub fn task_created_successfully() -> impl Predicate<str> {
        predicate::str::contains("✓").and(
            predicate::str::contains("Created task")
                .or(predicate::str::contains("Created recurring task")),
        )
    }

    /// Predicate to check for error messages
    pub fn has_error() -> impl Predicate<str> {
        predicate::str::contains("Error").or(predicate::str::contains("error"))
    }
}
