use std::fs::{OpenOptions, create_dir_all};
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use serde::Serialize;

use gdbcheck_core::RedactedConnection;

use super::{ArtifactError, ArtifactResult};

/// Where the schema registry of a run came from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "path")]
pub enum RegistrySource {
    Builtin,
    File(PathBuf),
}

/// Serializable options for runs.
#[derive(Debug, Clone, Serialize)]
pub struct RunOptions {
    pub table_schema: String,
    pub datasets: Option<Vec<String>>,
    pub scan_timeout_secs: u64,
    pub hierarchy_key_width: Option<usize>,
}

/// Metadata captured at run start.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub engine: String,
    pub registry: String,
    pub registry_source: RegistrySource,
    pub report_version: String,
    pub run_dir: PathBuf,
    pub options: RunOptions,
    pub connection: RedactedConnection,
}

/// JSON config written to each run directory.
#[derive(Debug, Serialize)]
pub struct RunConfig {
    pub run_id: String,
    pub started_at: String,
    pub engine: String,
    pub registry: String,
    pub registry_source: RegistrySource,
    pub report_version: String,
    pub options: RunOptions,
    pub connection: RedactedConnection,
    pub git: GitInfo,
}

/// Git metadata for reproducibility.
#[derive(Debug, Serialize)]
pub struct GitInfo {
    pub commit: Option<String>,
    pub dirty: Option<bool>,
}

/// Paths for run artifacts.
#[derive(Debug, Clone)]
pub struct RunPaths {
    pub root: PathBuf,
    pub config_path: PathBuf,
    pub logs_path: PathBuf,
}

/// Create `<run_dir>/<timestamp>__run_<id>/` with its `config.json` and an
/// empty `logs.ndjson`.
pub fn start_run(ctx: &RunContext) -> ArtifactResult<RunPaths> {
    let timestamp = ctx.started_at.format("%Y-%m-%dT%H-%M-%SZ").to_string();
    let root = ctx.run_dir.join(format!("{timestamp}__run_{}", ctx.run_id));

    create_dir_all(&root)?;

    let config_path = root.join("config.json");
    let logs_path = root.join("logs.ndjson");

    let config = RunConfig {
        run_id: ctx.run_id.clone(),
        started_at: ctx.started_at.to_rfc3339(),
        engine: ctx.engine.clone(),
        registry: ctx.registry.clone(),
        registry_source: ctx.registry_source.clone(),
        report_version: ctx.report_version.clone(),
        options: ctx.options.clone(),
        connection: ctx.connection.clone(),
        git: collect_git_info(),
    };

    write_json(&config_path, &config)?;

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&logs_path)?;

    Ok(RunPaths {
        root,
        config_path,
        logs_path,
    })
}

pub fn collect_git_info() -> GitInfo {
    let commit = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
            } else {
                None
            }
        })
        .filter(|value| !value.is_empty());

    let dirty = Command::new("git")
        .args(["status", "--porcelain"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| !output.stdout.is_empty());

    GitInfo { commit, dirty }
}

/// Write pretty JSON, creating parent directories as needed.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> ArtifactResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    serde_json::to_writer_pretty(file, value).map_err(ArtifactError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdbcheck_core::redact_connection_string;

    #[test]
    fn run_directory_holds_redacted_config() {
        let run_dir = std::env::temp_dir().join(format!("gdbcheck-run-{}", std::process::id()));
        let ctx = RunContext {
            run_id: "abc".to_string(),
            started_at: DateTime::parse_from_rfc3339("2024-05-01T10:20:30Z")
                .unwrap()
                .with_timezone(&Utc),
            engine: "postgres".to_string(),
            registry: "NCGMP09 v1.1".to_string(),
            registry_source: RegistrySource::Builtin,
            report_version: "0.1".to_string(),
            run_dir: run_dir.clone(),
            options: RunOptions {
                table_schema: "public".to_string(),
                datasets: None,
                scan_timeout_secs: 300,
                hierarchy_key_width: None,
            },
            connection: redact_connection_string("postgres://geo:hunter2@db:5432/quad"),
        };

        let paths = start_run(&ctx).unwrap();
        assert!(paths.root.ends_with("2024-05-01T10-20-30Z__run_abc"));
        assert!(paths.logs_path.exists());

        let config = std::fs::read_to_string(&paths.config_path).unwrap();
        assert!(!config.contains("hunter2"));
        assert!(config.contains("\"kind\": \"builtin\""));

        std::fs::remove_dir_all(&run_dir).unwrap();
    }
}
