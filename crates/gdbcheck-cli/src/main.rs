mod artifacts;
mod settings;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{ArgGroup, Args, Parser, Subcommand};
use gdbcheck_core::{
    Error as CoreError, REPORT_VERSION, SchemaRegistry, load_registry_str, ncgmp09_registry,
    redact_connection_string, registry_json_schema,
};
use gdbcheck_eval::{EvalError, ValidateOptions, ValidationEngine, render_report, write_artifacts};
use gdbcheck_introspect::{MemoryStore, PostgresOptions, PostgresStore, Store};
use thiserror::Error;
use uuid::Uuid;

use artifacts::{
    RegistrySource, RunContext, RunOptions, init_run_logging, start_run, write_json,
};
use settings::{SettingsError, load_settings};

#[derive(Debug, Error)]
enum CliError {
    #[error("artifact error: {0}")]
    Artifacts(#[from] artifacts::ArtifactError),
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("validation error: {0}")]
    Eval(#[from] EvalError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("unsupported engine: {0}")]
    UnsupportedEngine(String),
}

/// Store selected on the command line.
enum StoreSource {
    Postgres(String),
    Fixture(PathBuf),
}

impl StoreSource {
    fn engine(&self) -> &'static str {
        match self {
            StoreSource::Postgres(_) => "postgres",
            StoreSource::Fixture(_) => "memory",
        }
    }

    fn locator(&self) -> String {
        match self {
            StoreSource::Postgres(conn) => conn.clone(),
            StoreSource::Fixture(path) => path.display().to_string(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "gdbcheck",
    version,
    about = "Geodatabase schema conformance and referential integrity checks"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a store and write a conformance report.
    Validate(ValidateArgs),
    /// Print or save the built-in NCGMP09 registry as JSON.
    Registry(RegistryArgs),
    /// Print the JSON Schema of registry documents.
    RegistrySchema,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["conn", "fixture"])))]
struct ValidateArgs {
    /// PostgreSQL connection string.
    #[arg(long, value_name = "CONNECTION_STRING")]
    conn: Option<String>,
    /// JSON fixture describing an in-memory store.
    #[arg(long, value_name = "PATH")]
    fixture: Option<PathBuf>,
    /// Registry document to validate against instead of the built-in NCGMP09 registry.
    #[arg(long, value_name = "PATH")]
    registry: Option<PathBuf>,
    /// Settings file (defaults to ./gdbcheck.toml when present).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Output directory for runs.
    #[arg(long)]
    run_dir: Option<PathBuf>,
    /// Extra copy of the text report.
    #[arg(long)]
    out: Option<PathBuf>,
    /// PostgreSQL schema holding standalone tables.
    #[arg(long)]
    table_schema: Option<String>,
    /// Deadline in seconds for scanning one table or feature class.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    scan_timeout_secs: Option<u64>,
    /// Segment width of hierarchy keys.
    #[arg(long)]
    hierarchy_key_width: Option<usize>,
}

#[derive(Args, Debug)]
struct RegistryArgs {
    /// Write to this path instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Validate(args) => run_validate(args).await,
        Command::Registry(args) => run_registry(args),
        Command::RegistrySchema => {
            println!("{}", serde_json::to_string_pretty(&registry_json_schema()?)?);
            Ok(())
        }
    }
}

async fn run_validate(args: ValidateArgs) -> Result<(), CliError> {
    let settings = load_settings(args.config.as_deref())?;

    let (registry, registry_source) = match &args.registry {
        Some(path) => (
            load_registry_str(&std::fs::read_to_string(path)?)?,
            RegistrySource::File(path.clone()),
        ),
        None => (ncgmp09_registry(), RegistrySource::Builtin),
    };

    let source = match (args.conn, args.fixture) {
        (Some(conn), None) => {
            detect_engine(&conn)?;
            StoreSource::Postgres(conn)
        }
        (None, Some(path)) => StoreSource::Fixture(path),
        _ => {
            return Err(CliError::InvalidConfig(
                "use exactly one of --conn or --fixture".to_string(),
            ));
        }
    };
    let engine = source.engine();

    let options = RunOptions {
        table_schema: args.table_schema.unwrap_or(settings.table_schema),
        datasets: settings.datasets,
        scan_timeout_secs: args.scan_timeout_secs.unwrap_or(settings.scan_timeout_secs),
        hierarchy_key_width: args.hierarchy_key_width.or(settings.hierarchy_key_width),
    };

    let run_id = Uuid::new_v4().to_string();
    let run_ctx = RunContext {
        run_id: run_id.clone(),
        started_at: chrono::Utc::now(),
        engine: engine.to_string(),
        registry: registry.display_name(),
        registry_source,
        report_version: REPORT_VERSION.to_string(),
        run_dir: args.run_dir.unwrap_or(settings.run_dir),
        options: options.clone(),
        connection: redact_connection_string(&source.locator()),
    };

    let run_paths = start_run(&run_ctx)?;
    init_run_logging(&run_paths.logs_path)?;

    tracing::info!(event = "run_started", run_id = %run_id, engine = %engine);
    let timer = Instant::now();

    let store: Box<dyn Store> = match &source {
        StoreSource::Fixture(path) => Box::new(MemoryStore::from_path(path)?),
        StoreSource::Postgres(conn) => {
            let pg_options = PostgresOptions {
                table_schema: options.table_schema.clone(),
                datasets: options.datasets.clone(),
                page_size: settings.page_size,
            };
            Box::new(PostgresStore::connect(conn, pg_options).await?)
        }
    };

    let validator = ValidationEngine::new(ValidateOptions {
        scan_timeout: Duration::from_secs(options.scan_timeout_secs),
        hierarchy_key_width: options.hierarchy_key_width,
    });
    let report = validator.run(store.as_ref(), &registry).await?;

    let paths = write_artifacts(&run_paths.root, &report)?;
    tracing::info!(event = "report_written", path = %paths.report_text.display());

    if let Some(out) = args.out.as_deref() {
        write_text(out, &render_report(&report))?;
        tracing::info!(event = "report_copied", path = %out.display());
    }

    let duration_ms = timer.elapsed().as_millis();
    tracing::info!(
        event = "run_finished",
        status = "success",
        findings = report.finding_count(),
        duration_ms = duration_ms
    );

    println!("report_path={}", paths.report_text.display());
    println!("findings={}", report.finding_count());
    Ok(())
}

fn run_registry(args: RegistryArgs) -> Result<(), CliError> {
    let registry: SchemaRegistry = ncgmp09_registry();
    match args.out {
        Some(path) => write_json(&path, &registry)?,
        None => println!("{}", serde_json::to_string_pretty(&registry)?),
    }
    Ok(())
}

fn write_text(path: &Path, text: &str) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, text)?;
    Ok(())
}

fn detect_engine(conn: &str) -> Result<&'static str, CliError> {
    if conn.starts_with("postgres://") || conn.starts_with("postgresql://") {
        Ok("postgres")
    } else {
        Err(CliError::UnsupportedEngine(conn.to_string()))
    }
}
