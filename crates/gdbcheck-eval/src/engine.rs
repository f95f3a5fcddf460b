use std::path::{Path, PathBuf};
use std::time::Instant;

use gdbcheck_core::SchemaRegistry;
use gdbcheck_introspect::{Store, build_inventory};

use crate::analyzers::{AnalysisContext, run_all};
use crate::conformance::check_conformance;
use crate::errors::EvalError;
use crate::indexer::build_indices;
use crate::model::{ConformanceReport, ValidateOptions};
use crate::report::{aggregate, render_report};

/// Validate a store against a schema registry.
#[derive(Debug, Clone, Default)]
pub struct ValidationEngine {
    options: ValidateOptions,
}

impl ValidationEngine {
    pub fn new(options: ValidateOptions) -> Self {
        Self { options }
    }

    /// Run every stage and return the report.
    ///
    /// Only a failure to enumerate the store is fatal. Per-entity read
    /// failures and structurally absent fields become report content.
    pub async fn run(
        &self,
        store: &dyn Store,
        registry: &SchemaRegistry,
    ) -> Result<ConformanceReport, EvalError> {
        let started = Instant::now();
        tracing::info!(
            event = "validation_started",
            engine = store.engine(),
            store = store.name(),
            registry = %registry.display_name()
        );

        let inventory = build_inventory(store).await?;
        let schema = check_conformance(registry, &inventory);
        let indices =
            build_indices(store, &inventory, registry, self.options.scan_timeout).await;

        let ctx = AnalysisContext {
            registry,
            inventory: &inventory,
            indices: &indices,
            hierarchy_key_width: self.options.hierarchy_key_width,
        };
        let groups = run_all(&ctx);
        let report = aggregate(registry, &inventory, schema, groups);

        tracing::info!(
            event = "validation_finished",
            findings = report.finding_count(),
            unreadable = indices.failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64
        );
        Ok(report)
    }
}

/// Validate with default options.
pub async fn validate(
    store: &dyn Store,
    registry: &SchemaRegistry,
) -> Result<ConformanceReport, EvalError> {
    ValidationEngine::default().run(store, registry).await
}

/// Files written by [`write_artifacts`].
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub report_json: PathBuf,
    pub report_text: PathBuf,
}

/// Write `report.json` and `conformance.txt` into `out_dir`.
pub fn write_artifacts(
    out_dir: &Path,
    report: &ConformanceReport,
) -> Result<ArtifactPaths, EvalError> {
    std::fs::create_dir_all(out_dir)?;

    let report_json = out_dir.join("report.json");
    std::fs::write(&report_json, serde_json::to_vec_pretty(report)?)?;

    let report_text = out_dir.join("conformance.txt");
    std::fs::write(&report_text, render_report(report).as_bytes())?;

    Ok(ArtifactPaths {
        report_json,
        report_text,
    })
}
