//! Conformance checking, cross-reference indexing, integrity analyzers and
//! report assembly.

pub mod analyzers;
pub mod conformance;
pub mod engine;
pub mod errors;
pub mod indexer;
pub mod model;
pub mod report;

pub use conformance::{SchemaFindings, check_conformance};
pub use engine::{ArtifactPaths, ValidationEngine, validate, write_artifacts};
pub use errors::EvalError;
pub use indexer::{Indices, build_indices};
pub use model::{
    ConformanceReport, ContentGroup, ContentLine, EntityDescription, FieldDescription, GroupKind,
    ValidateOptions,
};
pub use report::{aggregate, render_report};
