//! Core contracts for gdbcheck.
//!
//! This crate defines the schema registry, the store inventory model, the
//! built-in NCGMP09 definition, and helpers shared across store adapters,
//! the validation engine, and the CLI.

pub mod definition;
pub mod error;
pub mod inventory;
pub mod redaction;
pub mod registry;
pub mod types;
pub mod validation;

pub use definition::ncgmp09_registry;
pub use error::{Error, Result};
pub use inventory::{EntityHandle, ListingFailure, LiveEntity, LiveField, StoreInventory};
pub use redaction::{RedactedConnection, redact_connection_string};
pub use registry::{
    Conventions, DatasetMatch, DatasetSpec, EntitySpec, FieldRole, FieldSpec, MapUnitCategory,
    Requirement, Resolution, SchemaRegistry,
};
pub use types::{EntityKind, FieldType, FieldValue, Nullability, Row};
pub use validation::{load_registry, load_registry_str, registry_json_schema, validate_registry};

/// Contract version of `report.json` artifacts.
pub const REPORT_VERSION: &str = "0.1";
