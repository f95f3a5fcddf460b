use std::collections::BTreeSet;

use jsonschema::JSONSchema;
use schemars::schema_for;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::registry::SchemaRegistry;
use crate::types::FieldType;

/// JSON Schema describing registry documents.
pub fn registry_json_schema() -> Result<Value> {
    serde_json::to_value(schema_for!(SchemaRegistry))
        .map_err(|err| Error::Other(format!("serialize registry schema: {err}")))
}

/// Load a registry from a JSON document.
///
/// The document is checked structurally against [`registry_json_schema`],
/// then deserialized, then checked with [`validate_registry`].
pub fn load_registry(document: &Value) -> Result<SchemaRegistry> {
    let schema = registry_json_schema()?;
    let compiled = JSONSchema::compile(&schema)
        .map_err(|err| Error::InvalidRegistry(format!("registry schema: {err}")))?;

    if let Err(errors) = compiled.validate(document) {
        let messages: Vec<String> = errors
            .map(|error| {
                let path = error.instance_path.to_string();
                let path = if path.is_empty() { "/".to_string() } else { path };
                format!("{path}: {error}")
            })
            .collect();
        return Err(Error::InvalidRegistry(messages.join("; ")));
    }

    let registry: SchemaRegistry = serde_json::from_value(document.clone())
        .map_err(|err| Error::InvalidRegistry(err.to_string()))?;
    validate_registry(&registry)?;
    Ok(registry)
}

/// Parse and load a registry from JSON text.
pub fn load_registry_str(text: &str) -> Result<SchemaRegistry> {
    let document: Value =
        serde_json::from_str(text).map_err(|err| Error::InvalidRegistry(err.to_string()))?;
    load_registry(&document)
}

/// Validate internal consistency of a schema registry.
///
/// This checks:
/// - entity and dataset names are unique and non-empty
/// - field names are unique within an entity
/// - no entity declares its own `<Entity>_ID` field (it is implicit)
/// - declared field types are registry types, not driver-only types
pub fn validate_registry(registry: &SchemaRegistry) -> Result<()> {
    let mut entities = BTreeSet::new();
    for entity in &registry.entities {
        if entity.name.is_empty() {
            return Err(Error::InvalidRegistry("entity with empty name".to_string()));
        }
        if !entities.insert(entity.name.as_str()) {
            return Err(Error::InvalidRegistry(format!(
                "duplicate entity name: {}",
                entity.name
            )));
        }

        let identifier = registry.identifier_field(&entity.name);
        let mut fields = BTreeSet::new();
        for field in &entity.fields {
            if !fields.insert(field.name.as_str()) {
                return Err(Error::InvalidRegistry(format!(
                    "duplicate field name: {}.{}",
                    entity.name, field.name
                )));
            }
            if field.name == identifier {
                return Err(Error::InvalidRegistry(format!(
                    "{}.{} is implicit and must not be declared",
                    entity.name, field.name
                )));
            }
            if matches!(
                field.field_type,
                FieldType::Geometry | FieldType::ObjectId | FieldType::Other(_)
            ) {
                return Err(Error::InvalidRegistry(format!(
                    "{}.{} declares unsupported type {}",
                    entity.name, field.name, field.field_type
                )));
            }
        }
    }

    let mut datasets = BTreeSet::new();
    for dataset in &registry.datasets {
        if dataset.name.is_empty() {
            return Err(Error::InvalidRegistry("dataset with empty name".to_string()));
        }
        if !datasets.insert(dataset.name.as_str()) {
            return Err(Error::InvalidRegistry(format!(
                "duplicate dataset name: {}",
                dataset.name
            )));
        }
    }

    if registry.conventions.identifier_suffix.is_empty() {
        return Err(Error::InvalidRegistry(
            "identifier suffix must not be empty".to_string(),
        ));
    }

    Ok(())
}
