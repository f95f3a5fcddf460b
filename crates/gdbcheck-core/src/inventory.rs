use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::{EntityKind, FieldType};

/// Store-level address of a table or feature class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct EntityHandle {
    pub name: String,
    pub kind: EntityKind,
    /// Containing feature dataset; `None` for standalone entities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
}

/// Field metadata as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LiveField {
    pub name: String,
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    pub nullable: bool,
}

/// Snapshot of one table or feature class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LiveEntity {
    pub name: String,
    pub kind: EntityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    /// Informational only; `None` when the store could not count rows.
    pub row_count: Option<u64>,
    pub fields: Vec<LiveField>,
}

impl LiveEntity {
    pub fn field(&self, name: &str) -> Option<&LiveField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn handle(&self) -> EntityHandle {
        EntityHandle {
            name: self.name.clone(),
            kind: self.kind,
            dataset: self.dataset.clone(),
        }
    }
}

/// An entity whose fields could not be listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ListingFailure {
    pub entity: String,
    pub message: String,
}

/// Immutable inventory of a store, built once per validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StoreInventory {
    /// Store engine identifier (e.g. `postgres`, `memory`).
    pub engine: String,
    /// Human-readable store name.
    pub store: String,
    /// Standalone entities first, then dataset members, each sorted by name.
    pub entities: Vec<LiveEntity>,
    /// Entities kept with no fields because listing them failed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub listing_failures: Vec<ListingFailure>,
}

impl StoreInventory {
    pub fn new(
        engine: impl Into<String>,
        store: impl Into<String>,
        mut entities: Vec<LiveEntity>,
    ) -> Self {
        entities.sort_by(|left, right| {
            (left.dataset.is_some(), &left.dataset, &left.name).cmp(&(
                right.dataset.is_some(),
                &right.dataset,
                &right.name,
            ))
        });
        Self {
            engine: engine.into(),
            store: store.into(),
            entities,
            listing_failures: Vec::new(),
        }
    }

    pub fn with_listing_failures(mut self, failures: Vec<ListingFailure>) -> Self {
        self.listing_failures = failures;
        self
    }

    /// Whether the fields of `name` are unknown.
    pub fn is_unlisted(&self, name: &str) -> bool {
        self.listing_failures
            .iter()
            .any(|failure| failure.entity == name)
    }

    pub fn entity(&self, name: &str) -> Option<&LiveEntity> {
        self.entities.iter().find(|entity| entity.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entity(name).is_some()
    }

    /// Entities that do not belong to a feature dataset.
    pub fn standalone(&self) -> impl Iterator<Item = &LiveEntity> {
        self.entities.iter().filter(|entity| entity.dataset.is_none())
    }

    /// Feature datasets and their members, sorted by dataset name.
    pub fn datasets(&self) -> BTreeMap<&str, Vec<&LiveEntity>> {
        let mut datasets: BTreeMap<&str, Vec<&LiveEntity>> = BTreeMap::new();
        for entity in &self.entities {
            if let Some(dataset) = entity.dataset.as_deref() {
                datasets.entry(dataset).or_default().push(entity);
            }
        }
        datasets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(name: &str, dataset: Option<&str>) -> LiveEntity {
        LiveEntity {
            name: name.to_string(),
            kind: if dataset.is_some() {
                EntityKind::PolygonCollection
            } else {
                EntityKind::Table
            },
            dataset: dataset.map(str::to_string),
            row_count: Some(0),
            fields: Vec::new(),
        }
    }

    #[test]
    fn inventory_orders_standalone_before_datasets() {
        let inventory = StoreInventory::new(
            "memory",
            "test",
            vec![
                entity("MapUnitPolys", Some("GeologicMap")),
                entity("Glossary", None),
                entity("CMULines", Some("CorrelationOfMapUnits")),
                entity("DataSources", None),
            ],
        );

        let names: Vec<&str> = inventory
            .entities
            .iter()
            .map(|entity| entity.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["DataSources", "Glossary", "CMULines", "MapUnitPolys"]
        );

        let datasets = inventory.datasets();
        assert_eq!(
            datasets.keys().copied().collect::<Vec<_>>(),
            vec!["CorrelationOfMapUnits", "GeologicMap"]
        );
    }
}
