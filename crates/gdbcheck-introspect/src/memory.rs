//! In-memory store backed by a JSON fixture.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use serde::{Deserialize, Serialize};

use gdbcheck_core::{
    EntityHandle, EntityKind, Error, FieldType, FieldValue, LiveField, Result, Row,
};

use crate::adapter::{RowStream, Store};

/// One table or feature class of a [`MemoryStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntity {
    pub name: String,
    pub kind: EntityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    pub fields: Vec<LiveField>,
    /// Rows keyed by field name; absent keys read as null.
    #[serde(default)]
    pub rows: Vec<BTreeMap<String, FieldValue>>,
    /// Simulates an entity whose rows cannot be read.
    #[serde(default)]
    pub unreadable: bool,
}

impl MemoryEntity {
    pub fn table(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntityKind::Table,
            dataset: None,
            fields: Vec::new(),
            rows: Vec::new(),
            unreadable: false,
        }
    }

    pub fn feature_class(
        name: impl Into<String>,
        kind: EntityKind,
        dataset: Option<&str>,
    ) -> Self {
        Self {
            kind,
            dataset: dataset.map(str::to_string),
            ..Self::table(name)
        }
    }

    pub fn field(mut self, name: &str, field_type: FieldType, nullable: bool) -> Self {
        let length = match field_type {
            FieldType::Text => Some(255),
            _ => None,
        };
        self.fields.push(LiveField {
            name: name.to_string(),
            field_type,
            length,
            nullable,
        });
        self
    }

    /// Nullable text field.
    pub fn text(self, name: &str) -> Self {
        self.field(name, FieldType::Text, true)
    }

    /// Non-nullable text field.
    pub fn required_text(self, name: &str) -> Self {
        self.field(name, FieldType::Text, false)
    }

    /// Append a row of text values.
    pub fn row<'a>(mut self, values: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        self.rows.push(
            values
                .into_iter()
                .map(|(field, value)| (field.to_string(), FieldValue::Text(value.to_string())))
                .collect(),
        );
        self
    }

    /// Append a row of arbitrary values.
    pub fn value_row(mut self, values: BTreeMap<String, FieldValue>) -> Self {
        self.rows.push(values);
        self
    }

    pub fn unreadable(mut self) -> Self {
        self.unreadable = true;
        self
    }

    fn handle(&self) -> EntityHandle {
        EntityHandle {
            name: self.name.clone(),
            kind: self.kind,
            dataset: self.dataset.clone(),
        }
    }

    fn project(&self, fields: &[String]) -> Vec<Result<Row>> {
        self.rows
            .iter()
            .map(|row| {
                Ok(fields
                    .iter()
                    .map(|field| row.get(field).cloned().unwrap_or(FieldValue::Null))
                    .collect())
            })
            .collect()
    }
}

/// Store whose contents live entirely in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    pub name: String,
    #[serde(default)]
    pub entities: Vec<MemoryEntity>,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entities: Vec::new(),
        }
    }

    pub fn with_entity(mut self, entity: MemoryEntity) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|err| Error::StoreAccess(format!("invalid fixture: {err}")))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|err| Error::StoreAccess(format!("{}: {err}", path.display())))?;
        Self::from_json_str(&text)
    }

    fn lookup(&self, handle: &EntityHandle) -> Result<&MemoryEntity> {
        self.entities
            .iter()
            .find(|entity| entity.name == handle.name && entity.dataset == handle.dataset)
            .ok_or_else(|| Error::entity_read(&handle.name, "no such entity"))
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn engine(&self) -> &'static str {
        "memory"
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn list_entities(&self) -> Result<Vec<EntityHandle>> {
        Ok(self.entities.iter().map(MemoryEntity::handle).collect())
    }

    async fn list_fields(&self, entity: &EntityHandle) -> Result<Vec<LiveField>> {
        Ok(self.lookup(entity)?.fields.clone())
    }

    async fn row_count(&self, entity: &EntityHandle) -> Result<u64> {
        let entity = self.lookup(entity)?;
        if entity.unreadable {
            return Err(Error::entity_read(&entity.name, "cannot count rows"));
        }
        Ok(entity.rows.len() as u64)
    }

    fn scan_rows<'a>(&'a self, entity: &'a EntityHandle, fields: &'a [String]) -> RowStream<'a> {
        let rows = match self.lookup(entity) {
            Ok(found) if found.unreadable => {
                vec![Err(Error::entity_read(&found.name, "rows cannot be read"))]
            }
            Ok(found) => found.project(fields),
            Err(err) => vec![Err(err)],
        };
        stream::iter(rows).boxed()
    }
}
