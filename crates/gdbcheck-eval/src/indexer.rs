//! Single read pass over every entity of a store.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use futures::TryStreamExt;

use gdbcheck_core::{
    FieldRole, FieldType, FieldValue, LiveEntity, MapUnitCategory, Result, Row, SchemaRegistry,
    StoreInventory,
};
use gdbcheck_introspect::Store;

/// `(value, owningEntity)` of a primary identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct IdentifierRecord {
    pub value: String,
    pub entity: String,
}

/// One occurrence of a field value that must resolve elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReferenceRecord {
    pub value: String,
    pub field: String,
    pub entity: String,
}

/// A map-unit code seen in an entity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MapUnitObservation {
    pub code: String,
    pub entity: String,
    pub category: Option<MapUnitCategory>,
}

impl MapUnitObservation {
    /// Uncategorized layers (overlays, standalone polygons) cite units too.
    pub fn is_reference(&self) -> bool {
        self.category.is_none_or(MapUnitCategory::is_reference)
    }
}

/// How a row is identified in hygiene findings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowLocator {
    /// Value of the store's object-id field.
    ObjectId { field: String, value: String },
    /// 1-based position in scan order.
    Ordinal(u64),
}

impl fmt::Display for RowLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowLocator::ObjectId { field, value } => write!(f, "{field}={value}"),
            RowLocator::Ordinal(ordinal) => write!(f, "{ordinal}"),
        }
    }
}

/// Non-nullable text values ending in a space, grouped per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadNullRecord {
    pub entity: String,
    pub row: RowLocator,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityReadFailure {
    pub entity: String,
    pub message: String,
}

/// Outcome of capturing one value column for the analyzers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnState {
    EntityAbsent,
    FieldAbsent,
    Unreadable,
    /// Non-null values in scan order, as text.
    Values(Vec<String>),
}

static ENTITY_ABSENT: ColumnState = ColumnState::EntityAbsent;
static NULL: FieldValue = FieldValue::Null;

/// Value columns the analyzers consume, keyed by `(entity, field)`.
#[derive(Debug, Clone, Default)]
pub struct ColumnCapture {
    columns: BTreeMap<(String, String), ColumnState>,
}

impl ColumnCapture {
    pub fn get(&self, entity: &str, field: &str) -> &ColumnState {
        self.columns
            .get(&(entity.to_string(), field.to_string()))
            .unwrap_or(&ENTITY_ABSENT)
    }

    pub(crate) fn set(&mut self, entity: &str, field: &str, state: ColumnState) {
        self.columns
            .insert((entity.to_string(), field.to_string()), state);
    }
}

/// Everything the analyzers need, built once per run.
#[derive(Debug, Clone, Default)]
pub struct Indices {
    pub identifiers: Vec<IdentifierRecord>,
    pub glossary_refs: Vec<ReferenceRecord>,
    pub source_refs: Vec<ReferenceRecord>,
    pub map_units: Vec<MapUnitObservation>,
    pub bad_nulls: Vec<BadNullRecord>,
    pub failures: Vec<EntityReadFailure>,
    pub columns: ColumnCapture,
}

impl Indices {
    fn absorb(&mut self, scan: EntityScan) {
        self.identifiers.extend(scan.identifiers);
        self.glossary_refs.extend(scan.glossary_refs);
        self.source_refs.extend(scan.source_refs);
        self.map_units.extend(scan.map_units);
        self.bad_nulls.extend(scan.bad_nulls);
        for ((entity, field), values) in scan.captured {
            self.columns
                .set(&entity, &field, ColumnState::Values(values));
        }
    }
}

/// `(entity, field)` pairs whose values the analyzers read.
pub fn tracked_columns(registry: &SchemaRegistry) -> Vec<(String, String)> {
    let conventions = &registry.conventions;
    vec![
        (
            conventions.data_sources.clone(),
            registry.identifier_field(&conventions.data_sources),
        ),
        (
            conventions.glossary.clone(),
            conventions.glossary_term_field.clone(),
        ),
        (
            conventions.description_of_units.clone(),
            conventions.map_unit_field.clone(),
        ),
        (
            conventions.description_of_units.clone(),
            conventions.hierarchy_key_field.clone(),
        ),
        (
            conventions.standard_lithology.clone(),
            conventions.map_unit_field.clone(),
        ),
        (
            conventions.extended_attributes.clone(),
            conventions.owner_link_field.clone(),
        ),
        (
            conventions.extended_attributes.clone(),
            conventions.value_link_field.clone(),
        ),
        (
            conventions.geologic_events.clone(),
            registry.identifier_field(&conventions.geologic_events),
        ),
    ]
}

/// Scan every entity once and build the cross-reference indices.
///
/// A failure or timeout while scanning one entity is recorded and leaves
/// the indices untouched for that entity; scanning continues with the next.
pub async fn build_indices(
    store: &dyn Store,
    inventory: &StoreInventory,
    registry: &SchemaRegistry,
    scan_timeout: Duration,
) -> Indices {
    let mut indices = Indices::default();
    let tracked = tracked_columns(registry);

    for (entity, field) in &tracked {
        let state = match inventory.entity(entity) {
            None => ColumnState::EntityAbsent,
            Some(_) if inventory.is_unlisted(entity) => ColumnState::Unreadable,
            Some(live) if !live.has_field(field) => ColumnState::FieldAbsent,
            Some(_) => ColumnState::Unreadable,
        };
        indices.columns.set(entity, field, state);
    }

    indices
        .failures
        .extend(inventory.listing_failures.iter().map(|failure| EntityReadFailure {
            entity: failure.entity.clone(),
            message: failure.message.clone(),
        }));

    for entity in &inventory.entities {
        let captured: Vec<&str> = tracked
            .iter()
            .filter(|(name, field)| {
                *name == entity.name
                    && inventory
                        .entity(name)
                        .is_some_and(|owner| std::ptr::eq(owner, entity) && owner.has_field(field))
            })
            .map(|(_, field)| field.as_str())
            .collect();

        let plan = ScanPlan::new(registry, entity, &captured);
        if plan.fields.is_empty() {
            continue;
        }

        match tokio::time::timeout(scan_timeout, plan.scan(store, entity)).await {
            Ok(Ok(scan)) => {
                tracing::debug!(
                    event = "entity_scanned",
                    entity = %entity.name,
                    rows = scan.rows
                );
                indices.absorb(scan);
            }
            Ok(Err(err)) => record_failure(&mut indices, entity, err.to_string()),
            Err(_) => record_failure(
                &mut indices,
                entity,
                format!("scan exceeded {}s deadline", scan_timeout.as_secs()),
            ),
        }
    }

    tracing::info!(
        event = "indexing_finished",
        identifiers = indices.identifiers.len(),
        glossary_refs = indices.glossary_refs.len(),
        source_refs = indices.source_refs.len(),
        map_units = indices.map_units.len(),
        failures = indices.failures.len()
    );
    indices
}

fn record_failure(indices: &mut Indices, entity: &LiveEntity, message: String) {
    tracing::warn!(
        event = "entity_scan_failed",
        entity = %entity.name,
        error = %message
    );
    indices.failures.push(EntityReadFailure {
        entity: entity.name.clone(),
        message,
    });
}

/// Local accumulator for one entity, merged only when the scan completes.
#[derive(Debug, Default)]
struct EntityScan {
    rows: u64,
    identifiers: Vec<IdentifierRecord>,
    glossary_refs: Vec<ReferenceRecord>,
    source_refs: Vec<ReferenceRecord>,
    map_units: Vec<MapUnitObservation>,
    bad_nulls: Vec<BadNullRecord>,
    captured: BTreeMap<(String, String), Vec<String>>,
}

/// Positions of interesting fields within the projected row.
struct ScanPlan {
    entity: String,
    fields: Vec<String>,
    identifier: Option<usize>,
    glossary: Vec<usize>,
    sources: Vec<usize>,
    map_unit: Option<usize>,
    category: Option<MapUnitCategory>,
    required_text: Vec<usize>,
    object_id: Option<usize>,
    captured: Vec<usize>,
}

impl ScanPlan {
    fn new(registry: &SchemaRegistry, entity: &LiveEntity, captured: &[&str]) -> Self {
        let conventions = &registry.conventions;
        let resolution = registry.resolve(&entity.handle());
        let identifier_field = registry.identifier_field(&entity.name);
        let is_glossary = entity.name == conventions.glossary;
        let is_data_sources = entity.name == conventions.data_sources;

        let mut plan = ScanPlan {
            entity: entity.name.clone(),
            fields: Vec::new(),
            identifier: None,
            glossary: Vec::new(),
            sources: Vec::new(),
            map_unit: None,
            category: resolution.category,
            required_text: Vec::new(),
            object_id: None,
            captured: Vec::new(),
        };

        for field in entity.fields.iter().filter(|f| f.field_type.is_scannable()) {
            let position = plan.fields.len();
            let mut used = false;

            if field.name == identifier_field {
                plan.identifier = Some(position);
                used = true;
            }
            if field.name == conventions.object_id_field {
                plan.object_id = Some(position);
                used = true;
            }
            match registry.role_of(resolution.spec, &field.name) {
                FieldRole::GlossaryTerm if !is_glossary => {
                    plan.glossary.push(position);
                    used = true;
                }
                FieldRole::DataSourceRef if !is_data_sources => {
                    plan.sources.push(position);
                    used = true;
                }
                FieldRole::MapUnit if plan.map_unit.is_none() => {
                    plan.map_unit = Some(position);
                    used = true;
                }
                _ => {}
            }
            if field.field_type == FieldType::Text && !field.nullable {
                plan.required_text.push(position);
                used = true;
            }
            if captured.contains(&field.name.as_str()) {
                plan.captured.push(position);
                used = true;
            }

            if used {
                plan.fields.push(field.name.clone());
            }
        }

        plan
    }

    async fn scan(&self, store: &dyn Store, entity: &LiveEntity) -> Result<EntityScan> {
        let handle = entity.handle();
        let mut rows = store.scan_rows(&handle, &self.fields);
        let mut scan = EntityScan::default();

        while let Some(row) = rows.try_next().await? {
            scan.rows += 1;
            self.index_row(&row, scan.rows, &mut scan);
        }

        for position in &self.captured {
            scan.captured
                .entry((self.entity.clone(), self.fields[*position].clone()))
                .or_default();
        }
        Ok(scan)
    }

    fn index_row(&self, row: &Row, ordinal: u64, scan: &mut EntityScan) {
        let value = |position: usize| row.get(position).unwrap_or(&NULL);

        if let Some(position) = self.identifier {
            if let Some(id) = value(position).as_reference() {
                scan.identifiers.push(IdentifierRecord {
                    value: id.into_owned(),
                    entity: self.entity.clone(),
                });
            }
        }

        for &position in &self.glossary {
            if let Some(term) = value(position).as_reference() {
                scan.glossary_refs.push(self.reference(term.into_owned(), position));
            }
        }

        for &position in &self.sources {
            if let Some(source) = value(position).as_reference() {
                scan.source_refs.push(self.reference(source.into_owned(), position));
            }
        }

        if let Some(position) = self.map_unit {
            if let Some(code) = value(position).as_reference() {
                scan.map_units.push(MapUnitObservation {
                    code: code.into_owned(),
                    entity: self.entity.clone(),
                    category: self.category,
                });
            }
        }

        let padded: Vec<String> = self
            .required_text
            .iter()
            .filter(|&&position| {
                value(position)
                    .as_text()
                    .is_some_and(|text| text.ends_with(' '))
            })
            .map(|&position| self.fields[position].clone())
            .collect();
        if !padded.is_empty() {
            let row = self
                .object_id
                .and_then(|position| {
                    value(position).as_text().map(|id| RowLocator::ObjectId {
                        field: self.fields[position].clone(),
                        value: id.into_owned(),
                    })
                })
                .unwrap_or(RowLocator::Ordinal(ordinal));
            scan.bad_nulls.push(BadNullRecord {
                entity: self.entity.clone(),
                row,
                fields: padded,
            });
        }

        for &position in &self.captured {
            let column = scan
                .captured
                .entry((self.entity.clone(), self.fields[position].clone()))
                .or_default();
            if let Some(text) = value(position).as_text() {
                column.push(text.into_owned());
            }
        }
    }

    fn reference(&self, value: String, position: usize) -> ReferenceRecord {
        ReferenceRecord {
            value,
            field: self.fields[position].clone(),
            entity: self.entity.clone(),
        }
    }
}
