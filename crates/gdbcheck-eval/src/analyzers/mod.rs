//! Referential-integrity analyzers.
//!
//! Every analyzer is a pure function of the indices. None of them reads the
//! store or fails: an expected column that is absent or unreadable turns
//! into a single explanatory line in the affected groups.

use std::collections::BTreeSet;

use gdbcheck_core::{SchemaRegistry, StoreInventory};

use crate::indexer::{ColumnState, Indices};
use crate::model::GroupFindings;

pub mod events;
pub mod glossary;
pub mod hierarchy;
pub mod hygiene;
pub mod links;
pub mod map_units;
pub mod sources;
pub mod uniqueness;

/// Read-only inputs shared by all analyzers.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisContext<'a> {
    pub registry: &'a SchemaRegistry,
    pub inventory: &'a StoreInventory,
    pub indices: &'a Indices,
    /// Width override for hierarchy-key segments.
    pub hierarchy_key_width: Option<usize>,
}

impl<'a> AnalysisContext<'a> {
    /// Captured values of a column, or the line explaining why there are none.
    pub fn column(&self, entity: &str, field: &str) -> Result<&'a [String], String> {
        match self.indices.columns.get(entity, field) {
            ColumnState::Values(values) => Ok(values),
            ColumnState::EntityAbsent | ColumnState::FieldAbsent => {
                Err(format!("Error: did not find field {field} in table {entity}"))
            }
            ColumnState::Unreadable => {
                Err(format!("Error: could not read field {field} in table {entity}"))
            }
        }
    }

    /// Distinct non-empty values of a column.
    pub fn distinct(&self, entity: &str, field: &str) -> Result<BTreeSet<&'a str>, String> {
        Ok(self
            .column(entity, field)?
            .iter()
            .map(String::as_str)
            .filter(|value| !value.is_empty())
            .collect())
    }
}

/// Run every analyzer. Groups are returned unordered.
pub fn run_all(ctx: &AnalysisContext<'_>) -> Vec<GroupFindings> {
    let analyzers: [(&str, fn(&AnalysisContext<'_>) -> Vec<GroupFindings>); 8] = [
        ("uniqueness", uniqueness::analyze),
        ("sources", sources::analyze),
        ("map_units", map_units::analyze),
        ("glossary", glossary::analyze),
        ("links", links::analyze),
        ("events", events::analyze),
        ("hierarchy", hierarchy::analyze),
        ("hygiene", hygiene::analyze),
    ];

    let mut groups = Vec::new();
    for (name, analyze) in analyzers {
        let produced = analyze(ctx);
        tracing::debug!(
            event = "analyzer_finished",
            analyzer = name,
            lines = produced.iter().map(|group| group.lines.len()).sum::<usize>()
        );
        groups.extend(produced);
    }
    groups
}

/// Same line in every listed group.
fn degraded(kinds: &[crate::model::GroupKind], line: &str) -> Vec<GroupFindings> {
    kinds
        .iter()
        .map(|kind| GroupFindings::new(*kind, vec![line.to_string()]))
        .collect()
}

#[cfg(test)]
pub(crate) mod testing {
    use gdbcheck_core::{SchemaRegistry, StoreInventory, ncgmp09_registry};

    use crate::indexer::Indices;

    use super::AnalysisContext;

    pub struct Fixture {
        pub registry: SchemaRegistry,
        pub inventory: StoreInventory,
        pub indices: Indices,
    }

    impl Fixture {
        pub fn new(indices: Indices) -> Self {
            Self {
                registry: ncgmp09_registry(),
                inventory: StoreInventory::new("memory", "test", Vec::new()),
                indices,
            }
        }

        pub fn ctx(&self) -> AnalysisContext<'_> {
            AnalysisContext {
                registry: &self.registry,
                inventory: &self.inventory,
                indices: &self.indices,
                hierarchy_key_width: None,
            }
        }
    }
}
