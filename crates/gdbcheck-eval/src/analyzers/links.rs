use std::collections::BTreeSet;

use crate::model::{GroupFindings, GroupKind};

use super::AnalysisContext;

/// Owner and value links of extended attributes that match no identifier.
///
/// Produces nothing when the store has no extended-attributes entity.
pub fn analyze(ctx: &AnalysisContext<'_>) -> Vec<GroupFindings> {
    let conventions = &ctx.registry.conventions;
    let table = &conventions.extended_attributes;
    if !ctx.inventory.contains(table) {
        return Vec::new();
    }

    let identifiers: BTreeSet<&str> = ctx
        .indices
        .identifiers
        .iter()
        .map(|record| record.value.as_str())
        .collect();

    let mut lines = Vec::new();
    let mut unresolved = BTreeSet::new();
    for field in [&conventions.owner_link_field, &conventions.value_link_field] {
        match ctx.distinct(table, field) {
            Ok(values) => unresolved.extend(
                values
                    .into_iter()
                    .filter(|value| !identifiers.contains(value)),
            ),
            Err(line) => lines.push(line),
        }
    }
    lines.extend(unresolved.into_iter().map(str::to_string));

    vec![GroupFindings::new(GroupKind::UnresolvedLinks, lines)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::testing::Fixture;
    use crate::indexer::{ColumnState, IdentifierRecord, Indices};
    use gdbcheck_core::{EntityKind, LiveEntity, StoreInventory};

    fn with_extended_attributes(mut fixture: Fixture) -> Fixture {
        fixture.inventory = StoreInventory::new(
            "memory",
            "test",
            vec![LiveEntity {
                name: "ExtendedAttributes".to_string(),
                kind: EntityKind::Table,
                dataset: None,
                row_count: Some(2),
                fields: Vec::new(),
            }],
        );
        fixture
    }

    fn values(items: &[&str]) -> ColumnState {
        ColumnState::Values(items.iter().map(|item| item.to_string()).collect())
    }

    #[test]
    fn skipped_without_extended_attributes() {
        let fixture = Fixture::new(Indices::default());
        assert!(analyze(&fixture.ctx()).is_empty());
    }

    #[test]
    fn reports_each_unresolved_link_once() {
        let mut indices = Indices {
            identifiers: vec![IdentifierRecord {
                value: "MUP1".to_string(),
                entity: "MapUnitPolys".to_string(),
            }],
            ..Indices::default()
        };
        indices
            .columns
            .set("ExtendedAttributes", "OwnerID", values(&["MUP1", "MUP9", "MUP9"]));
        indices
            .columns
            .set("ExtendedAttributes", "ValueLinkID", values(&["GE1", ""]));
        let fixture = with_extended_attributes(Fixture::new(indices));

        let groups = analyze(&fixture.ctx());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].lines, vec!["GE1".to_string(), "MUP9".to_string()]);
    }

    #[test]
    fn link_columns_degrade_independently() {
        let mut indices = Indices::default();
        indices
            .columns
            .set("ExtendedAttributes", "OwnerID", values(&["X"]));
        indices
            .columns
            .set("ExtendedAttributes", "ValueLinkID", ColumnState::FieldAbsent);
        let fixture = with_extended_attributes(Fixture::new(indices));

        let groups = analyze(&fixture.ctx());
        assert_eq!(
            groups[0].lines,
            vec![
                "Error: did not find field ValueLinkID in table ExtendedAttributes".to_string(),
                "X".to_string(),
            ]
        );
    }
}
