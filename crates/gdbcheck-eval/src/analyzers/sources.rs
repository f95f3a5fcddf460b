use std::collections::BTreeSet;

use crate::model::{GroupFindings, GroupKind};

use super::{AnalysisContext, degraded};

/// Data-source citations without an entry, and entries nobody cites.
pub fn analyze(ctx: &AnalysisContext<'_>) -> Vec<GroupFindings> {
    let table = &ctx.registry.conventions.data_sources;
    let id_field = ctx.registry.identifier_field(table);
    let authoritative = match ctx.distinct(table, &id_field) {
        Ok(ids) => ids,
        Err(line) => {
            return degraded(
                &[GroupKind::MissingDataSources, GroupKind::UnusedDataSources],
                &line,
            );
        }
    };

    let mut references: Vec<_> = ctx.indices.source_refs.iter().collect();
    references.sort();

    let mut missing = Vec::new();
    let mut last: Option<&str> = None;
    for reference in &references {
        if last == Some(reference.value.as_str()) {
            continue;
        }
        last = Some(reference.value.as_str());
        if !authoritative.contains(reference.value.as_str()) {
            missing.push(format!(
                "{}, cited in field {} table {}",
                reference.value, reference.field, reference.entity
            ));
        }
    }

    let cited: BTreeSet<&str> = references.iter().map(|r| r.value.as_str()).collect();
    let unused = authoritative
        .iter()
        .filter(|id| !cited.contains(*id))
        .map(|id| id.to_string())
        .collect();

    vec![
        GroupFindings::new(GroupKind::MissingDataSources, missing),
        GroupFindings::new(GroupKind::UnusedDataSources, unused),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::testing::Fixture;
    use crate::indexer::{ColumnState, Indices, ReferenceRecord};

    fn cite(value: &str, field: &str, entity: &str) -> ReferenceRecord {
        ReferenceRecord {
            value: value.to_string(),
            field: field.to_string(),
            entity: entity.to_string(),
        }
    }

    fn fixture(ids: &[&str], refs: Vec<ReferenceRecord>) -> Fixture {
        let mut indices = Indices {
            source_refs: refs,
            ..Indices::default()
        };
        indices.columns.set(
            "DataSources",
            "DataSources_ID",
            ColumnState::Values(ids.iter().map(|id| id.to_string()).collect()),
        );
        Fixture::new(indices)
    }

    #[test]
    fn missing_and_unused_are_independent() {
        let broken = fixture(
            &["DAS1", "DAS2"],
            vec![
                cite("DAS9", "LocationSourceID", "StationPoints"),
                cite("DAS1", "DataSourceID", "ContactsAndFaults"),
                cite("DAS9", "DataSourceID", "ContactsAndFaults"),
            ],
        );
        let groups = analyze(&broken.ctx());
        assert_eq!(
            groups[0].lines,
            vec!["DAS9, cited in field DataSourceID table ContactsAndFaults".to_string()]
        );
        assert_eq!(groups[1].lines, vec!["DAS2".to_string()]);

        let fixed = fixture(
            &["DAS1", "DAS2", "DAS9"],
            vec![
                cite("DAS9", "LocationSourceID", "StationPoints"),
                cite("DAS1", "DataSourceID", "ContactsAndFaults"),
            ],
        );
        let groups = analyze(&fixed.ctx());
        assert!(groups[0].lines.is_empty());
        assert_eq!(groups[1].lines, vec!["DAS2".to_string()]);
    }

    #[test]
    fn absent_identifier_column_degrades_both_groups() {
        let fixture = Fixture::new(Indices::default());
        let groups = analyze(&fixture.ctx());
        assert_eq!(groups.len(), 2);
        for group in groups {
            assert_eq!(
                group.lines,
                vec!["Error: did not find field DataSources_ID in table DataSources".to_string()]
            );
        }
    }
}
