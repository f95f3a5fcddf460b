use std::collections::BTreeMap;

use crate::model::{GroupFindings, GroupKind};

use super::{AnalysisContext, degraded};

/// Hierarchy keys whose dash-delimited segments are not all the reference width.
pub fn analyze(ctx: &AnalysisContext<'_>) -> Vec<GroupFindings> {
    let conventions = &ctx.registry.conventions;
    let keys = match ctx.column(
        &conventions.description_of_units,
        &conventions.hierarchy_key_field,
    ) {
        Ok(keys) => keys,
        Err(line) => return degraded(&[GroupKind::HierarchyKeyFormat], &line),
    };
    let keys: Vec<&str> = keys
        .iter()
        .map(String::as_str)
        .filter(|key| !key.is_empty())
        .collect();

    let width = ctx
        .hierarchy_key_width
        .or(conventions.hierarchy_key_width)
        .or_else(|| modal_width(&keys));
    let Some(width) = width else {
        return vec![GroupFindings::new(GroupKind::HierarchyKeyFormat, Vec::new())];
    };

    tracing::debug!(event = "hierarchy_width", width);
    let lines = keys
        .into_iter()
        .filter(|key| segments(key).any(|len| len != width))
        .map(str::to_string)
        .collect();
    vec![GroupFindings::new(GroupKind::HierarchyKeyFormat, lines)]
}

fn segments(key: &str) -> impl Iterator<Item = usize> + '_ {
    key.split('-').map(|segment| segment.chars().count())
}

/// Most common segment width across all keys; ties go to the smaller width.
fn modal_width(keys: &[&str]) -> Option<usize> {
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for key in keys {
        for len in segments(key) {
            *counts.entry(len).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .max_by(|(a_len, a_count), (b_len, b_count)| {
            a_count.cmp(b_count).then(b_len.cmp(a_len))
        })
        .map(|(len, _)| len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::testing::Fixture;
    use crate::indexer::{ColumnState, Indices};

    fn fixture(keys: &[&str]) -> Fixture {
        let mut indices = Indices::default();
        indices.columns.set(
            "DescriptionOfMapUnits",
            "HierarchyKey",
            ColumnState::Values(keys.iter().map(|key| key.to_string()).collect()),
        );
        Fixture::new(indices)
    }

    #[test]
    fn flags_keys_off_the_modal_width_regardless_of_order() {
        let forward = fixture(&["1-1", "01-02", "01-02-03", "001"]);
        let backward = fixture(&["001", "01-02-03", "01-02", "1-1"]);

        let mut first = analyze(&forward.ctx()).remove(0).lines;
        let mut second = analyze(&backward.ctx()).remove(0).lines;
        first.sort();
        second.sort();
        assert_eq!(first, vec!["001".to_string(), "1-1".to_string()]);
        assert_eq!(first, second);
    }

    #[test]
    fn declared_width_overrides_the_mode() {
        let mut fixture = fixture(&["01-02", "001-002"]);
        fixture.registry.conventions.hierarchy_key_width = Some(3);
        let groups = analyze(&fixture.ctx());
        assert_eq!(groups[0].lines, vec!["01-02".to_string()]);
    }

    #[test]
    fn ties_prefer_the_smaller_width() {
        assert_eq!(modal_width(&["01", "001"]), Some(2));
        assert_eq!(modal_width(&[]), None);
    }

    #[test]
    fn missing_key_field_degrades() {
        let mut indices = Indices::default();
        indices.columns.set(
            "DescriptionOfMapUnits",
            "HierarchyKey",
            ColumnState::FieldAbsent,
        );
        let fixture = Fixture::new(indices);
        assert_eq!(
            analyze(&fixture.ctx())[0].lines,
            vec!["Error: did not find field HierarchyKey in table DescriptionOfMapUnits".to_string()]
        );
    }
}
