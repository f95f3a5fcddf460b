use crate::model::{GroupFindings, GroupKind};

use super::AnalysisContext;

/// Identifier values owned by more than one row anywhere in the store.
pub fn analyze(ctx: &AnalysisContext<'_>) -> Vec<GroupFindings> {
    let mut identifiers: Vec<_> = ctx.indices.identifiers.iter().collect();
    identifiers.sort();

    let lines = identifiers
        .chunk_by(|left, right| left.value == right.value)
        .filter(|group| group.len() > 1)
        .map(|group| {
            let owners: Vec<&str> = group.iter().map(|record| record.entity.as_str()).collect();
            format!("{}, tables {}", group[0].value, owners.join(" "))
        })
        .collect();

    vec![GroupFindings::new(GroupKind::DuplicateIds, lines)]
}
