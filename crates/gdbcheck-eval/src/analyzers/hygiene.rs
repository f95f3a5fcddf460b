use crate::model::{GroupFindings, GroupKind};

use super::AnalysisContext;

/// Pseudonulls and trailing spaces, plus entities the indexer could not read.
pub fn analyze(ctx: &AnalysisContext<'_>) -> Vec<GroupFindings> {
    let pseudonulls = ctx
        .indices
        .bad_nulls
        .iter()
        .map(|record| {
            format!(
                "Table {}, row {}, field {}",
                record.entity,
                record.row,
                record.fields.join(" ")
            )
        })
        .collect();

    let unreadable = ctx
        .indices
        .failures
        .iter()
        .map(|failure| format!("{}: {}", failure.entity, failure.message))
        .collect();

    vec![
        GroupFindings::new(GroupKind::Pseudonulls, pseudonulls),
        GroupFindings::new(GroupKind::UnreadableEntities, unreadable),
    ]
}
