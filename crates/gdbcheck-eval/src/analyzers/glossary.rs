use std::collections::BTreeSet;

use crate::model::{GroupFindings, GroupKind};

use super::{AnalysisContext, degraded};

/// Glossary terms cited but not defined, and defined but never cited.
pub fn analyze(ctx: &AnalysisContext<'_>) -> Vec<GroupFindings> {
    let conventions = &ctx.registry.conventions;
    let defined = match ctx.distinct(&conventions.glossary, &conventions.glossary_term_field) {
        Ok(terms) => terms,
        Err(line) => {
            return degraded(
                &[GroupKind::MissingGlossaryTerms, GroupKind::UnusedGlossaryTerms],
                &line,
            );
        }
    };

    let mut references: Vec<_> = ctx.indices.glossary_refs.iter().collect();
    references.sort();

    let mut missing = Vec::new();
    let mut last: Option<&str> = None;
    for reference in &references {
        if last == Some(reference.value.as_str()) {
            continue;
        }
        last = Some(reference.value.as_str());
        if !defined.contains(reference.value.as_str()) {
            missing.push(format!(
                "{}, cited in field {}, table {}",
                display_term(&reference.value, conventions.term_display_limit),
                reference.field,
                reference.entity
            ));
        }
    }

    let cited: BTreeSet<&str> = references.iter().map(|r| r.value.as_str()).collect();
    let unused = defined
        .iter()
        .filter(|term| !cited.contains(*term))
        .map(|term| term.to_string())
        .collect();

    vec![
        GroupFindings::new(GroupKind::MissingGlossaryTerms, missing),
        GroupFindings::new(GroupKind::UnusedGlossaryTerms, unused),
    ]
}

/// Terms at or beyond `limit` characters are cut to `limit - 3` plus an ellipsis.
fn display_term(term: &str, limit: usize) -> String {
    if term.chars().count() < limit {
        return term.to_string();
    }
    let kept: String = term.chars().take(limit.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::testing::Fixture;
    use crate::indexer::{ColumnState, Indices, ReferenceRecord};

    fn fixture(terms: &[&str], refs: Vec<ReferenceRecord>) -> Fixture {
        let mut indices = Indices {
            glossary_refs: refs,
            ..Indices::default()
        };
        indices.columns.set(
            "Glossary",
            "Term",
            ColumnState::Values(terms.iter().map(|term| term.to_string()).collect()),
        );
        Fixture::new(indices)
    }

    #[test]
    fn missing_terms_cite_first_reference_only() {
        let refs = (0..10)
            .map(|n| ReferenceRecord {
                value: "Shear Zone".to_string(),
                field: "Type".to_string(),
                entity: format!("Lines{n}"),
            })
            .collect();
        let fixture = fixture(&["Fault"], refs);

        let groups = analyze(&fixture.ctx());
        assert_eq!(
            groups[0].lines,
            vec!["Shear Zone, cited in field Type, table Lines0".to_string()]
        );
        assert_eq!(groups[1].lines, vec!["Fault".to_string()]);
    }

    #[test]
    fn long_terms_are_truncated_for_display() {
        let long = "a".repeat(45);
        assert_eq!(display_term(&long, 40), format!("{}...", "a".repeat(37)));
        assert_eq!(display_term("short", 40), "short");
        assert_eq!(display_term(&"b".repeat(39), 40), "b".repeat(39));
    }
}
