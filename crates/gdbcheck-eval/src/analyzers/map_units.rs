use std::collections::{BTreeMap, BTreeSet};

use gdbcheck_core::MapUnitCategory;

use crate::model::{GroupFindings, GroupKind};

use super::{AnalysisContext, degraded};

/// Column header of the equivalence table.
pub const EQUIVALENCE_HEADER: &str = "Unit       Map  DMU  CMU  XS";

const PRESENT: &str = "  X  ";
const ABSENT: &str = " --- ";

/// Map-unit presence across map, description, correlation, cross-section
/// and lithology categories.
pub fn analyze(ctx: &AnalysisContext<'_>) -> Vec<GroupFindings> {
    let conventions = &ctx.registry.conventions;
    let cited = first_citations(ctx);

    let mut groups = Vec::new();
    match ctx.distinct(&conventions.description_of_units, &conventions.map_unit_field) {
        Ok(described) => {
            groups.push(GroupFindings::new(
                GroupKind::MissingDescriptionUnits,
                missing_from(&cited, &described),
            ));
            groups.push(GroupFindings::new(
                GroupKind::UnreferencedDescriptionUnits,
                unreferenced(&described, &cited),
            ));
        }
        Err(line) => groups.extend(degraded(
            &[
                GroupKind::MissingDescriptionUnits,
                GroupKind::UnreferencedDescriptionUnits,
            ],
            &line,
        )),
    }

    groups.push(
        GroupFindings::new(GroupKind::UnitEquivalence, equivalence_rows(ctx))
            .with_column_header(EQUIVALENCE_HEADER),
    );

    if ctx.inventory.contains(&conventions.standard_lithology) {
        match ctx.distinct(&conventions.standard_lithology, &conventions.map_unit_field) {
            Ok(lithology) => {
                groups.push(GroupFindings::new(
                    GroupKind::MissingLithologyUnits,
                    missing_from(&cited, &lithology),
                ));
                groups.push(GroupFindings::new(
                    GroupKind::UnreferencedLithologyUnits,
                    unreferenced(&lithology, &cited),
                ));
            }
            Err(line) => groups.extend(degraded(
                &[
                    GroupKind::MissingLithologyUnits,
                    GroupKind::UnreferencedLithologyUnits,
                ],
                &line,
            )),
        }
    }

    groups
}

/// Referenced codes mapped to the entity cited for them.
///
/// Map layers are preferred, then correlation and cross-section layers, then
/// uncategorized layers; ties go to the first entity name.
fn first_citations<'a>(ctx: &AnalysisContext<'a>) -> BTreeMap<&'a str, &'a str> {
    let mut references: Vec<_> = ctx
        .indices
        .map_units
        .iter()
        .filter(|observation| observation.is_reference())
        .map(|observation| {
            (
                observation.code.as_str(),
                observation.category.is_none(),
                observation.category,
                observation.entity.as_str(),
            )
        })
        .collect();
    references.sort();

    let mut cited: BTreeMap<&str, &str> = BTreeMap::new();
    for (code, _, _, entity) in references {
        cited.entry(code).or_insert(entity);
    }
    cited
}

fn missing_from(cited: &BTreeMap<&str, &str>, defined: &BTreeSet<&str>) -> Vec<String> {
    cited
        .iter()
        .filter(|(code, _)| !defined.contains(*code))
        .map(|(code, entity)| format!("{code}, cited in {entity}"))
        .collect()
}

fn unreferenced(defined: &BTreeSet<&str>, cited: &BTreeMap<&str, &str>) -> Vec<String> {
    defined
        .iter()
        .filter(|code| !cited.contains_key(*code))
        .map(|code| code.to_string())
        .collect()
}

/// One row per code seen in any equivalence category, one marker per category.
fn equivalence_rows(ctx: &AnalysisContext<'_>) -> Vec<String> {
    let mut presence: BTreeMap<&str, BTreeSet<MapUnitCategory>> = BTreeMap::new();
    for observation in &ctx.indices.map_units {
        let Some(category) = observation.category else {
            continue;
        };
        if MapUnitCategory::EQUIVALENCE.contains(&category) {
            presence
                .entry(observation.code.as_str())
                .or_default()
                .insert(category);
        }
    }

    presence
        .iter()
        .map(|(code, categories)| {
            let markers: String = MapUnitCategory::EQUIVALENCE
                .iter()
                .map(|category| {
                    if categories.contains(category) {
                        PRESENT
                    } else {
                        ABSENT
                    }
                })
                .collect();
            format!("{code:<10}{markers}")
        })
        .collect()
}
