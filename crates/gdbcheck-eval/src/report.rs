//! Report aggregation and the plain-text rendering of a conformance report.

use std::collections::BTreeMap;

use gdbcheck_core::{EntityKind, Nullability, REPORT_VERSION, SchemaRegistry, StoreInventory};

use crate::conformance::SchemaFindings;
use crate::model::{
    ConformanceReport, ContentGroup, ContentLine, EntityDescription, FieldDescription,
    GroupFindings, GroupKind,
};

/// Merge schema findings and analyzer output into an ordered report.
///
/// Groups come out in [`GroupKind`] order. Detail lines are sorted and
/// identical lines collapse into one with an occurrence count, except for
/// the equivalence table whose rows keep their code order.
pub fn aggregate(
    registry: &SchemaRegistry,
    inventory: &StoreInventory,
    schema: SchemaFindings,
    groups: Vec<GroupFindings>,
) -> ConformanceReport {
    let mut merged: BTreeMap<GroupKind, (Option<String>, Vec<String>)> = BTreeMap::new();
    for group in groups {
        let entry = merged.entry(group.kind).or_default();
        if entry.0.is_none() {
            entry.0 = group.column_header;
        }
        entry.1.extend(group.lines);
    }

    let content = merged
        .into_iter()
        .map(|(kind, (column_header, lines))| {
            let lines: Vec<ContentLine> = if kind == GroupKind::UnitEquivalence {
                lines
                    .into_iter()
                    .map(|text| ContentLine {
                        text,
                        occurrences: 1,
                    })
                    .collect()
            } else {
                collapse(lines)
            };
            let none_found = lines.is_empty().then(|| kind.sentinel().to_string());
            ContentGroup {
                kind,
                header: kind.header().to_string(),
                column_header: column_header.filter(|_| none_found.is_none()),
                lines,
                none_found,
            }
        })
        .collect();

    ConformanceReport {
        report_version: REPORT_VERSION.to_string(),
        store: inventory.store.clone(),
        engine: inventory.engine.clone(),
        registry: registry.display_name(),
        schema_errors: schema.errors,
        schema_extensions: schema.extensions,
        content,
        description: describe(registry, inventory),
    }
}

fn collapse(mut lines: Vec<String>) -> Vec<ContentLine> {
    lines.sort();
    let mut collapsed: Vec<ContentLine> = Vec::with_capacity(lines.len());
    for text in lines {
        match collapsed.last_mut() {
            Some(last) if last.text == text => last.occurrences += 1,
            _ => collapsed.push(ContentLine {
                text,
                occurrences: 1,
            }),
        }
    }
    collapsed
}

fn describe(registry: &SchemaRegistry, inventory: &StoreInventory) -> Vec<EntityDescription> {
    inventory
        .entities
        .iter()
        .map(|entity| EntityDescription {
            name: entity.name.clone(),
            kind: entity.kind,
            dataset: entity.dataset.clone(),
            row_count: entity.row_count,
            fields: entity
                .fields
                .iter()
                .filter(|field| !registry.is_system_field(&field.name))
                .map(|field| FieldDescription {
                    name: field.name.clone(),
                    field_type: field.field_type.clone(),
                    length: field.length,
                    nullability: Nullability::from_nullable(field.nullable),
                })
                .collect(),
        })
        .collect()
}

/// Render the text report. Byte-identical for identical reports.
pub fn render_report(report: &ConformanceReport) -> String {
    let mut lines = Vec::new();

    lines.push(format!("Geodatabase {}", report.store));
    lines.push(format!(
        "  Testing for compliance with {} database schema",
        report.registry
    ));
    lines.push(String::new());

    push_section(&mut lines, "SCHEMA ERRORS", &report.schema_errors);
    push_section(
        &mut lines,
        "EXTENSIONS TO SCHEMA, may indicate errors",
        &report.schema_extensions,
    );

    lines.push("CONTENT ERRORS".to_string());
    for group in &report.content {
        push_group(&mut lines, group);
    }

    lines.push("GEODATABASE DESCRIPTION".to_string());
    push_description(&mut lines, &report.description);

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn push_section(lines: &mut Vec<String>, title: &str, entries: &[String]) {
    lines.push(title.to_string());
    if entries.is_empty() {
        lines.push("  None".to_string());
    }
    lines.extend(entries.iter().map(|entry| format!("  {entry}")));
    lines.push(String::new());
}

fn push_group(lines: &mut Vec<String>, group: &ContentGroup) {
    lines.extend(group.header.lines().map(|line| format!("  {line}")));
    if let Some(sentinel) = &group.none_found {
        lines.push(format!("  {sentinel}"));
    } else {
        if let Some(column_header) = &group.column_header {
            lines.push(format!("    {column_header}"));
        }
        for line in &group.lines {
            if line.occurrences > 1 {
                lines.push(format!("    {} ({} occurrences)", line.text, line.occurrences));
            } else {
                lines.push(format!("    {}", line.text));
            }
        }
    }
    lines.push(String::new());
}

fn push_description(lines: &mut Vec<String>, entities: &[EntityDescription]) {
    let standalone = entities.iter().filter(|entity| entity.dataset.is_none());
    let (tables, features): (Vec<_>, Vec<_>) =
        standalone.partition(|entity| entity.kind == EntityKind::Table);

    lines.push("Tables: ".to_string());
    for entity in tables {
        push_entity(lines, entity);
    }
    if !features.is_empty() {
        lines.push("Feature classes: ".to_string());
        for entity in features {
            push_entity(lines, entity);
        }
    }

    let mut datasets: BTreeMap<&str, Vec<&EntityDescription>> = BTreeMap::new();
    for entity in entities {
        if let Some(dataset) = entity.dataset.as_deref() {
            datasets.entry(dataset).or_default().push(entity);
        }
    }
    for (dataset, members) in datasets {
        lines.push(format!("Feature data set: {dataset}"));
        for entity in members {
            push_entity(lines, entity);
        }
    }
}

fn push_entity(lines: &mut Vec<String>, entity: &EntityDescription) {
    let count = entity
        .row_count
        .map(|count| count.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    lines.push(format!("    {}, {} records", entity.name, count));
    for field in &entity.fields {
        let length = field
            .length
            .map(|length| format!(":{length}"))
            .unwrap_or_default();
        lines.push(format!(
            "      {} {}{}  {}",
            field.name, field.field_type, length, field.nullability
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdbcheck_core::{FieldType, LiveEntity, LiveField, ncgmp09_registry};

    fn inventory() -> StoreInventory {
        StoreInventory::new(
            "memory",
            "quad",
            vec![
                LiveEntity {
                    name: "MapUnitPolys".to_string(),
                    kind: EntityKind::PolygonCollection,
                    dataset: Some("GeologicMap".to_string()),
                    row_count: Some(3),
                    fields: vec![LiveField {
                        name: "MapUnit".to_string(),
                        field_type: FieldType::Text,
                        length: Some(10),
                        nullable: false,
                    }],
                },
                LiveEntity {
                    name: "Glossary".to_string(),
                    kind: EntityKind::Table,
                    dataset: None,
                    row_count: None,
                    fields: vec![LiveField {
                        name: "OBJECTID".to_string(),
                        field_type: FieldType::ObjectId,
                        length: None,
                        nullable: false,
                    }],
                },
            ],
        )
    }

    fn sample() -> ConformanceReport {
        aggregate(
            &ncgmp09_registry(),
            &inventory(),
            SchemaFindings {
                errors: vec!["Table DataSources is missing".to_string()],
                extensions: Vec::new(),
            },
            vec![
                GroupFindings::new(
                    GroupKind::Pseudonulls,
                    vec!["b".to_string(), "a".to_string(), "b".to_string()],
                ),
                GroupFindings::new(
                    GroupKind::UnitEquivalence,
                    vec!["Tv ".to_string(), "Qal".to_string()],
                )
                .with_column_header("Unit"),
                GroupFindings::new(GroupKind::DuplicateIds, Vec::new()),
            ],
        )
    }

    #[test]
    fn groups_are_ordered_sorted_and_collapsed() {
        let report = sample();
        let kinds: Vec<GroupKind> = report.content.iter().map(|group| group.kind).collect();
        assert_eq!(
            kinds,
            vec![
                GroupKind::DuplicateIds,
                GroupKind::UnitEquivalence,
                GroupKind::Pseudonulls
            ]
        );

        let duplicates = report.group(GroupKind::DuplicateIds).unwrap();
        assert_eq!(duplicates.none_found.as_deref(), Some("No duplicate _IDs"));

        let pseudonulls = report.group(GroupKind::Pseudonulls).unwrap();
        assert_eq!(
            pseudonulls.lines,
            vec![
                ContentLine {
                    text: "a".to_string(),
                    occurrences: 1
                },
                ContentLine {
                    text: "b".to_string(),
                    occurrences: 2
                },
            ]
        );

        let equivalence = report.group(GroupKind::UnitEquivalence).unwrap();
        assert_eq!(equivalence.lines[0].text, "Tv ");
        assert_eq!(report.finding_count(), 4);
    }

    #[test]
    fn description_skips_system_fields() {
        let report = sample();
        let glossary = report
            .description
            .iter()
            .find(|entity| entity.name == "Glossary")
            .unwrap();
        assert!(glossary.fields.is_empty());
    }

    #[test]
    fn renders_sections_in_order() {
        let text = render_report(&sample());
        let expected_order = [
            "Geodatabase quad",
            "SCHEMA ERRORS",
            "  Table DataSources is missing",
            "EXTENSIONS TO SCHEMA, may indicate errors",
            "CONTENT ERRORS",
            "  Duplicate _ID values",
            "  No duplicate _IDs",
            "    Unit",
            "    b (2 occurrences)",
            "GEODATABASE DESCRIPTION",
            "Tables: ",
            "    Glossary, unknown records",
            "Feature data set: GeologicMap",
            "    MapUnitPolys, 3 records",
            "      MapUnit Text:10  NoNulls",
        ];
        let mut from = 0;
        for needle in expected_order {
            let found = text[from..]
                .find(needle)
                .unwrap_or_else(|| panic!("{needle:?} not found after offset {from}"));
            from += found + needle.len();
        }
        assert!(text.contains("  Pseudonulls (value = <space>) commonly result"));
        assert!(text.contains("EXTENSIONS TO SCHEMA, may indicate errors\n  None\n"));
    }
}
