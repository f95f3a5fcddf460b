use std::collections::BTreeSet;

use gdbcheck_core::{
    EntityKind, LiveEntity, Nullability, Requirement, SchemaRegistry, StoreInventory,
};

/// Schema errors and extensions found by diffing an inventory against a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaFindings {
    pub errors: Vec<String>,
    pub extensions: Vec<String>,
}

/// Compare a store inventory with the registry.
///
/// Required structure is checked first, then every live entity in
/// inventory order.
pub fn check_conformance(
    registry: &SchemaRegistry,
    inventory: &StoreInventory,
) -> SchemaFindings {
    let mut findings = SchemaFindings::default();
    check_required_elements(registry, inventory, &mut findings);

    let mut unknown_datasets = BTreeSet::new();
    for entity in &inventory.entities {
        if let Some(dataset) = entity.dataset.as_deref() {
            if registry.dataset(dataset).is_none() && unknown_datasets.insert(dataset) {
                findings
                    .extensions
                    .push(format!("Feature dataset {dataset} is not required"));
            }
        }
        check_entity(registry, entity, inventory.is_unlisted(&entity.name), &mut findings);
    }

    tracing::info!(
        event = "conformance_checked",
        errors = findings.errors.len(),
        extensions = findings.extensions.len()
    );
    findings
}

fn check_required_elements(
    registry: &SchemaRegistry,
    inventory: &StoreInventory,
    findings: &mut SchemaFindings,
) {
    for spec in &registry.entities {
        if spec.requirement == Requirement::Required && !inventory.contains(&spec.name) {
            findings
                .errors
                .push(format!("{} {} is missing", spec.kind.label(), spec.name));
        }
    }

    let live_datasets = inventory.datasets();
    for spec in &registry.datasets {
        let present = live_datasets.keys().any(|name| spec.matches(name));
        if spec.requirement == Requirement::Required && !present {
            findings
                .errors
                .push(format!("Feature data set {} is missing", spec.name));
        }
    }

    for (dataset, members) in &live_datasets {
        let Some(spec) = registry.dataset(dataset) else {
            continue;
        };
        let Some(prefix) = spec.member_prefix_for(dataset) else {
            continue;
        };
        for member in &spec.required_members {
            let name = format!("{prefix}{member}");
            if !members.iter().any(|entity| entity.name == name) {
                findings.errors.push(format!(
                    "Feature data set {dataset}, feature class {name} is missing"
                ));
            }
        }
    }
}

/// Field checks are skipped for an `unlisted` entity; its fields are unknown.
fn check_entity(
    registry: &SchemaRegistry,
    entity: &LiveEntity,
    unlisted: bool,
    findings: &mut SchemaFindings,
) {
    let resolution = registry.resolve(&entity.handle());
    let Some(spec) = resolution.spec else {
        findings.extensions.push(format!(
            "{} {} is not required",
            entity.kind.label(),
            entity.name
        ));
        return;
    };

    let unknown_geometry =
        entity.kind == EntityKind::GenericCollection && spec.kind.is_feature_class();
    if entity.kind != spec.kind && !unknown_geometry {
        findings.errors.push(format!(
            "{} should be a {}",
            entity.name,
            spec.kind.describe()
        ));
    }

    if unlisted {
        return;
    }

    let expected = registry.expected_fields(&entity.name, spec);
    for field in &expected {
        if !entity.has_field(&field.name) {
            findings
                .errors
                .push(format!("{}, field {} is missing", entity.name, field.name));
        }
    }

    for live in &entity.fields {
        let Some(declared) = expected.iter().find(|field| field.name == live.name) else {
            if !registry.is_system_field(&live.name) {
                findings.extensions.push(format!(
                    "{}, field {} is not required",
                    entity.name, live.name
                ));
            }
            continue;
        };

        if live.field_type != declared.field_type {
            findings.errors.push(format!(
                "{}, field {}, type should be {}",
                entity.name, live.name, declared.field_type
            ));
        }
        if Nullability::from_nullable(live.nullable) != declared.nullability {
            findings.errors.push(format!(
                "{}, field {} should be {}",
                entity.name, live.name, declared.nullability
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdbcheck_core::{
        EntitySpec, FieldSpec, FieldType, ListingFailure, LiveField, ncgmp09_registry,
    };

    fn field(name: &str, field_type: FieldType, nullable: bool) -> LiveField {
        LiveField {
            name: name.to_string(),
            field_type,
            length: None,
            nullable,
        }
    }

    fn live(
        name: &str,
        kind: EntityKind,
        dataset: Option<&str>,
        fields: Vec<LiveField>,
    ) -> LiveEntity {
        LiveEntity {
            name: name.to_string(),
            kind,
            dataset: dataset.map(str::to_string),
            row_count: Some(0),
            fields,
        }
    }

    fn single_table_registry() -> SchemaRegistry {
        let mut registry = ncgmp09_registry();
        registry.datasets.clear();
        registry.entities = vec![EntitySpec {
            name: "T".to_string(),
            kind: EntityKind::Table,
            requirement: Requirement::Required,
            fields: vec![FieldSpec::new("F", FieldType::Text, Nullability::Optional, 255)],
            map_unit_category: None,
        }];
        registry
    }

    #[test]
    fn reports_missing_field() {
        let registry = single_table_registry();
        let inventory = StoreInventory::new(
            "memory",
            "s",
            vec![live(
                "T",
                EntityKind::Table,
                None,
                vec![field("T_ID", FieldType::Text, false)],
            )],
        );
        let findings = check_conformance(&registry, &inventory);
        assert_eq!(findings.errors, vec!["T, field F is missing".to_string()]);
        assert!(findings.extensions.is_empty());
    }

    #[test]
    fn unlisted_entity_skips_field_checks() {
        let registry = single_table_registry();
        let inventory = StoreInventory::new(
            "memory",
            "s",
            vec![live("T", EntityKind::Table, None, Vec::new())],
        )
        .with_listing_failures(vec![ListingFailure {
            entity: "T".to_string(),
            message: "permission denied".to_string(),
        }]);

        let findings = check_conformance(&registry, &inventory);
        assert!(findings.errors.is_empty());
        assert!(findings.extensions.is_empty());
    }

    #[test]
    fn reports_type_and_nullability_drift_and_extensions() {
        let registry = single_table_registry();
        let inventory = StoreInventory::new(
            "memory",
            "s",
            vec![
                live(
                    "T",
                    EntityKind::Table,
                    None,
                    vec![
                        field("OBJECTID", FieldType::ObjectId, false),
                        field("T_ID", FieldType::Text, true),
                        field("F", FieldType::Integer, true),
                        field("Extra", FieldType::Text, true),
                    ],
                ),
                live("Local", EntityKind::Table, None, Vec::new()),
            ],
        );
        let findings = check_conformance(&registry, &inventory);
        assert_eq!(
            findings.errors,
            vec![
                "T, field T_ID should be NoNulls".to_string(),
                "T, field F, type should be Text".to_string(),
            ]
        );
        assert_eq!(
            findings.extensions,
            vec![
                "Table Local is not required".to_string(),
                "T, field Extra is not required".to_string(),
            ]
        );
    }

    #[test]
    fn checks_required_dataset_members_with_prefix() {
        let registry = ncgmp09_registry();
        let inventory = StoreInventory::new(
            "memory",
            "s",
            vec![
                live(
                    "CSAContactsAndFaults",
                    EntityKind::LineCollection,
                    Some("CrossSectionA"),
                    Vec::new(),
                ),
                live("Odd", EntityKind::PointCollection, Some("Scratch"), Vec::new()),
            ],
        );
        let findings = check_conformance(&registry, &inventory);

        for expected in [
            "Table DescriptionOfMapUnits is missing",
            "Table DataSources is missing",
            "Table Glossary is missing",
            "Feature data set GeologicMap is missing",
            "Feature data set CrossSectionA, feature class CSAMapUnitPolys is missing",
            "Feature data set CrossSectionA, feature class CSADataSourcePolys is missing",
            "CSAContactsAndFaults, field CSAContactsAndFaults_ID is missing",
        ] {
            assert!(
                findings.errors.iter().any(|line| line == expected),
                "missing {expected:?} in {:?}",
                findings.errors
            );
        }
        assert!(
            !findings
                .errors
                .iter()
                .any(|line| line.contains("CSAContactsAndFaults is missing"))
        );
        assert!(
            findings
                .extensions
                .contains(&"Feature dataset Scratch is not required".to_string())
        );
        assert!(
            findings
                .extensions
                .contains(&"Feature class Odd is not required".to_string())
        );
    }

    #[test]
    fn flags_geometry_kind_mismatch() {
        let registry = ncgmp09_registry();
        let inventory = StoreInventory::new(
            "memory",
            "s",
            vec![live(
                "MapUnitPolys",
                EntityKind::PointCollection,
                Some("GeologicMap"),
                Vec::new(),
            )],
        );
        let findings = check_conformance(&registry, &inventory);
        assert!(
            findings
                .errors
                .contains(&"MapUnitPolys should be a polygon feature class".to_string())
        );
    }
}
