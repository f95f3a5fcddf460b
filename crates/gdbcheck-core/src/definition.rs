//! Built-in NCGMP09 v1.1 geologic-map geodatabase registry.

use std::collections::BTreeMap;

use crate::registry::{
    Conventions, DatasetMatch, DatasetSpec, EntitySpec, FieldRole, FieldSpec, MapUnitCategory,
    Requirement, SchemaRegistry,
};
use crate::types::{EntityKind, FieldType, Nullability};

const DEFAULT_LENGTH: u32 = 255;
const MAP_UNIT_LENGTH: u32 = 10;
const ID_LENGTH: u32 = 50;
const MEMO_LENGTH: u32 = 10_485_760;
const BOOLEAN_LENGTH: u32 = 1;

const NO_NULLS: Nullability = Nullability::Required;
const NULLS_OK: Nullability = Nullability::Optional;

/// Fields whose values must be defined in the glossary.
const GLOSSARY_FIELDS: &[&str] = &[
    "Type",
    "TypeModifier",
    "LocationMethod",
    "Lithology",
    "ProportionTerm",
    "TimeScale",
    "Qualifier",
    "Property",
    "ExistenceConfidence",
    "IdentityConfidence",
    "ScientificConfidence",
    "ParagraphStyle",
    "AgeUnits",
    "GeneralLithology",
    "GeneralLithologyConfidence",
];

/// Fields that cite an entry of the data-sources table.
const DATA_SOURCE_FIELDS: &[&str] = &[
    "DataSourceID",
    "DescriptionSourceID",
    "DefinitionSourceID",
    "LocationSourceID",
    "AnalysisSourceID",
];

fn text(name: &str, nullability: Nullability, length: u32) -> FieldSpec {
    FieldSpec::new(name, FieldType::Text, nullability, length)
}

fn single(name: &str, nullability: Nullability) -> FieldSpec {
    FieldSpec::new(name, FieldType::SinglePrecision, nullability, 4)
}

fn double(name: &str, nullability: Nullability) -> FieldSpec {
    FieldSpec::new(name, FieldType::DoublePrecision, nullability, 8)
}

fn integer(name: &str, nullability: Nullability) -> FieldSpec {
    FieldSpec::new(name, FieldType::Integer, nullability, 4)
}

fn flag(name: &str, nullability: Nullability) -> FieldSpec {
    FieldSpec::new(name, FieldType::SmallInteger, nullability, BOOLEAN_LENGTH)
}

fn entity(
    name: &str,
    kind: EntityKind,
    requirement: Requirement,
    fields: Vec<FieldSpec>,
) -> EntitySpec {
    EntitySpec {
        name: name.to_string(),
        kind,
        requirement,
        fields,
        map_unit_category: None,
    }
}

fn map_unit_poly_fields() -> Vec<FieldSpec> {
    vec![
        text("MapUnit", NO_NULLS, MAP_UNIT_LENGTH),
        text("IdentityConfidence", NO_NULLS, ID_LENGTH),
        text("Label", NULLS_OK, ID_LENGTH),
        text("Symbol", NULLS_OK, DEFAULT_LENGTH),
        text("Notes", NULLS_OK, DEFAULT_LENGTH),
        text("DataSourceID", NO_NULLS, ID_LENGTH),
    ]
}

fn tables() -> Vec<EntitySpec> {
    let mut description = entity(
        "DescriptionOfMapUnits",
        EntityKind::Table,
        Requirement::Required,
        vec![
            text("MapUnit", NULLS_OK, MAP_UNIT_LENGTH),
            text("Label", NULLS_OK, 30),
            text("Name", NULLS_OK, DEFAULT_LENGTH),
            text("FullName", NULLS_OK, DEFAULT_LENGTH),
            text("Age", NULLS_OK, DEFAULT_LENGTH),
            text("Description", NULLS_OK, MEMO_LENGTH),
            text("HierarchyKey", NO_NULLS, DEFAULT_LENGTH),
            text("ParagraphStyle", NO_NULLS, DEFAULT_LENGTH),
            text("AreaFillRGB", NULLS_OK, DEFAULT_LENGTH),
            text("AreaFillPatternDescription", NULLS_OK, DEFAULT_LENGTH),
            text("DescriptionSourceID", NO_NULLS, ID_LENGTH),
            text("GeneralLithologyTerm", NULLS_OK, DEFAULT_LENGTH),
            text("GeneralLithologyConfidence", NULLS_OK, DEFAULT_LENGTH),
        ],
    );
    description.map_unit_category = Some(MapUnitCategory::Description);

    let mut lithology = entity(
        "StandardLithology",
        EntityKind::Table,
        Requirement::Optional,
        vec![
            text("MapUnit", NULLS_OK, MAP_UNIT_LENGTH),
            text("Lithology", NULLS_OK, DEFAULT_LENGTH),
            text("PartType", NULLS_OK, DEFAULT_LENGTH),
            single("ProportionValue", NULLS_OK),
            text("ProportionTerm", NULLS_OK, DEFAULT_LENGTH),
            text("ScientificConfidence", NULLS_OK, DEFAULT_LENGTH),
            text("DataSourceID", NULLS_OK, ID_LENGTH),
        ],
    );
    lithology.map_unit_category = Some(MapUnitCategory::Lithology);

    vec![
        description,
        entity(
            "DataSources",
            EntityKind::Table,
            Requirement::Required,
            vec![
                text("Source", NO_NULLS, DEFAULT_LENGTH),
                text("Notes", NULLS_OK, MEMO_LENGTH),
            ],
        ),
        entity(
            "Glossary",
            EntityKind::Table,
            Requirement::Required,
            vec![
                text("Term", NO_NULLS, DEFAULT_LENGTH),
                text("Definition", NO_NULLS, MEMO_LENGTH),
                text("DefinitionSourceID", NO_NULLS, ID_LENGTH),
            ],
        ),
        entity(
            "SysInfo",
            EntityKind::Table,
            Requirement::Optional,
            vec![
                text("Sub", NULLS_OK, DEFAULT_LENGTH),
                text("Pred", NULLS_OK, DEFAULT_LENGTH),
                text("Obj", NULLS_OK, DEFAULT_LENGTH),
            ],
        ),
        entity(
            "ExtendedAttributes",
            EntityKind::Table,
            Requirement::Optional,
            vec![
                text("OwnerTable", NO_NULLS, DEFAULT_LENGTH),
                text("OwnerID", NO_NULLS, ID_LENGTH),
                text("Property", NO_NULLS, DEFAULT_LENGTH),
                text("PropertyValue", NULLS_OK, DEFAULT_LENGTH),
                text("ValueLinkID", NULLS_OK, ID_LENGTH),
                text("Qualifier", NULLS_OK, DEFAULT_LENGTH),
                text("DataSourceID", NULLS_OK, ID_LENGTH),
                text("Notes", NULLS_OK, MEMO_LENGTH),
            ],
        ),
        entity(
            "GeologicEvents",
            EntityKind::Table,
            Requirement::Optional,
            vec![
                text("Event", NULLS_OK, DEFAULT_LENGTH),
                text("AgeDisplay", NULLS_OK, DEFAULT_LENGTH),
                text("AgeYoungerTerm", NULLS_OK, DEFAULT_LENGTH),
                text("AgeOlderTerm", NULLS_OK, DEFAULT_LENGTH),
                text("TimeScale", NULLS_OK, DEFAULT_LENGTH),
                single("AgeYoungerValue", NULLS_OK),
                single("AgeOlderValue", NULLS_OK),
                text("Notes", NULLS_OK, MEMO_LENGTH),
                text("DataSourceID", NULLS_OK, ID_LENGTH),
            ],
        ),
        lithology,
    ]
}

fn feature_classes() -> Vec<EntitySpec> {
    let line_fields = |label_length: u32| {
        vec![
            text("Type", NO_NULLS, DEFAULT_LENGTH),
            text("ExistenceConfidence", NO_NULLS, ID_LENGTH),
            text("IdentityConfidence", NO_NULLS, ID_LENGTH),
            single("LocationConfidenceMeters", NO_NULLS),
            text("Label", NULLS_OK, label_length),
            text("DataSourceID", NO_NULLS, ID_LENGTH),
            text("Notes", NULLS_OK, MEMO_LENGTH),
        ]
    };

    let mut contacts = line_fields(ID_LENGTH);
    contacts.insert(1, flag("IsConcealed", NULLS_OK));

    vec![
        entity(
            "ContactsAndFaults",
            EntityKind::LineCollection,
            Requirement::Optional,
            contacts,
        ),
        entity(
            "DataSourcePolys",
            EntityKind::PolygonCollection,
            Requirement::Optional,
            vec![
                text("Notes", NULLS_OK, MEMO_LENGTH),
                text("DataSourceID", NO_NULLS, ID_LENGTH),
            ],
        ),
        entity(
            "MapUnitPolys",
            EntityKind::PolygonCollection,
            Requirement::Optional,
            map_unit_poly_fields(),
        ),
        entity(
            "MapUnitPoints",
            EntityKind::PointCollection,
            Requirement::Optional,
            map_unit_poly_fields(),
        ),
        entity(
            "OtherLines",
            EntityKind::LineCollection,
            Requirement::Optional,
            line_fields(ID_LENGTH),
        ),
        entity(
            "CartographicLines",
            EntityKind::LineCollection,
            Requirement::Optional,
            vec![
                text("Type", NULLS_OK, DEFAULT_LENGTH),
                text("Symbol", NULLS_OK, DEFAULT_LENGTH),
                text("Label", NULLS_OK, DEFAULT_LENGTH),
                text("DataSourceID", NULLS_OK, ID_LENGTH),
                text("Notes", NULLS_OK, MEMO_LENGTH),
            ],
        ),
        entity(
            "OverlayPolys",
            EntityKind::PolygonCollection,
            Requirement::Optional,
            vec![
                text("IdentityConfidence", NO_NULLS, ID_LENGTH),
                text("Symbol", NULLS_OK, DEFAULT_LENGTH),
                text("Label", NULLS_OK, ID_LENGTH),
                text("Notes", NULLS_OK, MEMO_LENGTH),
                text("DataSourceID", NO_NULLS, ID_LENGTH),
                text("MapUnit", NO_NULLS, MAP_UNIT_LENGTH),
            ],
        ),
        entity(
            "StationPoints",
            EntityKind::PointCollection,
            Requirement::Optional,
            vec![
                text("FieldID", NULLS_OK, DEFAULT_LENGTH),
                text("Symbol", NULLS_OK, DEFAULT_LENGTH),
                text("Label", NULLS_OK, DEFAULT_LENGTH),
                integer("PlotAtScale", NULLS_OK),
                double("LocationConfidenceMeters", NULLS_OK),
                text("LocationMethod", NULLS_OK, DEFAULT_LENGTH),
                double("Latitude", NULLS_OK),
                double("Longitude", NULLS_OK),
                text("DataSourceID", NULLS_OK, ID_LENGTH),
            ],
        ),
        entity(
            "SamplePoints",
            EntityKind::PointCollection,
            Requirement::Optional,
            vec![
                text("FieldID", NULLS_OK, DEFAULT_LENGTH),
                text("StationID", NO_NULLS, ID_LENGTH),
                text("Symbol", NULLS_OK, DEFAULT_LENGTH),
                text("Label", NULLS_OK, DEFAULT_LENGTH),
                integer("PlotAtScale", NULLS_OK),
                double("LocationConfidenceMeters", NULLS_OK),
                text("DataSourceID", NULLS_OK, ID_LENGTH),
                text("Notes", NULLS_OK, MEMO_LENGTH),
            ],
        ),
        entity(
            "OrientationDataPoints",
            EntityKind::PointCollection,
            Requirement::Optional,
            vec![
                text("Type", NULLS_OK, DEFAULT_LENGTH),
                text("StationID", NO_NULLS, ID_LENGTH),
                text("Label", NULLS_OK, DEFAULT_LENGTH),
                integer("PlotAtScale", NULLS_OK),
                double("Azimuth", NULLS_OK),
                double("Inclination", NULLS_OK),
                text("IdentityConfidence", NULLS_OK, DEFAULT_LENGTH),
                double("OrientationConfidenceDegrees", NULLS_OK),
                text("DataSourceID", NULLS_OK, ID_LENGTH),
                text("Notes", NULLS_OK, MEMO_LENGTH),
                double("SymbolRotation", NULLS_OK),
            ],
        ),
    ]
}

fn map_members(members: &[(&str, MapUnitCategory)]) -> BTreeMap<String, MapUnitCategory> {
    members
        .iter()
        .map(|(name, category)| (name.to_string(), *category))
        .collect()
}

fn datasets() -> Vec<DatasetSpec> {
    let map_members_required = vec![
        "ContactsAndFaults".to_string(),
        "MapUnitPolys".to_string(),
        "DataSourcePolys".to_string(),
    ];

    vec![
        DatasetSpec {
            name: "GeologicMap".to_string(),
            matching: DatasetMatch::Exact,
            requirement: Requirement::Required,
            member_prefix: String::new(),
            required_members: map_members_required.clone(),
            map_unit_members: map_members(&[("MapUnitPolys", MapUnitCategory::Map)]),
        },
        DatasetSpec {
            name: "CorrelationOfMapUnits".to_string(),
            matching: DatasetMatch::Exact,
            requirement: Requirement::Optional,
            member_prefix: String::new(),
            required_members: vec![
                "CMULines".to_string(),
                "CMUMapUnitPolys".to_string(),
                "CMUText".to_string(),
            ],
            map_unit_members: map_members(&[
                ("CMUMapUnitPolys", MapUnitCategory::Correlation),
                ("CMUMapUnitPoints", MapUnitCategory::Correlation),
            ]),
        },
        DatasetSpec {
            name: "CrossSection".to_string(),
            matching: DatasetMatch::Prefix,
            requirement: Requirement::Optional,
            member_prefix: "CS".to_string(),
            required_members: map_members_required,
            map_unit_members: map_members(&[("MapUnitPolys", MapUnitCategory::CrossSection)]),
        },
        DatasetSpec {
            name: "StationData".to_string(),
            matching: DatasetMatch::Exact,
            requirement: Requirement::Optional,
            member_prefix: String::new(),
            required_members: Vec::new(),
            map_unit_members: BTreeMap::new(),
        },
    ]
}

fn field_roles() -> BTreeMap<String, FieldRole> {
    let mut roles = BTreeMap::new();
    for name in GLOSSARY_FIELDS {
        roles.insert(name.to_string(), FieldRole::GlossaryTerm);
    }
    for name in DATA_SOURCE_FIELDS {
        roles.insert(name.to_string(), FieldRole::DataSourceRef);
    }
    roles.insert("MapUnit".to_string(), FieldRole::MapUnit);
    roles
}

/// The NCGMP09 v1.1 schema as a registry.
pub fn ncgmp09_registry() -> SchemaRegistry {
    let mut entities = tables();
    entities.extend(feature_classes());

    SchemaRegistry {
        name: "NCGMP09".to_string(),
        version: "v1.1".to_string(),
        conventions: Conventions::default(),
        field_roles: field_roles(),
        entities,
        datasets: datasets(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_registry;

    #[test]
    fn builtin_registry_is_consistent() {
        validate_registry(&ncgmp09_registry()).expect("built-in registry is valid");
    }

    #[test]
    fn required_tables_are_declared() {
        let registry = ncgmp09_registry();
        let required: Vec<&str> = registry
            .entities
            .iter()
            .filter(|entity| entity.requirement == Requirement::Required)
            .map(|entity| entity.name.as_str())
            .collect();
        assert_eq!(
            required,
            vec!["DescriptionOfMapUnits", "DataSources", "Glossary"]
        );
    }

    #[test]
    fn contacts_declare_concealment_flag_after_type() {
        let registry = ncgmp09_registry();
        let contacts = registry.entity("ContactsAndFaults").unwrap();
        assert_eq!(contacts.fields[0].name, "Type");
        assert_eq!(contacts.fields[1].name, "IsConcealed");
        assert_eq!(contacts.fields[1].field_type, FieldType::SmallInteger);
    }
}
