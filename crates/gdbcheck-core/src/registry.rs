use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::inventory::EntityHandle;
use crate::types::{EntityKind, FieldType, Nullability};

/// Role a field plays in cross-reference indexing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldRole {
    #[default]
    Plain,
    /// Values must be defined as terms in the glossary.
    GlossaryTerm,
    /// Values must resolve to data-source identifiers.
    DataSourceRef,
    /// Values are map-unit codes.
    MapUnit,
}

impl FieldRole {
    pub fn is_plain(&self) -> bool {
        matches!(self, FieldRole::Plain)
    }
}

/// Declared field of a registry entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
    pub nullability: Nullability,
    /// Suggested storage length (characters for text, bytes otherwise).
    pub length: u32,
    #[serde(default, skip_serializing_if = "FieldRole::is_plain")]
    pub role: FieldRole,
}

impl FieldSpec {
    pub fn new(
        name: impl Into<String>,
        field_type: FieldType,
        nullability: Nullability,
        length: u32,
    ) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullability,
            length,
            role: FieldRole::Plain,
        }
    }

    pub fn with_role(mut self, role: FieldRole) -> Self {
        self.role = role;
        self
    }
}

/// Whether an entity or dataset must be present in every store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    Required,
    #[default]
    Optional,
}

/// Origin category of a map-unit observation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum MapUnitCategory {
    /// Plan-view map layer.
    Map,
    /// Description-of-map-units table.
    Description,
    /// Correlation diagram.
    Correlation,
    /// Cross-section layer.
    CrossSection,
    /// Standard-lithology summary table.
    Lithology,
}

impl MapUnitCategory {
    /// Columns of the map-unit equivalence table, in order.
    pub const EQUIVALENCE: [MapUnitCategory; 4] = [
        MapUnitCategory::Map,
        MapUnitCategory::Description,
        MapUnitCategory::Correlation,
        MapUnitCategory::CrossSection,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MapUnitCategory::Map => "Map",
            MapUnitCategory::Description => "DMU",
            MapUnitCategory::Correlation => "CMU",
            MapUnitCategory::CrossSection => "XS",
            MapUnitCategory::Lithology => "Lithology",
        }
    }

    /// Whether observations of this category count as map-unit references.
    ///
    /// Description and lithology tables define units; everything else cites them.
    pub fn is_reference(self) -> bool {
        !matches!(
            self,
            MapUnitCategory::Description | MapUnitCategory::Lithology
        )
    }
}

/// Declared table or feature class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EntitySpec {
    pub name: String,
    pub kind: EntityKind,
    #[serde(default)]
    pub requirement: Requirement,
    /// Declared fields, excluding the implicit `<Entity>_ID` field.
    pub fields: Vec<FieldSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_unit_category: Option<MapUnitCategory>,
}

impl EntitySpec {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// How a dataset spec matches live feature dataset names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DatasetMatch {
    #[default]
    Exact,
    /// Matches any dataset whose name starts with the spec name; the rest of
    /// the name is the dataset suffix (e.g. `A` in `CrossSectionA`).
    Prefix,
}

/// Structural rules for a feature dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DatasetSpec {
    pub name: String,
    #[serde(default)]
    pub matching: DatasetMatch,
    #[serde(default)]
    pub requirement: Requirement,
    /// Prefix of member feature class names. Prefix datasets append their
    /// suffix, so `CS` in dataset `CrossSectionA` becomes `CSA`.
    #[serde(default)]
    pub member_prefix: String,
    /// Member names (without prefix) that must exist in the dataset.
    #[serde(default)]
    pub required_members: Vec<String>,
    /// Members (without prefix) whose map units belong to a category.
    #[serde(default)]
    pub map_unit_members: BTreeMap<String, MapUnitCategory>,
}

impl DatasetSpec {
    pub fn matches(&self, dataset: &str) -> bool {
        match self.matching {
            DatasetMatch::Exact => dataset == self.name,
            DatasetMatch::Prefix => dataset.starts_with(&self.name),
        }
    }

    /// Member name prefix for a matching live dataset.
    pub fn member_prefix_for(&self, dataset: &str) -> Option<String> {
        if !self.matches(dataset) {
            return None;
        }
        match self.matching {
            DatasetMatch::Exact => Some(self.member_prefix.clone()),
            DatasetMatch::Prefix => Some(format!(
                "{}{}",
                self.member_prefix,
                &dataset[self.name.len()..]
            )),
        }
    }
}

/// Names the analyzers rely on. Declared here so nothing in the engine
/// hard-codes a table or field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Conventions {
    pub identifier_suffix: String,
    pub identifier_length: u32,
    pub object_id_field: String,
    /// Driver-managed fields that are never reported as extensions.
    pub system_fields: Vec<String>,
    pub map_unit_field: String,
    pub data_sources: String,
    pub glossary: String,
    pub glossary_term_field: String,
    pub description_of_units: String,
    pub hierarchy_key_field: String,
    /// Segment width of hierarchy keys. When absent the most common observed
    /// width is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hierarchy_key_width: Option<usize>,
    pub standard_lithology: String,
    pub extended_attributes: String,
    pub owner_link_field: String,
    pub value_link_field: String,
    pub geologic_events: String,
    /// Glossary terms at or beyond this length are truncated in the report.
    pub term_display_limit: usize,
}

impl Default for Conventions {
    fn default() -> Self {
        let system_fields = [
            "OBJECTID",
            "SHAPE",
            "Shape",
            "SHAPE_Length",
            "SHAPE_Area",
            "Shape_Length",
            "Shape_Area",
            "ZOrder",
            "AnnotationClassID",
            "Status",
            "TextString",
            "FontName",
            "FontSize",
            "Bold",
            "Italic",
            "Underline",
            "VerticalAlignment",
            "HorizontalAlignment",
            "XOffset",
            "YOffset",
            "Angle",
            "FontLeading",
            "WordSpacing",
            "CharacterWidth",
            "CharacterSpacing",
            "FlipAngle",
            "Override",
        ];

        Self {
            identifier_suffix: "_ID".to_string(),
            identifier_length: 50,
            object_id_field: "OBJECTID".to_string(),
            system_fields: system_fields.iter().map(|name| name.to_string()).collect(),
            map_unit_field: "MapUnit".to_string(),
            data_sources: "DataSources".to_string(),
            glossary: "Glossary".to_string(),
            glossary_term_field: "Term".to_string(),
            description_of_units: "DescriptionOfMapUnits".to_string(),
            hierarchy_key_field: "HierarchyKey".to_string(),
            hierarchy_key_width: None,
            standard_lithology: "StandardLithology".to_string(),
            extended_attributes: "ExtendedAttributes".to_string(),
            owner_link_field: "OwnerID".to_string(),
            value_link_field: "ValueLinkID".to_string(),
            geologic_events: "GeologicEvents".to_string(),
            term_display_limit: 40,
        }
    }
}

/// Declarative schema every store is checked against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SchemaRegistry {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub conventions: Conventions,
    /// Store-wide role tags by field name. Applied to every field whose
    /// entity spec does not give it a role of its own, including fields of
    /// undeclared entities.
    #[serde(default)]
    pub field_roles: BTreeMap<String, FieldRole>,
    pub entities: Vec<EntitySpec>,
    #[serde(default)]
    pub datasets: Vec<DatasetSpec>,
}

/// Registry view of one live entity.
#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    /// Registry name the entity resolved to (prefix stripped for dataset members).
    pub spec_name: String,
    pub spec: Option<&'a EntitySpec>,
    pub dataset: Option<&'a DatasetSpec>,
    pub category: Option<MapUnitCategory>,
}

impl SchemaRegistry {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.name, self.version)
    }

    pub fn entity(&self, name: &str) -> Option<&EntitySpec> {
        self.entities.iter().find(|entity| entity.name == name)
    }

    /// First dataset spec matching a live dataset name.
    pub fn dataset(&self, dataset: &str) -> Option<&DatasetSpec> {
        self.datasets.iter().find(|spec| spec.matches(dataset))
    }

    /// Resolve a live entity to its registry spec and map-unit category.
    pub fn resolve(&self, handle: &EntityHandle) -> Resolution<'_> {
        let dataset = handle
            .dataset
            .as_deref()
            .and_then(|name| self.dataset(name).map(|spec| (name, spec)));

        let spec_name = dataset
            .and_then(|(name, spec)| spec.member_prefix_for(name))
            .and_then(|prefix| handle.name.strip_prefix(prefix.as_str()).map(str::to_string))
            .filter(|stripped| !stripped.is_empty())
            .unwrap_or_else(|| handle.name.clone());

        let spec = self.entity(&spec_name);
        let category = dataset
            .and_then(|(_, dataset)| dataset.map_unit_members.get(&spec_name).copied())
            .or_else(|| spec.and_then(|spec| spec.map_unit_category));

        Resolution {
            spec_name,
            spec,
            dataset: dataset.map(|(_, spec)| spec),
            category,
        }
    }

    /// Name of the primary identifier field of a live entity.
    pub fn identifier_field(&self, entity: &str) -> String {
        format!("{entity}{}", self.conventions.identifier_suffix)
    }

    /// Declared fields of a spec as seen on a live entity, identifier first.
    pub fn expected_fields(&self, live_name: &str, spec: &EntitySpec) -> Vec<FieldSpec> {
        let mut fields = Vec::with_capacity(spec.fields.len() + 1);
        fields.push(FieldSpec::new(
            self.identifier_field(live_name),
            FieldType::Text,
            Nullability::Required,
            self.conventions.identifier_length,
        ));
        fields.extend(spec.fields.iter().cloned());
        fields
    }

    /// Role of a field, preferring the entity's own declaration.
    pub fn role_of(&self, spec: Option<&EntitySpec>, field: &str) -> FieldRole {
        spec.and_then(|spec| spec.field(field))
            .map(|field| field.role)
            .filter(|role| !role.is_plain())
            .or_else(|| self.field_roles.get(field).copied())
            .unwrap_or_default()
    }

    pub fn is_system_field(&self, field: &str) -> bool {
        self.conventions
            .system_fields
            .iter()
            .any(|name| name == field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ncgmp09_registry;

    fn handle(name: &str, dataset: Option<&str>) -> EntityHandle {
        EntityHandle {
            name: name.to_string(),
            kind: EntityKind::PolygonCollection,
            dataset: dataset.map(str::to_string),
        }
    }

    #[test]
    fn cross_section_members_resolve_to_base_spec() {
        let registry = ncgmp09_registry();
        let resolved = registry.resolve(&handle("CSAMapUnitPolys", Some("CrossSectionA")));
        assert_eq!(resolved.spec_name, "MapUnitPolys");
        assert!(resolved.spec.is_some());
        assert_eq!(resolved.category, Some(MapUnitCategory::CrossSection));
    }

    #[test]
    fn map_layer_category_comes_from_dataset() {
        let registry = ncgmp09_registry();
        let in_map = registry.resolve(&handle("MapUnitPolys", Some("GeologicMap")));
        assert_eq!(in_map.category, Some(MapUnitCategory::Map));

        let standalone = registry.resolve(&handle("MapUnitPolys", None));
        assert_eq!(standalone.category, None);
    }

    #[test]
    fn undeclared_fields_fall_back_to_store_wide_roles() {
        let registry = ncgmp09_registry();
        assert_eq!(registry.role_of(None, "DataSourceID"), FieldRole::DataSourceRef);
        assert_eq!(registry.role_of(None, "Type"), FieldRole::GlossaryTerm);
        assert_eq!(registry.role_of(None, "Notes"), FieldRole::Plain);
    }

    #[test]
    fn expected_fields_start_with_identifier() {
        let registry = ncgmp09_registry();
        let spec = registry.entity("MapUnitPolys").unwrap();
        let fields = registry.expected_fields("CSAMapUnitPolys", spec);
        assert_eq!(fields[0].name, "CSAMapUnitPolys_ID");
        assert_eq!(fields[0].nullability, Nullability::Required);
        assert_eq!(fields.len(), spec.fields.len() + 1);
    }
}
