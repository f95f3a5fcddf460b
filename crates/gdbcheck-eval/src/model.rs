use std::time::Duration;

use serde::{Deserialize, Serialize};

use gdbcheck_core::{EntityKind, FieldType, Nullability};

/// Options for a validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateOptions {
    /// Deadline for scanning the rows of a single entity.
    pub scan_timeout: Duration,
    /// Overrides the registry's hierarchy-key segment width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hierarchy_key_width: Option<usize>,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            scan_timeout: Duration::from_secs(300),
            hierarchy_key_width: None,
        }
    }
}

/// Content-error groups, declared in report order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    DuplicateIds,
    MissingDataSources,
    UnusedDataSources,
    MissingDescriptionUnits,
    UnitEquivalence,
    MissingLithologyUnits,
    UnreferencedLithologyUnits,
    UnreferencedDescriptionUnits,
    MissingGlossaryTerms,
    UnusedGlossaryTerms,
    UnresolvedLinks,
    UnusedEvents,
    HierarchyKeyFormat,
    Pseudonulls,
    UnreadableEntities,
}

impl GroupKind {
    pub fn header(self) -> &'static str {
        match self {
            GroupKind::DuplicateIds => "Duplicate _ID values",
            GroupKind::MissingDataSources => {
                "Missing DataSources entries. Only one reference to each missing source is cited"
            }
            GroupKind::UnusedDataSources => {
                "Entries in DataSources that are not otherwise referenced in database"
            }
            GroupKind::MissingDescriptionUnits => {
                "MapUnits missing from DMU. Only one reference to each missing unit is cited"
            }
            GroupKind::UnitEquivalence => "Units present in map, DMU, CMU, and cross sections",
            GroupKind::MissingLithologyUnits => {
                "MapUnits missing from StandardLithology. Only one reference to each missing unit is cited"
            }
            GroupKind::UnreferencedLithologyUnits => {
                "MapUnits in StandardLithology that are not present on map"
            }
            GroupKind::UnreferencedDescriptionUnits => {
                "MapUnits in DMU that are not present on map or in CMU"
            }
            GroupKind::MissingGlossaryTerms => {
                "Missing terms in Glossary. Only one reference to each missing term is cited"
            }
            GroupKind::UnusedGlossaryTerms => {
                "Terms in Glossary that are not otherwise used in geodatabase"
            }
            GroupKind::UnresolvedLinks => {
                "OwnerIDs and ValueLinkIDs in ExtendedAttributes that are absent elsewhere in the database"
            }
            GroupKind::UnusedEvents => {
                "Events in GeologicEvents that are not cited in ExtendedAttributes"
            }
            GroupKind::HierarchyKeyFormat => "HierarchyKey errors, DescriptionOfMapUnits",
            GroupKind::Pseudonulls => concat!(
                "Pseudonulls (value = <space>) commonly result from loading empty data into\n",
                "string fields in which nulls are not allowed. Trailing spaces are commonly\n",
                "produced by hand-correction of pseudonulls. The following fields contain\n",
                "pseudonulls or trailing spaces"
            ),
            GroupKind::UnreadableEntities => "Tables and feature classes that could not be read",
        }
    }

    /// Line rendered in place of the group when it has no findings.
    pub fn sentinel(self) -> &'static str {
        match self {
            GroupKind::DuplicateIds => "No duplicate _IDs",
            GroupKind::MissingDataSources => "No missing entries in DataSources",
            GroupKind::UnusedDataSources => "No unreferenced entries in DataSources",
            GroupKind::MissingDescriptionUnits => "No missing MapUnits in DescriptionOfMapUnits",
            GroupKind::UnitEquivalence => "CMU matches DMU matches units on map",
            GroupKind::MissingLithologyUnits => "No missing MapUnits in StandardLithology",
            GroupKind::UnreferencedLithologyUnits => {
                "No unreferenced MapUnits in StandardLithology"
            }
            GroupKind::UnreferencedDescriptionUnits => {
                "No unreferenced MapUnits in Description of MapUnits"
            }
            GroupKind::MissingGlossaryTerms => "No missing terms in Glossary",
            GroupKind::UnusedGlossaryTerms => "No unreferenced terms in Glossary",
            GroupKind::UnresolvedLinks => {
                "No rows in ExtendedAttributes that reference nonexistent OwnerIDs or ValueLinkIDs"
            }
            GroupKind::UnusedEvents => "No rows in GeologicEvents not referenced in ExtendedAttributes",
            GroupKind::HierarchyKeyFormat => "No format errors in HierarchyKeys",
            GroupKind::Pseudonulls => "No pseudonulls or trailing spaces",
            GroupKind::UnreadableEntities => "All tables and feature classes were read",
        }
    }
}

/// Raw output of an analyzer for one group, before aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupFindings {
    pub kind: GroupKind,
    pub column_header: Option<String>,
    pub lines: Vec<String>,
}

impl GroupFindings {
    pub fn new(kind: GroupKind, lines: Vec<String>) -> Self {
        Self {
            kind,
            column_header: None,
            lines,
        }
    }

    pub fn with_column_header(mut self, header: impl Into<String>) -> Self {
        self.column_header = Some(header.into());
        self
    }
}

/// One distinct detail line of a content group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentLine {
    pub text: String,
    /// Number of identical findings collapsed into this line.
    pub occurrences: usize,
}

/// A named content-error group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentGroup {
    pub kind: GroupKind,
    pub header: String,
    /// Fixed first line of tabular groups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_header: Option<String>,
    pub lines: Vec<ContentLine>,
    /// Present when `lines` is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub none_found: Option<String>,
}

/// Inventory listing of one field, system fields excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescription {
    pub name: String,
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    pub nullability: Nullability,
}

/// Inventory listing of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescription {
    pub name: String,
    pub kind: EntityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    pub row_count: Option<u64>,
    pub fields: Vec<FieldDescription>,
}

/// Result of a validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConformanceReport {
    pub report_version: String,
    pub store: String,
    pub engine: String,
    pub registry: String,
    pub schema_errors: Vec<String>,
    pub schema_extensions: Vec<String>,
    pub content: Vec<ContentGroup>,
    pub description: Vec<EntityDescription>,
}

impl ConformanceReport {
    pub fn group(&self, kind: GroupKind) -> Option<&ContentGroup> {
        self.content.iter().find(|group| group.kind == kind)
    }

    /// Total number of schema errors and content findings.
    pub fn finding_count(&self) -> usize {
        let content: usize = self
            .content
            .iter()
            .filter(|group| group.kind != GroupKind::UnitEquivalence)
            .flat_map(|group| group.lines.iter())
            .map(|line| line.occurrences)
            .sum();
        self.schema_errors.len() + content
    }
}
