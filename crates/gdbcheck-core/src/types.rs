use std::borrow::Cow;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Semantic field type shared by registry declarations and live stores.
///
/// The first seven variants are the types a registry may declare. The rest
/// only appear on live fields (geometry, object ids, anything a driver
/// reports that has no registry counterpart).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum FieldType {
    Text,
    SinglePrecision,
    DoublePrecision,
    Integer,
    SmallInteger,
    Date,
    Blob,
    Geometry,
    ObjectId,
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Text => "Text",
            FieldType::SinglePrecision => "SinglePrecision",
            FieldType::DoublePrecision => "DoublePrecision",
            FieldType::Integer => "Integer",
            FieldType::SmallInteger => "SmallInteger",
            FieldType::Date => "Date",
            FieldType::Blob => "Blob",
            FieldType::Geometry => "Geometry",
            FieldType::ObjectId => "ObjectId",
            FieldType::Other(name) => name,
        }
    }

    /// Whether row values of this type are worth reading during indexing.
    pub fn is_scannable(&self) -> bool {
        !matches!(self, FieldType::Geometry | FieldType::Blob)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a field accepts nulls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Nullability {
    /// Nulls are not allowed (`NoNulls`).
    Required,
    /// Nulls are allowed (`NullsOK`).
    Optional,
}

impl Nullability {
    pub fn from_nullable(nullable: bool) -> Self {
        if nullable {
            Nullability::Optional
        } else {
            Nullability::Required
        }
    }

    pub fn allows_null(self) -> bool {
        matches!(self, Nullability::Optional)
    }
}

impl fmt::Display for Nullability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Nullability::Required => f.write_str("NoNulls"),
            Nullability::Optional => f.write_str("NullsOK"),
        }
    }
}

/// Kind of entity held by a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Table,
    PointCollection,
    LineCollection,
    PolygonCollection,
    /// Spatial collection whose geometry type is not one of the above
    /// (annotation, untyped geometry).
    GenericCollection,
}

impl EntityKind {
    pub fn is_feature_class(self) -> bool {
        !matches!(self, EntityKind::Table)
    }

    pub fn describe(self) -> &'static str {
        match self {
            EntityKind::Table => "table",
            EntityKind::PointCollection => "point feature class",
            EntityKind::LineCollection => "line feature class",
            EntityKind::PolygonCollection => "polygon feature class",
            EntityKind::GenericCollection => "feature class",
        }
    }

    /// Report label used in schema messages ("Table X", "Feature class X").
    pub fn label(self) -> &'static str {
        if self.is_feature_class() {
            "Feature class"
        } else {
            "Table"
        }
    }
}

/// A single stored value as handed over by a store driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Double(f64),
    Text(String),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Text form used for identifier and reference comparison.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            FieldValue::Null => None,
            FieldValue::Integer(value) => Some(Cow::Owned(value.to_string())),
            FieldValue::Double(value) => Some(Cow::Owned(value.to_string())),
            FieldValue::Text(value) => Some(Cow::Borrowed(value)),
        }
    }

    /// Like [`FieldValue::as_text`] but also treats the empty string as absent.
    pub fn as_reference(&self) -> Option<Cow<'_, str>> {
        self.as_text().filter(|value| !value.is_empty())
    }
}

/// One row projected onto the fields requested from a store.
pub type Row = Vec<FieldValue>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_values_deserialize_untagged() {
        let values: Vec<FieldValue> = serde_json::from_str(r#"[null, 3, 2.5, "Qal"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                FieldValue::Null,
                FieldValue::Integer(3),
                FieldValue::Double(2.5),
                FieldValue::Text("Qal".to_string()),
            ]
        );
    }

    #[test]
    fn empty_text_is_not_a_reference() {
        assert!(FieldValue::Text(String::new()).as_reference().is_none());
        assert_eq!(
            FieldValue::Integer(12).as_reference().as_deref(),
            Some("12")
        );
    }
}
