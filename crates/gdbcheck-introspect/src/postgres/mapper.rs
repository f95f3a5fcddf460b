use std::collections::BTreeMap;

use gdbcheck_core::{EntityHandle, EntityKind, FieldType, LiveField};

use crate::options::PostgresOptions;

use super::queries::{RawColumn, RawGeometryColumn, RawRelation};

/// PostGIS bookkeeping relations that are never part of a geodatabase.
const POSTGIS_RELATIONS: &[&str] = &[
    "spatial_ref_sys",
    "geometry_columns",
    "geography_columns",
    "raster_columns",
    "raster_overviews",
];

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn geometry_kind(geometry_type: &str) -> EntityKind {
    match geometry_type.to_ascii_uppercase().trim_end_matches(['Z', 'M']) {
        "POINT" | "MULTIPOINT" => EntityKind::PointCollection,
        "LINESTRING" | "MULTILINESTRING" => EntityKind::LineCollection,
        "POLYGON" | "MULTIPOLYGON" => EntityKind::PolygonCollection,
        _ => EntityKind::GenericCollection,
    }
}

pub fn map_relations(
    relations: Vec<RawRelation>,
    geometry: Vec<RawGeometryColumn>,
    opts: &PostgresOptions,
) -> Vec<EntityHandle> {
    let kinds: BTreeMap<(String, String), EntityKind> = geometry
        .into_iter()
        .map(|column| {
            (
                (column.schema, column.table),
                geometry_kind(&column.geometry_type),
            )
        })
        .collect();

    relations
        .into_iter()
        .filter(|relation| !POSTGIS_RELATIONS.contains(&relation.name.as_str()))
        .filter(|relation| {
            relation.schema == opts.table_schema
                || opts
                    .datasets
                    .as_ref()
                    .is_none_or(|datasets| datasets.contains(&relation.schema))
        })
        .map(|relation| {
            let kind = kinds
                .get(&(relation.schema.clone(), relation.name.clone()))
                .copied()
                .unwrap_or(EntityKind::Table);
            let dataset = (relation.schema != opts.table_schema).then_some(relation.schema);
            EntityHandle {
                name: relation.name,
                kind,
                dataset,
            }
        })
        .collect()
}

pub fn map_field_type(udt_name: &str) -> FieldType {
    match udt_name {
        "text" | "varchar" | "bpchar" | "char" | "name" | "uuid" => FieldType::Text,
        "float4" => FieldType::SinglePrecision,
        "float8" | "numeric" => FieldType::DoublePrecision,
        "int4" | "int8" => FieldType::Integer,
        "int2" | "bool" => FieldType::SmallInteger,
        "date" | "timestamp" | "timestamptz" => FieldType::Date,
        "bytea" => FieldType::Blob,
        "geometry" | "geography" => FieldType::Geometry,
        "oid" => FieldType::ObjectId,
        other => FieldType::Other(other.to_string()),
    }
}

pub fn map_columns(raw: Vec<RawColumn>) -> Vec<LiveField> {
    raw.into_iter()
        .map(|column| LiveField {
            field_type: map_field_type(&column.udt_name),
            length: column
                .character_max_length
                .and_then(|length| u32::try_from(length).ok()),
            nullable: column.is_nullable,
            name: column.name,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relation(schema: &str, name: &str) -> RawRelation {
        RawRelation {
            schema: schema.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn schemas_become_feature_datasets() {
        let handles = map_relations(
            vec![
                relation("public", "Glossary"),
                relation("public", "spatial_ref_sys"),
                relation("GeologicMap", "MapUnitPolys"),
            ],
            vec![RawGeometryColumn {
                schema: "GeologicMap".to_string(),
                table: "MapUnitPolys".to_string(),
                geometry_type: "MULTIPOLYGON".to_string(),
            }],
            &PostgresOptions::default(),
        );

        assert_eq!(handles.len(), 2);
        assert_eq!(handles[0].dataset, None);
        assert_eq!(handles[0].kind, EntityKind::Table);
        assert_eq!(handles[1].dataset.as_deref(), Some("GeologicMap"));
        assert_eq!(handles[1].kind, EntityKind::PolygonCollection);
    }

    #[test]
    fn measured_geometry_types_keep_their_kind() {
        assert_eq!(geometry_kind("LINESTRINGZ"), EntityKind::LineCollection);
        assert_eq!(geometry_kind("GEOMETRY"), EntityKind::GenericCollection);
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quote_ident("Map\"Unit"), "\"Map\"\"Unit\"");
    }
}
