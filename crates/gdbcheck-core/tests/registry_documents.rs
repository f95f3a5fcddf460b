use gdbcheck_core::{
    EntityKind, Error, FieldRole, MapUnitCategory, load_registry_str, ncgmp09_registry,
};

#[test]
fn minimal_document_uses_default_conventions() {
    let registry = load_registry_str(
        r#"{
  "name": "Mini",
  "version": "0.1",
  "entities": [
    {
      "name": "Units",
      "kind": "table",
      "requirement": "required",
      "map_unit_category": "description",
      "fields": [
        { "name": "MapUnit", "field_type": "Text", "nullability": "optional", "length": 10, "role": "map_unit" }
      ]
    }
  ]
}"#,
    )
    .expect("load registry");

    assert_eq!(registry.display_name(), "Mini 0.1");
    assert_eq!(registry.conventions.identifier_suffix, "_ID");
    let units = registry.entity("Units").expect("units entity");
    assert_eq!(units.kind, EntityKind::Table);
    assert_eq!(units.map_unit_category, Some(MapUnitCategory::Description));
    assert_eq!(units.fields[0].role, FieldRole::MapUnit);
}

#[test]
fn builtin_registry_serializes_deterministically() {
    let first = serde_json::to_string_pretty(&ncgmp09_registry()).expect("serialize");
    let second = serde_json::to_string_pretty(&ncgmp09_registry()).expect("serialize");
    assert_eq!(first, second);
    assert!(first.contains("\"name\": \"NCGMP09\""));
}

#[test]
fn malformed_json_is_an_invalid_registry() {
    let err = load_registry_str("{ not json").unwrap_err();
    assert!(matches!(err, Error::InvalidRegistry(_)));
}
