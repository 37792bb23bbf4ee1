use pir_core::error::{SchemaError, SchemaErrorKind};
use pir_core::ir::{Attribute, AttributeKind, Computability};
use pir_core::parse::schema::SchemaOrRef;
use pir_core::transform::{
    AttributeBuilder, GlobalOptions, MAX_SCHEMA_DEPTH, ResolvedSchema, SchemaFlavor, SchemaKind,
};

fn schema(yaml: &str) -> SchemaOrRef {
    serde_yaml_ng::from_str(yaml).expect("should parse schema")
}

fn kind_of(yaml: &str) -> Result<SchemaKind, SchemaError> {
    let schema = schema(yaml);
    ResolvedSchema::resolve(&schema, GlobalOptions::default()).map(|node| node.kind)
}

fn build(flavor: SchemaFlavor, yaml: &str) -> Result<Vec<Attribute>, SchemaError> {
    let schema = schema(yaml);
    let node = ResolvedSchema::resolve(&schema, GlobalOptions::default())?;
    AttributeBuilder::new(flavor).build_attributes(&node)
}

#[test]
fn nullable_type_array_keeps_member_description() {
    let schema = schema("type: [string, \"null\"]\ndescription: x\n");
    let node = ResolvedSchema::resolve(&schema, GlobalOptions::default()).unwrap();
    assert_eq!(node.kind, SchemaKind::String);
    assert_eq!(node.description, Some("x"));
}

#[test]
fn nullable_any_of_and_one_of() {
    let any_of = r#"
anyOf:
  - type: "null"
  - type: integer
    description: inner
"#;
    let schema = schema(any_of);
    let node = ResolvedSchema::resolve(&schema, GlobalOptions::default()).unwrap();
    assert_eq!(node.kind, SchemaKind::Integer);
    assert_eq!(node.description, Some("inner"));

    let one_of = r#"
oneOf:
  - type: array
    items:
      type: string
  - type: "null"
"#;
    assert_eq!(kind_of(one_of).unwrap(), SchemaKind::Array);
}

#[test]
fn stringable_collapse_in_either_order() {
    assert_eq!(kind_of("type: [string, integer]").unwrap(), SchemaKind::String);
    assert_eq!(kind_of("type: [integer, string]").unwrap(), SchemaKind::String);
    assert_eq!(kind_of("type: [boolean, string]").unwrap(), SchemaKind::String);
    let any_of = "anyOf:\n  - type: number\n  - type: string\n";
    assert_eq!(kind_of(any_of).unwrap(), SchemaKind::String);
}

#[test]
fn unsupported_type_pairs() {
    let err = kind_of("type: [integer, boolean]").unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"unsupported multi-type, attribute cannot be created: integer, boolean");

    let err = kind_of("type: [string, integer, \"null\"]").unwrap_err();
    assert_eq!(
        err.kind,
        SchemaErrorKind::MultiTypeUnsupported(vec![
            "string".to_string(),
            "integer".to_string(),
            "null".to_string()
        ])
    );

    let err = kind_of("type: [string, object]").unwrap_err();
    assert!(matches!(err.kind, SchemaErrorKind::MultiTypeUnsupported(_)));
}

#[test]
fn single_all_of_takes_wrapper_description() {
    let yaml = r#"
description: outer
allOf:
  - type: object
    description: inner
    properties:
      id:
        type: string
"#;
    let schema = schema(yaml);
    let node = ResolvedSchema::resolve(&schema, GlobalOptions::default()).unwrap();
    assert_eq!(node.kind, SchemaKind::Object);
    assert_eq!(node.description, Some("outer"));
    assert_eq!(node.properties().len(), 1);
}

#[test]
fn untyped_schema_with_properties_is_object() {
    assert_eq!(
        kind_of("properties:\n  id:\n    type: string\n").unwrap(),
        SchemaKind::Object
    );
    let err = kind_of("description: nothing here").unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"no 'type' array or supported allOf/oneOf/anyOf constraint");
}

#[test]
fn too_many_members() {
    let yaml = r#"
anyOf:
  - type: string
  - type: integer
  - type: object
"#;
    let err = kind_of(yaml).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"found 3 anyOf subschema(s), schema composition is currently not supported");

    let yaml = r#"
allOf:
  - type: object
  - type: object
"#;
    let err = kind_of(yaml).unwrap_err();
    assert_eq!(
        err.kind,
        SchemaErrorKind::SchemaCompositionUnsupported {
            count: 2,
            keyword: "allOf"
        }
    );
}

#[test]
fn bare_null_is_invalid() {
    let err = kind_of("type: \"null\"").unwrap_err();
    assert_eq!(err.kind, SchemaErrorKind::InvalidSchemaType("null".to_string()));
}

#[test]
fn map_wins_over_properties() {
    let yaml = r#"
type: object
properties:
  settings:
    type: object
    properties:
      fixed:
        type: string
    additionalProperties:
      type: object
      properties:
        value:
          type: integer
  env:
    type: object
    properties:
      fixed:
        type: string
    additionalProperties:
      type: string
"#;
    let attrs = build(SchemaFlavor::Resource, yaml).unwrap();
    let names: Vec<&str> = attrs.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["env", "settings"]);

    assert_eq!(attrs[0].kind.variant_name(), "map");
    assert_eq!(attrs[1].kind.variant_name(), "map_nested");
    assert!(Attribute::find(&attrs, "settings.value").is_some());
    assert!(Attribute::find(&attrs, "settings.fixed").is_none());
}

#[test]
fn untyped_map_value_is_invalid() {
    let yaml = r#"
type: object
properties:
  extra:
    type: object
    additionalProperties: {}
"#;
    let err = build(SchemaFlavor::Resource, yaml).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"extra: invalid map type, additionalProperties doesn't declare a value type");
}

#[test]
fn required_default_becomes_computed_optional() {
    let yaml = r#"
type: object
required: [enabled, size]
properties:
  enabled:
    type: boolean
    default: true
  size:
    type: integer
"#;
    let attrs = build(SchemaFlavor::Resource, yaml).unwrap();
    assert_eq!(attrs[0].computability(), Computability::ComputedOptional);
    assert_eq!(attrs[1].computability(), Computability::Required);

    let attrs = build(SchemaFlavor::DataSource, yaml).unwrap();
    assert_eq!(attrs[0].computability(), Computability::Required);
    match &attrs[0].kind {
        AttributeKind::Bool(a) => assert!(a.default.is_none()),
        other => panic!("expected bool, got {}", other.variant_name()),
    }
}

#[test]
fn properties_sorted_regardless_of_input_order() {
    let forward = "type: object\nproperties:\n  b:\n    type: string\n  a:\n    type: string\n";
    let reverse = "type: object\nproperties:\n  a:\n    type: string\n  b:\n    type: string\n";
    let first = build(SchemaFlavor::Resource, forward).unwrap();
    let second = build(SchemaFlavor::Resource, reverse).unwrap();
    assert_eq!(first, second);
    assert_eq!(first[0].name, "a");
}

#[test]
fn duplicate_identifiers_keep_first() {
    let yaml = r#"
type: object
properties:
  petId:
    type: integer
  pet_id:
    type: string
"#;
    let attrs = build(SchemaFlavor::Resource, yaml).unwrap();
    assert_eq!(attrs.len(), 1);
    assert_eq!(attrs[0].name, "pet_id");
    // ties break on the original name, and "petId" sorts before "pet_id"
    assert_eq!(attrs[0].kind.variant_name(), "int64");
}

#[test]
fn circular_reference_reaches_builder_as_unresolved() {
    let yaml = r##"
openapi: 3.0.3
info:
  title: Tree
  version: "1"
paths: {}
components:
  schemas:
    Node:
      type: object
      properties:
        children:
          type: array
          items:
            $ref: "#/components/schemas/Node"
"##;
    let spec = pir_core::parse::from_yaml(yaml).unwrap();
    let resolved = pir_core::parse::ref_resolve::RefResolver::new(&spec).resolve_spec(&spec);
    let node_schema = &resolved.components.as_ref().unwrap().schemas["Node"];
    let node = ResolvedSchema::resolve(node_schema, GlobalOptions::default()).unwrap();
    let err = AttributeBuilder::new(SchemaFlavor::Resource)
        .build_attributes(&node)
        .unwrap_err();
    // the first expansion is inlined, the second is left as a reference
    assert_eq!(err.dotted_path(), "children.children");
    assert_eq!(
        err.kind,
        SchemaErrorKind::UnresolvedReference("#/components/schemas/Node".to_string())
    );
}

#[test]
fn nesting_beyond_the_limit_fails() {
    let mut yaml = String::from("type: string\n");
    for _ in 0..=MAX_SCHEMA_DEPTH {
        let indented: String = yaml.lines().map(|l| format!("  {l}\n")).collect();
        yaml = format!("type: array\nitems:\n{indented}");
    }
    let schema = schema(&yaml);
    let mut node = ResolvedSchema::resolve(&schema, GlobalOptions::default()).unwrap();
    let err = loop {
        match node.items() {
            Ok(items) => node = items,
            Err(e) => break e,
        }
    };
    assert_eq!(err.kind, SchemaErrorKind::DepthExceeded(MAX_SCHEMA_DEPTH));
}
