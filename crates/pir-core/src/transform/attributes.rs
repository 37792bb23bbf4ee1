use serde_json::Value;

use crate::error::{SchemaError, SchemaErrorKind};
use crate::ir::{
    Attribute, AttributeKind, AttributeMeta, CollectionAttribute, Computability,
    DEPRECATION_MESSAGE, NestedAttributeObject, NestedCollectionAttribute, ScalarAttribute,
    SingleNestedAttribute, StaticDefault, ValidatorTarget,
};

use crate::parse::source_map::SourceMap;

use super::element_type::build_element_type;
use super::resolved_schema::{ResolvedSchema, SchemaKind};
use super::validators::build_validators;

/// Which kind of provider construct an attribute tree is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFlavor {
    Resource,
    DataSource,
    Provider,
}

impl SchemaFlavor {
    /// Only resources carry static defaults.
    fn supports_defaults(self) -> bool {
        self == SchemaFlavor::Resource
    }

    /// Computability of a property its object does not list as required.
    fn unrequired(self) -> Computability {
        match self {
            SchemaFlavor::Provider => Computability::Optional,
            SchemaFlavor::Resource | SchemaFlavor::DataSource => Computability::ComputedOptional,
        }
    }
}

/// Builds attribute trees from resolved schema nodes.
#[derive(Debug, Clone, Copy)]
pub struct AttributeBuilder<'c> {
    flavor: SchemaFlavor,
    ignores: &'c [String],
    source: Option<&'c SourceMap>,
}

impl<'c> AttributeBuilder<'c> {
    pub fn new(flavor: SchemaFlavor) -> Self {
        Self {
            flavor,
            ignores: &[],
            source: None,
        }
    }

    /// Attach the line of the failing property from `source` to errors.
    pub fn with_source(mut self, source: Option<&'c SourceMap>) -> Self {
        self.source = source;
        self
    }

    /// Skip properties at these dotted identifier paths, e.g. `owner.email`.
    pub fn with_ignores(mut self, ignores: &'c [String]) -> Self {
        self.ignores = ignores;
        self
    }

    pub fn flavor(&self) -> SchemaFlavor {
        self.flavor
    }

    /// One attribute per property of an object node, sorted by name.
    pub fn build_attributes(&self, node: &ResolvedSchema<'_>) -> Result<Vec<Attribute>, SchemaError> {
        self.build_object(node, "")
    }

    /// A single named attribute for any node, e.g. a parameter or a
    /// top-level array response.
    pub fn build_attribute(
        &self,
        name: &str,
        node: &ResolvedSchema<'_>,
        computability: Computability,
    ) -> Result<Attribute, SchemaError> {
        self.build_named(name, node, computability, name)
            .map_err(|e| e.in_property(name))
    }

    fn build_object(
        &self,
        node: &ResolvedSchema<'_>,
        prefix: &str,
    ) -> Result<Vec<Attribute>, SchemaError> {
        if node.kind != SchemaKind::Object {
            return Err(SchemaErrorKind::InvalidSchemaType(node.kind.to_string()).into());
        }
        let mut attributes = Vec::new();
        for prop in node.properties() {
            let path = if prefix.is_empty() {
                prop.name.clone()
            } else {
                format!("{prefix}.{}", prop.name)
            };
            if self.ignores.iter().any(|ignored| *ignored == path) {
                log::debug!("ignoring attribute '{path}'");
                continue;
            }

            let computability = if node.is_required(prop.original) {
                Computability::Required
            } else {
                self.flavor.unrequired()
            };
            let attribute = node
                .property(&prop)
                .and_then(|child| self.build_named(&prop.name, &child, computability, &path))
                .map_err(|e| {
                    let line = self
                        .source
                        .zip(node.property_location(&prop))
                        .and_then(|(source, keys)| source.locate(&keys));
                    e.in_property(&prop.name).with_line(line)
                })?;
            attributes.push(attribute);
        }
        Ok(attributes)
    }

    fn build_named(
        &self,
        name: &str,
        node: &ResolvedSchema<'_>,
        computability: Computability,
        path: &str,
    ) -> Result<Attribute, SchemaError> {
        let computability = node.global.forced_computability.unwrap_or(computability);
        let mut meta = AttributeMeta::new(computability);
        meta.description = node.description.map(str::to_string);
        if node.is_deprecated() {
            meta.deprecation_message = Some(DEPRECATION_MESSAGE.to_string());
        }

        let kind = match node.kind {
            SchemaKind::Boolean => AttributeKind::Bool(self.scalar(node, meta, None, Value::as_bool)),
            SchemaKind::Integer => AttributeKind::Int64(self.scalar(
                node,
                meta,
                Some(ValidatorTarget::Int64),
                Value::as_i64,
            )),
            SchemaKind::Number if node.is_floating_point() => AttributeKind::Float64(self.scalar(
                node,
                meta,
                Some(ValidatorTarget::Float64),
                Value::as_f64,
            )),
            SchemaKind::Number => {
                AttributeKind::Number(self.scalar(node, meta, None, Value::as_f64))
            }
            SchemaKind::String => {
                if node.is_sensitive() {
                    meta.sensitive = Some(true);
                }
                AttributeKind::String(self.scalar(
                    node,
                    meta,
                    Some(ValidatorTarget::String),
                    |v| v.as_str().map(str::to_string),
                ))
            }
            SchemaKind::Array => self.build_array(node, meta, path)?,
            SchemaKind::Object if node.is_map() => {
                if !node.schema.properties.is_empty() {
                    log::debug!("ignoring fixed properties of map-shaped object '{path}'");
                }
                meta.validators = build_validators(node.schema, ValidatorTarget::Map);
                let value = node.map_value()?;
                if value.kind == SchemaKind::Object && !value.is_map() {
                    AttributeKind::MapNested(NestedCollectionAttribute {
                        meta,
                        nested_object: NestedAttributeObject {
                            attributes: self.build_object(&value, path)?,
                        },
                    })
                } else {
                    AttributeKind::Map(CollectionAttribute {
                        meta,
                        element_type: build_element_type(&value)?,
                    })
                }
            }
            SchemaKind::Object => AttributeKind::SingleNested(SingleNestedAttribute {
                meta,
                attributes: self.build_object(node, path)?,
            }),
        };

        Ok(Attribute::new(name, kind))
    }

    fn build_array(
        &self,
        node: &ResolvedSchema<'_>,
        mut meta: AttributeMeta,
        path: &str,
    ) -> Result<AttributeKind, SchemaError> {
        let is_set = node.is_set();
        let target = if is_set {
            ValidatorTarget::Set
        } else {
            ValidatorTarget::List
        };
        meta.validators = build_validators(node.schema, target);

        let items = node.items()?;
        if items.kind == SchemaKind::Object && !items.is_map() {
            let nested = NestedCollectionAttribute {
                meta,
                nested_object: NestedAttributeObject {
                    attributes: self.build_object(&items, path)?,
                },
            };
            return Ok(if is_set {
                AttributeKind::SetNested(nested)
            } else {
                AttributeKind::ListNested(nested)
            });
        }

        let collection = CollectionAttribute {
            meta,
            element_type: build_element_type(&items)?,
        };
        Ok(if is_set {
            AttributeKind::Set(collection)
        } else {
            AttributeKind::List(collection)
        })
    }

    fn scalar<T>(
        &self,
        node: &ResolvedSchema<'_>,
        mut meta: AttributeMeta,
        target: Option<ValidatorTarget>,
        literal: impl Fn(&Value) -> Option<T>,
    ) -> ScalarAttribute<T> {
        if let Some(target) = target {
            meta.validators = build_validators(node.schema, target);
        }

        let default = if self.flavor.supports_defaults() {
            node.default_value().and_then(literal)
        } else {
            None
        };
        if default.is_some()
            && matches!(
                meta.computability,
                Computability::Required | Computability::Optional
            )
        {
            meta.computability = Computability::ComputedOptional;
        }

        ScalarAttribute {
            meta,
            default: default.map(|value| StaticDefault { value }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ElementType;
    use crate::parse::schema::SchemaOrRef;
    use crate::transform::resolved_schema::GlobalOptions;

    fn build(flavor: SchemaFlavor, yaml: &str) -> Result<Vec<Attribute>, SchemaError> {
        let schema: SchemaOrRef = serde_yaml_ng::from_str(yaml).unwrap();
        let node = ResolvedSchema::resolve(&schema, GlobalOptions::default())?;
        AttributeBuilder::new(flavor).build_attributes(&node)
    }

    const PET: &str = r#"
type: object
required: [name]
properties:
  name:
    type: string
    description: The pet's name
  age:
    type: integer
    default: 3
  password:
    type: string
    format: password
  tags:
    type: array
    items:
      type: string
"#;

    #[test]
    fn test_resource_computability_and_defaults() {
        let attrs = build(SchemaFlavor::Resource, PET).unwrap();
        let names: Vec<&str> = attrs.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["age", "name", "password", "tags"]);

        let name = Attribute::find(&attrs, "name").unwrap();
        assert_eq!(name.computability(), Computability::Required);
        assert_eq!(name.description(), Some("The pet's name"));

        let age = Attribute::find(&attrs, "age").unwrap();
        match &age.kind {
            AttributeKind::Int64(a) => {
                assert_eq!(a.default, Some(StaticDefault { value: 3 }));
                assert_eq!(a.meta.computability, Computability::ComputedOptional);
            }
            other => panic!("expected int64, got {}", other.variant_name()),
        }

        let password = Attribute::find(&attrs, "password").unwrap();
        assert_eq!(password.kind.meta().sensitive, Some(true));

        let tags = Attribute::find(&attrs, "tags").unwrap();
        assert_eq!(tags.kind.element_type(), Some(&ElementType::String));
    }

    #[test]
    fn test_provider_has_no_defaults() {
        let attrs = build(SchemaFlavor::Provider, PET).unwrap();
        let age = Attribute::find(&attrs, "age").unwrap();
        match &age.kind {
            AttributeKind::Int64(a) => {
                assert_eq!(a.default, None);
                assert_eq!(a.meta.computability, Computability::Optional);
            }
            other => panic!("expected int64, got {}", other.variant_name()),
        }
    }

    #[test]
    fn test_mismatched_default_ignored() {
        let yaml = "type: object\nproperties:\n  count:\n    type: integer\n    default: many\n";
        let attrs = build(SchemaFlavor::Resource, yaml).unwrap();
        match &attrs[0].kind {
            AttributeKind::Int64(a) => assert_eq!(a.default, None),
            other => panic!("expected int64, got {}", other.variant_name()),
        }
    }

    #[test]
    fn test_forced_computability_reaches_nested() {
        let yaml = r#"
type: object
required: [owner]
properties:
  owner:
    type: object
    required: [id]
    properties:
      id:
        type: string
"#;
        let schema: SchemaOrRef = serde_yaml_ng::from_str(yaml).unwrap();
        let node =
            ResolvedSchema::resolve(&schema, GlobalOptions::forced(Computability::Computed)).unwrap();
        let attrs = AttributeBuilder::new(SchemaFlavor::Resource)
            .build_attributes(&node)
            .unwrap();
        assert_eq!(attrs[0].computability(), Computability::Computed);
        let id = Attribute::find(&attrs, "owner.id").unwrap();
        assert_eq!(id.computability(), Computability::Computed);
    }

    #[test]
    fn test_nested_collections() {
        let yaml = r#"
type: object
properties:
  rules:
    type: array
    format: set
    items:
      type: object
      properties:
        port:
          type: integer
  labels:
    type: object
    additionalProperties:
      type: string
  endpoints:
    type: object
    additionalProperties:
      type: object
      properties:
        url:
          type: string
"#;
        let attrs = build(SchemaFlavor::DataSource, yaml).unwrap();
        let kinds: Vec<(&str, &str)> = attrs
            .iter()
            .map(|a| (a.name.as_str(), a.kind.variant_name()))
            .collect();
        assert_eq!(
            kinds,
            [
                ("endpoints", "map_nested"),
                ("labels", "map"),
                ("rules", "set_nested"),
            ]
        );
        assert!(Attribute::find(&attrs, "rules.port").is_some());
        assert!(Attribute::find(&attrs, "endpoints.url").is_some());
    }

    #[test]
    fn test_ignores_by_path() {
        let yaml = r#"
type: object
properties:
  id:
    type: string
  owner:
    type: object
    properties:
      email:
        type: string
      name:
        type: string
"#;
        let schema: SchemaOrRef = serde_yaml_ng::from_str(yaml).unwrap();
        let node = ResolvedSchema::resolve(&schema, GlobalOptions::default()).unwrap();
        let ignores = vec!["owner.email".to_string()];
        let attrs = AttributeBuilder::new(SchemaFlavor::Resource)
            .with_ignores(&ignores)
            .build_attributes(&node)
            .unwrap();
        assert!(Attribute::find(&attrs, "owner.name").is_some());
        assert!(Attribute::find(&attrs, "owner.email").is_none());
    }

    #[test]
    fn test_deprecated_and_validators() {
        let yaml = r#"
type: object
properties:
  status:
    type: string
    deprecated: true
    enum: [available, sold]
"#;
        let attrs = build(SchemaFlavor::Resource, yaml).unwrap();
        let meta = attrs[0].kind.meta();
        assert_eq!(meta.deprecation_message.as_deref(), Some(DEPRECATION_MESSAGE));
        assert_eq!(meta.validators.len(), 1);
    }

    #[test]
    fn test_non_object_root() {
        let err = build(SchemaFlavor::Resource, "type: string").unwrap_err();
        assert_eq!(err.kind, SchemaErrorKind::InvalidSchemaType("string".to_string()));
    }

    #[test]
    fn test_error_path_is_nested() {
        let yaml = r#"
type: object
properties:
  owner:
    type: object
    properties:
      pets:
        type: array
"#;
        let err = build(SchemaFlavor::Resource, yaml).unwrap_err();
        assert_eq!(err.dotted_path(), "owner.pets");
        assert_eq!(err.kind, SchemaErrorKind::InvalidArrayItems);
    }

    #[test]
    fn test_error_line_is_innermost_property() {
        let doc = r##"openapi: 3.0.3
info:
  title: Test
  version: "1"
paths: {}
components:
  schemas:
    Owner:
      type: object
      properties:
        pets:
          type: array
    Shop:
      type: object
      properties:
        owner:
          $ref: "#/components/schemas/Owner"
"##;
        let spec = crate::parse::from_yaml(doc).unwrap();
        let resolved = crate::parse::ref_resolve::RefResolver::new(&spec).resolve_spec(&spec);
        let source = SourceMap::new(doc);
        let shop = &resolved.components.as_ref().unwrap().schemas["Shop"];
        let node = ResolvedSchema::resolve(shop, GlobalOptions::default()).unwrap();

        let err = AttributeBuilder::new(SchemaFlavor::Resource)
            .with_source(Some(&source))
            .build_attributes(&node)
            .unwrap_err();
        assert_eq!(err.dotted_path(), "owner.pets");
        // the inlined Owner is located in its own component, not under Shop
        assert_eq!(err.line, Some(11));

        let err = AttributeBuilder::new(SchemaFlavor::Resource)
            .build_attributes(&node)
            .unwrap_err();
        assert_eq!(err.line, None);
    }
}
