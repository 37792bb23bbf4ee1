use crate::error::SchemaError;
use crate::ir::ElementType;

use super::resolved_schema::{ResolvedSchema, SchemaKind};

/// Build the element type of a collection member or map value.
///
/// Objects with fixed properties become `Object` element types whose fields
/// follow the property order; map-shaped objects become `Map`.
pub fn build_element_type(node: &ResolvedSchema<'_>) -> Result<ElementType, SchemaError> {
    match node.kind {
        SchemaKind::Boolean => Ok(ElementType::Bool),
        SchemaKind::Integer => Ok(ElementType::Int64),
        SchemaKind::String => Ok(ElementType::String),
        SchemaKind::Number if node.is_floating_point() => Ok(ElementType::Float64),
        SchemaKind::Number => Ok(ElementType::Number),
        SchemaKind::Array => {
            let items = node.items()?;
            let element_type = build_element_type(&items)?;
            if node.is_set() {
                Ok(ElementType::set(element_type))
            } else {
                Ok(ElementType::list(element_type))
            }
        }
        SchemaKind::Object if node.is_map() => {
            let value = node.map_value()?;
            Ok(ElementType::map(build_element_type(&value)?))
        }
        SchemaKind::Object => {
            let mut fields = Vec::new();
            for prop in node.properties() {
                let field = node
                    .property(&prop)
                    .and_then(|child| build_element_type(&child))
                    .map_err(|e| e.in_property(&prop.name))?;
                fields.push((prop.name, field));
            }
            Ok(ElementType::Object(fields))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaErrorKind;
    use crate::parse::schema::SchemaOrRef;
    use crate::transform::resolved_schema::GlobalOptions;

    fn element_type(yaml: &str) -> Result<ElementType, SchemaError> {
        let schema: SchemaOrRef = serde_yaml_ng::from_str(yaml).unwrap();
        let node = ResolvedSchema::resolve(&schema, GlobalOptions::default())?;
        build_element_type(&node)
    }

    #[test]
    fn test_primitives() {
        assert_eq!(element_type("type: boolean").unwrap(), ElementType::Bool);
        assert_eq!(element_type("type: integer").unwrap(), ElementType::Int64);
        assert_eq!(element_type("type: number").unwrap(), ElementType::Number);
        assert_eq!(
            element_type("type: number\nformat: double").unwrap(),
            ElementType::Float64
        );
    }

    #[test]
    fn test_set_of_lists() {
        let yaml = r#"
type: array
format: set
items:
  type: array
  items:
    type: string
"#;
        assert_eq!(
            element_type(yaml).unwrap(),
            ElementType::set(ElementType::list(ElementType::String))
        );
    }

    #[test]
    fn test_object_fields_sorted() {
        let yaml = r#"
type: object
properties:
  zeta:
    type: string
  alphaBeta:
    type: integer
"#;
        assert_eq!(
            element_type(yaml).unwrap(),
            ElementType::Object(vec![
                ("alpha_beta".to_string(), ElementType::Int64),
                ("zeta".to_string(), ElementType::String),
            ])
        );
    }

    #[test]
    fn test_map_of_strings() {
        let yaml = r#"
type: object
additionalProperties:
  type: string
"#;
        assert_eq!(
            element_type(yaml).unwrap(),
            ElementType::map(ElementType::String)
        );
    }

    #[test]
    fn test_array_without_items() {
        let err = element_type("type: array").unwrap_err();
        assert_eq!(err.kind, SchemaErrorKind::InvalidArrayItems);
    }

    #[test]
    fn test_nested_error_path() {
        let yaml = r#"
type: object
properties:
  tags:
    type: array
"#;
        let err = element_type(yaml).unwrap_err();
        assert_eq!(err.to_string(), "tags: invalid array type, doesn't have a schema");
    }
}
