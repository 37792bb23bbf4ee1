use serde_json::Value;

use crate::ir::{Validator, ValidatorRule, ValidatorTarget};
use crate::parse::schema::Schema;

/// Derive the validators a schema's constraint keywords imply for an
/// attribute of the given value family.
pub fn build_validators(schema: &Schema, target: ValidatorTarget) -> Vec<Validator> {
    let rules: Vec<ValidatorRule> = match target {
        ValidatorTarget::String => one_of(schema, Value::is_string)
            .into_iter()
            .chain(bounded(
                schema.min_length,
                schema.max_length,
                ValidatorRule::LengthAtLeast,
                ValidatorRule::LengthAtMost,
                ValidatorRule::LengthBetween,
            ))
            .collect(),
        ValidatorTarget::Int64 => one_of(schema, |v| v.is_i64() || v.is_u64())
            .into_iter()
            .chain(range(schema))
            .collect(),
        ValidatorTarget::Float64 => one_of(schema, Value::is_number)
            .into_iter()
            .chain(range(schema))
            .collect(),
        ValidatorTarget::List => {
            let mut rules: Vec<ValidatorRule> = item_size(schema).into_iter().collect();
            if schema.unique_items == Some(true) {
                rules.push(ValidatorRule::UniqueValues);
            }
            rules
        }
        ValidatorTarget::Set => item_size(schema).into_iter().collect(),
        ValidatorTarget::Map => bounded(
            schema.min_properties,
            schema.max_properties,
            ValidatorRule::SizeAtLeast,
            ValidatorRule::SizeAtMost,
            ValidatorRule::SizeBetween,
        )
        .into_iter()
        .collect(),
    };

    rules
        .into_iter()
        .map(|rule| Validator::new(target, rule))
        .collect()
}

/// `enum`, keeping only the literals of the expected type.
fn one_of(schema: &Schema, accepts: impl Fn(&Value) -> bool) -> Option<ValidatorRule> {
    let values: Vec<Value> = schema
        .enum_values
        .iter()
        .filter(|v| accepts(*v))
        .cloned()
        .collect();
    (!values.is_empty()).then_some(ValidatorRule::OneOf(values))
}

fn range(schema: &Schema) -> Option<ValidatorRule> {
    bounded(
        schema.minimum,
        schema.maximum,
        ValidatorRule::AtLeast,
        ValidatorRule::AtMost,
        ValidatorRule::Between,
    )
}

fn item_size(schema: &Schema) -> Option<ValidatorRule> {
    bounded(
        schema.min_items,
        schema.max_items,
        ValidatorRule::SizeAtLeast,
        ValidatorRule::SizeAtMost,
        ValidatorRule::SizeBetween,
    )
}

fn bounded<T>(
    min: Option<T>,
    max: Option<T>,
    at_least: fn(T) -> ValidatorRule,
    at_most: fn(T) -> ValidatorRule,
    between: fn(T, T) -> ValidatorRule,
) -> Option<ValidatorRule> {
    match (min, max) {
        (Some(min), Some(max)) => Some(between(min, max)),
        (Some(min), None) => Some(at_least(min)),
        (None, Some(max)) => Some(at_most(max)),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(yaml: &str) -> Schema {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    #[test]
    fn test_string_enum_and_length() {
        let s = schema("type: string\nenum: [a, b, null]\nminLength: 1\nmaxLength: 8\n");
        let validators = build_validators(&s, ValidatorTarget::String);
        assert_eq!(
            validators,
            vec![
                Validator::new(
                    ValidatorTarget::String,
                    ValidatorRule::OneOf(vec![json!("a"), json!("b")])
                ),
                Validator::new(ValidatorTarget::String, ValidatorRule::LengthBetween(1, 8)),
            ]
        );
    }

    #[test]
    fn test_integer_minimum_only() {
        let s = schema("type: integer\nminimum: 0\n");
        let validators = build_validators(&s, ValidatorTarget::Int64);
        assert_eq!(
            validators,
            vec![Validator::new(ValidatorTarget::Int64, ValidatorRule::AtLeast(0.0))]
        );
    }

    #[test]
    fn test_list_size_and_unique() {
        let s = schema("type: array\nmaxItems: 5\nuniqueItems: true\n");
        let rules: Vec<ValidatorRule> = build_validators(&s, ValidatorTarget::List)
            .into_iter()
            .map(|v| v.rule)
            .collect();
        assert_eq!(
            rules,
            vec![ValidatorRule::SizeAtMost(5), ValidatorRule::UniqueValues]
        );
    }

    #[test]
    fn test_set_ignores_unique_items() {
        let s = schema("type: array\nuniqueItems: true\n");
        assert!(build_validators(&s, ValidatorTarget::Set).is_empty());
    }

    #[test]
    fn test_map_properties_bounds() {
        let s = schema("type: object\nminProperties: 1\n");
        let validators = build_validators(&s, ValidatorTarget::Map);
        assert_eq!(validators[0].rule, ValidatorRule::SizeAtLeast(1));
    }
}
