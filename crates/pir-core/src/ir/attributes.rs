use serde::{Deserialize, Serialize};

use super::element_type::ElementType;
use super::validators::Validator;

/// Message attached to attributes whose schema is marked `deprecated`.
pub const DEPRECATION_MESSAGE: &str = "This attribute is deprecated.";

/// Whether an attribute must, may, or cannot be set by the practitioner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Computability {
    Required,
    Optional,
    Computed,
    ComputedOptional,
}

impl Computability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Computability::Required => "required",
            Computability::Optional => "optional",
            Computability::Computed => "computed",
            Computability::ComputedOptional => "computed_optional",
        }
    }
}

/// A named, independently configurable schema field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub name: String,
    #[serde(flatten)]
    pub kind: AttributeKind,
}

/// The closed set of attribute shapes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Bool(ScalarAttribute<bool>),
    Int64(ScalarAttribute<i64>),
    Float64(ScalarAttribute<f64>),
    Number(ScalarAttribute<f64>),
    String(ScalarAttribute<String>),
    List(CollectionAttribute),
    Set(CollectionAttribute),
    Map(CollectionAttribute),
    ListNested(NestedCollectionAttribute),
    SetNested(NestedCollectionAttribute),
    MapNested(NestedCollectionAttribute),
    SingleNested(SingleNestedAttribute),
}

/// Metadata shared by every attribute variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeMeta {
    #[serde(rename = "computed_optional_required")]
    pub computability: Computability,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecation_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitive: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<Validator>,
}

impl AttributeMeta {
    pub fn new(computability: Computability) -> Self {
        Self {
            computability,
            description: None,
            deprecation_message: None,
            sensitive: None,
            validators: Vec::new(),
        }
    }
}

/// A literal default value, only produced for resources.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaticDefault<T> {
    #[serde(rename = "static")]
    pub value: T,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalarAttribute<T> {
    #[serde(flatten)]
    pub meta: AttributeMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<StaticDefault<T>>,
}

impl<T> ScalarAttribute<T> {
    pub fn new(meta: AttributeMeta) -> Self {
        Self {
            meta,
            default: None,
        }
    }
}

/// A list, set, or map of element types.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionAttribute {
    #[serde(flatten)]
    pub meta: AttributeMeta,
    pub element_type: ElementType,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NestedAttributeObject {
    pub attributes: Vec<Attribute>,
}

/// A list, set, or map whose members are full attribute objects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NestedCollectionAttribute {
    #[serde(flatten)]
    pub meta: AttributeMeta,
    pub nested_object: NestedAttributeObject,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleNestedAttribute {
    #[serde(flatten)]
    pub meta: AttributeMeta,
    pub attributes: Vec<Attribute>,
}

impl AttributeKind {
    /// The IR key of this variant, e.g. `list_nested`.
    pub fn variant_name(&self) -> &'static str {
        match self {
            AttributeKind::Bool(_) => "bool",
            AttributeKind::Int64(_) => "int64",
            AttributeKind::Float64(_) => "float64",
            AttributeKind::Number(_) => "number",
            AttributeKind::String(_) => "string",
            AttributeKind::List(_) => "list",
            AttributeKind::Set(_) => "set",
            AttributeKind::Map(_) => "map",
            AttributeKind::ListNested(_) => "list_nested",
            AttributeKind::SetNested(_) => "set_nested",
            AttributeKind::MapNested(_) => "map_nested",
            AttributeKind::SingleNested(_) => "single_nested",
        }
    }

    pub fn meta(&self) -> &AttributeMeta {
        match self {
            AttributeKind::Bool(a) => &a.meta,
            AttributeKind::Int64(a) => &a.meta,
            AttributeKind::Float64(a) | AttributeKind::Number(a) => &a.meta,
            AttributeKind::String(a) => &a.meta,
            AttributeKind::List(a) | AttributeKind::Set(a) | AttributeKind::Map(a) => &a.meta,
            AttributeKind::ListNested(a)
            | AttributeKind::SetNested(a)
            | AttributeKind::MapNested(a) => &a.meta,
            AttributeKind::SingleNested(a) => &a.meta,
        }
    }

    pub fn meta_mut(&mut self) -> &mut AttributeMeta {
        match self {
            AttributeKind::Bool(a) => &mut a.meta,
            AttributeKind::Int64(a) => &mut a.meta,
            AttributeKind::Float64(a) | AttributeKind::Number(a) => &mut a.meta,
            AttributeKind::String(a) => &mut a.meta,
            AttributeKind::List(a) | AttributeKind::Set(a) | AttributeKind::Map(a) => &mut a.meta,
            AttributeKind::ListNested(a)
            | AttributeKind::SetNested(a)
            | AttributeKind::MapNested(a) => &mut a.meta,
            AttributeKind::SingleNested(a) => &mut a.meta,
        }
    }

    /// Child attributes of nested variants.
    pub fn nested_attributes(&self) -> Option<&[Attribute]> {
        match self {
            AttributeKind::ListNested(a)
            | AttributeKind::SetNested(a)
            | AttributeKind::MapNested(a) => Some(&a.nested_object.attributes),
            AttributeKind::SingleNested(a) => Some(&a.attributes),
            _ => None,
        }
    }

    pub fn nested_attributes_mut(&mut self) -> Option<&mut Vec<Attribute>> {
        match self {
            AttributeKind::ListNested(a)
            | AttributeKind::SetNested(a)
            | AttributeKind::MapNested(a) => Some(&mut a.nested_object.attributes),
            AttributeKind::SingleNested(a) => Some(&mut a.attributes),
            _ => None,
        }
    }

    /// The element type of flat collection variants.
    pub fn element_type(&self) -> Option<&ElementType> {
        match self {
            AttributeKind::List(a) | AttributeKind::Set(a) | AttributeKind::Map(a) => {
                Some(&a.element_type)
            }
            _ => None,
        }
    }
}

impl Attribute {
    pub fn new(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn computability(&self) -> Computability {
        self.kind.meta().computability
    }

    pub fn description(&self) -> Option<&str> {
        self.kind.meta().description.as_deref()
    }

    /// Follow a dotted name path through nested attributes.
    pub fn find<'a>(attributes: &'a [Attribute], path: &str) -> Option<&'a Attribute> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let found = attributes.iter().find(|a| a.name == head)?;
        match rest {
            Some(rest) => Attribute::find(found.kind.nested_attributes()?, rest),
            None => Some(found),
        }
    }

    pub fn find_mut<'a>(attributes: &'a mut [Attribute], path: &str) -> Option<&'a mut Attribute> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let found = attributes.iter_mut().find(|a| a.name == head)?;
        match rest {
            Some(rest) => Attribute::find_mut(found.kind.nested_attributes_mut()?, rest),
            None => Some(found),
        }
    }
}
