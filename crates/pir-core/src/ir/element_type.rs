use serde::ser::{Serialize, SerializeMap, Serializer};

/// The shape of a value that carries no attribute metadata of its own,
/// e.g. list members or map values.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementType {
    Bool,
    Int64,
    Float64,
    Number,
    String,
    List(Box<ElementType>),
    Set(Box<ElementType>),
    Map(Box<ElementType>),
    Object(Vec<(String, ElementType)>), // (name, type), sorted by name
}

impl ElementType {
    pub fn list(element_type: ElementType) -> Self {
        Self::List(Box::new(element_type))
    }

    pub fn set(element_type: ElementType) -> Self {
        Self::Set(Box::new(element_type))
    }

    pub fn map(element_type: ElementType) -> Self {
        Self::Map(Box::new(element_type))
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            ElementType::Bool => "bool",
            ElementType::Int64 => "int64",
            ElementType::Float64 => "float64",
            ElementType::Number => "number",
            ElementType::String => "string",
            ElementType::List(_) => "list",
            ElementType::Set(_) => "set",
            ElementType::Map(_) => "map",
            ElementType::Object(_) => "object",
        }
    }
}

#[derive(serde::Serialize)]
struct Empty {}

#[derive(serde::Serialize)]
struct Wrapped<'a> {
    element_type: &'a ElementType,
}

#[derive(serde::Serialize)]
struct ObjectType<'a> {
    attribute_types: Vec<ObjectField<'a>>,
}

#[derive(serde::Serialize)]
struct ObjectField<'a> {
    name: &'a str,
    #[serde(flatten)]
    element_type: &'a ElementType,
}

/// Serializes as a single-key map, e.g. `{"string": {}}` or
/// `{"list": {"element_type": {"int64": {}}}}`.
impl Serialize for ElementType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        let key = self.variant_name();
        match self {
            ElementType::Bool
            | ElementType::Int64
            | ElementType::Float64
            | ElementType::Number
            | ElementType::String => map.serialize_entry(key, &Empty {})?,
            ElementType::List(inner) | ElementType::Set(inner) | ElementType::Map(inner) => {
                map.serialize_entry(key, &Wrapped { element_type: inner })?
            }
            ElementType::Object(fields) => {
                let attribute_types = fields
                    .iter()
                    .map(|(name, element_type)| ObjectField { name, element_type })
                    .collect();
                map.serialize_entry(key, &ObjectType { attribute_types })?
            }
        }
        map.end()
    }
}
