use std::fmt;

use crate::error::{SchemaError, SchemaErrorKind};
use crate::ir::Computability;
use crate::parse::schema::{AdditionalProperties, Items, Schema, SchemaOrRef, SchemaType};

use super::name_normalizer::to_identifier;

/// Nesting limit for schema traversal.
pub const MAX_SCHEMA_DEPTH: usize = 64;

/// The primitive a schema node resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl SchemaKind {
    /// `None` for `null`, which never stands on its own.
    fn from_type(t: &SchemaType) -> Result<Option<Self>, SchemaError> {
        Ok(match t {
            SchemaType::String => Some(SchemaKind::String),
            SchemaType::Integer => Some(SchemaKind::Integer),
            SchemaType::Number => Some(SchemaKind::Number),
            SchemaType::Boolean => Some(SchemaKind::Boolean),
            SchemaType::Array => Some(SchemaKind::Array),
            SchemaType::Object => Some(SchemaKind::Object),
            SchemaType::Null => None,
            SchemaType::Other(name) => {
                return Err(SchemaErrorKind::InvalidSchemaType(name.clone()).into());
            }
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::String => "string",
            SchemaKind::Integer => "integer",
            SchemaKind::Number => "number",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Array => "array",
            SchemaKind::Object => "object",
        }
    }

    /// Kinds an API may also accept encoded as a string.
    fn is_stringable(&self) -> bool {
        matches!(
            self,
            SchemaKind::String | SchemaKind::Integer | SchemaKind::Number | SchemaKind::Boolean
        )
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options propagated unchanged to every node beneath the one they were
/// set on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlobalOptions {
    /// When set, replaces all computability inference below this node.
    pub forced_computability: Option<Computability>,
}

impl GlobalOptions {
    pub fn forced(computability: Computability) -> Self {
        Self {
            forced_computability: Some(computability),
        }
    }
}

/// A property of an object node, keyed by its attribute identifier.
#[derive(Debug, Clone)]
pub struct Property<'a> {
    pub name: String,
    pub original: &'a str,
    pub schema: &'a SchemaOrRef,
}

/// A schema node with its composition sugar collapsed to one kind.
#[derive(Debug, Clone)]
pub struct ResolvedSchema<'a> {
    /// The effective schema after unwrapping `allOf`/`anyOf`/`oneOf`.
    pub schema: &'a Schema,
    pub kind: SchemaKind,
    pub format: Option<&'a str>,
    pub description: Option<&'a str>,
    pub global: GlobalOptions,
    /// Key path of this node in the source document, empty when unknown.
    pub location: Vec<&'a str>,
    depth: usize,
}

/// Either a concrete node or a bare `null` branch of a union.
enum Branch<'a> {
    Null,
    Node(ResolvedSchema<'a>),
}

impl<'a> Branch<'a> {
    fn kind(&self) -> Option<SchemaKind> {
        match self {
            Branch::Null => None,
            Branch::Node(node) => Some(node.kind),
        }
    }

    fn described_by(self, description: Option<&'a str>) -> Self {
        match self {
            Branch::Node(mut node) => {
                if description.is_some() {
                    node.description = description;
                }
                Branch::Node(node)
            }
            Branch::Null => Branch::Null,
        }
    }
}

impl<'a> ResolvedSchema<'a> {
    /// Resolve a root schema.
    pub fn resolve(
        schema_or_ref: &'a SchemaOrRef,
        global: GlobalOptions,
    ) -> Result<Self, SchemaError> {
        resolve_node(schema_or_ref, global, 0, Vec::new())
    }

    /// Resolve a schema nested below this one under `keys`, inheriting its
    /// options.
    fn child(
        &self,
        schema_or_ref: &'a SchemaOrRef,
        keys: &[&'a str],
    ) -> Result<ResolvedSchema<'a>, SchemaError> {
        let location = if self.location.is_empty() {
            Vec::new()
        } else {
            [self.location.as_slice(), keys].concat()
        };
        resolve_node(schema_or_ref, self.global, self.depth + 1, location)
    }

    /// Resolve one of this object's properties.
    pub fn property(&self, prop: &Property<'a>) -> Result<ResolvedSchema<'a>, SchemaError> {
        self.child(prop.schema, &["properties", prop.original])
    }

    /// Source key path of one of this object's properties.
    pub fn property_location(&self, prop: &Property<'a>) -> Option<Vec<&'a str>> {
        if self.location.is_empty() {
            return None;
        }
        Some([self.location.as_slice(), &["properties", prop.original][..]].concat())
    }

    /// Replace the description, keeping the current one when `None`.
    pub fn with_description(mut self, description: Option<&'a str>) -> Self {
        if description.is_some() {
            self.description = description;
        }
        self
    }

    /// The schema declared by `items`.
    pub fn items(&self) -> Result<ResolvedSchema<'a>, SchemaError> {
        match self.schema.items.as_deref() {
            Some(Items::Schema(items)) => self.child(items, &["items"]),
            _ => Err(SchemaErrorKind::InvalidArrayItems.into()),
        }
    }

    /// Whether this object's values are governed by an `additionalProperties`
    /// schema rather than fixed properties.
    pub fn is_map(&self) -> bool {
        self.kind == SchemaKind::Object && self.map_value_schema().is_some()
    }

    fn map_value_schema(&self) -> Option<&'a SchemaOrRef> {
        match self.schema.additional_properties.as_ref() {
            Some(AdditionalProperties::Schema(value)) => Some(value.as_ref()),
            _ => None,
        }
    }

    /// The schema of a map's values.
    pub fn map_value(&self) -> Result<ResolvedSchema<'a>, SchemaError> {
        let value = self
            .map_value_schema()
            .ok_or_else(|| SchemaError::new(SchemaErrorKind::InvalidMapSchema))?;
        self.child(value, &["additionalProperties"]).map_err(|e| match e.kind {
            SchemaErrorKind::NoTypeOrComposition => SchemaError {
                kind: SchemaErrorKind::InvalidMapSchema,
                ..e
            },
            _ => e,
        })
    }

    /// Properties sorted by identifier. A property whose identifier is
    /// already taken by an earlier one is dropped.
    pub fn properties(&self) -> Vec<Property<'a>> {
        let mut props: Vec<Property<'a>> = self
            .schema
            .properties
            .iter()
            .map(|(original, schema)| Property {
                name: to_identifier(original),
                original: original.as_str(),
                schema,
            })
            .collect();
        props.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.original.cmp(b.original)));
        props.dedup_by(|later, earlier| {
            let duplicate = later.name == earlier.name;
            if duplicate {
                log::debug!(
                    "dropping property '{}': identifier '{}' already used by '{}'",
                    later.original,
                    later.name,
                    earlier.original
                );
            }
            duplicate
        });
        props
    }

    pub fn is_required(&self, original_name: &str) -> bool {
        self.schema.required.iter().any(|r| r == original_name)
    }

    pub fn is_floating_point(&self) -> bool {
        matches!(self.format, Some("double" | "float"))
    }

    pub fn is_set(&self) -> bool {
        self.format == Some("set")
    }

    pub fn is_sensitive(&self) -> bool {
        self.format == Some("password")
    }

    pub fn is_deprecated(&self) -> bool {
        self.schema.deprecated == Some(true)
    }

    /// A literal, non-null `default`.
    pub fn default_value(&self) -> Option<&'a serde_json::Value> {
        self.schema.default_value.as_ref().filter(|v| !v.is_null())
    }
}

fn resolve_node<'a>(
    schema_or_ref: &'a SchemaOrRef,
    global: GlobalOptions,
    depth: usize,
    location: Vec<&'a str>,
) -> Result<ResolvedSchema<'a>, SchemaError> {
    match resolve_branch(schema_or_ref, global, depth, location)? {
        Branch::Node(node) => Ok(node),
        Branch::Null => Err(SchemaErrorKind::InvalidSchemaType("null".to_string()).into()),
    }
}

fn resolve_branch<'a>(
    schema_or_ref: &'a SchemaOrRef,
    global: GlobalOptions,
    depth: usize,
    location: Vec<&'a str>,
) -> Result<Branch<'a>, SchemaError> {
    if depth > MAX_SCHEMA_DEPTH {
        return Err(SchemaErrorKind::DepthExceeded(MAX_SCHEMA_DEPTH).into());
    }
    let schema = match schema_or_ref {
        SchemaOrRef::Ref { ref_path } => {
            return Err(SchemaErrorKind::UnresolvedReference(ref_path.clone()).into());
        }
        SchemaOrRef::Schema(schema) => schema.as_ref(),
    };
    // A schema inlined from a component lives in that component's text.
    let location = match schema.origin.as_deref() {
        Some(origin) => vec!["components", "schemas", origin],
        None => location,
    };

    let description = schema.description.as_deref();

    // A single allOf member is a wrapper, typically adding a description.
    match schema.all_of.len() {
        0 => {}
        1 if schema.any_of.is_empty() && schema.one_of.is_empty() => {
            let inner = resolve_branch(&schema.all_of[0], global, depth + 1, location)?;
            return Ok(inner.described_by(description));
        }
        count => return Err(composition_unsupported(count, "allOf")),
    }

    if !schema.any_of.is_empty() {
        if schema.any_of.len() != 2 || !schema.one_of.is_empty() {
            return Err(composition_unsupported(schema.any_of.len(), "anyOf"));
        }
        return resolve_pair(&schema.any_of, global, depth, location)
            .map(|b| b.described_by(description));
    }
    if !schema.one_of.is_empty() {
        if schema.one_of.len() != 2 {
            return Err(composition_unsupported(schema.one_of.len(), "oneOf"));
        }
        return resolve_pair(&schema.one_of, global, depth, location)
            .map(|b| b.described_by(description));
    }

    let types = schema
        .schema_type
        .as_ref()
        .map(|t| t.types())
        .unwrap_or_default();
    let kind = match types {
        [] if !schema.properties.is_empty() => Some(SchemaKind::Object),
        [] => return Err(SchemaErrorKind::NoTypeOrComposition.into()),
        [single] => SchemaKind::from_type(single)?,
        [first, second] => {
            let pair = [SchemaKind::from_type(first)?, SchemaKind::from_type(second)?];
            pair[collapse(pair[0], pair[1])?]
        }
        many => {
            let names = many.iter().map(|t| t.as_str().to_string()).collect();
            return Err(SchemaErrorKind::MultiTypeUnsupported(names).into());
        }
    };

    Ok(match kind {
        None => Branch::Null,
        Some(kind) => Branch::Node(ResolvedSchema {
            schema,
            kind,
            format: schema.format.as_deref(),
            description,
            global,
            location,
            depth,
        }),
    })
}

fn resolve_pair<'a>(
    members: &'a [SchemaOrRef],
    global: GlobalOptions,
    depth: usize,
    location: Vec<&'a str>,
) -> Result<Branch<'a>, SchemaError> {
    let first = resolve_branch(&members[0], global, depth + 1, location.clone())?;
    let second = resolve_branch(&members[1], global, depth + 1, location)?;
    Ok(match collapse(first.kind(), second.kind())? {
        0 => first,
        _ => second,
    })
}

/// Pick which side of a two-kind union survives, `None` standing for
/// `null`. Returns the index of the winner.
///
/// A nullable pair resolves to its non-null side; a string paired with a
/// stringable kind resolves to the string side.
fn collapse(first: Option<SchemaKind>, second: Option<SchemaKind>) -> Result<usize, SchemaError> {
    match (first, second) {
        (None, _) => Ok(1),
        (_, None) => Ok(0),
        (Some(SchemaKind::String), Some(other)) if other.is_stringable() => Ok(0),
        (Some(other), Some(SchemaKind::String)) if other.is_stringable() => Ok(1),
        (Some(a), Some(b)) => Err(SchemaErrorKind::MultiTypeUnsupported(vec![
            a.as_str().to_string(),
            b.as_str().to_string(),
        ])
        .into()),
    }
}

fn composition_unsupported(count: usize, keyword: &'static str) -> SchemaError {
    SchemaErrorKind::SchemaCompositionUnsupported { count, keyword }.into()
}
