use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::schema::SchemaOrRef;

/// Media type preferred when a body is offered in several encodings.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// A media type object inside a request or response `content` map.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MediaType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaOrRef>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,
}

/// Pick the body schema from a `content` map.
///
/// `application/json` wins when it declares a schema; otherwise the
/// lexicographically first media type with a schema is used.
pub fn preferred_schema(content: &IndexMap<String, MediaType>) -> Option<&SchemaOrRef> {
    if let Some(schema) = content.get(JSON_MEDIA_TYPE).and_then(|mt| mt.schema.as_ref()) {
        return Some(schema);
    }
    let mut candidates: Vec<(&String, &SchemaOrRef)> = content
        .iter()
        .filter_map(|(name, mt)| mt.schema.as_ref().map(|s| (name, s)))
        .collect();
    candidates.sort_by(|a, b| a.0.cmp(b.0));
    candidates.into_iter().next().map(|(_, schema)| schema)
}
