use std::collections::HashSet;

use indexmap::IndexMap;

use super::components::Components;
use super::media_type::MediaType;
use super::operation::{Operation, PathItem};
use super::parameter::{Parameter, ParameterOrRef};
use super::request_body::{RequestBody, RequestBodyOrRef};
use super::response::{Response, ResponseOrRef};
use super::schema::{AdditionalProperties, Items, Schema, SchemaOrRef};
use super::spec::OpenApiSpec;
use crate::error::ResolveError;

/// Resolves internal `$ref` pointers in an OpenAPI document, producing a
/// document where every schema reachable from an operation is inlined.
///
/// A reference that cannot be resolved is left in place: a schema reference
/// already being expanded further up the current branch (so circular schemas
/// terminate), or one whose target is missing or malformed. Whoever reads the
/// node later reports it, so a bad reference only affects the resources that
/// actually use it.
///
/// Inlined component schemas remember their component name in
/// [`Schema::origin`], which lets diagnostics point back at the source.
pub struct RefResolver<'a> {
    components: Option<&'a Components>,
    visited: HashSet<String>,
}

impl<'a> RefResolver<'a> {
    pub fn new(spec: &'a OpenApiSpec) -> Self {
        Self {
            components: spec.components.as_ref(),
            visited: HashSet::new(),
        }
    }

    /// Resolve the entire document, returning a copy with references inlined.
    pub fn resolve_spec(&mut self, spec: &OpenApiSpec) -> OpenApiSpec {
        let mut resolved = spec.clone();

        for item in resolved.paths.values_mut() {
            self.resolve_path_item(item);
        }

        if let Some(ref mut components) = resolved.components {
            for (name, schema) in components.schemas.iter_mut() {
                *schema = self.resolve_schema_or_ref(schema);
                if let SchemaOrRef::Schema(inlined) = schema {
                    inlined.origin.get_or_insert_with(|| name.clone());
                }
            }
        }

        resolved
    }

    fn resolve_path_item(&mut self, item: &mut PathItem) {
        item.parameters = self.resolve_parameters(&item.parameters);
        for op in item.each_operation_mut() {
            self.resolve_operation(op);
        }
    }

    fn resolve_operation(&mut self, op: &mut Operation) {
        op.parameters = self.resolve_parameters(&op.parameters);

        if let Some(ref body) = op.request_body {
            op.request_body = Some(self.resolve_request_body_or_ref(body));
        }

        let mut resolved_responses = IndexMap::new();
        for (status, resp) in &op.responses {
            resolved_responses.insert(status.clone(), self.resolve_response_or_ref(resp));
        }
        op.responses = resolved_responses;
    }

    fn resolve_parameters(&mut self, params: &[ParameterOrRef]) -> Vec<ParameterOrRef> {
        params
            .iter()
            .map(|p| self.resolve_parameter_or_ref(p))
            .collect()
    }

    pub fn resolve_schema_or_ref(&mut self, schema_or_ref: &SchemaOrRef) -> SchemaOrRef {
        match schema_or_ref {
            SchemaOrRef::Ref { ref_path } => {
                if self.visited.contains(ref_path) {
                    return schema_or_ref.clone();
                }
                let (name, target) = match self.lookup_schema(ref_path) {
                    Ok(found) => found,
                    Err(e) => return unresolved(schema_or_ref, e),
                };
                self.visited.insert(ref_path.clone());
                let mut result = self.resolve_schema_or_ref(&target);
                self.visited.remove(ref_path);
                if let SchemaOrRef::Schema(inlined) = &mut result {
                    inlined.origin.get_or_insert_with(|| name.to_string());
                }
                result
            }
            SchemaOrRef::Schema(schema) => SchemaOrRef::Schema(Box::new(self.resolve_schema(schema))),
        }
    }

    fn resolve_schema(&mut self, schema: &Schema) -> Schema {
        let mut resolved = schema.clone();

        for prop in resolved.properties.values_mut() {
            *prop = self.resolve_schema_or_ref(prop);
        }

        if let Some(ref items) = schema.items {
            let items = match items.as_ref() {
                Items::Schema(s) => Items::Schema(self.resolve_schema_or_ref(s)),
                other => other.clone(),
            };
            resolved.items = Some(Box::new(items));
        }

        resolved.all_of = self.resolve_schema_list(&schema.all_of);
        resolved.one_of = self.resolve_schema_list(&schema.one_of);
        resolved.any_of = self.resolve_schema_list(&schema.any_of);

        if let Some(AdditionalProperties::Schema(ref s)) = schema.additional_properties {
            resolved.additional_properties = Some(AdditionalProperties::Schema(Box::new(
                self.resolve_schema_or_ref(s),
            )));
        }

        resolved
    }

    fn resolve_schema_list(&mut self, schemas: &[SchemaOrRef]) -> Vec<SchemaOrRef> {
        schemas
            .iter()
            .map(|s| self.resolve_schema_or_ref(s))
            .collect()
    }

    fn resolve_parameter_or_ref(&mut self, param: &ParameterOrRef) -> ParameterOrRef {
        let mut resolved = match param {
            ParameterOrRef::Ref { ref_path } => match self.lookup_parameter(ref_path) {
                Ok(found) => found,
                Err(e) => return unresolved(param, e),
            },
            ParameterOrRef::Parameter(p) => p.clone(),
        };
        if let Some(ref s) = resolved.schema {
            resolved.schema = Some(self.resolve_schema_or_ref(s));
        }
        ParameterOrRef::Parameter(resolved)
    }

    fn resolve_request_body_or_ref(&mut self, body: &RequestBodyOrRef) -> RequestBodyOrRef {
        let mut resolved = match body {
            RequestBodyOrRef::Ref { ref_path } => match self.lookup_request_body(ref_path) {
                Ok(found) => found,
                Err(e) => return unresolved(body, e),
            },
            RequestBodyOrRef::RequestBody(rb) => rb.clone(),
        };
        self.resolve_media_types(&mut resolved.content);
        RequestBodyOrRef::RequestBody(resolved)
    }

    fn resolve_response_or_ref(&mut self, resp: &ResponseOrRef) -> ResponseOrRef {
        let mut resolved = match resp {
            ResponseOrRef::Ref { ref_path } => match self.lookup_response(ref_path) {
                Ok(found) => found,
                Err(e) => return unresolved(resp, e),
            },
            ResponseOrRef::Response(r) => r.clone(),
        };
        self.resolve_media_types(&mut resolved.content);
        ResponseOrRef::Response(resolved)
    }

    fn resolve_media_types(&mut self, content: &mut IndexMap<String, MediaType>) {
        for media_type in content.values_mut() {
            if let Some(ref s) = media_type.schema {
                media_type.schema = Some(self.resolve_schema_or_ref(s));
            }
        }
    }

    // Lookup helpers

    fn lookup_schema<'r>(&self, ref_path: &'r str) -> Result<(&'r str, SchemaOrRef), ResolveError> {
        let name = parse_ref_name(ref_path, "schemas")?;
        self.components
            .and_then(|c| c.schemas.get(name))
            .cloned()
            .map(|schema| (name, schema))
            .ok_or_else(|| ResolveError::RefTargetNotFound(ref_path.to_string()))
    }

    fn lookup_parameter(&self, ref_path: &str) -> Result<Parameter, ResolveError> {
        let name = parse_ref_name(ref_path, "parameters")?;
        self.components
            .and_then(|c| c.parameters.get(name))
            .and_then(|p| match p {
                ParameterOrRef::Parameter(param) => Some(param.clone()),
                _ => None,
            })
            .ok_or_else(|| ResolveError::RefTargetNotFound(ref_path.to_string()))
    }

    fn lookup_request_body(&self, ref_path: &str) -> Result<RequestBody, ResolveError> {
        let name = parse_ref_name(ref_path, "requestBodies")?;
        self.components
            .and_then(|c| c.request_bodies.get(name))
            .and_then(|rb| match rb {
                RequestBodyOrRef::RequestBody(body) => Some(body.clone()),
                _ => None,
            })
            .ok_or_else(|| ResolveError::RefTargetNotFound(ref_path.to_string()))
    }

    fn lookup_response(&self, ref_path: &str) -> Result<Response, ResolveError> {
        let name = parse_ref_name(ref_path, "responses")?;
        self.components
            .and_then(|c| c.responses.get(name))
            .and_then(|r| match r {
                ResponseOrRef::Response(resp) => Some(resp.clone()),
                _ => None,
            })
            .ok_or_else(|| ResolveError::RefTargetNotFound(ref_path.to_string()))
    }
}

/// Keep a reference that failed to resolve.
fn unresolved<T: Clone>(node: &T, error: ResolveError) -> T {
    log::debug!("leaving reference unresolved: {error}");
    node.clone()
}

/// Parse a `$ref` path like `#/components/schemas/Foo` and extract the name.
pub fn parse_ref_name<'a>(
    ref_path: &'a str,
    expected_section: &str,
) -> Result<&'a str, ResolveError> {
    let stripped = ref_path
        .strip_prefix("#/components/")
        .ok_or_else(|| ResolveError::InvalidRefFormat(ref_path.to_string()))?;
    let (section, name) = stripped
        .split_once('/')
        .ok_or_else(|| ResolveError::InvalidRefFormat(ref_path.to_string()))?;
    if section != expected_section {
        return Err(ResolveError::InvalidRefFormat(format!(
            "expected section '{}', got '{}' in {}",
            expected_section, section, ref_path
        )));
    }
    Ok(name)
}
