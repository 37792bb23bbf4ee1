use crate::config::OperationRef;
use crate::error::{ExploreError, SchemaError, SchemaErrorKind};
use crate::parse::operation::{HttpMethod, Operation};
use crate::parse::parameter::{Parameter, ParameterOrRef};
use crate::parse::request_body::RequestBodyOrRef;
use crate::parse::response::ResponseOrRef;
use crate::parse::schema::SchemaOrRef;
use crate::parse::source_map::SourceMap;
use crate::parse::spec::OpenApiSpec;

/// A configured operation located in a resolved document.
#[derive(Debug, Clone)]
pub struct ExploredOperation<'a> {
    pub path: &'a str,
    pub method: HttpMethod,
    pub operation: &'a Operation,
    /// Path-item parameters merged with the operation's own, the latter
    /// winning on matching name and location.
    pub parameters: Vec<&'a Parameter>,
}

/// Find the operation a config entry points at.
pub fn explore<'a>(
    spec: &'a OpenApiSpec,
    target: &OperationRef,
) -> Result<ExploredOperation<'a>, ExploreError> {
    let method: HttpMethod = target
        .method
        .parse()
        .map_err(ExploreError::InvalidOperation)?;
    let (path, item) = spec
        .paths
        .get_key_value(target.path.as_str())
        .ok_or_else(|| ExploreError::PathNotFound(target.path.clone()))?;
    let operation = item
        .operation(method)
        .ok_or_else(|| ExploreError::OperationNotFound {
            method: method.to_string(),
            path: target.path.clone(),
        })?;

    let mut parameters: Vec<&Parameter> = inline_parameters(&item.parameters)?;
    for param in inline_parameters(&operation.parameters)? {
        match parameters
            .iter_mut()
            .find(|p| p.name == param.name && p.location == param.location)
        {
            Some(existing) => *existing = param,
            None => parameters.push(param),
        }
    }

    Ok(ExploredOperation {
        path: path.as_str(),
        method,
        operation,
        parameters,
    })
}

fn inline_parameters(params: &[ParameterOrRef]) -> Result<Vec<&Parameter>, ExploreError> {
    params
        .iter()
        .map(|p| match p {
            ParameterOrRef::Parameter(param) => Ok(param),
            ParameterOrRef::Ref { ref_path } => {
                Err(ExploreError::UnresolvedParameter(ref_path.clone()))
            }
        })
        .collect()
}

impl<'a> ExploredOperation<'a> {
    /// The request body schema, preferring JSON.
    pub fn request_schema(&self) -> Result<&'a SchemaOrRef, SchemaError> {
        let not_found =
            || SchemaError::not_found(format!("{} {} request body", self.method, self.path));
        match self.operation.request_body.as_ref() {
            Some(RequestBodyOrRef::RequestBody(body)) => body.schema().ok_or_else(not_found),
            Some(RequestBodyOrRef::Ref { ref_path }) => Err(unresolved(ref_path)),
            None => Err(not_found()),
        }
    }

    /// The success response schema. The status code is chosen first: `200`,
    /// then `201`, then the first other `2xx` code in lexicographic order. A
    /// chosen response without a body has no schema.
    pub fn response_schema(&self) -> Result<&'a SchemaOrRef, SchemaError> {
        let not_found = || {
            SchemaError::not_found(format!("{} {} success response body", self.method, self.path))
        };
        let responses = &self.operation.responses;

        let mut codes: Vec<&str> = responses
            .keys()
            .map(String::as_str)
            .filter(|code| code.starts_with('2') && !matches!(*code, "200" | "201"))
            .collect();
        codes.sort_unstable();

        let response = ["200", "201"]
            .into_iter()
            .chain(codes)
            .find_map(|code| responses.get(code))
            .ok_or_else(not_found)?;
        match response {
            ResponseOrRef::Response(response) => response.schema().ok_or_else(not_found),
            ResponseOrRef::Ref { ref_path } => Err(unresolved(ref_path)),
        }
    }

    /// 1-based line of this operation in the source document.
    pub fn line(&self, source: Option<&SourceMap>) -> Option<usize> {
        source?.locate(&["paths", self.path, self.method.key()])
    }
}

fn unresolved(ref_path: &str) -> SchemaError {
    SchemaErrorKind::UnresolvedReference(ref_path.to_string()).into()
}
