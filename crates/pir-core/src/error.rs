use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported OpenAPI version: {0}")]
    UnsupportedVersion(String),
}

impl ParseError {
    /// 1-based line of a decoding failure, when the decoder reports one.
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::Yaml(e) => e.location().map(|loc| loc.line()),
            ParseError::Json(e) => Some(e.line()).filter(|line| *line > 0),
            ParseError::UnsupportedVersion(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid reference format: {0}")]
    InvalidRefFormat(String),

    #[error("reference target not found: {0}")]
    RefTargetNotFound(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("invalid generator config:\n{}", .0.join("\n"))]
    Invalid(Vec<String>),
}

/// A configured operation could not be found in the document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExploreError {
    #[error("path '{0}' not found in OpenAPI document")]
    PathNotFound(String),

    #[error("{method} operation not found on path '{path}'")]
    OperationNotFound { method: String, path: String },

    #[error("{0}")]
    InvalidOperation(String),

    #[error("unresolved parameter reference '{0}'")]
    UnresolvedParameter(String),
}

/// What went wrong while resolving or building a single schema node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaErrorKind {
    #[error("no 'type' array or supported allOf/oneOf/anyOf constraint")]
    NoTypeOrComposition,

    #[error("unsupported multi-type, attribute cannot be created: {}", .0.join(", "))]
    MultiTypeUnsupported(Vec<String>),

    #[error("invalid schema type '{0}'")]
    InvalidSchemaType(String),

    #[error("found {count} {keyword} subschema(s), schema composition is currently not supported")]
    SchemaCompositionUnsupported { count: usize, keyword: &'static str },

    #[error("invalid array type, doesn't have a schema")]
    InvalidArrayItems,

    #[error("invalid map type, additionalProperties doesn't declare a value type")]
    InvalidMapSchema,

    #[error("unresolved schema reference '{0}'")]
    UnresolvedReference(String),

    #[error("schema nesting exceeds the maximum depth of {0}")]
    DepthExceeded(usize),

    #[error("no schema found: {0}")]
    SchemaNotFound(String),
}

/// A schema failure with the dotted property path and source line it
/// occurred at.
///
/// Path segments are prepended as the error propagates out of nested
/// properties; the line is filled by the innermost frame that knows one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    pub kind: SchemaErrorKind,
    pub path: Vec<String>,
    pub line: Option<usize>,
}

impl SchemaError {
    pub fn new(kind: SchemaErrorKind) -> Self {
        Self {
            kind,
            path: Vec::new(),
            line: None,
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::new(SchemaErrorKind::SchemaNotFound(what.into()))
    }

    /// Prepend a property name to the path.
    pub fn in_property(mut self, name: &str) -> Self {
        self.path.insert(0, name.to_string());
        self
    }

    /// Attach a line number unless a more specific one is already present.
    pub fn with_line(mut self, line: Option<usize>) -> Self {
        if self.line.is_none() {
            self.line = line;
        }
        self
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, SchemaErrorKind::SchemaNotFound(_))
    }

    /// The dotted property path, empty at the root.
    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }
}

impl From<SchemaErrorKind> for SchemaError {
    fn from(kind: SchemaErrorKind) -> Self {
        SchemaError::new(kind)
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.path.is_empty() {
            write!(f, "{}: ", self.dotted_path())?;
        }
        write!(f, "{}", self.kind)?;
        if let Some(line) = self.line {
            write!(f, " (line {line})")?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaError {}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Explore(#[from] ExploreError),

    #[error("{0}")]
    Schema(#[from] SchemaError),

    #[error("provider schema: {0}")]
    Provider(SchemaError),
}
