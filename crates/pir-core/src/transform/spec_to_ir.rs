use std::fmt;

use indexmap::IndexMap;

use crate::config::{
    AttributeOverride, DataSourceConfig, GeneratorConfig, OperationRef, ProviderConfig,
    ResourceConfig, SchemaOptions,
};
use crate::error::{ExploreError, SchemaError, TransformError};
use crate::ir::*;
use crate::parse::parameter::ParameterLocation;
use crate::parse::ref_resolve::{RefResolver, parse_ref_name};
use crate::parse::schema::SchemaOrRef;
use crate::parse::source_map::SourceMap;
use crate::parse::spec::OpenApiSpec;

use super::attributes::{AttributeBuilder, SchemaFlavor};
use super::explorer::{ExploredOperation, explore};
use super::merge::{MergeMismatch, merge_attributes_with};
use super::name_normalizer::to_identifier;
use super::resolved_schema::{GlobalOptions, ResolvedSchema, SchemaKind};

/// Whether a skipped entry was a resource or a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Resource,
    DataSource,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Resource => "resource",
            EntryKind::DataSource => "data source",
        }
    }
}

/// A resource or data source left out of the IR, with the reason.
#[derive(Debug)]
pub struct Skipped {
    pub kind: EntryKind,
    pub name: String,
    pub error: TransformError,
}

impl fmt::Display for Skipped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skipping '{}': {}", self.name, self.error)
    }
}

/// The IR plus everything that could not be generated.
#[derive(Debug)]
pub struct Generated {
    pub ir: IrSpec,
    pub skipped: Vec<Skipped>,
}

/// Generate the provider IR for a parsed OpenAPI document.
pub fn generate(spec: &OpenApiSpec, config: &GeneratorConfig) -> Result<Generated, TransformError> {
    generate_with_source(spec, config, None)
}

/// Generate, attaching source line numbers from `source` to schema errors.
///
/// Document-level failures (reference resolution, the provider schema) are
/// returned as errors. A resource or data source that fails is skipped with
/// a warning and reported in [`Generated::skipped`].
pub fn generate_with_source(
    spec: &OpenApiSpec,
    config: &GeneratorConfig,
    source: Option<&SourceMap>,
) -> Result<Generated, TransformError> {
    // Phase 1: Resolve $ref pointers; broken ones surface per resource
    let resolved = RefResolver::new(spec).resolve_spec(spec);
    let ctx = Context {
        spec: &resolved,
        source,
    };

    // Phase 2: Provider block
    let provider = ctx.provider(&config.provider)?;

    let mut skipped = Vec::new();
    let mut skip = |kind: EntryKind, name: &str, error: TransformError| {
        let entry = Skipped {
            kind,
            name: name.to_string(),
            error,
        };
        log::warn!("{entry}");
        skipped.push(entry);
    };

    // Phase 3: Resources
    let mut resources = Vec::new();
    for (name, resource) in &config.resources {
        match ctx.resource(name, resource) {
            Ok(schema) => resources.push(IrResource {
                name: name.clone(),
                schema,
            }),
            Err(e) => skip(EntryKind::Resource, name, e),
        }
    }

    // Phase 4: Data sources
    let mut data_sources = Vec::new();
    for (name, data_source) in &config.data_sources {
        match ctx.data_source(name, data_source) {
            Ok(schema) => data_sources.push(IrDataSource {
                name: name.clone(),
                schema,
            }),
            Err(e) => skip(EntryKind::DataSource, name, e),
        }
    }

    Ok(Generated {
        ir: IrSpec {
            version: IR_VERSION.to_string(),
            provider,
            resources,
            data_sources,
        },
        skipped,
    })
}

/// How parameters contribute attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParameterMode {
    /// Resource lookups: always `computed_optional`.
    Lookup,
    /// Data source arguments: `required` when the parameter is.
    Argument,
}

struct Context<'a> {
    spec: &'a OpenApiSpec,
    source: Option<&'a SourceMap>,
}

impl<'a> Context<'a> {
    fn provider(&self, config: &ProviderConfig) -> Result<IrProvider, TransformError> {
        let Some(schema_ref) = config.schema_ref.as_deref() else {
            return Ok(IrProvider {
                name: config.name.clone(),
                schema: None,
            });
        };

        let name = parse_ref_name(schema_ref, "schemas")?;
        let line = self
            .source
            .and_then(|s| s.locate(&["components", "schemas", name]));
        let attributes = self
            .spec
            .components
            .as_ref()
            .and_then(|c| c.schemas.get(name))
            .ok_or_else(|| SchemaError::not_found(schema_ref))
            .and_then(|schema| {
                let node = ResolvedSchema::resolve(schema, GlobalOptions::default())?;
                AttributeBuilder::new(SchemaFlavor::Provider)
                    .with_ignores(&config.ignores)
                    .with_source(self.source)
                    .build_attributes(&node)
            })
            .map_err(|e| TransformError::Provider(e.with_line(line)))?;

        Ok(IrProvider {
            name: config.name.clone(),
            schema: Some(IrSchema { attributes }),
        })
    }

    fn resource(&self, name: &str, config: &ResourceConfig) -> Result<IrSchema, TransformError> {
        let create = self.operation(name, "create", config.create.as_ref())?;
        let read = self.operation(name, "read", config.read.as_ref())?;
        let update = config
            .update
            .as_ref()
            .map(|op| explore(self.spec, op))
            .transpose()?;
        let builder = AttributeBuilder::new(SchemaFlavor::Resource)
            .with_ignores(&config.schema.ignores)
            .with_source(self.source);

        let at = |op: &ExploredOperation<'_>| {
            let line = op.line(self.source);
            move |e: SchemaError| e.with_line(line)
        };

        let primary = create
            .request_schema()
            .and_then(|schema| body_attributes(&builder, schema, GlobalOptions::default()))
            .map_err(at(&create))?;

        let computed = GlobalOptions::forced(Computability::Computed);
        let create_response =
            optional_body(&builder, create.response_schema(), computed).map_err(at(&create))?;
        let read_response =
            optional_body(&builder, read.response_schema(), computed).map_err(at(&read))?;
        let update_request = match &update {
            Some(update) => optional_body(
                &builder,
                update.request_schema(),
                GlobalOptions::forced(Computability::ComputedOptional),
            )
            .map_err(at(update))?,
            None => Vec::new(),
        };
        let parameters =
            parameter_attributes(&builder, &read, &config.schema, ParameterMode::Lookup)
                .map_err(at(&read))?;

        let mut attributes = merge_attributes_with(
            primary,
            [create_response, read_response, update_request, parameters],
            |m| log_mismatch(name, m),
        );
        apply_overrides(name, &mut attributes, &config.schema.attributes.overrides);
        Ok(IrSchema { attributes })
    }

    fn data_source(&self, name: &str, config: &DataSourceConfig) -> Result<IrSchema, TransformError> {
        let read = self.operation(name, "read", config.read.as_ref())?;
        let builder = AttributeBuilder::new(SchemaFlavor::DataSource)
            .with_ignores(&config.schema.ignores)
            .with_source(self.source);
        let line = read.line(self.source);

        let parameters =
            parameter_attributes(&builder, &read, &config.schema, ParameterMode::Argument)
                .map_err(|e| e.with_line(line))?;

        let response = read
            .response_schema()
            .and_then(|schema| {
                let node =
                    ResolvedSchema::resolve(schema, GlobalOptions::forced(Computability::Computed))?;
                if node.kind == SchemaKind::Array {
                    let attribute =
                        builder.build_attribute(&to_identifier(name), &node, Computability::Computed)?;
                    Ok(vec![attribute])
                } else {
                    builder.build_attributes(&node)
                }
            })
            .map_err(|e| e.with_line(line))?;

        let mut attributes =
            merge_attributes_with(parameters, [response], |m| log_mismatch(name, m));
        apply_overrides(name, &mut attributes, &config.schema.attributes.overrides);
        Ok(IrSchema { attributes })
    }

    fn operation(
        &self,
        name: &str,
        field: &str,
        operation: Option<&OperationRef>,
    ) -> Result<ExploredOperation<'a>, ExploreError> {
        let operation = operation.ok_or_else(|| {
            ExploreError::InvalidOperation(format!("'{name}' has no {field} operation configured"))
        })?;
        explore(self.spec, operation)
    }
}

fn body_attributes(
    builder: &AttributeBuilder<'_>,
    schema: &SchemaOrRef,
    global: GlobalOptions,
) -> Result<Vec<Attribute>, SchemaError> {
    let node = ResolvedSchema::resolve(schema, global)?;
    builder.build_attributes(&node)
}

/// Attributes of a body that may legitimately be absent.
fn optional_body(
    builder: &AttributeBuilder<'_>,
    schema: Result<&SchemaOrRef, SchemaError>,
    global: GlobalOptions,
) -> Result<Vec<Attribute>, SchemaError> {
    match schema {
        Ok(schema) => body_attributes(builder, schema, global),
        Err(e) if e.is_not_found() => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

/// One attribute per `path` or `query` parameter, named by its alias when
/// one is configured.
fn parameter_attributes(
    builder: &AttributeBuilder<'_>,
    operation: &ExploredOperation<'_>,
    options: &SchemaOptions,
    mode: ParameterMode,
) -> Result<Vec<Attribute>, SchemaError> {
    let aliases = &options.attributes.aliases;
    let mut attributes = Vec::new();

    for param in &operation.parameters {
        if !matches!(param.location, ParameterLocation::Path | ParameterLocation::Query) {
            continue;
        }
        let identifier = to_identifier(&param.name);
        let name = aliases
            .get(&param.name)
            .or_else(|| aliases.get(&identifier))
            .cloned()
            .unwrap_or(identifier);
        if options.ignores.contains(&name) {
            log::debug!("ignoring parameter '{}'", param.name);
            continue;
        }
        let Some(schema) = param.schema.as_ref() else {
            log::debug!("skipping parameter '{}' without a schema", param.name);
            continue;
        };

        let (global, computability) = match mode {
            ParameterMode::Lookup => (
                GlobalOptions::forced(Computability::ComputedOptional),
                Computability::ComputedOptional,
            ),
            ParameterMode::Argument if param.required => {
                (GlobalOptions::default(), Computability::Required)
            }
            ParameterMode::Argument => (GlobalOptions::default(), Computability::ComputedOptional),
        };

        let node = ResolvedSchema::resolve(schema, global)
            .map_err(|e| e.in_property(&name))?
            .with_description(param.description.as_deref());
        let mut attribute = builder.build_attribute(&name, &node, computability)?;
        if param.deprecated == Some(true) {
            attribute.kind.meta_mut().deprecation_message = Some(DEPRECATION_MESSAGE.to_string());
        }
        attributes.push(attribute);
    }

    Ok(attributes)
}

/// Replace descriptions at configured attribute paths.
fn apply_overrides(
    owner: &str,
    attributes: &mut [Attribute],
    overrides: &IndexMap<String, AttributeOverride>,
) {
    for (path, value) in overrides {
        let Some(attribute) = Attribute::find_mut(attributes, path) else {
            log::debug!("{owner}: override for unknown attribute '{path}'");
            continue;
        };
        if let Some(description) = &value.description {
            attribute.kind.meta_mut().description = Some(description.clone());
        }
    }
}

fn log_mismatch(owner: &str, mismatch: &MergeMismatch) {
    log::debug!(
        "{owner}: keeping {} for '{}', ignoring lower priority {}",
        mismatch.target,
        mismatch.path,
        mismatch.source
    );
}
