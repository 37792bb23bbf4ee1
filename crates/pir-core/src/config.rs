use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::parse::operation::HttpMethod;
use crate::transform::name_normalizer::is_identifier;

/// Default generator config file name.
pub const CONFIG_FILE_NAME: &str = "generator_config.yml";

/// Which operations and schema options make up the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub provider: ProviderConfig,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub resources: IndexMap<String, ResourceConfig>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub data_sources: IndexMap<String, DataSourceConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    /// Component schema describing the provider block, e.g.
    /// `#/components/schemas/ProviderConfig`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignores: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub create: Option<OperationRef>,
    pub read: Option<OperationRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<OperationRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<OperationRef>,
    #[serde(default)]
    pub schema: SchemaOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSourceConfig {
    pub read: Option<OperationRef>,
    #[serde(default)]
    pub schema: SchemaOptions,
}

/// A path and method in the OpenAPI document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRef {
    pub path: String,
    pub method: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaOptions {
    /// Dotted attribute paths left out of the schema, e.g. `owner.email`.
    pub ignores: Vec<String>,
    pub attributes: AttributeOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeOptions {
    /// Parameter name → attribute name.
    pub aliases: IndexMap<String, String>,
    /// Dotted attribute path → replacement values.
    pub overrides: IndexMap<String, AttributeOverride>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

impl GeneratorConfig {
    /// Check the config for problems serde cannot catch, reporting all of
    /// them at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if self.provider.name.is_empty() {
            problems.push("provider.name is required".to_string());
        } else if !is_identifier(&self.provider.name) {
            problems.push(format!(
                "provider.name '{}' must match [a-z_][a-z0-9_]*",
                self.provider.name
            ));
        }
        let bad_schema_ref = self
            .provider
            .schema_ref
            .as_ref()
            .filter(|r| !r.starts_with(SCHEMA_REF_PREFIX));
        if let Some(schema_ref) = bad_schema_ref {
            problems.push(format!(
                "provider.schema_ref '{schema_ref}' must start with '{SCHEMA_REF_PREFIX}'"
            ));
        }

        for (name, resource) in &self.resources {
            let owner = format!("resources.{name}");
            check_name(&owner, name, &mut problems);
            check_required(&owner, "create", resource.create.as_ref(), &mut problems);
            check_required(&owner, "read", resource.read.as_ref(), &mut problems);
            check_optional(&owner, "update", resource.update.as_ref(), &mut problems);
            check_optional(&owner, "delete", resource.delete.as_ref(), &mut problems);
        }
        for (name, data_source) in &self.data_sources {
            let owner = format!("data_sources.{name}");
            check_name(&owner, name, &mut problems);
            check_required(&owner, "read", data_source.read.as_ref(), &mut problems);
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }
}

fn check_name(owner: &str, name: &str, problems: &mut Vec<String>) {
    if !is_identifier(name) {
        problems.push(format!("{owner}: name must match [a-z_][a-z0-9_]*"));
    }
}

fn check_required(
    owner: &str,
    field: &str,
    operation: Option<&OperationRef>,
    problems: &mut Vec<String>,
) {
    match operation {
        Some(operation) => check_operation(owner, field, operation, problems),
        None => problems.push(format!("{owner}: missing '{field}' operation")),
    }
}

fn check_optional(
    owner: &str,
    field: &str,
    operation: Option<&OperationRef>,
    problems: &mut Vec<String>,
) {
    if let Some(operation) = operation {
        check_operation(owner, field, operation, problems);
    }
}

fn check_operation(owner: &str, field: &str, operation: &OperationRef, problems: &mut Vec<String>) {
    if !operation.path.starts_with('/') {
        problems.push(format!(
            "{owner}.{field}: path '{}' must start with '/'",
            operation.path
        ));
    }
    if let Err(e) = operation.method.parse::<HttpMethod>() {
        problems.push(format!("{owner}.{field}: {e}"));
    }
}

/// Load and decode a generator config file.
pub fn load_config(path: &Path) -> Result<GeneratorConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Yaml {
        path: path.display().to_string(),
        source,
    })
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r##"# pir generator configuration
provider:
  name: petstore
  # schema_ref: "#/components/schemas/ProviderConfig"
  # ignores: []

resources:
  pet:
    create:
      path: /pet
      method: POST
    read:
      path: /pet/{petId}
      method: GET
    update:
      path: /pet/{petId}
      method: PUT
    delete:
      path: /pet/{petId}
      method: DELETE
    schema:
      ignores: []             # dotted attribute paths, e.g. tags.color
      attributes:
        aliases:
          petId: id           # parameter name → attribute name
        overrides: {}
          # name:
          #   description: The pet's name

data_sources:
  pet:
    read:
      path: /pet/{petId}
      method: GET
    schema:
      attributes:
        aliases:
          petId: id
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config: GeneratorConfig = serde_yaml_ng::from_str(default_config_content()).unwrap();
        assert_eq!(config.provider.name, "petstore");
        assert_eq!(config.resources.len(), 1);
        assert_eq!(config.data_sources.len(), 1);
        assert_eq!(config.resources["pet"].schema.attributes.aliases["petId"], "id");
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r#"
provider:
  name: example
data_sources:
  things:
    read:
      path: /things
      method: get
"#;
        let config: GeneratorConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert!(config.resources.is_empty());
        assert!(config.provider.schema_ref.is_none());
        let things = &config.data_sources["things"];
        assert!(things.schema.ignores.is_empty());
        assert!(things.schema.attributes.overrides.is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_collects_all_problems() {
        let yaml = r##"
provider:
  name: Bad-Name
  schema_ref: "#/definitions/Provider"
resources:
  pet:
    read:
      path: pet/{id}
      method: FETCH
"##;
        let config: GeneratorConfig = serde_yaml_ng::from_str(yaml).unwrap();
        let err = config.validate().unwrap_err();
        insta::assert_snapshot!(err.to_string(), @r"
        invalid generator config:
        provider.name 'Bad-Name' must match [a-z_][a-z0-9_]*
        provider.schema_ref '#/definitions/Provider' must start with '#/components/schemas/'
        resources.pet: missing 'create' operation
        resources.pet.read: path 'pet/{id}' must start with '/'
        resources.pet.read: unknown HTTP method 'FETCH'
        ");
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(default_config_content().as_bytes()).unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(
            config.resources["pet"].create,
            Some(OperationRef {
                path: "/pet".to_string(),
                method: "POST".to_string(),
            })
        );
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join(CONFIG_FILE_NAME)).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
