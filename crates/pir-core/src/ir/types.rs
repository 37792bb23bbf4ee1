use serde::Serialize;

use super::attributes::Attribute;

/// Version of the IR document format.
pub const IR_VERSION: &str = "0.1";

/// The generated provider schema document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrSpec {
    pub version: String,
    pub provider: IrProvider,
    pub resources: Vec<IrResource>,
    pub data_sources: Vec<IrDataSource>,
}

impl IrSpec {
    pub fn resource(&self, name: &str) -> Option<&IrResource> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub fn data_source(&self, name: &str) -> Option<&IrDataSource> {
        self.data_sources.iter().find(|d| d.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrProvider {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<IrSchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrResource {
    pub name: String,
    pub schema: IrSchema,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrDataSource {
    pub name: String,
    pub schema: IrSchema,
}

/// An ordered attribute tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct IrSchema {
    pub attributes: Vec<Attribute>,
}

impl IrSchema {
    pub fn attribute(&self, path: &str) -> Option<&Attribute> {
        Attribute::find(&self.attributes, path)
    }
}
