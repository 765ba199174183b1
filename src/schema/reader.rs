//! Schema lookups backed by `terraform providers schema -json` output
//!
//! Factories only ever see the [`SchemaReader`] trait. [`ProviderSchemas`] is the
//! reader the server uses; it deserializes the JSON document Terraform prints for
//! the providers of a working directory.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Source of per-block-type schemas
pub trait SchemaReader: Send + Sync {
    /// Schema for a block given its type keyword and labels, if known
    fn lookup_block_schema(&self, block_type: &str, labels: &[String]) -> Option<BlockSchema>;
}

/// Errors while loading a schema document
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read provider schema: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid provider schema: {0}")]
    Json(#[from] serde_json::Error),
}

/// Attributes and nested blocks allowed in a block body
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BlockSchema {
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeSchema>,
    #[serde(default)]
    pub block_types: BTreeMap<String, NestedBlockSchema>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AttributeSchema {
    /// Type in Terraform's JSON encoding, e.g. `"string"` or `["list", "string"]`
    #[serde(rename = "type", default)]
    pub attr_type: Value,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub computed: bool,
}

impl AttributeSchema {
    /// Attributes only the provider sets cannot be written in configuration
    pub fn is_computed_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }

    /// Human readable type, e.g. `list(string)`
    pub fn type_name(&self) -> String {
        type_name(&self.attr_type)
    }
}

fn type_name(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(parts) => match parts.as_slice() {
            [Value::String(kind), _] if kind == "object" => "object".to_string(),
            [Value::String(kind), inner] => format!("{}({})", kind, type_name(inner)),
            [Value::String(kind), ..] => kind.clone(),
            _ => "any".to_string(),
        },
        _ => "any".to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NestedBlockSchema {
    #[serde(default)]
    pub nesting_mode: Option<String>,
    #[serde(default)]
    pub block: BlockSchema,
    #[serde(default)]
    pub min_items: Option<u64>,
    #[serde(default)]
    pub max_items: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
struct VersionedBlock {
    #[serde(default)]
    block: BlockSchema,
}

/// Everything one provider declares
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProviderSchema {
    #[serde(default)]
    provider: Option<VersionedBlock>,
    #[serde(default)]
    resource_schemas: BTreeMap<String, VersionedBlock>,
    #[serde(default)]
    data_source_schemas: BTreeMap<String, VersionedBlock>,
}

impl ProviderSchema {
    pub fn provider(&self) -> Option<&BlockSchema> {
        self.provider.as_ref().map(|p| &p.block)
    }

    pub fn resource(&self, name: &str) -> Option<&BlockSchema> {
        self.resource_schemas.get(name).map(|r| &r.block)
    }

    pub fn data_source(&self, name: &str) -> Option<&BlockSchema> {
        self.data_source_schemas.get(name).map(|d| &d.block)
    }
}

/// The document printed by `terraform providers schema -json`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProviderSchemas {
    #[serde(default)]
    pub format_version: Option<String>,
    /// Keyed by provider address (`registry.terraform.io/hashicorp/aws`, or just
    /// `aws` for older Terraform releases)
    #[serde(default)]
    pub provider_schemas: BTreeMap<String, ProviderSchema>,
}

impl ProviderSchemas {
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, SchemaError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Provider whose address ends with the given local name
    pub fn provider(&self, local_name: &str) -> Option<&ProviderSchema> {
        self.provider_schemas
            .iter()
            .find(|(address, _)| address.rsplit('/').next() == Some(local_name))
            .map(|(_, schema)| schema)
    }
}

impl SchemaReader for ProviderSchemas {
    fn lookup_block_schema(&self, block_type: &str, labels: &[String]) -> Option<BlockSchema> {
        let name = labels.first()?;
        let providers = self.provider_schemas.values();

        let schema = match block_type {
            "provider" => self.provider(name)?.provider(),
            "resource" => providers.filter_map(|p| p.resource(name)).next(),
            "data" => providers.filter_map(|p| p.data_source(name)).next(),
            _ => None,
        };

        schema.cloned()
    }
}
