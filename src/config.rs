//! Server configuration from LSP initialization options
//!
//! ```json
//! {
//!   "terraformVersion": "1.5.7",
//!   "providerSchemaPath": "/path/to/schema.json"
//! }
//! ```
//!
//! The schema file is the output of `terraform providers schema -json`.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::schema::{ProviderSchemas, SchemaReader};
use crate::version::DEFAULT_TERRAFORM_VERSION;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub terraform_version: Option<String>,
    pub provider_schema_path: Option<PathBuf>,
}

impl ServerConfig {
    /// Read the configuration from `initializationOptions`, falling back to the
    /// defaults when they are missing or malformed
    pub fn from_initialization_options(options: Option<Value>) -> Self {
        let Some(options) = options else {
            return Self::default();
        };

        match serde_json::from_value(options) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("Ignoring invalid initialization options: {}", err);
                Self::default()
            }
        }
    }

    pub fn terraform_version(&self) -> &str {
        self.terraform_version
            .as_deref()
            .unwrap_or(DEFAULT_TERRAFORM_VERSION)
    }

    /// Load the configured provider schema. A missing or broken file leaves the
    /// server without schema rather than failing initialization.
    pub fn load_schema_reader(&self) -> Option<Arc<dyn SchemaReader>> {
        let path = self.provider_schema_path.as_ref()?;

        match ProviderSchemas::load(path) {
            Ok(schemas) => {
                tracing::info!(
                    "Loaded schemas for {} provider(s) from {}",
                    schemas.provider_schemas.len(),
                    path.display()
                );
                Some(Arc::new(schemas))
            }
            Err(err) => {
                tracing::warn!("{}: {}", path.display(), err);
                None
            }
        }
    }
}
