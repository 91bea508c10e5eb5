//! Engine configuration.

use ontograph_schema::registry::DEFAULT_MAX_DEPTH;
use ontograph_sparql::Namespaces;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_PENDING_ADDRESS: &str = "https://pending.schema.org";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Prefix → namespace IRI; `rdf`, `rdfs` and `xsd` are implied.
    pub namespaces: Namespaces,
    /// Terms marked as part of this IRI are hidden from the type graph.
    pub pending_address: String,
    /// Recursion bound for shapes, condensation and hydration.
    pub max_depth: usize,
    pub store: StoreConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            namespaces: Namespaces::new().with("schema", "https://schema.org/"),
            pending_address: DEFAULT_PENDING_ADDRESS.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            store: StoreConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub query_endpoint: String,
    pub update_endpoint: String,
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            query_endpoint: "http://localhost:3030/ds/query".to_string(),
            update_endpoint: "http://localhost:3030/ds/update".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl EngineConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }
}
