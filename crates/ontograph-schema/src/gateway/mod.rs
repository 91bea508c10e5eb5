//! Read-only access to ontology metadata.

mod memory;
mod sparql;

pub use memory::{ClassSpec, InMemoryOntology, PropertySpec};
pub use sparql::SparqlGateway;

use crate::error::SchemaError;
use serde::{Deserialize, Serialize};

/// A named ontology term with its cleaned-up comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Described {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Described {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Ontology metadata source. All names are ontology ("unsafe") spellings.
pub trait OntologyGateway: Send + Sync {
    /// `None` when the class is unknown.
    fn class_description(&self, name: &str) -> Result<Option<String>, SchemaError>;

    /// Every class, ordered by name.
    fn class_list(&self) -> Result<Vec<Described>, SchemaError>;

    /// Direct and inherited properties of a class.
    fn properties_of(&self, class: &str) -> Result<Vec<Described>, SchemaError>;

    /// Range classes and datatypes of a property, ordered by name.
    fn ranges_of(&self, property: &str) -> Result<Vec<Described>, SchemaError>;

    /// Prefix of the configured namespace that contains `local_name`.
    fn namespace_for(&self, local_name: &str) -> Result<String, SchemaError>;
}
