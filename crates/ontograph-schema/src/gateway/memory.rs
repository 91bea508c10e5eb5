use super::{Described, OntologyGateway};
use crate::error::SchemaError;
use crate::naming::Datatype;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parents: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub ranges: Vec<String>,
}

/// An ontology held in memory, loadable from JSON.
///
/// Every term lives in a single namespace prefix. The nine datatypes are
/// always known, with an empty description unless declared as classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryOntology {
    #[serde(default = "default_prefix")]
    pub namespace: String,
    #[serde(default)]
    pub classes: Vec<ClassSpec>,
    #[serde(default)]
    pub properties: Vec<PropertySpec>,
}

fn default_prefix() -> String {
    "schema".to_string()
}

impl Default for InMemoryOntology {
    fn default() -> Self {
        Self {
            namespace: default_prefix(),
            classes: Vec::new(),
            properties: Vec::new(),
        }
    }
}

impl InMemoryOntology {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    pub fn class(mut self, name: &str, description: &str, parents: &[&str]) -> Self {
        self.classes.push(ClassSpec {
            name: name.to_string(),
            description: description.to_string(),
            parents: parents.iter().map(|p| p.to_string()).collect(),
        });
        self
    }

    pub fn property(
        mut self,
        name: &str,
        description: &str,
        domains: &[&str],
        ranges: &[&str],
    ) -> Self {
        self.properties.push(PropertySpec {
            name: name.to_string(),
            description: description.to_string(),
            domains: domains.iter().map(|d| d.to_string()).collect(),
            ranges: ranges.iter().map(|r| r.to_string()).collect(),
        });
        self
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    fn find_class(&self, name: &str) -> Option<&ClassSpec> {
        self.classes.iter().find(|c| c.name == name)
    }

    /// The class followed by its ancestors, breadth-first, each once.
    fn lineage(&self, class: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut order = vec![class.to_string()];
        seen.insert(class.to_string());
        let mut cursor = 0;
        while cursor < order.len() {
            if let Some(spec) = self.find_class(&order[cursor]) {
                for parent in &spec.parents {
                    if seen.insert(parent.clone()) {
                        order.push(parent.clone());
                    }
                }
            }
            cursor += 1;
        }
        order
    }

    fn knows(&self, name: &str) -> bool {
        Datatype::from_unsafe(name).is_some()
            || self.find_class(name).is_some()
            || self.properties.iter().any(|p| p.name == name)
    }
}

impl OntologyGateway for InMemoryOntology {
    fn class_description(&self, name: &str) -> Result<Option<String>, SchemaError> {
        if let Some(spec) = self.find_class(name) {
            return Ok(Some(spec.description.clone()));
        }
        Ok(Datatype::from_unsafe(name).map(|_| String::new()))
    }

    fn class_list(&self) -> Result<Vec<Described>, SchemaError> {
        let mut classes: Vec<Described> = self
            .classes
            .iter()
            .map(|c| Described::new(&c.name, &c.description))
            .collect();
        classes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(classes)
    }

    fn properties_of(&self, class: &str) -> Result<Vec<Described>, SchemaError> {
        let mut out: Vec<Described> = Vec::new();
        for ancestor in self.lineage(class) {
            for property in &self.properties {
                if property.domains.contains(&ancestor)
                    && !out.iter().any(|d| d.name == property.name)
                {
                    out.push(Described::new(&property.name, &property.description));
                }
            }
        }
        Ok(out)
    }

    fn ranges_of(&self, property: &str) -> Result<Vec<Described>, SchemaError> {
        let Some(spec) = self.properties.iter().find(|p| p.name == property) else {
            return Ok(Vec::new());
        };
        let mut ranges: Vec<Described> = spec
            .ranges
            .iter()
            .map(|range| {
                let description = self
                    .find_class(range)
                    .map(|c| c.description.clone())
                    .unwrap_or_default();
                Described::new(range, description)
            })
            .collect();
        ranges.sort_by(|a, b| a.name.cmp(&b.name));
        ranges.dedup_by(|a, b| a.name == b.name);
        Ok(ranges)
    }

    fn namespace_for(&self, local_name: &str) -> Result<String, SchemaError> {
        if self.knows(local_name) {
            Ok(self.namespace.clone())
        } else {
            Err(SchemaError::UnknownNamespace(local_name.to_string()))
        }
    }
}
