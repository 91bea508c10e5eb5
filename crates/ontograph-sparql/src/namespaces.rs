//! Prefix bindings emitted as the `PREFIX` prologue of every statement.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

/// Ordered prefix → namespace IRI map.
///
/// `rdf`, `rdfs` and `xsd` are always bound; user prefixes may not rebind them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "IndexMap<String, String>", into = "IndexMap<String, String>")]
pub struct Namespaces {
    bindings: IndexMap<String, String>,
}

impl Default for Namespaces {
    fn default() -> Self {
        let mut bindings = IndexMap::new();
        bindings.insert("rdf".to_string(), RDF.to_string());
        bindings.insert("rdfs".to_string(), RDFS.to_string());
        bindings.insert("xsd".to_string(), XSD.to_string());
        Self { bindings }
    }
}

impl Namespaces {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, prefix: impl Into<String>, iri: impl Into<String>) -> Self {
        self.bind(prefix, iri);
        self
    }

    pub fn is_builtin(prefix: &str) -> bool {
        matches!(prefix, "rdf" | "rdfs" | "xsd")
    }

    /// Bind `prefix`. Returns false when the prefix is one of the built-ins.
    pub fn bind(&mut self, prefix: impl Into<String>, iri: impl Into<String>) -> bool {
        let prefix = prefix.into();
        if Self::is_builtin(&prefix) {
            return false;
        }
        self.bindings.insert(prefix, iri.into());
        true
    }

    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.bindings.get(prefix).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Bindings other than `rdf`, `rdfs` and `xsd`.
    pub fn user_bindings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(prefix, _)| !Self::is_builtin(prefix))
    }

    pub fn prologue(&self) -> String {
        self.iter()
            .map(|(prefix, iri)| format!("PREFIX {prefix}: <{iri}>\n"))
            .collect()
    }
}

impl From<IndexMap<String, String>> for Namespaces {
    fn from(map: IndexMap<String, String>) -> Self {
        let mut out = Namespaces::default();
        for (prefix, iri) in map {
            out.bind(prefix, iri);
        }
        out
    }
}

impl From<Namespaces> for IndexMap<String, String> {
    fn from(ns: Namespaces) -> Self {
        ns.bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_cannot_be_rebound() {
        let mut ns = Namespaces::new();
        assert!(!ns.bind("xsd", "http://example.org/"));
        assert_eq!(ns.resolve("xsd"), Some(XSD));
    }

    #[test]
    fn prologue_keeps_binding_order() {
        let ns = Namespaces::new().with("schema", "https://schema.org/");
        let prologue = ns.prologue();
        let lines: Vec<_> = prologue.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[3], "PREFIX schema: <https://schema.org/>");
    }

    #[test]
    fn deserializes_from_plain_map() {
        let ns: Namespaces =
            serde_json::from_str(r#"{"schema":"https://schema.org/"}"#).unwrap();
        assert_eq!(ns.resolve("schema"), Some("https://schema.org/"));
        assert_eq!(ns.resolve("rdf"), Some(RDF));
    }
}
