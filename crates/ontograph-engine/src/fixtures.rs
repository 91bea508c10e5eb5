//! Shared test ontology.

use ontograph_schema::{InMemoryOntology, TypeRegistry};
use ontograph_sparql::{Fragment, Row, Term};

pub(crate) fn ontology() -> InMemoryOntology {
    InMemoryOntology::new("schema")
        .class("Thing", "The most generic type of item.", &[])
        .class("Person", "A person (alive, dead, undead, or fictional).", &["Thing"])
        .class("Organization", "An organization such as a school or club.", &["Thing"])
        .property("name", "The name of the item.", &["Thing"], &["Text"])
        .property("age", "Age in years.", &["Person"], &["Integer"])
        .property("url", "URL of the item.", &["Thing"], &["URL"])
        .property("knows", "The most generic bi-directional social relation.", &["Person"], &["Person"])
        .property("memberOf", "An Organization the person belongs to.", &["Person"], &["Organization"])
}

pub(crate) fn registry() -> TypeRegistry {
    TypeRegistry::new(ontology())
}

pub(crate) fn rendered(fragments: &[Fragment]) -> Vec<String> {
    fragments
        .iter()
        .map(|fragment| match fragment {
            Fragment::Triple(t) => t.to_string(),
            Fragment::Filter(e) => format!("FILTER({e})"),
            other => format!("{other:?}"),
        })
        .collect()
}

pub(crate) fn row(bindings: &[(&str, &str)]) -> Row {
    bindings
        .iter()
        .map(|(name, value)| {
            let term = if value.starts_with("urn:") || value.starts_with("http") {
                Term::iri(*value)
            } else {
                Term::plain(*value)
            };
            (name.to_string(), term)
        })
        .collect()
}
