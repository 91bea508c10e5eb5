//! Integration tests for the complete Ontograph pipeline
//!
//! These tests drive whole requests across crates:
//! - Ontology → Type registry → Condensation → Store statements
//! - Store rows → Result tree → Response document
//! - Request-scoped sharing of root computations
//!
//! Run with: cargo test --test integration_tests

use ontograph_engine::{Engine, EngineConfig, Executor, Operation, Selection};
use ontograph_schema::{InMemoryOntology, TypeRegistry};
use ontograph_sparql::{Namespaces, Row, ScriptedStore, Term};
use serde_json::{json, Value};
use std::sync::Arc;

const ONTOLOGY: &str = r#"{
    "namespace": "schema",
    "classes": [
        {"name": "Thing", "description": "The most generic type of item."},
        {"name": "Person", "description": "A person.", "parents": ["Thing"]},
        {"name": "Organization", "description": "An organization.", "parents": ["Thing"]}
    ],
    "properties": [
        {"name": "name", "description": "The name of the item.", "domains": ["Thing"], "ranges": ["Text"]},
        {"name": "knows", "description": "Acquaintance.", "domains": ["Person"], "ranges": ["Person"]},
        {"name": "memberOf", "description": "Membership.", "domains": ["Person"], "ranges": ["Organization"]}
    ]
}"#;

fn pipeline() -> (Engine, Arc<ScriptedStore>) {
    let ontology = InMemoryOntology::from_json(ONTOLOGY).expect("ontology should parse");
    let store = Arc::new(ScriptedStore::new(
        Namespaces::new().with("schema", "https://schema.org/"),
    ));
    let engine = Engine::new(Arc::new(TypeRegistry::new(ontology)), store.clone());
    (engine, store)
}

fn row(bindings: &[(&str, &str)]) -> Row {
    bindings
        .iter()
        .map(|(name, value)| {
            let term = if value.starts_with("urn:") {
                Term::iri(*value)
            } else {
                Term::plain(*value)
            };
            (name.to_string(), term)
        })
        .collect()
}

fn text_values() -> Selection {
    Selection::on("TextType", vec![Selection::field("value")])
}

fn names() -> Selection {
    Selection::field("name").with_selections(vec![text_values()])
}

fn person(arguments: Value, selections: Vec<Selection>) -> Selection {
    Selection::field("Person")
        .with_arguments(arguments)
        .with_selections(selections)
}

// ============================================================================
// Request scenarios
// ============================================================================

#[test]
fn test_scalar_insert_scoped_by_filter() {
    let (engine, store) = pipeline();
    store.respond(vec![row(&[
        ("0_Person", "urn:uuid:p1"),
        ("0_Person_name_0_TextType_value", "Foo"),
    ])]);

    let operation = Operation::mutation(vec![person(
        json!({"name": {
            "TextType": {"equalTo": "Foo"},
            "insert": {"TextType": {"value": "Bar"}}
        }}),
        vec![names()],
    )]);
    let response = Executor::new(&engine).run(&operation);

    assert_eq!(
        response,
        json!({"data": {"Person": [{"name": [{"value": "Foo"}]}]}})
    );
    let statements = store.rendered();
    assert_eq!(statements.len(), 2);
    assert!(statements[0].contains("INSERT {\n  ?0_Person schema:name \"Bar\" .\n}"));
    assert!(statements[0].contains("FILTER(?0_Person__name = \"Foo\")"));
    assert!(statements[1].contains("SELECT ?0_Person ?0_Person_name_0_TextType_value WHERE {"));
    assert_eq!(store.writes(), 1);
    assert_eq!(store.reads(), 1);
}

#[test]
fn test_nested_class_filter_query() {
    let (engine, store) = pipeline();
    store.respond(vec![row(&[
        ("0_Person", "urn:uuid:p1"),
        ("0_Person_memberOf_0_Organization", "urn:uuid:o1"),
        ("0_Person_memberOf_0_Organization_name_0_TextType_value", "Foo"),
    ])]);

    let operation = Operation::query(vec![person(
        json!({"memberOf": {"Organization": {"name": {"TextType": {"equalTo": "Foo"}}}}}),
        vec![Selection::field("memberOf")
            .with_selections(vec![Selection::on("Organization", vec![names()])])],
    )]);
    let response = Executor::new(&engine).run(&operation);

    assert_eq!(
        response,
        json!({"data": {"Person": [{"memberOf": [{"name": [{"value": "Foo"}]}]}]}})
    );
    assert_eq!(store.writes(), 0);
    let select = &store.rendered()[0];
    assert!(select.contains("?0_Person__memberOf rdf:type schema:Organization ."));
    assert!(select.contains("FILTER(?0_Person__memberOf__0__name = \"Foo\")"));
    assert!(select.contains("OPTIONAL {"));
}

#[test]
fn test_nested_insert_returns_old_and_new_values() {
    let (engine, store) = pipeline();
    let org = "0_Person_memberOf_0_Organization";
    let org_name = "0_Person_memberOf_0_Organization_name_0_TextType_value";
    store.respond(vec![
        row(&[("0_Person", "urn:uuid:p1"), (org, "urn:uuid:o1"), (org_name, "Bar")]),
        row(&[("0_Person", "urn:uuid:p1"), (org, "urn:uuid:o1"), (org_name, "Baz")]),
    ]);

    let operation = Operation::mutation(vec![person(
        json!({"memberOf": {"Organization": {"name": {
            "TextType": {"equalTo": "Bar"},
            "insert": {"TextType": {"value": "Baz"}}
        }}}}),
        vec![Selection::field("memberOf")
            .with_selections(vec![Selection::on("Organization", vec![names()])])],
    )]);
    let response = Executor::new(&engine).run(&operation);

    assert_eq!(
        response,
        json!({"data": {"Person": [{"memberOf": [{
            "name": [{"value": "Bar"}, {"value": "Baz"}]
        }]}]}})
    );
    assert_eq!(store.writes(), 1);
    let write = &store.rendered()[0];
    assert!(write.contains("?0_Person__memberOf schema:name \"Baz\" ."));
    assert!(write.contains("FILTER(?0_Person__memberOf__0__name = \"Bar\")"));
}

#[test]
fn test_class_insert_links_a_matching_entity() {
    let (engine, store) = pipeline();
    store.respond(vec![row(&[
        ("0_Person", "urn:uuid:p1"),
        ("0_Person_knows_0_Person", "urn:uuid:p2"),
        ("0_Person_knows_0_Person_name_0_TextType_value", "Foo"),
    ])]);

    let operation = Operation::mutation(vec![person(
        json!({"knows": {"insert": {"Person": {"name": {"TextType": {"equalTo": "Foo"}}}}}}),
        vec![Selection::field("knows")
            .with_selections(vec![Selection::on("Person", vec![names()])])],
    )]);
    let response = Executor::new(&engine).run(&operation);

    assert_eq!(
        response,
        json!({"data": {"Person": [{"knows": [{"name": [{"value": "Foo"}]}]}]}})
    );
    let write = &store.rendered()[0];
    assert!(write.contains("INSERT {\n  ?0_Person schema:knows ?Person_1 .\n}"));
    assert!(write.contains("?Person_1 rdf:type schema:Person ."));
    assert!(write.contains("FILTER(?Person_1__name = \"Foo\")"));
}

// ============================================================================
// Ordering and sharing
// ============================================================================

#[test]
fn test_writes_precede_the_read() {
    let (engine, store) = pipeline();
    store.respond(Vec::new());

    let operation = Operation::mutation(vec![person(
        json!({"memberOf": {
            "detach": {"confirm": true},
            "Organization": {"name": {
                "TextType": {"equalTo": "Old"},
                "replaceWith": {"TextType": {"value": "New"}}
            }}
        }}),
        vec![],
    )]);
    assert_eq!(
        Executor::new(&engine).run(&operation),
        json!({"data": {"Person": []}})
    );

    let statements = store.statements();
    assert_eq!(statements.len(), 3);
    assert!(!statements[0].is_read());
    assert!(!statements[1].is_read());
    assert!(statements[2].is_read());

    // the name replacement sits below memberOf and runs first
    let rendered = store.rendered();
    assert!(rendered[0].contains("\"New\""));
    assert!(rendered[1].contains("DELETE {\n  ?0_Person schema:memberOf ?0_Person__memberOf .\n}"));
}

#[test]
fn test_one_read_per_root_field() {
    let (engine, store) = pipeline();
    store.respond(vec![
        row(&[
            ("0_Person", "urn:uuid:p1"),
            ("0_Person_name_0_TextType_value", "Ada"),
            ("0_Person_knows_1_Person", "urn:uuid:p2"),
            ("0_Person_knows_1_Person_name_0_TextType_value", "Grace"),
        ]),
        row(&[("0_Organization", "urn:uuid:o1")]),
    ]);

    let operation = Operation::query(vec![
        person(
            json!({}),
            vec![
                names(),
                Selection::field("knows").with_selections(vec![
                    Selection::field("__typename"),
                    Selection::on("Person", vec![names()]),
                ]),
            ],
        ),
        Selection::field("Organization").with_selections(vec![Selection::field("__typename")]),
    ]);
    let response = Executor::new(&engine).run(&operation);

    assert_eq!(
        response,
        json!({"data": {
            "Person": [{
                "name": [{"value": "Ada"}],
                "knows": [{"__typename": "Person", "name": [{"value": "Grace"}]}]
            }],
            "Organization": [{"__typename": "Organization"}]
        }})
    );
    assert_eq!(store.reads(), 2);
}

#[test]
fn test_failed_request_reports_error_and_no_data() {
    let (engine, store) = pipeline();
    let operation = Operation::mutation(vec![person(
        json!({"name": {"insert": {"TextType": {"value": "Bar", "extra": 1}}}}),
        vec![names()],
    )]);
    let response = Executor::new(&engine).run(&operation);

    assert_eq!(response["data"], Value::Null);
    assert_eq!(response["errors"][0]["extensions"]["category"], "businessLogic");
    assert!(store.statements().is_empty());
}

// ============================================================================
// Documents
// ============================================================================

#[test]
fn test_request_document_round_trip() {
    let (engine, store) = pipeline();
    store.respond(vec![row(&[
        ("0_Person", "urn:uuid:p1"),
        ("0_Person_name_0_TextType_value", "Foo"),
    ])]);

    let document = r#"{
        "kind": "query",
        "selections": [{
            "kind": "field",
            "name": "Person",
            "arguments": {"name": {"TextType": {"equalTo": "Foo"}}},
            "selections": [{
                "kind": "field",
                "name": "name",
                "selections": [{
                    "kind": "inline_fragment",
                    "type_condition": "TextType",
                    "selections": [{"kind": "field", "name": "value"}]
                }]
            }]
        }]
    }"#;
    let operation = Operation::from_json(document).expect("request should parse");
    assert_eq!(
        Executor::new(&engine).run(&operation),
        json!({"data": {"Person": [{"name": [{"value": "Foo"}]}]}})
    );
}

#[test]
fn test_config_defaults_and_overrides() {
    let defaults = EngineConfig::default();
    assert_eq!(defaults.store.timeout_secs, 30);

    let config: EngineConfig = serde_json::from_str(r#"{"max_depth": 3}"#).expect("config should parse");
    assert_eq!(config.max_depth, 3);
    assert_eq!(config.store, defaults.store);
    assert_eq!(config.namespaces, defaults.namespaces);
}
