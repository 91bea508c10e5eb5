//! Blocking HTTP client for SPARQL 1.1 protocol endpoints.

use crate::namespaces::Namespaces;
use crate::statement::Statement;
use crate::store::{Row, StoreClient, StoreError};
use crate::term::Term;
use reqwest::blocking::Client;
use reqwest::header::{HeaderValue, ACCEPT};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const RESULTS_JSON: &str = "application/sparql-results+json";

/// Sends reads as `query=` and writes as `update=` form posts.
pub struct HttpStoreClient {
    client: Client,
    query_endpoint: String,
    update_endpoint: String,
    namespaces: Namespaces,
}

impl HttpStoreClient {
    pub fn new(
        query_endpoint: impl Into<String>,
        update_endpoint: impl Into<String>,
        namespaces: Namespaces,
        timeout_secs: u64,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| StoreError::Transport(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            query_endpoint: query_endpoint.into(),
            update_endpoint: update_endpoint.into(),
            namespaces,
        })
    }
}

impl StoreClient for HttpStoreClient {
    fn execute(&self, statement: &Statement) -> Result<Vec<Row>, StoreError> {
        let text = statement.to_sparql(&self.namespaces);
        let (endpoint, field) = if statement.is_read() {
            (&self.query_endpoint, "query")
        } else {
            (&self.update_endpoint, "update")
        };
        tracing::debug!(endpoint = %endpoint, statement = %text, "sending statement");

        let resp = self
            .client
            .post(endpoint.as_str())
            .header(ACCEPT, HeaderValue::from_static(RESULTS_JSON))
            .form(&[(field, text.as_str())])
            .send()
            .map_err(|e| StoreError::Transport(format!("failed to reach {endpoint}: {e}")))?;

        if !resp.status().is_success() {
            let code = resp.status().as_u16();
            let body = resp.text().unwrap_or_default();
            return Err(StoreError::Status { code, body });
        }
        if !statement.is_read() {
            return Ok(Vec::new());
        }

        let body = resp
            .text()
            .map_err(|e| StoreError::Transport(format!("failed to read body: {e}")))?;
        parse_results(&body)
    }
}

#[derive(Deserialize)]
struct ResultsDocument {
    head: Head,
    results: Bindings,
}

#[derive(Deserialize)]
struct Head {
    #[serde(default)]
    vars: Vec<String>,
}

#[derive(Deserialize)]
struct Bindings {
    bindings: Vec<HashMap<String, Binding>>,
}

#[derive(Deserialize)]
struct Binding {
    #[serde(rename = "type")]
    kind: String,
    value: String,
    datatype: Option<String>,
}

/// Decode a `application/sparql-results+json` document.
///
/// Row keys follow the order of `head.vars`.
pub fn parse_results(body: &str) -> Result<Vec<Row>, StoreError> {
    let doc: ResultsDocument =
        serde_json::from_str(body).map_err(|e| StoreError::Decode(e.to_string()))?;

    let mut rows = Vec::with_capacity(doc.results.bindings.len());
    for mut solution in doc.results.bindings {
        let mut row = Row::new();
        for var in &doc.head.vars {
            if let Some(binding) = solution.remove(var) {
                row.insert(var.clone(), binding_to_term(binding)?);
            }
        }
        rows.push(row);
    }
    Ok(rows)
}

fn binding_to_term(binding: Binding) -> Result<Term, StoreError> {
    match binding.kind.as_str() {
        "uri" => Ok(Term::iri(binding.value)),
        "bnode" => Ok(Term::iri(format!("_:{}", binding.value))),
        "literal" | "typed-literal" => Ok(match binding.datatype {
            Some(datatype) => Term::typed(binding.value, Term::iri(datatype)),
            None => Term::plain(binding.value),
        }),
        other => Err(StoreError::Decode(format!("unknown binding type `{other}`"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_follow_head_order() {
        let body = r#"{
            "head": {"vars": ["0_Person", "0_Person_name_0_TextType_value"]},
            "results": {"bindings": [
                {
                    "0_Person_name_0_TextType_value": {"type": "literal", "value": "Foo"},
                    "0_Person": {"type": "uri", "value": "urn:uuid:1"}
                },
                {
                    "0_Person": {"type": "uri", "value": "urn:uuid:2"}
                }
            ]}
        }"#;
        let rows = parse_results(body).unwrap();
        assert_eq!(rows.len(), 2);
        let keys: Vec<_> = rows[0].keys().cloned().collect();
        assert_eq!(keys, vec!["0_Person", "0_Person_name_0_TextType_value"]);
        assert_eq!(rows[1].len(), 1);
        assert_eq!(rows[0]["0_Person"], Term::iri("urn:uuid:1"));
    }

    #[test]
    fn typed_literals_keep_datatype() {
        let body = r#"{
            "head": {"vars": ["v"]},
            "results": {"bindings": [
                {"v": {"type": "literal", "value": "30",
                       "datatype": "http://www.w3.org/2001/XMLSchema#integer"}}
            ]}
        }"#;
        let rows = parse_results(body).unwrap();
        assert_eq!(
            rows[0]["v"],
            Term::typed("30", Term::iri("http://www.w3.org/2001/XMLSchema#integer"))
        );
    }

    #[test]
    fn malformed_document_is_a_decode_error() {
        let err = parse_results("{\"head\": {}}").unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }
}
