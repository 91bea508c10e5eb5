//! Keyed get-or-compute cache for ontology metadata.
//!
//! Entries are process-wide and shared by concurrent requests. A value is
//! computed outside the map and inserted only if the key is still vacant,
//! so concurrent first lookups may fetch twice but always agree on the
//! stored entry. Failed fetches store nothing.

use crate::error::SchemaError;
use crate::gateway::{Described, OntologyGateway};
use dashmap::DashMap;
use std::sync::Arc;

pub const KEY_TYPE: &str = "type";
pub const KEY_TYPES: &str = "types";
pub const KEY_PROPERTIES: &str = "properties";
pub const KEY_NAMESPACE: &str = "namespace";

pub fn key(kind: &str, name: &str) -> String {
    format!("{kind}_{name}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedValue {
    Terms(Vec<Described>),
    Description(Option<String>),
    Namespace(String),
}

#[derive(Debug, Default)]
pub struct MetadataCache {
    entries: DashMap<String, CachedValue>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the entry for `key`, computing it with `fetch` when absent.
    ///
    /// A failing `fetch` surfaces as [`SchemaError::CacheFailure`].
    pub fn get_or_try_insert_with<F>(&self, key: &str, fetch: F) -> Result<CachedValue, SchemaError>
    where
        F: FnOnce() -> Result<CachedValue, SchemaError>,
    {
        if let Some(hit) = self.entries.get(key) {
            return Ok(hit.value().clone());
        }
        let value = fetch().map_err(|source| SchemaError::CacheFailure {
            key: key.to_string(),
            source: Box::new(source),
        })?;
        tracing::debug!(key = %key, "populated metadata cache entry");
        Ok(self
            .entries
            .entry(key.to_string())
            .or_insert(value)
            .value()
            .clone())
    }

    pub fn terms<F>(&self, key: &str, fetch: F) -> Result<Vec<Described>, SchemaError>
    where
        F: FnOnce() -> Result<Vec<Described>, SchemaError>,
    {
        match self.get_or_try_insert_with(key, || fetch().map(CachedValue::Terms))? {
            CachedValue::Terms(terms) => Ok(terms),
            _ => Err(SchemaError::InvalidType(key.to_string())),
        }
    }

    pub fn description<F>(&self, key: &str, fetch: F) -> Result<Option<String>, SchemaError>
    where
        F: FnOnce() -> Result<Option<String>, SchemaError>,
    {
        match self.get_or_try_insert_with(key, || fetch().map(CachedValue::Description))? {
            CachedValue::Description(description) => Ok(description),
            _ => Err(SchemaError::InvalidType(key.to_string())),
        }
    }

    pub fn namespace<F>(&self, key: &str, fetch: F) -> Result<String, SchemaError>
    where
        F: FnOnce() -> Result<String, SchemaError>,
    {
        match self.get_or_try_insert_with(key, || fetch().map(CachedValue::Namespace))? {
            CachedValue::Namespace(prefix) => Ok(prefix),
            _ => Err(SchemaError::InvalidType(key.to_string())),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn expire(&self) {
        let dropped = self.entries.len();
        self.entries.clear();
        tracing::info!(dropped, "expired metadata cache");
    }
}

/// A gateway whose answers are memoized in a [`MetadataCache`].
pub struct CachedGateway<G> {
    inner: G,
    cache: Arc<MetadataCache>,
}

impl<G: OntologyGateway> CachedGateway<G> {
    pub fn new(inner: G, cache: Arc<MetadataCache>) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &Arc<MetadataCache> {
        &self.cache
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }
}

impl<G: OntologyGateway> OntologyGateway for CachedGateway<G> {
    fn class_description(&self, name: &str) -> Result<Option<String>, SchemaError> {
        self.cache
            .description(&key(KEY_TYPE, name), || self.inner.class_description(name))
    }

    fn class_list(&self) -> Result<Vec<Described>, SchemaError> {
        self.cache.terms(KEY_TYPES, || self.inner.class_list())
    }

    fn properties_of(&self, class: &str) -> Result<Vec<Described>, SchemaError> {
        self.cache
            .terms(&key(KEY_PROPERTIES, class), || self.inner.properties_of(class))
    }

    fn ranges_of(&self, property: &str) -> Result<Vec<Described>, SchemaError> {
        self.cache
            .terms(&key(KEY_TYPES, property), || self.inner.ranges_of(property))
    }

    fn namespace_for(&self, local_name: &str) -> Result<String, SchemaError> {
        self.cache
            .namespace(&key(KEY_NAMESPACE, local_name), || {
                self.inner.namespace_for(local_name)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::InMemoryOntology;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        inner: InMemoryOntology,
        calls: AtomicUsize,
    }

    impl OntologyGateway for Counting {
        fn class_description(&self, name: &str) -> Result<Option<String>, SchemaError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.class_description(name)
        }
        fn class_list(&self) -> Result<Vec<Described>, SchemaError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.class_list()
        }
        fn properties_of(&self, class: &str) -> Result<Vec<Described>, SchemaError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.properties_of(class)
        }
        fn ranges_of(&self, property: &str) -> Result<Vec<Described>, SchemaError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.ranges_of(property)
        }
        fn namespace_for(&self, local_name: &str) -> Result<String, SchemaError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.namespace_for(local_name)
        }
    }

    fn gateway() -> CachedGateway<Counting> {
        let inner = InMemoryOntology::new("schema")
            .class("Person", "A person.", &[])
            .property("name", "", &["Person"], &["Text"]);
        CachedGateway::new(
            Counting {
                inner,
                calls: AtomicUsize::new(0),
            },
            Arc::new(MetadataCache::new()),
        )
    }

    #[test]
    fn repeated_lookups_hit_the_cache() {
        let gateway = gateway();
        gateway.properties_of("Person").unwrap();
        gateway.properties_of("Person").unwrap();
        gateway.ranges_of("name").unwrap();
        gateway.ranges_of("name").unwrap();
        assert_eq!(gateway.inner().calls.load(Ordering::SeqCst), 2);
        assert!(gateway.cache().contains("properties_Person"));
        assert!(gateway.cache().contains("types_name"));
    }

    #[test]
    fn failures_are_wrapped_and_not_cached() {
        let gateway = gateway();
        let err = gateway.namespace_for("nope").unwrap_err();
        assert!(matches!(err, SchemaError::CacheFailure { ref key, .. } if key == "namespace_nope"));
        assert!(matches!(err.root_cause(), SchemaError::UnknownNamespace(_)));
        assert!(!gateway.cache().contains("namespace_nope"));
    }

    #[test]
    fn expire_forces_refetch() {
        let gateway = gateway();
        gateway.class_list().unwrap();
        gateway.cache().expire();
        assert!(gateway.cache().is_empty());
        gateway.class_list().unwrap();
        assert_eq!(gateway.inner().calls.load(Ordering::SeqCst), 2);
    }
}
