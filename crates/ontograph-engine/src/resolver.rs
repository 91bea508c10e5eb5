//! Root-field resolution with request-scoped single-flight.
//!
//! Resolving any field of a root selection needs the whole result tree of
//! that root field, and computing it means running the write plan (for
//! mutations) and one select. A [`RequestContext`] is created per incoming
//! request and remembers, per root field, the tree once it has been built:
//! the first resolution computes it, concurrent resolutions wait for that
//! computation, later ones reuse it. Nothing is shared across requests.

use crate::condense::{Condenser, Mode};
use crate::error::{ApiError, EngineError};
use crate::hydrate::Hydrator;
use crate::request::{OperationKind, Selection};
use crate::tree::{PathElement, Resolved, ResultTree};
use once_cell::sync::OnceCell;
use ontograph_schema::{ObjectKind, TypeRegistry};
use ontograph_sparql::{Select, Statement, StoreClient};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

type Slot = Arc<OnceCell<Arc<ResultTree>>>;

/// State owned by one request.
pub struct RequestContext {
    id: Uuid,
    trees: Mutex<HashMap<(OperationKind, String), Slot>>,
    computations: AtomicUsize,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            trees: Mutex::new(HashMap::new()),
            computations: AtomicUsize::new(0),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// How many result trees this request actually computed.
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::SeqCst)
    }

    fn slot(&self, kind: OperationKind, key: &str) -> Slot {
        self.trees
            .lock()
            .entry((kind, key.to_string()))
            .or_default()
            .clone()
    }
}

/// A resolved field: the shared tree and where in it the field sits.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub tree: Arc<ResultTree>,
    pub path: Vec<PathElement>,
}

impl Resolution {
    pub fn get(&self) -> Resolved<'_> {
        self.tree.navigate(&self.path)
    }
}

/// Root field of an operation, as the resolver needs it.
#[derive(Debug, Clone, Copy)]
pub struct RootField<'a> {
    pub class: &'a str,
    pub response_key: &'a str,
    pub arguments: &'a Map<String, Value>,
    pub selections: &'a [Selection],
}

impl<'a> RootField<'a> {
    pub fn from_selection(selection: &'a Selection) -> Result<Self, EngineError> {
        match selection {
            Selection::Field {
                name,
                alias,
                arguments,
                selections,
            } => Ok(Self {
                class: name,
                response_key: alias.as_deref().unwrap_or(name),
                arguments,
                selections,
            }),
            Selection::InlineFragment { type_condition, .. } => Err(EngineError::InvalidType(
                format!("fragment on {type_condition} cannot be a root field"),
            )),
        }
    }
}

pub struct Engine {
    registry: Arc<TypeRegistry>,
    store: Arc<dyn StoreClient>,
}

impl Engine {
    pub fn new(registry: Arc<TypeRegistry>, store: Arc<dyn StoreClient>) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn store(&self) -> &dyn StoreClient {
        self.store.as_ref()
    }

    /// Resolve the value at `path` below `root`, computing the root's
    /// result tree on first use within `context`.
    pub fn resolve(
        &self,
        context: &RequestContext,
        kind: OperationKind,
        root: RootField<'_>,
        path: &[PathElement],
    ) -> Result<Resolution, ApiError> {
        let tree = self.tree(context, kind, root)?;
        Ok(Resolution {
            tree,
            path: path.to_vec(),
        })
    }

    /// The result tree of `root`, computed at most once per request.
    pub fn tree(
        &self,
        context: &RequestContext,
        kind: OperationKind,
        root: RootField<'_>,
    ) -> Result<Arc<ResultTree>, ApiError> {
        let slot = context.slot(kind, root.response_key);
        let tree = slot.get_or_try_init(|| {
            let span = tracing::info_span!(
                "resolve_root",
                request = %context.id,
                field = root.response_key,
                ?kind
            );
            let _guard = span.enter();
            context.computations.fetch_add(1, Ordering::SeqCst);
            self.compute(kind, root).map(Arc::new).map_err(|err| {
                tracing::warn!(error = %err, "root field failed");
                ApiError::from(err)
            })
        })?;
        Ok(Arc::clone(tree))
    }

    fn compute(&self, kind: OperationKind, root: RootField<'_>) -> Result<ResultTree, EngineError> {
        let class = root.class;
        let root_type = self.registry.type_for(class)?;
        let is_class = root_type
            .as_object()
            .is_some_and(|object| object.kind == ObjectKind::Class);
        if !is_class {
            return Err(EngineError::InvalidType(format!("{class} is not a class")));
        }

        let mode = match kind {
            OperationKind::Query => Mode::Query,
            OperationKind::Mutation => Mode::Mutation,
        };
        let mut condenser = Condenser::new(&self.registry, mode);
        let main = condenser.condense_root(class, root.arguments)?;
        let hydration = Hydrator::new(&self.registry).hydrate(class, root.selections)?;

        let plan = condenser.write_plan();
        for (position, write) in plan.into_iter().enumerate() {
            tracing::debug!(position, kind = write.kind(), "executing inline write");
            self.store.execute(&Statement::from(write))?;
        }

        let select = Select::new(hydration.variables).filter_by(
            condenser
                .fragments(main)
                .iter()
                .cloned()
                .chain(hydration.fragments),
        );
        let rows = self.store.execute(&Statement::from(select))?;
        tracing::debug!(rows = rows.len(), "hydrated root field");
        Ok(ResultTree::from_rows(&rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::fixtures::{registry, row};
    use ontograph_sparql::{Namespaces, ScriptedStore};
    use serde_json::json;
    use std::thread;

    fn key(name: &str) -> PathElement {
        PathElement::Key(name.to_string())
    }

    fn idx(index: usize) -> PathElement {
        PathElement::Index(index)
    }

    fn engine(store: Arc<ScriptedStore>) -> Engine {
        Engine::new(Arc::new(registry()), store)
    }

    fn person_root() -> Selection {
        Selection::field("Person")
            .with_arguments(json!({"name": {"TextType": {"equalTo": "Foo"}}}))
            .with_selections(vec![Selection::field("name").with_selections(vec![
                Selection::on("TextType", vec![Selection::field("value")]),
            ])])
    }

    fn canned() -> Vec<ontograph_sparql::Row> {
        vec![row(&[
            ("0_Person", "urn:uuid:p1"),
            ("0_Person_name_0_TextType_value", "Foo"),
        ])]
    }

    #[test]
    fn sibling_fields_share_one_computation() {
        let store = Arc::new(ScriptedStore::new(Namespaces::new()));
        store.respond(canned());
        let engine = engine(store.clone());
        let context = RequestContext::new();
        let root = person_root();
        let field = RootField::from_selection(&root).unwrap();

        let name = engine
            .resolve(&context, OperationKind::Query, field, &[idx(0), key("name")])
            .unwrap();
        let value = engine
            .resolve(
                &context,
                OperationKind::Query,
                field,
                &[idx(0), key("name"), idx(0), key("value")],
            )
            .unwrap();

        assert!(matches!(name.get(), Resolved::Members(m) if m.len() == 1));
        assert_eq!(value.get(), Resolved::Leaf("Foo"));
        assert!(Arc::ptr_eq(&name.tree, &value.tree));
        assert_eq!(store.reads(), 1);
        assert_eq!(context.computations(), 1);
    }

    #[test]
    fn each_request_computes_its_own_tree() {
        let store = Arc::new(ScriptedStore::new(Namespaces::new()));
        store.respond(canned()).respond(Vec::new());
        let engine = engine(store.clone());
        let root = person_root();
        let field = RootField::from_selection(&root).unwrap();

        let first = engine
            .tree(&RequestContext::new(), OperationKind::Query, field)
            .unwrap();
        let second = engine
            .tree(&RequestContext::new(), OperationKind::Query, field)
            .unwrap();
        assert_eq!(first.members().len(), 1);
        assert!(second.is_empty());
        assert_eq!(store.reads(), 2);
    }

    #[test]
    fn concurrent_resolutions_coalesce() {
        let store = Arc::new(ScriptedStore::new(Namespaces::new()));
        store.respond(canned());
        let engine = Arc::new(engine(store.clone()));
        let context = Arc::new(RequestContext::new());
        let root = Arc::new(person_root());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = Arc::clone(&engine);
                let context = Arc::clone(&context);
                let root = Arc::clone(&root);
                thread::spawn(move || {
                    let field = RootField::from_selection(&root).unwrap();
                    engine
                        .tree(&context, OperationKind::Query, field)
                        .unwrap()
                        .members()
                        .len()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
        assert_eq!(store.reads(), 1);
        assert_eq!(context.computations(), 1);
    }

    #[test]
    fn mutations_write_before_reading_back() {
        let store = Arc::new(ScriptedStore::new(Namespaces::new()));
        store.respond(canned());
        let engine = engine(store.clone());
        let root = Selection::field("Person")
            .with_arguments(json!({
                "name": {
                    "TextType": {"equalTo": "Foo"},
                    "insert": {"TextType": {"value": "Bar"}}
                }
            }))
            .with_selections(vec![Selection::field("name").with_selections(vec![
                Selection::on("TextType", vec![Selection::field("value")]),
            ])]);
        let field = RootField::from_selection(&root).unwrap();
        engine
            .tree(&RequestContext::new(), OperationKind::Mutation, field)
            .unwrap();

        let statements = store.statements();
        assert_eq!(statements.len(), 2);
        assert!(!statements[0].is_read());
        assert!(statements[1].is_read());
        let select = &store.rendered()[1];
        assert!(select.contains("SELECT ?0_Person ?0_Person_name_0_TextType_value WHERE {"));
        assert!(select.contains("FILTER(?0_Person__name = \"Foo\")"));
    }

    #[test]
    fn failures_are_not_remembered() {
        let store = Arc::new(ScriptedStore::new(Namespaces::new()));
        let engine = engine(store.clone());
        let context = RequestContext::new();
        let root = person_root();
        let field = RootField::from_selection(&root).unwrap();

        let err = engine.tree(&context, OperationKind::Query, field).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BackendFailure);

        store.respond(canned());
        let tree = engine.tree(&context, OperationKind::Query, field).unwrap();
        assert_eq!(tree.members().len(), 1);
        assert_eq!(context.computations(), 2);
    }

    #[test]
    fn datatypes_are_not_root_fields() {
        let store = Arc::new(ScriptedStore::new(Namespaces::new()));
        let engine = engine(store.clone());
        let root = Selection::field("TextType");
        let field = RootField::from_selection(&root).unwrap();
        let err = engine
            .tree(&RequestContext::new(), OperationKind::Query, field)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidType);
        assert_eq!(store.reads(), 0);
    }

    #[test]
    fn invalid_selections_abort_before_any_write() {
        let store = Arc::new(ScriptedStore::new(Namespaces::new()));
        let engine = engine(store.clone());
        let root = Selection::field("Person")
            .with_arguments(json!({"name": {"detachAll": {"confirm": true}}}))
            .with_selections(vec![Selection::field("shoeSize")]);
        let field = RootField::from_selection(&root).unwrap();
        assert!(engine
            .tree(&RequestContext::new(), OperationKind::Mutation, field)
            .is_err());
        assert_eq!(store.writes(), 0);
    }
}
