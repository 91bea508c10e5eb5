//! Minimal field-resolution driver.
//!
//! Walks an [`Operation`]'s selections the way a GraphQL executor would,
//! asking the resolver for every field with its response path. All fields
//! of one request share a [`RequestContext`], so each root field is
//! computed once however many fields hang below it.

use crate::error::{ApiError, EngineError};
use crate::request::{Operation, OperationKind, Selection, TYPENAME};
use crate::resolver::{Engine, RequestContext, RootField};
use crate::tree::{PathElement, Resolved};
use ontograph_schema::naming::union_name;
use ontograph_schema::registry::{ROOT_MUTATION, ROOT_QUERY};
use ontograph_schema::{codec, safe, ObjectKind, ObjectType};
use serde_json::{json, Map, Value};

pub struct Executor<'e> {
    engine: &'e Engine,
}

impl<'e> Executor<'e> {
    pub fn new(engine: &'e Engine) -> Self {
        Self { engine }
    }

    /// Response document for `operation`: `{"data": ...}` on success,
    /// `{"data": null, "errors": [...]}` otherwise.
    pub fn run(&self, operation: &Operation) -> Value {
        match self.execute(operation) {
            Ok(data) => json!({ "data": data }),
            Err(err) => json!({ "data": null, "errors": [err.to_json()] }),
        }
    }

    pub fn execute(&self, operation: &Operation) -> Result<Value, ApiError> {
        let context = RequestContext::new();
        let span = tracing::info_span!("request", id = %context.id(), kind = ?operation.kind);
        let _guard = span.enter();

        let root_type = match operation.kind {
            OperationKind::Query => ROOT_QUERY,
            OperationKind::Mutation => ROOT_MUTATION,
        };
        let mut data = Map::new();
        for selection in flatten(&operation.selections, root_type) {
            let Some(key) = selection.response_key() else {
                continue;
            };
            if let Selection::Field { name, .. } = selection {
                if name == TYPENAME {
                    data.insert(key.to_string(), Value::from(root_type));
                    continue;
                }
            }
            let root = RootField::from_selection(selection)?;
            data.insert(key.to_string(), self.root_value(&context, operation.kind, root)?);
        }
        tracing::info!(fields = data.len(), computed = context.computations(), "request done");
        Ok(Value::Object(data))
    }

    fn root_value(
        &self,
        context: &RequestContext,
        kind: OperationKind,
        root: RootField<'_>,
    ) -> Result<Value, ApiError> {
        let resolution = self.engine.resolve(context, kind, root, &[])?;
        let Resolved::Members(members) = resolution.get() else {
            return Ok(Value::Array(Vec::new()));
        };
        let object = self.object_type(root.class)?;
        let selections: Vec<&Selection> = root.selections.iter().collect();
        let walk = Walk {
            context,
            kind,
            root,
        };
        let mut list = Vec::with_capacity(members.len());
        for index in 0..members.len() {
            list.push(walk.object(self, &object, &selections, vec![PathElement::Index(index)])?);
        }
        Ok(Value::Array(list))
    }

    fn object_type(&self, name: &str) -> Result<std::sync::Arc<ObjectType>, ApiError> {
        self.engine
            .registry()
            .type_for(name)?
            .as_object()
            .cloned()
            .ok_or_else(|| EngineError::InvalidType(name.to_string()).into())
    }
}

/// Per-root traversal state.
#[derive(Clone, Copy)]
struct Walk<'a> {
    context: &'a RequestContext,
    kind: OperationKind,
    root: RootField<'a>,
}

impl Walk<'_> {
    fn object(
        &self,
        executor: &Executor<'_>,
        object: &ObjectType,
        selections: &[&Selection],
        path: Vec<PathElement>,
    ) -> Result<Value, ApiError> {
        let mut out = Map::new();
        for selection in selections {
            match selection {
                Selection::Field { name, .. } if name == TYPENAME => {
                    out.insert(response_key(selection, name), Value::from(object.name.clone()));
                }
                Selection::Field {
                    name, selections, ..
                } => {
                    let value = self.field(executor, object, name, selections, &path)?;
                    out.insert(response_key(selection, name), value);
                }
                Selection::InlineFragment {
                    type_condition,
                    selections,
                } if safe(type_condition) == object.name => {
                    let nested: Vec<&Selection> = selections.iter().collect();
                    if let Value::Object(fields) = self.object(executor, object, &nested, path.clone())? {
                        out.extend(fields);
                    }
                }
                Selection::InlineFragment { .. } => {}
            }
        }
        Ok(Value::Object(out))
    }

    fn field(
        &self,
        executor: &Executor<'_>,
        object: &ObjectType,
        name: &str,
        children: &[Selection],
        path: &[PathElement],
    ) -> Result<Value, ApiError> {
        if !object.fields.contains_key(name) {
            return Err(EngineError::InvalidType(format!(
                "`{name}` is not a field of {}",
                object.name
            ))
            .into());
        }
        let mut field_path = path.to_vec();
        field_path.push(PathElement::Key(name.to_string()));
        let resolution = executor
            .engine
            .resolve(self.context, self.kind, self.root, &field_path)?;

        match (&object.kind, resolution.get()) {
            (ObjectKind::Scalar(datatype), Resolved::Leaf(lexical)) => {
                Ok(codec::to_json(*datatype, lexical))
            }
            (ObjectKind::Scalar(_), _) => Ok(Value::Null),
            (ObjectKind::Class, Resolved::Members(members)) => {
                let registry = executor.engine.registry();
                let union_type = registry.type_for(&union_name(name))?;
                let union = union_type
                    .as_union()
                    .ok_or_else(|| EngineError::InvalidType(union_name(name)))?;
                let mut list = Vec::with_capacity(members.len());
                for (index, member) in members.iter().enumerate() {
                    let member_type = registry.resolve_member(union, &member.type_name)?;
                    let nested = applicable(children, &member_type.name);
                    let mut member_path = field_path.clone();
                    member_path.push(PathElement::Index(index));
                    list.push(self.object(executor, &member_type, &nested, member_path)?);
                }
                Ok(Value::Array(list))
            }
            (ObjectKind::Class, _) => Ok(Value::Array(Vec::new())),
        }
    }
}

fn response_key(selection: &Selection, name: &str) -> String {
    selection.response_key().unwrap_or(name).to_string()
}

/// Selections below a union field that apply to a member of `type_name`.
fn applicable<'s>(children: &'s [Selection], type_name: &str) -> Vec<&'s Selection> {
    let mut out = Vec::new();
    for child in children {
        match child {
            Selection::Field { name, .. } if name == TYPENAME => out.push(child),
            Selection::InlineFragment {
                type_condition,
                selections,
            } if safe(type_condition) == type_name => out.extend(selections.iter()),
            _ => {}
        }
    }
    out
}

/// Root selections, with fragments on the root type inlined.
fn flatten<'s>(selections: &'s [Selection], root_type: &str) -> Vec<&'s Selection> {
    let mut out = Vec::new();
    for selection in selections {
        match selection {
            Selection::InlineFragment {
                type_condition,
                selections,
            } if type_condition == root_type => out.extend(flatten(selections, root_type)),
            Selection::InlineFragment { .. } => {}
            field => out.push(field),
        }
    }
    out
}
