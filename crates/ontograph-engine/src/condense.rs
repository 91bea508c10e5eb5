//! Condensation of a nested argument tree into graph-pattern fragments.
//!
//! The same walker serves queries and mutations. In mutation mode, inline
//! operation keywords under a property are skipped during descent and
//! dispatched once the property's own fragments exist. Each dispatched
//! operation becomes a write statement in a flat queue; operations found
//! inside a sub-context are queued before the statement that depends on
//! that sub-context.

use crate::error::EngineError;
use crate::path;
use indexmap::IndexMap;
use ontograph_schema::{
    codec, is_class_name, unsafe_name, Comparison, Datatype, InlineOperation, SchemaError,
    TypeRegistry,
};
use ontograph_schema::naming::VALUE_KEY;
use ontograph_sparql::{Expression, Fragment, Node, Term, Triple, Variable, Write};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub u32);

impl ContextId {
    pub const MAIN: ContextId = ContextId(0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Query,
    Mutation,
}

/// A queued write and the context whose fragments scope it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedWrite {
    pub context: ContextId,
    pub write: Write,
}

pub struct Condenser<'r> {
    registry: &'r TypeRegistry,
    mode: Mode,
    max_depth: usize,
    contexts: IndexMap<ContextId, Vec<Fragment>>,
    writes: Vec<QueuedWrite>,
    next_context: u32,
    next_unbound: u32,
}

impl<'r> Condenser<'r> {
    pub fn new(registry: &'r TypeRegistry, mode: Mode) -> Self {
        Self {
            registry,
            mode,
            max_depth: registry.max_depth(),
            contexts: IndexMap::new(),
            writes: Vec::new(),
            next_context: 0,
            next_unbound: 0,
        }
    }

    pub fn query(registry: &'r TypeRegistry) -> Self {
        Self::new(registry, Mode::Query)
    }

    pub fn mutation(registry: &'r TypeRegistry) -> Self {
        Self::new(registry, Mode::Mutation)
    }

    /// Condense the arguments of a root field of class `class` into the
    /// main context.
    pub fn condense_root(
        &mut self,
        class: &str,
        arguments: &Map<String, Value>,
    ) -> Result<ContextId, EngineError> {
        let context = self.open_context();
        let anchor = path::root_anchor(class);
        self.condense_entity(context, class, &anchor, arguments, 0)?;
        Ok(context)
    }

    pub fn fragments(&self, context: ContextId) -> &[Fragment] {
        self.contexts
            .get(&context)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn queued_writes(&self) -> &[QueuedWrite] {
        &self.writes
    }

    /// Writes in execution order, each scoped by its context's fragments.
    pub fn write_plan(&self) -> Vec<Write> {
        self.writes
            .iter()
            .map(|queued| queued.write.clone().scoped_by(self.fragments(queued.context)))
            .collect()
    }

    fn open_context(&mut self) -> ContextId {
        let id = ContextId(self.next_context);
        self.next_context += 1;
        self.contexts.insert(id, Vec::new());
        id
    }

    fn push(&mut self, context: ContextId, fragment: Fragment) {
        self.contexts.entry(context).or_default().push(fragment);
    }

    fn fresh_unbound(&mut self) -> Variable {
        let variable = Variable::new(format!("unbound_{}", self.next_unbound));
        self.next_unbound += 1;
        variable
    }

    fn qualified(&self, local_name: &str) -> Result<Term, EngineError> {
        let prefix = self.registry.namespace_for(local_name)?;
        Ok(Term::prefixed(prefix, local_name))
    }

    fn type_triple(&self, subject: &Variable, class: &str) -> Result<Fragment, EngineError> {
        Ok(Fragment::triple(
            subject,
            Term::prefixed("rdf", "type"),
            self.qualified(class)?,
        ))
    }

    // ========================================================================
    // Descent
    // ========================================================================

    /// Properties of the entity bound to `anchor`. The type assertion is
    /// emitted here, once per entity.
    fn condense_entity(
        &mut self,
        context: ContextId,
        class: &str,
        anchor: &Variable,
        arguments: &Map<String, Value>,
        depth: usize,
    ) -> Result<(), EngineError> {
        let triple = self.type_triple(anchor, class)?;
        self.push(context, triple);
        self.condense_properties(context, anchor, false, arguments, depth)
    }

    fn condense_properties(
        &mut self,
        context: ContextId,
        anchor: &Variable,
        nested: bool,
        arguments: &Map<String, Value>,
        depth: usize,
    ) -> Result<(), EngineError> {
        if depth > self.max_depth {
            return Err(EngineError::InvalidPath(anchor.name().to_string()));
        }
        for (index, (field, value)) in sorted(arguments).into_iter().enumerate() {
            if is_class_name(field) || InlineOperation::from_keyword(field).is_some() {
                return Err(EngineError::InvalidType(format!(
                    "`{field}` is not a property of {}",
                    anchor.name()
                )));
            }
            let payload = as_object(field, value)?;
            let property = self.qualified(field)?;
            let object = Variable::new(path::condensed_object(anchor.name(), nested, index, field));
            let matched = Triple::new(anchor, property.clone(), &object);
            self.push(context, Fragment::Triple(matched.clone()));
            self.condense_values(context, &object, payload, depth + 1)?;

            if self.mode == Mode::Mutation {
                for (keyword, operation_payload) in sorted(payload) {
                    if let Some(operation) = InlineOperation::from_keyword(keyword) {
                        self.dispatch(context, operation, operation_payload, &matched, depth + 1)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Class and datatype keys under a property's object variable.
    fn condense_values(
        &mut self,
        context: ContextId,
        object: &Variable,
        arguments: &Map<String, Value>,
        depth: usize,
    ) -> Result<(), EngineError> {
        for (field, value) in sorted(arguments) {
            if InlineOperation::from_keyword(field).is_some() {
                if self.mode == Mode::Query {
                    return Err(EngineError::InvalidType(format!(
                        "`{field}` is only valid in mutations"
                    )));
                }
                continue;
            }
            if !is_class_name(field) {
                return Err(EngineError::InvalidType(format!(
                    "`{field}` is not a type of {}",
                    object.name()
                )));
            }
            let payload = as_object(field, value)?;
            let class = unsafe_name(field);
            match Datatype::from_unsafe(&class) {
                Some(datatype) => {
                    for fragment in comparisons(datatype, object, payload)? {
                        self.push(context, fragment);
                    }
                }
                None => {
                    let triple = self.type_triple(object, &class)?;
                    self.push(context, triple);
                    self.condense_properties(context, object, true, payload, depth)?;
                }
            }
        }
        Ok(())
    }

    // ========================================================================
    // Inline operations
    // ========================================================================

    fn dispatch(
        &mut self,
        context: ContextId,
        operation: InlineOperation,
        payload: &Value,
        matched: &Triple,
        depth: usize,
    ) -> Result<(), EngineError> {
        let target = if operation.widens() {
            Triple::new(
                matched.subject.clone(),
                matched.predicate.clone(),
                self.fresh_unbound(),
            )
        } else {
            matched.clone()
        };
        let widening: Vec<Fragment> = if operation.widens() {
            vec![Fragment::Triple(target.clone())]
        } else {
            Vec::new()
        };

        match operation {
            InlineOperation::Detach | InlineOperation::DetachAll => {
                self.queue(
                    context,
                    Write::Delete {
                        triples: vec![target],
                        conditions: widening,
                    },
                );
                return Ok(());
            }
            InlineOperation::Insert
            | InlineOperation::ReplaceWith
            | InlineOperation::ReplaceAllWith => {}
        }

        let templates = as_object(operation.keyword(), payload)?;
        for (type_name, data) in sorted(templates) {
            let data = as_object(type_name, data)?;
            let class = unsafe_name(type_name);
            if !is_class_name(&class) {
                return Err(EngineError::InvalidType(type_name.to_string()));
            }
            let (objects, scope) = match Datatype::from_unsafe(&class) {
                Some(datatype) => (scalar_objects(datatype, data)?, Vec::new()),
                None => {
                    let sub = self.open_context();
                    let anchor = path::context_anchor(&class, sub.0);
                    self.condense_entity(sub, &class, &anchor, data, depth)?;
                    (vec![Node::from(anchor)], self.fragments(sub).to_vec())
                }
            };
            for object in objects {
                let replacement = Triple {
                    subject: matched.subject.clone(),
                    predicate: matched.predicate.clone(),
                    object,
                };
                let mut conditions = widening.clone();
                conditions.extend(scope.iter().cloned());
                let write = match operation {
                    InlineOperation::Insert => Write::Insert {
                        triples: vec![replacement],
                        conditions,
                    },
                    _ => Write::Replace {
                        delete: vec![target.clone()],
                        insert: vec![replacement],
                        conditions,
                    },
                };
                self.queue(context, write);
            }
        }
        Ok(())
    }

    fn queue(&mut self, context: ContextId, write: Write) {
        tracing::debug!(context = context.0, kind = write.kind(), "queued inline write");
        self.writes.push(QueuedWrite { context, write });
    }
}

fn sorted(arguments: &Map<String, Value>) -> Vec<(&String, &Value)> {
    let mut entries: Vec<_> = arguments.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

fn as_object<'a>(field: &str, value: &'a Value) -> Result<&'a Map<String, Value>, EngineError> {
    value
        .as_object()
        .ok_or_else(|| EngineError::InvalidType(format!("`{field}` expects an input object")))
}

fn comparisons(
    datatype: Datatype,
    object: &Variable,
    operators: &Map<String, Value>,
) -> Result<Vec<Fragment>, EngineError> {
    let mut out = Vec::new();
    for (keyword, raw) in sorted(operators) {
        let comparison = Comparison::from_keyword(keyword)
            .filter(|c| datatype.comparisons().contains(c))
            .ok_or_else(|| {
                EngineError::InvalidType(format!("`{keyword}` is not an operator of {datatype}"))
            })?;
        let subject = Expression::var(object);
        if comparison == Comparison::Contains {
            out.push(Fragment::Filter(contains(datatype, subject, raw)?));
            continue;
        }
        let scalar = Expression::term(codec::encode(datatype, raw)?);
        let expression = match comparison {
            Comparison::GreaterThan => Expression::greater_than(subject, scalar),
            Comparison::LessThan => Expression::less_than(subject, scalar),
            Comparison::NotEqualTo => Expression::not_equal(subject, scalar),
            Comparison::EqualTo | Comparison::Contains => Expression::equal(subject, scalar),
        };
        out.push(Fragment::Filter(expression));
    }
    Ok(out)
}

/// Substring match. The pattern is taken as given, not as a value of the
/// datatype; IRIs are matched on their string form.
fn contains(datatype: Datatype, subject: Expression, raw: &Value) -> Result<Expression, EngineError> {
    let pattern = raw
        .as_str()
        .ok_or_else(|| SchemaError::invalid_scalar(datatype.safe_name(), raw.to_string()))?;
    let subject = match datatype {
        Datatype::Url => Expression::str(subject),
        _ => subject,
    };
    Ok(Expression::regex(subject, pattern))
}

fn scalar_objects(datatype: Datatype, data: &Map<String, Value>) -> Result<Vec<Node>, EngineError> {
    let mut out = Vec::new();
    for (key, raw) in sorted(data) {
        if key != VALUE_KEY {
            return Err(EngineError::InvalidType(format!(
                "`{key}` is not valid in a {datatype} template"
            )));
        }
        out.push(Node::Term(codec::encode(datatype, raw)?));
    }
    Ok(out)
}
