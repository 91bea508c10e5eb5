//! Type-graph values produced by the registry.

use crate::naming::{Datatype, ScalarKind};
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Reference from a field to its type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum TypeRef {
    Scalar(ScalarKind),
    Named(String),
    List(Box<TypeRef>),
}

impl TypeRef {
    pub fn list_of(inner: TypeRef) -> Self {
        TypeRef::List(Box::new(inner))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Scalar(kind) => f.write_str(kind.name()),
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::List(inner) => write!(f, "[{inner}]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// Wrapper with a single `value` field.
    Scalar(Datatype),
    /// Ontology class; each property is a list of its union type.
    Class,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectType {
    pub name: String,
    pub description: Option<String>,
    pub kind: ObjectKind,
    pub fields: IndexMap<String, TypeRef>,
}

impl ObjectType {
    pub fn datatype(&self) -> Option<Datatype> {
        match self.kind {
            ObjectKind::Scalar(datatype) => Some(datatype),
            ObjectKind::Class => None,
        }
    }
}

/// Polymorphic type of a property: one member per range.
///
/// Members are resolved on first use.
#[derive(Debug)]
pub struct UnionType {
    pub name: String,
    pub property: String,
    pub(crate) members: OnceCell<Vec<String>>,
}

impl UnionType {
    pub(crate) fn new(name: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            property: property.into(),
            members: OnceCell::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum OutputType {
    Object(Arc<ObjectType>),
    Union(Arc<UnionType>),
}

impl OutputType {
    pub fn name(&self) -> &str {
        match self {
            OutputType::Object(object) => &object.name,
            OutputType::Union(union) => &union.name,
        }
    }

    pub fn as_object(&self) -> Option<&Arc<ObjectType>> {
        match self {
            OutputType::Object(object) => Some(object),
            OutputType::Union(_) => None,
        }
    }

    pub fn as_union(&self) -> Option<&Arc<UnionType>> {
        match self {
            OutputType::Union(union) => Some(union),
            OutputType::Object(_) => None,
        }
    }
}

// ============================================================================
// Input shapes
// ============================================================================

/// Identity of an input shape: what it is built from, in which role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "role", content = "source", rename_all = "snake_case")]
pub enum ShapeKey {
    Query(String),
    Mutation(String),
    InlineValue { property: String, datatype: Datatype },
    Insert(String),
    ReplaceWith(String),
    ReplaceAllWith(String),
    Detach,
    DetachAll,
}

impl ShapeKey {
    /// Public name of the shape.
    pub fn shape_name(&self) -> String {
        match self {
            ShapeKey::Query(name) => format!("{name}Input"),
            ShapeKey::Mutation(name) => format!("{name}MutationInput"),
            ShapeKey::InlineValue { property, datatype } => {
                format!("{property}{}InlineMutationInput", datatype.unsafe_name())
            }
            ShapeKey::Insert(property) => format!("insert{property}"),
            ShapeKey::ReplaceWith(property) => format!("replaceWith{property}"),
            ShapeKey::ReplaceAllWith(property) => format!("replaceAllWith{property}"),
            ShapeKey::Detach => "detach".to_string(),
            ShapeKey::DetachAll => "detachAll".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputField {
    Scalar { scalar: ScalarKind },
    Shape { key: ShapeKey, description: String },
}

impl InputField {
    pub fn scalar(kind: ScalarKind) -> Self {
        InputField::Scalar { scalar: kind }
    }

    pub fn shape(key: ShapeKey, description: impl Into<String>) -> Self {
        InputField::Shape {
            key,
            description: description.into(),
        }
    }

    pub fn type_name(&self) -> String {
        match self {
            InputField::Scalar { scalar } => scalar.name().to_string(),
            InputField::Shape { key, .. } => key.shape_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputShape {
    pub name: String,
    pub description: String,
    pub fields: IndexMap<String, InputField>,
}

/// One field of the root query or mutation type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootField {
    pub name: String,
    pub description: String,
    pub output: TypeRef,
    pub arguments: IndexMap<String, InputField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootType {
    pub name: String,
    pub fields: Vec<RootField>,
}

impl RootType {
    pub fn field(&self, name: &str) -> Option<&RootField> {
        self.fields.iter().find(|f| f.name == name)
    }
}
