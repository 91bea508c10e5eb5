//! Dynamic type registry.
//!
//! Builds the output type graph and the argument input shapes on demand from
//! gateway metadata and memoizes them for the life of the process. Entries
//! are built outside the memo maps and inserted only if still vacant, so
//! concurrent first lookups of the same name agree on one value.

mod types;


pub use types::{
    InputField, InputShape, ObjectKind, ObjectType, OutputType, RootField, RootType, ShapeKey,
    TypeRef, UnionType,
};

use crate::cache::{CachedGateway, MetadataCache};
use crate::error::SchemaError;
use crate::gateway::{Described, OntologyGateway};
use crate::naming::{
    is_class_name, is_variable_safe, safe, union_name, union_property, unsafe_name, Datatype,
    InlineOperation, ScalarKind, VALUE_KEY,
};
use dashmap::DashMap;
use indexmap::IndexMap;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

pub const ROOT_QUERY: &str = "Query";
pub const ROOT_MUTATION: &str = "Mutation";
pub const DEFAULT_MAX_DEPTH: usize = 100;

pub struct TypeRegistry {
    gateway: Arc<dyn OntologyGateway>,
    cache: Arc<MetadataCache>,
    max_depth: usize,
    types: DashMap<String, OutputType>,
    shapes: DashMap<ShapeKey, Arc<InputShape>>,
}

impl TypeRegistry {
    /// Wrap `gateway` in a fresh metadata cache.
    pub fn new<G: OntologyGateway + 'static>(gateway: G) -> Self {
        Self::with_cache(gateway, Arc::new(MetadataCache::new()))
    }

    pub fn with_cache<G: OntologyGateway + 'static>(gateway: G, cache: Arc<MetadataCache>) -> Self {
        Self {
            gateway: Arc::new(CachedGateway::new(gateway, cache.clone())),
            cache,
            max_depth: DEFAULT_MAX_DEPTH,
            types: DashMap::new(),
            shapes: DashMap::new(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn gateway(&self) -> &dyn OntologyGateway {
        self.gateway.as_ref()
    }

    /// Namespace prefix of an ontology local name.
    pub fn namespace_for(&self, local_name: &str) -> Result<String, SchemaError> {
        self.gateway.namespace_for(local_name)
    }

    /// Drop every memoized type, shape and metadata entry.
    pub fn expire(&self) {
        self.types.clear();
        self.shapes.clear();
        self.cache.expire();
    }

    // ========================================================================
    // Output types
    // ========================================================================

    /// Type for a safe or unsafe name.
    pub fn type_for(&self, name: &str) -> Result<OutputType, SchemaError> {
        let key = safe(name);
        if let Some(hit) = self.types.get(&key) {
            return Ok(hit.value().clone());
        }
        let built = self.build_type(&key)?;
        Ok(self.types.entry(key).or_insert(built).value().clone())
    }

    fn build_type(&self, safe_name: &str) -> Result<OutputType, SchemaError> {
        let unsafe_type = unsafe_name(safe_name);
        if let Some(property) = union_property(&unsafe_type) {
            return Ok(OutputType::Union(Arc::new(UnionType::new(
                unsafe_type.clone(),
                property,
            ))));
        }
        if !is_class_name(&unsafe_type) || !is_variable_safe(&unsafe_type) {
            return Err(SchemaError::InvalidType(safe_name.to_string()));
        }

        let description = self
            .gateway
            .class_description(&unsafe_type)?
            .ok_or_else(|| SchemaError::InvalidType(safe_name.to_string()))?;

        let object = match Datatype::from_unsafe(&unsafe_type) {
            Some(datatype) => ObjectType {
                name: datatype.safe_name().to_string(),
                description: Some(description),
                kind: ObjectKind::Scalar(datatype),
                fields: IndexMap::from([(
                    VALUE_KEY.to_string(),
                    TypeRef::Scalar(datatype.scalar_kind()),
                )]),
            },
            None => ObjectType {
                name: unsafe_type.clone(),
                description: Some(description),
                kind: ObjectKind::Class,
                fields: self.class_fields(&unsafe_type)?,
            },
        };
        tracing::debug!(name = %object.name, fields = object.fields.len(), "built object type");
        Ok(OutputType::Object(Arc::new(object)))
    }

    fn class_fields(&self, class: &str) -> Result<IndexMap<String, TypeRef>, SchemaError> {
        let mut fields = IndexMap::new();
        for property in self.gateway.properties_of(class)? {
            if !is_variable_safe(&property.name) {
                return Err(unusable_name(class, &property.name));
            }
            let union = TypeRef::Named(union_name(&property.name));
            fields.insert(property.name, TypeRef::list_of(union));
        }
        Ok(fields)
    }

    /// Member types of a union, in range order.
    pub fn union_members(&self, union: &UnionType) -> Result<Vec<OutputType>, SchemaError> {
        let names = union.members.get_or_try_init(|| {
            Ok::<_, SchemaError>(
                self.gateway
                    .ranges_of(&union.property)?
                    .into_iter()
                    .map(|range| safe(&range.name))
                    .collect(),
            )
        })?;
        names.iter().map(|name| self.type_for(name)).collect()
    }

    /// Pick the member a runtime value belongs to, from its discriminant
    /// (the value's type name).
    pub fn resolve_member(
        &self,
        union: &UnionType,
        discriminant: &str,
    ) -> Result<Arc<ObjectType>, SchemaError> {
        let wanted = safe(discriminant);
        self.union_members(union)?
            .into_iter()
            .filter_map(|member| member.as_object().cloned())
            .find(|object| object.name == wanted)
            .ok_or_else(|| {
                SchemaError::InvalidType(format!("{discriminant} is not a member of {}", union.name))
            })
    }

    pub fn root_query(&self) -> Result<RootType, SchemaError> {
        self.root_type(ROOT_QUERY, ShapeKey::Query)
    }

    pub fn root_mutation(&self) -> Result<RootType, SchemaError> {
        self.root_type(ROOT_MUTATION, ShapeKey::Mutation)
    }

    fn root_type(&self, name: &str, role: fn(String) -> ShapeKey) -> Result<RootType, SchemaError> {
        let mut fields = Vec::new();
        for class in self.gateway.class_list()? {
            if !is_variable_safe(&class.name) {
                return Err(SchemaError::InvalidType(class.name));
            }
            let mut arguments = IndexMap::new();
            for property in self.gateway.properties_of(&class.name)? {
                if !is_variable_safe(&property.name) {
                    return Err(unusable_name(&class.name, &property.name));
                }
                let key = role(property.name.clone());
                arguments.insert(property.name, InputField::shape(key, property.description));
            }
            let safe_name = safe(&class.name);
            fields.push(RootField {
                output: TypeRef::list_of(TypeRef::Named(safe_name.clone())),
                name: safe_name,
                description: class.description,
                arguments,
            });
        }
        Ok(RootType {
            name: name.to_string(),
            fields,
        })
    }

    // ========================================================================
    // Input shapes
    // ========================================================================

    pub fn query_argument_shape(
        &self,
        name: &str,
        description: &str,
    ) -> Result<Arc<InputShape>, SchemaError> {
        self.shape(&ShapeKey::Query(unsafe_name(name)), description)
    }

    pub fn mutation_argument_shape(
        &self,
        name: &str,
        description: &str,
    ) -> Result<Arc<InputShape>, SchemaError> {
        self.shape(&ShapeKey::Mutation(unsafe_name(name)), description)
    }

    /// Shape for `key`, built once.
    pub fn shape(&self, key: &ShapeKey, description: &str) -> Result<Arc<InputShape>, SchemaError> {
        if let Some(hit) = self.shapes.get(key) {
            return Ok(hit.value().clone());
        }
        let built = Arc::new(InputShape {
            name: key.shape_name(),
            description: description.to_string(),
            fields: self.shape_fields(key)?,
        });
        Ok(self
            .shapes
            .entry(key.clone())
            .or_insert(built)
            .value()
            .clone())
    }

    fn shape_fields(&self, key: &ShapeKey) -> Result<IndexMap<String, InputField>, SchemaError> {
        match key {
            ShapeKey::Query(name) | ShapeKey::Mutation(name) => {
                let mutation = matches!(key, ShapeKey::Mutation(_));
                if let Some(datatype) = Datatype::from_unsafe(name) {
                    return Ok(comparison_fields(datatype));
                }
                if is_class_name(name) {
                    return self.class_argument_fields(name, mutation);
                }
                self.property_argument_fields(name, mutation)
            }
            ShapeKey::InlineValue { datatype, .. } => Ok(IndexMap::from([(
                VALUE_KEY.to_string(),
                InputField::scalar(datatype.scalar_kind()),
            )])),
            ShapeKey::Insert(property)
            | ShapeKey::ReplaceWith(property)
            | ShapeKey::ReplaceAllWith(property) => self.payload_fields(property),
            ShapeKey::Detach | ShapeKey::DetachAll => Ok(IndexMap::from([(
                "confirm".to_string(),
                InputField::scalar(ScalarKind::Boolean),
            )])),
        }
    }

    fn class_argument_fields(
        &self,
        class: &str,
        mutation: bool,
    ) -> Result<IndexMap<String, InputField>, SchemaError> {
        Ok(self
            .gateway
            .properties_of(class)?
            .into_iter()
            .map(|property| {
                let key = if mutation {
                    ShapeKey::Mutation(property.name.clone())
                } else {
                    ShapeKey::Query(property.name.clone())
                };
                (property.name, InputField::shape(key, property.description))
            })
            .collect())
    }

    fn property_argument_fields(
        &self,
        property: &str,
        mutation: bool,
    ) -> Result<IndexMap<String, InputField>, SchemaError> {
        let mut fields = IndexMap::new();
        for range in self.gateway.ranges_of(property)? {
            let key = if mutation {
                ShapeKey::Mutation(range.name.clone())
            } else {
                ShapeKey::Query(range.name.clone())
            };
            fields.insert(safe(&range.name), InputField::shape(key, range.description));
        }
        if mutation {
            for operation in InlineOperation::ALL {
                let (key, description) = operation_shape(operation, property);
                fields.insert(
                    operation.keyword().to_string(),
                    InputField::shape(key, description),
                );
            }
        }
        Ok(fields)
    }

    /// Template fields shared by insert, replaceWith and replaceAllWith.
    fn payload_fields(&self, property: &str) -> Result<IndexMap<String, InputField>, SchemaError> {
        Ok(self
            .gateway
            .ranges_of(property)?
            .into_iter()
            .map(|Described { name, description }| {
                let key = match Datatype::from_unsafe(&name) {
                    Some(datatype) => ShapeKey::InlineValue {
                        property: property.to_string(),
                        datatype,
                    },
                    None => ShapeKey::Mutation(name.clone()),
                };
                (safe(&name), InputField::shape(key, description))
            })
            .collect())
    }

    /// Every shape reachable from `root`, breadth-first, at most
    /// `max_depth` levels deep. Cyclic class graphs terminate because each
    /// shape is visited once.
    pub fn argument_shape_closure(
        &self,
        root: &ShapeKey,
        description: &str,
    ) -> Result<Vec<Arc<InputShape>>, SchemaError> {
        let mut seen = HashSet::from([root.clone()]);
        let mut queue = VecDeque::from([(root.clone(), description.to_string(), 0usize)]);
        let mut out = Vec::new();
        while let Some((key, description, depth)) = queue.pop_front() {
            let shape = self.shape(&key, &description)?;
            if depth < self.max_depth {
                for field in shape.fields.values() {
                    if let InputField::Shape { key, description } = field {
                        if seen.insert(key.clone()) {
                            queue.push_back((key.clone(), description.clone(), depth + 1));
                        }
                    }
                }
            }
            out.push(shape);
        }
        Ok(out)
    }
}

fn unusable_name(class: &str, property: &str) -> SchemaError {
    SchemaError::InvalidType(format!(
        "property `{property}` of {class} contains `_` and cannot be queried"
    ))
}

fn comparison_fields(datatype: Datatype) -> IndexMap<String, InputField> {
    let kind = datatype.scalar_kind();
    datatype
        .comparisons()
        .iter()
        .map(|comparison| (comparison.keyword().to_string(), InputField::scalar(kind)))
        .collect()
}

fn operation_shape(operation: InlineOperation, property: &str) -> (ShapeKey, String) {
    let property = property.to_string();
    match operation {
        InlineOperation::Insert => (ShapeKey::Insert(property.clone()), format!("insert{property}")),
        InlineOperation::ReplaceWith => (
            ShapeKey::ReplaceWith(property.clone()),
            format!("Replace existing entities of type {property} limited by matching criteria"),
        ),
        InlineOperation::ReplaceAllWith => (
            ShapeKey::ReplaceAllWith(property.clone()),
            format!("Replace all existing entities of type {property}"),
        ),
        InlineOperation::Detach => (
            ShapeKey::Detach,
            "Detach existing entities limited by matching criteria".to_string(),
        ),
        InlineOperation::DetachAll => {
            (ShapeKey::DetachAll, "Detach all existing entities".to_string())
        }
    }
}
