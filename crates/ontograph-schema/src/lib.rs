//! # Ontograph Schema
//!
//! Everything derived from the ontology rather than from a request:
//!
//! - [`naming`]: the class/property convention, datatype names and keywords
//! - [`codec`]: scalar values ⇄ typed store literals
//! - [`gateway`]: metadata sources (in-memory and store-backed)
//! - [`cache`]: the process-wide metadata cache
//! - [`registry`]: the dynamic type registry

pub mod cache;
pub mod codec;
pub mod error;
pub mod gateway;
pub mod naming;
pub mod registry;

pub use cache::{CachedGateway, MetadataCache};
pub use error::SchemaError;
pub use gateway::{Described, InMemoryOntology, OntologyGateway, SparqlGateway};
pub use naming::{is_class_name, is_union_name, safe, unsafe_name, Comparison, Datatype, InlineOperation, ScalarKind};
pub use registry::{
    InputField, InputShape, ObjectKind, ObjectType, OutputType, RootType, ShapeKey, TypeRef,
    TypeRegistry,
};
