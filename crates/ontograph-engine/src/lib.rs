//! # Ontograph Engine
//!
//! The request pipeline over a [`TypeRegistry`](ontograph_schema::TypeRegistry)
//! and a [`StoreClient`](ontograph_sparql::StoreClient):
//!
//! 1. [`condense`]: argument trees → graph-pattern fragments and, for
//!    mutations, an ordered write plan
//! 2. [`hydrate`]: selection trees → optional patterns and a projection
//! 3. [`resolver`]: writes, one select, and the shared result tree, once per
//!    root field and request
//! 4. [`tree`]: folding rows into a tree and navigating it by response path
//! 5. [`executor`]: a small field-by-field driver producing response JSON

pub mod condense;
pub mod config;
pub mod error;
pub mod executor;
pub mod hydrate;
pub mod path;
pub mod request;
pub mod resolver;
pub mod tree;

#[cfg(test)]
pub(crate) mod fixtures;

pub use condense::{Condenser, ContextId, Mode};
pub use config::{ConfigError, EngineConfig, StoreConfig};
pub use error::{ApiError, EngineError, ErrorKind, ERROR_CATEGORY};
pub use executor::Executor;
pub use hydrate::{Hydration, Hydrator};
pub use request::{Operation, OperationKind, Selection};
pub use resolver::{Engine, RequestContext, Resolution, RootField};
pub use tree::{FieldValue, Member, PathElement, Resolved, ResultTree};
