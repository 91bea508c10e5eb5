//! # Ontograph SPARQL
//!
//! The graph-pattern vocabulary shared by the schema and engine crates:
//!
//! - [`Term`], [`Variable`], [`Node`] and [`Predicate`] for triple positions
//! - [`Fragment`] and [`Expression`] for where-clauses
//! - [`Statement`] for selects and writes, rendered with [`Statement::to_sparql`]
//! - [`StoreClient`], the single seam to a triple store, with an HTTP
//!   implementation and a scripted double for tests

#![allow(clippy::module_name_repetitions)]

pub mod namespaces;
pub mod pattern;
pub mod scripted;
pub mod statement;
pub mod store;
pub mod term;

#[cfg(feature = "http")]
pub mod http;

pub use namespaces::Namespaces;
pub use pattern::{Expression, Fragment, Triple};
pub use scripted::ScriptedStore;
pub use statement::{Select, Statement, Write};
pub use store::{Row, StoreClient, StoreError};
pub use term::{Node, Predicate, Term, Variable};

#[cfg(feature = "http")]
pub use http::HttpStoreClient;
