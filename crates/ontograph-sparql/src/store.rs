//! The store seam: one synchronous call per statement.

use crate::statement::Statement;
use crate::term::Term;
use indexmap::IndexMap;

/// One solution: variable name (without `?`) → bound term.
///
/// Unbound variables are simply absent.
pub type Row = IndexMap<String, Term>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("store returned status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("malformed result document: {0}")]
    Decode(String),

    /// Raised by test doubles when the canned responses run out.
    #[error("scripted store exhausted: {0}")]
    Script(String),
}

/// Executes statements against a triple store.
///
/// Reads return their rows; writes return an empty vector.
pub trait StoreClient: Send + Sync {
    fn execute(&self, statement: &Statement) -> Result<Vec<Row>, StoreError>;
}

impl<T: StoreClient + ?Sized> StoreClient for std::sync::Arc<T> {
    fn execute(&self, statement: &Statement) -> Result<Vec<Row>, StoreError> {
        (**self).execute(statement)
    }
}

impl<T: StoreClient + ?Sized> StoreClient for &T {
    fn execute(&self, statement: &Statement) -> Result<Vec<Row>, StoreError> {
        (**self).execute(statement)
    }
}
