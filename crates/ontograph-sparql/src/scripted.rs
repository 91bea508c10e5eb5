//! An in-process store double driven by canned result sets.

use crate::namespaces::Namespaces;
use crate::statement::Statement;
use crate::store::{Row, StoreClient, StoreError};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Records every statement it receives and answers reads from a queue of
/// canned result sets, in order. Writes are recorded and never consume a
/// result set.
#[derive(Default)]
pub struct ScriptedStore {
    namespaces: Namespaces,
    responses: Mutex<VecDeque<Vec<Row>>>,
    log: Mutex<Vec<Statement>>,
}

impl ScriptedStore {
    pub fn new(namespaces: Namespaces) -> Self {
        Self {
            namespaces,
            ..Self::default()
        }
    }

    /// Queue the rows for the next unanswered read.
    pub fn respond(&self, rows: Vec<Row>) -> &Self {
        self.responses.lock().push_back(rows);
        self
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.log.lock().clone()
    }

    /// Rendered text of every received statement, in arrival order.
    pub fn rendered(&self) -> Vec<String> {
        self.log
            .lock()
            .iter()
            .map(|s| s.to_sparql(&self.namespaces))
            .collect()
    }

    pub fn reads(&self) -> usize {
        self.log.lock().iter().filter(|s| s.is_read()).count()
    }

    pub fn writes(&self) -> usize {
        self.log.lock().iter().filter(|s| !s.is_read()).count()
    }
}

impl StoreClient for ScriptedStore {
    fn execute(&self, statement: &Statement) -> Result<Vec<Row>, StoreError> {
        self.log.lock().push(statement.clone());
        if !statement.is_read() {
            return Ok(Vec::new());
        }
        self.responses.lock().pop_front().ok_or_else(|| {
            StoreError::Script("no canned rows left for select".to_string())
        })
    }
}
