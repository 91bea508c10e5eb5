//! Parsed operations as handed to the engine.
//!
//! Parsing operation text is left to whatever front end sits in front of
//! the engine; requests arrive here already structured, either built in
//! code or deserialized from JSON:
//!
//! ```json
//! {
//!   "kind": "mutation",
//!   "selections": [{
//!     "kind": "field",
//!     "name": "Person",
//!     "arguments": {"name": {"TextType": {"equalTo": "Foo"}}},
//!     "selections": [{
//!       "kind": "field",
//!       "name": "name",
//!       "selections": [{
//!         "kind": "inline_fragment",
//!         "type_condition": "TextType",
//!         "selections": [{"kind": "field", "name": "value"}]
//!       }]
//!     }]
//!   }]
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const TYPENAME: &str = "__typename";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Query,
    Mutation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selection {
    Field {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alias: Option<String>,
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        arguments: Map<String, Value>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        selections: Vec<Selection>,
    },
    InlineFragment {
        type_condition: String,
        #[serde(default)]
        selections: Vec<Selection>,
    },
}

impl Selection {
    pub fn field(name: impl Into<String>) -> Self {
        Selection::Field {
            name: name.into(),
            alias: None,
            arguments: Map::new(),
            selections: Vec::new(),
        }
    }

    pub fn on(type_condition: impl Into<String>, selections: Vec<Selection>) -> Self {
        Selection::InlineFragment {
            type_condition: type_condition.into(),
            selections,
        }
    }

    pub fn with_arguments(mut self, value: Value) -> Self {
        if let (Selection::Field { arguments, .. }, Value::Object(map)) = (&mut self, value) {
            *arguments = map;
        }
        self
    }

    pub fn with_selections(mut self, children: Vec<Selection>) -> Self {
        match &mut self {
            Selection::Field { selections, .. } | Selection::InlineFragment { selections, .. } => {
                *selections = children;
            }
        }
        self
    }

    pub fn aliased(mut self, new_alias: impl Into<String>) -> Self {
        if let Selection::Field { alias, .. } = &mut self {
            *alias = Some(new_alias.into());
        }
        self
    }

    /// Key under which this field's value appears in the response.
    pub fn response_key(&self) -> Option<&str> {
        match self {
            Selection::Field { name, alias, .. } => Some(alias.as_deref().unwrap_or(name)),
            Selection::InlineFragment { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub kind: OperationKind,
    pub selections: Vec<Selection>,
}

impl Operation {
    pub fn query(selections: Vec<Selection>) -> Self {
        Self {
            kind: OperationKind::Query,
            selections,
        }
    }

    pub fn mutation(selections: Vec<Selection>) -> Self {
        Self {
            kind: OperationKind::Mutation,
            selections,
        }
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
