//! Result tree: flat solution rows folded back into the requested shape.
//!
//! Each bound hydration variable names its own position (root entity,
//! property, branch, member type). Folding a binding walks that position
//! from the root, locating or creating one node per step. Ancestors are
//! identified by the row's own bindings of their entity variables, so the
//! same value under two different entities lands in two places while a
//! value repeated by the row product is stored once.

use crate::path::{HydrationPath, Step};
use indexmap::IndexMap;
use ontograph_schema::naming::VALUE_KEY;
use ontograph_sparql::Row;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultTree {
    members: Vec<Member>,
}

/// One entity or one datatype wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    /// Store identifier of an entity; `None` for datatype wrappers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    pub type_name: String,
    pub fields: IndexMap<String, FieldValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Leaf(String),
    Members(Vec<Member>),
}

/// One step of a response path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathElement {
    Key(String),
    Index(usize),
}

impl From<&str> for PathElement {
    fn from(key: &str) -> Self {
        PathElement::Key(key.to_string())
    }
}

impl From<usize> for PathElement {
    fn from(index: usize) -> Self {
        PathElement::Index(index)
    }
}

/// What a response path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved<'a> {
    Members(&'a [Member]),
    Member(&'a Member),
    Leaf(&'a str),
}

impl Member {
    fn entity(identifier: &str, type_name: &str) -> Self {
        Self {
            identifier: Some(identifier.to_string()),
            type_name: type_name.to_string(),
            fields: IndexMap::new(),
        }
    }

    fn wrapper(type_name: &str, value: &str) -> Self {
        Self {
            identifier: None,
            type_name: type_name.to_string(),
            fields: IndexMap::from([(VALUE_KEY.to_string(), FieldValue::Leaf(value.to_string()))]),
        }
    }

    pub fn leaf(&self, key: &str) -> Option<&str> {
        match self.fields.get(key) {
            Some(FieldValue::Leaf(value)) => Some(value),
            _ => None,
        }
    }

    pub fn members(&self, key: &str) -> &[Member] {
        match self.fields.get(key) {
            Some(FieldValue::Members(members)) => members,
            _ => &[],
        }
    }

    /// Member list under `key`, created on first use. `None` when `key`
    /// already holds a leaf.
    fn members_mut(&mut self, key: &str) -> Option<&mut Vec<Member>> {
        let slot = self
            .fields
            .entry(key.to_string())
            .or_insert_with(|| FieldValue::Members(Vec::new()));
        match slot {
            FieldValue::Members(members) => Some(members),
            FieldValue::Leaf(_) => None,
        }
    }
}

impl ResultTree {
    pub fn from_rows(rows: &[Row]) -> Self {
        let mut tree = Self::default();
        for row in rows {
            tree.fold(row);
        }
        tree
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Fold every hydration binding of one row into the tree. Bindings that
    /// are not hydration variables, or whose ancestors are unbound in this
    /// row, are ignored.
    pub fn fold(&mut self, row: &Row) {
        for (name, term) in row {
            let Some(path) = HydrationPath::parse(name) else {
                continue;
            };
            let ancestors: Option<Vec<String>> = path
                .entity_names()
                .iter()
                .map(|entity| row.get(entity).map(|t| t.raw_value()))
                .collect();
            let Some(ancestors) = ancestors else {
                tracing::trace!(binding = %name, "skipping binding with unbound ancestor");
                continue;
            };
            self.insert(&path, &ancestors, &term.raw_value());
        }
    }

    /// Locate or create the node `path` names. `ancestors` holds the
    /// identifiers of the root and of each entity step.
    fn insert(&mut self, path: &HydrationPath, ancestors: &[String], value: &str) {
        let (entity_steps, leaf_step): (&[Step], Option<&Step>) = if path.leaf {
            match path.steps.split_last() {
                Some((last, rest)) => (rest, Some(last)),
                None => return,
            }
        } else {
            (path.steps.as_slice(), None)
        };

        let mut current = locate_entity(&mut self.members, &ancestors[0], &path.root_class);
        for (step, identifier) in entity_steps.iter().zip(&ancestors[1..]) {
            let Some(siblings) = current.members_mut(&step.property) else {
                return;
            };
            current = locate_entity(siblings, identifier, &step.type_name);
        }

        if let Some(step) = leaf_step {
            let Some(siblings) = current.members_mut(&step.property) else {
                return;
            };
            let exists = siblings
                .iter()
                .any(|m| m.type_name == step.type_name && m.leaf(VALUE_KEY) == Some(value));
            if !exists {
                siblings.push(Member::wrapper(&step.type_name, value));
            }
        }
    }

    /// Resolve a response path below the root field. A path that leaves
    /// the tree resolves to an empty list.
    pub fn navigate(&self, path: &[PathElement]) -> Resolved<'_> {
        let mut cursor = Resolved::Members(&self.members);
        for element in path {
            cursor = match (cursor, element) {
                (Resolved::Members(members), PathElement::Index(i)) => match members.get(*i) {
                    Some(member) => Resolved::Member(member),
                    None => return Resolved::Members(&[]),
                },
                (Resolved::Member(member), PathElement::Key(key)) => match member.fields.get(key) {
                    Some(FieldValue::Members(members)) => Resolved::Members(members),
                    Some(FieldValue::Leaf(value)) => Resolved::Leaf(value),
                    None => return Resolved::Members(&[]),
                },
                _ => return Resolved::Members(&[]),
            };
        }
        cursor
    }
}

fn locate_entity<'a>(siblings: &'a mut Vec<Member>, identifier: &str, type_name: &str) -> &'a mut Member {
    let position = siblings
        .iter()
        .position(|m| m.identifier.as_deref() == Some(identifier) && m.type_name == type_name);
    let index = match position {
        Some(index) => index,
        None => {
            siblings.push(Member::entity(identifier, type_name));
            siblings.len() - 1
        }
    };
    &mut siblings[index]
}
