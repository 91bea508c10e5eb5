//! Terms and variables.
//!
//! A [`Term`] is a concrete store value (IRI, prefixed IRI, plain or typed
//! literal). Graph patterns additionally need variables in subject/object
//! position, which is what [`Node`] is for.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named placeholder bound to one value per result row.
///
/// Identity is by name: two variables with the same name are the same variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variable(String);

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

/// A store value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Term {
    /// Absolute IRI, rendered `<...>`.
    Iri { value: String },
    /// `prefix:local`, resolved against the statement's namespaces.
    PrefixedIri { prefix: String, local: String },
    /// Untagged string literal.
    PlainLiteral { value: String },
    /// Literal carrying an explicit datatype.
    TypedLiteral { value: String, datatype: Box<Term> },
}

impl Term {
    pub fn iri(value: impl Into<String>) -> Self {
        Term::Iri {
            value: value.into(),
        }
    }

    pub fn prefixed(prefix: impl Into<String>, local: impl Into<String>) -> Self {
        Term::PrefixedIri {
            prefix: prefix.into(),
            local: local.into(),
        }
    }

    pub fn plain(value: impl Into<String>) -> Self {
        Term::PlainLiteral {
            value: value.into(),
        }
    }

    pub fn typed(value: impl Into<String>, datatype: Term) -> Self {
        Term::TypedLiteral {
            value: value.into(),
            datatype: Box::new(datatype),
        }
    }

    /// `xsd:<local>` shorthand for typed literals.
    pub fn xsd(local: &str) -> Self {
        Term::prefixed("xsd", local)
    }

    /// The lexical value without any syntax (what the result tree stores).
    pub fn raw_value(&self) -> String {
        match self {
            Term::Iri { value } | Term::PlainLiteral { value } => value.clone(),
            Term::PrefixedIri { prefix, local } => format!("{prefix}:{local}"),
            Term::TypedLiteral { value, .. } => value.clone(),
        }
    }

    pub fn is_iri(&self) -> bool {
        matches!(self, Term::Iri { .. } | Term::PrefixedIri { .. })
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri { value } => write!(f, "<{value}>"),
            Term::PrefixedIri { prefix, local } => write!(f, "{prefix}:{local}"),
            Term::PlainLiteral { value } => write!(f, "\"{}\"", escape_literal(value)),
            Term::TypedLiteral { value, datatype } => {
                write!(f, "\"{}\"^^{datatype}", escape_literal(value))
            }
        }
    }
}

/// Subject/object position of a triple pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    Term(Term),
    Variable(Variable),
}

impl From<Term> for Node {
    fn from(term: Term) -> Self {
        Node::Term(term)
    }
}

impl From<Variable> for Node {
    fn from(variable: Variable) -> Self {
        Node::Variable(variable)
    }
}

impl From<&Variable> for Node {
    fn from(variable: &Variable) -> Self {
        Node::Variable(variable.clone())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Term(term) => term.fmt(f),
            Node::Variable(variable) => variable.fmt(f),
        }
    }
}

/// Predicate position: a plain IRI or one of the two property paths the
/// ontology lookups need.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    Term(Term),
    /// `p*`
    ZeroOrMore(Term),
    /// `^p`
    Inverse(Term),
}

impl From<Term> for Predicate {
    fn from(term: Term) -> Self {
        Predicate::Term(term)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Term(term) => term.fmt(f),
            Predicate::ZeroOrMore(term) => write!(f, "{term}*"),
            Predicate::Inverse(term) => write!(f, "^{term}"),
        }
    }
}

fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}
