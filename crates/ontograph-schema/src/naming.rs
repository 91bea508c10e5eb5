//! Naming conventions shared by every component.
//!
//! Ontology local names starting with an uppercase letter are classes;
//! everything else is a property. The nine recognized datatypes have an
//! API-facing ("safe") spelling distinct from their ontology spelling.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Suffix naming the polymorphic union type of a property.
pub const UNION_SUFFIX: &str = "Union";

/// Payload key for scalar leaves in inline mutations and wrapper types.
pub const VALUE_KEY: &str = "value";

/// Uppercase first character ⇒ class.
pub fn is_class_name(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// `fooUnion` (lowercase start) names the union type of property `foo`.
pub fn is_union_name(name: &str) -> bool {
    !is_class_name(name) && name.len() > UNION_SUFFIX.len() && name.ends_with(UNION_SUFFIX)
}

pub fn union_name(property: &str) -> String {
    format!("{property}{UNION_SUFFIX}")
}

/// Property name behind a union type name.
pub fn union_property(name: &str) -> Option<&str> {
    if is_union_name(name) {
        name.strip_suffix(UNION_SUFFIX)
    } else {
        None
    }
}

/// Separator of generated variable names. Ontology names carrying it would
/// make those names ambiguous, so the registry refuses them.
pub const VARIABLE_SEPARATOR: char = '_';

/// Whether `name` can take part in generated variable names.
pub fn is_variable_safe(name: &str) -> bool {
    !name.contains(VARIABLE_SEPARATOR)
}

/// API-facing spelling of an ontology name.
pub fn safe(name: &str) -> String {
    match Datatype::from_unsafe(name) {
        Some(datatype) => datatype.safe_name().to_string(),
        None => name.to_string(),
    }
}

/// Ontology spelling of an API-facing name.
pub fn unsafe_name(name: &str) -> String {
    match Datatype::from_safe(name) {
        Some(datatype) => datatype.unsafe_name().to_string(),
        None => name.to_string(),
    }
}

// ============================================================================
// Datatypes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Datatype {
    Boolean,
    Date,
    DateTime,
    Float,
    Integer,
    Number,
    Text,
    Time,
    Url,
}

impl Datatype {
    pub const ALL: [Datatype; 9] = [
        Datatype::Boolean,
        Datatype::Date,
        Datatype::DateTime,
        Datatype::Float,
        Datatype::Integer,
        Datatype::Number,
        Datatype::Text,
        Datatype::Time,
        Datatype::Url,
    ];

    pub fn unsafe_name(self) -> &'static str {
        match self {
            Datatype::Boolean => "Boolean",
            Datatype::Date => "Date",
            Datatype::DateTime => "DateTime",
            Datatype::Float => "Float",
            Datatype::Integer => "Integer",
            Datatype::Number => "Number",
            Datatype::Text => "Text",
            Datatype::Time => "Time",
            Datatype::Url => "URL",
        }
    }

    /// API-facing spelling: the ontology name plus `Type`, for all nine
    /// kinds. `Time` becomes `TimeType` as well; earlier schema.org API
    /// layers exposed it unchanged as `Time`, so clients written against
    /// those must rename their fragments.
    pub fn safe_name(self) -> &'static str {
        match self {
            Datatype::Boolean => "BooleanType",
            Datatype::Date => "DateType",
            Datatype::DateTime => "DateTimeType",
            Datatype::Float => "FloatType",
            Datatype::Integer => "IntegerType",
            Datatype::Number => "NumberType",
            Datatype::Text => "TextType",
            Datatype::Time => "TimeType",
            Datatype::Url => "URLType",
        }
    }

    pub fn from_unsafe(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.unsafe_name() == name)
    }

    pub fn from_safe(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.safe_name() == name)
    }

    /// Accepts either spelling.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::from_safe(name).or_else(|| Self::from_unsafe(name))
    }

    /// Local name of the xsd datatype the store tags literals with.
    /// `None` for URL, whose values are IRIs.
    pub fn xsd_local(self) -> Option<&'static str> {
        match self {
            Datatype::Boolean => Some("boolean"),
            Datatype::Date => Some("date"),
            Datatype::DateTime => Some("dateTime"),
            Datatype::Float => Some("float"),
            Datatype::Integer => Some("integer"),
            Datatype::Number => Some("decimal"),
            Datatype::Text => Some("string"),
            Datatype::Time => Some("time"),
            Datatype::Url => None,
        }
    }

    /// Primitive kind of the wrapper's `value` field.
    pub fn scalar_kind(self) -> ScalarKind {
        match self {
            Datatype::Boolean => ScalarKind::Boolean,
            Datatype::Date
            | Datatype::DateTime
            | Datatype::Text
            | Datatype::Time
            | Datatype::Url => ScalarKind::String,
            Datatype::Float | Datatype::Number => ScalarKind::Float,
            Datatype::Integer => ScalarKind::Int,
        }
    }

    /// Filter operators available on this datatype, in declaration order.
    pub fn comparisons(self) -> &'static [Comparison] {
        use Comparison::*;
        match self {
            Datatype::Boolean => &[EqualTo, NotEqualTo],
            Datatype::Date
            | Datatype::DateTime
            | Datatype::Time
            | Datatype::Float
            | Datatype::Number
            | Datatype::Integer => &[EqualTo, GreaterThan, LessThan, NotEqualTo],
            Datatype::Text | Datatype::Url => &[Contains, EqualTo, NotEqualTo],
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.safe_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    Boolean,
    String,
    Float,
    Int,
}

impl ScalarKind {
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Boolean => "Boolean",
            ScalarKind::String => "String",
            ScalarKind::Float => "Float",
            ScalarKind::Int => "Int",
        }
    }
}

// ============================================================================
// Keywords
// ============================================================================

/// Filter operator keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Contains,
    EqualTo,
    GreaterThan,
    LessThan,
    NotEqualTo,
}

impl Comparison {
    pub const ALL: [Comparison; 5] = [
        Comparison::Contains,
        Comparison::EqualTo,
        Comparison::GreaterThan,
        Comparison::LessThan,
        Comparison::NotEqualTo,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            Comparison::Contains => "contains",
            Comparison::EqualTo => "equalTo",
            Comparison::GreaterThan => "greaterThan",
            Comparison::LessThan => "lessThan",
            Comparison::NotEqualTo => "notEqualTo",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.keyword() == keyword)
    }
}

/// Write-operation keywords embedded in mutation arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InlineOperation {
    Insert,
    Detach,
    DetachAll,
    ReplaceWith,
    ReplaceAllWith,
}

impl InlineOperation {
    pub const ALL: [InlineOperation; 5] = [
        InlineOperation::Detach,
        InlineOperation::DetachAll,
        InlineOperation::Insert,
        InlineOperation::ReplaceWith,
        InlineOperation::ReplaceAllWith,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            InlineOperation::Insert => "insert",
            InlineOperation::Detach => "detach",
            InlineOperation::DetachAll => "detachAll",
            InlineOperation::ReplaceWith => "replaceWith",
            InlineOperation::ReplaceAllWith => "replaceAllWith",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.keyword() == keyword)
    }

    /// Detach-all and replace-all widen the matched triple to every object.
    pub fn widens(self) -> bool {
        matches!(
            self,
            InlineOperation::DetachAll | InlineOperation::ReplaceAllWith
        )
    }
}
