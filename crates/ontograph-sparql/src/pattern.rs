//! Graph-pattern fragments: triples, filters, optional and negated groups.

use crate::term::{Node, Predicate, Term, Variable};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    pub subject: Node,
    pub predicate: Predicate,
    pub object: Node,
}

impl Triple {
    pub fn new(
        subject: impl Into<Node>,
        predicate: impl Into<Predicate>,
        object: impl Into<Node>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

/// Filter expressions. Only the shapes the compiler emits are modelled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expression {
    Node(Node),
    /// `regex(target, "pattern")`
    Regex(Box<Expression>, String),
    Equal(Box<Expression>, Box<Expression>),
    NotEqual(Box<Expression>, Box<Expression>),
    GreaterThan(Box<Expression>, Box<Expression>),
    LessThan(Box<Expression>, Box<Expression>),
    Datatype(Box<Expression>),
    IsIri(Box<Expression>),
    Str(Box<Expression>),
}

impl Expression {
    pub fn var(variable: &Variable) -> Self {
        Expression::Node(Node::from(variable))
    }

    pub fn term(term: Term) -> Self {
        Expression::Node(Node::Term(term))
    }

    pub fn equal(left: Expression, right: Expression) -> Self {
        Expression::Equal(Box::new(left), Box::new(right))
    }

    pub fn not_equal(left: Expression, right: Expression) -> Self {
        Expression::NotEqual(Box::new(left), Box::new(right))
    }

    pub fn greater_than(left: Expression, right: Expression) -> Self {
        Expression::GreaterThan(Box::new(left), Box::new(right))
    }

    pub fn less_than(left: Expression, right: Expression) -> Self {
        Expression::LessThan(Box::new(left), Box::new(right))
    }

    pub fn regex(target: Expression, pattern: impl Into<String>) -> Self {
        Expression::Regex(Box::new(target), pattern.into())
    }

    pub fn datatype(inner: Expression) -> Self {
        Expression::Datatype(Box::new(inner))
    }

    pub fn is_iri(inner: Expression) -> Self {
        Expression::IsIri(Box::new(inner))
    }

    pub fn str(inner: Expression) -> Self {
        Expression::Str(Box::new(inner))
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Node(node) => node.fmt(f),
            Expression::Regex(target, pattern) => {
                write!(f, "regex({target}, {})", Term::plain(pattern.as_str()))
            }
            Expression::Equal(l, r) => write!(f, "{l} = {r}"),
            Expression::NotEqual(l, r) => write!(f, "{l} != {r}"),
            Expression::GreaterThan(l, r) => write!(f, "{l} > {r}"),
            Expression::LessThan(l, r) => write!(f, "{l} < {r}"),
            Expression::Datatype(inner) => write!(f, "datatype({inner})"),
            Expression::IsIri(inner) => write!(f, "isIRI({inner})"),
            Expression::Str(inner) => write!(f, "str({inner})"),
        }
    }
}

/// One element of a group graph pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Fragment {
    Triple(Triple),
    Filter(Expression),
    Optional(Vec<Fragment>),
    NotExists(Vec<Fragment>),
}

impl Fragment {
    pub fn triple(
        subject: impl Into<Node>,
        predicate: impl Into<Predicate>,
        object: impl Into<Node>,
    ) -> Self {
        Fragment::Triple(Triple::new(subject, predicate, object))
    }

    /// Variables mentioned anywhere in this fragment, in first-seen order.
    pub fn variables(&self) -> Vec<Variable> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut Vec<Variable>) {
        fn push(node: &Node, out: &mut Vec<Variable>) {
            if let Node::Variable(v) = node {
                if !out.contains(v) {
                    out.push(v.clone());
                }
            }
        }
        fn walk_expr(expr: &Expression, out: &mut Vec<Variable>) {
            match expr {
                Expression::Node(node) => push(node, out),
                Expression::Regex(inner, _)
                | Expression::Datatype(inner)
                | Expression::IsIri(inner)
                | Expression::Str(inner) => walk_expr(inner, out),
                Expression::Equal(l, r)
                | Expression::NotEqual(l, r)
                | Expression::GreaterThan(l, r)
                | Expression::LessThan(l, r) => {
                    walk_expr(l, out);
                    walk_expr(r, out);
                }
            }
        }
        match self {
            Fragment::Triple(t) => {
                push(&t.subject, out);
                push(&t.object, out);
            }
            Fragment::Filter(expr) => walk_expr(expr, out),
            Fragment::Optional(group) | Fragment::NotExists(group) => {
                for fragment in group {
                    fragment.collect_variables(out);
                }
            }
        }
    }

    pub(crate) fn write_indented(&self, f: &mut impl fmt::Write, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        match self {
            Fragment::Triple(t) => writeln!(f, "{pad}{t}"),
            Fragment::Filter(expr) => writeln!(f, "{pad}FILTER({expr})"),
            Fragment::Optional(group) => {
                writeln!(f, "{pad}OPTIONAL {{")?;
                write_group(f, group, depth + 1)?;
                writeln!(f, "{pad}}}")
            }
            Fragment::NotExists(group) => {
                writeln!(f, "{pad}FILTER NOT EXISTS {{")?;
                write_group(f, group, depth + 1)?;
                writeln!(f, "{pad}}}")
            }
        }
    }
}

pub(crate) fn write_group(
    f: &mut impl fmt::Write,
    fragments: &[Fragment],
    depth: usize,
) -> fmt::Result {
    for fragment in fragments {
        fragment.write_indented(f, depth)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variables_are_collected_through_groups() {
        let a = Variable::new("a");
        let b = Variable::new("b");
        let fragment = Fragment::Optional(vec![
            Fragment::triple(&a, Term::prefixed("schema", "name"), &b),
            Fragment::Filter(Expression::equal(
                Expression::var(&b),
                Expression::term(Term::plain("x")),
            )),
        ]);
        assert_eq!(fragment.variables(), vec![a, b]);
    }

    #[test]
    fn filter_renders_comparison() {
        let v = Variable::new("0_Person__age");
        let expr = Expression::greater_than(
            Expression::var(&v),
            Expression::term(Term::typed("30", Term::xsd("integer"))),
        );
        assert_eq!(
            expr.to_string(),
            r#"?0_Person__age > "30"^^xsd:integer"#
        );
    }

    #[test]
    fn optional_group_is_indented() {
        let v = Variable::new("s");
        let mut out = String::new();
        Fragment::Optional(vec![Fragment::triple(
            &v,
            Term::prefixed("rdf", "type"),
            Term::prefixed("schema", "Person"),
        )])
        .write_indented(&mut out, 1)
        .unwrap();
        assert_eq!(
            out,
            "  OPTIONAL {\n    ?s rdf:type schema:Person .\n  }\n"
        );
    }
}
