//! Read and write statements and their textual rendering.

use crate::namespaces::Namespaces;
use crate::pattern::{write_group, Fragment, Triple};
use crate::term::{Node, Variable};
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Select {
    pub distinct: bool,
    pub variables: Vec<Variable>,
    pub conditions: Vec<Fragment>,
    pub order_by: Vec<Variable>,
}

impl Select {
    pub fn new(variables: Vec<Variable>) -> Self {
        Self {
            variables,
            ..Self::default()
        }
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn filter_by(mut self, conditions: impl IntoIterator<Item = Fragment>) -> Self {
        self.conditions.extend(conditions);
        self
    }

    pub fn order_by(mut self, variable: Variable) -> Self {
        self.order_by.push(variable);
        self
    }
}

/// Data-modifying statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    Insert {
        triples: Vec<Triple>,
        conditions: Vec<Fragment>,
    },
    Delete {
        triples: Vec<Triple>,
        conditions: Vec<Fragment>,
    },
    /// Delete-then-insert sharing one where-clause.
    Replace {
        delete: Vec<Triple>,
        insert: Vec<Triple>,
        conditions: Vec<Fragment>,
    },
}

impl Write {
    pub fn conditions(&self) -> &[Fragment] {
        match self {
            Write::Insert { conditions, .. }
            | Write::Delete { conditions, .. }
            | Write::Replace { conditions, .. } => conditions,
        }
    }

    /// Prepend `context` to this statement's where-clause.
    pub fn scoped_by(mut self, context: &[Fragment]) -> Self {
        let conditions = match &mut self {
            Write::Insert { conditions, .. }
            | Write::Delete { conditions, .. }
            | Write::Replace { conditions, .. } => conditions,
        };
        let mut merged = context.to_vec();
        merged.append(conditions);
        *conditions = merged;
        self
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Write::Insert { .. } => "insert",
            Write::Delete { .. } => "delete",
            Write::Replace { .. } => "replace",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Select(Select),
    Write(Write),
}

impl From<Select> for Statement {
    fn from(select: Select) -> Self {
        Statement::Select(select)
    }
}

impl From<Write> for Statement {
    fn from(write: Write) -> Self {
        Statement::Write(write)
    }
}

impl Statement {
    pub fn is_read(&self) -> bool {
        matches!(self, Statement::Select(_))
    }

    pub fn conditions(&self) -> &[Fragment] {
        match self {
            Statement::Select(select) => &select.conditions,
            Statement::Write(write) => write.conditions(),
        }
    }

    /// Render with the namespace prologue.
    pub fn to_sparql(&self, namespaces: &Namespaces) -> String {
        let mut out = namespaces.prologue();
        // Writing into a String cannot fail.
        let _ = match self {
            Statement::Select(select) => render_select(&mut out, select),
            Statement::Write(write) => render_write(&mut out, write),
        };
        out
    }
}

fn render_select(out: &mut String, select: &Select) -> std::fmt::Result {
    out.push_str("SELECT ");
    if select.distinct {
        out.push_str("DISTINCT ");
    }
    if select.variables.is_empty() {
        out.push('*');
    } else {
        let names: Vec<String> = select.variables.iter().map(|v| v.to_string()).collect();
        out.push_str(&names.join(" "));
    }
    out.push_str(" WHERE {\n");
    write_group(out, &select.conditions, 1)?;
    out.push('}');
    if !select.order_by.is_empty() {
        let names: Vec<String> = select.order_by.iter().map(|v| v.to_string()).collect();
        write!(out, "\nORDER BY {}", names.join(" "))?;
    }
    Ok(())
}

fn render_write(out: &mut String, write: &Write) -> std::fmt::Result {
    match write {
        Write::Insert {
            triples,
            conditions,
        } => {
            if conditions.is_empty() && is_ground(triples) {
                out.push_str("INSERT DATA {\n");
                write_triples(out, triples)?;
                out.push('}');
            } else {
                out.push_str("INSERT {\n");
                write_triples(out, triples)?;
                out.push_str("} WHERE {\n");
                write_group(out, conditions, 1)?;
                out.push('}');
            }
        }
        Write::Delete {
            triples,
            conditions,
        } => {
            if conditions.is_empty() {
                let head = if is_ground(triples) {
                    "DELETE DATA {\n"
                } else {
                    "DELETE WHERE {\n"
                };
                out.push_str(head);
                write_triples(out, triples)?;
                out.push('}');
            } else {
                out.push_str("DELETE {\n");
                write_triples(out, triples)?;
                out.push_str("} WHERE {\n");
                write_group(out, conditions, 1)?;
                out.push('}');
            }
        }
        Write::Replace {
            delete,
            insert,
            conditions,
        } => {
            out.push_str("DELETE {\n");
            write_triples(out, delete)?;
            out.push_str("} INSERT {\n");
            write_triples(out, insert)?;
            out.push_str("} WHERE {\n");
            write_group(out, conditions, 1)?;
            out.push('}');
        }
    }
    Ok(())
}

fn write_triples(out: &mut String, triples: &[Triple]) -> std::fmt::Result {
    for triple in triples {
        writeln!(out, "  {triple}")?;
    }
    Ok(())
}

fn is_ground(triples: &[Triple]) -> bool {
    triples
        .iter()
        .all(|t| !matches!(t.subject, Node::Variable(_)) && !matches!(t.object, Node::Variable(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Expression;
    use crate::term::Term;

    fn body(statement: &Statement) -> String {
        let rendered = statement.to_sparql(&Namespaces::new());
        rendered
            .lines()
            .filter(|l| !l.starts_with("PREFIX"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn select_renders_projection_and_order() {
        let s = Variable::new("0_Person");
        let select = Select::new(vec![s.clone()])
            .distinct()
            .filter_by([Fragment::triple(
                &s,
                Term::prefixed("rdf", "type"),
                Term::prefixed("schema", "Person"),
            )])
            .order_by(s.clone());
        assert_eq!(
            body(&select.into()),
            "SELECT DISTINCT ?0_Person WHERE {\n  ?0_Person rdf:type schema:Person .\n}\nORDER BY ?0_Person"
        );
    }

    #[test]
    fn ground_insert_uses_data_form() {
        let write = Write::Insert {
            triples: vec![Triple::new(
                Term::iri("urn:uuid:1"),
                Term::prefixed("schema", "name"),
                Term::plain("Ada"),
            )],
            conditions: vec![],
        };
        assert_eq!(
            body(&write.into()),
            "INSERT DATA {\n  <urn:uuid:1> schema:name \"Ada\" .\n}"
        );
    }

    #[test]
    fn unconditioned_delete_with_variables_uses_where_form() {
        let o = Variable::new("unbound_0");
        let write = Write::Delete {
            triples: vec![Triple::new(
                Term::iri("urn:uuid:1"),
                Term::prefixed("schema", "knows"),
                &o,
            )],
            conditions: vec![],
        };
        assert!(body(&write.into()).starts_with("DELETE WHERE {"));
    }

    #[test]
    fn replace_shares_where_clause() {
        let s = Variable::new("0_Person");
        let old = Variable::new("unbound_0");
        let write = Write::Replace {
            delete: vec![Triple::new(&s, Term::prefixed("schema", "name"), &old)],
            insert: vec![Triple::new(&s, Term::prefixed("schema", "name"), Term::plain("B"))],
            conditions: vec![Fragment::triple(&s, Term::prefixed("schema", "name"), &old)],
        };
        let text = body(&write.into());
        assert!(text.starts_with("DELETE {"));
        assert!(text.contains("} INSERT {"));
        assert!(text.contains("} WHERE {"));
    }

    #[test]
    fn scoping_prepends_context() {
        let s = Variable::new("0_Person");
        let context = vec![Fragment::Filter(Expression::is_iri(Expression::var(&s)))];
        let write = Write::Insert {
            triples: vec![],
            conditions: vec![Fragment::triple(&s, Term::prefixed("schema", "name"), Term::plain("x"))],
        }
        .scoped_by(&context);
        assert_eq!(write.conditions().len(), 2);
        assert_eq!(write.conditions()[0], context[0]);
    }
}
