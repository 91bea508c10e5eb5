use super::{Described, OntologyGateway};
use crate::cache::{key, MetadataCache, KEY_NAMESPACE};
use crate::codec;
use crate::error::SchemaError;
use ontograph_sparql::{
    Expression, Fragment, Namespaces, Predicate, Row, Select, StoreClient, Term, Variable,
};
use std::sync::Arc;

/// Prefix of the vocabulary that carries `domainIncludes`, `rangeIncludes`,
/// `isPartOf` and `Enumeration`.
const VOCABULARY: &str = "schema";

/// Reads ontology metadata from the triple store itself.
///
/// Terms marked `schema:isPartOf <pending_address>` are excluded, and class
/// lookups skip enumeration members.
pub struct SparqlGateway {
    store: Arc<dyn StoreClient>,
    namespaces: Namespaces,
    pending_address: String,
    cache: Arc<MetadataCache>,
}

impl SparqlGateway {
    pub fn new(
        store: Arc<dyn StoreClient>,
        namespaces: Namespaces,
        pending_address: impl Into<String>,
    ) -> Self {
        Self {
            store,
            namespaces,
            pending_address: pending_address.into(),
            cache: Arc::new(MetadataCache::new()),
        }
    }

    /// Share namespace answers with an existing cache.
    pub fn with_cache(mut self, cache: Arc<MetadataCache>) -> Self {
        self.cache = cache;
        self
    }

    fn vocab(local: &str) -> Term {
        Term::prefixed(VOCABULARY, local)
    }

    fn rdf_type() -> Term {
        Term::prefixed("rdf", "type")
    }

    fn qualified(&self, local_name: &str) -> Result<Term, SchemaError> {
        let prefix = self.cached_namespace(local_name)?;
        Ok(Term::prefixed(prefix, local_name))
    }

    fn cached_namespace(&self, local_name: &str) -> Result<String, SchemaError> {
        self.cache
            .namespace(&key(KEY_NAMESPACE, local_name), || {
                self.lookup_namespace(local_name)
            })
            .map_err(|err| match err {
                SchemaError::CacheFailure { source, .. } => *source,
                other => other,
            })
    }

    fn not_pending(&self, subject: &Variable) -> Fragment {
        Fragment::NotExists(vec![Fragment::triple(
            subject,
            Self::vocab("isPartOf"),
            Term::iri(self.pending_address.as_str()),
        )])
    }

    fn not_pending_term(&self, subject: Term) -> Fragment {
        Fragment::NotExists(vec![Fragment::triple(
            subject,
            Self::vocab("isPartOf"),
            Term::iri(self.pending_address.as_str()),
        )])
    }

    fn comment(subject: impl Into<ontograph_sparql::Node>, comment: &Variable) -> Fragment {
        Fragment::Optional(vec![Fragment::triple(
            subject,
            Term::prefixed("rdfs", "comment"),
            comment,
        )])
    }

    fn not_enumeration(subject: impl Into<ontograph_sparql::Node>) -> Fragment {
        let enumerator = Variable::new("enumeratorClass");
        Fragment::NotExists(vec![
            Fragment::triple(subject, Self::rdf_type(), &enumerator),
            Fragment::triple(
                &enumerator,
                Predicate::ZeroOrMore(Term::prefixed("rdfs", "subClassOf")),
                Self::vocab("Enumeration"),
            ),
        ])
    }

    fn select(&self, select: Select) -> Result<Vec<Row>, SchemaError> {
        let rows = self.store.execute(&select.into())?;
        Ok(rows)
    }

    fn local_part(&self, term: &Term) -> Result<String, SchemaError> {
        let raw = term.raw_value();
        self.namespaces
            .user_bindings()
            .find_map(|(_, iri)| raw.strip_prefix(iri).map(str::to_string))
            .ok_or(SchemaError::UnknownNamespace(raw))
    }

    fn described(&self, rows: Vec<Row>, name_var: &str) -> Result<Vec<Described>, SchemaError> {
        let mut out: Vec<Described> = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(term) = row.get(name_var) else {
                continue;
            };
            let name = self.local_part(term)?;
            let description = comment_of(&row);
            match out.iter_mut().find(|d| d.name == name) {
                Some(existing) if existing.description.is_empty() => {
                    existing.description = description
                }
                Some(_) => {}
                None => out.push(Described::new(name, description)),
            }
        }
        Ok(out)
    }

    fn lookup_namespace(&self, local_name: &str) -> Result<String, SchemaError> {
        let type_var = Variable::new("type");
        let mut variables = Vec::new();
        let mut conditions = Vec::new();
        for (prefix, iri) in self.namespaces.user_bindings() {
            let variable = Variable::new(prefix);
            conditions.push(Fragment::Optional(vec![
                Fragment::triple(&variable, Self::rdf_type(), &type_var),
                Fragment::Filter(Expression::equal(
                    Expression::str(Expression::var(&variable)),
                    Expression::term(Term::plain(format!("{iri}{local_name}"))),
                )),
            ]));
            variables.push(variable);
        }
        let rows = self.select(Select::new(variables.clone()).filter_by(conditions))?;
        rows.iter()
            .find_map(|row| {
                variables
                    .iter()
                    .find(|v| row.contains_key(v.name()))
                    .map(|v| v.name().to_string())
            })
            .ok_or_else(|| SchemaError::UnknownNamespace(local_name.to_string()))
    }
}

fn comment_of(row: &Row) -> String {
    row.get("comment")
        .map(|term| codec::decode(&term.raw_value()))
        .unwrap_or_default()
}

impl OntologyGateway for SparqlGateway {
    fn class_description(&self, name: &str) -> Result<Option<String>, SchemaError> {
        let class = self.qualified(name)?;
        let comment = Variable::new("comment");
        let select = Select::new(vec![comment.clone()]).filter_by([
            Fragment::triple(class.clone(), Self::rdf_type(), Term::prefixed("rdfs", "Class")),
            self.not_pending_term(class.clone()),
            Self::not_enumeration(class.clone()),
            Self::comment(class, &comment),
        ]);
        let rows = self.select(select)?;
        let description = rows
            .iter()
            .map(comment_of)
            .find(|c| !c.is_empty())
            .unwrap_or_default();
        Ok((!rows.is_empty()).then_some(description))
    }

    fn class_list(&self) -> Result<Vec<Described>, SchemaError> {
        let class = Variable::new("class");
        let comment = Variable::new("comment");
        let select = Select::new(vec![class.clone(), comment.clone()])
            .filter_by([
                Fragment::triple(&class, Self::rdf_type(), Term::prefixed("rdfs", "Class")),
                self.not_pending(&class),
                Self::not_enumeration(&class),
                Self::comment(&class, &comment),
            ])
            .order_by(class.clone());
        let rows = self.select(select)?;
        self.described(rows, class.name())
    }

    fn properties_of(&self, class: &str) -> Result<Vec<Described>, SchemaError> {
        let class_term = self.qualified(class)?;
        let property = Variable::new("property");
        let classes = Variable::new("classes");
        let comment = Variable::new("comment");
        let select = Select::new(vec![property.clone(), comment.clone()]).filter_by([
            Fragment::triple(
                class_term,
                Predicate::ZeroOrMore(Term::prefixed("rdfs", "subClassOf")),
                &classes,
            ),
            Fragment::triple(
                &classes,
                Predicate::Inverse(Self::vocab("domainIncludes")),
                &property,
            ),
            Self::comment(&property, &comment),
            self.not_pending(&property),
        ]);
        let rows = self.select(select)?;
        self.described(rows, property.name())
    }

    fn ranges_of(&self, property: &str) -> Result<Vec<Described>, SchemaError> {
        let property_term = self.qualified(property)?;
        let class = Variable::new("class");
        let comment = Variable::new("comment");
        let select = Select::new(vec![class.clone(), comment.clone()]).filter_by([
            Fragment::triple(property_term, Self::vocab("rangeIncludes"), &class),
            Fragment::triple(&class, Self::rdf_type(), Term::prefixed("rdfs", "Class")),
            Self::comment(&class, &comment),
            self.not_pending(&class),
        ]);
        let rows = self.select(select)?;
        let mut ranges = self.described(rows, class.name())?;
        ranges.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(ranges)
    }

    fn namespace_for(&self, local_name: &str) -> Result<String, SchemaError> {
        self.cached_namespace(local_name)
    }
}
