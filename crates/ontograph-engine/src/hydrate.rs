//! Hydration: the selection set of a root field as optional graph patterns.
//!
//! Every requested value gets a variable whose name encodes where it sits
//! in the selection (see [`crate::path`]); every branch is optional so that
//! missing data leaves holes instead of dropping rows.

use crate::error::EngineError;
use crate::path;
use crate::request::{Selection, TYPENAME};
use indexmap::IndexSet;
use ontograph_schema::naming::union_name;
use ontograph_schema::{is_class_name, unsafe_name, Datatype, ObjectType, TypeRegistry};
use ontograph_sparql::{Expression, Fragment, Term, Triple, Variable};
use std::sync::Arc;

/// Fragments and projection for one root field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hydration {
    pub fragments: Vec<Fragment>,
    pub variables: Vec<Variable>,
}

pub struct Hydrator<'r> {
    registry: &'r TypeRegistry,
    max_depth: usize,
    variables: IndexSet<Variable>,
}

impl<'r> Hydrator<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            max_depth: registry.max_depth(),
            variables: IndexSet::new(),
        }
    }

    /// Hydrate the selections of root field `class`.
    pub fn hydrate(mut self, class: &str, selections: &[Selection]) -> Result<Hydration, EngineError> {
        let anchor = path::root_anchor(class);
        self.variables.insert(anchor.clone());
        let object = self.object_type(class)?;
        let fragments = self.entity(&anchor, &object, selections, 0)?;
        Ok(Hydration {
            fragments,
            variables: self.variables.into_iter().collect(),
        })
    }

    fn object_type(&self, name: &str) -> Result<Arc<ObjectType>, EngineError> {
        self.registry
            .type_for(name)?
            .as_object()
            .cloned()
            .ok_or_else(|| EngineError::InvalidType(name.to_string()))
    }

    fn entity(
        &mut self,
        anchor: &Variable,
        object: &ObjectType,
        selections: &[Selection],
        depth: usize,
    ) -> Result<Vec<Fragment>, EngineError> {
        if depth > self.max_depth {
            return Err(EngineError::InvalidPath(anchor.name().to_string()));
        }
        let mut fragments = Vec::new();
        for selection in selections {
            match selection {
                Selection::Field { name, .. } if name == TYPENAME => {}
                Selection::Field {
                    name, selections, ..
                } => {
                    if !object.fields.contains_key(name) {
                        return Err(EngineError::InvalidType(format!(
                            "`{name}` is not a field of {}",
                            object.name
                        )));
                    }
                    fragments.extend(self.property(anchor, name, selections, depth)?);
                }
                // `... on Person` directly under a Person
                Selection::InlineFragment {
                    type_condition,
                    selections,
                } if *type_condition == object.name => {
                    fragments.extend(self.entity(anchor, object, selections, depth)?);
                }
                Selection::InlineFragment { type_condition, .. } => {
                    return Err(EngineError::InvalidType(format!(
                        "{type_condition} does not apply to {}",
                        object.name
                    )));
                }
            }
        }
        Ok(fragments)
    }

    fn property(
        &mut self,
        anchor: &Variable,
        property: &str,
        branches: &[Selection],
        depth: usize,
    ) -> Result<Vec<Fragment>, EngineError> {
        let prefix = self.registry.namespace_for(property)?;
        let predicate = Term::prefixed(prefix, property);
        let union_type = self.registry.type_for(&union_name(property))?;
        let union = union_type
            .as_union()
            .ok_or_else(|| EngineError::InvalidType(union_name(property)))?;

        let mut fragments = Vec::new();
        for (branch, selection) in branches.iter().enumerate() {
            let (type_condition, selections) = match selection {
                Selection::Field { name, .. } if name == TYPENAME => continue,
                Selection::InlineFragment {
                    type_condition,
                    selections,
                } => (type_condition, selections),
                Selection::Field { name, .. } => {
                    return Err(EngineError::InvalidType(format!(
                        "`{name}` must be selected through a fragment on a member of {}",
                        union.name
                    )));
                }
            };
            let member = self.registry.resolve_member(union, type_condition)?;
            let group = match Datatype::from_name(type_condition) {
                Some(datatype) => self.value_branch(anchor, &predicate, property, branch, datatype),
                None => {
                    let class = unsafe_name(type_condition);
                    if !is_class_name(&class) {
                        return Err(EngineError::InvalidType(type_condition.clone()));
                    }
                    self.entity_branch(anchor, &predicate, property, branch, &member, selections, depth)?
                }
            };
            fragments.push(Fragment::Optional(group));
        }
        Ok(fragments)
    }

    fn value_branch(
        &mut self,
        anchor: &Variable,
        predicate: &Term,
        property: &str,
        branch: usize,
        datatype: Datatype,
    ) -> Vec<Fragment> {
        let value = Variable::new(path::hydrated_value(anchor.name(), property, branch, datatype));
        self.variables.insert(value.clone());
        let guard = match datatype.xsd_local() {
            Some(local) => Expression::equal(
                Expression::datatype(Expression::var(&value)),
                Expression::term(Term::xsd(local)),
            ),
            None => Expression::is_iri(Expression::var(&value)),
        };
        vec![
            Fragment::Triple(Triple::new(anchor, predicate.clone(), &value)),
            Fragment::Filter(guard),
        ]
    }

    #[allow(clippy::too_many_arguments)]
    fn entity_branch(
        &mut self,
        anchor: &Variable,
        predicate: &Term,
        property: &str,
        branch: usize,
        member: &ObjectType,
        selections: &[Selection],
        depth: usize,
    ) -> Result<Vec<Fragment>, EngineError> {
        let entity = Variable::new(path::hydrated_entity(
            anchor.name(),
            property,
            branch,
            &member.name,
        ));
        self.variables.insert(entity.clone());
        let prefix = self.registry.namespace_for(&member.name)?;
        let mut group = vec![
            Fragment::Triple(Triple::new(anchor, predicate.clone(), &entity)),
            Fragment::triple(
                &entity,
                Term::prefixed("rdf", "type"),
                Term::prefixed(prefix, member.name.clone()),
            ),
        ];
        group.extend(self.entity(&entity, member, selections, depth + 1)?);
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::fixtures::registry;
    use ontograph_sparql::{Namespaces, Select, Statement};

    fn name_selection() -> Selection {
        Selection::field("name").with_selections(vec![Selection::on(
            "TextType",
            vec![Selection::field("value")],
        )])
    }

    fn body(hydration: &Hydration) -> String {
        let select = Select::new(hydration.variables.clone()).filter_by(hydration.fragments.clone());
        Statement::from(select)
            .to_sparql(&Namespaces::new())
            .lines()
            .filter(|line| !line.starts_with("PREFIX"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn scalar_branches_are_optional_and_type_guarded() {
        let registry = registry();
        let hydration = Hydrator::new(&registry)
            .hydrate("Person", &[name_selection()])
            .unwrap();
        assert_eq!(
            body(&hydration),
            [
                "SELECT ?0_Person ?0_Person_name_0_TextType_value WHERE {",
                "  OPTIONAL {",
                "    ?0_Person schema:name ?0_Person_name_0_TextType_value .",
                "    FILTER(datatype(?0_Person_name_0_TextType_value) = xsd:string)",
                "  }",
                "}",
            ]
            .join("\n")
        );
    }

    #[test]
    fn entity_branches_nest() {
        let registry = registry();
        let selection = Selection::field("memberOf").with_selections(vec![Selection::on(
            "Organization",
            vec![name_selection()],
        )]);
        let hydration = Hydrator::new(&registry).hydrate("Person", &[selection]).unwrap();
        let names: Vec<&str> = hydration.variables.iter().map(Variable::name).collect();
        assert_eq!(
            names,
            vec![
                "0_Person",
                "0_Person_memberOf_0_Organization",
                "0_Person_memberOf_0_Organization_name_0_TextType_value",
            ]
        );
        let Fragment::Optional(group) = &hydration.fragments[0] else {
            panic!("expected an optional group");
        };
        assert_eq!(
            group[1].to_owned(),
            Fragment::triple(
                &Variable::new("0_Person_memberOf_0_Organization"),
                Term::prefixed("rdf", "type"),
                Term::prefixed("schema", "Organization"),
            )
        );
        assert!(matches!(group[2], Fragment::Optional(_)));
    }

    #[test]
    fn urls_are_guarded_as_iris() {
        let registry = registry();
        let selection = Selection::field("url").with_selections(vec![Selection::on(
            "URLType",
            vec![Selection::field("value")],
        )]);
        let hydration = Hydrator::new(&registry).hydrate("Person", &[selection]).unwrap();
        assert!(body(&hydration).contains("FILTER(isIRI(?0_Person_url_0_URLType_value))"));
    }

    #[test]
    fn branch_index_follows_fragment_position() {
        let registry = registry();
        let selection = Selection::field("knows").with_selections(vec![
            Selection::field(TYPENAME),
            Selection::on("Person", vec![Selection::field(TYPENAME)]),
        ]);
        let hydration = Hydrator::new(&registry).hydrate("Person", &[selection]).unwrap();
        assert_eq!(hydration.variables[1].name(), "0_Person_knows_1_Person");
    }

    #[test]
    fn repeated_selections_project_once() {
        let registry = registry();
        let hydration = Hydrator::new(&registry)
            .hydrate("Person", &[name_selection(), name_selection()])
            .unwrap();
        assert_eq!(hydration.variables.len(), 2);
        assert_eq!(hydration.fragments.len(), 2);
    }

    #[test]
    fn fields_must_go_through_fragments() {
        let registry = registry();
        let selection = Selection::field("name").with_selections(vec![Selection::field("value")]);
        let err = Hydrator::new(&registry).hydrate("Person", &[selection]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidType);
    }

    #[test]
    fn fragments_must_name_a_range_member() {
        let registry = registry();
        let selection = Selection::field("name").with_selections(vec![Selection::on(
            "IntegerType",
            vec![Selection::field("value")],
        )]);
        let err = Hydrator::new(&registry).hydrate("Person", &[selection]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidType);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let registry = registry();
        let err = Hydrator::new(&registry)
            .hydrate("Person", &[Selection::field("shoeSize")])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidType);
    }

    #[test]
    fn hydration_depth_is_bounded() {
        let registry = registry().with_max_depth(1);
        let knows = |inner: Vec<Selection>| {
            Selection::field("knows").with_selections(vec![Selection::on("Person", inner)])
        };
        let selection = knows(vec![knows(vec![knows(vec![])])]);
        let err = Hydrator::new(&registry).hydrate("Person", &[selection]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPath);
    }
}
