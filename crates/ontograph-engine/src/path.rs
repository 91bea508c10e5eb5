//! Deterministic variable naming.
//!
//! Two families of names share one variable namespace per statement:
//!
//! - **condensation** names join segments with `__`
//!   (`0_Person__memberOf__0__name`); they never appear in results;
//! - **hydration** names join segments with a single `_`
//!   (`0_Person_memberOf_0_Organization_name_0_TextType_value`) and encode
//!   the position of every bound value in the requested tree.
//!
//! The root entity is always `0_<Class>` in both families, which is what
//! ties the filter pattern to the selection pattern.

use ontograph_schema::{is_class_name, Datatype};
use ontograph_sparql::Variable;

const LEAF: &str = "value";

/// Anchor variable of the root entity of the main context.
pub fn root_anchor(class: &str) -> Variable {
    Variable::new(format!("0_{class}"))
}

/// Anchor variable of an inline sub-context.
pub fn context_anchor(class: &str, context: u32) -> Variable {
    Variable::new(format!("{class}_{context}"))
}

/// Object of `property` on the entity at `anchor_path`.
///
/// At the root level the property hangs directly off the anchor; deeper
/// levels insert the sibling index.
pub fn condensed_object(anchor_path: &str, nested: bool, index: usize, property: &str) -> String {
    if nested {
        format!("{anchor_path}__{index}__{property}")
    } else {
        format!("{anchor_path}__{property}")
    }
}

/// Branch variable for an entity reached through `property`.
pub fn hydrated_entity(parent: &str, property: &str, branch: usize, class: &str) -> String {
    format!("{parent}_{property}_{branch}_{class}")
}

/// Branch variable for a datatype value reached through `property`.
pub fn hydrated_value(parent: &str, property: &str, branch: usize, datatype: Datatype) -> String {
    format!(
        "{parent}_{property}_{branch}_{}_{LEAF}",
        datatype.safe_name()
    )
}

// ============================================================================
// Parsing hydration names
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub property: String,
    pub branch: usize,
    pub type_name: String,
}

/// Structured form of a hydration variable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HydrationPath {
    pub root_class: String,
    pub steps: Vec<Step>,
    /// Ends in a datatype `value`.
    pub leaf: bool,
}

impl HydrationPath {
    /// `None` for anything that is not a hydration name.
    pub fn parse(name: &str) -> Option<Self> {
        let tokens: Vec<&str> = name.split('_').collect();
        if tokens.len() < 2 || tokens.iter().any(|t| t.is_empty()) {
            return None;
        }
        if tokens[0].parse::<usize>().is_err() || !is_class_name(tokens[1]) {
            return None;
        }
        let mut steps = Vec::new();
        let mut rest = &tokens[2..];
        let mut leaf = false;
        while !rest.is_empty() {
            let [property, branch, type_name, tail @ ..] = rest else {
                return None;
            };
            if is_class_name(property) || !is_class_name(type_name) {
                return None;
            }
            let branch = branch.parse::<usize>().ok()?;
            steps.push(Step {
                property: property.to_string(),
                branch,
                type_name: type_name.to_string(),
            });
            if Datatype::from_safe(type_name).is_some() {
                if tail != [LEAF] {
                    return None;
                }
                leaf = true;
                break;
            }
            rest = tail;
        }
        Some(Self {
            root_class: tokens[1].to_string(),
            steps,
            leaf,
        })
    }

    /// Variable names of the root and of every entity step, outermost
    /// first. A leaf path omits its final (value) step.
    pub fn entity_names(&self) -> Vec<String> {
        let mut names = vec![format!("0_{}", self.root_class)];
        let entity_steps = if self.leaf {
            &self.steps[..self.steps.len().saturating_sub(1)]
        } else {
            &self.steps[..]
        };
        for step in entity_steps {
            let parent = names.last().cloned().unwrap_or_default();
            names.push(hydrated_entity(
                &parent,
                &step.property,
                step.branch,
                &step.type_name,
            ));
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condensed_names_use_double_separator() {
        assert_eq!(condensed_object("0_Person", false, 0, "name"), "0_Person__name");
        assert_eq!(
            condensed_object("0_Person__memberOf", true, 0, "name"),
            "0_Person__memberOf__0__name"
        );
    }

    #[test]
    fn parses_leaf_paths() {
        let path = HydrationPath::parse("0_Person_memberOf_0_Organization_name_0_TextType_value").unwrap();
        assert_eq!(path.root_class, "Person");
        assert_eq!(path.steps.len(), 2);
        assert!(path.leaf);
        assert_eq!(
            path.entity_names(),
            vec!["0_Person", "0_Person_memberOf_0_Organization"]
        );
    }

    #[test]
    fn parses_entity_paths() {
        let path = HydrationPath::parse("0_Person_knows_1_Person").unwrap();
        assert!(!path.leaf);
        assert_eq!(path.steps[0].branch, 1);
        assert_eq!(path.entity_names(), vec!["0_Person", "0_Person_knows_1_Person"]);

        let root = HydrationPath::parse("0_Person").unwrap();
        assert!(root.steps.is_empty());
    }

    #[test]
    fn rejects_condensation_and_foreign_names() {
        assert!(HydrationPath::parse("0_Person__name").is_none());
        assert!(HydrationPath::parse("unbound_3").is_none());
        assert!(HydrationPath::parse("Person_1").is_none());
        assert!(HydrationPath::parse("0_Person_name_0_TextType").is_none());
        assert!(HydrationPath::parse("0_Person_name_0_TextType_value_extra").is_none());
    }

    #[test]
    fn built_names_parse_back() {
        let entity = hydrated_entity("0_Person", "memberOf", 0, "Organization");
        let value = hydrated_value(&entity, "name", 2, Datatype::Text);
        let parsed = HydrationPath::parse(&value).unwrap();
        assert_eq!(parsed.steps[1].branch, 2);
        assert_eq!(parsed.entity_names().last().unwrap(), &entity);
    }
}
