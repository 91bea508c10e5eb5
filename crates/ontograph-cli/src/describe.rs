//! `ontograph describe`: the registry's view of one type, as JSON.

use anyhow::{anyhow, Result};
use ontograph_schema::registry::{ROOT_MUTATION, ROOT_QUERY};
use ontograph_schema::{ObjectKind, OutputType, ShapeKey, TypeRegistry};
use serde_json::{json, Value};

/// Describe `name`: a root type, a class or datatype wrapper, or a
/// property union. With `shapes`, a class also lists every argument shape
/// reachable from its query and mutation arguments.
pub fn describe(registry: &TypeRegistry, name: &str, shapes: bool) -> Result<Value> {
    match name {
        ROOT_QUERY => return Ok(serde_json::to_value(registry.root_query()?)?),
        ROOT_MUTATION => return Ok(serde_json::to_value(registry.root_mutation()?)?),
        _ => {}
    }

    match registry.type_for(name)? {
        OutputType::Object(object) => {
            let definition = serde_json::to_value(object.as_ref())?;
            if !shapes || object.kind != ObjectKind::Class {
                return Ok(definition);
            }
            let description = object.description.clone().unwrap_or_default();
            let query = registry.argument_shape_closure(&ShapeKey::Query(object.name.clone()), &description)?;
            let mutation =
                registry.argument_shape_closure(&ShapeKey::Mutation(object.name.clone()), &description)?;
            Ok(json!({
                "type": definition,
                "shapes": {
                    "query": query.iter().map(|s| s.as_ref()).collect::<Vec<_>>(),
                    "mutation": mutation.iter().map(|s| s.as_ref()).collect::<Vec<_>>(),
                }
            }))
        }
        OutputType::Union(union) => {
            let members: Vec<String> = registry
                .union_members(&union)?
                .iter()
                .map(|member| member.name().to_string())
                .collect();
            if members.is_empty() {
                return Err(anyhow!("union {} has no members", union.name));
            }
            Ok(json!({
                "name": union.name,
                "property": union.property,
                "members": members,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ontograph_schema::InMemoryOntology;

    fn registry() -> TypeRegistry {
        TypeRegistry::new(
            InMemoryOntology::new("schema")
                .class("Thing", "Anything", &[])
                .class("Person", "A person", &["Thing"])
                .property("name", "The name", &["Thing"], &["Text"])
                .property("knows", "Acquaintance", &["Person"], &["Person"]),
        )
    }

    #[test]
    fn classes_list_their_properties() {
        let value = describe(&registry(), "Person", false).unwrap();
        assert_eq!(value["name"], "Person");
        assert_eq!(value["kind"], "class");
        assert!(value["fields"].get("knows").is_some());
        assert!(value["fields"].get("name").is_some());
    }

    #[test]
    fn unions_list_their_members() {
        let value = describe(&registry(), "knowsUnion", false).unwrap();
        assert_eq!(value["property"], "knows");
        assert_eq!(value["members"], json!(["Person"]));
    }

    #[test]
    fn root_query_has_a_field_per_class() {
        let value = describe(&registry(), "Query", false).unwrap();
        let names: Vec<&str> = value["fields"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|field| field["name"].as_str())
            .collect();
        assert!(names.contains(&"Person"));
        assert!(names.contains(&"Thing"));
    }

    #[test]
    fn shapes_start_with_the_class_input() {
        let value = describe(&registry(), "Person", true).unwrap();
        assert_eq!(value["type"]["name"], "Person");
        assert_eq!(value["shapes"]["query"][0]["name"], "PersonInput");
        assert_eq!(value["shapes"]["mutation"][0]["name"], "PersonMutationInput");
    }

    #[test]
    fn unknown_names_fail() {
        assert!(describe(&registry(), "Nonexistent", false).is_err());
    }
}
