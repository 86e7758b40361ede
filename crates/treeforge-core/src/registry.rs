//! Node template registry - the built-in catalog and catalog mutations.
//!
//! The functions here validate and apply a change to a catalog map; the
//! engine wraps them with history and timestamps.

use std::collections::BTreeMap;

use crate::error::Rejection;
use crate::model::{NodeCategory, NodeTemplate, Properties, PropertyValue, TemplateUpdate};

/// Template catalog keyed by template name.
pub type Catalog = BTreeMap<String, NodeTemplate>;

/// Key of the built-in root template.
pub const ROOT_TEMPLATE: &str = "root";

fn builtin(
    name: &str,
    title: &str,
    category: NodeCategory,
    description: &str,
    properties: &[(&str, i64)],
) -> NodeTemplate {
    let properties: Properties = properties
        .iter()
        .map(|(k, v)| (k.to_string(), PropertyValue::from(*v)))
        .collect();
    NodeTemplate {
        is_default: true,
        ..NodeTemplate::new(name, category)
            .with_title(title)
            .with_description(description)
            .with_properties(properties)
    }
}

/// The built-in templates every project starts with.
pub fn builtin_templates() -> Vec<NodeTemplate> {
    use NodeCategory::*;
    vec![
        builtin(
            "sequence",
            "Sequence",
            Composite,
            "Executes children in sequence until one fails",
            &[],
        ),
        builtin(
            "selector",
            "Selector",
            Composite,
            "Executes children in sequence until one succeeds",
            &[],
        ),
        builtin(
            "priority",
            "Priority",
            Composite,
            "Executes children in priority order",
            &[],
        ),
        builtin(
            "inverter",
            "Inverter",
            Decorator,
            "Inverts the result of the child",
            &[],
        ),
        builtin(
            "repeater",
            "Repeater",
            Decorator,
            "Repeats the child a specified number of times",
            &[("maxLoop", 1)],
        ),
        builtin(
            "wait",
            "Wait",
            Action,
            "Waits for a specified time",
            &[("milliseconds", 1000)],
        ),
        builtin("succeeder", "Succeeder", Action, "Always returns success", &[]),
        builtin("failer", "Failer", Action, "Always returns failure", &[]),
        builtin("condition", "Condition", Condition, "Base condition node", &[]),
        builtin(
            ROOT_TEMPLATE,
            "Root",
            Root,
            "Root node for the behavior tree",
            &[],
        ),
    ]
}

/// A fresh catalog holding only the built-ins.
pub fn builtin_catalog() -> Catalog {
    builtin_templates()
        .into_iter()
        .map(|t| (t.name.clone(), t))
        .collect()
}

/// Re-insert built-ins missing from `catalog`. Existing entries win.
pub fn merge_builtins(catalog: &mut Catalog) {
    for template in builtin_templates() {
        catalog.entry(template.name.clone()).or_insert(template);
    }
}

/// Check that `template` can be added under its own key.
pub fn check_create(catalog: &Catalog, template: &NodeTemplate) -> Result<(), Rejection> {
    if catalog.contains_key(&template.name) {
        return Err(Rejection::TemplateExists(template.name.clone()));
    }
    Ok(())
}

/// Add a user template. The stored copy always has `is_default = false`.
pub fn create(catalog: &mut Catalog, template: NodeTemplate) -> Result<(), Rejection> {
    check_create(catalog, &template)?;
    let template = NodeTemplate {
        is_default: false,
        ..template
    };
    catalog.insert(template.name.clone(), template);
    Ok(())
}

/// Merge `update` into the template named `name`.
pub fn update(catalog: &mut Catalog, name: &str, update: TemplateUpdate) -> Result<(), Rejection> {
    let template = catalog
        .get_mut(name)
        .ok_or_else(|| Rejection::TemplateNotFound(name.to_string()))?;
    update.apply(template);
    Ok(())
}

pub fn check_delete(catalog: &Catalog, name: &str) -> Result<(), Rejection> {
    match catalog.get(name) {
        None => Err(Rejection::TemplateNotFound(name.to_string())),
        Some(t) if t.is_default => Err(Rejection::BuiltinTemplate(name.to_string())),
        Some(_) => Ok(()),
    }
}

/// Remove a user template. Blocks already built from it keep their copies.
pub fn delete(catalog: &mut Catalog, name: &str) -> Result<NodeTemplate, Rejection> {
    check_delete(catalog, name)?;
    catalog
        .remove(name)
        .ok_or_else(|| Rejection::TemplateNotFound(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_has_ten_default_templates() {
        let catalog = builtin_catalog();
        assert_eq!(catalog.len(), 10);
        assert!(catalog.values().all(|t| t.is_default));
        assert_eq!(catalog["root"].category, NodeCategory::Root);
        assert_eq!(catalog["repeater"].properties["maxLoop"].as_f64(), Some(1.0));
        assert_eq!(catalog["wait"].properties["milliseconds"].as_f64(), Some(1000.0));
        assert_eq!(catalog["sequence"].display_name(), "Sequence");
    }

    #[test]
    fn create_forces_user_flag_and_refuses_duplicates() {
        let mut catalog = builtin_catalog();
        let mut template = NodeTemplate::new("patrol", NodeCategory::Action);
        template.is_default = true;
        create(&mut catalog, template).unwrap();
        assert!(!catalog["patrol"].is_default);

        let again = create(&mut catalog, NodeTemplate::new("patrol", NodeCategory::Condition));
        assert_eq!(again, Err(Rejection::TemplateExists("patrol".into())));
        assert_eq!(catalog["patrol"].category, NodeCategory::Action);
    }

    #[test]
    fn builtins_can_not_be_deleted() {
        let mut catalog = builtin_catalog();
        assert_eq!(
            delete(&mut catalog, "sequence"),
            Err(Rejection::BuiltinTemplate("sequence".into()))
        );
        assert_eq!(
            delete(&mut catalog, "missing"),
            Err(Rejection::TemplateNotFound("missing".into()))
        );
        assert!(catalog.contains_key("sequence"));
    }

    #[test]
    fn merge_builtins_keeps_existing_entries() {
        let mut catalog = Catalog::new();
        let custom = NodeTemplate::new("wait", NodeCategory::Condition);
        catalog.insert("wait".into(), custom.clone());
        merge_builtins(&mut catalog);
        assert_eq!(catalog.len(), 10);
        assert_eq!(catalog["wait"], custom);
    }
}
