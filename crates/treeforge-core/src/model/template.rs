//! Node templates - the catalog blocks are instantiated from.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::property::Properties;

/// Behavior tree node category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    Composite,
    Decorator,
    /// Documents that omit a category load as actions.
    #[default]
    Action,
    Condition,
    Root,
}

impl NodeCategory {
    pub const ALL: [NodeCategory; 5] = [
        NodeCategory::Composite,
        NodeCategory::Decorator,
        NodeCategory::Action,
        NodeCategory::Condition,
        NodeCategory::Root,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeCategory::Composite => "composite",
            NodeCategory::Decorator => "decorator",
            NodeCategory::Action => "action",
            NodeCategory::Condition => "condition",
            NodeCategory::Root => "root",
        }
    }
}

impl fmt::Display for NodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "composite" => Ok(NodeCategory::Composite),
            "decorator" => Ok(NodeCategory::Decorator),
            "action" => Ok(NodeCategory::Action),
            "condition" => Ok(NodeCategory::Condition),
            "root" => Ok(NodeCategory::Root),
            other => Err(format!("Unknown node category: {}", other)),
        }
    }
}

/// A named, reusable node definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTemplate {
    /// Catalog key
    pub name: String,

    /// Display title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub category: NodeCategory,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Default property bag copied into new blocks
    #[serde(default)]
    pub properties: Properties,

    /// Built-in templates can not be deleted
    #[serde(default)]
    pub is_default: bool,
}

impl NodeTemplate {
    /// A user template with no title, description or properties.
    pub fn new(name: impl Into<String>, category: NodeCategory) -> Self {
        Self {
            name: name.into(),
            title: None,
            category,
            description: None,
            properties: Properties::new(),
            is_default: false,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// Title if set, otherwise the key.
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

/// Partial update for a template. The key and `is_default` are not updatable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateUpdate {
    pub title: Option<String>,
    pub category: Option<NodeCategory>,
    pub description: Option<String>,
    pub properties: Option<Properties>,
}

impl TemplateUpdate {
    pub(crate) fn apply(self, template: &mut NodeTemplate) {
        if let Some(title) = self.title {
            template.title = Some(title);
        }
        if let Some(category) = self.category {
            template.category = category;
        }
        if let Some(description) = self.description {
            template.description = Some(description);
        }
        if let Some(properties) = self.properties {
            template.properties = properties;
        }
    }
}
