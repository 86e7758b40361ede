//! Project - the aggregate root.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::template::NodeTemplate;
use super::tree::Tree;

/// A saved document: trees plus the node-template catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub trees: BTreeMap<String, Tree>,

    /// Template catalog keyed by template name
    pub nodes: BTreeMap<String, NodeTemplate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_tree_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn tree(&self, id: &str) -> Option<&Tree> {
        self.trees.get(id)
    }

    pub fn template(&self, name: &str) -> Option<&NodeTemplate> {
        self.nodes.get(name)
    }

    /// The selected tree. A selection naming a missing tree reads as none.
    pub fn selected_tree(&self) -> Option<&Tree> {
        self.selected_tree_id
            .as_deref()
            .and_then(|id| self.trees.get(id))
    }

    /// Templates that are not built in.
    pub fn custom_templates(&self) -> impl Iterator<Item = &NodeTemplate> {
        self.nodes.values().filter(|n| !n.is_default)
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
