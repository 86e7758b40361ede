//! Interchange document shapes. Field names are part of the file format.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{NodeCategory, Position, Properties, Viewport};

/// Format version written into every document.
pub const FORMAT_VERSION: &str = "1.0.0";

pub const SCOPE_PROJECT: &str = "project";
pub const SCOPE_TREE: &str = "tree";
pub const SCOPE_NODE: &str = "node";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDoc {
    pub version: String,
    pub scope: String,
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_tree_id: Option<String>,
    pub trees: BTreeMap<String, TreeDoc>,
    #[serde(default)]
    pub custom_nodes: BTreeMap<String, NodeDoc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeDoc {
    pub version: String,
    pub scope: String,
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub root_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
    pub blocks: BTreeMap<String, BlockDoc>,
    pub viewport: Viewport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDoc {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<NodeCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub properties: Properties,
    pub position: Position,
    #[serde(default)]
    pub children: Vec<String>,
    /// Single-child form found in older decorator documents. Read only.
    #[serde(default, skip_serializing)]
    pub child: Option<String>,
}

impl BlockDoc {
    /// `children`, followed by the legacy `child` if it is not already listed.
    pub fn child_ids(&self) -> impl Iterator<Item = &str> {
        let legacy = self
            .child
            .as_deref()
            .filter(|c| !self.children.iter().any(|listed| listed == c));
        self.children.iter().map(String::as_str).chain(legacy)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDoc {
    pub version: String,
    pub scope: String,
    pub name: String,
    pub category: NodeCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub properties: Properties,
}
