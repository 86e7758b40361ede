//! Trees, blocks and connections.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::property::Properties;
use super::template::{NodeCategory, NodeTemplate};

/// Block positions are clamped into `[-POSITION_LIMIT, POSITION_LIMIT]`.
pub const POSITION_LIMIT: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// `None` for non-finite input, otherwise the position clamped into range.
    pub fn sanitized(self) -> Option<Self> {
        if !self.x.is_finite() || !self.y.is_finite() {
            return None;
        }
        Some(Self {
            x: self.x.clamp(-POSITION_LIMIT, POSITION_LIMIT),
            y: self.y.clamp(-POSITION_LIMIT, POSITION_LIMIT),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

/// A node instance placed in one tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,

    /// Template key this block was instantiated from
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub category: NodeCategory,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub properties: Properties,

    pub position: Position,
}

impl Block {
    /// Copy the template's fields into a new block. Later template edits do
    /// not reach the block.
    pub fn from_template(id: String, template: &NodeTemplate, position: Position) -> Self {
        Self {
            id,
            name: template.name.clone(),
            title: template.title.clone(),
            category: template.category,
            description: template.description.clone(),
            properties: template.properties.clone(),
            position,
        }
    }

    pub(crate) fn root(id: String) -> Self {
        Self {
            id,
            name: "root".to_string(),
            title: None,
            category: NodeCategory::Root,
            description: None,
            properties: Properties::new(),
            position: Position::default(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

/// Partial block update; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockUpdate {
    pub name: Option<String>,
    pub title: Option<String>,
    pub category: Option<NodeCategory>,
    pub description: Option<String>,
    pub properties: Option<Properties>,
    pub position: Option<Position>,
}

impl BlockUpdate {
    pub fn position(position: Position) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub(crate) fn apply(self, block: &mut Block) {
        if let Some(name) = self.name {
            block.name = name;
        }
        if let Some(title) = self.title {
            block.title = Some(title);
        }
        if let Some(category) = self.category {
            block.category = category;
        }
        if let Some(description) = self.description {
            block.description = Some(description);
        }
        if let Some(properties) = self.properties {
            block.properties = properties;
        }
        if let Some(position) = self.position {
            block.position = position;
        }
    }
}

/// Directed edge: `target` is a child of `source`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    pub source: String,
    pub target: String,
}

/// One behavior graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tree {
    pub id: String,
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub blocks: BTreeMap<String, Block>,

    /// Kept in creation order; children are exported in this order.
    pub connections: Vec<Connection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_id: Option<String>,

    /// Tree-level properties carried through the interchange format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,

    #[serde(default)]
    pub viewport: Viewport,
}

impl Tree {
    /// A tree holding only its root block.
    pub(crate) fn with_root(
        id: String,
        root_id: String,
        title: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        let mut blocks = BTreeMap::new();
        blocks.insert(root_id.clone(), Block::root(root_id.clone()));
        Self {
            id,
            title: title.into(),
            description,
            blocks,
            connections: Vec::new(),
            root_id: Some(root_id),
            properties: None,
            viewport: Viewport::default(),
        }
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.get(id)
    }

    pub fn root(&self) -> Option<&Block> {
        self.root_id.as_deref().and_then(|id| self.blocks.get(id))
    }

    pub fn is_root(&self, block_id: &str) -> bool {
        self.root_id.as_deref() == Some(block_id)
    }

    pub fn connection(&self, id: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    /// Number of connections targeting `block_id`.
    pub fn incoming_count(&self, block_id: &str) -> usize {
        self.connections
            .iter()
            .filter(|c| c.target == block_id)
            .count()
    }

    pub fn parent_of(&self, block_id: &str) -> Option<&str> {
        self.connections
            .iter()
            .find(|c| c.target == block_id)
            .map(|c| c.source.as_str())
    }

    /// Child ids of `block_id`, in connection order.
    pub fn children_of<'a>(&'a self, block_id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.connections
            .iter()
            .filter(move |c| c.source == block_id)
            .map(|c| c.target.as_str())
    }

    /// True when `ancestor` is reachable by walking parent links up from
    /// `block_id` (a block is its own ancestor).
    pub fn is_ancestor(&self, ancestor: &str, block_id: &str) -> bool {
        let mut current = Some(block_id);
        let mut steps = 0;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            // Trees assembled by hand skip validation; bound the walk anyway.
            steps += 1;
            if steps > self.connections.len() {
                return false;
            }
            current = self.parent_of(id);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_chain() -> Tree {
        let mut tree = Tree::with_root("t".into(), "r".into(), "T", None);
        for id in ["a", "b"] {
            tree.blocks.insert(
                id.into(),
                Block::from_template(
                    id.into(),
                    &NodeTemplate::new("sequence", NodeCategory::Composite),
                    Position::default(),
                ),
            );
        }
        tree.connections.push(Connection {
            id: "c1".into(),
            source: "r".into(),
            target: "a".into(),
        });
        tree.connections.push(Connection {
            id: "c2".into(),
            source: "a".into(),
            target: "b".into(),
        });
        tree
    }

    #[test]
    fn sanitized_clamps_finite_and_rejects_non_finite() {
        assert_eq!(
            Position::new(50_000.0, -50_000.0).sanitized(),
            Some(Position::new(10_000.0, -10_000.0))
        );
        assert_eq!(Position::new(f64::NAN, 0.0).sanitized(), None);
        assert_eq!(Position::new(0.0, f64::NEG_INFINITY).sanitized(), None);
        assert_eq!(Position::new(12.5, -3.0).sanitized(), Some(Position::new(12.5, -3.0)));
    }

    #[test]
    fn parent_and_children_follow_connections() {
        let tree = tree_with_chain();
        assert_eq!(tree.parent_of("b"), Some("a"));
        assert_eq!(tree.parent_of("r"), None);
        assert_eq!(tree.children_of("r").collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(tree.incoming_count("a"), 1);
        assert_eq!(tree.root().map(|b| b.category), Some(NodeCategory::Root));
    }

    #[test]
    fn ancestry_walks_parent_links() {
        let tree = tree_with_chain();
        assert!(tree.is_ancestor("r", "b"));
        assert!(tree.is_ancestor("b", "b"));
        assert!(!tree.is_ancestor("b", "a"));
    }
}
