//! Conversion between the flat in-memory graph and nested interchange
//! documents.
//!
//! All functions are pure: inputs are never modified and history is never
//! touched. Decoding is all-or-nothing per document.

mod document;
mod export;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

pub use document::{
    BlockDoc, NodeDoc, ProjectDoc, TreeDoc, FORMAT_VERSION, SCOPE_NODE, SCOPE_PROJECT, SCOPE_TREE,
};
pub use export::{export_file_name, ExportKind};

use crate::error::SerializeError;
use crate::model::{Block, Connection, NodeTemplate, Project, Tree};

pub type Result<T> = std::result::Result<T, SerializeError>;

fn check_envelope(scope: &str, version: &str, expected: &str) -> Result<()> {
    if scope != expected {
        return Err(SerializeError::WrongScope {
            expected: expected.to_string(),
            actual: scope.to_string(),
        });
    }
    if version.split('.').next() != FORMAT_VERSION.split('.').next() {
        return Err(SerializeError::UnsupportedVersion(version.to_string()));
    }
    Ok(())
}

/// Id given to a connection rebuilt from a parent's child list.
///
/// Block ids may themselves contain `-`, so two pairs can share a joined id
/// ("a-b" + "c" and "a" + "b-c"). [`deserialize_tree`] suffixes the later one.
pub fn connection_id(parent: &str, child: &str) -> String {
    format!("{}-{}", parent, child)
}

fn unique_connection_id(connections: &[Connection], parent: &str, child: &str) -> String {
    let base = connection_id(parent, child);
    let taken = |id: &str| connections.iter().any(|c| c.id == id);
    if !taken(base.as_str()) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}#{}", base, n);
        if !taken(candidate.as_str()) {
            return candidate;
        }
        n += 1;
    }
}

/// First child block whose walk up parent links revisits a block.
fn find_cycle(connections: &[Connection]) -> Option<&str> {
    let parent_of = |id: &str| {
        connections
            .iter()
            .find(|c| c.target == id)
            .map(|c| c.source.as_str())
    };
    connections.iter().map(|c| c.target.as_str()).find(|&start| {
        let mut seen = BTreeSet::new();
        let mut current = Some(start);
        while let Some(id) = current {
            if !seen.insert(id) {
                return true;
            }
            current = parent_of(id);
        }
        false
    })
}

// ── Trees ───────────────────────────────────────────────────────────────

/// Nest a tree: each block lists its children in connection order.
pub fn serialize_tree(tree: &Tree) -> TreeDoc {
    let mut blocks: BTreeMap<String, BlockDoc> = tree
        .blocks
        .values()
        .map(|block| {
            let doc = BlockDoc {
                id: block.id.clone(),
                name: block.name.clone(),
                title: block.title.clone(),
                category: Some(block.category),
                description: block.description.clone(),
                properties: block.properties.clone(),
                position: block.position,
                children: Vec::new(),
                child: None,
            };
            (block.id.clone(), doc)
        })
        .collect();

    for connection in &tree.connections {
        if !blocks.contains_key(&connection.target) {
            continue;
        }
        if let Some(source) = blocks.get_mut(&connection.source) {
            source.children.push(connection.target.clone());
        }
    }

    TreeDoc {
        version: FORMAT_VERSION.to_string(),
        scope: SCOPE_TREE.to_string(),
        id: tree.id.clone(),
        title: tree.title.clone(),
        description: tree.description.clone(),
        root_id: tree.root_id.clone().unwrap_or_default(),
        properties: tree.properties.clone(),
        blocks,
        viewport: tree.viewport,
    }
}

/// Flatten a tree document back into blocks and connections.
///
/// Connections are rebuilt parent by parent in block-key order, children in
/// listed order, with ids from [`connection_id`]. Original connection ids are
/// not recoverable. The result obeys the same shape rules as the engine: one
/// parent per block, the root never a child, no cycles.
pub fn deserialize_tree(doc: &TreeDoc) -> Result<Tree> {
    check_envelope(&doc.scope, &doc.version, SCOPE_TREE)?;

    let mut blocks = BTreeMap::new();
    for (key, entry) in &doc.blocks {
        if key != &entry.id {
            return Err(SerializeError::MismatchedBlockId {
                tree: doc.id.clone(),
                key: key.clone(),
                id: entry.id.clone(),
            });
        }
        let block = Block {
            id: entry.id.clone(),
            name: entry.name.clone(),
            title: entry.title.clone(),
            category: entry.category.unwrap_or_default(),
            description: entry.description.clone(),
            properties: entry.properties.clone(),
            position: entry.position,
        };
        blocks.insert(block.id.clone(), block);
    }

    if !blocks.contains_key(&doc.root_id) {
        return Err(SerializeError::MissingRoot {
            tree: doc.id.clone(),
            root: doc.root_id.clone(),
        });
    }

    let mut connections: Vec<Connection> = Vec::new();
    for entry in doc.blocks.values() {
        for child in entry.child_ids() {
            if !blocks.contains_key(child) {
                return Err(SerializeError::UnknownChild {
                    tree: doc.id.clone(),
                    parent: entry.id.clone(),
                    child: child.to_string(),
                });
            }
            if child == doc.root_id {
                return Err(SerializeError::RootAsChild {
                    tree: doc.id.clone(),
                    parent: entry.id.clone(),
                });
            }
            if connections.iter().any(|c| c.target == child) {
                return Err(SerializeError::MultipleParents {
                    tree: doc.id.clone(),
                    child: child.to_string(),
                });
            }
            connections.push(Connection {
                id: unique_connection_id(&connections, &entry.id, child),
                source: entry.id.clone(),
                target: child.to_string(),
            });
        }
    }

    if let Some(block) = find_cycle(&connections) {
        return Err(SerializeError::Cycle {
            tree: doc.id.clone(),
            block: block.to_string(),
        });
    }

    Ok(Tree {
        id: doc.id.clone(),
        title: doc.title.clone(),
        description: doc.description.clone(),
        blocks,
        connections,
        root_id: Some(doc.root_id.clone()),
        properties: doc.properties.clone(),
        viewport: doc.viewport,
    })
}

// ── Node templates ──────────────────────────────────────────────────────

pub fn serialize_node(template: &NodeTemplate) -> NodeDoc {
    NodeDoc {
        version: FORMAT_VERSION.to_string(),
        scope: SCOPE_NODE.to_string(),
        name: template.name.clone(),
        category: template.category,
        title: template.title.clone(),
        description: template.description.clone(),
        properties: template.properties.clone(),
    }
}

/// Imported templates are always user templates.
pub fn deserialize_node(doc: &NodeDoc) -> Result<NodeTemplate> {
    check_envelope(&doc.scope, &doc.version, SCOPE_NODE)?;
    Ok(NodeTemplate {
        name: doc.name.clone(),
        title: doc.title.clone(),
        category: doc.category,
        description: doc.description.clone(),
        properties: doc.properties.clone(),
        is_default: false,
    })
}

/// Node documents for every non-built-in template, ordered by key.
pub fn serialize_custom_nodes(project: &Project) -> Vec<NodeDoc> {
    project.custom_templates().map(serialize_node).collect()
}

// ── Projects ────────────────────────────────────────────────────────────

/// Wrap every tree and the user templates. Built-ins are never exported.
pub fn serialize_project(project: &Project) -> ProjectDoc {
    ProjectDoc {
        version: FORMAT_VERSION.to_string(),
        scope: SCOPE_PROJECT.to_string(),
        id: project.id.clone(),
        name: project.name.clone(),
        description: project.description.clone(),
        selected_tree_id: project.selected_tree_id.clone(),
        trees: project
            .trees
            .values()
            .map(|tree| (tree.id.clone(), serialize_tree(tree)))
            .collect(),
        custom_nodes: project
            .nodes
            .iter()
            .filter(|(_, node)| !node.is_default)
            .map(|(key, node)| (key.clone(), serialize_node(node)))
            .collect(),
        created_at: project.created_at,
        updated_at: project.updated_at,
    }
}

/// Rebuild a project from a document.
///
/// The catalog holds only the imported custom nodes; callers that need a
/// usable project must merge the built-ins back in (see
/// [`crate::ProjectStore::load_project`]).
pub fn deserialize_project(doc: &ProjectDoc) -> Result<Project> {
    check_envelope(&doc.scope, &doc.version, SCOPE_PROJECT)?;

    let mut trees = BTreeMap::new();
    for tree_doc in doc.trees.values() {
        let tree = deserialize_tree(tree_doc)?;
        trees.insert(tree.id.clone(), tree);
    }

    let mut nodes = BTreeMap::new();
    for (key, node_doc) in &doc.custom_nodes {
        let template = NodeTemplate {
            name: key.clone(),
            ..deserialize_node(node_doc)?
        };
        nodes.insert(key.clone(), template);
    }

    Ok(Project {
        id: doc.id.clone(),
        name: doc.name.clone(),
        description: doc.description.clone(),
        trees,
        nodes,
        selected_tree_id: doc.selected_tree_id.clone(),
        created_at: doc.created_at,
        updated_at: doc.updated_at,
    })
}

// ── JSON text ───────────────────────────────────────────────────────────

pub fn to_json<T: Serialize>(doc: &T, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(doc)?
    } else {
        serde_json::to_string(doc)?
    };
    Ok(text)
}

pub fn project_from_json(text: &str) -> Result<Project> {
    let doc: ProjectDoc = serde_json::from_str(text)?;
    deserialize_project(&doc)
}

pub fn tree_from_json(text: &str) -> Result<Tree> {
    let doc: TreeDoc = serde_json::from_str(text)?;
    deserialize_tree(&doc)
}

/// Accepts a single node document or an array of them.
pub fn nodes_from_json(text: &str) -> Result<Vec<NodeTemplate>> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let docs: Vec<NodeDoc> = if value.is_array() {
        serde_json::from_value(value)?
    } else {
        vec![serde_json::from_value(value)?]
    };
    docs.iter().map(deserialize_node).collect()
}
