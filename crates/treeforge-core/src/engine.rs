//! Mutation engine - the only writer of project state.
//!
//! Every write goes through [`ProjectStore::mutate`]: the current project is
//! snapshotted, the change is validated and applied, and on success the
//! snapshot is pushed onto the undo stack and `updated_at` is bumped. A
//! rejected change restores the snapshot, so calls are all-or-nothing.

use std::collections::BTreeMap;

use chrono::Utc;
use uuid::Uuid;

use crate::config::EditorConfig;
use crate::error::Rejection;
use crate::history::History;
use crate::model::{
    Block, BlockUpdate, Connection, NodeCategory, NodeTemplate, Position, Project,
    TemplateUpdate, Tree,
};
use crate::registry;

/// Title of the tree every new project starts with.
pub const MAIN_TREE_TITLE: &str = "Main Tree";
const MAIN_TREE_DESCRIPTION: &str = "The main behavior tree";

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn new_tree(title: impl Into<String>, description: Option<String>) -> Tree {
    Tree::with_root(new_id(), new_id(), title, description)
}

/// Build a brand-new project: one "Main Tree" and the built-in catalog.
pub fn new_project(name: impl Into<String>, description: Option<String>) -> Project {
    let tree = new_tree(MAIN_TREE_TITLE, Some(MAIN_TREE_DESCRIPTION.to_string()));
    let tree_id = tree.id.clone();
    let now = Utc::now();
    Project {
        id: new_id(),
        name: name.into(),
        description,
        trees: BTreeMap::from([(tree_id.clone(), tree)]),
        nodes: registry::builtin_catalog(),
        selected_tree_id: Some(tree_id),
        created_at: now,
        updated_at: now,
    }
}

/// An editing session over one project.
///
/// Single writer: callers that share a store across event handlers must
/// serialize calls into it.
#[derive(Debug, Default)]
pub struct ProjectStore {
    project: Option<Project>,
    history: History,
}

impl ProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            project: None,
            history: History::with_limit(config.history_limit),
        }
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn selected_tree(&self) -> Option<&Tree> {
        self.project.as_ref().and_then(Project::selected_tree)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ── Project lifecycle ───────────────────────────────────────────────

    /// Replace the current project with a fresh one and clear history.
    pub fn create_project(&mut self, name: &str, description: Option<&str>) -> String {
        let project = new_project(name, description.map(str::to_string));
        let id = project.id.clone();
        tracing::info!(project_id = %id, name = %name, "Created project");
        self.project = Some(project);
        self.history.clear();
        id
    }

    /// Install a project wholesale (e.g. one read from storage), merging in
    /// any missing built-in templates. Clears history.
    pub fn load_project(&mut self, mut project: Project) {
        registry::merge_builtins(&mut project.nodes);
        tracing::info!(project_id = %project.id, trees = project.trees.len(), "Loaded project");
        self.project = Some(project);
        self.history.clear();
    }

    // ── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        match self.project.as_mut() {
            Some(project) => self.history.undo(project),
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.project.as_mut() {
            Some(project) => self.history.redo(project),
            None => false,
        }
    }

    /// Apply `change` atomically with history capture.
    fn mutate<T>(
        &mut self,
        op: &'static str,
        change: impl FnOnce(&mut Project) -> Result<T, Rejection>,
    ) -> Result<T, Rejection> {
        let Some(project) = self.project.as_mut() else {
            tracing::warn!(op, "Rejected mutation: no project loaded");
            return Err(Rejection::NoProject);
        };

        let before = project.clone();
        match change(project) {
            Ok(value) => {
                project.touch();
                self.history.record(before);
                tracing::debug!(op, undo_depth = self.history.undo_depth(), "Applied mutation");
                Ok(value)
            }
            Err(reason) => {
                *project = before;
                tracing::warn!(op, reason = %reason, "Rejected mutation");
                Err(reason)
            }
        }
    }

    // ── Trees ───────────────────────────────────────────────────────────

    /// Add a tree with its own root block and select it.
    pub fn create_tree(&mut self, title: &str, description: Option<&str>) -> Result<String, Rejection> {
        self.mutate("create_tree", |project| {
            let tree = new_tree(title, description.map(str::to_string));
            let id = tree.id.clone();
            project.trees.insert(id.clone(), tree);
            project.selected_tree_id = Some(id.clone());
            Ok(id)
        })
    }

    /// Remove a tree. A deleted selection moves to the first remaining tree.
    pub fn delete_tree(&mut self, tree_id: &str) -> Result<(), Rejection> {
        self.mutate("delete_tree", |project| {
            project
                .trees
                .remove(tree_id)
                .ok_or_else(|| Rejection::TreeNotFound(tree_id.to_string()))?;
            if project.selected_tree_id.as_deref() == Some(tree_id) {
                project.selected_tree_id = project.trees.keys().next().cloned();
            }
            Ok(())
        })
    }

    /// Set the selected tree. The id is not checked against the project.
    ///
    /// Selection is not a structural change: no history entry is recorded and
    /// `updated_at` is left alone.
    pub fn select_tree(&mut self, tree_id: &str) -> Result<(), Rejection> {
        let project = self.project.as_mut().ok_or(Rejection::NoProject)?;
        project.selected_tree_id = Some(tree_id.to_string());
        tracing::debug!(tree_id, "Selected tree");
        Ok(())
    }

    // ── Node templates ──────────────────────────────────────────────────

    pub fn create_node(&mut self, template: NodeTemplate) -> Result<(), Rejection> {
        self.mutate("create_node", |project| {
            registry::create(&mut project.nodes, template)
        })
    }

    pub fn update_node(&mut self, name: &str, update: TemplateUpdate) -> Result<(), Rejection> {
        self.mutate("update_node", |project| {
            registry::update(&mut project.nodes, name, update)
        })
    }

    pub fn delete_node(&mut self, name: &str) -> Result<(), Rejection> {
        self.mutate("delete_node", |project| {
            registry::delete(&mut project.nodes, name).map(|_| ())
        })
    }

    // ── Blocks ──────────────────────────────────────────────────────────

    /// Instantiate `template_name` into a tree. Returns the new block id.
    pub fn create_block(
        &mut self,
        tree_id: &str,
        template_name: &str,
        position: Position,
    ) -> Result<String, Rejection> {
        self.mutate("create_block", |project| {
            let template = project
                .nodes
                .get(template_name)
                .ok_or_else(|| Rejection::TemplateNotFound(template_name.to_string()))?;
            let position = position.sanitized().ok_or(Rejection::InvalidPosition)?;
            let block = Block::from_template(new_id(), template, position);
            let tree = tree_mut(project, tree_id)?;
            let id = block.id.clone();
            tree.blocks.insert(id.clone(), block);
            Ok(id)
        })
    }

    /// Merge `update` into a block. An invalid position drops the whole update.
    pub fn update_block(
        &mut self,
        tree_id: &str,
        block_id: &str,
        mut update: BlockUpdate,
    ) -> Result<(), Rejection> {
        self.mutate("update_block", |project| {
            let tree = tree_mut(project, tree_id)?;
            if let Some(position) = update.position {
                update.position = Some(position.sanitized().ok_or(Rejection::InvalidPosition)?);
            }
            if tree.is_root(block_id)
                && update.category.is_some_and(|c| c != NodeCategory::Root)
            {
                return Err(Rejection::RootCategory);
            }
            let block = tree
                .blocks
                .get_mut(block_id)
                .ok_or_else(|| Rejection::BlockNotFound(block_id.to_string()))?;
            update.apply(block);
            Ok(())
        })
    }

    /// Remove a block and every connection touching it. The root stays.
    pub fn delete_block(&mut self, tree_id: &str, block_id: &str) -> Result<(), Rejection> {
        self.mutate("delete_block", |project| {
            let tree = tree_mut(project, tree_id)?;
            if tree.is_root(block_id) {
                return Err(Rejection::RootBlock);
            }
            tree.blocks
                .remove(block_id)
                .ok_or_else(|| Rejection::BlockNotFound(block_id.to_string()))?;
            tree.connections
                .retain(|c| c.source != block_id && c.target != block_id);
            Ok(())
        })
    }

    // ── Connections ─────────────────────────────────────────────────────

    /// Connect `source` -> `target` (target becomes a child of source).
    ///
    /// Refused when either block is missing, the target already has a parent,
    /// the target is the root, or the target is an ancestor of the source.
    pub fn create_connection(
        &mut self,
        tree_id: &str,
        source_id: &str,
        target_id: &str,
    ) -> Result<String, Rejection> {
        self.mutate("create_connection", |project| {
            let tree = tree_mut(project, tree_id)?;
            for id in [source_id, target_id] {
                if !tree.blocks.contains_key(id) {
                    return Err(Rejection::BlockNotFound(id.to_string()));
                }
            }
            if tree.incoming_count(target_id) > 0 {
                return Err(Rejection::AlreadyHasParent(target_id.to_string()));
            }
            if tree.is_root(target_id) {
                return Err(Rejection::RootAsChild);
            }
            if tree.is_ancestor(target_id, source_id) {
                return Err(Rejection::WouldCreateCycle);
            }
            let connection = Connection {
                id: new_id(),
                source: source_id.to_string(),
                target: target_id.to_string(),
            };
            let id = connection.id.clone();
            tree.connections.push(connection);
            Ok(id)
        })
    }

    pub fn delete_connection(&mut self, tree_id: &str, connection_id: &str) -> Result<(), Rejection> {
        self.mutate("delete_connection", |project| {
            let tree = tree_mut(project, tree_id)?;
            let index = tree
                .connections
                .iter()
                .position(|c| c.id == connection_id)
                .ok_or_else(|| Rejection::ConnectionNotFound(connection_id.to_string()))?;
            tree.connections.remove(index);
            Ok(())
        })
    }
}

fn tree_mut<'a>(project: &'a mut Project, tree_id: &str) -> Result<&'a mut Tree, Rejection> {
    project
        .trees
        .get_mut(tree_id)
        .ok_or_else(|| Rejection::TreeNotFound(tree_id.to_string()))
}
