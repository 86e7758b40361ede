//! Treeforge Core - behavior tree project model and editing engine
//!
//! This crate holds the project/tree data model, the built-in node
//! template catalog, the mutation engine with linear undo/redo, and the
//! nested JSON interchange format used for export, import and storage.

#![forbid(unsafe_code)]

pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod model;
pub mod registry;
pub mod serializer;
pub mod storage;

pub use config::EditorConfig;
pub use engine::{new_project, ProjectStore, MAIN_TREE_TITLE};
pub use error::{Rejection, SerializeError, StorageError};
pub use history::History;
pub use model::{
    Block, BlockUpdate, Connection, NodeCategory, NodeTemplate, Position, Project, Properties,
    PropertyValue, TemplateUpdate, Tree, Viewport, POSITION_LIMIT,
};
pub use serializer::{
    deserialize_project, deserialize_tree, serialize_project, serialize_tree, ProjectDoc, TreeDoc,
};
pub use storage::{ProjectStorage, ProjectSummary};
