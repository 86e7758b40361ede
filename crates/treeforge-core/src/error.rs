//! Error and rejection types.

use thiserror::Error;

/// Why a mutation was refused. A refused mutation leaves the project, its
/// history and `updated_at` untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("no project is loaded")]
    NoProject,

    #[error("tree not found: {0}")]
    TreeNotFound(String),

    #[error("block not found: {0}")]
    BlockNotFound(String),

    #[error("connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("node template not found: {0}")]
    TemplateNotFound(String),

    #[error("node template already exists: {0}")]
    TemplateExists(String),

    #[error("built-in node template can not be deleted: {0}")]
    BuiltinTemplate(String),

    #[error("the root block of a tree can not be deleted")]
    RootBlock,

    #[error("the root block must keep the root category")]
    RootCategory,

    #[error("position is not finite")]
    InvalidPosition,

    #[error("block {0} already has a parent")]
    AlreadyHasParent(String),

    #[error("the root block can not be a child")]
    RootAsChild,

    /// Raised when the target is already an ancestor of the source (or is the
    /// source). This goes past the single-parent rule so that every tree stays
    /// acyclic.
    #[error("connection would create a cycle")]
    WouldCreateCycle,
}

/// Malformed interchange input.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected scope {expected:?}, got {actual:?}")]
    WrongScope { expected: String, actual: String },

    #[error("unsupported document version: {0}")]
    UnsupportedVersion(String),

    #[error("tree {tree}: root block {root} is missing")]
    MissingRoot { tree: String, root: String },

    #[error("tree {tree}: block {parent} lists unknown child {child}")]
    UnknownChild {
        tree: String,
        parent: String,
        child: String,
    },

    #[error("tree {tree}: block {child} has more than one parent")]
    MultipleParents { tree: String, child: String },

    #[error("tree {tree}: block {parent} lists the root block as a child")]
    RootAsChild { tree: String, parent: String },

    #[error("tree {tree}: parent links of block {block} form a cycle")]
    Cycle { tree: String, block: String },

    #[error("tree {tree}: block entry {key} carries id {id}")]
    MismatchedBlockId { tree: String, key: String, id: String },
}

/// Persistence failure. The in-memory project is never rolled back.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("document error: {0}")]
    Document(#[from] SerializeError),

    #[error("project not found: {0}")]
    NotFound(String),
}
