//! Data model shared by the registry, engine and serializer.

mod project;
mod property;
mod template;
mod tree;

pub use project::Project;
pub use property::{Properties, PropertyValue};
pub use template::{NodeCategory, NodeTemplate, TemplateUpdate};
pub use tree::{Block, BlockUpdate, Connection, Position, Tree, Viewport, POSITION_LIMIT};
