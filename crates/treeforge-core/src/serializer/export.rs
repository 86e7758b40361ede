//! File names for exported documents.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Project,
    Tree,
    Nodes,
}

fn slug(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

/// `<project>_<millis>.json`, `tree_<title>_<millis>.json` or
/// `custom_nodes_<millis>.json`. `label` is the project name or tree title.
pub fn export_file_name(kind: ExportKind, label: &str, now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis();
    match kind {
        ExportKind::Project => format!("{}_{}.json", slug(label), millis),
        ExportKind::Tree => format!("tree_{}_{}.json", slug(label), millis),
        ExportKind::Nodes => format!("custom_nodes_{}.json", millis),
    }
}
