//! Project persistence - one interchange document per project.
//!
//! Saving is always initiated by the caller after a mutation returns. A
//! failed save is reported but never rolls back the in-memory project.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::EditorConfig;
use crate::error::StorageError;
use crate::model::Project;
use crate::serializer::{self, ProjectDoc};

const FILE_PREFIX: &str = "bt-project-";
const FILE_SUFFIX: &str = ".json";

pub type Result<T> = std::result::Result<T, StorageError>;

/// Listing entry for a stored project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub trees: usize,
    pub updated_at: DateTime<Utc>,
}

/// Directory of `bt-project-<id>.json` documents.
#[derive(Debug, Clone)]
pub struct ProjectStorage {
    dir: PathBuf,
    pretty: bool,
}

impl ProjectStorage {
    pub fn new(dir: impl Into<PathBuf>, pretty: bool) -> Self {
        Self {
            dir: dir.into(),
            pretty,
        }
    }

    /// Expects `config` to have had its paths resolved.
    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(config.projects_dir.clone(), config.pretty_json)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Storage key for a project id.
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}{}{}", FILE_PREFIX, id, FILE_SUFFIX))
    }

    pub fn exists(&self, id: &str) -> bool {
        self.path_for(id).exists()
    }

    pub fn save(&self, project: &Project) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&project.id);
        let text = serializer::to_json(&serializer::serialize_project(project), self.pretty)?;
        std::fs::write(&path, text)?;
        tracing::info!(project_id = %project.id, path = %path.display(), "Saved project");
        Ok(path)
    }

    /// Read a project back. The catalog holds only its custom templates.
    pub fn load(&self, id: &str) -> Result<Project> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(StorageError::NotFound(id.to_string()));
        }
        let text = std::fs::read_to_string(&path)?;
        Ok(serializer::project_from_json(&text)?)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(StorageError::NotFound(id.to_string()));
        }
        std::fs::remove_file(&path)?;
        tracing::info!(project_id = %id, "Deleted project");
        Ok(())
    }

    /// Stored projects, most recently updated first. Unreadable documents
    /// are skipped.
    pub fn list(&self) -> Result<Vec<ProjectSummary>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut summaries = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_project = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(FILE_PREFIX) && n.ends_with(FILE_SUFFIX));
            if !is_project {
                continue;
            }

            let doc = std::fs::read_to_string(&path)
                .map_err(StorageError::from)
                .and_then(|text| {
                    serde_json::from_str::<ProjectDoc>(&text)
                        .map_err(|e| StorageError::Document(e.into()))
                });
            match doc {
                Ok(doc) => summaries.push(ProjectSummary {
                    id: doc.id,
                    name: doc.name,
                    description: doc.description,
                    trees: doc.trees.len(),
                    updated_at: doc.updated_at,
                }),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable project");
                }
            }
        }

        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        Ok(summaries)
    }
}
