//! The project and action-log files of the durable tree.

use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{ActionLogEntry, Edge, Node, ProjectMeta};

pub const PROJECT_FILE: &str = "project.yaml";
pub const ACTION_LOG_FILE: &str = "action-log.yaml";
pub const TACTICS_DIR: &str = "tactics";

pub fn project_file_path(dir: &Path) -> PathBuf {
    dir.join(PROJECT_FILE)
}

pub fn action_log_file_path(dir: &Path) -> PathBuf {
    dir.join(ACTION_LOG_FILE)
}

pub fn tactics_dir_path(dir: &Path) -> PathBuf {
    dir.join(TACTICS_DIR)
}

/// `project.yaml`: project metadata, every node and every edge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    #[serde(default)]
    pub project: ProjectMeta,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl ProjectFile {
    /// Sorts nodes by id and edges by (source, target).
    pub fn normalize(&mut self) {
        self.nodes.sort_by(|a, b| a.id.cmp(&b.id));
        self.edges.sort();
    }
}

pub fn read_project_file(dir: &Path) -> Result<ProjectFile> {
    let path = project_file_path(dir);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == IoErrorKind::NotFound => {
            return Err(Error::NotInitialized {
                dir: dir.to_path_buf(),
            })
        }
        Err(e) => return Err(Error::io("read", path, e)),
    };
    if raw.trim().is_empty() {
        return Ok(ProjectFile::default());
    }
    serde_yaml::from_str(&raw).map_err(|e| Error::yaml("parse", path, e))
}

pub fn write_project_file(dir: &Path, file: &ProjectFile) -> Result<()> {
    let mut file = file.clone();
    file.normalize();
    write_yaml(&project_file_path(dir), &file)
}

/// Reads the action log. A missing or empty file is an empty log.
pub fn read_action_log_file(dir: &Path) -> Result<Vec<ActionLogEntry>> {
    let path = action_log_file_path(dir);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::io("read", path, e)),
    };
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_yaml::from_str(&raw).map_err(|e| Error::yaml("parse", path, e))
}

/// Writes the log as given. Callers pass entries newest first.
pub fn write_action_log_file(dir: &Path, entries: &[ActionLogEntry]) -> Result<()> {
    write_yaml(&action_log_file_path(dir), entries)
}

pub(crate) fn write_yaml<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let yaml = serde_yaml::to_string(value).map_err(|e| Error::yaml("encode", path, e))?;
    fs::write(path, yaml).map_err(|e| Error::io("write", path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_project_file_is_not_initialized() {
        let dir = TempDir::new().unwrap();
        let err = read_project_file(dir.path()).unwrap_err();
        assert!(matches!(err, Error::NotInitialized { .. }));
        assert_eq!(err.kind(), crate::ErrorKind::StorageIo);
    }

    #[test]
    fn test_missing_or_empty_action_log_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(read_action_log_file(dir.path()).unwrap().is_empty());

        fs::write(action_log_file_path(dir.path()), "").unwrap();
        assert!(read_action_log_file(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_node_status_defaults_to_pending() {
        let dir = TempDir::new().unwrap();
        fs::write(
            project_file_path(dir.path()),
            "project:\n  name: demo\nnodes:\n- id: a\n  type: task\n  output: a.md\n",
        )
        .unwrap();

        let file = read_project_file(dir.path()).unwrap();
        assert_eq!(file.project.name, "demo");
        assert_eq!(file.project.root_goal, "");
        assert!(!file.nodes[0].is_complete());
    }

    #[test]
    fn test_malformed_yaml_is_storage_error() {
        let dir = TempDir::new().unwrap();
        fs::write(project_file_path(dir.path()), "nodes: [unclosed").unwrap();
        let err = read_project_file(dir.path()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::StorageIo);
    }
}
