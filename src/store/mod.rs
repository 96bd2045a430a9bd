//! Synchronization between the durable YAML tree and the in-memory index.
//!
//! Layout of a project directory:
//!
//! ```text
//! <dir>/project.yaml      # project meta, nodes, edges
//! <dir>/action-log.yaml   # log entries, newest first
//! <dir>/tactics/<id>.yaml # one tactic per file
//! ```
//!
//! [`load`] and [`export`] are the two halves of a pure transform pair.
//! Loading inserts through the same [`Database`] calls live commands use, so
//! a tree with duplicate ids or dangling edges fails to load instead of being
//! silently repaired.

pub mod disk;
pub mod tactics_io;

use std::fs;
use std::path::{Path, PathBuf};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{CreateNodeInput, ProjectMeta, Tactic};

use self::disk::{ProjectFile, PROJECT_FILE};

/// Materializes the durable tree at `dir` into a fresh index.
pub fn load(dir: &Path) -> Result<Database> {
    let project = disk::read_project_file(dir)?;
    let log = disk::read_action_log_file(dir)?;
    let tactics = tactics_io::read_tactics_dir(dir)?;

    let db = Database::fresh()?;
    db.set_project_meta(&project.project)?;

    for node in project.nodes {
        db.add_node(CreateNodeInput::from(node))?;
    }
    for edge in &project.edges {
        db.add_edge(&edge.source, &edge.target)?;
    }

    // The file is newest first; oldest goes in first so index ids follow age.
    for entry in log.into_iter().rev() {
        db.append_action_entry(entry)?;
    }

    for tactic in &tactics {
        db.add_tactic(tactic)?;
    }

    tracing::debug!(
        dir = %dir.display(),
        nodes = db.get_all_nodes()?.len(),
        tactics = tactics.len(),
        "loaded project"
    );
    Ok(db)
}

/// Mirrors the index into the durable tree at `dir`.
pub fn export(db: &Database, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| Error::io("create", dir, e))?;

    let project = ProjectFile {
        project: db.get_project_meta()?,
        nodes: db.get_all_nodes()?,
        edges: db.get_edges()?,
    };
    disk::write_project_file(dir, &project)?;
    disk::write_action_log_file(dir, &db.get_action_log(None, None)?)?;
    tactics_io::write_tactics_dir(dir, &db.get_all_tactics()?)?;

    tracing::debug!(dir = %dir.display(), "exported project");
    Ok(())
}

/// One command's worth of work against a project directory.
pub struct Session {
    dir: PathBuf,
    db: Database,
    dirty: bool,
}

impl Session {
    pub fn load(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let db = load(&dir)?;
        Ok(Self {
            dir,
            db,
            dirty: false,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Writes the index back to disk if anything changed. Returns whether a
    /// write happened.
    pub fn save(&mut self) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        export(&self.db, &self.dir)?;
        self.dirty = false;
        tracing::info!(dir = %self.dir.display(), "saved project");
        Ok(true)
    }
}

/// Outcome of [`init`].
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct InitReport {
    pub dir: PathBuf,
    /// `project.yaml` did not exist before.
    pub created: bool,
    pub seeded: Vec<String>,
    pub project: ProjectMeta,
}

/// Creates the project directory structure if missing, applies the optional
/// name and root goal, and seeds `library` for ids without a tactic file.
/// Re-running on an existing project only fills in what is missing.
pub fn init(
    dir: &Path,
    name: Option<&str>,
    root_goal: Option<&str>,
    library: &[Tactic],
) -> Result<InitReport> {
    let tactics_dir = disk::tactics_dir_path(dir);
    fs::create_dir_all(&tactics_dir).map_err(|e| Error::io("create", &tactics_dir, e))?;

    let created = !dir.join(PROJECT_FILE).exists();
    if created {
        disk::write_project_file(dir, &ProjectFile::default())?;
    }
    if !disk::action_log_file_path(dir).exists() {
        disk::write_action_log_file(dir, &[])?;
    }

    let seeded = tactics_io::seed_tactics_if_missing(dir, library)?;

    let mut session = Session::load(dir)?;
    let mut project = session.db().get_project_meta()?;
    if name.is_some() || root_goal.is_some() {
        if let Some(name) = name {
            project.name = name.to_string();
        }
        if let Some(goal) = root_goal {
            project.root_goal = goal.to_string();
        }
        session.db().set_project_meta(&project)?;
        session.mark_dirty();
        session.save()?;
    }

    tracing::info!(dir = %dir.display(), created, seeded = seeded.len(), "initialized project");
    Ok(InitReport {
        dir: dir.to_path_buf(),
        created,
        seeded,
        project,
    })
}
