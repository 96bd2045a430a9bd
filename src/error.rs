use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// The kind of record an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Node,
    Tactic,
    Goal,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node => f.write_str("node"),
            Self::Tactic => f.write_str("tactic"),
            Self::Goal => f.write_str("goal"),
        }
    }
}

/// Coarse classification of [`Error`], used by callers that only care about
/// the failure category (exit codes, retry decisions, test assertions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    FailedPrecondition,
    InvalidInput,
    StorageIo,
    Index,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: String },

    #[error("{entity} already exists: {}", .ids.join(", "))]
    Conflict { entity: Entity, ids: Vec<String> },

    #[error("cannot apply tactic {tactic_id}: missing required dependencies ({}); use --force", .missing.join(","))]
    UnmetDependencies {
        tactic_id: String,
        missing: Vec<String>,
    },

    #[error("cannot delete {node_id}: it blocks {} node(s) ({}); use --force", .dependents.len(), .dependents.join(","))]
    BlocksDependents {
        node_id: String,
        dependents: Vec<String>,
    },

    #[error("apply requires confirmation; re-run with --yes")]
    NotConfirmed,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("project not initialized at {} (run `tactician init`)", .dir.display())]
    NotInitialized { dir: PathBuf },

    #[error("{action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{action} {}: {source}", .path.display())]
    Yaml {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid tactic file {}: {reason}", .path.display())]
    InvalidTacticFile { path: PathBuf, reason: String },

    #[error("encode payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::UnmetDependencies { .. } | Self::BlocksDependents { .. } | Self::NotConfirmed => {
                ErrorKind::FailedPrecondition
            }
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::NotInitialized { .. }
            | Self::Io { .. }
            | Self::Yaml { .. }
            | Self::InvalidTacticFile { .. } => ErrorKind::StorageIo,
            Self::Json(_) | Self::Sql(_) => ErrorKind::Index,
        }
    }

    pub(crate) fn node_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: Entity::Node,
            id: id.into(),
        }
    }

    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn yaml(
        action: &'static str,
        path: impl Into<PathBuf>,
        source: serde_yaml::Error,
    ) -> Self {
        Self::Yaml {
            action,
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
