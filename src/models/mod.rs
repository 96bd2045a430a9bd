//! Domain models for Tactician.
//!
//! # Core Concepts
//!
//! - [`Node`]: a uniquely identified unit of work or artifact. Nodes produce an
//!   `output`, which several nodes may share.
//! - [`Edge`]: a directed dependency from a prerequisite node to a dependent node.
//! - [`Tactic`]: a reusable rule that expands the graph when its dependencies are met.
//! - [`ActionLogEntry`]: append-only audit trail of everything that changed the project.
//! - [`ProjectMeta`]: the project's name and optional root goal.

mod history;
mod node;
mod project;
mod tactic;

pub use history::*;
pub use node::*;
pub use project::*;
pub use tactic::*;
