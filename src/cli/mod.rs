//! Command-line surface.
//!
//! Every command loads the project into a fresh [`Session`], runs one logical
//! operation, and saves only if the operation changed something.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::Config;
use crate::error::Error;
use crate::models::NodeStatus;
use crate::render::OutputFormat;
use crate::store::Session;

pub const DEFAULT_DIR: &str = ".tactician";

#[derive(Debug, Parser)]
#[command(name = "tactician")]
#[command(about = "Plan a project as a dependency graph grown by reusable tactics")]
#[command(version)]
pub struct Cli {
    /// Project directory
    #[arg(long, global = true, env = "TACTICIAN_DIR", default_value = DEFAULT_DIR)]
    pub dir: PathBuf,

    /// Output format (defaults to the config file, then text)
    #[arg(long, short = 'o', global = true, value_enum)]
    pub output: Option<OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the project directory and seed the default tactics
    Init {
        /// Project name
        #[arg(long)]
        name: Option<String>,

        /// Node id the graph view starts from
        #[arg(long)]
        root_goal: Option<String>,
    },
    /// Add, edit, delete, show or link nodes
    #[command(subcommand)]
    Node(NodeCommands),
    /// Apply a tactic to expand the graph
    Apply {
        tactic_id: String,

        /// Confirm the change
        #[arg(short = 'y', long)]
        yes: bool,

        /// Apply even if dependencies are missing
        #[arg(short, long)]
        force: bool,
    },
    /// Search for applicable tactics
    Search {
        /// Search query (keywords)
        query: Option<String>,

        /// Show only ready tactics (all match dependencies satisfied)
        #[arg(long)]
        ready: bool,

        /// Filter by tactic type
        #[arg(long = "type")]
        tactic_type: Option<String>,

        /// Filter by tags (comma-separated)
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        /// Align with specific goal nodes (comma-separated)
        #[arg(long, value_delimiter = ',')]
        goals: Vec<String>,

        /// Limit number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Show detailed scoring information
        #[arg(short, long)]
        verbose: bool,
    },
    /// Display the dependency graph
    Graph {
        /// Node to start from
        goal_id: Option<String>,

        /// Emit a Mermaid diagram
        #[arg(long)]
        mermaid: bool,
    },
    /// List pending nodes, ready ones first
    Goals {
        /// Emit a Mermaid diagram
        #[arg(long)]
        mermaid: bool,
    },
    /// View the action log
    History {
        /// Maximum number of entries
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only entries newer than this (e.g. 30m, 2h, 1d, 1h30m)
        #[arg(long)]
        since: Option<String>,

        /// Show aggregate counts instead of entries
        #[arg(long)]
        summary: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum NodeCommands {
    /// Add a node
    Add {
        id: String,
        #[arg(id = "node_output", value_name = "OUTPUT")]
        output: String,

        /// Node type (defaults to the config file, then project_artifact)
        #[arg(long = "type")]
        node_type: Option<String>,

        #[arg(long, value_enum, default_value_t = StatusArg::Pending)]
        status: StatusArg,
    },
    /// Set the status of one or more nodes
    Edit {
        #[arg(required = true)]
        ids: Vec<String>,

        #[arg(long, value_enum)]
        status: StatusArg,
    },
    /// Delete one or more nodes and their edges
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,

        /// Delete even if other nodes depend on them
        #[arg(short, long)]
        force: bool,
    },
    /// Show details for one or more nodes
    Show {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Make `to` depend on `from`
    Link { from: String, to: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Pending,
    Complete,
}

impl From<StatusArg> for NodeStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Pending => NodeStatus::Pending,
            StatusArg::Complete => NodeStatus::Complete,
        }
    }
}

/// Runs `cli` and returns what should be printed on stdout.
pub fn run(cli: Cli, config: &Config) -> anyhow::Result<String> {
    let format = cli.output.unwrap_or(config.output);

    if let Commands::Init { name, root_goal } = &cli.command {
        return commands::init(&cli.dir, name.as_deref(), root_goal.as_deref(), format);
    }

    if let Commands::Apply { yes: false, .. } = &cli.command {
        return Err(Error::NotConfirmed.into());
    }

    let mut session = Session::load(&cli.dir)?;
    let output = commands::dispatch(&mut session, cli.command, config, format)?;
    session.save()?;
    Ok(output)
}
