//! Tactician tracks a project as a graph of nodes joined by dependency edges,
//! and grows that graph by applying tactics whose dependencies are met.
//!
//! The durable tree on disk is the source of truth. Each command loads it into
//! a fresh in-memory [`db::Database`], works against that index, and writes it
//! back through [`store::Session::save`] only if something changed.

pub mod apply;
pub mod cli;
pub mod config;
pub mod db;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod models;
pub mod nodes;
pub mod ranker;
pub mod render;
pub mod since;
pub mod store;
pub mod views;

pub use error::{Entity, Error, ErrorKind, Result};
