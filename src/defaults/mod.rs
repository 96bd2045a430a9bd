//! The tactic library bundled into the binary and seeded by `init`.

use crate::error::{Error, Result};
use crate::models::Tactic;

const DEFAULT_TACTICS_YAML: &str = include_str!("default-tactics.yaml");

pub fn default_tactics() -> Result<Vec<Tactic>> {
    serde_yaml::from_str(DEFAULT_TACTICS_YAML)
        .map_err(|e| Error::yaml("parse", "<bundled default-tactics.yaml>", e))
}
