//! One-file-per-tactic storage under `tactics/`.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::models::Tactic;
use crate::store::disk::{tactics_dir_path, write_yaml};

fn tactic_file_stem(path: &Path) -> Option<&str> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => path.file_stem().and_then(|s| s.to_str()),
        _ => None,
    }
}

/// Tactic files in `<dir>/tactics`, sorted by file name.
fn tactic_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let tactics_dir = tactics_dir_path(dir);
    let entries = match fs::read_dir(&tactics_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::io("read", tactics_dir, e)),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io("read", &tactics_dir, e))?;
        let path = entry.path();
        if path.is_file() && tactic_file_stem(&path).is_some() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub fn read_tactics_dir(dir: &Path) -> Result<Vec<Tactic>> {
    let mut tactics = Vec::new();
    for path in tactic_files(dir)? {
        let raw = fs::read_to_string(&path).map_err(|e| Error::io("read", &path, e))?;
        let tactic: Tactic =
            serde_yaml::from_str(&raw).map_err(|e| Error::yaml("parse", &path, e))?;
        validate_id(&path, &tactic.id)?;
        tactics.push(tactic);
    }
    Ok(tactics)
}

fn validate_id(path: &Path, id: &str) -> Result<()> {
    let reason = if id.trim().is_empty() {
        "missing id"
    } else if id.contains(|c: char| c == '/' || c == '\\') || id == "." || id == ".." {
        "id is not a valid file name"
    } else {
        return Ok(());
    };
    Err(Error::InvalidTacticFile {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    })
}

pub fn write_tactic_file(dir: &Path, tactic: &Tactic) -> Result<()> {
    let path = tactics_dir_path(dir).join(format!("{}.yaml", tactic.id));
    validate_id(&path, &tactic.id)?;
    write_yaml(&path, tactic)
}

/// Mirrors `tactics` into `<dir>/tactics`: writes every tactic and removes
/// tactic files whose id is not among them.
pub fn write_tactics_dir(dir: &Path, tactics: &[Tactic]) -> Result<()> {
    let tactics_dir = tactics_dir_path(dir);
    fs::create_dir_all(&tactics_dir).map_err(|e| Error::io("create", &tactics_dir, e))?;

    let wanted: HashSet<String> = tactics.iter().map(|t| format!("{}.yaml", t.id)).collect();
    for path in tactic_files(dir)? {
        let keep = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| wanted.contains(name));
        if !keep {
            tracing::debug!(path = %path.display(), "removing stale tactic file");
            fs::remove_file(&path).map_err(|e| Error::io("remove", &path, e))?;
        }
    }

    for tactic in tactics {
        write_tactic_file(dir, tactic)?;
    }
    Ok(())
}

/// Writes each tactic whose `<id>.yaml` does not exist yet. Existing files are
/// never touched. Returns the ids that were written.
pub fn seed_tactics_if_missing(dir: &Path, tactics: &[Tactic]) -> Result<Vec<String>> {
    let tactics_dir = tactics_dir_path(dir);
    fs::create_dir_all(&tactics_dir).map_err(|e| Error::io("create", &tactics_dir, e))?;

    let mut seeded = Vec::new();
    for tactic in tactics {
        let yaml = tactics_dir.join(format!("{}.yaml", tactic.id));
        let yml = tactics_dir.join(format!("{}.yml", tactic.id));
        if yaml.exists() || yml.exists() {
            continue;
        }
        write_tactic_file(dir, tactic)?;
        seeded.push(tactic.id.clone());
    }
    Ok(seeded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(tactics_dir_path(dir.path())).unwrap();
        dir
    }

    #[test]
    fn test_reads_yaml_and_yml_in_name_order() {
        let dir = setup();
        let tactics = tactics_dir_path(dir.path());
        fs::write(tactics.join("b.yml"), "id: b\ntype: doc\noutput: b.md\n").unwrap();
        fs::write(tactics.join("a.yaml"), "id: a\ntype: doc\noutput: a.md\n").unwrap();
        fs::write(tactics.join("README.txt"), "ignored").unwrap();

        let ids: Vec<_> = read_tactics_dir(dir.path())
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_missing_tactics_dir_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        assert!(read_tactics_dir(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_blank_id_is_rejected() {
        let dir = setup();
        fs::write(
            tactics_dir_path(dir.path()).join("x.yaml"),
            "id: ''\ntype: doc\noutput: x.md\n",
        )
        .unwrap();
        let err = read_tactics_dir(dir.path()).unwrap_err();
        assert!(matches!(err, Error::InvalidTacticFile { .. }));
    }

    #[test]
    fn test_seed_never_overwrites() {
        let dir = setup();
        let path = tactics_dir_path(dir.path()).join("a.yaml");
        fs::write(&path, "id: a\ntype: edited\noutput: a.md\n").unwrap();

        let seeded = seed_tactics_if_missing(
            dir.path(),
            &[Tactic::new("a", "doc", "a.md"), Tactic::new("b", "doc", "b.md")],
        )
        .unwrap();

        assert_eq!(seeded, vec!["b"]);
        assert!(fs::read_to_string(&path).unwrap().contains("edited"));
    }
}
