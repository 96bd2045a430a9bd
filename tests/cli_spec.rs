use std::path::Path;

use clap::Parser;
use speculate2::speculate;
use tactician::cli::{run, Cli};
use tactician::config::Config;
use tactician::store::disk;
use tempfile::TempDir;

fn tactician(dir: &Path, args: &[&str]) -> anyhow::Result<String> {
    let dir = dir.to_string_lossy().to_string();
    let mut argv = vec!["tactician", "--dir", dir.as_str()];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv)?;
    run(cli, &Config::default())
}

speculate! {
    before {
        let tmp = TempDir::new().expect("Failed to create temp dir");
        let dir = tmp.path().join(".tactician");
        tactician(&dir, &["init", "--name", "demo"]).expect("init failed");
    }

    describe "init" {
        it "reports an update on the second run" {
            let out = tactician(&dir, &["init"]).unwrap();
            assert!(out.starts_with("Updated project demo"));
        }
    }

    describe "node" {
        it "adds a node with the configured default type" {
            let out = tactician(&dir, &["node", "add", "spec", "spec.md"]).unwrap();
            assert_eq!(out, "Created node spec\n");

            let shown = tactician(&dir, &["-o", "json", "node", "show", "spec"]).unwrap();
            let parsed: serde_json::Value = serde_json::from_str(&shown).unwrap();
            assert_eq!(parsed[0]["type"], "project_artifact");
            assert_eq!(parsed[0]["live_status"], "ready");
        }

        it "leaves the tree untouched when a command fails" {
            let before = std::fs::read_to_string(dir.join(disk::PROJECT_FILE)).unwrap();
            assert!(tactician(&dir, &["node", "edit", "ghost", "--status", "complete"]).is_err());
            assert_eq!(std::fs::read_to_string(dir.join(disk::PROJECT_FILE)).unwrap(), before);
        }
    }

    describe "apply" {
        it "requires --yes" {
            let err = tactician(&dir, &["apply", "gather_requirements"]).unwrap_err();
            assert!(err.to_string().contains("--yes"));
        }

        it "asks for --yes before looking for a project" {
            let missing = tmp.path().join("nowhere");
            let err = tactician(&missing, &["apply", "gather_requirements"]).unwrap_err();

            let err = err.downcast::<tactician::Error>().unwrap();
            assert!(matches!(err, tactician::Error::NotConfirmed));
            assert!(!missing.exists());
        }

        it "persists the new nodes across invocations" {
            let out = tactician(&dir, &["apply", "gather_requirements", "--yes"]).unwrap();
            assert!(out.contains("Created nodes: requirements_document"));

            let goals = tactician(&dir, &["goals"]).unwrap();
            assert!(goals.contains("requirements_document"));
        }
    }

    describe "search" {
        it "lists ready tactics first" {
            let out = tactician(&dir, &["-o", "json", "search", "--ready"]).unwrap();
            let rows: Vec<serde_json::Value> = serde_json::from_str(&out).unwrap();
            assert_eq!(rows[0]["id"], "gather_requirements");
            assert!(rows.iter().all(|r| r["ready"] == true));
            assert!(rows[0].get("scores").is_none());
        }

        it "includes scores when verbose" {
            let out = tactician(&dir, &["-o", "json", "search", "requirements", "-v"]).unwrap();
            let rows: Vec<serde_json::Value> = serde_json::from_str(&out).unwrap();
            assert_eq!(rows[0]["scores"]["readiness"], 1000);
        }
    }

    describe "graph" {
        it "says so when the project is empty" {
            assert_eq!(tactician(&dir, &["graph"]).unwrap(), "No nodes in project yet.\n");
        }

        it "renders a mermaid diagram" {
            tactician(&dir, &["node", "add", "spec", "spec.md"]).unwrap();
            let out = tactician(&dir, &["graph", "--mermaid"]).unwrap();
            assert!(out.starts_with("graph TD"));
        }
    }

    describe "history" {
        it "rejects a malformed duration" {
            assert!(tactician(&dir, &["history", "--since", "soon"]).is_err());
        }

        it "summarizes recorded actions" {
            tactician(&dir, &["node", "add", "spec", "spec.md"]).unwrap();
            let out = tactician(&dir, &["-o", "json", "history", "--summary"]).unwrap();
            let summary: serde_json::Value = serde_json::from_str(&out).unwrap();
            assert_eq!(summary["nodes_created"], 1);
        }
    }
}
