use speculate2::speculate;
use tactician::db::Database;
use tactician::engine::{compute_node_status, LiveStatus};
use tactician::models::*;
use tactician::{nodes, Error, ErrorKind};

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

speculate! {
    before {
        let db = Database::fresh().expect("Failed to create index");
        for id in ["spec", "design", "api"] {
            nodes::add_node(&db, CreateNodeInput::new(id, "document", format!("{id}.md"))).unwrap();
        }
        nodes::link_nodes(&db, "spec", "design").unwrap();
        nodes::link_nodes(&db, "design", "api").unwrap();
    }

    describe "edit" {
        it "unblocks dependents once prerequisites complete" {
            assert_eq!(compute_node_status(&db, "design").unwrap(), LiveStatus::Blocked);
            nodes::edit_status(&db, &ids(&["spec"]), NodeStatus::Complete).unwrap();
            assert_eq!(compute_node_status(&db, "design").unwrap(), LiveStatus::Ready);
            assert_eq!(compute_node_status(&db, "api").unwrap(), LiveStatus::Blocked);
        }

        it "clears the completion time when reopened" {
            let done = nodes::edit_status(&db, &ids(&["spec"]), NodeStatus::Complete).unwrap();
            assert!(done[0].completed_at.is_some());

            let reopened = nodes::edit_status(&db, &ids(&["spec"]), NodeStatus::Pending).unwrap();
            assert!(reopened[0].completed_at.is_none());
            assert_eq!(db.get_action_log(Some(1), None).unwrap()[0].action, "node_updated");
        }
    }

    describe "delete" {
        it "refuses to delete a node that blocks others" {
            let edges = db.get_edges().unwrap();
            let err = nodes::delete_nodes(&db, &ids(&["spec"]), false).unwrap_err();

            assert_eq!(err.kind(), ErrorKind::FailedPrecondition);
            match err {
                Error::BlocksDependents { dependents, .. } => assert_eq!(dependents, ids(&["design"])),
                other => panic!("unexpected error: {other}"),
            }
            assert!(db.node_exists("spec").unwrap());
            assert_eq!(db.get_edges().unwrap(), edges);
        }

        it "refuses a batch that contains the node's own dependents" {
            let edges = db.get_edges().unwrap();
            let err = nodes::delete_nodes(&db, &ids(&["design", "api"]), false).unwrap_err();

            assert_eq!(err.kind(), ErrorKind::FailedPrecondition);
            assert!(db.node_exists("design").unwrap());
            assert!(db.node_exists("api").unwrap());
            assert_eq!(db.get_edges().unwrap(), edges);
        }

        it "deletes with force and cascades edges" {
            let deleted = nodes::delete_nodes(&db, &ids(&["design"]), true).unwrap();
            assert_eq!(deleted, ids(&["design"]));
            assert!(db.get_edges().unwrap().is_empty());
            assert_eq!(compute_node_status(&db, "api").unwrap(), LiveStatus::Ready);

            let log = db.get_action_log(Some(1), None).unwrap();
            assert_eq!(log[0].details.as_deref(), Some("Deleted node: design"));
        }

        it "fails on an unknown id before deleting anything" {
            let err = nodes::delete_nodes(&db, &ids(&["api", "ghost"]), false).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound);
            assert!(db.node_exists("api").unwrap());
        }
    }

    describe "link" {
        it "rejects an edge from a node to itself" {
            let err = nodes::link_nodes(&db, "api", "api").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }

        it "logs the new edge" {
            assert!(nodes::link_nodes(&db, "spec", "api").unwrap());
            let log = db.get_action_log(Some(1), None).unwrap();
            assert_eq!(log[0].action, "edge_added");
            assert_eq!(log[0].details.as_deref(), Some("Linked spec -> api"));
        }
    }

    describe "views" {
        it "lists pending goals with ready ones first" {
            let goals: Vec<_> = tactician::views::goals(&db).unwrap().into_iter().map(|v| v.node.id).collect();
            assert_eq!(goals, vec!["spec", "api", "design"]);
        }

        it "builds the dependency tree from the node without prerequisites" {
            let root = tactician::views::resolve_root(&db, None).unwrap();
            assert_eq!(root.as_deref(), Some("spec"));

            let tree = tactician::views::dependency_tree(&db, "spec").unwrap();
            assert_eq!(tree.status, LiveStatus::Ready);
            assert_eq!(tree.children[0].id, "design");
            assert_eq!(tree.children[0].children[0].id, "api");
        }

        it "fails with NotFound for an unknown goal" {
            let err = tactician::views::resolve_root(&db, Some("ghost")).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound);
        }
    }
}
