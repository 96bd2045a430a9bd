use speculate2::speculate;
use tactician::db::Database;
use tactician::models::*;
use tactician::ranker::{search, SearchQuery};
use tactician::ErrorKind;

fn add(db: &Database, id: &str, output: &str, status: NodeStatus) {
    db.add_node(CreateNodeInput::new(id, "document", output).with_status(status))
        .expect("Failed to add node");
}

fn add_tactic(db: &Database, id: &str, output: &str, match_deps: &[&str]) -> Tactic {
    let mut tactic = Tactic::new(id, "document", output);
    tactic.match_deps = match_deps.iter().map(|s| s.to_string()).collect();
    db.add_tactic(&tactic).expect("Failed to add tactic");
    tactic
}

fn ids(db: &Database, query: &SearchQuery) -> Vec<String> {
    search(db, query)
        .expect("search failed")
        .into_iter()
        .map(|r| r.tactic.id)
        .collect()
}

speculate! {
    before {
        let db = Database::fresh().expect("Failed to create index");

        // spec (complete) -> api (pending) <- design (pending)
        add(&db, "spec", "spec.md", NodeStatus::Complete);
        add(&db, "design", "design.md", NodeStatus::Pending);
        add(&db, "api", "api.md", NodeStatus::Pending);
        db.add_edge("spec", "api").unwrap();
        db.add_edge("design", "api").unwrap();

        add_tactic(&db, "write_design", "design.md", &["spec.md"]);
        add_tactic(&db, "write_tests", "tests.md", &["spec.md"]);
        add_tactic(&db, "deploy", "release", &["api.md"]);
    }

    describe "ordering" {
        it "puts ready tactics first, then critical path, then id" {
            assert_eq!(ids(&db, &SearchQuery::default()), vec!["write_design", "write_tests", "deploy"]);
        }

        it "reports weighted totals and raw sub-scores" {
            let results = search(&db, &SearchQuery::default()).unwrap();

            let design = &results[0].scores;
            assert_eq!(design.readiness, 1000);
            assert_eq!(design.critical_path, 2);
            assert_eq!(design.total, 1100);

            let deploy = &results[2].scores;
            assert_eq!(deploy.readiness, -500);
            assert_eq!(deploy.total, -500);
            assert!(!results[2].dependencies.ready);
        }

        it "scores a partial unblock lower than a full one" {
            db.update_node_status("spec", NodeStatus::Pending).unwrap();
            let results = search(&db, &SearchQuery::default()).unwrap();
            let design = results.iter().find(|r| r.tactic.id == "write_design").unwrap();
            assert_eq!(design.scores.critical_path, 1);
        }

        it "breaks ties by id" {
            add_tactic(&db, "draft_tests", "tests.md", &["spec.md"]);
            let found = ids(&db, &SearchQuery::default());
            assert_eq!(found[1..3], ["draft_tests".to_string(), "write_tests".to_string()]);
        }
    }

    describe "filters" {
        it "drops unready tactics with ready_only" {
            let query = SearchQuery { ready_only: true, ..Default::default() };
            assert_eq!(ids(&db, &query), vec!["write_design", "write_tests"]);
        }

        it "truncates to the limit" {
            let query = SearchQuery { limit: 1, ..Default::default() };
            assert_eq!(ids(&db, &query), vec!["write_design"]);
        }

        it "keeps only keyword hits and scores them" {
            let query = SearchQuery::default().with_text("tests");
            let results = search(&db, &query).unwrap();
            assert_eq!(results.len(), 1);
            assert_eq!(results[0].tactic.id, "write_tests");
            assert_eq!(results[0].scores.keyword, 10);
            assert_eq!(results[0].scores.total, 1100);
        }

        it "filters by exact type" {
            let mut ops = Tactic::new("rollback", "ops", "release");
            ops.tags = vec!["Operations".to_string()];
            db.add_tactic(&ops).unwrap();

            let by_type = SearchQuery { tactic_type: Some("ops".to_string()), ..Default::default() };
            assert_eq!(ids(&db, &by_type), vec!["rollback"]);

            let by_tag = SearchQuery { tags: vec!["operation".to_string()], ..Default::default() };
            assert_eq!(ids(&db, &by_tag), vec!["rollback"]);
        }
    }

    describe "goals" {
        it "favours tactics feeding the goal" {
            add_tactic(&db, "write_api", "api.md", &["spec.md"]);
            let query = SearchQuery { goals: vec!["api".to_string()], ..Default::default() };
            let results = search(&db, &query).unwrap();

            let goal_of = |id: &str| results.iter().find(|r| r.tactic.id == id).unwrap().scores.goal;
            assert_eq!(goal_of("write_api"), 20);
            assert_eq!(goal_of("write_design"), 10);
            assert_eq!(goal_of("write_tests"), 0);
        }

        it "fails with NotFound for an unknown goal" {
            let query = SearchQuery { goals: vec!["ghost".to_string()], ..Default::default() };
            assert_eq!(search(&db, &query).unwrap_err().kind(), ErrorKind::NotFound);
        }
    }
}
