//! The in-memory relational index.
//!
//! A [`Database`] is built fresh for every session from the durable tree and
//! thrown away afterwards. Every query of a session goes through it.

mod schema;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use serde_json::Value;

use crate::error::{Entity, Error, Result};
use crate::models::*;

#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

const NODE_COLUMNS: &str = "n.id, n.type, n.output, n.status, n.created_by, n.created_at,
     n.completed_at, n.parent_tactic, n.introduced_as, n.data";

impl Database {
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self { conn })
    }

    pub fn migrate(&self) -> Result<()> {
        schema::run_migrations(&self.conn)
    }

    /// Opens a fresh in-memory index with the schema applied.
    pub fn fresh() -> Result<Self> {
        let db = Self::open_memory()?;
        db.migrate()?;
        Ok(db)
    }

    /// Runs `f` inside a single transaction. Any error rolls back every write
    /// `f` made through this handle.
    pub fn transaction<T>(&self, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }

    // ============================================================
    // Project operations
    // ============================================================

    pub fn get_project_meta(&self) -> Result<ProjectMeta> {
        let mut meta = ProjectMeta::default();
        let mut stmt = self.conn.prepare("SELECT key, value FROM project")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let key: String = row.get(0)?;
            let value: String = row.get(1)?;
            match key.as_str() {
                "name" => meta.name = value,
                "root_goal" => meta.root_goal = value,
                _ => {}
            }
        }
        Ok(meta)
    }

    pub fn set_project_meta(&self, meta: &ProjectMeta) -> Result<()> {
        for (key, value) in [("name", &meta.name), ("root_goal", &meta.root_goal)] {
            self.conn.execute(
                "INSERT INTO project (key, value) VALUES (?, ?)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                (key, value),
            )?;
        }
        Ok(())
    }

    // ============================================================
    // Node operations
    // ============================================================

    pub fn add_node(&self, input: CreateNodeInput) -> Result<Node> {
        if self.node_exists(&input.id)? {
            return Err(Error::Conflict {
                entity: Entity::Node,
                ids: vec![input.id],
            });
        }

        let now = Utc::now();
        let status = input.status.unwrap_or_default();
        // A recorded node (one that carries its creation time) keeps exactly the
        // completion time it was recorded with.
        let completed_at = match (input.created_at, status) {
            (Some(_), _) => input.completed_at,
            (None, NodeStatus::Complete) => Some(input.completed_at.unwrap_or(now)),
            (None, NodeStatus::Pending) => None,
        };

        let node = Node {
            id: input.id,
            node_type: input.node_type,
            output: input.output,
            status,
            created_by: input.created_by,
            created_at: input.created_at.unwrap_or(now),
            completed_at,
            parent_tactic: input.parent_tactic,
            introduced_as: input.introduced_as,
            data: input.data,
        };

        self.conn.execute(
            "INSERT INTO nodes (id, type, output, status, created_by, created_at, completed_at,
                                parent_tactic, introduced_as, data)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                &node.id,
                &node.node_type,
                &node.output,
                node.status.as_str(),
                &node.created_by,
                format_datetime(&node.created_at),
                node.completed_at.as_ref().map(format_datetime),
                &node.parent_tactic,
                &node.introduced_as,
                encode_json(node.data.as_ref())?,
            ),
        )?;

        tracing::debug!(node = %node.id, output = %node.output, "inserted node");
        Ok(node)
    }

    pub fn get_node(&self, id: &str) -> Result<Option<Node>> {
        let node = self
            .conn
            .query_row(
                &format!("SELECT {NODE_COLUMNS} FROM nodes n WHERE n.id = ?"),
                [id],
                node_from_row,
            )
            .optional()?;
        Ok(node)
    }

    pub fn require_node(&self, id: &str) -> Result<Node> {
        self.get_node(id)?.ok_or_else(|| Error::node_not_found(id))
    }

    pub fn node_exists(&self, id: &str) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM nodes WHERE id = ?", [id], |row| {
                row.get(0)
            })?;
        Ok(count > 0)
    }

    pub fn get_all_nodes(&self) -> Result<Vec<Node>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {NODE_COLUMNS} FROM nodes n ORDER BY n.id"))?;
        let nodes = stmt
            .query_map([], node_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(nodes)
    }

    /// Sets the stored status. Completing stamps `completed_at`; reverting to
    /// pending clears it. Setting the status a node already has is a no-op.
    pub fn update_node_status(&self, id: &str, status: NodeStatus) -> Result<Node> {
        let mut node = self.require_node(id)?;
        if node.status == status {
            return Ok(node);
        }

        node.status = status;
        node.completed_at = match status {
            NodeStatus::Complete => Some(Utc::now()),
            NodeStatus::Pending => None,
        };

        self.conn.execute(
            "UPDATE nodes SET status = ?, completed_at = ? WHERE id = ?",
            (
                status.as_str(),
                node.completed_at.as_ref().map(format_datetime),
                id,
            ),
        )?;

        Ok(node)
    }

    /// Deletes the node and, through the foreign keys, every edge touching it.
    pub fn delete_node(&self, id: &str) -> Result<bool> {
        let rows = self.conn.execute("DELETE FROM nodes WHERE id = ?", [id])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Edge operations
    // ============================================================

    /// Adds `source -> target`. Returns `false` when the pair already existed.
    pub fn add_edge(&self, source: &str, target: &str) -> Result<bool> {
        for id in [source, target] {
            if !self.node_exists(id)? {
                return Err(Error::node_not_found(id));
            }
        }
        if source == target {
            return Err(Error::InvalidInput(format!(
                "node {source} cannot depend on itself"
            )));
        }

        let rows = self.conn.execute(
            "INSERT OR IGNORE INTO edges (source_node_id, target_node_id) VALUES (?, ?)",
            (source, target),
        )?;
        Ok(rows > 0)
    }

    /// All edges, sorted by (prerequisite, dependent).
    pub fn get_edges(&self) -> Result<Vec<Edge>> {
        let mut stmt = self.conn.prepare(
            "SELECT source_node_id, target_node_id FROM edges
             ORDER BY source_node_id, target_node_id",
        )?;
        let edges = stmt
            .query_map([], |row| {
                Ok(Edge {
                    source: row.get(0)?,
                    target: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(edges)
    }

    /// The direct prerequisites of `id`.
    pub fn get_dependencies(&self, id: &str) -> Result<Vec<Node>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {NODE_COLUMNS} FROM edges e
             JOIN nodes n ON n.id = e.source_node_id
             WHERE e.target_node_id = ?
             ORDER BY n.id"
        ))?;
        let nodes = stmt
            .query_map([id], node_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(nodes)
    }

    /// The direct dependents of `id`, i.e. the nodes it blocks.
    pub fn get_blocked_by(&self, id: &str) -> Result<Vec<Node>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {NODE_COLUMNS} FROM edges e
             JOIN nodes n ON n.id = e.target_node_id
             WHERE e.source_node_id = ?
             ORDER BY n.id"
        ))?;
        let nodes = stmt
            .query_map([id], node_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(nodes)
    }

    // ============================================================
    // Action log operations
    // ============================================================

    pub fn log_action(&self, input: LogActionInput) -> Result<ActionLogEntry> {
        let entry = ActionLogEntry {
            id: 0,
            timestamp: Utc::now(),
            action: input.action.as_str().to_string(),
            details: input.details,
            node_id: input.node_id,
            tactic_id: input.tactic_id,
        };
        self.append_action_entry(entry)
    }

    /// Appends a pre-built entry, keeping its timestamp. Used when importing
    /// the durable log.
    pub fn append_action_entry(&self, mut entry: ActionLogEntry) -> Result<ActionLogEntry> {
        self.conn.execute(
            "INSERT INTO action_log (timestamp, action, details, node_id, tactic_id)
             VALUES (?, ?, ?, ?, ?)",
            (
                format_datetime(&entry.timestamp),
                &entry.action,
                &entry.details,
                &entry.node_id,
                &entry.tactic_id,
            ),
        )?;
        entry.id = self.conn.last_insert_rowid();
        Ok(entry)
    }

    /// Log entries, newest first. Entries sharing a timestamp keep the reverse
    /// of their insertion order.
    pub fn get_action_log(
        &self,
        limit: Option<usize>,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<ActionLogEntry>> {
        let since = since.as_ref().map(format_datetime);
        // SQLite treats a negative LIMIT as unbounded.
        let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));

        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp, action, details, node_id, tactic_id FROM action_log
             WHERE ?1 IS NULL OR timestamp >= ?1
             ORDER BY timestamp DESC, id DESC
             LIMIT ?2",
        )?;
        let entries = stmt
            .query_map((since, limit), |row| {
                Ok(ActionLogEntry {
                    id: row.get(0)?,
                    timestamp: parse_datetime(row, 1)?,
                    action: row.get(2)?,
                    details: row.get(3)?,
                    node_id: row.get(4)?,
                    tactic_id: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn get_session_summary(&self, since: Option<DateTime<Utc>>) -> Result<SessionSummary> {
        let entries = self.get_action_log(None, since)?;
        Ok(SessionSummary::from_entries(&entries))
    }

    // ============================================================
    // Tactic operations
    // ============================================================

    pub fn add_tactic(&self, tactic: &Tactic) -> Result<()> {
        if self.get_tactic(&tactic.id)?.is_some() {
            return Err(Error::Conflict {
                entity: Entity::Tactic,
                ids: vec![tactic.id.clone()],
            });
        }

        self.transaction(|db| {
            db.conn.execute(
                "INSERT INTO tactics (id, type, output, description, tags, data)
                 VALUES (?, ?, ?, ?, ?, ?)",
                (
                    &tactic.id,
                    &tactic.tactic_type,
                    &tactic.output,
                    &tactic.description,
                    serde_json::to_string(&tactic.tags)?,
                    encode_json(tactic.data.as_ref())?,
                ),
            )?;

            let deps = tactic
                .match_deps
                .iter()
                .map(|o| ("match", o))
                .chain(tactic.premises.iter().map(|o| ("premise", o)));
            for (position, (kind, output)) in deps.enumerate() {
                db.conn.execute(
                    "INSERT INTO tactic_dependencies (tactic_id, dependency_type, output, position)
                     VALUES (?, ?, ?, ?)",
                    (&tactic.id, kind, output, position as i64),
                )?;
            }

            for (position, subtask) in tactic.subtasks.iter().enumerate() {
                db.conn.execute(
                    "INSERT INTO tactic_subtasks
                        (tactic_id, subtask_id, output, type, depends_on, data, position)
                     VALUES (?, ?, ?, ?, ?, ?, ?)",
                    (
                        &tactic.id,
                        &subtask.id,
                        &subtask.output,
                        &subtask.subtask_type,
                        serde_json::to_string(&subtask.depends_on)?,
                        encode_json(subtask.data.as_ref())?,
                        position as i64,
                    ),
                )?;
            }
            Ok(())
        })
    }

    pub fn get_tactic(&self, id: &str) -> Result<Option<Tactic>> {
        let tactic = self
            .conn
            .query_row(
                "SELECT id, type, output, description, tags, data FROM tactics WHERE id = ?",
                [id],
                |row| {
                    Ok(Tactic {
                        id: row.get(0)?,
                        tactic_type: row.get(1)?,
                        output: row.get(2)?,
                        description: row.get(3)?,
                        tags: decode_json(row, 4)?.unwrap_or_default(),
                        match_deps: Vec::new(),
                        premises: Vec::new(),
                        subtasks: Vec::new(),
                        data: decode_json(row, 5)?,
                    })
                },
            )
            .optional()?;

        let Some(mut tactic) = tactic else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT dependency_type, output FROM tactic_dependencies
             WHERE tactic_id = ? ORDER BY position",
        )?;
        let mut rows = stmt.query([id])?;
        while let Some(row) = rows.next()? {
            let kind: String = row.get(0)?;
            let output: String = row.get(1)?;
            if kind == "match" {
                tactic.match_deps.push(output);
            } else {
                tactic.premises.push(output);
            }
        }

        let mut stmt = self.conn.prepare(
            "SELECT subtask_id, output, type, depends_on, data FROM tactic_subtasks
             WHERE tactic_id = ? ORDER BY position",
        )?;
        tactic.subtasks = stmt
            .query_map([id], |row| {
                Ok(TacticSubtask {
                    id: row.get(0)?,
                    output: row.get(1)?,
                    subtask_type: row.get(2)?,
                    depends_on: decode_json(row, 3)?.unwrap_or_default(),
                    data: decode_json(row, 4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(tactic))
    }

    pub fn require_tactic(&self, id: &str) -> Result<Tactic> {
        self.get_tactic(id)?.ok_or_else(|| Error::NotFound {
            entity: Entity::Tactic,
            id: id.to_string(),
        })
    }

    /// All tactics, sorted by id.
    pub fn get_all_tactics(&self) -> Result<Vec<Tactic>> {
        let mut stmt = self.conn.prepare("SELECT id FROM tactics ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut tactics = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(tactic) = self.get_tactic(&id)? {
                tactics.push(tactic);
            }
        }
        Ok(tactics)
    }

    pub fn search_tactics(&self, filter: &TacticFilter) -> Result<Vec<Tactic>> {
        let tactics = self.get_all_tactics()?;
        Ok(tactics.into_iter().filter(|t| filter.accepts(t)).collect())
    }
}

fn node_from_row(row: &Row<'_>) -> rusqlite::Result<Node> {
    let status: String = row.get(3)?;
    let status = NodeStatus::from_str(&status)
        .ok_or_else(|| conversion_error(3, format!("unknown node status: {status}")))?;

    let completed_at = match row.get::<_, Option<String>>(6)? {
        Some(_) => Some(parse_datetime(row, 6)?),
        None => None,
    };

    Ok(Node {
        id: row.get(0)?,
        node_type: row.get(1)?,
        output: row.get(2)?,
        status,
        created_by: row.get(4)?,
        created_at: parse_datetime(row, 5)?,
        completed_at,
        parent_tactic: row.get(7)?,
        introduced_as: row.get(8)?,
        data: decode_json(row, 9)?,
    })
}

// Fixed-width so that lexicographic order in SQL is chronological order.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_datetime(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn encode_json(value: Option<&Value>) -> Result<Option<String>> {
    Ok(value.map(serde_json::to_string).transpose()?)
}

fn decode_json<T: serde::de::DeserializeOwned>(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<T>> {
    let Some(raw) = row.get::<_, Option<String>>(idx)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}
