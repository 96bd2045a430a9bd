use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A reusable expansion rule for the project graph.
///
/// Applying a tactic creates either a single node producing `output`, or one
/// node per entry in `subtasks`. Dependencies come in two flavours:
///
/// - `match`: outputs that must already be complete.
/// - `premises`: outputs the tactic wants as context. A premise whose output
///   no node claims yet is introduced as a new pending node on apply.
///
/// Tactics are read-only inputs to apply; nothing in the apply path writes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tactic {
    pub id: String,
    #[serde(rename = "type")]
    pub tactic_type: String,
    pub output: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(rename = "match", default, skip_serializing_if = "Vec::is_empty")]
    pub match_deps: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub premises: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<TacticSubtask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Tactic {
    pub fn new(
        id: impl Into<String>,
        tactic_type: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            tactic_type: tactic_type.into(),
            output: output.into(),
            description: String::new(),
            tags: Vec::new(),
            match_deps: Vec::new(),
            premises: Vec::new(),
            subtasks: Vec::new(),
            data: None,
        }
    }

    /// Whether `output` is listed as a match dependency.
    pub fn matches(&self, output: &str) -> bool {
        self.match_deps.iter().any(|m| m == output)
    }
}

/// One node of a tactic's subtask expansion.
///
/// `depends_on` lists ids of sibling subtasks that must precede this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TacticSubtask {
    pub id: String,
    pub output: String,
    #[serde(rename = "type")]
    pub subtask_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Pre-filter applied before tactics are scored.
///
/// All text comparisons except `tactic_type` are case-insensitive substring
/// matches. Empty fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct TacticFilter {
    /// Exact tactic type.
    pub tactic_type: Option<String>,
    /// A tactic passes if any of its tags contains any of these.
    pub tags: Vec<String>,
    /// A tactic passes if any keyword appears in its id, description or tags.
    pub keywords: Vec<String>,
}

impl TacticFilter {
    pub fn accepts(&self, tactic: &Tactic) -> bool {
        if let Some(tactic_type) = self.tactic_type.as_deref() {
            if tactic.tactic_type != tactic_type {
                return false;
            }
        }

        let tags: Vec<String> = tactic.tags.iter().map(|t| t.to_lowercase()).collect();

        if !self.tags.is_empty() {
            let hit = self.tags.iter().any(|filter| {
                let filter = filter.to_lowercase();
                tags.iter().any(|tag| tag.contains(&filter))
            });
            if !hit {
                return false;
            }
        }

        if !self.keywords.is_empty() {
            let id = tactic.id.to_lowercase();
            let description = tactic.description.to_lowercase();
            let hit = self.keywords.iter().any(|kw| {
                let kw = kw.to_lowercase();
                id.contains(&kw) || description.contains(&kw) || tags.iter().any(|t| t.contains(&kw))
            });
            if !hit {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(id: &str, tags: &[&str]) -> Tactic {
        let mut tactic = Tactic::new(id, "document", format!("{id}.md"));
        tactic.tags = tags.iter().map(|t| t.to_string()).collect();
        tactic
    }

    #[test]
    fn test_empty_filter_accepts_everything() {
        assert!(TacticFilter::default().accepts(&tagged("anything", &[])));
    }

    #[test]
    fn test_type_filter_is_exact() {
        let filter = TacticFilter {
            tactic_type: Some("doc".to_string()),
            ..Default::default()
        };
        assert!(!filter.accepts(&tagged("spec", &[])));
    }

    #[test]
    fn test_tag_filter_matches_substring_case_insensitively() {
        let filter = TacticFilter {
            tags: vec!["PLAN".to_string()],
            ..Default::default()
        };
        assert!(filter.accepts(&tagged("roadmap", &["planning"])));
        assert!(!filter.accepts(&tagged("deploy", &["ops"])));
    }

    #[test]
    fn test_keywords_are_or_across_fields() {
        let mut tactic = tagged("write_spec", &["docs"]);
        tactic.description = "Write a technical specification".to_string();

        let by_description = TacticFilter {
            keywords: vec!["nothing".to_string(), "technical".to_string()],
            ..Default::default()
        };
        assert!(by_description.accepts(&tactic));

        let miss = TacticFilter {
            keywords: vec!["deploy".to_string()],
            ..Default::default()
        };
        assert!(!miss.accepts(&tactic));
    }
}
