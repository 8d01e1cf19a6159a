use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

use crate::core::call_graph::{CallEdge, FrequencyTable};

/// Characters Mermaid does not accept in a node id
fn node_id_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"[^A-Za-z0-9_]").ok())
        .as_ref()
}

/// Prefixed so reserved words such as `end` never appear as a bare id
fn node_id(name: &str) -> String {
    let sanitized = match node_id_pattern() {
        Some(re) => re.replace_all(name, "_").into_owned(),
        None => name.replace(['.', '<', '>'], "_"),
    };
    format!("n_{}", sanitized)
}

/// One id per distinct name; names that sanitize alike get a numeric suffix
struct NodeIds<'a> {
    assigned: HashMap<&'a str, String>,
    taken: HashSet<String>,
}

impl<'a> NodeIds<'a> {
    fn new() -> Self {
        Self {
            assigned: HashMap::new(),
            taken: HashSet::new(),
        }
    }

    fn id_for(&mut self, name: &'a str) -> String {
        if let Some(id) = self.assigned.get(name) {
            return id.clone();
        }

        let base = node_id(name);
        let mut id = base.clone();
        let mut suffix = 2;
        while self.taken.contains(&id) {
            id = format!("{}_{}", base, suffix);
            suffix += 1;
        }

        self.taken.insert(id.clone());
        self.assigned.insert(name, id.clone());
        id
    }
}

/// Call graph as a Mermaid flowchart.
///
/// Self-calls and module-level calls are left out; the remaining distinct
/// caller/callee pairs are ranked by frequency and capped at `max_edges`.
pub fn render_mermaid(calls: &[CallEdge], max_edges: usize) -> String {
    let mut lines = vec![
        "graph TD".to_string(),
        "    %% Call Graph - Who calls whom".to_string(),
        "    %% Arrows point from caller to callee".to_string(),
        String::new(),
    ];

    let edge_counts: FrequencyTable<(&str, &str)> = calls
        .iter()
        .filter(|call| !call.is_self_call() && !call.is_module_level())
        .map(|call| (call.caller.as_str(), call.callee.as_str()))
        .collect();
    let edges = edge_counts.ranked(max_edges);
    let mut ids = NodeIds::new();

    for &((caller, callee), count) in &edges {
        let caller_id = ids.id_for(caller);
        let callee_id = ids.id_for(callee);

        if count > 1 {
            lines.push(format!(
                "    {}[{}] -->|{}x| {}[{}]",
                caller_id, caller, count, callee_id, callee
            ));
        } else {
            lines.push(format!("    {}[{}] --> {}[{}]", caller_id, caller, callee_id, callee));
        }
    }

    if edges.is_empty() {
        lines.push("    NoRelationships[No call relationships found]".to_string());
    }

    lines.join("\n")
}
