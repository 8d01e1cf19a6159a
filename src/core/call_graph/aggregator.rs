// src/core/call_graph/aggregator.rs - frequency ranking and batch summary
use std::cmp::Reverse;
use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use super::CallEdge;
use crate::core::entity::{Entity, EntityCatalog, EntityKind};

/// Length of the `most_called` / `most_calling` rankings
pub const RANKING_LIMIT: usize = 10;

/// Aggregate statistics over one analysis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_calls: usize,
    pub total_functions: usize,
    pub total_classes: usize,
    pub unique_callees: usize,
    /// Hotspots: callees ranked by how often they are invoked
    pub most_called: Vec<(String, usize)>,
    /// Orchestrators: callers ranked by fan-out
    pub most_calling: Vec<(String, usize)>,
}

/// Occurrence counter that remembers first-insertion order.
///
/// Ranking sorts on `(descending count, insertion index)`, so equal counts
/// keep the order in which keys were first seen.
#[derive(Debug, Clone)]
pub struct FrequencyTable<K> {
    index: HashMap<K, usize>,
    entries: Vec<(K, usize)>,
}

impl<K: Eq + Hash + Clone> FrequencyTable<K> {
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    pub fn record(&mut self, key: K) {
        match self.index.get(&key) {
            Some(&slot) => self.entries[slot].1 += 1,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, 1));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `limit` most frequent keys, ties in first-seen order
    pub fn ranked(&self, limit: usize) -> Vec<(K, usize)> {
        let mut ordered: Vec<(usize, &(K, usize))> = self.entries.iter().enumerate().collect();
        ordered.sort_by_key(|(position, (_, count))| (Reverse(*count), *position));
        ordered
            .into_iter()
            .take(limit)
            .map(|(_, (key, count))| (key.clone(), *count))
            .collect()
    }
}

impl<K: Eq + Hash + Clone> Default for FrequencyTable<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone> FromIterator<K> for FrequencyTable<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut table = Self::new();
        for key in iter {
            table.record(key);
        }
        table
    }
}

/// Reduces the batch's call edges and entity catalog into a [`Summary`]
pub struct RelationshipAggregator;

impl RelationshipAggregator {
    /// `calls` must be in canonical file order; it decides tie-breaks.
    ///
    /// # Panics
    /// On an edge with an empty caller or callee, which only a walker bug can produce.
    pub fn summarize(calls: &[CallEdge], entities: &EntityCatalog) -> Summary {
        let mut callee_counts = FrequencyTable::new();
        let mut caller_counts = FrequencyTable::new();

        for call in calls {
            assert!(
                !call.caller.is_empty() && !call.callee.is_empty(),
                "malformed call edge at {}:{}",
                call.file,
                call.line
            );
            callee_counts.record(call.callee.as_str());
            caller_counts.record(call.caller.as_str());
        }

        let (total_classes, total_functions) = Self::count_entities(entities.values().flatten());

        Summary {
            total_calls: calls.len(),
            total_functions,
            total_classes,
            unique_callees: callee_counts.len(),
            most_called: owned(callee_counts.ranked(RANKING_LIMIT)),
            most_calling: owned(caller_counts.ranked(RANKING_LIMIT)),
        }
    }

    /// Methods are counted through their class's `method_count`
    fn count_entities<'a>(entities: impl Iterator<Item = &'a Entity>) -> (usize, usize) {
        let mut classes = 0;
        let mut functions = 0;

        for entity in entities {
            match entity.kind {
                EntityKind::Class => {
                    classes += 1;
                    functions += entity.method_count;
                }
                EntityKind::Function => functions += 1,
            }
        }

        (classes, functions)
    }
}

fn owned(ranked: Vec<(&str, usize)>) -> Vec<(String, usize)> {
    ranked
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::call_graph::MODULE_SCOPE;

    fn call(caller: &str, callee: &str, line: usize) -> CallEdge {
        CallEdge {
            caller: caller.to_string(),
            callee: callee.to_string(),
            file: "pkg/a.py".to_string(),
            line,
        }
    }

    fn entity(kind: EntityKind, name: &str, method_count: usize) -> Entity {
        Entity {
            kind,
            name: name.to_string(),
            line: 1,
            file: "pkg/a.py".to_string(),
            bases: Vec::new(),
            method_count,
            decorators: Vec::new(),
            docstring: None,
        }
    }

    fn pairs(items: &[(&str, usize)]) -> Vec<(String, usize)> {
        items.iter().map(|(n, c)| (n.to_string(), *c)).collect()
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let calls = vec![
            call("main", "A", 1),
            call("main", "B", 2),
            call("main", "B", 3),
            call("main", "A", 4),
            call("main", "A", 5),
            call("main", "B", 6),
        ];
        let summary = RelationshipAggregator::summarize(&calls, &EntityCatalog::new());
        assert_eq!(summary.most_called, pairs(&[("A", 3), ("B", 3)]));

        // Same counts, B seen first
        let mut reordered = calls.clone();
        reordered.swap(0, 1);
        let summary = RelationshipAggregator::summarize(&reordered, &EntityCatalog::new());
        assert_eq!(summary.most_called, pairs(&[("B", 3), ("A", 3)]));
    }

    #[test]
    fn test_ranking_is_descending_and_truncated() {
        let mut calls = Vec::new();
        for i in 0..12 {
            for _ in 0..=i {
                calls.push(call("driver", &format!("f{}", i), 1));
            }
        }
        let summary = RelationshipAggregator::summarize(&calls, &EntityCatalog::new());
        assert_eq!(summary.most_called.len(), RANKING_LIMIT);
        assert_eq!(summary.most_called[0], ("f11".to_string(), 12));
        assert_eq!(summary.most_called[9], ("f2".to_string(), 3));
        assert_eq!(summary.unique_callees, 12);
        assert_eq!(summary.most_calling, pairs(&[("driver", 78)]));
    }

    #[test]
    fn test_repeated_edges_all_count() {
        let calls = vec![
            call(MODULE_SCOPE, "run", 3),
            call(MODULE_SCOPE, "run", 3),
            call("run", "run", 7),
        ];
        let summary = RelationshipAggregator::summarize(&calls, &EntityCatalog::new());
        assert_eq!(summary.total_calls, 3);
        assert_eq!(summary.unique_callees, 1);
        assert_eq!(summary.most_called, pairs(&[("run", 3)]));
        assert_eq!(summary.most_calling, pairs(&[(MODULE_SCOPE, 2), ("run", 1)]));
    }

    #[test]
    fn test_summary_is_deterministic() {
        let calls: Vec<CallEdge> = (0..200)
            .map(|i| call(&format!("c{}", i % 7), &format!("f{}", i % 13), i))
            .collect();
        let first = RelationshipAggregator::summarize(&calls, &EntityCatalog::new());
        let second = RelationshipAggregator::summarize(&calls, &EntityCatalog::new());
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_entity_totals_use_method_count() {
        let mut catalog = EntityCatalog::new();
        catalog.insert(
            "pkg/a.py".to_string(),
            vec![
                entity(EntityKind::Class, "Foo", 3),
                entity(EntityKind::Function, "helper", 0),
            ],
        );
        catalog.insert(
            "pkg/b.py".to_string(),
            vec![entity(EntityKind::Class, "Empty", 0)],
        );

        let summary = RelationshipAggregator::summarize(&[], &catalog);
        assert_eq!(summary.total_classes, 2);
        assert_eq!(summary.total_functions, 4);
        assert_eq!(summary.total_calls, 0);
        assert!(summary.most_called.is_empty());
    }

    #[test]
    fn test_method_also_listed_as_function_is_counted_twice() {
        // A method that also shows up as a standalone Function entity is not
        // deduplicated: totals trust method_count and the function list as-is.
        let mut catalog = EntityCatalog::new();
        catalog.insert(
            "pkg/a.py".to_string(),
            vec![
                entity(EntityKind::Class, "Foo", 1),
                entity(EntityKind::Function, "bar", 0),
            ],
        );
        let summary = RelationshipAggregator::summarize(&[], &catalog);
        assert_eq!(summary.total_functions, 2);
    }

    #[test]
    #[should_panic(expected = "malformed call edge")]
    fn test_empty_caller_is_a_contract_violation() {
        RelationshipAggregator::summarize(&[call("", "f", 1)], &EntityCatalog::new());
    }

    #[test]
    fn test_summary_serializes_rankings_as_pairs() {
        let summary = RelationshipAggregator::summarize(&[call("a", "b", 1)], &EntityCatalog::new());
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["most_called"], serde_json::json!([["b", 1]]));
        assert_eq!(value["most_calling"], serde_json::json!([["a", 1]]));
    }

    #[test]
    fn test_frequency_table_counts() {
        let table: FrequencyTable<&str> = ["x", "y", "x"].into_iter().collect();
        assert_eq!(table.len(), 2);
        assert_eq!(table.ranked(1), vec![("x", 2)]);
        assert!(!table.is_empty());
    }
}
