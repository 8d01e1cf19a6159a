// src/core/call_graph/mod.rs
//! Relationship extraction for callmap
//!
//! A per-file walker turns each syntax tree into call edges and import
//! records; the aggregator reduces the whole batch into ranked statistics.

mod call_graph;
mod call_walker;
mod aggregator;

pub use call_graph::{
    CallEdge, FileRelationships, ImportForm, ImportRecord, Relationships, MODULE_SCOPE,
};
pub use call_walker::CallWalker;
pub use aggregator::{FrequencyTable, RelationshipAggregator, Summary};
