// src/core/mod.rs
mod engine;
mod entity;
mod parser;
mod report;

// Relationship extraction and aggregation
mod call_graph;

// Language-specific parsing
mod languages;

// Export the main engine
pub use engine::Engine;
