//! Language-specific parsing
//!
//! Python is the only analyzed language; its module owns the tree supplier
//! and the entity catalog builder.

mod python;

pub use python::PythonParser;
