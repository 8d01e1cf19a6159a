// src/core/call_graph/call_graph.rs - call edge and import records
use serde::{Deserialize, Serialize};

use super::Summary;

/// Caller recorded for calls made outside any class or function body.
///
/// The angle brackets can never appear in a Python identifier, so this marker
/// never collides with a declaration path.
pub const MODULE_SCOPE: &str = "<module>";

/// One invocation site: `caller` invokes something named `callee`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEdge {
    /// Dotted path of enclosing declarations, or [`MODULE_SCOPE`]
    pub caller: String,
    /// Identifier or attribute chain being invoked (`helper`, `self.validate`)
    pub callee: String,
    /// File path relative to the analysis root's parent
    pub file: String,
    /// 1-based line of the call expression
    pub line: usize,
}

impl CallEdge {
    pub fn is_self_call(&self) -> bool {
        self.caller == self.callee
    }

    pub fn is_module_level(&self) -> bool {
        self.caller == MODULE_SCOPE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportForm {
    /// `import a.b as c`
    #[serde(rename = "import")]
    Direct,
    /// `from a import b as c`
    #[serde(rename = "from_import")]
    From,
}

/// A single imported name/alias pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    #[serde(rename = "type")]
    pub form: ImportForm,
    pub module: String,
    /// Only present for `from` imports
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub imported_name: Option<String>,
    pub alias: Option<String>,
    pub line: usize,
    pub file: String,
}

/// Everything the call walker found in one file, in traversal order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileRelationships {
    pub calls: Vec<CallEdge>,
    pub imports: Vec<ImportRecord>,
}

/// Batch output handed to the reporting layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationships {
    pub calls: Vec<CallEdge>,
    pub imports: Vec<ImportRecord>,
    pub summary: Summary,
}
