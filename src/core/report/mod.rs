//! Rendering and persistence of analysis results
//!
//! Statistics are computed upstream on the full edge set; filtering for
//! diagrams happens here only.

mod markdown;
mod mermaid;
mod terminal;

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::ReportConfig;
use crate::error::Result;
use super::engine::{AnalysisReport, EmptyReason};

pub use markdown::MarkdownReporter;
pub use mermaid::render_mermaid;
pub use terminal::render_terminal_summary;

/// Write entities.json, relationships.json, summary.md and diagram.mermaid.
/// Returns the written paths in that order.
pub fn save_results(report: &AnalysisReport, config: &ReportConfig, output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;

    let entities_path = output_dir.join("entities.json");
    std::fs::write(&entities_path, serde_json::to_string_pretty(&report.entities)?)?;

    let relationships_path = output_dir.join("relationships.json");
    std::fs::write(
        &relationships_path,
        serde_json::to_string_pretty(&report.relationships)?,
    )?;

    let summary_path = output_dir.join("summary.md");
    let reporter = MarkdownReporter::new(config.summary_template.as_deref())?;
    let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M").to_string();
    std::fs::write(
        &summary_path,
        reporter.render(report, config.top_import_modules, &generated_at)?,
    )?;

    let mermaid_path = output_dir.join("diagram.mermaid");
    std::fs::write(
        &mermaid_path,
        render_mermaid(&report.relationships.calls, config.max_diagram_edges),
    )?;

    info!("Saved reports to {}", output_dir.display());
    Ok(vec![entities_path, relationships_path, summary_path, mermaid_path])
}

pub fn nothing_to_analyze_message(reason: EmptyReason, root: &Path) -> String {
    match reason {
        EmptyReason::NoSourceFiles => {
            format!("Nothing to analyze: no Python files found in {}", root.display())
        }
        EmptyReason::NoEntities => {
            format!("Nothing to analyze: no classes or functions found in {}", root.display())
        }
        EmptyReason::Aborted => {
            format!("Analysis of {} was interrupted before any file completed", root.display())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::call_graph::{CallEdge, ImportForm, ImportRecord, RelationshipAggregator, Relationships};
    use crate::core::engine::RunStatistics;
    use crate::core::entity::{Entity, EntityCatalog, EntityKind};
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use predicates::prelude::*;

    fn report() -> AnalysisReport {
        let mut entities = EntityCatalog::new();
        entities.insert(
            "proj/a.py".to_string(),
            vec![Entity {
                kind: EntityKind::Function,
                name: "run".to_string(),
                line: 2,
                file: "proj/a.py".to_string(),
                bases: Vec::new(),
                method_count: 0,
                decorators: Vec::new(),
                docstring: Some("Run things.".to_string()),
            }],
        );
        let calls = vec![CallEdge {
            caller: "run".to_string(),
            callee: "step".to_string(),
            file: "proj/a.py".to_string(),
            line: 3,
        }];
        let imports = vec![ImportRecord {
            form: ImportForm::From,
            module: "os".to_string(),
            imported_name: Some("path".to_string()),
            alias: None,
            line: 1,
            file: "proj/a.py".to_string(),
        }];
        let summary = RelationshipAggregator::summarize(&calls, &entities);
        AnalysisReport {
            entities,
            relationships: Relationships { calls, imports, summary },
            stats: RunStatistics::default(),
        }
    }

    #[test]
    fn test_save_results_writes_all_artifacts() {
        let temp = TempDir::new().unwrap();
        let output = temp.child("nested/out");

        let saved = save_results(&report(), &ReportConfig::default(), output.path()).unwrap();
        assert_eq!(saved.len(), 4);

        output
            .child("entities.json")
            .assert(predicate::str::contains("\"proj/a.py\"").and(predicate::str::contains("\"type\": \"function\"")));
        output
            .child("relationships.json")
            .assert(predicate::str::contains("\"total_calls\": 1").and(predicate::str::contains("\"type\": \"from_import\"")));
        output.child("summary.md").assert(predicate::str::contains("- `os` (1 imports)"));
        output.child("diagram.mermaid").assert(predicate::str::contains("run[run] --> step[step]"));

        let json = std::fs::read_to_string(output.child("relationships.json").path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["calls"][0]["caller"], "run");
        assert_eq!(value["summary"]["most_called"][0][0], "step");
        assert_eq!(value["imports"][0]["name"], "path");
    }

    #[test]
    fn test_nothing_to_analyze_messages() {
        let root = Path::new("proj");
        assert!(nothing_to_analyze_message(EmptyReason::NoSourceFiles, root).contains("no Python files"));
        assert!(nothing_to_analyze_message(EmptyReason::NoEntities, root).contains("no classes or functions"));
        let aborted = nothing_to_analyze_message(EmptyReason::Aborted, root);
        assert!(aborted.contains("interrupted"));
        assert!(!aborted.contains("no classes or functions"));
    }
}
