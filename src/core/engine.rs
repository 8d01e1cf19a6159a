// src/core/engine.rs
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{CallmapError, Result};
use super::call_graph::{CallEdge, ImportRecord, RelationshipAggregator, Relationships};
use super::entity::EntityCatalog;
use super::parser::{analyze_file, relative_path, SourceEnumerator};
use super::report;

/// Why a run produced nothing worth reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    NoSourceFiles,
    NoEntities,
    /// Interrupted before any file produced results
    Aborted,
}

#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    NothingToAnalyze(EmptyReason),
    Complete(AnalysisReport),
}

/// Catalog plus relationships for one run
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub entities: EntityCatalog,
    pub relationships: Relationships,
    pub stats: RunStatistics,
}

#[derive(Debug, Clone, Default)]
pub struct RunStatistics {
    pub files_discovered: usize,
    pub files_analyzed: usize,
    pub files_skipped: usize,
    /// Dispatch stopped early on request; results cover a prefix of the files
    pub aborted: bool,
    pub analysis_time_ms: u128,
}

/// Main orchestration engine: enumerate, analyze per file in parallel, aggregate
pub struct Engine {
    config: Config,
    abort: Arc<AtomicBool>,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            abort: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Setting the returned flag stops dispatching new files
    pub fn abort_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }

    /// Analyze everything under `root`
    pub async fn analyze(&self, root: &Path) -> Result<AnalysisOutcome> {
        if !root.exists() {
            return Err(CallmapError::PathNotFound(root.to_path_buf()));
        }

        let start_time = Instant::now();
        info!("🔍 Analyzing: {}", root.display());

        let files = SourceEnumerator::new(&self.config.analysis).discover(root)?;
        if files.is_empty() {
            info!("No source files found under {}", root.display());
            return Ok(AnalysisOutcome::NothingToAnalyze(EmptyReason::NoSourceFiles));
        }
        info!("📖 Found {} source files", files.len());

        let mut stats = RunStatistics {
            files_discovered: files.len(),
            ..RunStatistics::default()
        };

        let parallelism = self.config.analysis.parallelism();
        let max_file_size = self.config.analysis.max_file_size;
        let semaphore = Arc::new(Semaphore::new(parallelism));
        debug!("Analyzing with up to {} files in flight", parallelism);

        // Dispatch in canonical order; awaiting in the same order keeps output deterministic
        let mut handles = Vec::with_capacity(files.len());
        for path in files {
            if self.abort.load(Ordering::SeqCst) {
                warn!("Analysis aborted, reporting partial results");
                stats.aborted = true;
                break;
            }

            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| CallmapError::Task(e.to_string()))?;
            let relative = relative_path(root, &path);
            let task_relative = relative.clone();

            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                analyze_file(&path, task_relative, max_file_size)
            });
            handles.push((relative, handle));
        }

        let mut entities = EntityCatalog::new();
        let mut calls: Vec<CallEdge> = Vec::new();
        let mut imports: Vec<ImportRecord> = Vec::new();

        for (relative, handle) in handles {
            match handle.await {
                Ok(Ok(analysis)) => {
                    stats.files_analyzed += 1;
                    calls.extend(analysis.relationships.calls);
                    imports.extend(analysis.relationships.imports);
                    entities.insert(analysis.file, analysis.entities);
                }
                Ok(Err(reason)) => {
                    stats.files_skipped += 1;
                    warn!("Skipping {}: {}", relative, reason);
                }
                Err(e) => {
                    stats.files_skipped += 1;
                    error!("Analysis task for {} failed: {}", relative, e);
                }
            }
        }

        if entities.values().all(|file_entities| file_entities.is_empty()) {
            if stats.aborted {
                return Ok(AnalysisOutcome::NothingToAnalyze(EmptyReason::Aborted));
            }
            info!("No classes or functions found");
            return Ok(AnalysisOutcome::NothingToAnalyze(EmptyReason::NoEntities));
        }

        let summary = RelationshipAggregator::summarize(&calls, &entities);
        stats.analysis_time_ms = start_time.elapsed().as_millis();

        info!(
            "📊 Analysis complete: {} of {} files ({} skipped), {} calls, {} imports in {}ms",
            stats.files_analyzed,
            stats.files_discovered,
            stats.files_skipped,
            summary.total_calls,
            imports.len(),
            stats.analysis_time_ms
        );

        Ok(AnalysisOutcome::Complete(AnalysisReport {
            entities,
            relationships: Relationships {
                calls,
                imports,
                summary,
            },
            stats,
        }))
    }

    /// Analyze, print the terminal summary and save artifacts when enabled
    pub async fn run(&self, root: &Path) -> Result<AnalysisOutcome> {
        let outcome = self.analyze(root).await?;

        match &outcome {
            AnalysisOutcome::NothingToAnalyze(reason) => {
                println!("{}", report::nothing_to_analyze_message(*reason, root));
            }
            AnalysisOutcome::Complete(analysis) => {
                println!(
                    "{}",
                    report::render_terminal_summary(analysis, self.config.report.terminal_top)
                );

                if self.config.report.save {
                    let saved = report::save_results(analysis, &self.config.report, self.output_dir())?;
                    for path in saved {
                        println!("✓ Saved: {}", path.display());
                    }
                }
            }
        }

        Ok(outcome)
    }

    fn output_dir(&self) -> &Path {
        &self.config.report.output_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::call_graph::MODULE_SCOPE;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use predicates::prelude::*;

    fn engine() -> Engine {
        Engine::new(Config::default())
    }

    fn complete(outcome: AnalysisOutcome) -> AnalysisReport {
        match outcome {
            AnalysisOutcome::Complete(report) => report,
            other => panic!("expected a complete analysis, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_two_file_scenario() {
        let temp = TempDir::new().unwrap();
        temp.child("proj/file1.py")
            .write_str("class Foo:\n    def bar(self):\n        self.baz(); helper()\n")
            .unwrap();
        temp.child("proj/file2.py")
            .write_str("def helper():\n    pass\n\ndef baz():\n    pass\n")
            .unwrap();

        let report = complete(engine().analyze(&temp.path().join("proj")).await.unwrap());
        let relationships = &report.relationships;

        assert_eq!(
            relationships.calls,
            vec![
                CallEdge {
                    caller: "Foo.bar".to_string(),
                    callee: "self.baz".to_string(),
                    file: "proj/file1.py".to_string(),
                    line: 3,
                },
                CallEdge {
                    caller: "Foo.bar".to_string(),
                    callee: "helper".to_string(),
                    file: "proj/file1.py".to_string(),
                    line: 3,
                },
            ]
        );
        assert_eq!(relationships.summary.total_calls, 2);
        assert_eq!(relationships.summary.most_calling, vec![("Foo.bar".to_string(), 2)]);
        assert_eq!(relationships.summary.total_classes, 1);
        assert_eq!(relationships.summary.total_functions, 3);
        assert_eq!(report.stats.files_analyzed, 2);
        assert_eq!(report.entities.keys().collect::<Vec<_>>(), vec!["proj/file1.py", "proj/file2.py"]);
    }

    #[tokio::test]
    async fn test_invalid_file_is_skipped() {
        let temp = TempDir::new().unwrap();
        temp.child("proj/a.py").write_str("import os\n\ndef a():\n    os.sep.join([])\n").unwrap();
        temp.child("proj/b.py").write_str("def b(:\n    broken(\n").unwrap();
        temp.child("proj/c.py").write_str("from a import a\n\ndef c():\n    a()\n").unwrap();

        let report = complete(engine().analyze(&temp.path().join("proj")).await.unwrap());
        assert_eq!(report.stats.files_discovered, 3);
        assert_eq!(report.stats.files_analyzed, 2);
        assert_eq!(report.stats.files_skipped, 1);
        assert!(report.relationships.calls.iter().all(|c| c.file != "proj/b.py"));
        assert!(report.relationships.imports.iter().all(|i| i.file != "proj/b.py"));
        assert!(!report.entities.contains_key("proj/b.py"));

        let callees: Vec<_> = report.relationships.calls.iter().map(|c| c.callee.as_str()).collect();
        assert_eq!(callees, vec!["os.sep.join", "a"]);
        assert_eq!(report.relationships.imports.len(), 2);
    }

    #[tokio::test]
    async fn test_cross_file_order_is_path_order() {
        let temp = TempDir::new().unwrap();
        // z.py is written first but sorts last
        temp.child("proj/z.py").write_str("def z():\n    B()\n    B()\n    B()\n").unwrap();
        temp.child("proj/a.py").write_str("def a():\n    A()\n    A()\n    A()\n").unwrap();

        let mut config = Config::default();
        config.analysis.max_parallel_files = 1;
        let report = complete(Engine::new(config).analyze(&temp.path().join("proj")).await.unwrap());
        assert_eq!(
            report.relationships.summary.most_called,
            vec![("A".to_string(), 3), ("B".to_string(), 3)]
        );
    }

    #[tokio::test]
    async fn test_nothing_to_analyze() {
        let temp = TempDir::new().unwrap();
        temp.child("proj/readme.md").write_str("# docs\n").unwrap();
        let outcome = engine().analyze(&temp.path().join("proj")).await.unwrap();
        assert!(matches!(outcome, AnalysisOutcome::NothingToAnalyze(EmptyReason::NoSourceFiles)));

        temp.child("proj/script.py").write_str("print_banner()\n").unwrap();
        let outcome = engine().analyze(&temp.path().join("proj")).await.unwrap();
        assert!(matches!(outcome, AnalysisOutcome::NothingToAnalyze(EmptyReason::NoEntities)));
    }

    #[tokio::test]
    async fn test_missing_path_is_an_error() {
        let temp = TempDir::new().unwrap();
        let result = engine().analyze(&temp.path().join("absent")).await;
        assert!(matches!(result, Err(CallmapError::PathNotFound(_))));
    }

    #[tokio::test]
    async fn test_abort_before_dispatch() {
        let temp = TempDir::new().unwrap();
        temp.child("proj/a.py").write_str("def a():\n    pass\n").unwrap();

        let engine = engine();
        engine.abort_handle().store(true, Ordering::SeqCst);
        let outcome = engine.analyze(&temp.path().join("proj")).await.unwrap();
        assert!(matches!(outcome, AnalysisOutcome::NothingToAnalyze(EmptyReason::Aborted)));
    }

    #[tokio::test]
    async fn test_run_writes_artifacts() {
        let temp = TempDir::new().unwrap();
        temp.child("proj/app.py")
            .write_str("import os\n\nclass App(Base):\n    def start(self):\n        self.load()\n\nApp().start()\n")
            .unwrap();
        let output = temp.child("out");

        let mut config = Config::default();
        config.report.output_dir = output.path().to_path_buf();
        let engine = Engine::new(config);
        let outcome = engine.run(&temp.path().join("proj")).await.unwrap();
        let report = complete(outcome);
        assert!(report.relationships.calls.iter().any(|c| c.caller == MODULE_SCOPE));

        output.child("entities.json").assert(predicate::str::contains("\"App\""));
        output.child("relationships.json").assert(predicate::str::contains("\"self.load\""));
        output.child("summary.md").assert(predicate::str::contains("| Classes | 1 |"));
        output
            .child("diagram.mermaid")
            .assert(predicate::str::contains("n_App_start[App.start] --> n_self_load[self.load]"));
    }
}
