use crate::core::engine::AnalysisReport;
use crate::core::entity::count_kinds;

const RULE_WIDTH: usize = 60;

/// Human-readable run summary for the terminal
pub fn render_terminal_summary(report: &AnalysisReport, top: usize) -> String {
    let summary = &report.relationships.summary;
    let rule = "=".repeat(RULE_WIDTH);

    let mut lines = vec![
        String::new(),
        rule.clone(),
        "  CODE ANALYSIS SUMMARY".to_string(),
        rule.clone(),
        String::new(),
        format!("📁 Files analyzed: {}", report.entities.len()),
    ];
    if report.stats.files_skipped > 0 {
        lines.push(format!("⚠️  Files skipped: {}", report.stats.files_skipped));
    }
    lines.push(format!("📦 Classes found: {}", summary.total_classes));
    lines.push(format!("🔧 Functions found: {}", summary.total_functions));
    lines.push(format!("🔗 Call relationships: {}", summary.total_calls));

    if !summary.most_called.is_empty() {
        lines.push(String::new());
        lines.push("📊 Most Called Functions (potential core utilities):".to_string());
        for (name, count) in summary.most_called.iter().take(top) {
            lines.push(format!("   {:>3}x  {}", count, name));
        }
    }

    if !summary.most_calling.is_empty() {
        lines.push(String::new());
        lines.push("🎯 Functions That Call Most Others (orchestrators):".to_string());
        for (name, count) in summary.most_calling.iter().take(top) {
            lines.push(format!("   {:>3} calls  {}", count, name));
        }
    }

    lines.push(String::new());
    lines.push("📄 Files:".to_string());
    for (file, entities) in &report.entities {
        let (classes, functions) = count_kinds(entities);
        lines.push(format!("   {}", file));
        lines.push(format!("      Classes: {}, Functions: {}", classes, functions));
    }

    lines.push(String::new());
    lines.push("🏛️  Key Entities:".to_string());
    for (file, entities) in &report.entities {
        for class in entities.iter().filter(|e| e.is_class()) {
            let bases = if class.bases.is_empty() {
                "none".to_string()
            } else {
                class.bases.join(", ")
            };
            lines.push(format!(
                "   class {} (inherits: {}, methods: {})",
                class.name, bases, class.method_count
            ));
            lines.push(format!("         └─ {}:{}", file, class.line));
        }
    }

    if report.stats.aborted {
        lines.push(String::new());
        lines.push("⚠️  Analysis was interrupted; results are partial.".to_string());
    }

    lines.push(String::new());
    lines.push(rule);
    lines.join("\n")
}
