use std::path::Path;

use serde::Serialize;
use tera::{Context, Tera};

use crate::core::call_graph::{FrequencyTable, Summary};
use crate::core::engine::AnalysisReport;
use crate::error::Result;

const TEMPLATE_NAME: &str = "summary.md";
const DEFAULT_TEMPLATE: &str = include_str!("../../../templates/summary.md.tera");

/// Longest docstring excerpt shown per class
const DESCRIPTION_CHARS: usize = 100;

#[derive(Debug, Serialize)]
struct RankedEntry<'a> {
    name: &'a str,
    count: usize,
}

#[derive(Debug, Serialize)]
struct ClassView {
    name: String,
    details: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ReportView<'a> {
    generated_at: &'a str,
    files_analyzed: usize,
    summary: &'a Summary,
    classes: Vec<ClassView>,
    most_called: Vec<RankedEntry<'a>>,
    most_calling: Vec<RankedEntry<'a>>,
    modules: Vec<RankedEntry<'a>>,
}

/// Renders summary.md through Tera
pub struct MarkdownReporter {
    tera: Tera,
}

impl MarkdownReporter {
    /// Use `template` when given, the bundled template otherwise
    pub fn new(template: Option<&Path>) -> Result<Self> {
        let mut tera = Tera::default();
        match template {
            Some(path) => tera.add_template_file(path, Some(TEMPLATE_NAME))?,
            None => tera.add_raw_template(TEMPLATE_NAME, DEFAULT_TEMPLATE)?,
        }
        Ok(Self { tera })
    }

    pub fn render(&self, report: &AnalysisReport, top_modules: usize, generated_at: &str) -> Result<String> {
        let summary = &report.relationships.summary;

        let module_counts: FrequencyTable<&str> = report
            .relationships
            .imports
            .iter()
            .map(|import| import.module.as_str())
            .collect();

        let view = ReportView {
            generated_at,
            files_analyzed: report.entities.len(),
            summary,
            classes: class_views(report),
            most_called: ranked_entries(&summary.most_called),
            most_calling: ranked_entries(&summary.most_calling),
            modules: module_counts
                .ranked(top_modules)
                .into_iter()
                .map(|(name, count)| RankedEntry { name, count })
                .collect(),
        };

        let context = Context::from_serialize(&view)?;
        Ok(self.tera.render(TEMPLATE_NAME, &context)?)
    }
}

fn ranked_entries(ranked: &[(String, usize)]) -> Vec<RankedEntry<'_>> {
    ranked
        .iter()
        .map(|(name, count)| RankedEntry {
            name: name.as_str(),
            count: *count,
        })
        .collect()
}

fn class_views(report: &AnalysisReport) -> Vec<ClassView> {
    report
        .entities
        .iter()
        .flat_map(|(file, entities)| entities.iter().map(move |entity| (file, entity)))
        .filter(|(_, entity)| entity.is_class())
        .map(|(file, class)| {
            let bases = if class.bases.is_empty() {
                "none".to_string()
            } else {
                class.bases.join(", ")
            };

            let mut details = vec![
                format!("**File:** `{}`", file),
                format!("**Line:** {}", class.line),
                format!("**Inherits:** {}", bases),
                format!("**Methods:** {}", class.method_count),
            ];
            if !class.decorators.is_empty() {
                details.push(format!("**Decorators:** {}", class.decorators.join(", ")));
            }
            if let Some(doc) = &class.docstring {
                let excerpt: String = doc.chars().take(DESCRIPTION_CHARS).collect();
                details.push(format!("**Description:** {}...", excerpt));
            }

            ClassView {
                name: class.name.clone(),
                details,
            }
        })
        .collect()
}
