use std::path::{Component, Path, PathBuf};

use ignore::WalkBuilder;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::AnalysisConfig;
use crate::error::Result;
use super::call_graph::{CallWalker, FileRelationships};
use super::entity::Entity;
use super::languages::PythonParser;

/// Why a single file was left out of the batch
#[derive(Error, Debug)]
pub enum SkipReason {
    #[error("unreadable: {0}")]
    Unreadable(#[from] std::io::Error),

    #[error("{size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: usize },

    #[error("syntax error near line {line}")]
    Syntax { line: usize },

    #[error("parser failure: {0}")]
    Parser(String),
}

/// Everything extracted from one successfully parsed file
#[derive(Debug, Clone)]
pub struct FileAnalysis {
    /// Path relative to the analysis root's parent
    pub file: String,
    pub entities: Vec<Entity>,
    pub relationships: FileRelationships,
}

/// Discovers the source files under an analysis root
pub struct SourceEnumerator {
    config: AnalysisConfig,
}

impl SourceEnumerator {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Source files under `root`, sorted by path. A file root is returned
    /// as-is when its extension matches.
    pub fn discover(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if root.is_file() {
            return Ok(if self.should_parse_file(root) {
                vec![root.to_path_buf()]
            } else {
                Vec::new()
            });
        }

        let respect = self.config.respect_gitignore;
        let walker = WalkBuilder::new(root)
            .hidden(!self.config.include_hidden)
            .git_ignore(respect)
            .git_global(respect)
            .git_exclude(respect)
            .ignore(respect)
            .parents(respect)
            .require_git(false)
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable directory entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();

            if path.is_file() && self.should_parse_file(path) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        debug!("Discovered {} source files under {}", files.len(), root.display());
        Ok(files)
    }

    /// Determine if a file should be parsed based on configuration
    fn should_parse_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| self.config.extensions.iter().any(|e| e == ext))
    }
}

/// `file` relative to `root`'s parent, `/`-separated, so the root's own name is kept
pub fn relative_path(root: &Path, file: &Path) -> String {
    let base = root.parent().unwrap_or_else(|| Path::new(""));
    let relative = file.strip_prefix(base).unwrap_or(file);

    relative
        .components()
        .filter_map(|component| match component {
            Component::CurDir => None,
            other => Some(other.as_os_str().to_string_lossy().into_owned()),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Read, parse and walk one file. Any failure skips the file as a whole.
pub fn analyze_file(path: &Path, relative: String, max_file_size: usize) -> std::result::Result<FileAnalysis, SkipReason> {
    let size = std::fs::metadata(path)?.len();
    if size > max_file_size as u64 {
        return Err(SkipReason::TooLarge { size, limit: max_file_size });
    }

    let source = std::fs::read_to_string(path)?;

    let mut parser = PythonParser::new()?;
    let tree = parser.parse(&source)?;
    let root = tree.root_node();

    let entities = parser.extract_entities(root, &source, &relative);
    let relationships = CallWalker::new(&relative, &source).walk(root);

    debug!(
        "Parsed {} as {}: {} entities, {} calls, {} imports",
        relative,
        parser.language_name(),
        entities.len(),
        relationships.calls.len(),
        relationships.imports.len()
    );

    Ok(FileAnalysis {
        file: relative,
        entities,
        relationships,
    })
}
