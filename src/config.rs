use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CallmapError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source discovery and parsing settings
    pub analysis: AnalysisConfig,

    /// Report rendering and persistence settings
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// File extensions treated as Python sources
    pub extensions: Vec<String>,

    /// Maximum file size to parse (in bytes)
    pub max_file_size: usize,

    /// Skip files matched by .gitignore and friends
    pub respect_gitignore: bool,

    /// Descend into hidden files and directories
    pub include_hidden: bool,

    /// Upper bound on files analyzed concurrently (0 = available parallelism)
    pub max_parallel_files: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory receiving the saved artifacts
    pub output_dir: PathBuf,

    /// Whether to write artifacts at all
    pub save: bool,

    /// Rows shown per ranking in the terminal summary
    pub terminal_top: usize,

    /// Edge cap for the Mermaid diagram
    pub max_diagram_edges: usize,

    /// Modules listed under external dependencies in the Markdown report
    pub top_import_modules: usize,

    /// Custom Tera template for summary.md
    pub summary_template: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["py".to_string()],
            max_file_size: 1024 * 1024, // 1MB
            respect_gitignore: true,
            include_hidden: false,
            max_parallel_files: 0,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            save: true,
            terminal_top: 5,
            max_diagram_edges: 50,
            top_import_modules: 15,
            summary_template: None,
        }
    }
}

impl AnalysisConfig {
    /// Effective worker count, resolving `0` to the machine's parallelism
    pub fn parallelism(&self) -> usize {
        if self.max_parallel_files > 0 {
            return self.max_parallel_files;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| CallmapError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CallmapError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => {
                if p.as_ref().exists() {
                    Self::load(p)
                } else {
                    Err(CallmapError::Config(format!(
                        "config file {} not found",
                        p.as_ref().display()
                    )))
                }
            }
            None => {
                // Try common config file locations
                let candidates = [
                    "callmap.toml",
                    "Callmap.toml",
                    ".callmap.toml",
                ];

                for candidate in &candidates {
                    if Path::new(candidate).exists() {
                        return Self::load(candidate);
                    }
                }

                Ok(Self::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[report]\nmax_diagram_edges = 10\n").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.report.max_diagram_edges, 10);
        assert_eq!(config.report.terminal_top, 5);
        assert_eq!(config.analysis.extensions, vec!["py".to_string()]);
        assert!(config.analysis.respect_gitignore);
    }

    #[test]
    fn test_save_and_reload() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.analysis.extensions.push("pyi".to_string());
        config.report.save = false;
        config.save(file.path()).unwrap();

        let reloaded = Config::load(file.path()).unwrap();
        assert_eq!(reloaded.analysis.extensions, vec!["py".to_string(), "pyi".to_string()]);
        assert!(!reloaded.report.save);
        assert_eq!(reloaded.report.summary_template, None);
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let result = Config::load_or_default(Some(&missing));
        assert!(matches!(result, Err(CallmapError::Config(_))));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[analysis\nextensions = 3").unwrap();
        assert!(matches!(Config::load(file.path()), Err(CallmapError::Config(_))));
    }

    #[test]
    fn test_parallelism_resolution() {
        let mut analysis = AnalysisConfig::default();
        assert!(analysis.parallelism() >= 1);
        analysis.max_parallel_files = 3;
        assert_eq!(analysis.parallelism(), 3);
    }
}
