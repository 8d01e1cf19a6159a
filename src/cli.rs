use clap::Parser;
use std::path::PathBuf;
use anyhow::Result;

use crate::config::Config;
use crate::core::Engine;

#[derive(Parser)]
#[command(name = "callmap")]
#[command(about = "Analyze Python code to extract entities and call relationships")]
#[command(version)]
pub struct Cli {
    /// File or directory to analyze
    pub path: PathBuf,

    /// Output directory for saved reports
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the terminal summary without writing report files
    #[arg(long)]
    pub no_save: bool,

    /// Write the effective configuration to FILE before analyzing
    #[arg(long, value_name = "FILE")]
    pub save_config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_or_default(self.config.as_deref())?;
        if let Some(output) = &self.output {
            config.report.output_dir = output.clone();
        }
        if self.no_save {
            config.report.save = false;
        }
        Ok(config)
    }

    pub async fn execute(self, engine: Engine) -> Result<()> {
        engine.run(&self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from(["callmap", "src", "-o", "reports", "--no-save", "-v"]).unwrap();
        assert_eq!(cli.path, PathBuf::from("src"));
        assert!(cli.verbose);

        let config = cli.load_config().unwrap();
        assert_eq!(config.report.output_dir, PathBuf::from("reports"));
        assert!(!config.report.save);
        assert!(cli.save_config.is_none());
    }

    #[test]
    fn test_save_config_flag() {
        let cli = Cli::try_parse_from(["callmap", "src", "--save-config", "callmap.toml"]).unwrap();
        assert_eq!(cli.save_config, Some(PathBuf::from("callmap.toml")));
    }

    #[test]
    fn test_path_is_required() {
        assert!(Cli::try_parse_from(["callmap"]).is_err());
    }
}
