//! Command-line interface for scriptplan.
//!
//! # Commands
//!
//! - `plan` - Resolve scripts and print their load steps
//! - `render` - Resolve scripts and print the page markup
//! - `validate` - Check the catalog for unregistered dependencies and cycles
//!
//! # Global Options
//!
//! - `--verbose` - Enable debug logging
//! - `--quiet` - Suppress everything except errors
//! - `--catalog <PATH>` - Use a specific catalog instead of searching for `scriptplan.toml`
//!
//! # Examples
//!
//! ```bash
//! scriptplan plan loggedin rsswidget
//! scriptplan plan --page pages/checkout.toml --format json
//! scriptplan render --page pages/checkout.toml --mode simple --debug
//! scriptplan --catalog site/scriptplan.toml validate
//! ```

pub mod common;
pub mod plan;
pub mod render;
pub mod validate;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Logging settings derived from the global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Filter directive for the log subscriber. `None` disables logging.
    pub log_level: Option<String>,
    /// Explicit catalog path.
    pub catalog_path: Option<PathBuf>,
}

impl CliConfig {
    /// Install the global tracing subscriber. Logs go to stderr.
    ///
    /// `RUST_LOG` takes precedence over the level chosen by the flags.
    pub fn init_logging(&self) {
        let Some(level) = &self.log_level else {
            return;
        };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("scriptplan={level}")));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Resolve and render script load plans.
#[derive(Parser)]
#[command(
    name = "scriptplan",
    about = "Resolve script dependencies into parallel load steps",
    version,
    long_about = "scriptplan reads a catalog of scripts and their dependencies (scriptplan.toml), \
                  works out which scripts can load in parallel and in what order, and renders \
                  the result as script tags or a staged loader chain."
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (debug logging on stderr).
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the catalog file.
    ///
    /// Defaults to the first `scriptplan.toml` found in the current directory
    /// or one of its parents.
    #[arg(long, global = true, value_name = "PATH")]
    catalog: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Print the load steps for a set of scripts
    Plan(plan::PlanCommand),

    /// Print the markup that loads a set of scripts
    Render(render::RenderCommand),

    /// Check the catalog for unregistered dependencies and cycles
    Validate(validate::ValidateCommand),
}

impl Cli {
    /// Execute the parsed command.
    pub fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config)
    }

    /// Build a [`CliConfig`] from the global flags.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("warn".to_string())
        };

        CliConfig {
            log_level,
            catalog_path: self.catalog.clone(),
        }
    }

    /// Execute with an explicit configuration.
    pub fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();

        match self.command {
            Commands::Plan(cmd) => cmd.execute(config.catalog_path, self.quiet),
            Commands::Render(cmd) => cmd.execute(config.catalog_path),
            Commands::Validate(cmd) => cmd.execute(config.catalog_path, self.quiet),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_and_quiet_levels() {
        let cli = Cli::parse_from(["scriptplan", "--verbose", "validate"]);
        assert_eq!(cli.build_config().log_level.as_deref(), Some("debug"));

        let cli = Cli::parse_from(["scriptplan", "-q", "validate"]);
        assert!(cli.build_config().log_level.is_none());

        let cli = Cli::parse_from(["scriptplan", "validate"]);
        assert_eq!(cli.build_config().log_level.as_deref(), Some("warn"));
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["scriptplan", "-v", "-q", "validate"]).is_err());
    }

    #[test]
    fn test_global_catalog_flag() {
        let cli = Cli::parse_from(["scriptplan", "plan", "site", "--catalog", "x.toml"]);
        assert_eq!(cli.build_config().catalog_path, Some(PathBuf::from("x.toml")));
    }
}
