//! Validate the catalog.
//!
//! Loads `scriptplan.toml`, then checks that every declared dependency is
//! registered and that the dependency graph has no cycles.
//!
//! ```text
//! $ scriptplan validate
//! ✓ Loaded scriptplan.toml (6 scripts, 1 styles)
//! ✓ All dependencies are registered and acyclic
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use crate::catalog::{CatalogManifest, find_catalog_with_optional};

/// Arguments of the `validate` command.
#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// Catalog file to validate (same as the global `--catalog`)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,
}

impl ValidateCommand {
    /// Run the checks, printing one line per check.
    pub fn execute(self, catalog_path: Option<PathBuf>, quiet: bool) -> Result<()> {
        let path = find_catalog_with_optional(self.file.or(catalog_path))?;

        let manifest = match CatalogManifest::load(&path) {
            Ok(manifest) => manifest,
            Err(e) => {
                if !quiet {
                    println!("{} {}", "✗".red(), e);
                }
                return Err(e);
            }
        };
        if !quiet {
            println!(
                "{} Loaded {} ({} scripts, {} styles)",
                "✓".green(),
                path.display(),
                manifest.scripts.len(),
                manifest.styles.len()
            );
        }

        if let Err(e) = manifest.scripts.validate() {
            if !quiet {
                println!("{} {}", "✗".red(), e);
            }
            return Err(e);
        }
        if !quiet {
            println!("{} All dependencies are registered and acyclic", "✓".green());
        }
        Ok(())
    }
}
