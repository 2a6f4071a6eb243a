//! Print the load steps of a set of scripts.
//!
//! ```text
//! $ scriptplan plan shipmenttotals rsswidget
//! Chain 1
//!   step 0: jquery
//!   step 1: site
//!   step 2: rsswidget, shipmenttotals
//! ```

use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;

use super::common::{SelectionArgs, load_manifest};
use crate::resolver::LoadPlan;

/// Output format for `plan`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per load step.
    #[default]
    Text,
    /// The plan as JSON.
    Json,
}

/// Arguments of the `plan` command.
#[derive(Args, Debug)]
pub struct PlanCommand {
    #[command(flatten)]
    selection: SelectionArgs,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl PlanCommand {
    /// Resolve and print.
    pub fn execute(self, catalog_path: Option<PathBuf>, quiet: bool) -> Result<()> {
        let manifest = load_manifest(catalog_path)?;
        let page = self.selection.build_page(&manifest)?;
        let policy = self.selection.conflict_policy.unwrap_or(manifest.settings.conflict_policy);
        let plan = page.plan(policy)?;

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
            OutputFormat::Text => {
                if plan.is_empty() {
                    if !quiet {
                        println!("{}", "Nothing to load".yellow());
                    }
                } else {
                    print!("{}", format_plan(&plan));
                }
            }
        }
        Ok(())
    }
}

/// Text rendering of a plan.
#[must_use]
pub fn format_plan(plan: &LoadPlan) -> String {
    let mut out = String::new();
    for (index, chain) in plan.chains().iter().enumerate() {
        out.push_str(&format!("{}\n", format!("Chain {}", index + 1).bold()));
        for group in chain.groups() {
            out.push_str(&format!("  step {}: {}\n", group.step(), group.names().join(", ")));
        }
    }
    out
}
