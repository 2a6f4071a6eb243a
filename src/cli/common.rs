//! Helpers shared by the plan and render commands.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::catalog::{CatalogManifest, find_catalog_with_optional};
use crate::config::ConflictPolicy;
use crate::page::{Page, PageSpec};

/// Which scripts to resolve.
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Catalog script names to include
    #[arg(value_name = "NAME")]
    pub names: Vec<String>,

    /// Page file listing includes, page-only scripts, inline blocks and styles
    #[arg(long, value_name = "PAGE.toml")]
    pub page: Option<PathBuf>,

    /// Override the catalog's conflict policy
    #[arg(long, value_enum)]
    pub conflict_policy: Option<ConflictPolicy>,
}

impl SelectionArgs {
    /// Build the page described by the names and the page file.
    pub fn build_page<'a>(&self, manifest: &'a CatalogManifest) -> Result<Page<'a>> {
        let mut page = Page::for_manifest(manifest);
        if let Some(path) = &self.page {
            let spec = PageSpec::load(path)?;
            page.apply(spec).with_context(|| format!("Invalid page file: {}", path.display()))?;
        }
        page.include_all(&self.names)?;
        Ok(page)
    }
}

/// Locate and load the catalog, then apply environment overrides.
pub fn load_manifest(catalog_path: Option<PathBuf>) -> Result<CatalogManifest> {
    let path = find_catalog_with_optional(catalog_path)?;
    let mut manifest = CatalogManifest::load(&path)?;
    manifest.settings.apply_env_overrides()?;
    Ok(manifest)
}
