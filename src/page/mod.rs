//! Per-page script and stylesheet selection.
//!
//! A [`Page`] collects what one page asks for: catalog scripts by name,
//! page-local file scripts, inline blocks and stylesheets. It borrows the
//! catalogs read-only and owns everything else, so a server can build one
//! page per request against a shared catalog.
//!
//! Page-local scripts are layered over the catalog by a [`ResourceBag`] for
//! the duration of one resolution pass.
//!
//! # Page files
//!
//! The CLI reads page selections from TOML:
//!
//! ```toml
//! include = ["site", "rsswidget"]
//! styles = ["main"]
//!
//! [[script]]
//! name = "checkout"
//! debug = "checkout.js"
//! min = "checkout.min.js"
//! deps = ["site"]
//!
//! [[inline]]
//! body = "initCheckout();"
//! deps = ["checkout"]
//!
//! [[style]]
//! debug = "checkout.css"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::catalog::{Catalog, CatalogManifest};
use crate::config::ConflictPolicy;
use crate::core::{PlanError, Resource, ResourceLookup, split_dependency_list};
use crate::resolver::{LoadPlan, PlanResolver};
use crate::styles::{StyleCatalog, Stylesheet};

/// Catalog lookup with page-local resources layered on top.
///
/// A page-local resource is added when its name is unknown to the base. When
/// the name is already known, the page version replaces it only if it declares
/// dependencies of its own.
pub struct ResourceBag<'a, L: ?Sized> {
    base: &'a L,
    overlay: BTreeMap<String, Arc<Resource>>,
}

impl<'a, L> ResourceBag<'a, L>
where
    L: ResourceLookup + ?Sized,
{
    /// Create a bag with nothing layered on top of `base`.
    pub fn new(base: &'a L) -> Self {
        Self {
            base,
            overlay: BTreeMap::new(),
        }
    }

    /// Layer a page-local resource. Returns whether it is visible through the bag.
    pub fn overlay(&mut self, resource: Arc<Resource>) -> bool {
        if self.base.contains(&resource.name) && !resource.has_dependencies() {
            tracing::trace!("Page copy of '{}' ignored; catalog entry wins", resource.name);
            return false;
        }
        self.overlay.insert(resource.name.clone(), resource);
        true
    }
}

impl<L> ResourceLookup for ResourceBag<'_, L>
where
    L: ResourceLookup + ?Sized,
{
    fn lookup(&self, name: &str) -> Option<Arc<Resource>> {
        self.overlay.get(name).cloned().or_else(|| self.base.lookup(name))
    }
}

/// Everything one page has asked for.
#[derive(Debug, Clone)]
pub struct Page<'a> {
    catalog: &'a Catalog,
    style_catalog: &'a StyleCatalog,
    requested: Vec<String>,
    local: Vec<Arc<Resource>>,
    styles: Vec<Arc<Stylesheet>>,
    inline_counter: usize,
}

impl<'a> Page<'a> {
    /// Create an empty page over the given catalogs.
    #[must_use]
    pub fn new(catalog: &'a Catalog, style_catalog: &'a StyleCatalog) -> Self {
        Self {
            catalog,
            style_catalog,
            requested: Vec::new(),
            local: Vec::new(),
            styles: Vec::new(),
            inline_counter: 0,
        }
    }

    /// Create an empty page over the catalogs of a loaded manifest.
    #[must_use]
    pub fn for_manifest(manifest: &'a CatalogManifest) -> Self {
        Self::new(&manifest.scripts, &manifest.styles)
    }

    /// Request a catalog script by name.
    ///
    /// # Errors
    ///
    /// [`PlanError::UnregisteredDependency`] if the catalog does not know `name`.
    pub fn include(&mut self, name: &str) -> Result<()> {
        if !self.catalog.contains(name) {
            return Err(PlanError::UnregisteredDependency {
                name: name.to_string(),
                required_by: None,
            }
            .into());
        }
        self.request(name);
        Ok(())
    }

    /// Request several catalog scripts.
    pub fn include_all<I, S>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.include(name.as_ref())?;
        }
        Ok(())
    }

    /// Add a page-only file script. `dependencies` uses the `"a, b"` shorthand.
    pub fn include_file(&mut self, name: &str, debug_path: &str, min_path: &str, dependencies: &str) {
        self.add_local(Resource::file(name, debug_path, min_path, split_dependency_list(dependencies)));
    }

    /// Add an inline block that runs after `dependencies`. Returns its generated name.
    pub fn run_after(&mut self, body: &str, dependencies: &str) -> String {
        let name = format!("inline{}", self.inline_counter);
        self.inline_counter += 1;
        self.run_after_named(&name, body, dependencies);
        name
    }

    /// Add a named inline block, so other page scripts can depend on it.
    pub fn run_after_named(&mut self, name: &str, body: &str, dependencies: &str) {
        self.add_local(Resource::inline(name, body, split_dependency_list(dependencies)));
    }

    /// Request a catalog stylesheet by name.
    pub fn include_style(&mut self, name: &str) -> Result<()> {
        let style = self.style_catalog.get(name).ok_or_else(|| PlanError::InvalidResource {
            name: name.to_string(),
            reason: "no stylesheet with this name is declared".to_string(),
        })?;
        self.push_style(style);
        Ok(())
    }

    /// Add a page-only stylesheet by path.
    pub fn include_style_path(&mut self, debug_path: &str, min_path: &str) {
        self.push_style(Arc::new(Stylesheet::new("", debug_path, min_path)));
    }

    /// Apply a parsed page file.
    pub fn apply(&mut self, spec: PageSpec) -> Result<()> {
        self.include_all(&spec.include)?;
        for script in spec.script {
            let min = script.min.unwrap_or_else(|| script.debug.clone());
            self.add_local(Resource::file(script.name, script.debug, min, script.deps));
        }
        for block in spec.inline {
            let deps = block.deps.join(", ");
            match block.name {
                Some(name) => self.run_after_named(&name, &block.body, &deps),
                None => {
                    self.run_after(&block.body, &deps);
                }
            }
        }
        for name in &spec.styles {
            self.include_style(name)?;
        }
        for style in spec.style {
            let min = style.min.unwrap_or_else(|| style.debug.clone());
            self.include_style_path(&style.debug, &min);
        }
        Ok(())
    }

    /// Names to resolve, in request order.
    #[must_use]
    pub fn requested(&self) -> &[String] {
        &self.requested
    }

    /// Stylesheets in include order.
    #[must_use]
    pub fn styles(&self) -> &[Arc<Stylesheet>] {
        &self.styles
    }

    /// Whether no scripts have been requested.
    #[must_use]
    pub fn has_no_scripts(&self) -> bool {
        self.requested.is_empty()
    }

    /// The catalog with this page's local scripts layered on top.
    #[must_use]
    pub fn resource_bag(&self) -> ResourceBag<'a, Catalog> {
        let mut bag = ResourceBag::new(self.catalog);
        for resource in &self.local {
            bag.overlay(Arc::clone(resource));
        }
        bag
    }

    /// Resolve the page's scripts into a load plan.
    pub fn plan(&self, policy: ConflictPolicy) -> Result<LoadPlan> {
        let bag = self.resource_bag();
        PlanResolver::new(&bag).with_conflict_policy(policy).resolve(&self.requested)
    }

    fn add_local(&mut self, resource: Resource) {
        let name = resource.name.clone();
        self.local.retain(|existing| existing.name != name);
        self.local.push(Arc::new(resource));
        self.request(&name);
    }

    fn request(&mut self, name: &str) {
        if !self.requested.iter().any(|existing| existing == name) {
            self.requested.push(name.to_string());
        }
    }

    fn push_style(&mut self, style: Arc<Stylesheet>) {
        if !self.styles.iter().any(|existing| **existing == *style) {
            self.styles.push(style);
        }
    }
}

/// A page selection file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageSpec {
    /// Catalog scripts to include.
    #[serde(default)]
    pub include: Vec<String>,
    /// Catalog stylesheets to include.
    #[serde(default)]
    pub styles: Vec<String>,
    /// Page-only file scripts.
    #[serde(default)]
    pub script: Vec<PageScript>,
    /// Inline blocks.
    #[serde(default)]
    pub inline: Vec<PageInline>,
    /// Page-only stylesheets.
    #[serde(default)]
    pub style: Vec<PageStyle>,
}

/// `[[script]]` entry of a page file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageScript {
    /// Script name.
    pub name: String,
    /// Debug path.
    pub debug: String,
    /// Production path. Defaults to `debug`.
    pub min: Option<String>,
    /// Dependency names.
    #[serde(default)]
    pub deps: Vec<String>,
}

/// `[[inline]]` entry of a page file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageInline {
    /// Optional name; generated when missing.
    pub name: Option<String>,
    /// Script body.
    pub body: String,
    /// Dependency names.
    #[serde(default)]
    pub deps: Vec<String>,
}

/// `[[style]]` entry of a page file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageStyle {
    /// Debug path.
    pub debug: String,
    /// Production path. Defaults to `debug`.
    pub min: Option<String>,
}

impl PageSpec {
    /// Read and parse a page file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read page file: {}", path.display()))?;
        toml::from_str(&content).map_err(|e| {
            PlanError::CatalogParseError {
                file: path.display().to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }
}
