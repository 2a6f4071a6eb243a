//! The resource catalog: every script a site can put on a page.
//!
//! A [`Catalog`] maps unique names to [`Resource`] definitions. It is built once
//! (usually from `scriptplan.toml`, see [`manifest`]) and then shared read-only
//! by every resolution pass. Lookups hand out clones of the stored `Arc`, so the
//! same name always yields the same allocation.
//!
//! # Example
//!
//! ```rust
//! use scriptplan::catalog::Catalog;
//! use scriptplan::core::ResourceLookup;
//!
//! let mut catalog = Catalog::new();
//! catalog.add_file("jquery", "jquery.js", "jquery.min.js", "").unwrap();
//! catalog.add_file("site", "site.js", "site.min.js", "jquery").unwrap();
//! catalog.add_inline("boot", "init();", "site").unwrap();
//!
//! assert_eq!(catalog.len(), 3);
//! assert!(catalog.validate().is_ok());
//! assert_eq!(catalog.lookup("site").unwrap().dependencies, vec!["jquery".to_string()]);
//! ```

pub mod manifest;

use anyhow::Result;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::{PlanError, Resource, ResourceLookup, split_dependency_list};
use crate::resolver::dependency_graph::DependencyGraph;

pub use manifest::{CatalogManifest, find_catalog, find_catalog_from, find_catalog_with_optional};

/// Name of the catalog file searched for by [`find_catalog`].
pub const CATALOG_FILE_NAME: &str = "scriptplan.toml";

/// Registry of named resources.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    resources: BTreeMap<String, Arc<Resource>>,
}

impl Catalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::DuplicateDeclaration`] if the name is taken.
    pub fn add(&mut self, resource: Resource) -> Result<Arc<Resource>> {
        if self.resources.contains_key(&resource.name) {
            return Err(PlanError::DuplicateDeclaration {
                name: resource.name,
            }
            .into());
        }
        let resource = Arc::new(resource);
        self.resources.insert(resource.name.clone(), Arc::clone(&resource));
        Ok(resource)
    }

    /// Register a file script. `dependencies` uses the `"a, b"` shorthand.
    pub fn add_file(
        &mut self,
        name: &str,
        debug_path: &str,
        min_path: &str,
        dependencies: &str,
    ) -> Result<Arc<Resource>> {
        self.add(Resource::file(name, debug_path, min_path, split_dependency_list(dependencies)))
    }

    /// Register an inline script. `dependencies` uses the `"a, b"` shorthand.
    pub fn add_inline(&mut self, name: &str, body: &str, dependencies: &str) -> Result<Arc<Resource>> {
        self.add(Resource::inline(name, body, split_dependency_list(dependencies)))
    }

    /// Number of registered resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Iterate resources in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Resource>> {
        self.resources.values()
    }

    /// Check that every declared dependency exists and that there are no cycles.
    ///
    /// Resolution performs the same checks lazily for the resources a page
    /// actually requests; this variant checks the whole catalog up front.
    pub fn validate(&self) -> Result<()> {
        let names: Vec<String> = self.resources.keys().cloned().collect();
        DependencyGraph::from_closure(&names, self)?.detect_cycles()
    }
}

impl ResourceLookup for Catalog {
    fn lookup(&self, name: &str) -> Option<Arc<Resource>> {
        self.resources.get(name).cloned()
    }
}
