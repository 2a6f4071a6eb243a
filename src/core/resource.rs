//! Resource definitions shared by the catalog, the resolver and the renderer.
//!
//! A [`Resource`] is a named, immutable declaration: a unique name, an ordered
//! list of prerequisite names and a [`ResourceKind`]. The resolver only ever
//! looks at the name and the dependency list; the kind is consulted by the
//! renderer when it turns a finished plan into markup.
//!
//! Resources are handed around as `Arc<Resource>` so that looking up the same
//! name twice within one resolution pass yields the same allocation.
//!
//! # Examples
//!
//! ```rust
//! use scriptplan::core::{Resource, ResourceKind};
//!
//! let jquery = Resource::file("jquery", "jquery.js", "jquery.min.js", Vec::<String>::new());
//! let site = Resource::file("site", "site.js", "site.min.js", ["jquery"]);
//!
//! assert!(jquery.dependencies.is_empty());
//! assert_eq!(site.dependencies, vec!["jquery".to_string()]);
//! assert!(matches!(site.kind, ResourceKind::File { .. }));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// How a resource is delivered to the page.
///
/// The resolver treats both variants identically; only the renderer
/// distinguishes between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResourceKind {
    /// A script file with separate debug and production paths.
    File {
        /// Path used when rendering in debug mode. Usually unminified.
        debug_path: String,
        /// Path used in production. Often a CDN URL or a minified file.
        min_path: String,
    },

    /// A block of code emitted directly into the page.
    ///
    /// The body is wrapped in an immediately invoked function when rendered,
    /// so variables declared inside it do not leak into the page.
    Inline {
        /// Script source without surrounding `<script>` tags.
        body: String,
    },
}

/// A named loadable unit with declared prerequisites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Unique name used to refer to this resource from dependency lists.
    pub name: String,
    /// Names of resources that must load before this one, in declaration order.
    pub dependencies: Vec<String>,
    /// Delivery kind.
    pub kind: ResourceKind,
}

impl Resource {
    /// Create a file resource.
    pub fn file<I, S>(
        name: impl Into<String>,
        debug_path: impl Into<String>,
        min_path: impl Into<String>,
        dependencies: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            kind: ResourceKind::File {
                debug_path: debug_path.into(),
                min_path: min_path.into(),
            },
        }
    }

    /// Create an inline resource.
    pub fn inline<I, S>(name: impl Into<String>, body: impl Into<String>, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            kind: ResourceKind::Inline {
                body: body.into(),
            },
        }
    }

    /// Whether this resource carries inline code.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        matches!(self.kind, ResourceKind::Inline { .. })
    }

    /// Whether this resource declares any prerequisites.
    #[must_use]
    pub fn has_dependencies(&self) -> bool {
        !self.dependencies.is_empty()
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Name-based access to resource definitions.
///
/// This is the only view of the catalog the resolver needs. Implementations
/// must return the same `Arc` for a given name for the whole resolution pass.
pub trait ResourceLookup {
    /// Look up a resource by name.
    fn lookup(&self, name: &str) -> Option<Arc<Resource>>;

    /// Whether a resource with this name is known.
    fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}

/// Split a comma-separated dependency list such as `"jquery, site,ui"`.
///
/// Mirrors the registration shorthand where dependencies are declared as one
/// string separated by a comma and an optional space. Empty input yields an
/// empty list.
#[must_use]
pub fn split_dependency_list(list: &str) -> Vec<String> {
    if list.trim().is_empty() {
        return Vec::new();
    }
    list.split(',').map(|part| part.strip_prefix(' ').unwrap_or(part).to_string()).collect()
}
