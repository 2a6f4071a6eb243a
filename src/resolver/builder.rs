//! Breadth-first tree construction with push-down.
//!
//! Starting from a tree that holds only its root at depth 0, the builder walks
//! the dependencies of each layer into the next one. A dependency that is
//! already in the tree but too shallow is pushed down, and its own
//! dependencies are pushed below it in turn, so every resource ends up
//! strictly deeper than everything that needs it.
//!
//! The builder assumes the closure it walks is acyclic; the resolver checks
//! that with [`DependencyGraph`](super::dependency_graph::DependencyGraph)
//! before any tree is built.

use anyhow::Result;
use std::collections::HashSet;
use std::sync::Arc;

use super::shared::{SharedDependencies, TreeId};
use super::tree::{DependencyTree, Placement};
use crate::core::{PlanError, Resource, ResourceLookup};

/// Builds one tree at a time against a resource lookup.
pub struct TreeBuilder<'a, L: ?Sized> {
    lookup: &'a L,
}

impl<'a, L> TreeBuilder<'a, L>
where
    L: ResourceLookup + ?Sized,
{
    /// Create a builder over `lookup`.
    pub fn new(lookup: &'a L) -> Self {
        Self {
            lookup,
        }
    }

    /// Start a tree for `root` and record the root in the tracker.
    pub fn start_tree(
        &self,
        root: Arc<Resource>,
        id: TreeId,
        shared: &mut SharedDependencies,
    ) -> DependencyTree {
        tracing::debug!("Starting {id} at '{}'", root.name);
        shared.record(&root.name, id);
        DependencyTree::with_root(root)
    }

    /// Fill in every layer below the root.
    ///
    /// # Errors
    ///
    /// [`PlanError::UnregisteredDependency`] when a dependency name is unknown.
    pub fn build(
        &self,
        tree: &mut DependencyTree,
        id: TreeId,
        shared: &mut SharedDependencies,
    ) -> Result<()> {
        let mut target = 1;
        let mut candidates = Self::dependencies_of_layer(tree, 0);

        while !candidates.is_empty() {
            tree.ensure_layer(target);
            for (name, parent) in candidates {
                match tree.placement(&name) {
                    Placement::Absent => {
                        let resource = self.resolve(&name, &parent)?;
                        tracing::trace!("{id}: placing '{name}' at depth {target}");
                        tree.add_resource(target, resource);
                        shared.record(&name, id);
                    }
                    Placement::At(_) => {
                        self.maybe_push_down(tree, id, &name, &parent, target, shared)?;
                    }
                }
            }
            candidates = Self::dependencies_of_layer(tree, target);
            target += 1;
        }

        Ok(())
    }

    /// Dependency names of every resource in the layer, first mention wins.
    fn dependencies_of_layer(tree: &DependencyTree, depth: usize) -> Vec<(String, String)> {
        let Some(layer) = tree.layer(depth) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for resource in layer.resources() {
            for dep in &resource.dependencies {
                if seen.insert(dep.as_str()) {
                    out.push((dep.clone(), resource.name.clone()));
                }
            }
        }
        out
    }

    /// Push `name` to `target` if it is absent or shallower than that.
    fn maybe_push_down(
        &self,
        tree: &mut DependencyTree,
        id: TreeId,
        name: &str,
        parent: &str,
        target: usize,
        shared: &mut SharedDependencies,
    ) -> Result<()> {
        match tree.placement(name) {
            Placement::At(depth) if depth >= target => Ok(()),
            _ => self.push_down(tree, id, name, parent, target, shared),
        }
    }

    fn push_down(
        &self,
        tree: &mut DependencyTree,
        id: TreeId,
        name: &str,
        parent: &str,
        target: usize,
        shared: &mut SharedDependencies,
    ) -> Result<()> {
        tree.ensure_layer(target);
        let resource = match tree.placement(name) {
            Placement::At(depth) => {
                tracing::trace!("{id}: pushing '{name}' from depth {depth} to {target}");
                tree.move_resource(target, name)?;
                self.resolve(name, parent)?
            }
            Placement::Absent => {
                let resource = self.resolve(name, parent)?;
                tracing::trace!("{id}: placing '{name}' at depth {target}");
                tree.add_resource(target, Arc::clone(&resource));
                shared.record(name, id);
                resource
            }
        };

        for dep in &resource.dependencies {
            self.maybe_push_down(tree, id, dep, name, target + 1, shared)?;
        }
        Ok(())
    }

    fn resolve(&self, name: &str, parent: &str) -> Result<Arc<Resource>> {
        self.lookup.lookup(name).ok_or_else(|| {
            PlanError::UnregisteredDependency {
                name: name.to_string(),
                required_by: Some(parent.to_string()),
            }
            .into()
        })
    }
}
