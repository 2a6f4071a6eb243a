//! Load-order resolution.
//!
//! This module turns a list of requested resource names into a [`LoadPlan`]:
//! one or more independent chains of load groups in which every resource loads
//! after all of its prerequisites, and resources with no ordering relationship
//! share a group so they can be fetched in parallel.
//!
//! # Resolution Process
//!
//! One pass of [`PlanResolver::resolve`] runs these steps:
//!
//! 1. **Deduplication**: repeated requests for the same name are dropped
//! 2. **Closure Check**: [`dependency_graph::DependencyGraph`] walks every
//!    transitive dependency, rejecting unknown names and cycles before any tree exists
//! 3. **Tree Building**: [`builder::TreeBuilder`] grows one layered tree per
//!    requested root, pushing shared prerequisites below everything that needs them
//! 4. **Pruning**: [`shared::SharedDependencies`] keeps only names that ended
//!    up in more than one tree
//! 5. **Merging**: [`merge::TreeMerger`] aligns and unions trees that share
//!    names until no name is shared
//! 6. **Standalone Folding**: trees that are a single layer (dependency-free
//!    roots) are folded into one, so they share a root group
//! 7. **Compaction**: empty layers left over from alignment are dropped
//! 8. **Chain Conversion**: [`load_group::LoadChain::from_tree`] flips each
//!    tree into load order
//!
//! A pass either returns a complete plan or an error. Nothing partial escapes.
//!
//! # Example
//!
//! ```rust
//! use scriptplan::catalog::Catalog;
//! use scriptplan::resolver::PlanResolver;
//!
//! let mut catalog = Catalog::new();
//! catalog.add_file("jquery", "jquery.js", "jquery.min.js", "").unwrap();
//! catalog.add_file("site", "site.js", "site.min.js", "jquery").unwrap();
//! catalog.add_file("loggedin", "loggedin.js", "loggedin.min.js", "site").unwrap();
//!
//! let plan = PlanResolver::new(&catalog).resolve(&["loggedin".to_string()]).unwrap();
//! assert_eq!(plan.len(), 1);
//! assert_eq!(plan.locate("jquery"), Some((0, 0)));
//! assert_eq!(plan.locate("loggedin"), Some((0, 2)));
//! ```

pub mod builder;
pub mod dependency_graph;
pub mod load_group;
pub mod merge;
pub mod shared;
pub mod tree;

use anyhow::Result;
use std::collections::{BTreeMap, HashSet};

use crate::config::ConflictPolicy;
use crate::core::{PlanError, ResourceLookup};

use self::builder::TreeBuilder;
use self::dependency_graph::DependencyGraph;
use self::merge::TreeMerger;
use self::shared::{SharedDependencies, TreeId};
use self::tree::DependencyTree;

pub use self::load_group::{LoadChain, LoadGroup, LoadGroupRef, LoadPlan};

/// Orchestrates one resolution pass over a resource lookup.
///
/// A resolver is cheap to create and holds per-pass state, so build a fresh
/// one for every page.
pub struct PlanResolver<'a, L: ?Sized> {
    lookup: &'a L,
    merger: TreeMerger,
    trees: BTreeMap<TreeId, DependencyTree>,
    shared: SharedDependencies,
}

impl<'a, L> PlanResolver<'a, L>
where
    L: ResourceLookup + ?Sized,
{
    /// Create a resolver that rejects structural merge conflicts.
    pub fn new(lookup: &'a L) -> Self {
        Self {
            lookup,
            merger: TreeMerger::default(),
            trees: BTreeMap::new(),
            shared: SharedDependencies::new(),
        }
    }

    /// Choose how structural merge conflicts are handled.
    #[must_use]
    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.merger = TreeMerger::new(policy);
        self
    }

    /// Run a full pass for `requested` and return the plan.
    ///
    /// # Errors
    ///
    /// - [`PlanError::UnregisteredDependency`] for an unknown name
    /// - [`PlanError::CircularDependency`] for a dependency cycle
    /// - [`PlanError::StructuralMergeConflict`] under [`ConflictPolicy::Reject`]
    pub fn resolve(mut self, requested: &[String]) -> Result<LoadPlan> {
        let roots = dedupe(requested);
        if roots.is_empty() {
            tracing::debug!("Nothing requested; empty plan");
            return Ok(LoadPlan::default());
        }

        let graph = DependencyGraph::from_closure(&roots, self.lookup)?;
        graph.detect_cycles()?;
        tracing::debug!(
            "Closure of {} root(s): {} resources, {} edges",
            roots.len(),
            graph.node_count(),
            graph.edge_count()
        );

        self.build_trees(&roots)?;
        let merges = self.merge_trees()?;
        let folded = self.fold_standalone();
        let plan = self.into_plan();
        tracing::debug!(
            "Resolved {} root(s) into {} chain(s) ({merges} merge(s), {folded} standalone fold(s))",
            roots.len(),
            plan.len()
        );
        Ok(plan)
    }

    /// Start and build one tree per root, then prune single-tree records.
    ///
    /// Roots are assumed distinct. Tree ids follow the order of `roots`.
    pub fn build_trees(&mut self, roots: &[String]) -> Result<()> {
        let builder = TreeBuilder::new(self.lookup);
        let first_id = self.trees.keys().next_back().map_or(0, |id| id.0 + 1);

        for (offset, name) in roots.iter().enumerate() {
            let root = self.lookup.lookup(name).ok_or_else(|| PlanError::UnregisteredDependency {
                name: name.clone(),
                required_by: None,
            })?;
            let id = TreeId(first_id + offset);
            let mut tree = builder.start_tree(root, id, &mut self.shared);
            builder.build(&mut tree, id, &mut self.shared)?;
            tracing::trace!("{id}: {} layer(s), {} resource(s)", tree.layer_count(), tree.resource_count());
            self.trees.insert(id, tree);
        }

        self.shared.prune_single_use();
        Ok(())
    }

    /// Merge trees until no resource is shared. Returns the number of merges.
    pub fn merge_trees(&mut self) -> Result<usize> {
        self.merger.merge_all(&mut self.trees, &mut self.shared)
    }

    /// Fold every single-layer tree into the first one. Returns how many were folded.
    pub fn fold_standalone(&mut self) -> usize {
        let standalone: Vec<TreeId> = self
            .trees
            .iter()
            .filter(|(_, tree)| tree.layers().iter().filter(|layer| !layer.is_empty()).count() == 1)
            .map(|(id, _)| *id)
            .collect();

        let Some((&target_id, rest)) = standalone.split_first() else {
            return 0;
        };

        let absorbed: Vec<DependencyTree> =
            rest.iter().filter_map(|id| self.trees.remove(id)).collect();
        if let Some(target) = self.trees.get_mut(&target_id) {
            target.compact();
            for tree in &absorbed {
                for resource in tree.resources() {
                    target.add_resource(0, resource.clone());
                }
            }
        }
        absorbed.len()
    }

    /// Trees of the current pass, by id.
    #[must_use]
    pub fn trees(&self) -> &BTreeMap<TreeId, DependencyTree> {
        &self.trees
    }

    /// The shared-dependency tracker of the current pass.
    #[must_use]
    pub fn shared(&self) -> &SharedDependencies {
        &self.shared
    }

    /// Compact every tree and convert it into a chain, in tree id order.
    #[must_use]
    pub fn into_plan(mut self) -> LoadPlan {
        let chains = self
            .trees
            .values_mut()
            .map(|tree| {
                tree.compact();
                LoadChain::from_tree(tree)
            })
            .collect();
        LoadPlan::new(chains)
    }
}

/// Drop repeated names, keeping the first occurrence.
fn dedupe(requested: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    requested.iter().filter(|name| seen.insert(name.as_str())).cloned().collect()
}
