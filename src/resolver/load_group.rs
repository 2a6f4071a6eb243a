//! Load chains: the output form of a resolved tree.
//!
//! A [`LoadChain`] lists the layers of one tree in load order. Its first
//! group (the root group) loads first; every later group waits for the one
//! before it. Groups are addressed by index, and [`LoadGroupRef`] provides
//! `parent`/`child` navigation without any back-pointers.

use serde::{Serialize, Serializer};
use std::sync::Arc;

use super::tree::DependencyTree;
use crate::core::Resource;

/// Resources that may load concurrently, at one load step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadGroup {
    step: usize,
    #[serde(serialize_with = "serialize_names")]
    resources: Vec<Arc<Resource>>,
}

fn serialize_names<S>(resources: &[Arc<Resource>], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(resources.iter().map(|r| r.name.as_str()))
}

impl LoadGroup {
    /// Load step of this group: 0 for the root group.
    #[must_use]
    pub fn step(&self) -> usize {
        self.step
    }

    /// Resources in name order.
    #[must_use]
    pub fn resources(&self) -> &[Arc<Resource>] {
        &self.resources
    }

    /// Resource names in name order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.resources.iter().map(|r| r.name.as_str()).collect()
    }

    /// Inline blocks in this group.
    pub fn inline_resources(&self) -> impl Iterator<Item = &Arc<Resource>> {
        self.resources.iter().filter(|r| r.is_inline())
    }

    /// File scripts in this group.
    pub fn file_resources(&self) -> impl Iterator<Item = &Arc<Resource>> {
        self.resources.iter().filter(|r| !r.is_inline())
    }
}

/// The groups of one tree, root group first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LoadChain {
    groups: Vec<LoadGroup>,
}

impl LoadChain {
    /// Convert a tree: its deepest layer becomes the root group.
    ///
    /// Empty layers are skipped, so step numbers are always contiguous.
    #[must_use]
    pub fn from_tree(tree: &DependencyTree) -> Self {
        let groups = tree
            .layers()
            .iter()
            .rev()
            .filter(|layer| !layer.is_empty())
            .enumerate()
            .map(|(step, layer)| LoadGroup {
                step,
                resources: layer.resources().cloned().collect(),
            })
            .collect();
        Self {
            groups,
        }
    }

    /// The group that loads first.
    #[must_use]
    pub fn root(&self) -> Option<LoadGroupRef<'_>> {
        self.group(0)
    }

    /// The group at `step`.
    #[must_use]
    pub fn group(&self, step: usize) -> Option<LoadGroupRef<'_>> {
        (step < self.groups.len()).then_some(LoadGroupRef {
            chain: self,
            index: step,
        })
    }

    /// Groups in load order.
    pub fn groups(&self) -> impl Iterator<Item = &LoadGroup> {
        self.groups.iter()
    }

    /// Number of load steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether the chain has no groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Load step of `name` within this chain.
    #[must_use]
    pub fn step_of(&self, name: &str) -> Option<usize> {
        self.groups
            .iter()
            .find(|group| group.resources.iter().any(|r| r.name == name))
            .map(LoadGroup::step)
    }

    /// Total resources across all groups.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.groups.iter().map(|g| g.resources.len()).sum()
    }
}

/// Cursor over one group of a chain.
#[derive(Debug, Clone, Copy)]
pub struct LoadGroupRef<'a> {
    chain: &'a LoadChain,
    index: usize,
}

impl<'a> LoadGroupRef<'a> {
    /// The group this cursor points at.
    #[must_use]
    pub fn group(&self) -> &'a LoadGroup {
        &self.chain.groups[self.index]
    }

    /// Load step of the group.
    #[must_use]
    pub fn step(&self) -> usize {
        self.index
    }

    /// The group that must finish before this one. `None` for the root group.
    #[must_use]
    pub fn parent(&self) -> Option<LoadGroupRef<'a>> {
        self.index.checked_sub(1).and_then(|index| self.chain.group(index))
    }

    /// The group that waits on this one. `None` for the last group.
    #[must_use]
    pub fn child(&self) -> Option<LoadGroupRef<'a>> {
        self.chain.group(self.index + 1)
    }
}

/// Every chain produced by one resolution pass.
///
/// Chains are independent: nothing in one chain depends on anything in another,
/// so they may load in parallel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadPlan {
    chains: Vec<LoadChain>,
}

impl LoadPlan {
    /// Wrap a list of chains.
    #[must_use]
    pub fn new(chains: Vec<LoadChain>) -> Self {
        Self {
            chains,
        }
    }

    /// Chains in tree order.
    #[must_use]
    pub fn chains(&self) -> &[LoadChain] {
        &self.chains
    }

    /// Number of chains.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Whether nothing needs to load.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// `(chain index, load step)` of `name`.
    #[must_use]
    pub fn locate(&self, name: &str) -> Option<(usize, usize)> {
        self.chains
            .iter()
            .enumerate()
            .find_map(|(index, chain)| chain.step_of(name).map(|step| (index, step)))
    }

    /// Total resources across all chains.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.chains.iter().map(LoadChain::resource_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn res(name: &str) -> Arc<Resource> {
        Arc::new(Resource::file(name, "x.js", "x.js", Vec::<String>::new()))
    }

    fn chain() -> LoadChain {
        let mut tree = DependencyTree::with_root(res("loggedin"));
        tree.add_resource(1, res("site"));
        tree.add_resource(3, res("jquery"));
        LoadChain::from_tree(&tree)
    }

    #[test]
    fn test_deepest_layer_is_root_group() {
        let chain = chain();
        assert_eq!(chain.len(), 3);
        let root = chain.root().unwrap();
        assert_eq!(root.group().names(), vec!["jquery"]);
        assert!(root.parent().is_none());
        assert_eq!(chain.step_of("loggedin"), Some(2));
    }

    #[test]
    fn test_navigation() {
        let chain = chain();
        let root = chain.root().unwrap();
        let middle = root.child().unwrap();
        assert_eq!(middle.group().names(), vec!["site"]);
        assert_eq!(middle.parent().unwrap().step(), 0);
        let last = middle.child().unwrap();
        assert!(last.child().is_none());
        assert_eq!(last.group().step(), 2);
    }

    #[test]
    fn test_plan_locate() {
        let plan = LoadPlan::new(vec![chain(), LoadChain::from_tree(&DependencyTree::with_root(res("solo")))]);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.locate("site"), Some((0, 1)));
        assert_eq!(plan.locate("solo"), Some((1, 0)));
        assert_eq!(plan.locate("nope"), None);
        assert_eq!(plan.resource_count(), 4);
    }

    #[test]
    fn test_plan_serializes_names() {
        let plan = LoadPlan::new(vec![chain()]);
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["chains"][0][0]["resources"][0], "jquery");
        assert_eq!(json["chains"][0][2]["step"], 2);
    }

    #[test]
    fn test_empty_plan() {
        let plan = LoadPlan::default();
        assert!(plan.is_empty());
        assert_eq!(plan.resource_count(), 0);
    }
}
