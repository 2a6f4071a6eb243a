//! Layered dependency trees.
//!
//! A [`DependencyTree`] is an ordered list of [`Layer`]s indexed by *depth*:
//! depth 0 holds the requested root and each deeper layer holds prerequisites
//! of the layers above it. Resources in one layer may load concurrently.
//!
//! Load order runs the other way. The *load step* of a layer is
//! `layer_count - 1 - depth`, so the deepest layer loads first. The invariant
//! every mutation preserves is that a resource sits strictly deeper than
//! everything in the tree that depends on it.
//!
//! ```text
//! depth  layer                step
//!   0    { loggedin }           2
//!   1    { site }               1
//!   2    { jquery }             0
//! ```

use anyhow::{Result, anyhow};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::core::Resource;

/// Where a resource currently sits in a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Not in this tree.
    Absent,
    /// In the layer at this depth.
    At(usize),
}

/// One depth of a tree: a name-keyed set of resources.
#[derive(Debug, Clone, Default)]
pub struct Layer {
    depth: usize,
    resources: BTreeMap<String, Arc<Resource>>,
}

impl Layer {
    fn new(depth: usize) -> Self {
        Self {
            depth,
            resources: BTreeMap::new(),
        }
    }

    /// Depth of this layer within its tree.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of resources in the layer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the layer holds no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Whether a resource with this name is in the layer.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    /// Resource names in name order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    /// Resources in name order.
    pub fn resources(&self) -> impl Iterator<Item = &Arc<Resource>> {
        self.resources.values()
    }

    fn insert(&mut self, resource: Arc<Resource>) {
        self.resources.insert(resource.name.clone(), resource);
    }

    fn remove(&mut self, name: &str) -> Option<Arc<Resource>> {
        self.resources.remove(name)
    }
}

/// Layered structure rooted at one requested resource (or, after merging, several).
#[derive(Debug, Clone, Default)]
pub struct DependencyTree {
    layers: Vec<Layer>,
    depth_map: HashMap<String, usize>,
}

impl DependencyTree {
    /// Create a tree with no layers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tree whose layer 0 holds only `root`.
    #[must_use]
    pub fn with_root(root: Arc<Resource>) -> Self {
        let mut tree = Self::new();
        tree.add_resource(0, root);
        tree
    }

    /// Build a tree from explicit depths, e.g. a longest-path layering.
    ///
    /// Every resource must have an entry in `depths`.
    pub fn from_depths<'a, I>(resources: I, depths: &BTreeMap<String, usize>) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Arc<Resource>>,
    {
        let mut tree = Self::new();
        for resource in resources {
            let depth = depths
                .get(&resource.name)
                .copied()
                .ok_or_else(|| anyhow!("No depth computed for '{}'", resource.name))?;
            tree.add_resource(depth, Arc::clone(resource));
        }
        Ok(tree)
    }

    /// Number of layers, including empty ones.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Total number of resources across all layers.
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.depth_map.len()
    }

    /// Layers from depth 0 downward.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// The layer at `depth`, if it exists.
    #[must_use]
    pub fn layer(&self, depth: usize) -> Option<&Layer> {
        self.layers.get(depth)
    }

    /// Where `name` currently sits.
    #[must_use]
    pub fn placement(&self, name: &str) -> Placement {
        match self.depth_map.get(name) {
            Some(&depth) => Placement::At(depth),
            None => Placement::Absent,
        }
    }

    /// Depth of `name`, if present.
    #[must_use]
    pub fn depth_of(&self, name: &str) -> Option<usize> {
        self.depth_map.get(name).copied()
    }

    /// Whether `name` is anywhere in the tree.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.depth_map.contains_key(name)
    }

    /// Names of every resource in the tree, in no particular order.
    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.depth_map.keys().map(String::as_str)
    }

    /// Every resource in the tree, shallowest layer first.
    pub fn resources(&self) -> impl Iterator<Item = &Arc<Resource>> {
        self.layers.iter().flat_map(Layer::resources)
    }

    /// Load step of `name`: 0 for the deepest layer.
    #[must_use]
    pub fn load_step(&self, name: &str) -> Option<usize> {
        self.depth_of(name).map(|depth| self.layers.len() - 1 - depth)
    }

    /// Resource names grouped by load step, first step first.
    #[must_use]
    pub fn load_order(&self) -> Vec<Vec<String>> {
        self.layers
            .iter()
            .rev()
            .map(|layer| layer.names().map(str::to_string).collect())
            .collect()
    }

    /// Grow the layer list so that `depth` exists. Idempotent.
    pub fn ensure_layer(&mut self, depth: usize) {
        while self.layers.len() <= depth {
            let next = self.layers.len();
            self.layers.push(Layer::new(next));
        }
    }

    /// Place a resource that is not yet in the tree.
    ///
    /// Returns `false` and leaves the tree untouched if the name is already present.
    pub fn add_resource(&mut self, depth: usize, resource: Arc<Resource>) -> bool {
        if self.depth_map.contains_key(&resource.name) {
            return false;
        }
        self.ensure_layer(depth);
        self.depth_map.insert(resource.name.clone(), depth);
        self.layers[depth].insert(resource);
        true
    }

    /// Move a resource from its current layer to `target`.
    pub fn move_resource(&mut self, target: usize, name: &str) -> Result<()> {
        let current =
            self.depth_of(name).ok_or_else(|| anyhow!("Cannot move '{name}': not in tree"))?;
        if current == target {
            return Ok(());
        }
        let resource = self.layers[current]
            .remove(name)
            .ok_or_else(|| anyhow!("Layer {current} lost track of '{name}'"))?;
        self.ensure_layer(target);
        self.layers[target].insert(resource);
        self.depth_map.insert(name.to_string(), target);
        Ok(())
    }

    /// Insert `count` empty layers directly below the layer at `depth`.
    ///
    /// Every deeper layer and resource is renumbered. Nothing is reordered, and
    /// the layer count never shrinks. A `depth` at or past the bottom appends
    /// the new layers at the end.
    pub fn extend_below_layer(&mut self, depth: usize, count: usize) {
        if count == 0 {
            return;
        }
        let insert_at = (depth + 1).min(self.layers.len());
        let empties = (0..count).map(|offset| Layer::new(insert_at + offset));
        self.layers.splice(insert_at..insert_at, empties);

        for (index, layer) in self.layers.iter_mut().enumerate().skip(insert_at + count) {
            layer.depth = index;
        }
        for value in self.depth_map.values_mut() {
            if *value >= insert_at {
                *value += count;
            }
        }
    }

    /// `depth(a) - depth(b)`. Positive when `a` sits below `b`.
    #[must_use]
    pub fn distance(&self, a: &str, b: &str) -> Option<isize> {
        let a = self.depth_of(a)?;
        let b = self.depth_of(b)?;
        Some(a as isize - b as isize)
    }

    /// Number of layers strictly deeper than the one holding `name`.
    #[must_use]
    pub fn layers_below(&self, name: &str) -> Option<usize> {
        self.depth_of(name).map(|depth| self.layers.len() - depth - 1)
    }

    /// Drop empty layers. Relative order of the remaining layers is unchanged.
    pub fn compact(&mut self) {
        if self.layers.iter().all(|layer| !layer.is_empty()) {
            return;
        }
        self.layers.retain(|layer| !layer.is_empty());
        for (index, layer) in self.layers.iter_mut().enumerate() {
            layer.depth = index;
            for name in layer.resources.keys() {
                self.depth_map.insert(name.clone(), index);
            }
        }
    }

    /// Pairs `(dependent, dependency)` that break the ordering invariant.
    ///
    /// Dependencies that are not part of this tree are ignored.
    #[must_use]
    pub fn ordering_violations(&self) -> Vec<(String, String)> {
        let mut violations = Vec::new();
        for resource in self.resources() {
            let Some(depth) = self.depth_of(&resource.name) else {
                continue;
            };
            for dep in &resource.dependencies {
                if let Some(dep_depth) = self.depth_of(dep) {
                    if dep_depth <= depth {
                        violations.push((resource.name.clone(), dep.clone()));
                    }
                }
            }
        }
        violations
    }
}
