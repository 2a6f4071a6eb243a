//! Dependency graph checks run before any tree is built.
//!
//! The tree builder's push-down step recurses along dependency edges and would
//! never terminate on a cycle, so every resolution pass first walks the
//! dependency closure of the requested roots into a [`DependencyGraph`]. The walk
//! fails fast on unregistered names, and [`DependencyGraph::detect_cycles`] rejects
//! loops with the full cycle path. Both checks happen before any tree exists,
//! so a failing pass never produces partial output.
//!
//! The same graph provides a longest-path layering, used when two trees have
//! to be re-layered from scratch instead of aligned.

use anyhow::{Result, anyhow};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use crate::core::{PlanError, Resource, ResourceLookup};

/// Color states for cycle detection using DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Node has not been visited.
    White,
    /// Node is currently being visited (in the DFS stack).
    Gray,
    /// Node has been fully visited.
    Black,
}

/// Directed graph of resource names. An edge `a → b` means `a` depends on `b`.
#[derive(Debug)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Walk the dependency closure of `roots` through `lookup`.
    ///
    /// # Errors
    ///
    /// [`PlanError::UnregisteredDependency`] for the first name that `lookup`
    /// does not know. Names are visited breadth-first in declaration order, so
    /// the reported name is deterministic.
    pub fn from_closure<L>(roots: &[String], lookup: &L) -> Result<Self>
    where
        L: ResourceLookup + ?Sized,
    {
        let mut graph = Self::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(String, Option<String>)> = VecDeque::new();
        for root in roots {
            if seen.insert(root.clone()) {
                queue.push_back((root.clone(), None));
            }
        }

        while let Some((name, required_by)) = queue.pop_front() {
            let resource = lookup.lookup(&name).ok_or_else(|| PlanError::UnregisteredDependency {
                name: name.clone(),
                required_by,
            })?;
            graph.ensure_node(&name);

            for dep in &resource.dependencies {
                graph.add_dependency(&name, dep);
                if seen.insert(dep.clone()) {
                    queue.push_back((dep.clone(), Some(name.clone())));
                }
            }
        }

        Ok(graph)
    }

    /// Build a graph restricted to `resources`; edges to names outside the set are ignored.
    pub fn from_resources<'a, I>(resources: I) -> Self
    where
        I: IntoIterator<Item = &'a Arc<Resource>>,
    {
        let resources: Vec<&Arc<Resource>> = resources.into_iter().collect();
        let mut graph = Self::new();
        for resource in &resources {
            graph.ensure_node(&resource.name);
        }
        for resource in &resources {
            for dep in &resource.dependencies {
                if graph.node_map.contains_key(dep) {
                    graph.add_dependency(&resource.name, dep);
                }
            }
        }
        graph
    }

    fn ensure_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&index) = self.node_map.get(name) {
            index
        } else {
            let index = self.graph.add_node(name.to_string());
            self.node_map.insert(name.to_string(), index);
            index
        }
    }

    /// Add a dependency relationship: `from` depends on `to`.
    pub fn add_dependency(&mut self, from: &str, to: &str) {
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);

        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
    }

    /// Detect cycles using DFS with colors.
    ///
    /// # Errors
    ///
    /// [`PlanError::CircularDependency`] carrying the cycle path.
    pub fn detect_cycles(&self) -> Result<()> {
        let mut colors: HashMap<NodeIndex, Color> =
            self.graph.node_indices().map(|node| (node, Color::White)).collect();
        let mut path: Vec<NodeIndex> = Vec::new();

        for node in self.graph.node_indices() {
            if matches!(colors.get(&node), Some(Color::White)) {
                if let Some(cycle) = self.dfs_visit(node, &mut colors, &mut path) {
                    return Err(PlanError::CircularDependency {
                        chain: cycle.into_iter().map(|idx| self.graph[idx].clone()).collect(),
                    }
                    .into());
                }
            }
        }

        Ok(())
    }

    fn dfs_visit(
        &self,
        node: NodeIndex,
        colors: &mut HashMap<NodeIndex, Color>,
        path: &mut Vec<NodeIndex>,
    ) -> Option<Vec<NodeIndex>> {
        colors.insert(node, Color::Gray);
        path.push(node);

        // petgraph yields neighbors newest-edge-first; reverse for declaration order
        let mut neighbors: Vec<NodeIndex> = self.graph.neighbors(node).collect();
        neighbors.reverse();

        for neighbor in neighbors {
            match colors.get(&neighbor) {
                Some(Color::Gray) => {
                    let start = path.iter().position(|n| *n == neighbor).unwrap_or(0);
                    let mut cycle = path[start..].to_vec();
                    cycle.push(neighbor);
                    return Some(cycle);
                }
                Some(Color::White) => {
                    if let Some(cycle) = self.dfs_visit(neighbor, colors, path) {
                        return Some(cycle);
                    }
                }
                _ => {}
            }
        }

        path.pop();
        colors.insert(node, Color::Black);
        None
    }

    /// Longest-path depth of every node, measured from the nodes nothing depends on.
    ///
    /// A node's depth is one more than the deepest of its dependents, so every
    /// dependency sits strictly deeper than everything that needs it.
    pub fn longest_path_depths(&self) -> Result<BTreeMap<String, usize>> {
        let order = toposort(&self.graph, None).map_err(|cycle| {
            anyhow!("Cannot layer dependency graph: cycle through '{}'", self.graph[cycle.node_id()])
        })?;

        let mut depths: HashMap<NodeIndex, usize> = HashMap::new();
        for idx in order {
            let depth = *depths.entry(idx).or_insert(0);
            for dep in self.graph.neighbors(idx) {
                let entry = depths.entry(dep).or_insert(0);
                *entry = (*entry).max(depth + 1);
            }
        }

        Ok(depths.into_iter().map(|(idx, depth)| (self.graph[idx].clone(), depth)).collect())
    }

    /// Whether the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}
