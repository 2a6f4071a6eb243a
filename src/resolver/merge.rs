//! Merging trees that share resources.
//!
//! Two trees that contain the same resource cannot load independently: the
//! shared resource would be fetched twice and the two copies would race. The
//! merger aligns the trees so that every shared resource sits at the same
//! depth in both, then unions them layer by layer.
//!
//! Alignment only ever inserts empty layers, which keeps the ordering invariant
//! intact in both trees. It is possible only when the trees agree on the
//! relative order of their shared resources:
//!
//! - When two shared resources are level in one tree and ordered in the other,
//!   the union is re-layered from scratch. Neither order is wrong.
//! - When one tree loads a shared resource before another and the second tree
//!   loads them the other way round, the pass fails with
//!   [`PlanError::StructuralMergeConflict`], or under
//!   [`ConflictPolicy::Relayer`] the union is re-layered as well.

use anyhow::{Result, anyhow};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::dependency_graph::DependencyGraph;
use super::shared::{SharedDependencies, TreeId};
use super::tree::DependencyTree;
use crate::config::ConflictPolicy;
use crate::core::{PlanError, Resource};

/// Which input tree holds the result of a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Survivor {
    /// The first tree absorbed the second.
    First,
    /// The second tree absorbed the first.
    Second,
}

/// Aligns and unions trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeMerger {
    policy: ConflictPolicy,
}

impl TreeMerger {
    /// Create a merger with the given conflict policy.
    #[must_use]
    pub fn new(policy: ConflictPolicy) -> Self {
        Self {
            policy,
        }
    }

    /// Merge until no resource is shared by two trees. Returns the number of merges.
    ///
    /// Calling this again on the result is a no-op returning 0.
    pub fn merge_all(
        &self,
        trees: &mut BTreeMap<TreeId, DependencyTree>,
        shared: &mut SharedDependencies,
    ) -> Result<usize> {
        let mut merges = 0;
        while let Some(candidate) = shared.next_candidate() {
            let (a, b) = (candidate.first, candidate.second);
            let names = shared.names_shared_by(a, b);
            tracing::debug!(
                "Merging {a} and {b} on '{}' ({} shared)",
                candidate.name,
                names.len()
            );

            let first = trees.remove(&a).ok_or_else(|| anyhow!("{a} is not a live tree"))?;
            let second = trees.remove(&b).ok_or_else(|| anyhow!("{b} is not a live tree"))?;
            let (merged, survivor) = self.merge_pair(first, second, &names)?;

            let (kept, absorbed) = match survivor {
                Survivor::First => (a, b),
                Survivor::Second => (b, a),
            };
            trees.insert(kept, merged);
            shared.absorb(kept, absorbed);
            merges += 1;
        }
        Ok(merges)
    }

    /// Merge two trees that share `names`.
    ///
    /// # Errors
    ///
    /// [`PlanError::StructuralMergeConflict`] when the trees load two shared
    /// names in opposite orders and the policy is [`ConflictPolicy::Reject`].
    pub fn merge_pair(
        &self,
        mut first: DependencyTree,
        mut second: DependencyTree,
        names: &[String],
    ) -> Result<(DependencyTree, Survivor)> {
        let order = shared_order(&first, names)?;

        match check_relative_order(&first, &second, &order) {
            Ok(Agreement::Aligned) => {}
            Ok(Agreement::LevelMismatch) => {
                tracing::debug!("Shared resources are level in one tree only; re-layering union");
                return Ok((relayer(&first, &second)?, Survivor::First));
            }
            Err(conflict) => {
                return match self.policy {
                    ConflictPolicy::Reject => {
                        tracing::warn!("{conflict}");
                        Err(conflict.into())
                    }
                    ConflictPolicy::Relayer => {
                        tracing::debug!("{conflict}; re-layering union");
                        Ok((relayer(&first, &second)?, Survivor::First))
                    }
                };
            }
        }

        align_spacing(&mut first, &mut second, &order)?;
        align_tail(&mut first, &mut second, &order)?;

        if first.layer_count() >= second.layer_count() {
            union_into(&mut first, &second);
            Ok((first, Survivor::First))
        } else {
            union_into(&mut second, &first);
            Ok((second, Survivor::Second))
        }
    }
}

fn depth_in(tree: &DependencyTree, name: &str) -> Result<usize> {
    tree.depth_of(name).ok_or_else(|| anyhow!("Shared resource '{name}' is missing from a tree"))
}

/// Shared names sorted by depth in `tree`, shallowest first, ties by name.
fn shared_order(tree: &DependencyTree, names: &[String]) -> Result<Vec<(usize, String)>> {
    let mut order = names
        .iter()
        .map(|name| Ok((depth_in(tree, name)?, name.clone())))
        .collect::<Result<Vec<_>>>()?;
    order.sort();
    Ok(order)
}

/// How two trees relate on their shared names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Agreement {
    /// Every pair is level in both trees or ordered the same way in both.
    Aligned,
    /// Some pair is level in one tree and ordered in the other.
    LevelMismatch,
}

/// Compare every pair of shared names across both trees.
///
/// `order` is sorted by depth in `first`, so each pair is either level or
/// ordered upper-before-lower there. A pair that is ordered the other way in
/// `second` is a conflict.
fn check_relative_order(
    first: &DependencyTree,
    second: &DependencyTree,
    order: &[(usize, String)],
) -> Result<Agreement, PlanError> {
    let mut agreement = Agreement::Aligned;
    for (index, (_, upper)) in order.iter().enumerate() {
        for (_, lower) in &order[index + 1..] {
            let first_depths =
                (first.depth_of(upper).unwrap_or(0), first.depth_of(lower).unwrap_or(0));
            let second_depths =
                (second.depth_of(upper).unwrap_or(0), second.depth_of(lower).unwrap_or(0));

            let in_first = first_depths.0.cmp(&first_depths.1);
            let in_second = second_depths.0.cmp(&second_depths.1);
            if in_first == in_second {
                continue;
            }
            if in_first.is_ne() && in_second.is_ne() {
                return Err(PlanError::StructuralMergeConflict {
                    first: upper.clone(),
                    second: lower.clone(),
                    first_depths,
                    second_depths,
                });
            }
            agreement = Agreement::LevelMismatch;
        }
    }
    Ok(agreement)
}

/// Equalize the distance between each consecutive pair of shared names,
/// working from the deepest pair upward.
fn align_spacing(
    first: &mut DependencyTree,
    second: &mut DependencyTree,
    order: &[(usize, String)],
) -> Result<()> {
    for pair in order.windows(2).rev() {
        let (upper, lower) = (&pair[0].1, &pair[1].1);
        let gap_first = depth_in(first, lower)? - depth_in(first, upper)?;
        let gap_second = depth_in(second, lower)? - depth_in(second, upper)?;

        if gap_first > gap_second {
            let at = depth_in(second, upper)?;
            second.extend_below_layer(at, gap_first - gap_second);
        } else if gap_second > gap_first {
            let at = depth_in(first, upper)?;
            first.extend_below_layer(at, gap_second - gap_first);
        }
    }
    Ok(())
}

/// Give both trees the same number of layers below the deepest shared name,
/// so the bottom layers line up.
fn align_tail(
    first: &mut DependencyTree,
    second: &mut DependencyTree,
    order: &[(usize, String)],
) -> Result<()> {
    let Some((_, last)) = order.last() else {
        return Ok(());
    };
    let below_first = first.layers_below(last).unwrap_or(0);
    let below_second = second.layers_below(last).unwrap_or(0);

    if below_first < below_second {
        let bottom = first.layer_count() - 1;
        first.extend_below_layer(bottom, below_second - below_first);
    } else if below_second < below_first {
        let bottom = second.layer_count() - 1;
        second.extend_below_layer(bottom, below_first - below_second);
    }
    Ok(())
}

/// Copy every resource of `shorter` into `longer`, matching layers from the bottom.
fn union_into(longer: &mut DependencyTree, shorter: &DependencyTree) {
    let offset = longer.layer_count() - shorter.layer_count();
    for layer in shorter.layers().iter().rev() {
        let depth = layer.depth() + offset;
        for resource in layer.resources() {
            if !longer.contains(&resource.name) {
                longer.add_resource(depth, Arc::clone(resource));
            }
        }
    }
}

/// Longest-path layering of the union of both trees.
fn relayer(first: &DependencyTree, second: &DependencyTree) -> Result<DependencyTree> {
    let mut seen = BTreeSet::new();
    let union: Vec<&Arc<Resource>> = first
        .resources()
        .chain(second.resources())
        .filter(|resource| seen.insert(resource.name.as_str()))
        .collect();

    let depths = DependencyGraph::from_resources(union.iter().copied()).longest_path_depths()?;
    DependencyTree::from_depths(union.iter().copied(), &depths)
}
