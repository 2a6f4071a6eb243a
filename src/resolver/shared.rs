//! Tracking which resources appear in more than one tree.
//!
//! Every placement during tree building is recorded here. Once all trees are
//! built, names that ended up in a single tree are pruned; whatever is left is
//! the worklist for the merge engine.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Identifier of one tree within a resolution pass.
///
/// Ids are handed out in request order, so the lowest id is the tree of the
/// first requested resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TreeId(pub usize);

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tree#{}", self.0)
    }
}

/// A shared name and the first two trees that contain it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeCandidate {
    /// The shared resource name.
    pub name: String,
    /// Lower tree id.
    pub first: TreeId,
    /// Second tree id.
    pub second: TreeId,
}

/// Resource name → set of trees containing it.
#[derive(Debug, Clone, Default)]
pub struct SharedDependencies {
    records: BTreeMap<String, BTreeSet<TreeId>>,
}

impl SharedDependencies {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Note that `tree` contains `name`. Recording the same pair twice is a no-op.
    pub fn record(&mut self, name: &str, tree: TreeId) {
        self.records.entry(name.to_string()).or_default().insert(tree);
    }

    /// Drop every record that names fewer than two trees.
    pub fn prune_single_use(&mut self) {
        self.records.retain(|_, trees| trees.len() >= 2);
    }

    /// The first record, in name order, that still links two trees.
    #[must_use]
    pub fn next_candidate(&self) -> Option<MergeCandidate> {
        self.records.iter().find_map(|(name, trees)| {
            let mut ids = trees.iter();
            match (ids.next(), ids.next()) {
                (Some(&first), Some(&second)) => Some(MergeCandidate {
                    name: name.clone(),
                    first,
                    second,
                }),
                _ => None,
            }
        })
    }

    /// Every name whose record contains both trees, in name order.
    #[must_use]
    pub fn names_shared_by(&self, a: TreeId, b: TreeId) -> Vec<String> {
        self.records
            .iter()
            .filter(|(_, trees)| trees.contains(&a) && trees.contains(&b))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Fold `absorbed` into `survivor` after a merge.
    ///
    /// Every record that mentions the absorbed tree now mentions the survivor
    /// instead, including records shared with third trees. Records left with a
    /// single tree are retired.
    pub fn absorb(&mut self, survivor: TreeId, absorbed: TreeId) {
        for trees in self.records.values_mut() {
            if trees.remove(&absorbed) {
                trees.insert(survivor);
            }
        }
        self.prune_single_use();
    }

    /// Trees recorded for `name`.
    #[must_use]
    pub fn trees_for(&self, name: &str) -> Option<&BTreeSet<TreeId>> {
        self.records.get(name)
    }

    /// Number of live records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(entries: &[(&str, &[usize])]) -> SharedDependencies {
        let mut shared = SharedDependencies::new();
        for (name, trees) in entries {
            for tree in *trees {
                shared.record(name, TreeId(*tree));
            }
        }
        shared
    }

    #[test]
    fn test_prune_single_use() {
        let mut shared = tracker(&[("jquery", &[0, 1]), ("rss", &[1]), ("site", &[0, 1, 1])]);
        shared.prune_single_use();
        assert_eq!(shared.len(), 2);
        assert!(shared.trees_for("rss").is_none());
        assert_eq!(shared.trees_for("site").unwrap().len(), 2);
    }

    #[test]
    fn test_next_candidate_is_first_by_name() {
        let mut shared = tracker(&[("site", &[2, 0]), ("jquery", &[1, 2])]);
        shared.prune_single_use();
        let candidate = shared.next_candidate().unwrap();
        assert_eq!(candidate.name, "jquery");
        assert_eq!((candidate.first, candidate.second), (TreeId(1), TreeId(2)));
    }

    #[test]
    fn test_names_shared_by() {
        let shared = tracker(&[("a", &[0, 1]), ("b", &[0, 2]), ("c", &[0, 1, 2])]);
        assert_eq!(shared.names_shared_by(TreeId(0), TreeId(1)), vec!["a", "c"]);
    }

    #[test]
    fn test_absorb_rewrites_third_party_records() {
        let mut shared = tracker(&[("jquery", &[0, 1]), ("ui", &[1, 2])]);
        shared.absorb(TreeId(0), TreeId(1));
        assert!(shared.trees_for("jquery").is_none());
        let ui: Vec<_> = shared.trees_for("ui").unwrap().iter().copied().collect();
        assert_eq!(ui, vec![TreeId(0), TreeId(2)]);
        assert_eq!(shared.next_candidate().unwrap().name, "ui");
    }

    #[test]
    fn test_absorb_last_pair_empties_tracker() {
        let mut shared = tracker(&[("jquery", &[0, 1])]);
        shared.absorb(TreeId(1), TreeId(0));
        assert!(shared.is_empty());
        assert!(shared.next_candidate().is_none());
    }
}
