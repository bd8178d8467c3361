// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal edit scripts between two level lists.
//!
//! Items are matched by node identity; two matched entries have the *same
//! content* when their `(level, visible)` pairs agree. Matched nodes that
//! keep their relative order form the longest common subsequence of the two
//! lists and are [`Unchanged`](EditKind::Unchanged); the rest of the matched
//! nodes are [`Moved`](EditKind::Moved). Because a node appears at most once
//! per list, the LCS is the longest increasing run of old positions taken in
//! new order, found in `O(n log n)`.
//!
//! The dispatcher drives transitions from the result: every
//! [`Removed`](EditKind::Removed) node is destroyed once, and every other
//! node is forced into its stage once.

use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;

use crate::level::LevelList;
use crate::tree::NodeId;

/// How a node's position changed between two lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EditKind {
    /// Present in both lists, in the same relative order.
    Unchanged,
    /// Present in both lists, but reordered relative to its neighbours.
    Moved,
    /// Only in the new list.
    Inserted,
    /// Only in the old list.
    Removed,
}

/// One step of a [`LevelDiff`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Edit {
    /// The node.
    pub node: NodeId,
    /// Classification.
    pub kind: EditKind,
    /// Position in the old list, if present there.
    pub old_index: Option<usize>,
    /// Position in the new list, if present there.
    pub new_index: Option<usize>,
    /// Whether `(level, visible)` differs between the lists. Always `false`
    /// for inserted and removed nodes.
    pub content_changed: bool,
}

/// Edit script turning one [`LevelList`] into another.
///
/// Removed nodes come first in old-list order, followed by every node of the
/// new list in new-list order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelDiff {
    edits: Vec<Edit>,
}

impl LevelDiff {
    /// Computes the edit script from `old` to `new`.
    #[must_use]
    pub fn between(old: &LevelList, new: &LevelList) -> Self {
        let old_pos: BTreeMap<NodeId, usize> = old
            .iter()
            .enumerate()
            .map(|(i, e)| (e.node, i))
            .collect();
        let new_nodes: BTreeMap<NodeId, usize> = new
            .iter()
            .enumerate()
            .map(|(i, e)| (e.node, i))
            .collect();

        let mut edits = Vec::with_capacity(old.len() + new.len());
        for (i, e) in old.iter().enumerate() {
            if !new_nodes.contains_key(&e.node) {
                edits.push(Edit {
                    node: e.node,
                    kind: EditKind::Removed,
                    old_index: Some(i),
                    new_index: None,
                    content_changed: false,
                });
            }
        }

        // (new index, old index) for every node present in both lists.
        let shared: Vec<(usize, usize)> = new
            .iter()
            .enumerate()
            .filter_map(|(i, e)| old_pos.get(&e.node).map(|&o| (i, o)))
            .collect();
        let mut in_place = vec![false; new.len()];
        for k in longest_increasing(&shared) {
            in_place[shared[k].0] = true;
        }

        let old_entries = old.entries();
        for (i, e) in new.iter().enumerate() {
            let edit = match old_pos.get(&e.node) {
                Some(&o) => Edit {
                    node: e.node,
                    kind: if in_place[i] {
                        EditKind::Unchanged
                    } else {
                        EditKind::Moved
                    },
                    old_index: Some(o),
                    new_index: Some(i),
                    content_changed: !old_entries[o].same_content(e),
                },
                None => Edit {
                    node: e.node,
                    kind: EditKind::Inserted,
                    old_index: None,
                    new_index: Some(i),
                    content_changed: false,
                },
            };
            edits.push(edit);
        }

        Self { edits }
    }

    /// Returns all edits.
    #[must_use]
    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    /// Returns the nodes only present in the old list.
    pub fn removed(&self) -> impl Iterator<Item = &Edit> + '_ {
        self.of_kind(EditKind::Removed)
    }

    /// Returns the nodes only present in the new list.
    pub fn inserted(&self) -> impl Iterator<Item = &Edit> + '_ {
        self.of_kind(EditKind::Inserted)
    }

    /// Returns the nodes present in both lists that changed order.
    pub fn moved(&self) -> impl Iterator<Item = &Edit> + '_ {
        self.of_kind(EditKind::Moved)
    }

    /// Returns the nodes present in both lists, in new-list order.
    pub fn retained(&self) -> impl Iterator<Item = &Edit> + '_ {
        self.edits
            .iter()
            .filter(|e| matches!(e.kind, EditKind::Unchanged | EditKind::Moved))
    }

    /// Returns `true` if every node kept its position and content.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.edits
            .iter()
            .all(|e| e.kind == EditKind::Unchanged && !e.content_changed)
    }

    fn of_kind(&self, kind: EditKind) -> impl Iterator<Item = &Edit> + '_ {
        self.edits.iter().filter(move |e| e.kind == kind)
    }
}

/// Returns indices into `pairs` forming a longest run strictly increasing in
/// `.1`. `pairs` is already sorted by `.0`.
fn longest_increasing(pairs: &[(usize, usize)]) -> Vec<usize> {
    // tails[k]: index into `pairs` of the smallest tail of a run of length k + 1.
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; pairs.len()];
    for (i, &(_, value)) in pairs.iter().enumerate() {
        let k = tails.partition_point(|&t| pairs[t].1 < value);
        if k > 0 {
            prev[i] = Some(tails[k - 1]);
        }
        if k == tails.len() {
            tails.push(i);
        } else {
            tails[k] = i;
        }
    }
    let mut run = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        run.push(i);
        cursor = prev[i];
    }
    run.reverse();
    run
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::*;
    use crate::level::{LevelAssigner, LevelInput};

    fn node(i: u32) -> NodeId {
        NodeId::from_raw(i, 0)
    }

    /// Each `(idx, rect)` becomes a visible input, front-to-back.
    fn list(items: &[(u32, Rect)]) -> LevelList {
        LevelAssigner::new().assign(items.iter().map(|&(i, rect)| LevelInput {
            node: node(i),
            rect,
            visible: true,
        }))
    }

    fn kinds(diff: &LevelDiff) -> Vec<(u32, EditKind)> {
        diff.edits()
            .iter()
            .map(|e| (e.node.index(), e.kind))
            .collect()
    }

    const A: Rect = Rect::new(0.0, 0.0, 10.0, 10.0);
    const B: Rect = Rect::new(20.0, 0.0, 30.0, 10.0);
    const C: Rect = Rect::new(40.0, 0.0, 50.0, 10.0);

    #[test]
    fn same_input_twice_is_unchanged() {
        let items = [(0, A), (1, B), (2, Rect::new(2.0, 2.0, 8.0, 8.0))];
        let diff = LevelDiff::between(&list(&items), &list(&items));
        assert!(diff.is_unchanged(), "identical passes: {:?}", diff.edits());
        assert_eq!(diff.retained().count(), 3);
    }

    #[test]
    fn insertions_and_removals() {
        let old = list(&[(0, A), (1, B)]);
        let new = list(&[(1, B), (2, C)]);
        let diff = LevelDiff::between(&old, &new);

        let removed: Vec<u32> = diff.removed().map(|e| e.node.index()).collect();
        let inserted: Vec<u32> = diff.inserted().map(|e| e.node.index()).collect();
        assert_eq!(removed, vec![0]);
        assert_eq!(inserted, vec![2]);
        assert_eq!(diff.retained().count(), 1, "node 1 kept");
        assert!(!diff.is_unchanged());
    }

    #[test]
    fn reorder_marks_minimal_moves() {
        // Disjoint rects: all level 0, list order is reverse discovery.
        let old = list(&[(0, A), (1, B), (2, C)]);
        let new = list(&[(1, B), (2, C), (0, A)]);
        let diff = LevelDiff::between(&old, &new);
        let moved: Vec<u32> = diff.moved().map(|e| e.node.index()).collect();
        assert_eq!(moved.len(), 1, "one node moves: {:?}", kinds(&diff));
        assert_eq!(diff.retained().count(), 3);
    }

    #[test]
    fn level_change_is_content_change() {
        let old = list(&[(0, A), (1, Rect::new(2.0, 2.0, 8.0, 8.0))]);
        // Node 1 moves out from under node 0.
        let new = list(&[(0, A), (1, Rect::new(12.0, 2.0, 18.0, 8.0))]);
        let diff = LevelDiff::between(&old, &new);
        let changed: Vec<u32> = diff
            .retained()
            .filter(|e| e.content_changed)
            .map(|e| e.node.index())
            .collect();
        assert_eq!(changed, vec![1]);
        assert_eq!(diff.removed().count(), 0);
        assert_eq!(diff.inserted().count(), 0);
    }

    #[test]
    fn every_node_appears_exactly_once() {
        let old = list(&[(0, A), (1, B), (3, C)]);
        let new = list(&[(3, C), (2, A), (1, B)]);
        let diff = LevelDiff::between(&old, &new);
        for n in 0..4 {
            let count = diff.edits().iter().filter(|e| e.node == node(n)).count();
            assert_eq!(count, 1, "node {n} in {:?}", kinds(&diff));
        }
        let new_order: Vec<u32> = diff
            .edits()
            .iter()
            .filter_map(|e| e.new_index.map(|i| (i, e.node.index())))
            .map(|(_, n)| n)
            .collect();
        let expected: Vec<u32> = new.iter().map(|e| e.node.index()).collect();
        assert_eq!(new_order, expected, "new entries follow new-list order");
    }

    #[test]
    fn empty_lists() {
        let empty = LevelList::default();
        let some = list(&[(0, A)]);
        assert!(LevelDiff::between(&empty, &empty).edits().is_empty());
        assert_eq!(
            kinds(&LevelDiff::between(&empty, &some)),
            vec![(0, EditKind::Inserted)]
        );
        assert_eq!(
            kinds(&LevelDiff::between(&some, &empty)),
            vec![(0, EditKind::Removed)]
        );
    }

    #[test]
    fn longest_increasing_run() {
        let pairs: Vec<(usize, usize)> = [3, 1, 2, 0, 4].iter().copied().enumerate().collect();
        let run = longest_increasing(&pairs);
        let values: Vec<usize> = run.iter().map(|&i| pairs[i].1).collect();
        assert_eq!(values, vec![1, 2, 4]);
    }
}
