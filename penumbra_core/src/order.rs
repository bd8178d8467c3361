// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Front-to-back ordering of the nodes fed to level assignment.
//!
//! - [`ZOrdering`] orders a container's direct children. It is chosen once,
//!   at dispatcher construction, so hosts without an elevation concept can
//!   opt out of z sorting entirely.
//! - [`composite_order`] orders the sibling containers of a composite:
//!   displayed before undisplayed, then non-empty before empty, then by
//!   [`TreePosition`].

use alloc::vec::Vec;
use core::cmp::Reverse;

use crate::host::{HostTree, children_of};
use crate::tree::NodeId;

/// Strategy for turning a container's drawing order into front-to-back
/// order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ZOrdering {
    /// Sort by descending [`z_order`](HostTree::z_order). Among equal keys
    /// the later-drawn child is in front.
    #[default]
    Elevation,
    /// Reverse drawing order only; z-order keys are ignored.
    Preserve,
}

impl ZOrdering {
    /// Returns `container`'s direct children, front-most first.
    #[must_use]
    pub fn front_to_back<T: HostTree + ?Sized>(self, tree: &T, container: NodeId) -> Vec<NodeId> {
        let mut children = children_of(tree, container);
        children.reverse();
        if self == Self::Elevation {
            // Stable, so drawing order breaks ties.
            children.sort_by(|a, b| tree.z_order(*b).total_cmp(&tree.z_order(*a)));
        }
        children
    }
}

/// A node's position in the tree as a mixed-radix number.
///
/// Digit `d` is the index of the node's depth-`d` ancestor among its
/// siblings, starting at the root. Comparing digit strings lexicographically
/// gives the same order as the weighted sum `Σ indexᵈ · slotᵈ`, where each
/// level's slot width is the parent's slot divided by its sibling count:
/// earlier siblings, and anything under an earlier ancestor, sort first.
/// An ancestor sorts before its descendants.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TreePosition(Vec<u32>);

impl TreePosition {
    /// Computes the position of `node` by walking up to its root.
    #[must_use]
    pub fn of<T: HostTree + ?Sized>(tree: &T, node: NodeId) -> Self {
        let mut digits = Vec::new();
        let mut cursor = node;
        while let Some(index) = tree.index_in_parent(cursor) {
            digits.push(digit(index));
            match tree.parent(cursor) {
                Some(parent) => cursor = parent,
                None => break,
            }
        }
        digits.reverse();
        Self(digits)
    }

    /// Returns the sibling indices from the root down.
    #[must_use]
    pub fn digits(&self) -> &[u32] {
        &self.0
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "sibling counts never exceed u32::MAX"
)]
fn digit(index: usize) -> u32 {
    index as u32
}

/// Orders a composite's sibling containers front-to-back.
///
/// Keys, most significant first: displayed, has at least one child, then
/// [`TreePosition`]. Each key is computed once per call.
#[must_use]
pub fn composite_order<T: HostTree + ?Sized>(tree: &T, containers: &[NodeId]) -> Vec<NodeId> {
    let mut ordered = containers.to_vec();
    ordered.sort_by_cached_key(|&c| {
        (
            Reverse(tree.is_displayed(c)),
            Reverse(tree.child_count(c) > 0),
            TreePosition::of(tree, c),
        )
    });
    ordered
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use kurbo::Rect;

    use super::*;
    use crate::tree::{NodeFlags, ViewTree};

    const R: Rect = Rect::new(0.0, 0.0, 1.0, 1.0);

    #[test]
    fn elevation_sorts_by_z_then_drawing_order() {
        let mut tree = ViewTree::new();
        let root = tree.create_node();
        let a = tree.create_child(root, R);
        let b = tree.create_child(root, R);
        let c = tree.create_child(root, R);
        tree.set_z_order(a, 5.0);

        assert_eq!(
            ZOrdering::Elevation.front_to_back(&tree, root),
            vec![a, c, b],
            "raised child first, then later-drawn"
        );
        assert_eq!(
            ZOrdering::Preserve.front_to_back(&tree, root),
            vec![c, b, a],
            "z ignored"
        );
    }

    #[test]
    fn tree_position_digits() {
        let mut tree = ViewTree::new();
        let root = tree.create_node();
        let a = tree.create_child(root, R);
        let b = tree.create_child(root, R);
        let b0 = tree.create_child(b, R);
        let b1 = tree.create_child(b, R);

        assert_eq!(TreePosition::of(&tree, root).digits(), &[] as &[u32]);
        assert_eq!(TreePosition::of(&tree, b1).digits(), &[1, 1]);
        assert!(TreePosition::of(&tree, a) < TreePosition::of(&tree, b0));
        assert!(TreePosition::of(&tree, b) < TreePosition::of(&tree, b0), "ancestor first");
        assert!(TreePosition::of(&tree, b0) < TreePosition::of(&tree, b1));
    }

    #[test]
    fn composite_order_prefers_displayed_then_non_empty() {
        let mut tree = ViewTree::new();
        let root = tree.create_node();
        tree.set_window_root(root);
        let hidden = tree.create_child(root, R);
        let empty = tree.create_child(root, R);
        let full = tree.create_child(root, R);
        let _ = tree.create_child(full, R);
        let _ = tree.create_child(full, R);
        tree.set_flags(hidden, NodeFlags { hidden: true });

        let order = composite_order(&tree, &[hidden, empty, full]);
        assert_eq!(order, vec![full, empty, hidden]);
    }

    #[test]
    fn composite_order_ties_follow_tree_position() {
        let mut tree = ViewTree::new();
        let root = tree.create_node();
        tree.set_window_root(root);
        let first = tree.create_child(root, R);
        let second = tree.create_child(root, R);
        let order = composite_order(&tree, &[second, first]);
        assert_eq!(order, vec![first, second]);
    }
}
