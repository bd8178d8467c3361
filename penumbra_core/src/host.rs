// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host contract.
//!
//! Dispatchers do not own the tree they observe. Everything they need from
//! the host's layout engine and lifecycle system goes through [`HostTree`]:
//!
//! - **Geometry**: bounds, translation offset, and z-order key per node.
//! - **Topology**: parent lookup, child count, indexed child access, and a
//!   node's index among its siblings.
//! - **Display state**: whether a node is currently displayed.
//! - **Lifecycle**: the optional [`LifecycleController`] a node owns.
//!
//! Change notifications flow the other way: the host reports layout and
//! hierarchy changes to a [`DispatchRegistry`](crate::dispatch::DispatchRegistry)
//! (or directly to a dispatcher's `notify_*` methods), which coalesce them.
//!
//! [`ViewTree`](crate::tree::ViewTree) is the in-crate implementation.

use kurbo::{Rect, Vec2};

use crate::lifecycle::LifecycleController;
use crate::tree::NodeId;

/// Read access to host geometry and topology, plus lifecycle controllers.
pub trait HostTree {
    /// Returns whether `node` and all of its ancestors are shown and attached
    /// to a display.
    fn is_displayed(&self, node: NodeId) -> bool;

    /// Returns the node's bounds in its parent's coordinate space.
    fn bounds(&self, node: NodeId) -> Rect;

    /// Returns the node's translation offset applied on top of its bounds.
    fn translation(&self, node: NodeId) -> Vec2;

    /// Returns the node's z-order key. Larger values draw in front.
    fn z_order(&self, node: NodeId) -> f64;

    /// Returns the node's parent, if attached.
    ///
    /// Nodes the host has already released have none.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Returns the number of direct children.
    fn child_count(&self, node: NodeId) -> usize;

    /// Returns the child at `index` in drawing order.
    fn child_at(&self, node: NodeId, index: usize) -> Option<NodeId>;

    /// Returns the node's index among its parent's children.
    fn index_in_parent(&self, node: NodeId) -> Option<usize>;

    /// Returns the node's lifecycle controller, if it owns one.
    ///
    /// Nodes the host has already released have none.
    fn controller(&self, node: NodeId) -> Option<&dyn LifecycleController>;

    /// Returns the node's lifecycle controller mutably, if it owns one.
    fn controller_mut(&mut self, node: NodeId) -> Option<&mut dyn LifecycleController>;
}

/// Returns the node's on-screen rectangle: bounds moved by its translation.
#[must_use]
pub fn screen_rect<T: HostTree + ?Sized>(tree: &T, node: NodeId) -> Rect {
    tree.bounds(node) + tree.translation(node)
}

/// Collects the direct children of `node` in drawing order.
#[must_use]
pub fn children_of<T: HostTree + ?Sized>(tree: &T, node: NodeId) -> alloc::vec::Vec<NodeId> {
    (0..tree.child_count(node))
        .filter_map(|i| tree.child_at(node, i))
        .collect()
}
