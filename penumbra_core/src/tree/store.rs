// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation, topology, and geometry.

use alloc::vec::Vec;

use kurbo::{Rect, Vec2};
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::id::{INVALID, NodeId};
use crate::dirty;
use crate::host::HostTree;
use crate::lifecycle::{Lifecycle, LifecycleController};

/// Per-node boolean flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct NodeFlags {
    /// Whether the node (and its subtree) is hidden.
    pub hidden: bool,
}

/// Notifications drained from a [`ViewTree`] by [`ViewTree::take_changes`].
///
/// Each list holds live nodes in ascending slot order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeChanges {
    /// Nodes whose own geometry changed, or one of whose children's did.
    pub layout: Vec<NodeId>,
    /// Nodes whose child list changed.
    pub hierarchy: Vec<NodeId>,
    /// Nodes whose displayed state may have changed, including every
    /// descendant of a node that was hidden, shown, or moved.
    pub display: Vec<NodeId>,
}

impl TreeChanges {
    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layout.is_empty() && self.hierarchy.is_empty() && self.display.is_empty()
    }
}

/// Struct-of-arrays storage for all nodes.
///
/// Destroyed nodes are recycled via a free list, and generation counters
/// prevent stale handle access.
#[derive(Debug)]
pub struct ViewTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Geometry --
    pub(crate) bounds: Vec<Rect>,
    pub(crate) translation: Vec<Vec2>,
    pub(crate) z_order: Vec<f64>,
    pub(crate) flags: Vec<NodeFlags>,

    // -- Lifecycle --
    pub(crate) lifecycle: Vec<Option<Lifecycle>>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
    pub(crate) window_root: u32,

    // -- Notifications --
    pub(crate) dirty: DirtyTracker<u32>,
}

impl Default for ViewTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            bounds: Vec::new(),
            translation: Vec::new(),
            z_order: Vec::new(),
            flags: Vec::new(),
            lifecycle: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            window_root: INVALID,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
        }
    }

    // -- Allocation API --

    /// Creates a detached node with empty bounds, no translation, z-order 0,
    /// no flags, and no lifecycle controller.
    pub fn create_node(&mut self) -> NodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.bounds[i] = Rect::ZERO;
            self.translation[i] = Vec2::ZERO;
            self.z_order[i] = 0.0;
            self.flags[i] = NodeFlags::default();
            self.lifecycle[i] = None;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.bounds.push(Rect::ZERO);
            self.translation.push(Vec2::ZERO);
            self.z_order.push(0.0);
            self.flags.push(NodeFlags::default());
            self.lifecycle.push(None);
            self.generation.push(0);
            idx
        };

        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Creates a node with the given bounds and a fresh [`Lifecycle`], and
    /// appends it to `parent`.
    pub fn create_child(&mut self, parent: NodeId, bounds: Rect) -> NodeId {
        let id = self.create_node();
        self.set_bounds(id, bounds);
        self.set_lifecycle(id, Some(Lifecycle::default()));
        self.add_child(parent, id);
        id
    }

    /// Destroys a node, freeing its slot for reuse.
    ///
    /// # Panics
    ///
    /// Panics if the node has children or if the handle is stale.
    pub fn destroy_node(&mut self, id: NodeId) {
        self.validate(id);
        let idx = id.idx;
        assert!(
            self.first_child[idx as usize] == INVALID,
            "cannot destroy node with children"
        );

        if self.parent[idx as usize] != INVALID {
            let p = self.parent[idx as usize];
            self.unlink_from_parent(idx);
            self.dirty.mark(p, dirty::HIERARCHY);
        }
        if self.window_root == idx {
            self.window_root = INVALID;
        }

        self.dirty.remove_key(idx);
        self.generation[idx as usize] += 1;
        self.lifecycle[idx as usize] = None;
        self.free_list.push(idx);
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    /// Makes `id` the root attached to the display.
    ///
    /// Only nodes under the window root can be displayed.
    pub fn set_window_root(&mut self, id: NodeId) {
        self.validate(id);
        let old = self.window_root;
        if old != INVALID {
            self.dirty.mark_with(old, dirty::DISPLAY, &EagerPolicy);
        }
        self.window_root = id.idx;
        self.dirty.mark(id.idx, dirty::LAYOUT);
        self.dirty.mark_with(id.idx, dirty::DISPLAY, &EagerPolicy);
    }

    // -- Topology API --

    /// Adds `child` as the last (front-most) child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, or if `child` already has a parent.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );

        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }

        self.link_display(c, p);
        self.dirty.mark(p, dirty::HIERARCHY);
    }

    /// Inserts `child` before `sibling` in the sibling list.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, `child` already has a parent, or `sibling`
    /// has no parent.
    pub fn insert_before(&mut self, child: NodeId, sibling: NodeId) {
        self.validate(child);
        self.validate(sibling);
        let c = child.idx;
        let s = sibling.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        let p = self.parent[s as usize];
        assert!(p != INVALID, "sibling has no parent");

        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = self.prev_sibling[s as usize];

        if self.prev_sibling[s as usize] != INVALID {
            self.next_sibling[self.prev_sibling[s as usize] as usize] = c;
        } else {
            self.first_child[p as usize] = c;
        }
        self.prev_sibling[s as usize] = c;

        self.link_display(c, p);
        self.dirty.mark(p, dirty::HIERARCHY);
    }

    /// Removes `child` from its current parent.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node has no parent.
    pub fn remove_from_parent(&mut self, child: NodeId) {
        self.validate(child);
        let c = child.idx;
        let p = self.parent[c as usize];
        assert!(p != INVALID, "node has no parent");

        self.unlink_from_parent(c);
        self.dirty.remove_dependency(c, p, dirty::DISPLAY);
        self.dirty.mark_with(c, dirty::DISPLAY, &EagerPolicy);
        self.dirty.mark(p, dirty::HIERARCHY);
    }

    /// Returns the direct children of a node, back-most first.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.validate(id);
        let first = self.first_child[id.idx as usize];
        core::iter::successors((first != INVALID).then_some(first), |&idx| {
            let next = self.next_sibling[idx as usize];
            (next != INVALID).then_some(next)
        })
        .map(|idx| self.id_at(idx))
    }

    // -- Geometry API (notifies LAYOUT) --

    /// Sets the node's bounds in parent coordinates.
    pub fn set_bounds(&mut self, id: NodeId, bounds: Rect) {
        self.validate(id);
        self.bounds[id.idx as usize] = bounds;
        self.mark_layout(id.idx);
    }

    /// Sets the node's translation offset.
    pub fn set_translation(&mut self, id: NodeId, translation: Vec2) {
        self.validate(id);
        self.translation[id.idx as usize] = translation;
        self.mark_layout(id.idx);
    }

    /// Sets the node's z-order key.
    pub fn set_z_order(&mut self, id: NodeId, z: f64) {
        self.validate(id);
        self.z_order[id.idx as usize] = z;
        self.mark_layout(id.idx);
    }

    /// Sets the node's flags.
    pub fn set_flags(&mut self, id: NodeId, flags: NodeFlags) {
        self.validate(id);
        self.flags[id.idx as usize] = flags;
        self.mark_layout(id.idx);
        self.dirty.mark_with(id.idx, dirty::DISPLAY, &EagerPolicy);
    }

    /// Returns the node's flags.
    #[must_use]
    pub fn flags(&self, id: NodeId) -> NodeFlags {
        self.validate(id);
        self.flags[id.idx as usize]
    }

    // -- Lifecycle API --

    /// Installs or removes the node's lifecycle controller.
    pub fn set_lifecycle(&mut self, id: NodeId, lifecycle: Option<Lifecycle>) {
        self.validate(id);
        self.lifecycle[id.idx as usize] = lifecycle;
    }

    /// Returns the node's lifecycle controller, if any.
    #[must_use]
    pub fn lifecycle(&self, id: NodeId) -> Option<&Lifecycle> {
        self.validate(id);
        self.lifecycle[id.idx as usize].as_ref()
    }

    // -- Notifications --

    /// Drains pending layout, hierarchy, and display notifications.
    ///
    /// Destroyed nodes are dropped from the result.
    pub fn take_changes(&mut self) -> TreeChanges {
        let layout: Vec<u32> = self.dirty.drain(dirty::LAYOUT).deterministic().run().collect();
        let hierarchy: Vec<u32> = self
            .dirty
            .drain(dirty::HIERARCHY)
            .deterministic()
            .run()
            .collect();
        let display: Vec<u32> = self
            .dirty
            .drain(dirty::DISPLAY)
            .deterministic()
            .run()
            .collect();
        TreeChanges {
            layout: self.live_ids(layout),
            hierarchy: self.live_ids(hierarchy),
            display: self.live_ids(display),
        }
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    fn validate(&self, id: NodeId) {
        assert!(
            self.is_alive(id),
            "stale NodeId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    fn id_at(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    fn live_ids(&self, mut raw: Vec<u32>) -> Vec<NodeId> {
        raw.sort_unstable();
        raw.dedup();
        raw.into_iter()
            .filter(|&idx| idx < self.len && !self.free_list.contains(&idx))
            .map(|idx| self.id_at(idx))
            .collect()
    }

    /// Marks the node and its parent, whose dispatcher tracks the node.
    fn mark_layout(&mut self, idx: u32) {
        self.dirty.mark(idx, dirty::LAYOUT);
        let p = self.parent[idx as usize];
        if p != INVALID {
            self.dirty.mark(p, dirty::LAYOUT);
        }
    }

    /// Makes `c`'s displayed state follow `p`'s and reports `c`'s subtree.
    fn link_display(&mut self, c: u32, p: u32) {
        let _ = self.dirty.add_dependency(c, p, dirty::DISPLAY);
        self.dirty.mark_with(c, dirty::DISPLAY, &EagerPolicy);
    }

    /// Removes `idx` from its parent's child list without touching
    /// notifications.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }
}

impl HostTree for ViewTree {
    fn is_displayed(&self, node: NodeId) -> bool {
        self.validate(node);
        let mut idx = node.idx;
        loop {
            if self.flags[idx as usize].hidden {
                return false;
            }
            if idx == self.window_root {
                return true;
            }
            idx = self.parent[idx as usize];
            if idx == INVALID {
                return false;
            }
        }
    }

    fn bounds(&self, node: NodeId) -> Rect {
        self.validate(node);
        self.bounds[node.idx as usize]
    }

    fn translation(&self, node: NodeId) -> Vec2 {
        self.validate(node);
        self.translation[node.idx as usize]
    }

    fn z_order(&self, node: NodeId) -> f64 {
        self.validate(node);
        self.z_order[node.idx as usize]
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        if !self.is_alive(node) {
            return None;
        }
        let p = self.parent[node.idx as usize];
        (p != INVALID).then(|| self.id_at(p))
    }

    fn child_count(&self, node: NodeId) -> usize {
        self.children(node).count()
    }

    fn child_at(&self, node: NodeId, index: usize) -> Option<NodeId> {
        self.children(node).nth(index)
    }

    fn index_in_parent(&self, node: NodeId) -> Option<usize> {
        if !self.is_alive(node) || self.parent[node.idx as usize] == INVALID {
            return None;
        }
        let mut index = 0;
        let mut prev = self.prev_sibling[node.idx as usize];
        while prev != INVALID {
            index += 1;
            prev = self.prev_sibling[prev as usize];
        }
        Some(index)
    }

    fn controller(&self, node: NodeId) -> Option<&dyn LifecycleController> {
        if !self.is_alive(node) {
            return None;
        }
        self.lifecycle[node.idx as usize]
            .as_ref()
            .map(|lc| lc as &dyn LifecycleController)
    }

    fn controller_mut(&mut self, node: NodeId) -> Option<&mut dyn LifecycleController> {
        if !self.is_alive(node) {
            return None;
        }
        self.lifecycle[node.idx as usize]
            .as_mut()
            .map(|lc| lc as &mut dyn LifecycleController)
    }
}
