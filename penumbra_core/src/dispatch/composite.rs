// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatch across sibling containers that share a parent.
//!
//! When several containers under one parent each host children, their
//! relative occlusion is decided as if they were the parent's only children.
//! Containers are ordered by [`composite_order`] rather than by z-order, and
//! an empty container is placed without a footprint: it cannot hide anything
//! behind it and, having no area, is never itself hidden.
//!
//! Every structural change (a container joining or leaving) schedules a
//! single shared recomputation through the same debouncer as layout changes.

use alloc::vec::Vec;

use kurbo::Rect;

use super::{DispatchState, DispatcherConfig, LevelEngine, Scope};
use crate::host::{HostTree, screen_rect};
use crate::level::{LevelInput, LevelList};
use crate::lifecycle::LifecycleStage;
use crate::order::composite_order;
use crate::time::HostTime;
use crate::trace::Tracer;
use crate::tree::NodeId;

/// What remains of a composite after a container leaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompositeStatus {
    /// Two or more containers remain; the composite stays attached.
    Composite,
    /// One container remains. The composite has detached itself.
    Single(NodeId),
    /// No containers remain. The composite has detached itself.
    Empty,
}

#[derive(Clone, Debug)]
struct CompositeScope {
    parent: NodeId,
    containers: Vec<NodeId>,
}

impl CompositeScope {
    /// Members still attached under the shared parent.
    fn attached<T: HostTree + ?Sized>(&self, tree: &T) -> Vec<NodeId> {
        self.containers
            .iter()
            .copied()
            .filter(|&c| tree.parent(c) == Some(self.parent))
            .collect()
    }
}

impl Scope for CompositeScope {
    fn owner(&self) -> NodeId {
        self.parent
    }

    fn level_inputs<T: HostTree + ?Sized>(&self, tree: &T) -> Vec<LevelInput> {
        composite_order(tree, &self.attached(tree))
            .into_iter()
            .map(|node| LevelInput {
                node,
                rect: if tree.child_count(node) > 0 {
                    screen_rect(tree, node)
                } else {
                    Rect::ZERO
                },
                visible: tree.is_displayed(node),
            })
            .collect()
    }

    fn members<T: HostTree + ?Sized>(&self, tree: &T) -> Vec<NodeId> {
        self.attached(tree)
    }
}

/// Drives the lifecycles of sibling containers as one virtual container
/// rooted at their shared parent.
///
/// The parent's display state and lifecycle controller stand in for the
/// container's own.
#[derive(Clone, Debug)]
pub struct CompositeDispatcher {
    scope: CompositeScope,
    engine: LevelEngine,
}

impl CompositeDispatcher {
    /// Creates a detached composite of `containers` under `parent`.
    ///
    /// # Panics
    ///
    /// Panics if a container is listed twice.
    #[must_use]
    pub fn new(
        parent: NodeId,
        containers: impl IntoIterator<Item = NodeId>,
        config: &DispatcherConfig,
    ) -> Self {
        let mut members: Vec<NodeId> = Vec::new();
        for c in containers {
            assert!(!members.contains(&c), "container {c:?} listed twice");
            members.push(c);
        }
        Self {
            scope: CompositeScope {
                parent,
                containers: members,
            },
            engine: LevelEngine::new(config),
        }
    }

    /// Returns the shared parent.
    #[must_use]
    pub fn parent(&self) -> NodeId {
        self.scope.parent
    }

    /// Returns the member containers in join order.
    #[must_use]
    pub fn containers(&self) -> &[NodeId] {
        &self.scope.containers
    }

    /// Returns whether `container` is a member.
    #[must_use]
    pub fn contains(&self, container: NodeId) -> bool {
        self.scope.containers.contains(&container)
    }

    /// Returns the attachment state.
    #[must_use]
    pub fn state(&self) -> DispatchState {
        self.engine.state()
    }

    /// Returns the stored level list over the member containers.
    #[must_use]
    pub fn levels(&self) -> Option<&LevelList> {
        self.engine.levels()
    }

    /// Returns the last stage dispatched to the containers.
    #[must_use]
    pub fn last_stage(&self) -> Option<LifecycleStage> {
        self.engine.last_stage()
    }

    /// Returns when the pending recomputation becomes due, if one is
    /// scheduled.
    #[must_use]
    pub fn pending_deadline(&self) -> Option<HostTime> {
        self.engine.pending_deadline()
    }

    /// Starts accepting notifications and dispatches.
    pub fn attach(&mut self) {
        self.engine.attach();
    }

    /// Stops accepting notifications and releases all composite state.
    pub fn detach(&mut self) {
        self.engine.detach();
    }

    /// Adds a sibling container and schedules a shared recomputation.
    ///
    /// # Panics
    ///
    /// Panics if `container` is already a member.
    pub fn add_container(&mut self, container: NodeId, now: HostTime, tracer: &mut Tracer<'_>) {
        assert!(
            !self.contains(container),
            "container {container:?} is already part of this composite"
        );
        self.scope.containers.push(container);
        self.engine.notify(self.scope.parent, now, tracer);
    }

    /// Removes a container without tearing down its lifecycle.
    ///
    /// With two or more containers left, a shared recomputation is
    /// scheduled. Otherwise the composite detaches and reports what is left.
    ///
    /// # Panics
    ///
    /// Panics if `container` is not a member.
    pub fn remove_container(
        &mut self,
        container: NodeId,
        now: HostTime,
        tracer: &mut Tracer<'_>,
    ) -> CompositeStatus {
        let Some(at) = self.scope.containers.iter().position(|&c| c == container) else {
            panic!("container {container:?} is not part of this composite");
        };
        self.scope.containers.remove(at);
        self.engine.forget(container);

        match self.scope.containers.as_slice() {
            [] => {
                self.engine.detach();
                CompositeStatus::Empty
            }
            [last] => {
                self.engine.detach();
                CompositeStatus::Single(*last)
            }
            _ => {
                self.engine.notify(self.scope.parent, now, tracer);
                CompositeStatus::Composite
            }
        }
    }

    /// Pushes `stage` down to the member containers.
    pub fn dispatch_lifecycle_state<T: HostTree + ?Sized>(
        &mut self,
        tree: &mut T,
        stage: LifecycleStage,
        tracer: &mut Tracer<'_>,
    ) {
        self.engine
            .dispatch_lifecycle_state(&self.scope, tree, stage, tracer);
    }

    /// Records a layout change in any member (or its children) at `now`.
    pub fn notify_layout_changed(&mut self, now: HostTime, tracer: &mut Tracer<'_>) {
        self.engine.notify(self.scope.parent, now, tracer);
    }

    /// Runs the pending recomputation if it is due at `now`.
    ///
    /// # Panics
    ///
    /// Panics if the recomputation runs and the parent has no lifecycle
    /// controller.
    pub fn poll<T: HostTree + ?Sized>(
        &mut self,
        tree: &mut T,
        now: HostTime,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        self.engine.poll(&self.scope, tree, now, tracer)
    }

    /// Recomputes levels over the member containers immediately.
    ///
    /// Members no longer attached under the parent drop out of the list and
    /// are destroyed.
    ///
    /// # Panics
    ///
    /// Panics if the parent has no lifecycle controller.
    pub fn on_layout_changed<T: HostTree + ?Sized>(
        &mut self,
        tree: &mut T,
        tracer: &mut Tracer<'_>,
    ) {
        self.engine.on_layout_changed(&self.scope, tree, tracer);
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::dispatch::test_util::{stage, transitions, window};
    use crate::lifecycle::LifecycleStage::{Created, Resumed};
    use crate::lifecycle::Lifecycle;
    use crate::tree::{NodeFlags, ViewTree};

    const LEAF: Rect = Rect::new(0.0, 0.0, 5.0, 5.0);

    /// Three sibling containers under `parent`:
    /// `a` full-size with content, `b` empty, `c` inside `a` with content.
    fn siblings() -> (ViewTree, NodeId, [NodeId; 3]) {
        let (mut tree, _, parent) = window();
        let a = tree.create_child(parent, Rect::new(0.0, 0.0, 100.0, 100.0));
        let b = tree.create_child(parent, Rect::new(0.0, 0.0, 100.0, 100.0));
        let c = tree.create_child(parent, Rect::new(10.0, 10.0, 50.0, 50.0));
        let _ = tree.create_child(a, LEAF);
        let _ = tree.create_child(c, LEAF);
        let _ = tree.take_changes();
        (tree, parent, [a, b, c])
    }

    fn attached(parent: NodeId, members: &[NodeId]) -> CompositeDispatcher {
        let mut d =
            CompositeDispatcher::new(parent, members.iter().copied(), &DispatcherConfig::default());
        d.attach();
        d
    }

    #[test]
    fn composite_levels_follow_tree_position_and_content() {
        let (mut tree, parent, [a, b, c]) = siblings();
        let mut d = attached(parent, &[c, b, a]);
        d.dispatch_lifecycle_state(&mut tree, Resumed, &mut Tracer::none());

        assert_eq!(stage(&tree, a), Resumed, "first non-empty container");
        assert_eq!(stage(&tree, c), Created, "inside a");
        assert_eq!(stage(&tree, b), Resumed, "empty, no footprint");

        let levels = d.levels().map(|l| [l.level_of(a), l.level_of(b), l.level_of(c)]);
        assert_eq!(levels, Some([Some(0), Some(0), Some(1)]));
    }

    #[test]
    fn undisplayed_member_is_capped() {
        let (mut tree, parent, [a, b, c]) = siblings();
        tree.set_flags(a, NodeFlags { hidden: true });
        let mut d = attached(parent, &[a, b, c]);
        d.dispatch_lifecycle_state(&mut tree, Resumed, &mut Tracer::none());

        assert_eq!(stage(&tree, a), Created);
        assert_eq!(stage(&tree, c), Resumed, "a no longer covers it");
    }

    #[test]
    fn undisplayed_parent_caps_all_members() {
        let (mut tree, parent, members) = siblings();
        tree.set_flags(parent, NodeFlags { hidden: true });
        let mut d = attached(parent, &members);
        d.dispatch_lifecycle_state(&mut tree, Resumed, &mut Tracer::none());
        for m in members {
            assert_eq!(stage(&tree, m), Created);
        }
    }

    #[test]
    fn joining_schedules_one_shared_recompute() {
        let (mut tree, parent, [a, b, c]) = siblings();
        let mut d = attached(parent, &[a, b]);
        d.dispatch_lifecycle_state(&mut tree, Resumed, &mut Tracer::none());
        assert_eq!(stage(&tree, c), LifecycleStage::Initialized, "not a member yet");

        d.add_container(c, HostTime(0), &mut Tracer::none());
        d.notify_layout_changed(HostTime(5), &mut Tracer::none());
        let deadline = d.pending_deadline();
        assert_eq!(
            deadline,
            Some(HostTime(5) + DispatcherConfig::default().coalescing_delay())
        );
        assert!(d.poll(&mut tree, HostTime(u64::MAX), &mut Tracer::none()));
        assert_eq!(stage(&tree, c), Created);
        assert_eq!(transitions(&tree, c), 1);
    }

    #[test]
    fn leaving_keeps_the_lifecycle_alive() {
        let (mut tree, parent, [a, b, c]) = siblings();
        let mut d = attached(parent, &[a, b, c]);
        d.dispatch_lifecycle_state(&mut tree, Resumed, &mut Tracer::none());

        let status = d.remove_container(c, HostTime(0), &mut Tracer::none());
        assert_eq!(status, CompositeStatus::Composite);
        assert!(d.poll(&mut tree, HostTime(u64::MAX), &mut Tracer::none()));
        assert_eq!(tree.lifecycle(c).map(Lifecycle::destroy_count), Some(0));
        assert_eq!(d.levels().map(LevelList::len), Some(2));
    }

    #[test]
    fn detached_member_is_destroyed_on_recompute() {
        let (mut tree, parent, [a, b, c]) = siblings();
        let mut d = attached(parent, &[a, b, c]);
        d.dispatch_lifecycle_state(&mut tree, Resumed, &mut Tracer::none());

        tree.remove_from_parent(b);
        d.on_layout_changed(&mut tree, &mut Tracer::none());
        assert_eq!(tree.lifecycle(b).map(Lifecycle::destroy_count), Some(1));
        assert_eq!(d.levels().and_then(|l| l.level_of(b)), None);
    }

    #[test]
    fn shrinking_to_one_reverts_to_single() {
        let (_, parent, [a, b, c]) = siblings();
        let mut d = attached(parent, &[a, b, c]);
        assert_eq!(
            d.remove_container(a, HostTime(0), &mut Tracer::none()),
            CompositeStatus::Composite
        );
        assert_eq!(
            d.remove_container(b, HostTime(0), &mut Tracer::none()),
            CompositeStatus::Single(c)
        );
        assert_eq!(d.state(), DispatchState::Detached);
        assert_eq!(d.pending_deadline(), None, "bookkeeping released");
        assert_eq!(
            d.remove_container(c, HostTime(0), &mut Tracer::none()),
            CompositeStatus::Empty
        );
        assert!(d.containers().is_empty());
    }

    #[test]
    #[should_panic(expected = "already part of this composite")]
    fn double_join_panics() {
        let (_, parent, [a, b, _]) = siblings();
        let mut d = attached(parent, &[a, b]);
        d.add_container(a, HostTime(0), &mut Tracer::none());
    }

    #[test]
    #[should_panic(expected = "has no lifecycle controller")]
    fn recompute_needs_parent_controller() {
        let (mut tree, parent, members) = siblings();
        tree.set_lifecycle(parent, None);
        let mut d = attached(parent, &members);
        d.on_layout_changed(&mut tree, &mut Tracer::none());
    }

    #[test]
    fn members_listed_in_join_order() {
        let (_, parent, [a, b, c]) = siblings();
        let d = CompositeDispatcher::new(parent, vec![b, a], &DispatcherConfig::default());
        assert_eq!(d.containers(), &[b, a]);
        assert!(!d.contains(c));
        assert_eq!(d.parent(), parent);
    }
}
