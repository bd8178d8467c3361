// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ownership of dispatchers, keyed by container identity.
//!
//! The registry is the only place that maps a node to the dispatcher
//! observing it. Dispatchers hold node identities, never references into
//! the host tree or to each other, so dropping or detaching one cannot
//! leave a dangling back-pointer anywhere.
//!
//! Composites are keyed by their shared parent; at most one composite exists
//! per parent, and a parent with a composite cannot also be tracked on its
//! own. Either way each node is driven by at most one dispatcher.
//!
//! # Nesting
//!
//! A dispatcher whose owner is itself driven by another dispatcher (the
//! owner's parent is tracked, or the owner is a composite member) is
//! *nested*. Nested dispatchers pass on their owner's current stage rather
//! than the stage the host requested, and always run after the dispatcher
//! driving their owner, so an occluded container holds its children down.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use super::{CompositeDispatcher, CompositeStatus, ContainerDispatcher, DispatcherConfig, force};
use crate::host::HostTree;
use crate::lifecycle::LifecycleStage;
use crate::order::TreePosition;
use crate::time::HostTime;
use crate::trace::Tracer;
use crate::tree::{NodeId, TreeChanges};

/// One dispatcher the registry owns, named by the node it reads its stage
/// from.
#[derive(Clone, Copy, Debug)]
enum Owner {
    Container(NodeId),
    Composite(NodeId),
}

impl Owner {
    fn node(self) -> NodeId {
        match self {
            Self::Container(n) | Self::Composite(n) => n,
        }
    }
}

/// Owns every dispatcher for one host tree and routes notifications to them.
#[derive(Clone, Debug, Default)]
pub struct DispatchRegistry {
    config: DispatcherConfig,
    singles: BTreeMap<NodeId, ContainerDispatcher>,
    composites: BTreeMap<NodeId, CompositeDispatcher>,
    /// Member container → composite parent.
    composite_of: BTreeMap<NodeId, NodeId>,
}

impl DispatchRegistry {
    /// Creates an empty registry whose dispatchers use `config`.
    #[must_use]
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Returns the configuration new dispatchers are built with.
    #[must_use]
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Returns the tracked containers in ascending identity order.
    pub fn containers(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.singles.keys().copied()
    }

    /// Returns whether `container` has a dispatcher.
    #[must_use]
    pub fn is_tracked(&self, container: NodeId) -> bool {
        self.singles.contains_key(&container)
    }

    /// Returns the dispatcher for `container`'s children.
    #[must_use]
    pub fn dispatcher(&self, container: NodeId) -> Option<&ContainerDispatcher> {
        self.singles.get(&container)
    }

    /// Returns the composite `container` belongs to.
    #[must_use]
    pub fn composite_for(&self, container: NodeId) -> Option<&CompositeDispatcher> {
        self.composite_of
            .get(&container)
            .and_then(|p| self.composites.get(p))
    }

    /// Creates and attaches a dispatcher for `container`'s children.
    ///
    /// # Panics
    ///
    /// Panics if `container` is already tracked, or if its children already
    /// form a composite.
    pub fn track(&mut self, container: NodeId) {
        assert!(
            !self.is_tracked(container),
            "container {container:?} is already tracked"
        );
        assert!(
            !self.composites.contains_key(&container),
            "children of {container:?} already form a composite"
        );
        let mut dispatcher = ContainerDispatcher::new(container, &self.config);
        dispatcher.attach();
        self.singles.insert(container, dispatcher);
    }

    /// Detaches and drops `container`'s dispatcher, and takes it out of any
    /// composite (see [`leave`](Self::leave)).
    pub fn untrack<T: HostTree + ?Sized>(
        &mut self,
        tree: &mut T,
        container: NodeId,
        now: HostTime,
        tracer: &mut Tracer<'_>,
    ) {
        if let Some(mut dispatcher) = self.singles.remove(&container) {
            dispatcher.detach();
        }
        // Whatever is left of the composite is reported through the tree.
        let _ = self.leave(tree, container, now, tracer);
    }

    /// Groups two sibling containers into their parent's composite, creating
    /// it if needed, and schedules a shared recomputation.
    ///
    /// # Panics
    ///
    /// Panics if `a` and `b` are the same node, do not share a parent, or if
    /// their parent is tracked on its own.
    pub fn join<T: HostTree + ?Sized>(
        &mut self,
        tree: &T,
        a: NodeId,
        b: NodeId,
        now: HostTime,
        tracer: &mut Tracer<'_>,
    ) {
        assert!(a != b, "cannot join {a:?} with itself");
        let parent = match (tree.parent(a), tree.parent(b)) {
            (Some(pa), Some(pb)) if pa == pb => pa,
            _ => panic!("containers {a:?} and {b:?} do not share a parent"),
        };
        assert!(
            !self.is_tracked(parent),
            "parent {parent:?} is tracked and already drives {a:?} and {b:?}"
        );

        if let Some(composite) = self.composites.get_mut(&parent) {
            for c in [a, b] {
                if !composite.contains(c) {
                    composite.add_container(c, now, tracer);
                }
            }
        } else {
            let mut composite = CompositeDispatcher::new(parent, [a, b], &self.config);
            composite.attach();
            composite.notify_layout_changed(now, tracer);
            self.composites.insert(parent, composite);
        }
        self.composite_of.insert(a, parent);
        self.composite_of.insert(b, parent);
    }

    /// Takes `container` out of its composite.
    ///
    /// Returns `None` if it was not in one. When fewer than two members
    /// remain, the composite is dropped and the survivor, no longer ranked
    /// against anything, gets the stage the composite last dispatched. The
    /// leaving container keeps its current stage.
    pub fn leave<T: HostTree + ?Sized>(
        &mut self,
        tree: &mut T,
        container: NodeId,
        now: HostTime,
        tracer: &mut Tracer<'_>,
    ) -> Option<CompositeStatus> {
        let parent = self.composite_of.remove(&container)?;
        let composite = self.composites.get_mut(&parent)?;
        let restore = composite.last_stage();
        let status = composite.remove_container(container, now, tracer);
        match status {
            CompositeStatus::Composite => {}
            CompositeStatus::Single(last) => {
                self.composite_of.remove(&last);
                self.composites.remove(&parent);
                if let Some(stage) = restore {
                    force(tree, last, None, stage, tracer);
                    if let Some(d) = self.singles.get_mut(&last) {
                        d.dispatch_lifecycle_state(tree, stage, tracer);
                    }
                    self.fan_out(tree, None, tracer);
                }
            }
            CompositeStatus::Empty => {
                self.composites.remove(&parent);
            }
        }
        Some(status)
    }

    /// Forwards drained tree changes to every dispatcher observing an
    /// affected node.
    pub fn route(&mut self, changes: &TreeChanges, now: HostTime, tracer: &mut Tracer<'_>) {
        let nodes = changes
            .layout
            .iter()
            .chain(&changes.hierarchy)
            .chain(&changes.display);
        for &node in nodes {
            self.notify(node, now, tracer);
        }
    }

    /// Runs every recomputation due at `now`, outermost first. Returns how
    /// many ran.
    ///
    /// If any ran, nested dispatchers then pass on their owner's new stage.
    ///
    /// # Panics
    ///
    /// Panics if a due dispatcher's container has no lifecycle controller.
    pub fn poll<T: HostTree + ?Sized>(
        &mut self,
        tree: &mut T,
        now: HostTime,
        tracer: &mut Tracer<'_>,
    ) -> usize {
        let mut ran = 0;
        for owner in self.outermost_first(&*tree) {
            let due = match owner {
                Owner::Container(c) => self
                    .singles
                    .get_mut(&c)
                    .is_some_and(|d| d.poll(tree, now, tracer)),
                Owner::Composite(p) => self
                    .composites
                    .get_mut(&p)
                    .is_some_and(|d| d.poll(tree, now, tracer)),
            };
            if due {
                ran += 1;
            }
        }
        if ran > 0 {
            self.fan_out(tree, None, tracer);
        }
        ran
    }

    /// Pushes `stage` through every dispatcher, outermost first.
    ///
    /// Only dispatchers whose owner no other dispatcher drives receive
    /// `stage` itself; nested ones receive their owner's current stage.
    pub fn dispatch_lifecycle_state<T: HostTree + ?Sized>(
        &mut self,
        tree: &mut T,
        stage: LifecycleStage,
        tracer: &mut Tracer<'_>,
    ) {
        self.fan_out(tree, Some(stage), tracer);
    }

    /// Detaches and drops every dispatcher.
    pub fn detach_all(&mut self) {
        for dispatcher in self.singles.values_mut() {
            dispatcher.detach();
        }
        for composite in self.composites.values_mut() {
            composite.detach();
        }
        self.singles.clear();
        self.composites.clear();
        self.composite_of.clear();
    }

    fn notify(&mut self, node: NodeId, now: HostTime, tracer: &mut Tracer<'_>) {
        if let Some(dispatcher) = self.singles.get_mut(&node) {
            dispatcher.notify_layout_changed(now, tracer);
        }
        // A member's geometry or content, or the shared parent itself.
        let parent = self.composite_of.get(&node).copied().unwrap_or(node);
        if let Some(composite) = self.composites.get_mut(&parent) {
            composite.notify_layout_changed(now, tracer);
        }
    }

    /// Every dispatcher, ordered so that one driving a node runs before any
    /// dispatcher owned by that node or its descendants.
    fn outermost_first<T: HostTree + ?Sized>(&self, tree: &T) -> Vec<Owner> {
        let mut owners: Vec<Owner> = self
            .singles
            .keys()
            .map(|&c| Owner::Container(c))
            .chain(self.composites.keys().map(|&p| Owner::Composite(p)))
            .collect();
        owners.sort_by_cached_key(|o| TreePosition::of(tree, o.node()));
        owners
    }

    /// Returns whether another dispatcher forces stages onto `node`.
    fn is_driven<T: HostTree + ?Sized>(&self, tree: &T, node: NodeId) -> bool {
        self.composite_of.contains_key(&node)
            || tree.parent(node).is_some_and(|p| self.is_tracked(p))
    }

    /// Dispatches outermost first. Dispatchers nobody drives get `requested`
    /// (or nothing, if `None`); nested ones get their owner's current stage.
    fn fan_out<T: HostTree + ?Sized>(
        &mut self,
        tree: &mut T,
        requested: Option<LifecycleStage>,
        tracer: &mut Tracer<'_>,
    ) {
        for owner in self.outermost_first(&*tree) {
            let node = owner.node();
            let current = tree.controller(node).map(|c| c.current_stage());
            let stage = if self.is_driven(&*tree, node) {
                current.or(requested)
            } else {
                requested
            };
            let Some(stage) = stage else {
                continue;
            };
            match owner {
                Owner::Container(c) => {
                    if let Some(d) = self.singles.get_mut(&c) {
                        d.dispatch_lifecycle_state(tree, stage, tracer);
                    }
                }
                Owner::Composite(p) => {
                    if let Some(d) = self.composites.get_mut(&p) {
                        d.dispatch_lifecycle_state(tree, stage, tracer);
                    }
                }
            }
        }
    }
}
