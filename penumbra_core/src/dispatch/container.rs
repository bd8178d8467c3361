// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatch to the direct children of one container.

use alloc::vec::Vec;

use super::{DispatchState, DispatcherConfig, LevelEngine, Scope};
use crate::host::{HostTree, children_of, screen_rect};
use crate::level::{LevelInput, LevelList};
use crate::lifecycle::LifecycleStage;
use crate::order::ZOrdering;
use crate::time::HostTime;
use crate::trace::Tracer;
use crate::tree::NodeId;

#[derive(Clone, Copy, Debug)]
struct ContainerScope {
    container: NodeId,
    ordering: ZOrdering,
}

impl Scope for ContainerScope {
    fn owner(&self) -> NodeId {
        self.container
    }

    fn level_inputs<T: HostTree + ?Sized>(&self, tree: &T) -> Vec<LevelInput> {
        self.ordering
            .front_to_back(tree, self.container)
            .into_iter()
            .map(|node| LevelInput {
                node,
                rect: screen_rect(tree, node),
                visible: tree.is_displayed(node),
            })
            .collect()
    }

    fn members<T: HostTree + ?Sized>(&self, tree: &T) -> Vec<NodeId> {
        children_of(tree, self.container)
    }
}

/// Drives the lifecycles of one container's direct children from their
/// occlusion levels.
///
/// The dispatcher holds the container's identity only; geometry and
/// controllers are read from the [`HostTree`] passed into each call.
#[derive(Clone, Debug)]
pub struct ContainerDispatcher {
    scope: ContainerScope,
    engine: LevelEngine,
}

impl ContainerDispatcher {
    /// Creates a detached dispatcher for `container`.
    #[must_use]
    pub fn new(container: NodeId, config: &DispatcherConfig) -> Self {
        Self {
            scope: ContainerScope {
                container,
                ordering: config.ordering,
            },
            engine: LevelEngine::new(config),
        }
    }

    /// Returns the container this dispatcher drives.
    #[must_use]
    pub fn container(&self) -> NodeId {
        self.scope.container
    }

    /// Returns the attachment state.
    #[must_use]
    pub fn state(&self) -> DispatchState {
        self.engine.state()
    }

    /// Returns the stored level list, if one has been computed since attach.
    #[must_use]
    pub fn levels(&self) -> Option<&LevelList> {
        self.engine.levels()
    }

    /// Returns the last stage dispatched to the children.
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

    /// Stops accepting notifications, cancels any pending recomputation, and
    /// releases the stored levels and stage record.
    pub fn detach(&mut self) {
        self.engine.detach();
    }

    /// Pushes `stage` down to the children.
    ///
    /// See the [module docs](super) for the stage rules.
    pub fn dispatch_lifecycle_state<T: HostTree + ?Sized>(
        &mut self,
        tree: &mut T,
        stage: LifecycleStage,
        tracer: &mut Tracer<'_>,
    ) {
        self.engine
            .dispatch_lifecycle_state(&self.scope, tree, stage, tracer);
    }

    /// Records a layout or hierarchy change at `now` and (re)schedules the
    /// recomputation.
    pub fn notify_layout_changed(&mut self, now: HostTime, tracer: &mut Tracer<'_>) {
        self.engine.notify(self.scope.container, now, tracer);
    }

    /// Runs the pending recomputation if it is due at `now`.
    ///
    /// Returns `true` if a recomputation ran.
    ///
    /// # Panics
    ///
    /// Panics if the recomputation runs and the container has no lifecycle
    /// controller.
    pub fn poll<T: HostTree + ?Sized>(
        &mut self,
        tree: &mut T,
        now: HostTime,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        self.engine.poll(&self.scope, tree, now, tracer)
    }

    /// Recomputes levels immediately and applies only what changed.
    ///
    /// Removed children are destroyed; every remaining child is forced to
    /// its stage for the container's current stage. Does nothing when the
    /// container is not displayed or below [`LifecycleStage::ACTIVE`].
    ///
    /// # Panics
    ///
    /// Panics if the container has no lifecycle controller.
    pub fn on_layout_changed<T: HostTree + ?Sized>(
        &mut self,
        tree: &mut T,
        tracer: &mut Tracer<'_>,
    ) {
        self.engine.on_layout_changed(&self.scope, tree, tracer);
    }
}
