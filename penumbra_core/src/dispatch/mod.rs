// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lifecycle dispatch driven by occlusion levels.
//!
//! A dispatcher owns one *scope* of nodes and pushes lifecycle stages into
//! their controllers:
//!
//! - [`ContainerDispatcher`]: the direct children of one container.
//! - [`CompositeDispatcher`]: a set of sibling containers treated as the
//!   children of their shared parent.
//! - [`DispatchRegistry`]: owns dispatchers keyed by container identity and
//!   routes host notifications to them.
//!
//! Both dispatchers share one engine:
//!
//! ```text
//!   layout / hierarchy notification
//!       │
//!       ▼
//!   Debouncer::notify ── poll(now) ──► LevelAssigner::assign ──► LevelList
//!                                                                   │
//!                 ┌─────────────────────────────────────────────────┘
//!                 ▼
//!   LevelDiff::between(stored, new) ──► destroy removed, force stage on rest
//!                 │
//!                 ▼
//!   stored LevelList := new
//! ```
//!
//! An explicit [`dispatch_lifecycle_state`](ContainerDispatcher::dispatch_lifecycle_state)
//! is synchronous and skips the differ: it re-applies the stored level list
//! (computing one if none exists yet).
//!
//! # Stage rules
//!
//! - A request equal to the last dispatched stage does nothing.
//! - If the scope's owner is not displayed, every member is forced to the
//!   requested stage capped at [`LifecycleStage::CAPPED`]. If the stage is
//!   below [`LifecycleStage::ACTIVE`], every member gets it unchanged. Both
//!   bypass level computation.
//! - Otherwise visible level-0 members get the stage and all others are
//!   capped (see [`LevelEntry::stage_for`](crate::level::LevelEntry::stage_for)).
//!
//! # Panics
//!
//! Recomputing after a layout change reads the owner's lifecycle controller.
//! An attached dispatcher whose owner has no controller is a wiring bug and
//! panics.

mod composite;
mod container;
mod registry;

pub use composite::{CompositeDispatcher, CompositeStatus};
pub use container::ContainerDispatcher;
pub use registry::DispatchRegistry;

use alloc::vec::Vec;

use crate::debounce::{Debouncer, FrameTiming, coalescing_delay};
use crate::diff::LevelDiff;
use crate::host::HostTree;
use crate::level::{LevelAssigner, LevelInput, LevelList};
use crate::lifecycle::LifecycleStage;
use crate::order::ZOrdering;
use crate::time::{Duration, HostTime, Timebase};
use crate::trace::{
    DispatchSkippedEvent, LevelsComputedEvent, NodeDestroyedEvent, RecomputeEvent,
    RecomputeScheduledEvent, SkipReason, StageAppliedEvent, Tracer,
};
use crate::tree::NodeId;

/// Configuration shared by every dispatcher a registry creates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DispatcherConfig {
    /// Display timing used to size the coalescing delay.
    pub timing: FrameTiming,
    /// Host clock timebase.
    pub timebase: Timebase,
    /// How a container's children are put in front-to-back order.
    pub ordering: ZOrdering,
}

impl DispatcherConfig {
    /// Creates a configuration with [`ZOrdering::Elevation`].
    #[must_use]
    pub const fn new(timing: FrameTiming, timebase: Timebase) -> Self {
        Self {
            timing,
            timebase,
            ordering: ZOrdering::Elevation,
        }
    }

    /// Returns a copy using `ordering`.
    #[must_use]
    pub const fn with_ordering(self, ordering: ZOrdering) -> Self {
        Self { ordering, ..self }
    }

    /// Returns the coalescing delay in host ticks.
    #[must_use]
    pub fn coalescing_delay(&self) -> Duration {
        coalescing_delay(self.timing, self.timebase)
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self::new(FrameTiming::DEFAULT, Timebase::NANOS)
    }
}

/// Attachment state of a dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DispatchState {
    /// Not receiving notifications; holds no levels.
    Detached,
    /// Receiving notifications; no level list computed yet.
    Attached,
    /// Receiving notifications, with a stored level list.
    AttachedWithLevels,
}

/// The set of nodes a dispatcher drives, and how to order them.
pub(crate) trait Scope {
    /// Node whose display state and controller govern the scope.
    fn owner(&self) -> NodeId;

    /// Members in front-to-back order, ready for level assignment.
    fn level_inputs<T: HostTree + ?Sized>(&self, tree: &T) -> Vec<LevelInput>;

    /// Every member, in any order.
    fn members<T: HostTree + ?Sized>(&self, tree: &T) -> Vec<NodeId>;
}

/// State and behaviour shared by both dispatcher kinds.
#[derive(Clone, Debug)]
pub(crate) struct LevelEngine {
    attached: bool,
    assigner: LevelAssigner,
    levels: Option<LevelList>,
    last_stage: Option<LifecycleStage>,
    debouncer: Debouncer,
}

impl LevelEngine {
    pub(crate) fn new(config: &DispatcherConfig) -> Self {
        Self {
            attached: false,
            assigner: LevelAssigner::new(),
            levels: None,
            last_stage: None,
            debouncer: Debouncer::new(config.coalescing_delay()),
        }
    }

    pub(crate) fn state(&self) -> DispatchState {
        match (self.attached, &self.levels) {
            (false, _) => DispatchState::Detached,
            (true, None) => DispatchState::Attached,
            (true, Some(_)) => DispatchState::AttachedWithLevels,
        }
    }

    pub(crate) fn levels(&self) -> Option<&LevelList> {
        self.levels.as_ref()
    }

    pub(crate) fn last_stage(&self) -> Option<LifecycleStage> {
        self.last_stage
    }

    pub(crate) fn pending_deadline(&self) -> Option<HostTime> {
        self.debouncer.deadline()
    }

    pub(crate) fn attach(&mut self) {
        self.attached = true;
    }

    /// Stops notifications and releases levels, stage record, and any
    /// pending recomputation.
    pub(crate) fn detach(&mut self) {
        self.attached = false;
        self.debouncer.cancel();
        self.levels = None;
        self.last_stage = None;
    }

    /// Drops `node` from the stored levels without tearing it down.
    pub(crate) fn forget(&mut self, node: NodeId) {
        if let Some(levels) = &mut self.levels {
            levels.forget(node);
        }
    }

    pub(crate) fn notify(&mut self, owner: NodeId, now: HostTime, tracer: &mut Tracer<'_>) {
        if !self.attached {
            return;
        }
        self.debouncer.notify(now);
        if let Some(deadline) = self.debouncer.deadline() {
            tracer.recompute_scheduled(&RecomputeScheduledEvent {
                container: owner,
                deadline,
            });
        }
    }

    /// Runs the pending recomputation if it is due.
    pub(crate) fn poll<S: Scope, T: HostTree + ?Sized>(
        &mut self,
        scope: &S,
        tree: &mut T,
        now: HostTime,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        if !self.attached || !self.debouncer.poll(now) {
            return false;
        }
        self.on_layout_changed(scope, tree, tracer);
        true
    }

    pub(crate) fn dispatch_lifecycle_state<S: Scope, T: HostTree + ?Sized>(
        &mut self,
        scope: &S,
        tree: &mut T,
        stage: LifecycleStage,
        tracer: &mut Tracer<'_>,
    ) {
        let owner = scope.owner();
        let skip = |reason| DispatchSkippedEvent {
            container: owner,
            stage,
            reason,
        };
        if !self.attached {
            tracer.dispatch_skipped(&skip(SkipReason::Detached));
            return;
        }
        if self.last_stage == Some(stage) {
            tracer.dispatch_skipped(&skip(SkipReason::SameStage));
            return;
        }

        let displayed = tree.is_displayed(owner);
        if !displayed || !stage.is_at_least(LifecycleStage::ACTIVE) {
            let (applied, reason) = if displayed {
                (stage, SkipReason::Inactive)
            } else {
                (stage.capped(), SkipReason::NotDisplayed)
            };
            tracer.dispatch_skipped(&skip(reason));
            for node in scope.members(&*tree) {
                force(tree, node, None, applied, tracer);
            }
            self.last_stage = Some(applied);
            return;
        }

        if self.levels.is_none() {
            let list = self.compute(scope, &*tree, tracer);
            self.levels = Some(list);
        }
        if let Some(levels) = &self.levels {
            for entry in levels {
                force(tree, entry.node, Some(entry.level), entry.stage_for(stage), tracer);
            }
        }
        self.last_stage = Some(stage);
    }

    /// Recomputes levels and applies the minimal set of transitions.
    ///
    /// # Panics
    ///
    /// Panics if the scope's owner has no lifecycle controller.
    pub(crate) fn on_layout_changed<S: Scope, T: HostTree + ?Sized>(
        &mut self,
        scope: &S,
        tree: &mut T,
        tracer: &mut Tracer<'_>,
    ) {
        if !self.attached {
            return;
        }
        let owner = scope.owner();
        let Some(controller) = tree.controller(owner) else {
            panic!("dispatcher attached to {owner:?}, which has no lifecycle controller");
        };
        let stage = controller.current_stage();

        let reason = if !tree.is_displayed(owner) {
            Some(SkipReason::NotDisplayed)
        } else if !stage.is_at_least(LifecycleStage::ACTIVE) {
            Some(SkipReason::Inactive)
        } else {
            None
        };
        if let Some(reason) = reason {
            tracer.dispatch_skipped(&DispatchSkippedEvent {
                container: owner,
                stage,
                reason,
            });
            return;
        }

        let new = self.compute(scope, &*tree, tracer);
        let old = self.levels.take().unwrap_or_default();
        let diff = LevelDiff::between(&old, &new);

        for edit in diff.removed() {
            if let Some(controller) = tree.controller_mut(edit.node) {
                controller.destroy();
                tracer.node_destroyed(&NodeDestroyedEvent { node: edit.node });
            }
        }
        for entry in &new {
            force(tree, entry.node, Some(entry.level), entry.stage_for(stage), tracer);
        }

        tracer.recompute(&RecomputeEvent {
            container: owner,
            stage,
            removed: diff.removed().count(),
            inserted: diff.inserted().count(),
            moved: diff.moved().count(),
            changed: diff.retained().filter(|e| e.content_changed).count(),
        });
        self.levels = Some(new);
        self.last_stage = Some(stage);
    }

    fn compute<S: Scope, T: HostTree + ?Sized>(
        &mut self,
        scope: &S,
        tree: &T,
        tracer: &mut Tracer<'_>,
    ) -> LevelList {
        let list = self.assigner.assign(scope.level_inputs(tree));
        tracer.levels_computed(&LevelsComputedEvent {
            container: scope.owner(),
            entries: list.len(),
            levels: list.level_count(),
        });
        list
    }
}

/// Forces `stage` onto `node`'s controller, if it has one.
fn force<T: HostTree + ?Sized>(
    tree: &mut T,
    node: NodeId,
    level: Option<u32>,
    stage: LifecycleStage,
    tracer: &mut Tracer<'_>,
) {
    let Some(controller) = tree.controller_mut(node) else {
        return;
    };
    if controller.current_stage() != stage {
        controller.force_stage(stage);
        tracer.stage_applied(&StageAppliedEvent { node, level, stage });
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use kurbo::Rect;

    use crate::host::HostTree;
    use crate::lifecycle::{Lifecycle, LifecycleStage};
    use crate::tree::{NodeId, ViewTree};

    /// A displayed root with a resumed controller, plus a displayed container
    /// under it that also owns a controller.
    pub(crate) fn window() -> (ViewTree, NodeId, NodeId) {
        let mut tree = ViewTree::new();
        let root = tree.create_node();
        tree.set_window_root(root);
        tree.set_bounds(root, Rect::new(0.0, 0.0, 100.0, 100.0));
        tree.set_lifecycle(root, Some(Lifecycle::new(LifecycleStage::Resumed)));
        let container = tree.create_child(root, Rect::new(0.0, 0.0, 100.0, 100.0));
        tree.set_lifecycle(container, Some(Lifecycle::new(LifecycleStage::Resumed)));
        (tree, root, container)
    }

    pub(crate) fn stage(tree: &ViewTree, node: NodeId) -> LifecycleStage {
        tree.controller(node)
            .map_or(LifecycleStage::Destroyed, |lc| lc.current_stage())
    }

    pub(crate) fn transitions(tree: &ViewTree, node: NodeId) -> u32 {
        tree.lifecycle(node).map_or(0, Lifecycle::transitions)
    }
}
