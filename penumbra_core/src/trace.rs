// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for lifecycle dispatch.
//!
//! Dispatchers report what they do through a [`TraceSink`]. All sink methods
//! default to no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! Sinks for development live in `penumbra_debug`.

use crate::lifecycle::LifecycleStage;
use crate::time::HostTime;
use crate::tree::NodeId;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Why a lifecycle dispatch or recomputation did no level work.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The requested stage equals the last dispatched stage.
    SameStage,
    /// The container is not displayed.
    NotDisplayed,
    /// The stage is below [`LifecycleStage::ACTIVE`].
    Inactive,
    /// The dispatcher is detached.
    Detached,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted after a level assignment pass.
#[derive(Clone, Copy, Debug)]
pub struct LevelsComputedEvent {
    /// Container (or composite parent) the pass ran for.
    pub container: NodeId,
    /// Number of entries in the new level list.
    pub entries: usize,
    /// Number of distinct levels.
    pub levels: u32,
}

/// Emitted when a stage is forced onto a node.
#[derive(Clone, Copy, Debug)]
pub struct StageAppliedEvent {
    /// The node.
    pub node: NodeId,
    /// The node's occlusion level, or `None` when levels were bypassed.
    pub level: Option<u32>,
    /// The stage applied.
    pub stage: LifecycleStage,
}

/// Emitted when a node that left the level list is torn down.
#[derive(Clone, Copy, Debug)]
pub struct NodeDestroyedEvent {
    /// The node.
    pub node: NodeId,
}

/// Emitted after a diff-driven recomputation.
#[derive(Clone, Copy, Debug)]
pub struct RecomputeEvent {
    /// Container (or composite parent) the recomputation ran for.
    pub container: NodeId,
    /// Stage the surviving nodes were driven to.
    pub stage: LifecycleStage,
    /// Nodes only in the old list.
    pub removed: usize,
    /// Nodes only in the new list.
    pub inserted: usize,
    /// Nodes in both lists whose order changed.
    pub moved: usize,
    /// Nodes in both lists whose level or visibility changed.
    pub changed: usize,
}

/// Emitted when a layout notification (re)schedules a recomputation.
#[derive(Clone, Copy, Debug)]
pub struct RecomputeScheduledEvent {
    /// Container (or composite parent).
    pub container: NodeId,
    /// When the recomputation becomes due.
    pub deadline: HostTime,
}

/// Emitted when a dispatch or recomputation is short-circuited.
#[derive(Clone, Copy, Debug)]
pub struct DispatchSkippedEvent {
    /// Container (or composite parent).
    pub container: NodeId,
    /// Stage that was requested.
    pub stage: LifecycleStage,
    /// Why level work was skipped.
    pub reason: SkipReason,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from dispatchers.
pub trait TraceSink {
    /// Called after a level assignment pass.
    fn on_levels_computed(&mut self, e: &LevelsComputedEvent) {
        _ = e;
    }

    /// Called when a stage is forced onto a node.
    fn on_stage_applied(&mut self, e: &StageAppliedEvent) {
        _ = e;
    }

    /// Called when a node is destroyed.
    fn on_node_destroyed(&mut self, e: &NodeDestroyedEvent) {
        _ = e;
    }

    /// Called after a diff-driven recomputation.
    fn on_recompute(&mut self, e: &RecomputeEvent) {
        _ = e;
    }

    /// Called when a recomputation is (re)scheduled.
    fn on_recompute_scheduled(&mut self, e: &RecomputeScheduledEvent) {
        _ = e;
    }

    /// Called when level work is skipped.
    fn on_dispatch_skipped(&mut self, e: &DispatchSkippedEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

/// Expands to a `Tracer` method forwarding one event type to the sink.
macro_rules! forward {
    ($(#[$doc:meta])* $name:ident, $event:ty, $hook:ident) => {
        $(#[$doc])*
        #[inline]
        pub fn $name(&mut self, e: &$event) {
            #[cfg(feature = "trace")]
            if let Some(s) = &mut self.sink {
                s.$hook(e);
            }
            #[cfg(not(feature = "trace"))]
            {
                _ = e;
            }
        }
    };
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    forward!(
        /// Emits a [`LevelsComputedEvent`].
        levels_computed, LevelsComputedEvent, on_levels_computed
    );
    forward!(
        /// Emits a [`StageAppliedEvent`].
        stage_applied, StageAppliedEvent, on_stage_applied
    );
    forward!(
        /// Emits a [`NodeDestroyedEvent`].
        node_destroyed, NodeDestroyedEvent, on_node_destroyed
    );
    forward!(
        /// Emits a [`RecomputeEvent`].
        recompute, RecomputeEvent, on_recompute
    );
    forward!(
        /// Emits a [`RecomputeScheduledEvent`].
        recompute_scheduled, RecomputeScheduledEvent, on_recompute_scheduled
    );
    forward!(
        /// Emits a [`DispatchSkippedEvent`].
        dispatch_skipped, DispatchSkippedEvent, on_dispatch_skipped
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn skipped() -> DispatchSkippedEvent {
        DispatchSkippedEvent {
            container: NodeId::from_raw(3, 0),
            stage: LifecycleStage::Resumed,
            reason: SkipReason::SameStage,
        }
    }

    #[test]
    fn noop_sink_accepts_everything() {
        let mut sink = NoopSink;
        sink.on_dispatch_skipped(&skipped());
        sink.on_node_destroyed(&NodeDestroyedEvent {
            node: NodeId::from_raw(0, 0),
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.dispatch_skipped(&skipped());
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            reasons: Vec<SkipReason>,
        }
        impl TraceSink for RecordingSink {
            fn on_dispatch_skipped(&mut self, e: &DispatchSkippedEvent) {
                self.reasons.push(e.reason);
            }
        }

        let mut sink = RecordingSink {
            reasons: Vec::new(),
        };
        let mut tracer = Tracer::new(&mut sink);
        tracer.dispatch_skipped(&skipped());
        drop(tracer);
        assert_eq!(sink.reasons, &[SkipReason::SameStage]);
    }
}
