// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Deadlines
//! are converted to microseconds using a [`Timebase`].

use std::io::Write;

use penumbra_core::time::{HostTime, Timebase};
use penumbra_core::trace::{
    DispatchSkippedEvent, LevelsComputedEvent, NodeDestroyedEvent, RecomputeEvent,
    RecomputeScheduledEvent, SkipReason, StageAppliedEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    timebase: Timebase,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("timebase", &self.timebase)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr(timebase: Timebase) -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
            timebase,
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>, timebase: Timebase) -> Self {
        Self { writer, timebase }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W, timebase: Timebase) -> Self {
        Self { writer, timebase }
    }

    /// Returns the destination, consuming the sink.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn host_us(&self, t: HostTime) -> f64 {
        self.timebase.ticks_to_nanos(t.ticks()) as f64 / 1000.0
    }
}

pub(crate) fn reason_name(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::SameStage => "same-stage",
        SkipReason::NotDisplayed => "not-displayed",
        SkipReason::Inactive => "inactive",
        SkipReason::Detached => "detached",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_levels_computed(&mut self, e: &LevelsComputedEvent) {
        let _ = writeln!(
            self.writer,
            "[levels] container={:?} entries={} levels={}",
            e.container, e.entries, e.levels,
        );
    }

    fn on_stage_applied(&mut self, e: &StageAppliedEvent) {
        let level = match e.level {
            Some(l) => format!("{l}"),
            None => "-".into(),
        };
        let _ = writeln!(
            self.writer,
            "[stage] node={:?} level={level} -> {}",
            e.node, e.stage,
        );
    }

    fn on_node_destroyed(&mut self, e: &NodeDestroyedEvent) {
        let _ = writeln!(self.writer, "[destroy] node={:?}", e.node);
    }

    fn on_recompute(&mut self, e: &RecomputeEvent) {
        let _ = writeln!(
            self.writer,
            "[recompute] container={:?} stage={} removed={} inserted={} moved={} changed={}",
            e.container, e.stage, e.removed, e.inserted, e.moved, e.changed,
        );
    }

    fn on_recompute_scheduled(&mut self, e: &RecomputeScheduledEvent) {
        let _ = writeln!(
            self.writer,
            "[schedule] container={:?} due={:.1}µs",
            e.container,
            self.host_us(e.deadline),
        );
    }

    fn on_dispatch_skipped(&mut self, e: &DispatchSkippedEvent) {
        let _ = writeln!(
            self.writer,
            "[skip] container={:?} stage={} reason={}",
            e.container,
            e.stage,
            reason_name(e.reason),
        );
    }
}
