// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON-lines trace output.
//!
//! [`JsonLinesSink`] writes each event as one JSON object on its own line,
//! tagged with an `"event"` name. Node handles are written as
//! `{"index": .., "generation": ..}`.

use std::io::Write;

use serde_json::{Value, json};

use penumbra_core::time::Timebase;
use penumbra_core::trace::{
    DispatchSkippedEvent, LevelsComputedEvent, NodeDestroyedEvent, RecomputeEvent,
    RecomputeScheduledEvent, StageAppliedEvent, TraceSink,
};
use penumbra_core::tree::NodeId;

use crate::pretty::reason_name;

/// Writes one JSON object per trace event.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    timebase: Timebase,
}

impl<W: Write> std::fmt::Debug for JsonLinesSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesSink")
            .field("timebase", &self.timebase)
            .finish_non_exhaustive()
    }
}

impl<W: Write> JsonLinesSink<W> {
    /// Creates a sink writing to `writer`. Deadlines are reported in
    /// nanoseconds via `timebase`.
    #[must_use]
    pub fn new(writer: W, timebase: Timebase) -> Self {
        Self { writer, timebase }
    }

    /// Returns the destination, consuming the sink.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn emit(&mut self, value: &Value) {
        let _ = serde_json::to_writer(&mut self.writer, value);
        let _ = self.writer.write_all(b"\n");
    }
}

fn node(id: NodeId) -> Value {
    json!({ "index": id.index(), "generation": id.generation() })
}

impl<W: Write> TraceSink for JsonLinesSink<W> {
    fn on_levels_computed(&mut self, e: &LevelsComputedEvent) {
        self.emit(&json!({
            "event": "levels_computed",
            "container": node(e.container),
            "entries": e.entries,
            "levels": e.levels,
        }));
    }

    fn on_stage_applied(&mut self, e: &StageAppliedEvent) {
        self.emit(&json!({
            "event": "stage_applied",
            "node": node(e.node),
            "level": e.level,
            "stage": e.stage.to_string(),
        }));
    }

    fn on_node_destroyed(&mut self, e: &NodeDestroyedEvent) {
        self.emit(&json!({
            "event": "node_destroyed",
            "node": node(e.node),
        }));
    }

    fn on_recompute(&mut self, e: &RecomputeEvent) {
        self.emit(&json!({
            "event": "recompute",
            "container": node(e.container),
            "stage": e.stage.to_string(),
            "removed": e.removed,
            "inserted": e.inserted,
            "moved": e.moved,
            "changed": e.changed,
        }));
    }

    fn on_recompute_scheduled(&mut self, e: &RecomputeScheduledEvent) {
        let due_ns = self.timebase.ticks_to_nanos(e.deadline.ticks());
        self.emit(&json!({
            "event": "recompute_scheduled",
            "container": node(e.container),
            "due_ns": due_ns,
        }));
    }

    fn on_dispatch_skipped(&mut self, e: &DispatchSkippedEvent) {
        self.emit(&json!({
            "event": "dispatch_skipped",
            "container": node(e.container),
            "stage": e.stage.to_string(),
            "reason": reason_name(e.reason),
        }));
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::*;
    use penumbra_core::dispatch::{ContainerDispatcher, DispatcherConfig};
    use penumbra_core::lifecycle::{Lifecycle, LifecycleStage};
    use penumbra_core::trace::Tracer;
    use penumbra_core::tree::ViewTree;

    fn lines(bytes: Vec<u8>) -> Vec<Value> {
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn one_object_per_line() {
        let mut sink = JsonLinesSink::new(Vec::<u8>::new(), Timebase::NANOS);
        sink.on_node_destroyed(&NodeDestroyedEvent {
            node: NodeId::from_raw(7, 2),
        });
        sink.on_recompute(&RecomputeEvent {
            container: NodeId::from_raw(1, 0),
            stage: LifecycleStage::Resumed,
            removed: 1,
            inserted: 2,
            moved: 0,
            changed: 3,
        });
        let values = lines(sink.into_inner());
        assert_eq!(values.len(), 2);
        assert_eq!(values[0]["event"], "node_destroyed");
        assert_eq!(values[0]["node"]["generation"], 2);
        assert_eq!(values[1]["stage"], "RESUMED");
        assert_eq!(values[1]["inserted"], 2);
    }

    #[test]
    fn records_a_real_dispatch() {
        let mut tree = ViewTree::new();
        let root = tree.create_node();
        tree.set_window_root(root);
        tree.set_lifecycle(root, Some(Lifecycle::new(LifecycleStage::Resumed)));
        let _ = tree.create_child(root, Rect::new(0.0, 0.0, 10.0, 10.0));
        let mut d = ContainerDispatcher::new(root, &DispatcherConfig::default());
        d.attach();

        let mut sink = JsonLinesSink::new(Vec::<u8>::new(), Timebase::NANOS);
        d.dispatch_lifecycle_state(
            &mut tree,
            LifecycleStage::Resumed,
            &mut Tracer::new(&mut sink),
        );
        let values = lines(sink.into_inner());
        let events: Vec<&str> = values.iter().filter_map(|v| v["event"].as_str()).collect();
        assert_eq!(events, ["levels_computed", "stage_applied"]);
        assert_eq!(values[1]["level"], 0);
        assert_eq!(values[1]["stage"], "RESUMED");
    }
}
