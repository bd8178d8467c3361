// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Occlusion levels and lifecycle dispatch for view trees.
//!
//! `penumbra_core` decides which children of a container are actually
//! visible and drives each child's lifecycle accordingly: a child fully
//! covered by siblings in front of it is held at a lower stage than the
//! uncovered ones. It is `no_std` compatible (with `alloc`) and observes the
//! host's tree through a trait, never owning it.
//!
//! # Architecture
//!
//! ```text
//!   Host mutations
//!       │
//!       ▼
//!   ViewTree::take_changes() ──► TreeChanges ──► DispatchRegistry::route()
//!                                                       │
//!                 ┌─────────────────────────────────────┘
//!                 ▼
//!   Debouncer ── poll(now) ──► LevelAssigner::assign() ──► LevelList
//!                                                             │
//!                 ┌───────────────────────────────────────────┘
//!                 ▼
//!   LevelDiff::between() ──► LifecycleController::{force_stage, destroy}
//! ```
//!
//! **[`region`]**: Exact unions of disjoint rectangles with containment
//! queries.
//!
//! **[`level`]**: Front-to-back level assignment: a node's level is one past
//! the deepest level whose union already covers it.
//!
//! **[`diff`]**: Minimal edit scripts between two level lists, matched by
//! node identity.
//!
//! **[`order`]**: Front-to-back ordering of children and composite siblings.
//!
//! **[`lifecycle`]**: Ordered stages and the
//! [`LifecycleController`](lifecycle::LifecycleController) contract.
//!
//! **[`host`]**: The [`HostTree`](host::HostTree) trait dispatchers read
//! geometry, topology, and controllers through.
//!
//! **[`tree`]**: A struct-of-arrays reference tree with generational
//! handles, implementing `HostTree`.
//!
//! **[`dirty`]**: Change-notification channels via `understory_dirty`.
//!
//! **[`debounce`]**: Coalescing of layout-change bursts into one
//! recomputation.
//!
//! **[`dispatch`]**: Single-container and composite dispatchers, and the
//! registry that owns them.
//!
//! **[`time`]**: Host clock ticks and timebase conversion.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types, with
//! a zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod debounce;
pub mod diff;
pub mod dirty;
pub mod dispatch;
pub mod host;
pub mod level;
pub mod lifecycle;
pub mod order;
pub mod region;
pub mod time;
pub mod trace;
pub mod tree;
