// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reference view tree.
//!
//! [`ViewTree`] is a struct-of-arrays node store implementing
//! [`HostTree`](crate::host::HostTree). Real hosts bring their own tree; this
//! one backs the tests and small embedders. Each node has:
//!
//! - An identity ([`NodeId`]): a generational handle that becomes stale when
//!   the node is destroyed.
//! - Topology: parent, first-child, and sibling links forming an ordered
//!   tree. Later siblings draw on top of earlier ones.
//! - Geometry: [`bounds`](ViewTree::set_bounds) in parent coordinates, a
//!   [`translation`](ViewTree::set_translation) offset, and a
//!   [`z_order`](ViewTree::set_z_order) key.
//! - [`NodeFlags`] and an optional [`Lifecycle`](crate::lifecycle::Lifecycle)
//!   controller.
//!
//! A node is *displayed* when its ancestor chain reaches the
//! [window root](ViewTree::set_window_root) without crossing a hidden node.

mod id;
mod store;

pub use id::{INVALID, NodeId};
pub use store::{NodeFlags, TreeChanges, ViewTree};
