// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change-notification channels for the reference tree.
//!
//! [`ViewTree`](crate::tree::ViewTree) records host notifications with
//! [`understory_dirty`].
//!
//! - [`LAYOUT`] and [`HIERARCHY`] are local-only: a mutation marks the node
//!   itself and its parent, because a container's dispatcher reacts to
//!   changes in its direct children.
//! - [`DISPLAY`] propagates. Every node depends on its parent, and hidden
//!   flags, window-root changes, and reparenting mark with
//!   [`EagerPolicy`](understory_dirty::EagerPolicy), so the whole affected
//!   subtree is reported. Unhiding an ancestor therefore reaches every
//!   dispatcher below it.
//!
//! [`ViewTree::take_changes`](crate::tree::ViewTree::take_changes) drains
//! all channels into a [`TreeChanges`](crate::tree::TreeChanges), which
//! [`DispatchRegistry::route`](crate::dispatch::DispatchRegistry::route)
//! forwards to the dispatchers tracking the affected containers.

use understory_dirty::Channel;

/// Geometry or visibility changed.
pub const LAYOUT: Channel = Channel::new(0);

/// Child list changed.
pub const HIERARCHY: Channel = Channel::new(1);

/// Displayed state may have changed for the node and its descendants.
pub const DISPLAY: Channel = Channel::new(2);
