// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lifecycle stages and the controller contract.
//!
//! A [`LifecycleStage`] is an ordered activity state. Dispatchers never run a
//! lifecycle state machine themselves; they force a stage onto each node's
//! [`LifecycleController`], which the host supplies. [`Lifecycle`] is a small
//! concrete controller used by the reference [`ViewTree`](crate::tree::ViewTree).

use core::fmt;

/// An ordered activity stage.
///
/// Ordering follows activity: `Destroyed < Initialized < Created < Started <
/// Resumed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LifecycleStage {
    /// Torn down; no further transitions are expected.
    Destroyed,
    /// Constructed but not yet created.
    Initialized,
    /// Created but not visible to the user.
    Created,
    /// Visible but not in the foreground.
    Started,
    /// Fully visible and interactive.
    Resumed,
}

impl LifecycleStage {
    /// Lowest stage at which occlusion levels are computed.
    ///
    /// Below this, stages are applied to every child directly.
    pub const ACTIVE: Self = Self::Started;

    /// Highest stage an occluded, nested, or undisplayed node may reach.
    pub const CAPPED: Self = Self::Created;

    /// Returns whether `self` is at or above `other`.
    #[inline]
    #[must_use]
    pub fn is_at_least(self, other: Self) -> bool {
        self >= other
    }

    /// Returns `self` lowered to at most [`CAPPED`](Self::CAPPED).
    #[inline]
    #[must_use]
    pub fn capped(self) -> Self {
        self.min(Self::CAPPED)
    }
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Destroyed => "DESTROYED",
            Self::Initialized => "INITIALIZED",
            Self::Created => "CREATED",
            Self::Started => "STARTED",
            Self::Resumed => "RESUMED",
        })
    }
}

/// A node-owned lifecycle state machine that can be forced into a stage.
pub trait LifecycleController {
    /// Returns the stage the controller is currently in.
    fn current_stage(&self) -> LifecycleStage;

    /// Moves the controller to `stage`.
    ///
    /// Must be a no-op when `stage` equals [`current_stage`](Self::current_stage).
    fn force_stage(&mut self, stage: LifecycleStage);

    /// Releases the controller. The node is no longer tracked afterwards.
    fn destroy(&mut self);
}

/// A recording [`LifecycleController`].
///
/// Counts effective transitions so callers can verify that redundant
/// requests were short-circuited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lifecycle {
    stage: LifecycleStage,
    transitions: u32,
    destroyed: u32,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new(LifecycleStage::Initialized)
    }
}

impl Lifecycle {
    /// Creates a controller sitting at `stage`.
    #[must_use]
    pub const fn new(stage: LifecycleStage) -> Self {
        Self {
            stage,
            transitions: 0,
            destroyed: 0,
        }
    }

    /// Number of stage changes applied so far (no-op requests excluded).
    #[must_use]
    pub const fn transitions(&self) -> u32 {
        self.transitions
    }

    /// Number of times [`destroy`](LifecycleController::destroy) was called.
    #[must_use]
    pub const fn destroy_count(&self) -> u32 {
        self.destroyed
    }

    /// Returns whether the controller has been destroyed.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed > 0
    }
}

impl LifecycleController for Lifecycle {
    fn current_stage(&self) -> LifecycleStage {
        self.stage
    }

    fn force_stage(&mut self, stage: LifecycleStage) {
        if self.stage != stage {
            self.stage = stage;
            self.transitions += 1;
        }
    }

    fn destroy(&mut self) {
        self.stage = LifecycleStage::Destroyed;
        self.destroyed += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_ordered_by_activity() {
        assert!(LifecycleStage::Resumed.is_at_least(LifecycleStage::ACTIVE));
        assert!(LifecycleStage::Started.is_at_least(LifecycleStage::ACTIVE));
        assert!(!LifecycleStage::Created.is_at_least(LifecycleStage::ACTIVE));
        assert_eq!(LifecycleStage::Resumed.capped(), LifecycleStage::Created);
        assert_eq!(
            LifecycleStage::Initialized.capped(),
            LifecycleStage::Initialized,
            "capping never raises a stage"
        );
    }

    #[test]
    fn forcing_the_same_stage_is_free() {
        let mut lc = Lifecycle::default();
        lc.force_stage(LifecycleStage::Created);
        lc.force_stage(LifecycleStage::Created);
        lc.force_stage(LifecycleStage::Resumed);
        assert_eq!(lc.transitions(), 2, "repeat request ignored");
        assert_eq!(lc.current_stage(), LifecycleStage::Resumed);
    }

    #[test]
    fn destroy_is_counted() {
        let mut lc = Lifecycle::new(LifecycleStage::Resumed);
        lc.destroy();
        assert!(lc.is_destroyed());
        assert_eq!(lc.destroy_count(), 1);
        assert_eq!(lc.current_stage(), LifecycleStage::Destroyed);
    }
}
