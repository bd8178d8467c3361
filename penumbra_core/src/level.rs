// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Occlusion level assignment.
//!
//! [`LevelAssigner::assign`] walks nodes front-to-back and keeps one
//! [`Region`] per level. A node's level is one past the deepest level whose
//! footprint already fully covers it, or 0 when none does:
//!
//! ```text
//!   front ─►  A [0,0,10,10]   level 0   levels: [ A ]
//!             B [2,2, 8, 8]   level 1   levels: [ A | B ]      (inside A)
//!   back  ─►  C [20,20,30,30] level 0   levels: [ A ∪ C | B ]  (disjoint)
//! ```
//!
//! Only level 0 may reach the highest lifecycle stage; see
//! [`LevelEntry::stage_for`].

use alloc::vec::Vec;

use kurbo::Rect;

use crate::lifecycle::LifecycleStage;
use crate::region::Region;
use crate::tree::NodeId;

/// One node to place, as seen by the assigner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelInput {
    /// The node.
    pub node: NodeId,
    /// On-screen rectangle (bounds moved by translation).
    pub rect: Rect,
    /// Whether the node is displayed. Undisplayed nodes are recorded but
    /// contribute no footprint.
    pub visible: bool,
}

/// A node's occlusion level, captured during one assignment pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LevelEntry {
    /// The node.
    pub node: NodeId,
    /// Occlusion level; 0 is the unoccluded top layer.
    pub level: u32,
    /// Whether the node was displayed when the level was captured.
    pub visible: bool,
}

impl LevelEntry {
    /// Returns the stage this entry should be forced into when its container
    /// is at `stage`.
    ///
    /// Visible level-0 entries take `stage` as is. Everything else is held at
    /// or below [`LifecycleStage::CAPPED`].
    #[must_use]
    pub fn stage_for(&self, stage: LifecycleStage) -> LifecycleStage {
        if self.level == 0 && self.visible {
            stage
        } else {
            stage.capped()
        }
    }

    /// Returns whether two entries would drive their node to the same stage.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.level == other.level && self.visible == other.visible
    }
}

/// The ordered result of one assignment pass.
///
/// Entries are grouped by level in ascending order. Within a level, a node
/// discovered later is placed ahead of those discovered earlier.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelList {
    entries: Vec<LevelEntry>,
    level_count: u32,
}

impl LevelList {
    /// Returns the entries in list order.
    #[must_use]
    pub fn entries(&self) -> &[LevelEntry] {
        &self.entries
    }

    /// Returns an iterator over the entries.
    pub fn iter(&self) -> core::slice::Iter<'_, LevelEntry> {
        self.entries.iter()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the list has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of distinct levels.
    #[must_use]
    pub fn level_count(&self) -> u32 {
        self.level_count
    }

    /// Returns the level assigned to `node`, if it is in the list.
    #[must_use]
    pub fn level_of(&self, node: NodeId) -> Option<u32> {
        self.entry(node).map(|e| e.level)
    }

    /// Returns the entry for `node`, if any.
    #[must_use]
    pub fn entry(&self, node: NodeId) -> Option<&LevelEntry> {
        self.entries.iter().find(|e| e.node == node)
    }

    /// Drops `node`'s entry so the next diff does not report it as removed.
    pub(crate) fn forget(&mut self, node: NodeId) {
        self.entries.retain(|e| e.node != node);
    }
}

impl<'a> IntoIterator for &'a LevelList {
    type Item = &'a LevelEntry;
    type IntoIter = core::slice::Iter<'a, LevelEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Assigns occlusion levels to z-ordered nodes.
///
/// Holds its per-level regions between passes so repeated assignment does
/// not reallocate.
#[derive(Clone, Debug, Default)]
pub struct LevelAssigner {
    levels: Vec<Region>,
}

impl LevelAssigner {
    /// Creates an assigner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns levels to `nodes`, given front-to-back.
    ///
    /// # Panics
    ///
    /// Panics if the same node appears twice.
    pub fn assign(&mut self, nodes: impl IntoIterator<Item = LevelInput>) -> LevelList {
        for region in &mut self.levels {
            region.clear();
        }
        let mut level_count = 0_usize;
        let mut entries: Vec<LevelEntry> = Vec::new();

        for input in nodes {
            assert!(
                entries.iter().all(|e| e.node != input.node),
                "node {:?} appears twice in one level pass",
                input.node
            );
            let rect = if input.visible { input.rect } else { Rect::ZERO };

            // Deepest level that already covers the node, scanning back to front.
            let level = (0..level_count)
                .rev()
                .find(|&l| self.levels[l].contains_rect(rect))
                .map_or(0, |l| l + 1);

            let entry = LevelEntry {
                node: input.node,
                level: level_u32(level),
                visible: input.visible,
            };

            if level == level_count {
                if self.levels.len() == level_count {
                    self.levels.push(Region::new());
                }
                self.levels[level].union_with(rect);
                level_count += 1;
                entries.push(entry);
            } else {
                self.levels[level].union_with(rect);
                let at = entries
                    .iter()
                    .position(|e| e.level == entry.level)
                    .unwrap_or(entries.len());
                entries.insert(at, entry);
            }
        }

        LevelList {
            entries,
            level_count: level_u32(level_count),
        }
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "a container never has more than u32::MAX children"
)]
fn level_u32(level: usize) -> u32 {
    level as u32
}
