// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Exact unions of axis-aligned rectangles.
//!
//! A [`Region`] stores its footprint as a list of pairwise-disjoint,
//! non-empty [`Rect`]s. Unioning a rectangle appends only the pieces of it
//! that are not already covered, so the region always represents the exact
//! point set of everything unioned into it. There is no rasterization and no
//! bounding-box approximation.
//!
//! Empty rectangles (zero or negative width or height) never change a region
//! and are never reported as contained. Occlusion level assignment relies on
//! the latter: a degenerate node must not look fully covered just because
//! unioning it is a no-op.

use alloc::vec;
use alloc::vec::Vec;

use kurbo::Rect;

/// A mutable, exact union of axis-aligned rectangles.
#[derive(Clone, Debug, Default)]
pub struct Region {
    rects: Vec<Rect>,
}

impl Region {
    /// Creates an empty region.
    #[must_use]
    pub const fn new() -> Self {
        Self { rects: Vec::new() }
    }

    /// Creates a region covering exactly `rect`.
    #[must_use]
    pub fn from_rect(rect: Rect) -> Self {
        let mut region = Self::new();
        region.union_with(rect);
        region
    }

    /// Returns whether the region covers no area.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Returns the disjoint rectangles making up the region.
    #[must_use]
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Returns the covered area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.rects.iter().map(Rect::area).sum()
    }

    /// Returns the smallest rectangle enclosing the region, if any.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        self.rects.iter().copied().reduce(|a, b| a.union(b))
    }

    /// Adds `rect` to the region.
    ///
    /// Returns `true` if the covered point set grew, `false` if `rect` was
    /// empty or already fully covered.
    pub fn union_with(&mut self, rect: Rect) -> bool {
        if is_empty_rect(rect) {
            return false;
        }
        let uncovered = subtract_all(rect, &self.rects);
        if uncovered.is_empty() {
            return false;
        }
        self.rects.extend(uncovered);
        true
    }

    /// Returns whether `rect` is non-empty and lies entirely inside the
    /// region.
    #[must_use]
    pub fn contains_rect(&self, rect: Rect) -> bool {
        !is_empty_rect(rect) && subtract_all(rect, &self.rects).is_empty()
    }

    /// Removes all rectangles.
    pub fn clear(&mut self) {
        self.rects.clear();
    }
}

impl PartialEq for Region {
    /// Point-set equality, independent of how each side was decomposed.
    fn eq(&self, other: &Self) -> bool {
        self.rects.iter().all(|r| other.contains_rect(*r))
            && other.rects.iter().all(|r| self.contains_rect(*r))
    }
}

/// Returns whether `rect` covers no area.
pub(crate) fn is_empty_rect(rect: Rect) -> bool {
    !(rect.x1 > rect.x0 && rect.y1 > rect.y0)
}

/// Returns the parts of `rect` not covered by any of `cover`.
fn subtract_all(rect: Rect, cover: &[Rect]) -> Vec<Rect> {
    let mut pieces = vec![rect];
    for c in cover {
        if pieces.is_empty() {
            break;
        }
        let mut next = Vec::with_capacity(pieces.len());
        for piece in pieces {
            subtract(piece, *c, &mut next);
        }
        pieces = next;
    }
    pieces
}

/// Pushes the (at most four) pieces of `a` outside `b` onto `out`.
fn subtract(a: Rect, b: Rect, out: &mut Vec<Rect>) {
    let i = a.intersect(b);
    if is_empty_rect(i) {
        out.push(a);
        return;
    }
    // Full-width bands above and below, then the side slivers of the middle band.
    if i.y0 > a.y0 {
        out.push(Rect::new(a.x0, a.y0, a.x1, i.y0));
    }
    if a.y1 > i.y1 {
        out.push(Rect::new(a.x0, i.y1, a.x1, a.y1));
    }
    if i.x0 > a.x0 {
        out.push(Rect::new(a.x0, i.y0, i.x0, i.y1));
    }
    if a.x1 > i.x1 {
        out.push(Rect::new(i.x1, i.y0, a.x1, i.y1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_of_overlapping_rects_is_exact() {
        let mut region = Region::new();
        assert!(region.union_with(Rect::new(0.0, 0.0, 10.0, 10.0)), "grows");
        assert!(region.union_with(Rect::new(5.0, 5.0, 15.0, 15.0)), "grows");
        assert_eq!(region.area(), 175.0, "overlap counted once");
        assert_eq!(region.bounds(), Some(Rect::new(0.0, 0.0, 15.0, 15.0)));
    }

    #[test]
    fn covered_rect_leaves_region_unchanged() {
        let mut region = Region::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        let before = region.clone();
        assert!(
            !region.union_with(Rect::new(2.0, 2.0, 8.0, 8.0)),
            "inner rect is already covered"
        );
        assert_eq!(region, before, "point set unchanged");
    }

    #[test]
    fn containment_across_several_rects() {
        let mut region = Region::new();
        region.union_with(Rect::new(0.0, 0.0, 10.0, 10.0));
        region.union_with(Rect::new(10.0, 0.0, 20.0, 10.0));
        assert!(
            region.contains_rect(Rect::new(5.0, 2.0, 15.0, 8.0)),
            "straddles both halves"
        );
        assert!(
            !region.contains_rect(Rect::new(5.0, 2.0, 25.0, 8.0)),
            "sticks out on the right"
        );
    }

    #[test]
    fn empty_rect_is_never_contained() {
        let region = Region::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(!region.contains_rect(Rect::new(3.0, 3.0, 3.0, 3.0)));
        assert!(!Region::new().contains_rect(Rect::ZERO));

        let mut empty = Region::new();
        assert!(!empty.union_with(Rect::new(1.0, 1.0, 1.0, 5.0)), "zero width");
        assert!(empty.is_empty(), "nothing recorded");
    }

    #[test]
    fn equality_ignores_decomposition() {
        let mut a = Region::new();
        a.union_with(Rect::new(0.0, 0.0, 10.0, 5.0));
        a.union_with(Rect::new(0.0, 5.0, 10.0, 10.0));
        let b = Region::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(a, b, "two halves equal the whole");
        assert_ne!(a, Region::new(), "non-empty differs from empty");
        assert_eq!(Region::new(), Region::new(), "empty regions are equal");
    }

    #[test]
    fn stored_rects_are_disjoint() {
        let mut region = Region::new();
        region.union_with(Rect::new(0.0, 0.0, 10.0, 10.0));
        region.union_with(Rect::new(-5.0, 4.0, 20.0, 6.0));
        region.union_with(Rect::new(4.0, -5.0, 6.0, 20.0));
        let rects = region.rects();
        for (i, a) in rects.iter().enumerate() {
            for b in &rects[i + 1..] {
                assert!(
                    is_empty_rect(a.intersect(*b)),
                    "{a:?} overlaps {b:?}"
                );
            }
        }
        // Each band adds 2 * (5 + 10) outside the square.
        assert_eq!(region.area(), 160.0, "bands outside the square only");
    }
}
