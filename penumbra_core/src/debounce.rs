// Copyright 2026 the Penumbra Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coalescing of layout-change bursts.
//!
//! Every notification cancels the pending recomputation and schedules a new
//! one `delay` later, so only the last notification of a burst (an animated
//! transition, a batch of child insertions) leads to work. The host's task
//! queue is modelled as a deadline that the owner polls with the current
//! [`HostTime`]; nothing runs until [`Debouncer::poll`] observes that the
//! deadline has passed.
//!
//! The delay is sized from display timing, once per dispatcher:
//!
//! ```text
//! delay = max(1000 / refresh_rate_hz, animation_frame_delay_ms) * 2
//! ```

use crate::time::{Duration, HostTime, Timebase};

/// Display timing consulted when sizing the coalescing delay.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTiming {
    /// Display refresh rate in hertz.
    pub refresh_rate_hz: f32,
    /// The host animation system's frame delay in milliseconds.
    pub animation_frame_delay_ms: f32,
}

impl FrameTiming {
    /// A 60 Hz display with a 10 ms animation frame delay.
    pub const DEFAULT: Self = Self {
        refresh_rate_hz: 60.0,
        animation_frame_delay_ms: 10.0,
    };
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Returns the coalescing delay for `timing`, in `timebase` ticks.
///
/// A non-positive or non-finite refresh rate is ignored and only the
/// animation frame delay counts.
#[must_use]
pub fn coalescing_delay(timing: FrameTiming, timebase: Timebase) -> Duration {
    let refresh_ms = if timing.refresh_rate_hz.is_finite() && timing.refresh_rate_hz > 0.0 {
        1000.0 / f64::from(timing.refresh_rate_hz)
    } else {
        0.0
    };
    let frame_ms = refresh_ms.max(f64::from(timing.animation_frame_delay_ms));
    let nanos = frame_ms * 2.0 * 1_000_000.0;
    #[expect(
        clippy::cast_possible_truncation,
        reason = "sub-nanosecond precision is irrelevant for a debounce window"
    )]
    let nanos = if nanos.is_finite() && nanos > 0.0 {
        nanos as u64
    } else {
        0
    };
    Duration::from_nanos(nanos, timebase)
}

/// A cancel-and-reschedule timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<HostTime>,
}

impl Debouncer {
    /// Creates an idle debouncer.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Returns the configured delay.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Returns the time the pending callback fires, if one is scheduled.
    #[must_use]
    pub const fn deadline(&self) -> Option<HostTime> {
        self.deadline
    }

    /// Returns whether a callback is scheduled.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Cancels any pending callback and schedules a new one `delay` after
    /// `now`.
    pub fn notify(&mut self, now: HostTime) {
        self.deadline = Some(now.saturating_add(self.delay));
    }

    /// Cancels any pending callback.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Returns `true` exactly once when the pending callback is due.
    pub fn poll(&mut self, now: HostTime) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_uses_the_slower_of_refresh_and_animation() {
        let ms = |d: Duration| d.to_nanos(Timebase::NANOS) / 1_000_000;
        let sixty = FrameTiming {
            refresh_rate_hz: 60.0,
            animation_frame_delay_ms: 10.0,
        };
        // 16.67 ms frame beats the 10 ms animation delay.
        assert_eq!(ms(coalescing_delay(sixty, Timebase::NANOS)), 33);

        let fast = FrameTiming {
            refresh_rate_hz: 120.0,
            animation_frame_delay_ms: 10.0,
        };
        assert_eq!(ms(coalescing_delay(fast, Timebase::NANOS)), 20);

        let unknown = FrameTiming {
            refresh_rate_hz: 0.0,
            animation_frame_delay_ms: 10.0,
        };
        assert_eq!(ms(coalescing_delay(unknown, Timebase::NANOS)), 20);
    }

    #[test]
    fn burst_fires_once_after_last_notification() {
        let mut d = Debouncer::new(Duration(100));
        let mut fired = 0;
        for t in [0, 10, 20, 30, 40] {
            d.notify(HostTime(t));
            if d.poll(HostTime(t + 5)) {
                fired += 1;
            }
        }
        assert_eq!(fired, 0, "nothing due during the burst");
        assert_eq!(d.deadline(), Some(HostTime(140)));
        assert!(!d.poll(HostTime(139)), "not yet");
        assert!(d.poll(HostTime(140)), "due");
        assert!(!d.poll(HostTime(500)), "fires only once");
    }

    #[test]
    fn cancel_discards_pending_callback() {
        let mut d = Debouncer::new(Duration(10));
        d.notify(HostTime(0));
        assert!(d.is_pending());
        d.cancel();
        assert!(!d.poll(HostTime(1_000)), "cancelled");
    }
}
