//! Long-press timer and multi-tap window.
//!
//! Timers are deadlines rather than scheduled callbacks. Every arm draws a
//! fresh epoch, and a fire is honoured only when its token matches the
//! currently armed timer, so a callback scheduled for a canceled or re-armed
//! timer is a no-op.

use log::debug;

use crate::{
    event::{GestureDetail, TapDetail},
    types::Point,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
    LongPress,
    TapWindow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerToken {
    pub kind: TimerKind,
    pub epoch: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingTimer {
    pub token: TimerToken,
    pub deadline_ms: u64,
}

pub struct TimingDisambiguator {
    long_press_delay_ms: u64,
    multi_tap_window_ms: u64,
    next_epoch: u64,
    long_press: Option<PendingTimer>,
    tap_window: Option<PendingTimer>,
    tap_count: u32,
    last_tap_ms: Option<u64>,
    pending_tap: Option<TapDetail>,
}

impl TimingDisambiguator {
    pub fn new(long_press_delay_ms: u64, multi_tap_window_ms: u64) -> Self {
        Self {
            long_press_delay_ms,
            multi_tap_window_ms,
            next_epoch: 1,
            long_press: None,
            tap_window: None,
            tap_count: 0,
            last_tap_ms: None,
            pending_tap: None,
        }
    }

    pub fn tap_count(&self) -> u32 {
        self.tap_count
    }

    pub fn last_tap_ms(&self) -> Option<u64> {
        self.last_tap_ms
    }

    pub fn long_press_scheduled(&self) -> bool {
        self.long_press.is_some()
    }

    pub fn has_pending_tap(&self) -> bool {
        self.pending_tap.is_some()
    }

    pub fn arm_long_press(&mut self, now_ms: u64) -> TimerToken {
        let timer = self.arm(TimerKind::LongPress, now_ms, self.long_press_delay_ms);
        self.long_press = Some(timer);
        timer.token
    }

    /// Returns whether a timer was outstanding.
    pub fn cancel_long_press(&mut self) -> bool {
        self.long_press.take().is_some()
    }

    /// Records a qualifying tap released at `now_ms`.
    ///
    /// The first tap of a sequence is held until the window elapses and
    /// `None` is returned. Later taps inside the window supersede it and are
    /// returned immediately as `doubletap`/`multitap`.
    pub fn register_tap(
        &mut self,
        now_ms: u64,
        position: Point,
        duration_ms: u64,
    ) -> Option<GestureDetail> {
        let in_window = self
            .last_tap_ms
            .is_some_and(|last| now_ms.saturating_sub(last) < self.multi_tap_window_ms);
        self.tap_count = if in_window && self.tap_count > 0 {
            self.tap_count.saturating_add(1)
        } else {
            1
        };
        self.last_tap_ms = Some(now_ms);

        let detail = TapDetail {
            tap_count: self.tap_count,
            position,
            duration_ms,
        };

        if self.tap_count == 1 {
            self.pending_tap = Some(detail);
            self.tap_window = Some(self.arm(TimerKind::TapWindow, now_ms, self.multi_tap_window_ms));
            return None;
        }

        if self.pending_tap.take().is_some() {
            debug!("gesture: provisional tap superseded count={}", self.tap_count);
        }
        self.tap_window = None;
        if self.tap_count == 2 {
            Some(GestureDetail::DoubleTap(detail))
        } else {
            Some(GestureDetail::MultiTap(detail))
        }
    }

    /// Emits the provisional tap early and closes the sequence.
    pub fn flush_pending_tap(&mut self) -> Option<TapDetail> {
        self.tap_window = None;
        self.tap_count = 0;
        self.last_tap_ms = None;
        self.pending_tap.take()
    }

    /// Consumes a fire. `false` means the token is stale and must be ignored.
    pub fn accept_fire(&mut self, token: TimerToken) -> bool {
        let slot = match token.kind {
            TimerKind::LongPress => &mut self.long_press,
            TimerKind::TapWindow => &mut self.tap_window,
        };
        if slot.as_ref().is_some_and(|timer| timer.token == token) {
            *slot = None;
            return true;
        }
        debug!(
            "gesture: stale {:?} timer epoch={} ignored",
            token.kind, token.epoch
        );
        false
    }

    /// Provisional tap released by an elapsed window.
    pub fn take_window_tap(&mut self) -> Option<TapDetail> {
        self.pending_tap.take()
    }

    /// Earliest timer due at or before `now_ms`.
    pub fn next_due(&self, now_ms: u64) -> Option<PendingTimer> {
        self.pending_timers()
            .into_iter()
            .filter(|timer| timer.deadline_ms <= now_ms)
            .min_by_key(|timer| (timer.deadline_ms, timer.token.epoch))
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.pending_timers()
            .into_iter()
            .map(|timer| timer.deadline_ms)
            .min()
    }

    pub fn pending_timers(&self) -> heapless::Vec<PendingTimer, 2> {
        let mut timers = heapless::Vec::new();
        for timer in [self.long_press, self.tap_window].into_iter().flatten() {
            let _ = timers.push(timer);
        }
        timers
    }

    /// Clears both timers and the tap sequence.
    pub fn cancel_all(&mut self) {
        self.long_press = None;
        self.tap_window = None;
        self.pending_tap = None;
        self.tap_count = 0;
        self.last_tap_ms = None;
    }

    fn arm(&mut self, kind: TimerKind, now_ms: u64, delay_ms: u64) -> PendingTimer {
        let epoch = self.next_epoch;
        self.next_epoch = self.next_epoch.wrapping_add(1);
        PendingTimer {
            token: TimerToken { kind, epoch },
            deadline_ms: now_ms.saturating_add(delay_ms),
        }
    }
}
