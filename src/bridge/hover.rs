//! Hover tracking and the token-based debounce.
//!
//! Every change of hover target allocates a fresh token. The host schedules a
//! timer carrying that token; when it fires, only the token still pending is
//! honored, so a stale timer is a no-op even if the host failed to cancel it.

#![allow(missing_docs)]

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingHover {
    pub token: u64,
    pub target_index: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HoverState {
    hovered_event_id: Option<String>,
    pending: Option<PendingHover>,
    next_token: u64,
    /// A detail overlay was drawn and no full render has cleared it yet.
    detail_shown: bool,
}

impl HoverState {
    #[must_use]
    pub fn hovered_event_id(&self) -> Option<&str> {
        self.hovered_event_id.as_deref()
    }

    #[must_use]
    pub const fn pending(&self) -> Option<PendingHover> {
        self.pending
    }

    #[must_use]
    pub const fn detail_shown(&self) -> bool {
        self.detail_shown
    }

    /// Point at a new target and return the token to schedule.
    ///
    /// Any previously pending token is dropped. The caller owes a full render
    /// if a detail was on screen, so the flag is cleared here.
    pub fn retarget(&mut self, event_id: &str, index: usize) -> u64 {
        self.detail_shown = false;
        self.next_token = self.next_token.wrapping_add(1);
        let token = self.next_token;
        self.hovered_event_id = Some(event_id.to_string());
        self.pending = Some(PendingHover {
            token,
            target_index: index,
        });
        token
    }

    /// Drop the pending task, if any. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Consume a timer firing. Returns the target index when `token` is the
    /// one currently pending.
    pub fn accept_fire(&mut self, token: u64) -> Option<usize> {
        match self.pending {
            Some(pending) if pending.token == token => {
                self.pending = None;
                self.detail_shown = true;
                Some(pending.target_index)
            }
            _ => None,
        }
    }

    /// Forget the hovered target and any pending task.
    pub fn reset(&mut self) -> bool {
        self.hovered_event_id = None;
        self.detail_shown = false;
        self.cancel()
    }
}

/// Host-side single timer slot for the hover debounce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerSlot {
    armed: Option<(u64, Instant)>,
}

impl TimerSlot {
    /// (Re)arm for `token`, replacing whatever was armed.
    pub fn arm(&mut self, token: u64, after: Duration, now: Instant) {
        self.armed = Some((token, now + after));
    }

    pub fn clear(&mut self) {
        self.armed = None;
    }

    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Token whose deadline has passed, disarming the slot.
    pub fn take_due(&mut self, now: Instant) -> Option<u64> {
        match self.armed {
            Some((token, deadline)) if deadline <= now => {
                self.armed = None;
                Some(token)
            }
            _ => None,
        }
    }

    /// How long the host may block waiting for input.
    #[must_use]
    pub fn timeout(&self, now: Instant, max: Duration) -> Duration {
        self.armed.map_or(max, |(_, deadline)| {
            deadline.saturating_duration_since(now).min(max)
        })
    }
}
