//! # Registration Window
//!
//! [`WindowPolicy`] is the single source of truth for "is registration still
//! accepted". It is a small state machine driven by explicit `now` values,
//! which keeps it deterministic under test.
//!
//! ```text
//!            deadline, size == 0
//!   Open ──────────────────────────▶ ClosedEmpty
//!    │ deadline, 0 < size < min
//!    ├──────────────────────────▶ Extended ──deadline──▶ ClosedWithParticipants
//!    │ deadline, size >= min                                  ▲
//!    └────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use raffle_common::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Open,
    Extended,
    ClosedEmpty,
    ClosedWithParticipants,
}

impl WindowState {
    pub fn is_closed(self) -> bool {
        matches!(self, Self::ClosedEmpty | Self::ClosedWithParticipants)
    }
}

/// What a single [`WindowPolicy::evaluate`] call changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged(WindowState),
    Extended { deadline: Instant },
    Closed(WindowState),
}

#[derive(Debug)]
struct Inner {
    state: WindowState,
    deadline: Instant,
    /// Sticky: once set it is never cleared.
    extended: bool,
}

#[derive(Debug)]
pub struct WindowPolicy {
    inner: Mutex<Inner>,
    extension_period: Duration,
    min_participants: usize,
}

impl WindowPolicy {
    pub fn new(
        start: Instant,
        registration_period: Duration,
        extension_period: Duration,
        min_participants: usize,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: WindowState::Open,
                deadline: start + registration_period,
                extended: false,
            }),
            extension_period,
            min_participants,
        }
    }

    pub fn from_config(start: Instant, cfg: &Config) -> Self {
        Self::new(
            start,
            cfg.registration_period,
            cfg.extension_period,
            cfg.min_participants,
        )
    }

    /// Applies the transition rules for the current time and registry size.
    pub fn evaluate(&self, now: Instant, size: usize) -> Transition {
        let mut inner = self.inner.lock();

        if inner.state.is_closed() || now < inner.deadline {
            return Transition::Unchanged(inner.state);
        }

        match inner.state {
            WindowState::Open if size == 0 => {
                inner.state = WindowState::ClosedEmpty;
                Transition::Closed(inner.state)
            }
            WindowState::Open if size < self.min_participants && !inner.extended => {
                inner.extended = true;
                inner.state = WindowState::Extended;
                inner.deadline = now + self.extension_period;
                Transition::Extended {
                    deadline: inner.deadline,
                }
            }
            _ => {
                inner.state = WindowState::ClosedWithParticipants;
                Transition::Closed(inner.state)
            }
        }
    }

    pub fn state(&self) -> WindowState {
        self.inner.lock().state
    }

    pub fn deadline(&self) -> Instant {
        self.inner.lock().deadline
    }

    pub fn was_extended(&self) -> bool {
        self.inner.lock().extended
    }

    pub fn is_accepting(&self) -> bool {
        !self.state().is_closed()
    }

    /// Time left until the current deadline, zero once closed or overdue.
    pub fn remaining(&self, now: Instant) -> Duration {
        let inner = self.inner.lock();
        if inner.state.is_closed() {
            return Duration::ZERO;
        }
        inner.deadline.saturating_duration_since(now)
    }
}
