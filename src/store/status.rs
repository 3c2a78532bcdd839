//! Transient status line
//!
//! Every operation leaves a short message for the kiosk screen. A message
//! stays visible for a few seconds and is then cleared by the housekeeping
//! tick.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Outcome a pulse reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PulseKind {
    Success,
    Failure,
}

/// One status message with its visibility window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusPulse {
    pub message: String,
    pub kind: PulseKind,
    pub shown_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl StatusPulse {
    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Holds the latest pulse
#[derive(Debug, Clone)]
pub struct StatusBoard {
    ttl: Duration,
    current: Option<StatusPulse>,
}

impl StatusBoard {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, current: None }
    }

    /// Replace the current message
    pub fn pulse(
        &mut self,
        message: impl Into<String>,
        kind: PulseKind,
        now: DateTime<Utc>,
    ) -> StatusPulse {
        let pulse = StatusPulse {
            message: message.into(),
            kind,
            shown_at: now,
            expires_at: now
                .checked_add_signed(self.ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        self.current = Some(pulse.clone());
        pulse
    }

    /// Visible message, if any
    pub fn current(&self, now: DateTime<Utc>) -> Option<&StatusPulse> {
        self.current.as_ref().filter(|p| p.is_visible(now))
    }

    /// Drop an expired message; true when something was cleared
    pub fn expire(&mut self, now: DateTime<Utc>) -> bool {
        if self.current.as_ref().is_some_and(|p| !p.is_visible(now)) {
            self.current = None;
            true
        } else {
            false
        }
    }
}
