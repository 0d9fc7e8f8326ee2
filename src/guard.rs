//! Mutual exclusion for a single submit control.
//!
//! One logical submit gesture must yield at most one in-flight request, and
//! re-submitting identical text within a short window is treated as an
//! accidental double submit. Every response path through the app releases
//! the guard before branching, so a failed request can never leave the
//! control stuck disabled.

use serde::{Deserialize, Serialize};

use crate::{UnixTimeMs, DUPLICATE_SUBMIT_WINDOW_MS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitRejection {
    /// A request from this control is still outstanding.
    InFlight,
    /// Same payload re-submitted within the duplicate window.
    DuplicateWithinWindow { elapsed_ms: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionGuard {
    in_flight: bool,
    last_payload: Option<String>,
    last_accepted_at: Option<UnixTimeMs>,
    window_ms: u64,
}

impl SubmissionGuard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            in_flight: false,
            last_payload: None,
            last_accepted_at: None,
            window_ms: DUPLICATE_SUBMIT_WINDOW_MS,
        }
    }

    #[must_use]
    pub fn with_window_ms(mut self, window_ms: u64) -> Self {
        self.window_ms = window_ms;
        self
    }

    #[must_use]
    pub const fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Accept or reject a submit gesture. On acceptance the guard records
    /// the payload and timestamp and marks the control in flight; the
    /// caller must pair this with [`release`](Self::release) when the
    /// request completes, on every path.
    pub fn try_acquire(
        &mut self,
        payload: &str,
        now: UnixTimeMs,
    ) -> Result<(), SubmitRejection> {
        if self.in_flight {
            return Err(SubmitRejection::InFlight);
        }

        if let (Some(last), Some(at)) = (self.last_payload.as_deref(), self.last_accepted_at) {
            let elapsed_ms = now.elapsed_since(at);
            if last == payload && elapsed_ms < self.window_ms {
                return Err(SubmitRejection::DuplicateWithinWindow { elapsed_ms });
            }
        }

        self.in_flight = true;
        self.last_payload = Some(payload.to_owned());
        self.last_accepted_at = Some(now);
        Ok(())
    }

    /// Clear the in-flight flag. The duplicate-window memory is kept, so an
    /// immediate identical re-submit after success is still rejected.
    pub fn release(&mut self) {
        self.in_flight = false;
    }

    /// Clear the in-flight flag and the duplicate-window memory. Used after
    /// transport or HTTP failures so the user can retry the same text
    /// without waiting out the window.
    pub fn release_and_forget(&mut self) {
        self.in_flight = false;
        self.last_payload = None;
        self.last_accepted_at = None;
    }
}

impl Default for SubmissionGuard {
    fn default() -> Self {
        Self::new()
    }
}
