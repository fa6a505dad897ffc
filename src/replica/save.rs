// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Flowplan-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Flowplan and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Debounced save scheduling for the replica.
//!
//! Every local edit while dirty pushes one save deadline out to the full
//! delay, so the save fires only after a quiet window. The scheduler is pure
//! deadline arithmetic; the caller owns the clock and, when a deadline is
//! taken, serializes the replica via `to_document`, PUTs it, and calls
//! `mark_saved` on success.

use std::time::{Duration, Instant};

/// Quiet window between the last edit and the save it triggers.
pub const SAVE_DEBOUNCE: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct SaveScheduler {
    delay: Duration,
    deadline: Option<Instant>,
}

impl SaveScheduler {
    pub fn new() -> Self {
        Self::with_delay(SAVE_DEBOUNCE)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// True while a save is scheduled and not yet taken or cancelled.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Records an edit: the pending deadline (if any) is replaced, never
    /// stacked, so a burst of edits yields one save after the burst ends.
    pub fn note_edit_at(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn note_edit(&mut self) {
        self.note_edit_at(Instant::now());
    }

    /// Time left until the pending save is due. `None` when nothing is
    /// scheduled, zero once the deadline has passed.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Consumes the deadline once it has elapsed. Returns false while the
    /// window is still open or nothing is scheduled. A save that then fails
    /// is re-armed by the caller with [`note_edit_at`](Self::note_edit_at);
    /// the replica stays dirty either way until `mark_saved`.
    pub fn take_due_at(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn take_due(&mut self) -> bool {
        self.take_due_at(Instant::now())
    }

    /// Drops any pending save. Used when an authoritative push replaces local
    /// state: there is nothing dirty left worth writing back.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

impl Default for SaveScheduler {
    fn default() -> Self {
        Self::new()
    }
}
