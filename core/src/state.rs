//! # Shared Completion State
//!
//! The words shared between the completion interrupt and task code.
//!
//! ## Access Rules
//!
//! | Field               | ISR                     | Task                          |
//! |---------------------|-------------------------|-------------------------------|
//! | `pending`           | set (`signal_from_isr`) | read; cleared by `submit`     |
//! | `status`            | OR-in                   | read-and-clear by `wait`      |
//! | `current_context`   | never                   | written by `submit`, read     |
//!
//! Every field is a single naturally-aligned atomic word, so no access
//! needs interrupts masked. The ISR writes `status` before publishing
//! `pending` with `Release`; a task that observes `pending` with `Acquire`
//! therefore sees every status bit that came with it.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use static_assertions::assert_impl_all;
use vgsync_hal::InterruptStatus;

use crate::types::ContextId;

// =============================================================================
// COMPLETION STATE
// =============================================================================

/// Completion flag and accumulated interrupt status
#[derive(Debug)]
pub struct CompletionState {
    /// Device finished (or reported status) since the last submission
    pending: AtomicBool,
    /// OR of every raw status word since the last consumer read
    status: AtomicU32,
}

impl CompletionState {
    /// Initial state: device idle, ready for the first submission
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(true),
            status: AtomicU32::new(0),
        }
    }

    // -------------------------------------------------------------------------
    // ISR side
    // -------------------------------------------------------------------------

    /// Record a raw status word from the completion interrupt.
    ///
    /// Returns `false` for a zero (spurious) status, which changes nothing.
    #[inline]
    pub fn signal_from_isr(&self, status: InterruptStatus) -> bool {
        if !status.has_pending() {
            return false;
        }
        self.status.fetch_or(status.bits(), Ordering::AcqRel);
        self.pending.store(true, Ordering::Release);
        true
    }

    // -------------------------------------------------------------------------
    // Task side
    // -------------------------------------------------------------------------

    /// Check whether the last submission has completed
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Mark a new command as outstanding
    #[inline]
    pub fn begin_submission(&self) {
        self.pending.store(false, Ordering::Release);
    }

    /// Read and clear the accumulated status
    #[inline]
    pub fn take_status(&self) -> InterruptStatus {
        InterruptStatus::from_raw(self.status.swap(0, Ordering::AcqRel))
    }

    /// Read the accumulated status without clearing it
    #[inline]
    pub fn peek_status(&self) -> InterruptStatus {
        InterruptStatus::from_raw(self.status.load(Ordering::Acquire))
    }

    /// Drop the idle state on shutdown; nothing can be submitted after this
    pub(crate) fn retire(&self) {
        self.pending.store(false, Ordering::Release);
    }
}

impl Default for CompletionState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// CONTEXT TRACKER
// =============================================================================

/// Context of the outstanding (or most recent) submission
#[derive(Debug)]
pub struct ContextTracker {
    current: AtomicU32,
}

impl ContextTracker {
    /// Nothing submitted yet
    pub const fn new() -> Self {
        Self {
            current: AtomicU32::new(ContextId::NONE.raw()),
        }
    }

    /// Record the submitting context; the last submitter wins
    #[inline]
    pub fn record(&self, context: ContextId) {
        self.current.store(context.raw(), Ordering::Release);
    }

    /// Context of the most recent submission
    #[inline]
    pub fn current(&self) -> ContextId {
        ContextId::new(self.current.load(Ordering::Acquire))
    }

    /// True iff a command from a different, previously recorded context
    /// is or was outstanding
    #[inline]
    pub fn changed(&self, candidate: ContextId) -> bool {
        let current = self.current();
        !current.is_none() && current != candidate
    }
}

impl Default for ContextTracker {
    fn default() -> Self {
        Self::new()
    }
}

assert_impl_all!(CompletionState: Send, Sync);
assert_impl_all!(ContextTracker: Send, Sync);
