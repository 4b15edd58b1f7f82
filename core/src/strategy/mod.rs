//! # Wait Strategies
//!
//! How task code blocks until the completion interrupt has fired.
//!
//! A target binary needs exactly one strategy, so it is a type parameter of
//! [`CommandSync`](crate::CommandSync) rather than a runtime switch:
//!
//! - [`BusyWait`]: no scheduler. Spins on the completion flag; timeouts are
//!   accepted and ignored. Relies on the ISR running to completion with
//!   respect to the spinning code (single core, interrupt has priority).
//! - [`Blocking`]: preemptive scheduler. Sleeps on a binary signal that the
//!   ISR releases; timeouts are honored at tick granularity.
//!
//! In both, the completion flag in [`CompletionState`] is authoritative and
//! the wake primitive is only a hint, so an interrupt that fires before
//! anyone waits is never lost.

use core::time::Duration;

use crate::state::CompletionState;
use crate::types::WaitTimeout;

pub mod blocking;
pub mod busy;

pub use blocking::{Blocking, Scheduler, SchedulerGuard};
pub use busy::{BusyWait, Delay, SpinDelay};

// =============================================================================
// WAIT OUTCOME
// =============================================================================

/// Result of blocking on the completion flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The completion flag is set
    Completed,
    /// The timeout elapsed first
    TimedOut,
}

// =============================================================================
// WAIT STRATEGY TRAIT
// =============================================================================

/// Blocking primitive behind `submit` and `wait`
pub trait WaitStrategy: Send + Sync {
    /// Held while a task owns the command stream; releases on drop
    type StreamGuard<'a>
    where
        Self: 'a;

    /// Strategy name, for logs
    fn name(&self) -> &'static str;

    /// Block until `state` reports completion or `timeout` elapses.
    ///
    /// Must return [`WaitOutcome::Completed`] without blocking when the flag
    /// is already set.
    fn block_until_complete(&self, state: &CompletionState, timeout: WaitTimeout) -> WaitOutcome;

    /// Wake one blocked waiter. Called from interrupt context after the
    /// completion flag has been published.
    fn release_from_isr(&self);

    /// Suspend the calling task for at least `duration`
    fn sleep(&self, duration: Duration);

    /// Take exclusive ownership of the command stream, waiting the way this
    /// strategy waits for completion
    fn lock_stream(&self) -> Self::StreamGuard<'_>;
}
