//! Blocking strategy for targets with a preemptive scheduler.

use core::time::Duration;

use crate::error::{Error, Result};
use crate::state::CompletionState;
use crate::strategy::{WaitOutcome, WaitStrategy};
use crate::types::{duration_to_ticks, WaitTimeout};

// =============================================================================
// SCHEDULER PORT
// =============================================================================

/// Scheduler primitives consumed by [`Blocking`].
///
/// A port maps these onto its RTOS: a binary semaphore for `Signal`, a
/// take-with-timeout for [`acquire`](Scheduler::acquire), a give-from-ISR
/// for [`release_from_isr`](Scheduler::release_from_isr), a blocking mutex
/// for `Mutex`, and so on.
pub trait Scheduler: Send + Sync {
    /// Binary, non-counting wake signal
    type Signal: Send + Sync;

    /// Task mutex; a contended lock suspends the caller
    type Mutex: Send + Sync;

    /// Scheduler tick frequency
    fn tick_rate_hz(&self) -> u32;

    /// Ticks since the scheduler started
    fn tick_count(&self) -> u64;

    /// Create a signal in the "not given" state
    fn create_signal(&self) -> Option<Self::Signal>;

    /// Destroy a signal created by [`create_signal`](Scheduler::create_signal)
    fn destroy_signal(&self, signal: Self::Signal);

    /// Take the signal, blocking for at most `ticks` (`None`: forever).
    /// Returns `false` on timeout.
    fn acquire(&self, signal: &Self::Signal, ticks: Option<u64>) -> bool;

    /// Give the signal from interrupt context. Returns `true` if this woke
    /// a task of higher priority than the interrupted one.
    fn release_from_isr(&self, signal: &Self::Signal) -> bool;

    /// Request a context switch on interrupt exit
    fn yield_from_isr(&self);

    /// Suspend the calling task for `ticks`
    fn delay_ticks(&self, ticks: u64);

    /// Create an unlocked mutex
    fn create_mutex(&self) -> Option<Self::Mutex>;

    /// Destroy a mutex created by [`create_mutex`](Scheduler::create_mutex)
    fn destroy_mutex(&self, mutex: Self::Mutex);

    /// Lock, suspending the calling task while another task holds it
    fn lock_mutex(&self, mutex: &Self::Mutex);

    /// Unlock a mutex held by the calling task
    fn unlock_mutex(&self, mutex: &Self::Mutex);
}

// =============================================================================
// BLOCKING
// =============================================================================

/// Sleep on a scheduler signal released by the completion interrupt
#[derive(Debug)]
pub struct Blocking<S: Scheduler> {
    scheduler: S,
    /// Always `Some` until drop
    signal: Option<S::Signal>,
    /// Always `Some` until drop
    stream: Option<S::Mutex>,
}

impl<S: Scheduler> Blocking<S> {
    /// Create the strategy with its wake signal and stream mutex
    pub fn new(scheduler: S) -> Result<Self> {
        let signal = scheduler.create_signal().ok_or(Error::OutOfMemory)?;
        let Some(stream) = scheduler.create_mutex() else {
            scheduler.destroy_signal(signal);
            return Err(Error::OutOfMemory);
        };
        log::debug!(
            "vgsync: blocking strategy ready ({} Hz tick)",
            scheduler.tick_rate_hz()
        );
        Ok(Self {
            scheduler,
            signal: Some(signal),
            stream: Some(stream),
        })
    }

    /// The scheduler port
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Ticks for `duration` at this scheduler's rate, rounded up
    pub fn ticks_for(&self, duration: Duration) -> u64 {
        duration_to_ticks(duration, self.scheduler.tick_rate_hz())
    }
}

impl<S: Scheduler> WaitStrategy for Blocking<S> {
    type StreamGuard<'a>
        = SchedulerGuard<'a, S>
    where
        Self: 'a;

    fn name(&self) -> &'static str {
        "blocking"
    }

    fn block_until_complete(&self, state: &CompletionState, timeout: WaitTimeout) -> WaitOutcome {
        if state.is_pending() {
            return WaitOutcome::Completed;
        }
        let Some(signal) = self.signal.as_ref() else {
            return WaitOutcome::TimedOut;
        };

        let budget = timeout.to_ticks(self.scheduler.tick_rate_hz());
        let start = self.scheduler.tick_count();
        let mut remaining = budget;

        loop {
            if remaining == Some(0) {
                return WaitOutcome::TimedOut;
            }

            let woken = self.scheduler.acquire(signal, remaining);
            if state.is_pending() {
                return WaitOutcome::Completed;
            }
            if !woken {
                return WaitOutcome::TimedOut;
            }

            // Stale give from an interrupt that was already accounted for:
            // keep waiting against the same deadline. The tick count is
            // floored at both ends, so one extra tick keeps the wait from
            // ending early.
            let elapsed = self.scheduler.tick_count().saturating_sub(start);
            remaining = budget.map(|ticks| ticks.saturating_sub(elapsed).saturating_add(1));
        }
    }

    fn release_from_isr(&self) {
        if let Some(signal) = self.signal.as_ref() {
            if self.scheduler.release_from_isr(signal) {
                self.scheduler.yield_from_isr();
            }
        }
    }

    fn sleep(&self, duration: Duration) {
        self.scheduler.delay_ticks(self.ticks_for(duration));
    }

    fn lock_stream(&self) -> SchedulerGuard<'_, S> {
        let mutex = self.stream.as_ref();
        if let Some(mutex) = mutex {
            self.scheduler.lock_mutex(mutex);
        }
        SchedulerGuard {
            scheduler: &self.scheduler,
            mutex,
        }
    }
}

impl<S: Scheduler> Drop for Blocking<S> {
    fn drop(&mut self) {
        if let Some(signal) = self.signal.take() {
            self.scheduler.destroy_signal(signal);
        }
        if let Some(stream) = self.stream.take() {
            self.scheduler.destroy_mutex(stream);
        }
    }
}

/// Stream lock held through the scheduler's mutex
#[derive(Debug)]
pub struct SchedulerGuard<'a, S: Scheduler> {
    scheduler: &'a S,
    mutex: Option<&'a S::Mutex>,
}

impl<S: Scheduler> Drop for SchedulerGuard<'_, S> {
    fn drop(&mut self) {
        if let Some(mutex) = self.mutex {
            self.scheduler.unlock_mutex(mutex);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::hosted::HostScheduler;
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Instant;
    use vgsync_hal::InterruptStatus;

    fn strategy() -> Blocking<HostScheduler> {
        Blocking::new(HostScheduler::new(1000)).unwrap()
    }

    /// Hand-clocked scheduler: each acquire advances the tick count by one
    /// and succeeds while stale tokens remain
    #[derive(Default)]
    struct ScriptedScheduler {
        ticks: AtomicU64,
        stale_tokens: AtomicUsize,
        requested: Mutex<Vec<Option<u64>>>,
        no_mutex: AtomicBool,
        signals_destroyed: Arc<AtomicUsize>,
        locks: AtomicUsize,
        unlocks: AtomicUsize,
    }

    impl Scheduler for ScriptedScheduler {
        type Signal = ();
        type Mutex = ();

        fn tick_rate_hz(&self) -> u32 {
            1000
        }

        fn tick_count(&self) -> u64 {
            self.ticks.load(Ordering::SeqCst)
        }

        fn create_signal(&self) -> Option<()> {
            Some(())
        }

        fn destroy_signal(&self, _signal: ()) {
            self.signals_destroyed.fetch_add(1, Ordering::SeqCst);
        }

        fn acquire(&self, _signal: &(), ticks: Option<u64>) -> bool {
            self.requested.lock().unwrap().push(ticks);
            self.ticks.fetch_add(1, Ordering::SeqCst);
            self.stale_tokens
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        }

        fn release_from_isr(&self, _signal: &()) -> bool {
            true
        }

        fn yield_from_isr(&self) {}

        fn delay_ticks(&self, ticks: u64) {
            self.ticks.fetch_add(ticks, Ordering::SeqCst);
        }

        fn create_mutex(&self) -> Option<()> {
            (!self.no_mutex.load(Ordering::SeqCst)).then_some(())
        }

        fn destroy_mutex(&self, _mutex: ()) {}

        fn lock_mutex(&self, _mutex: &()) {
            self.locks.fetch_add(1, Ordering::SeqCst);
        }

        fn unlock_mutex(&self, _mutex: &()) {
            self.unlocks.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_ticks_for_rounds_up() {
        let strategy = Blocking::new(HostScheduler::new(100)).unwrap();
        assert_eq!(strategy.ticks_for(Duration::from_millis(1)), 1);
        assert_eq!(strategy.ticks_for(Duration::from_millis(15)), 2);
    }

    #[test]
    fn test_completed_without_blocking() {
        let state = CompletionState::new();
        assert_eq!(
            strategy().block_until_complete(&state, WaitTimeout::None),
            WaitOutcome::Completed
        );
    }

    #[test]
    fn test_zero_timeout_does_not_block() {
        let state = CompletionState::new();
        state.begin_submission();
        assert_eq!(
            strategy().block_until_complete(&state, WaitTimeout::None),
            WaitOutcome::TimedOut
        );
    }

    #[test]
    fn test_timeout_not_early() {
        let state = CompletionState::new();
        state.begin_submission();

        let start = Instant::now();
        let outcome = strategy().block_until_complete(&state, WaitTimeout::millis(40));
        let elapsed = start.elapsed();

        assert_eq!(outcome, WaitOutcome::TimedOut);
        assert!(elapsed >= Duration::from_millis(40));
        assert!(elapsed < Duration::from_millis(1000));
    }

    #[test]
    fn test_released_by_isr_thread() {
        let state = Arc::new(CompletionState::new());
        let strategy = Arc::new(strategy());
        state.begin_submission();

        let (isr_state, isr_strategy) = (Arc::clone(&state), Arc::clone(&strategy));
        let isr = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            isr_state.signal_from_isr(InterruptStatus::from_raw(1));
            isr_strategy.release_from_isr();
        });

        assert_eq!(
            strategy.block_until_complete(&state, WaitTimeout::Infinite),
            WaitOutcome::Completed
        );
        isr.join().unwrap();
    }

    #[test]
    fn test_stale_release_does_not_complete() {
        let state = CompletionState::new();
        let strategy = strategy();

        // Interrupt for the previous command: flag set, signal given, but
        // nobody consumes the signal
        state.signal_from_isr(InterruptStatus::from_raw(1));
        strategy.release_from_isr();

        state.begin_submission();
        assert_eq!(
            strategy.block_until_complete(&state, WaitTimeout::millis(20)),
            WaitOutcome::TimedOut
        );
    }

    #[test]
    fn test_tick_boundary_after_stale_token_keeps_full_budget() {
        let scheduler = ScriptedScheduler::default();
        scheduler.stale_tokens.store(1, Ordering::SeqCst);
        let strategy = Blocking::new(scheduler).unwrap();

        let state = CompletionState::new();
        state.begin_submission();
        assert_eq!(
            strategy.block_until_complete(&state, WaitTimeout::millis(10)),
            WaitOutcome::TimedOut
        );

        // One tick boundary passed while consuming the stale token, but
        // almost no time did: the second acquire still gets all 10 ticks
        let requested = strategy.scheduler().requested.lock().unwrap().clone();
        assert_eq!(requested, vec![Some(10), Some(10)]);
    }

    #[test]
    fn test_stream_lock_uses_scheduler_mutex() {
        let strategy = Blocking::new(ScriptedScheduler::default()).unwrap();
        {
            let _stream = strategy.lock_stream();
            assert_eq!(strategy.scheduler().locks.load(Ordering::SeqCst), 1);
            assert_eq!(strategy.scheduler().unlocks.load(Ordering::SeqCst), 0);
        }
        assert_eq!(strategy.scheduler().unlocks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_mutex_creation_failure_releases_signal() {
        let scheduler = ScriptedScheduler::default();
        scheduler.no_mutex.store(true, Ordering::SeqCst);
        let destroyed = Arc::clone(&scheduler.signals_destroyed);

        let result = Blocking::new(scheduler);
        assert!(matches!(result, Err(Error::OutOfMemory)));
        assert_eq!(destroyed.load(Ordering::SeqCst), 1);
    }
}
