//! Busy-wait strategy for targets without a scheduler.

use core::hint::spin_loop;
use core::time::Duration;

use spin::{Mutex, MutexGuard};

use crate::state::CompletionState;
use crate::strategy::{WaitOutcome, WaitStrategy};
use crate::types::WaitTimeout;

// =============================================================================
// DELAY SOURCE
// =============================================================================

/// Microsecond delay used by [`BusyWait::sleep`]
pub trait Delay: Send + Sync {
    /// Busy-wait for at least `us` microseconds
    fn delay_us(&self, us: u32);
}

/// Cycle-counting delay: one spin iteration takes at least one core cycle,
/// so `us * cpu_hz / 1e6` iterations wait at least `us` microseconds
#[derive(Debug, Clone, Copy)]
pub struct SpinDelay {
    /// Core clock frequency in Hz
    pub cpu_hz: u32,
}

impl SpinDelay {
    /// Delay calibrated for a core running at `cpu_hz`
    pub const fn new(cpu_hz: u32) -> Self {
        Self { cpu_hz }
    }
}

impl Default for SpinDelay {
    /// 996 MHz, the fastest core this layer ships on
    fn default() -> Self {
        Self::new(996_000_000)
    }
}

impl Delay for SpinDelay {
    fn delay_us(&self, us: u32) {
        let iterations = (u64::from(us) * u64::from(self.cpu_hz)).div_ceil(1_000_000);
        for _ in 0..iterations {
            spin_loop();
        }
    }
}

// =============================================================================
// BUSY WAIT
// =============================================================================

/// Spin on the completion flag.
///
/// There is no time source, so every wait is unbounded: a device that never
/// raises its interrupt hangs the caller. The stream lock is a spinlock,
/// which is only sound without preemption.
#[derive(Debug, Default)]
pub struct BusyWait<D: Delay = SpinDelay> {
    delay: D,
    stream: Mutex<()>,
}

impl BusyWait<SpinDelay> {
    /// Busy-wait strategy with a spin delay for a core at `cpu_hz`
    pub const fn new(cpu_hz: u32) -> Self {
        Self::with_delay(SpinDelay::new(cpu_hz))
    }
}

impl<D: Delay> BusyWait<D> {
    /// Busy-wait strategy sleeping through a custom delay source
    pub const fn with_delay(delay: D) -> Self {
        Self {
            delay,
            stream: Mutex::new(()),
        }
    }

    /// The delay source
    pub fn delay(&self) -> &D {
        &self.delay
    }
}

impl<D: Delay> WaitStrategy for BusyWait<D> {
    type StreamGuard<'a>
        = MutexGuard<'a, ()>
    where
        Self: 'a;

    fn name(&self) -> &'static str {
        "busy-wait"
    }

    fn block_until_complete(&self, state: &CompletionState, _timeout: WaitTimeout) -> WaitOutcome {
        while !state.is_pending() {
            spin_loop();
        }
        WaitOutcome::Completed
    }

    fn release_from_isr(&self) {}

    fn sleep(&self, duration: Duration) {
        let mut remaining = duration.as_nanos().div_ceil(1_000);
        while remaining > 0 {
            let chunk = remaining.min(u128::from(u32::MAX));
            self.delay.delay_us(chunk as u32);
            remaining -= chunk;
        }
    }

    fn lock_stream(&self) -> MutexGuard<'_, ()> {
        self.stream.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::thread;
    use vgsync_hal::InterruptStatus;

    #[derive(Default)]
    struct CountingDelay {
        total_us: AtomicU64,
    }

    impl Delay for CountingDelay {
        fn delay_us(&self, us: u32) {
            self.total_us.fetch_add(u64::from(us), Ordering::Relaxed);
        }
    }

    #[test]
    fn test_returns_immediately_when_idle() {
        let state = CompletionState::new();
        let strategy = BusyWait::new(1_000_000);
        assert_eq!(
            strategy.block_until_complete(&state, WaitTimeout::None),
            WaitOutcome::Completed
        );
    }

    #[test]
    fn test_spins_until_interrupt() {
        let state = Arc::new(CompletionState::new());
        state.begin_submission();

        let isr_state = Arc::clone(&state);
        let isr = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            isr_state.signal_from_isr(InterruptStatus::from_raw(1));
        });

        // Timeout is ignored: this only returns once the flag is set
        let strategy = BusyWait::new(1_000_000);
        assert_eq!(
            strategy.block_until_complete(&state, WaitTimeout::millis(1)),
            WaitOutcome::Completed
        );
        assert!(state.is_pending());
        isr.join().unwrap();
    }

    #[test]
    fn test_sleep_uses_delay_source() {
        let strategy = BusyWait::with_delay(CountingDelay::default());
        strategy.sleep(Duration::from_millis(3));
        assert_eq!(strategy.delay().total_us.load(Ordering::Relaxed), 3_000);
    }

    #[test]
    fn test_sub_microsecond_sleep_rounds_up() {
        let strategy = BusyWait::with_delay(CountingDelay::default());
        strategy.sleep(Duration::from_nanos(1));
        assert_eq!(strategy.delay().total_us.load(Ordering::Relaxed), 1);

        strategy.sleep(Duration::from_nanos(1_500));
        assert_eq!(strategy.delay().total_us.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_stream_lock_is_exclusive() {
        let strategy = BusyWait::new(1_000_000);
        {
            let _stream = strategy.lock_stream();
            assert!(strategy.stream.try_lock().is_none());
        }
        assert!(strategy.stream.try_lock().is_some());
    }
}
