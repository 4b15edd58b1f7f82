//! # Hosted Port
//!
//! `std`-backed scheduler, per-thread storage and a simulated register
//! window. The simulated "ISR" is any thread that calls
//! [`CommandSync::on_interrupt`](crate::CommandSync::on_interrupt) after
//! [`SimulatedRegisters::raise`].

use std::cell::Cell;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use vgsync_hal::{Register, RegisterBridge};

use crate::strategy::Scheduler;
use crate::tls::LocalStorage;

// =============================================================================
// SCHEDULER
// =============================================================================

/// Scheduler port over `std::thread` with a virtual tick clock
#[derive(Debug, Clone, Copy)]
pub struct HostScheduler {
    tick_rate_hz: u32,
    epoch: Instant,
}

impl HostScheduler {
    /// Create a scheduler ticking at `tick_rate_hz` (clamped to at least 1)
    pub fn new(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz: tick_rate_hz.max(1),
            epoch: Instant::now(),
        }
    }

    fn ticks_to_duration(&self, ticks: u64) -> Duration {
        const NANOS_PER_SEC: u128 = 1_000_000_000;

        let nanos = (u128::from(ticks) * NANOS_PER_SEC).div_ceil(u128::from(self.tick_rate_hz));
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

impl Default for HostScheduler {
    fn default() -> Self {
        Self::new(1000)
    }
}

/// Binary signal: a flag under a mutex plus a condition variable
#[derive(Debug, Default)]
pub struct HostSignal {
    given: Mutex<bool>,
    cond: Condvar,
}

/// Task mutex: a locked flag under a mutex plus a condition variable, so a
/// contended caller sleeps instead of spinning
#[derive(Debug, Default)]
pub struct HostMutex {
    locked: Mutex<bool>,
    cond: Condvar,
}

impl Scheduler for HostScheduler {
    type Signal = HostSignal;
    type Mutex = HostMutex;

    fn tick_rate_hz(&self) -> u32 {
        self.tick_rate_hz
    }

    fn tick_count(&self) -> u64 {
        let nanos = self.epoch.elapsed().as_nanos() * u128::from(self.tick_rate_hz);
        u64::try_from(nanos / 1_000_000_000).unwrap_or(u64::MAX)
    }

    fn create_signal(&self) -> Option<HostSignal> {
        Some(HostSignal::default())
    }

    fn destroy_signal(&self, signal: HostSignal) {
        drop(signal);
    }

    fn acquire(&self, signal: &HostSignal, ticks: Option<u64>) -> bool {
        let deadline = ticks.map(|ticks| Instant::now() + self.ticks_to_duration(ticks));
        let mut given = signal.given.lock().unwrap_or_else(PoisonError::into_inner);

        loop {
            if *given {
                *given = false;
                return true;
            }
            match deadline {
                None => {
                    given = signal
                        .cond
                        .wait(given)
                        .unwrap_or_else(PoisonError::into_inner);
                },
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    given = signal
                        .cond
                        .wait_timeout(given, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                },
            }
        }
    }

    fn release_from_isr(&self, signal: &HostSignal) -> bool {
        let mut given = signal.given.lock().unwrap_or_else(PoisonError::into_inner);
        let woke = !*given;
        *given = true;
        signal.cond.notify_one();
        woke
    }

    fn yield_from_isr(&self) {
        thread::yield_now();
    }

    fn delay_ticks(&self, ticks: u64) {
        thread::sleep(self.ticks_to_duration(ticks));
    }

    fn create_mutex(&self) -> Option<HostMutex> {
        Some(HostMutex::default())
    }

    fn destroy_mutex(&self, mutex: HostMutex) {
        drop(mutex);
    }

    fn lock_mutex(&self, mutex: &HostMutex) {
        let mut locked = mutex.locked.lock().unwrap_or_else(PoisonError::into_inner);
        while *locked {
            locked = mutex
                .cond
                .wait(locked)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *locked = true;
    }

    fn unlock_mutex(&self, mutex: &HostMutex) {
        let mut locked = mutex.locked.lock().unwrap_or_else(PoisonError::into_inner);
        *locked = false;
        mutex.cond.notify_one();
    }
}

// =============================================================================
// PER-THREAD STORAGE
// =============================================================================

thread_local! {
    static THREAD_SLOT: Cell<*mut ()> = const { Cell::new(core::ptr::null_mut()) };
}

/// [`LocalStorage`] backed by one `thread_local!` cell per thread
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadStorage;

impl LocalStorage for ThreadStorage {
    fn load(&self) -> *mut () {
        THREAD_SLOT.with(Cell::get)
    }

    fn store(&self, value: *mut ()) {
        THREAD_SLOT.with(|slot| slot.set(value));
    }
}

// =============================================================================
// SIMULATED REGISTERS
// =============================================================================

/// In-memory register window with a clear-on-read status register
#[derive(Debug, Default)]
pub struct SimulatedRegisters {
    status: AtomicU32,
    address: AtomicU32,
    size: AtomicU32,
    kicks: AtomicUsize,
}

impl SimulatedRegisters {
    /// Empty window
    pub const fn new() -> Self {
        Self {
            status: AtomicU32::new(0),
            address: AtomicU32::new(0),
            size: AtomicU32::new(0),
            kicks: AtomicUsize::new(0),
        }
    }

    /// Latch status bits as the hardware would before raising its interrupt
    pub fn raise(&self, raw: u32) {
        self.status.fetch_or(raw, Ordering::SeqCst);
    }

    /// Last value written to `CMDBUF_ADDRESS`
    pub fn command_address(&self) -> u32 {
        self.address.load(Ordering::SeqCst)
    }

    /// Last value written to `CMDBUF_SIZE`
    pub fn command_size_words(&self) -> u32 {
        self.size.load(Ordering::SeqCst)
    }

    /// Number of size writes, i.e. command buffers started
    pub fn kick_count(&self) -> usize {
        self.kicks.load(Ordering::SeqCst)
    }
}

impl RegisterBridge for SimulatedRegisters {
    fn peek(&self, reg: Register) -> u32 {
        match reg {
            Register::IntrStatus => self.status.swap(0, Ordering::SeqCst),
            Register::CmdbufAddress => self.address.load(Ordering::SeqCst),
            Register::CmdbufSize => self.size.load(Ordering::SeqCst),
        }
    }

    fn poke(&self, reg: Register, value: u32) {
        match reg {
            Register::IntrStatus => self.status.store(value, Ordering::SeqCst),
            Register::CmdbufAddress => self.address.store(value, Ordering::SeqCst),
            Register::CmdbufSize => {
                self.size.store(value, Ordering::SeqCst);
                self.kicks.fetch_add(1, Ordering::SeqCst);
            },
        }
    }
}
