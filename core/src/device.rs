//! # Command Synchronization
//!
//! Submission, completion interrupt and wait for a device that accepts
//! one command buffer at a time.
//!
//! ```text
//!   task                          CommandSync                      ISR
//!   ────                          ───────────                      ───
//!   submit(ctx, buf) ──► record ctx
//!                        block until pending
//!                        pending = false
//!                        poke ADDRESS, SIZE ──► GPU runs
//!                                                      GPU done ──► on_interrupt()
//!                                                                   status |= raw
//!                                                                   pending = true
//!                        ◄──────────────────────────── release waiter
//!   wait(timeout) ─────► block until pending
//!                        take status, bus error? ──► hook
//! ```

use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;

use vgsync_hal::mmio::fence;
use vgsync_hal::{DeviceRegisters, RegisterBridge};

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::state::{CompletionState, ContextTracker};
use crate::strategy::{Blocking, BusyWait, WaitOutcome, WaitStrategy};
use crate::types::{CommandBuffer, ContextId, WaitTimeout};

/// Command synchronization for bare-metal targets
pub type BareMetalSync<R> = CommandSync<R, BusyWait>;

/// Command synchronization under a preemptive scheduler
pub type RtosSync<R, S> = CommandSync<R, Blocking<S>>;

// =============================================================================
// COMMAND SYNC
// =============================================================================

/// The submission/wait protocol and its interrupt bridge.
///
/// One instance per device. The platform keeps it in a `static` so the
/// interrupt trampoline can reach [`on_interrupt`](Self::on_interrupt).
pub struct CommandSync<R: RegisterBridge, W: WaitStrategy> {
    regs: R,
    strategy: W,
    state: CompletionState,
    tracker: ContextTracker,
    config: SyncConfig,
    initialized: AtomicBool,
}

impl<R: RegisterBridge, W: WaitStrategy> CommandSync<R, W> {
    /// Initialize the layer: device idle, nothing accumulated
    pub fn new(regs: R, strategy: W, config: SyncConfig) -> Self {
        log::info!("vgsync: initialized ({} wait)", strategy.name());
        Self {
            regs,
            strategy,
            state: CompletionState::new(),
            tracker: ContextTracker::new(),
            config,
            initialized: AtomicBool::new(true),
        }
    }

    #[inline]
    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }

    // -------------------------------------------------------------------------
    // Task side
    // -------------------------------------------------------------------------

    /// Hand a command buffer to the device.
    ///
    /// Blocks without timeout until the previous command has completed, then
    /// programs `physical + offset` and `ceil(size / 8)` words.
    pub fn submit(&self, context: ContextId, physical: u32, offset: u32, size: u32) -> Result<()> {
        self.submit_buffer(&CommandBuffer::new(context, physical, offset, size))
    }

    /// [`submit`](Self::submit) from a prepared descriptor
    pub fn submit_buffer(&self, command: &CommandBuffer) -> Result<()> {
        self.ensure_initialized()?;
        let address = command.device_address()?;

        self.tracker.record(command.context);

        if self.strategy.block_until_complete(&self.state, WaitTimeout::Infinite)
            == WaitOutcome::TimedOut
        {
            return Err(Error::Timeout);
        }
        self.state.begin_submission();

        // Command memory must be visible before the fetch starts
        fence::mmio_write_barrier();
        self.regs.kick_command_buffer(address, command.size);

        log::trace!(
            "vgsync: submit ctx={} addr={:#010x} words={}",
            command.context.raw(),
            address,
            command.size_words()
        );
        Ok(())
    }

    /// Block until the outstanding command has completed.
    ///
    /// A bus error reported by the interrupt is passed to the configured
    /// hook once and does not fail the call. `Err(Timeout)` leaves the
    /// accumulated status untouched.
    pub fn wait(&self, timeout: WaitTimeout) -> Result<()> {
        self.ensure_initialized()?;

        if self.strategy.block_until_complete(&self.state, timeout) == WaitOutcome::TimedOut {
            log::warn!("vgsync: wait timed out after {:?}", timeout);
            return Err(Error::Timeout);
        }

        let status = self.state.take_status();
        log::debug!("vgsync: completed, status {:#010x}", status.bits());
        if status.is_bus_error() {
            log::error!("vgsync: GPU bus error (status {:#010x})", status.bits());
            (self.config.bus_error_hook)();
        }
        Ok(())
    }

    /// True iff a command from another context is or was outstanding
    #[inline]
    pub fn context_changed(&self, context: ContextId) -> bool {
        self.tracker.changed(context)
    }

    /// Context of the most recent submission
    #[inline]
    pub fn current_context(&self) -> ContextId {
        self.tracker.current()
    }

    /// True when no command is outstanding
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.state.is_pending()
    }

    /// Serialize a whole command stream (build, submit, wait) across tasks.
    ///
    /// Contended callers wait the way the strategy does: a spinlock for
    /// [`BusyWait`], the scheduler's mutex for [`Blocking`].
    pub fn lock(&self) -> W::StreamGuard<'_> {
        self.strategy.lock_stream()
    }

    /// Suspend the calling task
    pub fn sleep(&self, duration: Duration) {
        self.strategy.sleep(duration);
    }

    // -------------------------------------------------------------------------
    // Interrupt side
    // -------------------------------------------------------------------------

    /// Completion interrupt handler body.
    ///
    /// Reads (and thereby acknowledges) the status register, records a
    /// non-zero status and wakes the waiter. Never blocks, allocates or logs.
    #[inline]
    pub fn on_interrupt(&self) {
        let status = self.regs.read_status();
        if !self.initialized.load(Ordering::Acquire) {
            return;
        }
        if self.state.signal_from_isr(status) {
            self.strategy.release_from_isr();
        }
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Deinitialize. Later `submit` and `wait` fail with `NotInitialized`.
    pub fn shutdown(&self) {
        if self.initialized.swap(false, Ordering::AcqRel) {
            self.state.retire();
            log::info!("vgsync: shut down");
        }
    }

    /// Check if the layer is usable
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Shared interrupt state
    pub fn state(&self) -> &CompletionState {
        &self.state
    }

    /// Register bridge
    pub fn registers(&self) -> &R {
        &self.regs
    }

    /// Wait strategy
    pub fn strategy(&self) -> &W {
        &self.strategy
    }

    /// Active configuration
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }
}

impl<R: RegisterBridge, W: WaitStrategy> core::fmt::Debug for CommandSync<R, W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CommandSync")
            .field("strategy", &self.strategy.name())
            .field("state", &self.state)
            .field("context", &self.tracker.current())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
