//! # vgsync Core
//!
//! Command-buffer submission and completion handshake for a vector GPU that
//! executes one command buffer at a time.
//!
//! ## Components
//!
//! - **CommandSync**: `submit`, `wait`, `on_interrupt`, `context_changed`
//! - **CompletionState**: the words shared with the interrupt handler
//! - **ContextTracker**: which context owns the outstanding command
//! - **Wait strategies**: [`BusyWait`] (no OS) or [`Blocking`] (RTOS)
//! - **ThreadLocalSlot**: per-task driver context pointer
//!
//! ## Integration
//!
//! ```ignore
//! use spin::Once;
//! use vgsync_core::{BareMetalSync, BusyWait, CommandSync, ContextId, SyncConfig, WaitTimeout};
//! use vgsync_hal::MmioBridge;
//!
//! static GPU: Once<BareMetalSync<MmioBridge>> = Once::new();
//!
//! fn init() {
//!     let regs = unsafe { MmioBridge::new(0x4040_0000) };
//!     GPU.call_once(|| CommandSync::new(regs, BusyWait::new(996_000_000), SyncConfig::new()));
//! }
//!
//! #[no_mangle]
//! extern "C" fn GPU2D_IRQHandler() {
//!     if let Some(gpu) = GPU.get() {
//!         gpu.on_interrupt();
//!     }
//! }
//!
//! fn draw(cmd_phys: u32, len: u32) -> vgsync_core::Result<()> {
//!     let gpu = GPU.get().ok_or(vgsync_core::Error::NotInitialized)?;
//!     let _stream = gpu.lock();
//!     gpu.submit(ContextId::new(1), cmd_phys, 0, len)?;
//!     gpu.wait(WaitTimeout::Infinite)
//! }
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

#[cfg(any(test, feature = "alloc"))]
extern crate alloc;

pub mod config;
pub mod device;
pub mod error;
#[cfg(any(test, feature = "alloc"))]
pub mod mem;
pub mod port;
pub mod state;
pub mod strategy;
pub mod tls;
pub mod types;

pub use config::{BusErrorHook, SyncConfig};
pub use device::{BareMetalSync, CommandSync, RtosSync};
pub use error::{Error, Result};
pub use state::{CompletionState, ContextTracker};
pub use strategy::{
    Blocking, BusyWait, Delay, Scheduler, SchedulerGuard, SpinDelay, WaitOutcome, WaitStrategy,
};
pub use tls::{LocalStorage, StaticStorage, ThreadLocalSlot};
pub use types::{CommandBuffer, ContextId, WaitTimeout};
