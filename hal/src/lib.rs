//! # vgsync HAL
//!
//! Register-level interface to a VGLite-class vector GPU core.
//!
//! The command layer in `vgsync-core` never touches hardware directly. It
//! goes through a [`RegisterBridge`], which a board crate implements over
//! the mapped register window (see [`MmioBridge`]) and tests implement over
//! plain memory.
//!
//! ## Registers Used
//!
//! ```text
//! ┌────────────┬────────────────────────┬───────────────────────────────┐
//! │ Offset     │ Register               │ Access                        │
//! ├────────────┼────────────────────────┼───────────────────────────────┤
//! │ 0x010      │ INTR_STATUS            │ read (ISR), clear-on-read     │
//! │ 0x500      │ CMDBUF_ADDRESS         │ write (submit)                │
//! │ 0x504      │ CMDBUF_SIZE            │ write (submit), 64-bit words  │
//! └────────────┴────────────────────────┴───────────────────────────────┘
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod bridge;
pub mod mmio;
pub mod regs;
pub mod status;

pub use bridge::{DeviceRegisters, RegisterBridge};
pub use mmio::MmioBridge;
pub use regs::Register;
pub use status::InterruptStatus;
