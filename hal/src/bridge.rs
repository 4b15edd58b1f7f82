//! # Register Bridge
//!
//! The peek/poke seam between the command layer and the hardware.

use crate::regs::{command_words, Register};
use crate::status::InterruptStatus;

// =============================================================================
// REGISTER BRIDGE TRAIT
// =============================================================================

/// Synchronous access to the GPU register window.
///
/// Implementations must be callable from both task and interrupt context:
/// no blocking, no allocation. Both methods take `&self` because MMIO
/// accesses are volatile and need no exclusive borrow.
pub trait RegisterBridge: Send + Sync {
    /// Read a 32-bit register
    fn peek(&self, reg: Register) -> u32;

    /// Write a 32-bit register
    fn poke(&self, reg: Register, value: u32);
}

impl<T: RegisterBridge + ?Sized> RegisterBridge for &T {
    #[inline]
    fn peek(&self, reg: Register) -> u32 {
        (**self).peek(reg)
    }

    #[inline]
    fn poke(&self, reg: Register, value: u32) {
        (**self).poke(reg, value)
    }
}

// =============================================================================
// DEVICE CONTRACT
// =============================================================================

/// The three register operations the command layer performs.
///
/// Blanket-implemented for every [`RegisterBridge`]; no other register is
/// touched by `vgsync-core`.
pub trait DeviceRegisters: RegisterBridge {
    /// Raw interrupt status (bit 31 = bus error)
    #[inline]
    fn read_status(&self) -> InterruptStatus {
        InterruptStatus::from_raw(self.peek(Register::IntrStatus))
    }

    /// Program the command buffer address
    #[inline]
    fn write_command_address(&self, address: u32) {
        self.poke(Register::CmdbufAddress, address);
    }

    /// Program the command buffer length in 64-bit words, starting the fetch
    #[inline]
    fn write_command_size_words(&self, words: u32) {
        self.poke(Register::CmdbufSize, words);
    }

    /// Program a full command buffer: address first, then size in words
    /// computed from `byte_size`
    #[inline]
    fn kick_command_buffer(&self, address: u32, byte_size: u32) {
        self.write_command_address(address);
        self.write_command_size_words(command_words(byte_size));
    }
}

impl<T: RegisterBridge + ?Sized> DeviceRegisters for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct Window {
        status: AtomicU32,
        address: AtomicU32,
        size: AtomicU32,
    }

    impl RegisterBridge for Window {
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
                Register::CmdbufSize => self.size.store(value, Ordering::SeqCst),
            }
        }
    }

    #[test]
    fn test_kick_writes_address_and_words() {
        let window = Window::default();
        window.kick_command_buffer(0x1000, 64);
        assert_eq!(window.peek(Register::CmdbufAddress), 0x1000);
        assert_eq!(window.peek(Register::CmdbufSize), 8);
    }

    #[test]
    fn test_read_status_through_reference() {
        let window = Window::default();
        window.poke(Register::IntrStatus, 0x8000_0001);
        let bridge = &window;
        let status = bridge.read_status();
        assert!(status.is_bus_error());
        assert!(!bridge.read_status().has_pending());
    }
}
