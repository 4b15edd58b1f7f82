//! # Register Map
//!
//! Offsets of the registers the command layer touches, in bytes from the
//! start of the GPU register window.

use static_assertions::const_assert;

// =============================================================================
// REGISTER OFFSETS
// =============================================================================

/// Raw interrupt status. Reading it acknowledges the pending bits.
pub const INTR_STATUS: u32 = 0x0000_0010;

/// Physical address of the command buffer to fetch next.
pub const CMDBUF_ADDRESS: u32 = 0x0000_0500;

/// Command buffer length in 64-bit words. Writing it starts the fetch.
pub const CMDBUF_SIZE: u32 = 0x0000_0504;

/// Size of one command-buffer word as counted by [`CMDBUF_SIZE`].
pub const COMMAND_WORD_BYTES: u32 = 8;

const_assert!(INTR_STATUS % 4 == 0);
const_assert!(CMDBUF_ADDRESS % 4 == 0);
const_assert!(CMDBUF_SIZE == CMDBUF_ADDRESS + 4);

// =============================================================================
// REGISTER
// =============================================================================

/// Registers reachable through a [`RegisterBridge`](crate::RegisterBridge)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Register {
    /// Interrupt status
    IntrStatus    = INTR_STATUS,
    /// Command buffer address
    CmdbufAddress = CMDBUF_ADDRESS,
    /// Command buffer size
    CmdbufSize    = CMDBUF_SIZE,
}

impl Register {
    /// Byte offset from the register window base
    #[inline]
    pub const fn offset(self) -> u32 {
        self as u32
    }

    /// Register name, for tracing
    pub const fn name(self) -> &'static str {
        match self {
            Register::IntrStatus => "INTR_STATUS",
            Register::CmdbufAddress => "CMDBUF_ADDRESS",
            Register::CmdbufSize => "CMDBUF_SIZE",
        }
    }
}

/// Number of [`COMMAND_WORD_BYTES`] words needed to hold `bytes`, rounded up
#[inline]
pub const fn command_words(bytes: u32) -> u32 {
    bytes.div_ceil(COMMAND_WORD_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets() {
        assert_eq!(Register::IntrStatus.offset(), 0x10);
        assert_eq!(Register::CmdbufAddress.offset(), 0x500);
        assert_eq!(Register::CmdbufSize.offset(), 0x504);
    }

    #[test]
    fn test_command_words_round_up() {
        assert_eq!(command_words(0), 0);
        assert_eq!(command_words(1), 1);
        assert_eq!(command_words(8), 1);
        assert_eq!(command_words(9), 2);
        assert_eq!(command_words(64), 8);
        assert_eq!(command_words(u32::MAX), 0x2000_0000);
    }
}
