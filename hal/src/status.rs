//! # Interrupt Status
//!
//! Decoding of the raw `INTR_STATUS` word.

bitflags::bitflags! {
    /// Raw interrupt status bits.
    ///
    /// Only the bus-error bit has a fixed meaning for this layer. Every
    /// other bit is an engine-specific completion source and is kept as-is
    /// (`from_bits_retain`), since any non-zero status counts as "done".
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InterruptStatus: u32 {
        /// AXI bus error: the GPU faulted on a memory access
        const BUS_ERROR = 1 << 31;
    }
}

impl InterruptStatus {
    /// Wrap a raw status word without dropping unknown bits
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self::from_bits_retain(raw)
    }

    /// True if the device raised anything at all
    #[inline]
    pub const fn has_pending(self) -> bool {
        self.bits() != 0
    }

    /// True if the bus-error bit is set
    #[inline]
    pub const fn is_bus_error(self) -> bool {
        self.contains(Self::BUS_ERROR)
    }
}
