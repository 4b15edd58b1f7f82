//! # Memory-Mapped Register Bridge
//!
//! [`RegisterBridge`] over a mapped register window.

use core::ptr;

use crate::bridge::RegisterBridge;
use crate::regs::Register;

// =============================================================================
// MMIO BRIDGE
// =============================================================================

/// Register bridge backed by volatile accesses at `base + offset`
#[derive(Debug)]
pub struct MmioBridge {
    /// Virtual address of the register window
    base: usize,
}

impl MmioBridge {
    /// Create a bridge over the register window at `base`.
    ///
    /// # Safety
    /// - `base` must be the virtual address of the GPU register window,
    ///   mapped uncached for at least `CMDBUF_SIZE + 4` bytes
    /// - `base` must be 4-byte aligned
    /// - the mapping must outlive the bridge
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    #[inline]
    fn reg_ptr(&self, reg: Register) -> *mut u32 {
        (self.base + reg.offset() as usize) as *mut u32
    }
}

impl RegisterBridge for MmioBridge {
    #[inline]
    fn peek(&self, reg: Register) -> u32 {
        // SAFETY: window validity is guaranteed by the `new` contract and
        // every `Register` offset lies inside it
        let value = unsafe { ptr::read_volatile(self.reg_ptr(reg)) };
        fence::mmio_read_barrier();

        #[cfg(feature = "debug_mmio")]
        log::trace!("mmio: {} -> {:#010x}", reg.name(), value);

        value
    }

    #[inline]
    fn poke(&self, reg: Register, value: u32) {
        #[cfg(feature = "debug_mmio")]
        log::trace!("mmio: {} <- {:#010x}", reg.name(), value);

        fence::mmio_write_barrier();
        // SAFETY: see `peek`
        unsafe { ptr::write_volatile(self.reg_ptr(reg), value) }
    }
}

static_assertions::assert_impl_all!(MmioBridge: Send, Sync);

// =============================================================================
// MEMORY FENCE OPERATIONS
// =============================================================================

/// Memory barriers around register accesses
pub mod fence {
    //! Memory barrier operations

    /// Compiler fence (prevents reordering)
    #[inline(always)]
    pub fn compiler() {
        core::sync::atomic::compiler_fence(core::sync::atomic::Ordering::SeqCst);
    }

    /// Barrier before a register write, so the command buffer contents
    /// are visible to the GPU before it is told to fetch them
    #[inline(always)]
    pub fn mmio_write_barrier() {
        #[cfg(target_arch = "aarch64")]
        {
            // SAFETY: This is a memory barrier instruction
            unsafe {
                core::arch::asm!("dmb st", options(nostack, preserves_flags));
            }
        }

        #[cfg(target_arch = "arm")]
        {
            // SAFETY: This is a memory barrier instruction
            unsafe {
                core::arch::asm!("dmb sy", options(nostack, preserves_flags));
            }
        }

        #[cfg(not(any(target_arch = "aarch64", target_arch = "arm")))]
        {
            compiler();
        }
    }

    /// Barrier after a register read
    #[inline(always)]
    pub fn mmio_read_barrier() {
        #[cfg(target_arch = "aarch64")]
        {
            // SAFETY: This is a memory barrier instruction
            unsafe {
                core::arch::asm!("dmb ld", options(nostack, preserves_flags));
            }
        }

        #[cfg(target_arch = "arm")]
        {
            // ARMv7-M has no load-only variant
            // SAFETY: This is a memory barrier instruction
            unsafe {
                core::arch::asm!("dmb", options(nostack, preserves_flags));
            }
        }

        #[cfg(not(any(target_arch = "aarch64", target_arch = "arm")))]
        {
            compiler();
        }
    }
}
