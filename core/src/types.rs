//! # Core Types
//!
//! Context identifiers, command buffer descriptors and wait timeouts.

use core::time::Duration;

use vgsync_hal::regs::command_words;

use crate::error::{Error, Result};

// =============================================================================
// CONTEXT ID
// =============================================================================

/// Caller-chosen identifier of a rendering context.
///
/// Only used to detect context switches between submissions. The value `0`
/// is reserved for "nothing submitted yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ContextId(u32);

impl ContextId {
    /// No context (nothing submitted yet)
    pub const NONE: Self = Self(0);

    /// Create a context identifier
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw value
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Check if this is [`ContextId::NONE`]
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for ContextId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

// =============================================================================
// COMMAND BUFFER
// =============================================================================

/// A prepared command buffer, as handed to `submit`.
///
/// Consumed immediately by the submission; nothing keeps it afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandBuffer {
    /// Submitting context
    pub context: ContextId,
    /// Physical base address of the buffer allocation
    pub physical: u32,
    /// Offset of the first command inside the allocation
    pub offset: u32,
    /// Length of the command stream in bytes
    pub size: u32,
}

impl CommandBuffer {
    /// Describe a command buffer
    pub const fn new(context: ContextId, physical: u32, offset: u32, size: u32) -> Self {
        Self {
            context,
            physical,
            offset,
            size,
        }
    }

    /// Address the GPU fetches from (`physical + offset`)
    pub fn device_address(&self) -> Result<u32> {
        self.physical
            .checked_add(self.offset)
            .ok_or(Error::InvalidArgument)
    }

    /// Length in 64-bit command words, rounded up
    pub const fn size_words(&self) -> u32 {
        command_words(self.size)
    }
}

// =============================================================================
// WAIT TIMEOUT
// =============================================================================

/// How long a wait may block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitTimeout {
    /// Do not block; only report what already happened
    None,
    /// Block for at most this long
    Duration(Duration),
    /// Block until signaled
    #[default]
    Infinite,
}

impl WaitTimeout {
    /// Create a timeout in milliseconds
    pub const fn millis(ms: u64) -> Self {
        WaitTimeout::Duration(Duration::from_millis(ms))
    }

    /// Get duration, or `None` for infinite
    pub const fn as_duration(&self) -> Option<Duration> {
        match self {
            WaitTimeout::None => Some(Duration::ZERO),
            WaitTimeout::Duration(d) => Some(*d),
            WaitTimeout::Infinite => None,
        }
    }

    /// Check if infinite
    pub const fn is_infinite(&self) -> bool {
        matches!(self, WaitTimeout::Infinite)
    }

    /// Scheduler ticks for this timeout, rounded up; `None` when infinite
    pub fn to_ticks(&self, tick_rate_hz: u32) -> Option<u64> {
        self.as_duration()
            .map(|d| duration_to_ticks(d, tick_rate_hz))
    }
}

impl From<Duration> for WaitTimeout {
    fn from(d: Duration) -> Self {
        WaitTimeout::Duration(d)
    }
}

/// Convert a duration to scheduler ticks, rounding any partial tick up.
///
/// A non-zero duration never converts to zero ticks, so a short timeout
/// still gives the interrupt one tick to arrive.
pub fn duration_to_ticks(duration: Duration, tick_rate_hz: u32) -> u64 {
    const NANOS_PER_SEC: u128 = 1_000_000_000;

    let scaled = duration.as_nanos() * u128::from(tick_rate_hz);
    let ticks = scaled.div_ceil(NANOS_PER_SEC);
    u64::try_from(ticks).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_none() {
        assert!(ContextId::NONE.is_none());
        assert!(ContextId::default().is_none());
        assert!(!ContextId::new(1).is_none());
        assert_eq!(ContextId::from(7).raw(), 7);
    }

    #[test]
    fn test_command_buffer_address() {
        let cmd = CommandBuffer::new(ContextId::new(1), 0x1000, 0x40, 64);
        assert_eq!(cmd.device_address(), Ok(0x1040));
        assert_eq!(cmd.size_words(), 8);

        let overflow = CommandBuffer::new(ContextId::new(1), u32::MAX, 1, 8);
        assert_eq!(overflow.device_address(), Err(Error::InvalidArgument));
    }

    #[test]
    fn test_ticks_round_up() {
        assert_eq!(duration_to_ticks(Duration::from_millis(1), 1000), 1);
        assert_eq!(duration_to_ticks(Duration::from_millis(1), 100), 1);
        assert_eq!(duration_to_ticks(Duration::from_millis(15), 100), 2);
        assert_eq!(duration_to_ticks(Duration::from_millis(20), 100), 2);
        assert_eq!(duration_to_ticks(Duration::ZERO, 1000), 0);
    }

    #[test]
    fn test_timeout_ticks() {
        assert_eq!(WaitTimeout::Infinite.to_ticks(1000), None);
        assert_eq!(WaitTimeout::None.to_ticks(1000), Some(0));
        assert_eq!(WaitTimeout::millis(250).to_ticks(1000), Some(250));
        assert!(WaitTimeout::default().is_infinite());
    }
}
