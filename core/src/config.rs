//! # Configuration
//!
//! Integration-time settings for [`CommandSync`](crate::CommandSync).

/// Called from task context when a completed wait observes a bus error
pub type BusErrorHook = fn();

/// Default bus-error hook: does nothing
pub fn ignore_bus_error() {}

/// Command layer configuration
#[derive(Debug, Clone, Copy)]
pub struct SyncConfig {
    /// Invoked once per `wait` that observes the bus-error bit
    pub bus_error_hook: BusErrorHook,
}

impl SyncConfig {
    /// Default configuration
    pub const fn new() -> Self {
        Self {
            bus_error_hook: ignore_bus_error,
        }
    }

    /// Install a bus-error hook
    pub const fn with_bus_error_hook(self, hook: BusErrorHook) -> Self {
        Self {
            bus_error_hook: hook,
            ..self
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}
