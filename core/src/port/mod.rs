//! # Ports
//!
//! Ready-made implementations of the crate's platform seams.
//!
//! A target normally brings its own [`Scheduler`](crate::Scheduler),
//! [`LocalStorage`](crate::LocalStorage) and
//! [`RegisterBridge`](vgsync_hal::RegisterBridge). The hosted port maps them
//! onto `std` threads so the whole handshake can run on a workstation.

#[cfg(any(test, feature = "std"))]
pub mod hosted;
