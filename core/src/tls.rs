//! # Task-Local Slot
//!
//! One opaque pointer per task, used by the graphics stack to find its
//! per-task driver context.
//!
//! Where the scheduler exposes per-task storage (a task-local pointer
//! index, a TCB field), a port implements [`LocalStorage`] over it. Without
//! a scheduler there is one task, so [`StaticStorage`] is a single global
//! cell. The hosted port provides a `thread_local!` back-end.

use core::ptr::{self, NonNull};
use core::sync::atomic::{AtomicPtr, Ordering};

use crate::error::{Error, Result};

// =============================================================================
// STORAGE BACK-END
// =============================================================================

/// Raw per-task pointer cell
pub trait LocalStorage: Send + Sync {
    /// Value for the calling task (null when unset)
    fn load(&self) -> *mut ();

    /// Replace the value for the calling task
    fn store(&self, value: *mut ());
}

/// Single process-wide cell
#[derive(Debug, Default)]
pub struct StaticStorage(AtomicPtr<()>);

impl StaticStorage {
    /// Empty cell
    pub const fn new() -> Self {
        Self(AtomicPtr::new(ptr::null_mut()))
    }
}

impl LocalStorage for StaticStorage {
    #[inline]
    fn load(&self) -> *mut () {
        self.0.load(Ordering::Acquire)
    }

    #[inline]
    fn store(&self, value: *mut ()) {
        self.0.store(value, Ordering::Release);
    }
}

// =============================================================================
// SLOT
// =============================================================================

/// Task-local context pointer.
///
/// The slot never dereferences or frees what it holds; ownership stays
/// with the caller.
#[derive(Debug, Default)]
pub struct ThreadLocalSlot<S: LocalStorage = StaticStorage> {
    storage: S,
}

impl ThreadLocalSlot<StaticStorage> {
    /// Slot over a single global cell, usable in a `static`
    pub const fn new() -> Self {
        Self {
            storage: StaticStorage::new(),
        }
    }
}

impl<S: LocalStorage> ThreadLocalSlot<S> {
    /// Slot over a port-provided back-end
    pub const fn with_storage(storage: S) -> Self {
        Self { storage }
    }

    /// Store `value` for the calling task. Null is rejected; use
    /// [`reset`](Self::reset) to clear.
    pub fn set(&self, value: *mut ()) -> Result<()> {
        if value.is_null() {
            return Err(Error::InvalidArgument);
        }
        self.storage.store(value);
        Ok(())
    }

    /// Value stored by the calling task, if any
    #[inline]
    pub fn get(&self) -> Option<NonNull<()>> {
        NonNull::new(self.storage.load())
    }

    /// [`get`](Self::get), cast to the caller's context type
    #[inline]
    pub fn get_as<T>(&self) -> Option<NonNull<T>> {
        self.get().map(NonNull::cast)
    }

    /// Clear the calling task's value
    pub fn reset(&self) {
        self.storage.store(ptr::null_mut());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::hosted::ThreadStorage;
    use std::thread;

    #[test]
    fn test_set_get_reset() {
        let slot = ThreadLocalSlot::new();
        assert!(slot.get().is_none());

        let mut context = 42u64;
        let raw: *mut () = (&mut context as *mut u64).cast();
        assert_eq!(slot.set(raw), Ok(()));
        assert_eq!(slot.get().map(NonNull::as_ptr), Some(raw));
        assert_eq!(slot.get_as::<u64>().map(|p| unsafe { *p.as_ptr() }), Some(42));

        slot.reset();
        assert!(slot.get().is_none());
    }

    #[test]
    fn test_null_rejected() {
        let slot = ThreadLocalSlot::new();
        let mut context = 1u8;
        slot.set((&mut context as *mut u8).cast()).unwrap();

        assert_eq!(slot.set(ptr::null_mut()), Err(Error::InvalidArgument));
        assert!(slot.get().is_some());
    }

    #[test]
    fn test_thread_backend_isolates_tasks() {
        static SLOT: ThreadLocalSlot<ThreadStorage> = ThreadLocalSlot::with_storage(ThreadStorage);

        let mut context = 3u32;
        SLOT.set((&mut context as *mut u32).cast()).unwrap();

        let seen_elsewhere = thread::spawn(|| SLOT.get().is_some()).join().unwrap();
        assert!(!seen_elsewhere);
        assert!(SLOT.get().is_some());
        SLOT.reset();
    }
}
