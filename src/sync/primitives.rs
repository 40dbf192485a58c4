//! Interrupt-safe cells shared by the channels and the async layer.

use core::cell::RefCell;
#[cfg(feature = "async")]
use core::task::Waker;
use critical_section::Mutex;

/// Value shared between a channel's interrupt handler and its caller.
///
/// Every access runs inside `critical_section::with`, so the handler can
/// never observe a half-updated engine or configuration. The cell is `Sync`
/// whenever `T: Send`, which makes it usable in a `static` channel.
pub struct CriticalSectionCell<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> CriticalSectionCell<T> {
    /// Wrap `value`; usable in `static` initializers
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Run `f` with mutable access inside a critical section.
    ///
    /// # Panics
    /// Panics on re-entrant access from inside `f`.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    /// Like [`Self::with`], but yields `None` on re-entrant access
    #[inline]
    pub fn try_with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| {
            let mut guard = self.inner.borrow(cs).try_borrow_mut().ok()?;
            Some(f(&mut guard))
        })
    }

    /// Run `f` with shared access inside a critical section
    #[inline]
    pub fn with_ref<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        critical_section::with(|cs| f(&self.inner.borrow_ref(cs)))
    }
}

impl<T: Copy> CriticalSectionCell<T> {
    /// Copy of the current value
    #[inline]
    pub fn get(&self) -> T {
        self.with_ref(|value| *value)
    }
}

/// Single waker slot filled by a future and drained by an interrupt handler.
///
/// Registering the same waker twice keeps the stored one; waking empties
/// the slot so a stale future is never woken twice.
#[cfg(feature = "async")]
pub struct AtomicWaker {
    slot: CriticalSectionCell<Option<Waker>>,
}

#[cfg(feature = "async")]
impl AtomicWaker {
    /// Empty slot; usable in `static` initializers
    pub const fn new() -> Self {
        Self {
            slot: CriticalSectionCell::new(None),
        }
    }

    /// Store `waker` for the next [`Self::wake`]
    pub fn register(&self, waker: &Waker) {
        self.slot.with(|slot| {
            if !slot.as_ref().is_some_and(|stored| stored.will_wake(waker)) {
                *slot = Some(waker.clone());
            }
        });
    }

    /// Take the stored waker and wake it outside the critical section
    #[inline]
    pub fn wake(&self) {
        if let Some(waker) = self.slot.with(Option::take) {
            waker.wake();
        }
    }

    /// Whether a waker is stored
    pub fn is_registered(&self) -> bool {
        self.slot.with_ref(Option::is_some)
    }
}

#[cfg(feature = "async")]
impl Default for AtomicWaker {
    fn default() -> Self {
        Self::new()
    }
}
