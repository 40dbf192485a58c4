//! Double-buffered frame handoff between interrupt and caller context.
//!
//! [`FrameBufferPair`] holds two statically sized [`RingBuffer`]s. At any
//! instant one slot is owned by the interrupt handler ("hardware side")
//! and the other by the caller ("caller side"). Ownership moves by
//! flipping a slot index, never by copying words.
//!
//! # Access rules
//!
//! - The hardware slot is only touched inside a critical section.
//! - The caller slot is only touched while the caller holds a claim,
//!   taken and released inside a critical section.
//! - The slot flip and the freshness flag change in the same critical
//!   section, and a flip is deferred while a claim is held.
//!
//! A caller that observes `fresh == true` therefore always sees one
//! complete frame.

use core::cell::{Cell, UnsafeCell};

use critical_section::Mutex;

use crate::error::{BufferError, Error, IoError, IoResult, Result};

// =============================================================================
// Ring Buffer
// =============================================================================

/// Fixed-storage circular buffer of 16-bit words.
///
/// `CAP` is the storage size; the logical capacity (`len`) is set per
/// configuration and never exceeds it. `head` is the write index, `tail`
/// the read index; both stay below `len` and wrap modulo `len`.
pub struct RingBuffer<const CAP: usize> {
    words: [u16; CAP],
    len: usize,
    head: usize,
    tail: usize,
    remaining: usize,
}

impl<const CAP: usize> RingBuffer<CAP> {
    /// Create an empty buffer with zero logical capacity
    #[must_use]
    pub const fn new() -> Self {
        Self {
            words: [0; CAP],
            len: 0,
            head: 0,
            tail: 0,
            remaining: 0,
        }
    }

    /// Logical capacity in words
    #[inline(always)]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer currently has no logical capacity
    #[inline(always)]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current write index
    #[inline(always)]
    #[must_use]
    pub const fn head(&self) -> usize {
        self.head
    }

    /// Current read index
    #[inline(always)]
    #[must_use]
    pub const fn tail(&self) -> usize {
        self.tail
    }

    /// Words left before the read index completes a frame
    #[inline(always)]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.remaining
    }

    /// Set a new logical capacity, clearing contents and indices
    fn reset(&mut self, len: usize) {
        let len = len.min(CAP);
        self.words[..len].fill(0);
        self.len = len;
        self.head = 0;
        self.tail = 0;
        self.remaining = 0;
    }

    /// Move the write index, wrapping modulo capacity
    fn set_head(&mut self, position: usize) {
        if self.len != 0 {
            self.head = position % self.len;
        }
    }

    /// Store a word at `head` and advance it; returns the new head
    fn push(&mut self, word: u16) -> usize {
        if self.len == 0 {
            return 0;
        }
        self.words[self.head] = word;
        self.head = (self.head + 1) % self.len;
        self.head
    }

    /// Take the word at `tail` if the current frame is not exhausted
    fn pop(&mut self) -> Option<u16> {
        if self.remaining == 0 {
            return None;
        }
        let word = self.words[self.tail];
        self.tail = (self.tail + 1) % self.len;
        self.remaining -= 1;
        Some(word)
    }

    /// Restart reading the whole buffer from index 0
    fn rewind(&mut self) {
        self.tail = 0;
        self.remaining = self.len;
    }

    /// Logical contents
    #[must_use]
    pub fn as_slice(&self) -> &[u16] {
        &self.words[..self.len]
    }

    fn as_mut_slice(&mut self) -> &mut [u16] {
        &mut self.words[..self.len]
    }
}

impl<const CAP: usize> Default for RingBuffer<CAP> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Frame Buffer Pair
// =============================================================================

/// Ownership and freshness state, changed only inside a critical section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PairState {
    /// Index of the slot owned by the interrupt handler (0 or 1)
    hardware_slot: u8,
    /// Caller slot holds a frame the caller has not replaced / adopted yet
    fresh: bool,
    /// Caller holds a claim on its slot
    caller_busy: bool,
    /// Number of completed slot flips
    generation: u32,
}

impl PairState {
    const fn new() -> Self {
        Self {
            hardware_slot: 0,
            fresh: false,
            caller_busy: false,
            generation: 0,
        }
    }

    const fn caller_slot(&self) -> usize {
        1 - self.hardware_slot as usize
    }
}

/// Two equally sized ring buffers exchanged at frame boundaries.
///
/// Used by the RX side to publish completed frames and by the TX side to
/// adopt staged frames. See the module documentation for access rules.
pub struct FrameBufferPair<const CAP: usize> {
    slots: [UnsafeCell<RingBuffer<CAP>>; 2],
    state: Mutex<Cell<PairState>>,
}

// SAFETY: slot access follows the claim protocol described in the module
// docs; all state transitions happen inside critical sections.
unsafe impl<const CAP: usize> Sync for FrameBufferPair<CAP> {}

impl<const CAP: usize> FrameBufferPair<CAP> {
    /// Create a pair with zero logical capacity (const, suitable for statics)
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [
                UnsafeCell::new(RingBuffer::new()),
                UnsafeCell::new(RingBuffer::new()),
            ],
            state: Mutex::new(Cell::new(PairState::new())),
        }
    }

    /// Storage size of each slot in words
    #[inline(always)]
    #[must_use]
    pub const fn storage_words(&self) -> usize {
        CAP
    }

    /// Run `f` on the hardware slot inside a critical section
    fn with_hardware<R>(&self, f: impl FnOnce(&mut RingBuffer<CAP>) -> R) -> R {
        critical_section::with(|cs| {
            let slot = self.state.borrow(cs).get().hardware_slot as usize;
            // SAFETY: the hardware slot is never claimed by the caller and is
            // only touched while a critical section is held.
            f(unsafe { self.slot_mut(slot) })
        })
    }

    /// # Safety
    /// The caller must hold the claim on `slot`, or be inside a critical
    /// section while `slot` is unclaimed.
    #[allow(clippy::mut_from_ref)]
    unsafe fn slot_mut(&self, slot: usize) -> &mut RingBuffer<CAP> {
        unsafe { &mut *self.slots[slot].get() }
    }

    // =========================================================================
    // Configuration (caller context, interrupt handler quiesced)
    // =========================================================================

    /// Resize both slots to `len` words and clear all state.
    ///
    /// Fails without touching anything when `len` exceeds the static
    /// storage or the caller slot is claimed.
    pub fn resize(&self, len: usize) -> Result<()> {
        if len > CAP {
            return Err(BufferError::CapacityExceeded.into());
        }
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let state = cell.get();
            if state.caller_busy {
                return Err(Error::Io(IoError::CallerBusy));
            }
            for slot in 0..2 {
                // SAFETY: inside a critical section with no claim outstanding.
                unsafe { self.slot_mut(slot) }.reset(len);
            }
            cell.set(PairState {
                generation: state.generation,
                ..PairState::new()
            });
            Ok(())
        })
    }

    /// Release both slots (logical capacity 0)
    pub fn release(&self) -> Result<()> {
        self.resize(0)
    }

    // =========================================================================
    // Shared Queries
    // =========================================================================

    /// Logical frame length in words
    pub fn frame_len(&self) -> usize {
        self.with_hardware(|ring| ring.len())
    }

    /// Whether the caller slot holds a frame not yet consumed by the other side
    pub fn is_fresh(&self) -> bool {
        critical_section::with(|cs| self.state.borrow(cs).get().fresh)
    }

    /// Number of completed slot flips since creation
    pub fn generation(&self) -> u32 {
        critical_section::with(|cs| self.state.borrow(cs).get().generation)
    }

    // =========================================================================
    // Hardware Path (interrupt context)
    // =========================================================================

    /// Append a word to the hardware slot; returns the new head index
    pub fn write_word(&self, word: u16) -> usize {
        self.with_hardware(|ring| ring.push(word))
    }

    /// Position the hardware slot's write index
    pub fn set_head(&self, position: usize) {
        self.with_hardware(|ring| ring.set_head(position));
    }

    /// Publish the hardware slot to the caller.
    ///
    /// Flips slot ownership and sets the freshness flag in one critical
    /// section. The new hardware slot continues writing at the same head.
    /// Returns `false` (nothing published) while the caller holds a claim.
    pub fn mark_boundary_reached(&self) -> bool {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut state = cell.get();
            if state.caller_busy {
                return false;
            }
            let old = state.hardware_slot as usize;
            let new = 1 - old;
            // SAFETY: inside a critical section with no claim outstanding.
            let head = unsafe { self.slot_mut(old) }.head();
            // SAFETY: same as above.
            unsafe { self.slot_mut(new) }.set_head(head);
            state.hardware_slot = new as u8;
            state.fresh = true;
            state.generation = state.generation.wrapping_add(1);
            cell.set(state);
            true
        })
    }

    /// Adopt a staged frame into the hardware slot.
    ///
    /// Only succeeds when the caller slot is fresh and not claimed. The
    /// adopted slot is rewound so the whole frame is read from index 0.
    pub fn adopt_if_fresh(&self) -> bool {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut state = cell.get();
            if !state.fresh || state.caller_busy {
                return false;
            }
            let new = state.caller_slot();
            // SAFETY: inside a critical section with no claim outstanding.
            unsafe { self.slot_mut(new) }.rewind();
            state.hardware_slot = new as u8;
            state.fresh = false;
            state.generation = state.generation.wrapping_add(1);
            cell.set(state);
            true
        })
    }

    /// Words left in the hardware slot's current frame
    pub fn remaining(&self) -> usize {
        self.with_hardware(|ring| ring.remaining())
    }

    /// Restart the hardware slot's frame from index 0
    pub fn rewind(&self) {
        self.with_hardware(|ring| ring.rewind());
    }

    /// Take the next word of the hardware slot's frame
    pub fn read_word(&self) -> Option<u16> {
        self.with_hardware(|ring| ring.pop())
    }

    // =========================================================================
    // Caller Path
    // =========================================================================

    fn claim(&self) -> IoResult<Claim<'_, CAP>> {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut state = cell.get();
            if state.caller_busy {
                return Err(IoError::CallerBusy);
            }
            state.caller_busy = true;
            cell.set(state);
            Ok(Claim {
                pair: self,
                slot: state.caller_slot(),
                fresh: state.fresh,
                mark_fresh: false,
            })
        })
    }

    /// Run `f` on the caller slot's frame if it is fresh.
    ///
    /// Fails with [`IoError::NotReady`] when no frame has been published.
    pub fn read_caller<R>(&self, f: impl FnOnce(&[u16]) -> IoResult<R>) -> IoResult<R> {
        let claim = self.claim()?;
        if !claim.fresh {
            return Err(IoError::NotReady);
        }
        // SAFETY: the claim gives exclusive access to the caller slot.
        let ring = unsafe { self.slot_mut(claim.slot) };
        f(ring.as_slice())
    }

    /// Copy the latest published frame into `dest`.
    ///
    /// The frame stays fresh, so repeated calls return the same words
    /// until the next boundary. Returns the number of words copied.
    pub fn snapshot_if_fresh(&self, dest: &mut [u16]) -> IoResult<usize> {
        self.read_caller(|frame| {
            let dest = dest.get_mut(..frame.len()).ok_or(IoError::BufferTooSmall)?;
            dest.copy_from_slice(frame);
            Ok(frame.len())
        })
    }

    /// Fill the caller slot through `f` and mark it fresh.
    ///
    /// `len` must equal the configured frame length. Nothing is marked
    /// fresh if `f` fails.
    pub fn stage_with(
        &self,
        len: usize,
        f: impl FnOnce(&mut [u16]) -> IoResult<()>,
    ) -> IoResult<usize> {
        let mut claim = self.claim()?;
        // SAFETY: the claim gives exclusive access to the caller slot.
        let ring = unsafe { self.slot_mut(claim.slot) };
        if ring.is_empty() || len != ring.len() {
            return Err(IoError::SizeMismatch);
        }
        f(ring.as_mut_slice())?;
        claim.mark_fresh = true;
        Ok(len)
    }

    /// Copy `src` into the caller slot for adoption at the next boundary
    pub fn stage_new_frame(&self, src: &[u16]) -> IoResult<usize> {
        self.stage_with(src.len(), |slot| {
            slot.copy_from_slice(src);
            Ok(())
        })
    }
}

impl<const CAP: usize> Default for FrameBufferPair<CAP> {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive claim on the caller slot, released on drop
struct Claim<'a, const CAP: usize> {
    pair: &'a FrameBufferPair<CAP>,
    slot: usize,
    fresh: bool,
    mark_fresh: bool,
}

impl<const CAP: usize> Drop for Claim<'_, CAP> {
    fn drop(&mut self) {
        critical_section::with(|cs| {
            let cell = self.pair.state.borrow(cs);
            let mut state = cell.get();
            state.caller_busy = false;
            if self.mark_fresh {
                state.fresh = true;
            }
            cell.set(state);
        });
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
