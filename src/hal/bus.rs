//! Register bus abstraction
//!
//! The channels reach their register blocks through [`RegisterBus`] so the
//! same driver code runs against memory-mapped hardware ([`MmioBus`]) or a
//! host-side mock in tests.
//!
//! All methods take `&self`: the interrupt handler and the caller share the
//! bus, but only ever touch direction-scoped registers.

use crate::internal::register::{read_reg8, read_reg16, read_reg32, write_reg8, write_reg16};

// =============================================================================
// Register Bus Trait
// =============================================================================

/// Byte / word / dword access to one register block at fixed offsets
pub trait RegisterBus {
    /// Read an 8-bit register
    fn read8(&self, offset: usize) -> u8;

    /// Write an 8-bit register
    fn write8(&self, offset: usize, value: u8);

    /// Read a 16-bit register
    fn read16(&self, offset: usize) -> u16;

    /// Write a 16-bit register
    fn write16(&self, offset: usize, value: u16);

    /// Read a 32-bit register
    fn read32(&self, offset: usize) -> u32;

    /// Read-modify-write an 8-bit register
    #[inline]
    fn modify8<F>(&self, offset: usize, f: F)
    where
        F: FnOnce(u8) -> u8,
    {
        let value = self.read8(offset);
        self.write8(offset, f(value));
    }
}

impl<T: RegisterBus + ?Sized> RegisterBus for &T {
    #[inline]
    fn read8(&self, offset: usize) -> u8 {
        (**self).read8(offset)
    }

    #[inline]
    fn write8(&self, offset: usize, value: u8) {
        (**self).write8(offset, value);
    }

    #[inline]
    fn read16(&self, offset: usize) -> u16 {
        (**self).read16(offset)
    }

    #[inline]
    fn write16(&self, offset: usize, value: u16) {
        (**self).write16(offset, value);
    }

    #[inline]
    fn read32(&self, offset: usize) -> u32 {
        (**self).read32(offset)
    }
}

// =============================================================================
// Memory-Mapped Bus
// =============================================================================

/// Volatile access to a register block at a fixed base address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MmioBus {
    base: usize,
}

impl MmioBus {
    /// Create a bus for the register block at `base`.
    ///
    /// # Safety
    ///
    /// `base` must be the address of an ARINC717 RX or TX register block
    /// that stays mapped for the lifetime of the bus, and no other code may
    /// drive the same block.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    /// Base address of the register block
    pub const fn base(&self) -> usize {
        self.base
    }
}

impl RegisterBus for MmioBus {
    #[inline(always)]
    fn read8(&self, offset: usize) -> u8 {
        // SAFETY: base validity is guaranteed by the constructor contract
        unsafe { read_reg8(self.base + offset) }
    }

    #[inline(always)]
    fn write8(&self, offset: usize, value: u8) {
        // SAFETY: base validity is guaranteed by the constructor contract
        unsafe { write_reg8(self.base + offset, value) }
    }

    #[inline(always)]
    fn read16(&self, offset: usize) -> u16 {
        // SAFETY: base validity is guaranteed by the constructor contract
        unsafe { read_reg16(self.base + offset) }
    }

    #[inline(always)]
    fn write16(&self, offset: usize, value: u16) {
        // SAFETY: base validity is guaranteed by the constructor contract
        unsafe { write_reg16(self.base + offset, value) }
    }

    #[inline(always)]
    fn read32(&self, offset: usize) -> u32 {
        // SAFETY: base validity is guaranteed by the constructor contract
        unsafe { read_reg32(self.base + offset) }
    }
}
