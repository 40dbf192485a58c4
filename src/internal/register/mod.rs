//! Memory-mapped register definitions for the ARINC717 RX and TX blocks
//!
//! Each direction owns a separate register block with the same layout:
//! status, line-status, word count, acknowledge, sub-frame pointer,
//! interrupt enable, line control, FIFO control and reset. The FIFO
//! window sits at the start of the block, one 16-bit word every 2 bytes.
//!
//! All register access is volatile to ensure proper hardware interaction.

pub mod rx;
pub mod tx;

/// Offset of FIFO word `index` inside the FIFO window
#[inline(always)]
pub const fn fifo_offset(index: usize) -> usize {
    index * 2
}

/// Read an 8-bit register at the given address
///
/// # Safety
/// The caller must ensure the address is valid.
#[inline(always)]
pub unsafe fn read_reg8(addr: usize) -> u8 {
    unsafe { core::ptr::read_volatile(addr as *const u8) }
}

/// Write an 8-bit value to a register at the given address
///
/// # Safety
/// The caller must ensure the address is valid.
#[inline(always)]
pub unsafe fn write_reg8(addr: usize, value: u8) {
    unsafe { core::ptr::write_volatile(addr as *mut u8, value) }
}

/// Read a 16-bit register at the given address
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn read_reg16(addr: usize) -> u16 {
    unsafe { core::ptr::read_volatile(addr as *const u16) }
}

/// Write a 16-bit value to a register at the given address
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn write_reg16(addr: usize, value: u16) {
    unsafe { core::ptr::write_volatile(addr as *mut u16, value) }
}

/// Read a 32-bit register at the given address
///
/// # Safety
/// The caller must ensure the address is valid and properly aligned.
#[inline(always)]
pub unsafe fn read_reg32(addr: usize) -> u32 {
    unsafe { core::ptr::read_volatile(addr as *const u32) }
}
