//! Receive Block Register Definitions
//!
//! The receive block deserializes the ARINC717 bit stream into 16-bit
//! words, tracks subframe synchronization and queues words in its FIFO.

// =============================================================================
// Register Offsets
// =============================================================================

/// FIFO window offset (word `i` at `RX_FIFO_OFFSET + 2 * i`)
pub const RX_FIFO_OFFSET: usize = 0x000;
/// Status dword: IIR (byte 0), LSR (byte 1), received word count (bytes 2..3)
pub const RX_STAT_OFFSET: usize = 0x800;
/// Line Status Register offset
pub const RX_LSR_OFFSET: usize = 0x801;
/// Received word count register offset (16-bit)
pub const RX_RXC_OFFSET: usize = 0x802;
/// Received word acknowledge register offset (16-bit)
pub const RX_RXA_OFFSET: usize = 0x804;
/// Sub-frame pointer register offset (16-bit)
pub const RX_SUB_PTR_OFFSET: usize = 0x806;
/// Interrupt Enable Register offset
pub const RX_IER_OFFSET: usize = 0x808;
/// Line Control Register offset
pub const RX_LCR_OFFSET: usize = 0x809;
/// FIFO Control Register offset
pub const RX_FCR_OFFSET: usize = 0x80A;
/// Reset Register offset
pub const RX_RST_OFFSET: usize = 0x80B;

// =============================================================================
// Status Dword (RX_STAT) Fields
// =============================================================================

/// IIR byte mask
pub const RX_STAT_IIR_MASK: u32 = 0xFF;
/// LSR byte shift
pub const RX_STAT_LSR_SHIFT: u32 = 8;
/// LSR byte mask (after shift)
pub const RX_STAT_LSR_MASK: u32 = 0xFF;
/// Received word count shift
pub const RX_STAT_RXC_SHIFT: u32 = 16;

// =============================================================================
// Interrupt Identification (IIR) Bits
// =============================================================================

/// Receive line status interrupt pending
pub const RX_IIR_RLS: u8 = 1 << 0;
/// Received data available interrupt pending
pub const RX_IIR_RDA: u8 = 1 << 1;

// =============================================================================
// Line Status Register (LSR) Bits
// =============================================================================

/// Overrun error
pub const RX_LSR_OE: u8 = 1 << 1;
/// Stream interruption error
pub const RX_LSR_SE: u8 = 1 << 2;
/// Lost sync error
pub const RX_LSR_LSE: u8 = 1 << 3;
/// Receiver in sync
pub const RX_LSR_INSYNC: u8 = 1 << 4;
/// Current subframe shift
pub const RX_LSR_SUBFRAME_SHIFT: u8 = 5;
/// Current subframe mask
pub const RX_LSR_SUBFRAME_MASK: u8 = 0x3 << 5;
/// Value written to clear the error flags
pub const RX_LSR_RESET: u8 = RX_LSR_OE | RX_LSR_SE | RX_LSR_LSE;

// =============================================================================
// Interrupt Enable Register (IER) Bits
// =============================================================================

/// Receive line status interrupt enable
pub const RX_IER_RLSIEN: u8 = 1 << 0;
/// Received data available interrupt enable
pub const RX_IER_RDAIEN: u8 = 1 << 1;
/// Default interrupt mask
pub const RX_IER_DEFAULT: u8 = RX_IER_RLSIEN | RX_IER_RDAIEN;

// =============================================================================
// Line Control Register (LCR) Fields
// =============================================================================

/// Sync mode field mask
pub const RX_LCR_SYNC_MASK: u8 = 0x03;
/// Rate code shift
pub const RX_LCR_RATE_SHIFT: u8 = 2;
/// Rate code mask
pub const RX_LCR_RATE_MASK: u8 = 0x07 << 2;
/// Line coding bit (0 = Harvard bi-phase, 1 = bipolar return-to-zero)
pub const RX_LCR_MODE: u8 = 1 << 5;
/// LCR value after reset (full sync, 64 words/s, bi-phase)
pub const RX_LCR_DEFAULT: u8 = 0x02;

// =============================================================================
// FIFO Control Register (FCR) Fields
// =============================================================================

/// Trigger level code mask
pub const RX_FCR_TRIGGER_MASK: u8 = 0x07;

// =============================================================================
// Reset Register (RST) Bits
// =============================================================================

/// Hold the receive block in reset
pub const RX_RST_ASSERT: u8 = 0x01;
/// Release the receive block from reset
pub const RX_RST_RELEASE: u8 = 0x00;
