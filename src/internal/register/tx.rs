//! Transmit Block Register Definitions
//!
//! The transmit block serializes 16-bit words from its FIFO onto the bus
//! and raises a trigger interrupt when the FIFO has room for another block.

// =============================================================================
// Register Offsets
// =============================================================================

/// FIFO window offset (word `i` at `TX_FIFO_OFFSET + 2 * i`)
pub const TX_FIFO_OFFSET: usize = 0x000;
/// Interrupt Identification Register offset
pub const TX_IIR_OFFSET: usize = 0x800;
/// Line Status Register offset
pub const TX_LSR_OFFSET: usize = 0x801;
/// FIFO occupancy register offset (16-bit)
pub const TX_TXC_OFFSET: usize = 0x802;
/// Written word acknowledge register offset (16-bit)
pub const TX_TXA_OFFSET: usize = 0x804;
/// Sub-frame pointer register offset (16-bit)
pub const TX_SUB_PTR_OFFSET: usize = 0x806;
/// Interrupt Enable Register offset
pub const TX_IER_OFFSET: usize = 0x808;
/// Line Control Register offset
pub const TX_LCR_OFFSET: usize = 0x809;
/// FIFO Control Register offset
pub const TX_FCR_OFFSET: usize = 0x80A;
/// Reset Register offset
pub const TX_RST_OFFSET: usize = 0x80B;

// =============================================================================
// Interrupt Identification (IIR) Bits
// =============================================================================

/// Transmit line status (underflow) interrupt pending
pub const TX_IIR_TLS: u8 = 1 << 0;
/// Transmit space available (trigger level) interrupt pending
pub const TX_IIR_TSA: u8 = 1 << 1;

// =============================================================================
// Line Status Register (LSR) Bits
// =============================================================================

/// FIFO underflow error
pub const TX_LSR_UNDERFLOW: u8 = 1 << 0;
/// Value written to clear the underflow condition
pub const TX_LSR_RESET: u8 = 0x81;

// =============================================================================
// Interrupt Enable Register (IER) Bits
// =============================================================================

/// Transmit line status interrupt enable
pub const TX_IER_TLSIEN: u8 = 1 << 0;
/// Transmit space available interrupt enable
pub const TX_IER_TSAIEN: u8 = 1 << 1;
/// Default interrupt mask
pub const TX_IER_DEFAULT: u8 = TX_IER_TLSIEN | TX_IER_TSAIEN;

// =============================================================================
// Line Control Register (LCR) Fields
// =============================================================================

/// Internal loopback enable
pub const TX_LCR_LOOPBACK: u8 = 1 << 0;
/// Rate code shift
pub const TX_LCR_RATE_SHIFT: u8 = 2;
/// Rate code mask
pub const TX_LCR_RATE_MASK: u8 = 0x07 << 2;
/// Line coding bit (0 = Harvard bi-phase, 1 = bipolar return-to-zero)
pub const TX_LCR_MODE: u8 = 1 << 5;
/// LCR value after reset
pub const TX_LCR_DEFAULT: u8 = 0x80;

// =============================================================================
// FIFO Control Register (FCR) Fields
// =============================================================================

/// Trigger level code mask
pub const TX_FCR_TRIGGER_MASK: u8 = 0x07;

// =============================================================================
// Reset Register (RST) Bits
// =============================================================================

/// Hold the transmit block in reset
pub const TX_RST_ASSERT: u8 = 0x01;
/// Release the transmit block from reset
pub const TX_RST_RELEASE: u8 = 0x00;
