//! Interrupt status handling for the ARINC717 RX and TX blocks.
//!
//! This module provides [`RxInterruptStatus`] / [`TxInterruptStatus`] for
//! parsing the interrupt identification and line status registers, and
//! [`IrqResult`] for reporting back to a shared interrupt dispatcher.

use crate::internal::register::rx::{
    RX_IIR_RDA, RX_IIR_RLS, RX_LSR_INSYNC, RX_LSR_LSE, RX_LSR_OE, RX_LSR_SE,
    RX_LSR_SUBFRAME_MASK, RX_LSR_SUBFRAME_SHIFT, RX_STAT_IIR_MASK, RX_STAT_LSR_MASK,
    RX_STAT_LSR_SHIFT, RX_STAT_RXC_SHIFT,
};
use crate::internal::register::tx::{TX_IIR_TLS, TX_IIR_TSA, TX_LSR_UNDERFLOW};

/// Outcome of an interrupt handler invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqResult {
    /// The interrupt was raised by this channel and has been serviced
    Handled,
    /// The interrupt was not raised by this channel
    NotMine,
}

// =============================================================================
// Receive Line Status
// =============================================================================

/// Receive line status flags parsed from the LSR byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxLineStatus {
    /// FIFO overrun - words were lost
    pub overrun: bool,
    /// Bit stream stopped mid-frame
    pub stream_interruption: bool,
    /// Receiver lost subframe synchronization
    pub lost_sync: bool,
    /// Receiver currently locked to the sync word pattern
    pub in_sync: bool,
    /// Subframe currently being received (0..=3)
    pub subframe: u8,
}

impl RxLineStatus {
    /// Create from the raw LSR value
    #[inline]
    pub const fn from_raw(lsr: u8) -> Self {
        Self {
            overrun: (lsr & RX_LSR_OE) != 0,
            stream_interruption: (lsr & RX_LSR_SE) != 0,
            lost_sync: (lsr & RX_LSR_LSE) != 0,
            in_sync: (lsr & RX_LSR_INSYNC) != 0,
            subframe: (lsr & RX_LSR_SUBFRAME_MASK) >> RX_LSR_SUBFRAME_SHIFT,
        }
    }

    /// Check if any line error is flagged
    #[inline]
    pub const fn has_error(&self) -> bool {
        self.overrun || self.stream_interruption || self.lost_sync
    }
}

// =============================================================================
// Receive Interrupt Status
// =============================================================================

/// Receive interrupt status parsed from the status dword.
///
/// The status dword packs IIR (byte 0), LSR (byte 1) and the received
/// word count (upper half) so one read captures a consistent snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxInterruptStatus {
    /// Line status (error) interrupt pending
    pub line_status: bool,
    /// Data available interrupt pending
    pub data_available: bool,
    /// Line status register contents
    pub lsr: RxLineStatus,
    /// Words waiting in the FIFO
    pub received_words: u16,
}

impl RxInterruptStatus {
    /// Create from the raw status dword
    #[inline]
    pub const fn from_raw(stat: u32) -> Self {
        let iir = (stat & RX_STAT_IIR_MASK) as u8;
        let lsr = ((stat >> RX_STAT_LSR_SHIFT) & RX_STAT_LSR_MASK) as u8;
        Self {
            line_status: (iir & RX_IIR_RLS) != 0,
            data_available: (iir & RX_IIR_RDA) != 0,
            lsr: RxLineStatus::from_raw(lsr),
            received_words: (stat >> RX_STAT_RXC_SHIFT) as u16,
        }
    }

    /// Check if any interrupt is pending
    #[inline]
    pub const fn any(&self) -> bool {
        self.line_status || self.data_available
    }
}

// =============================================================================
// Transmit Interrupt Status
// =============================================================================

/// Transmit interrupt status parsed from the IIR and LSR bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxInterruptStatus {
    /// Line status (underflow) interrupt pending
    pub line_status: bool,
    /// FIFO space available (trigger level) interrupt pending
    pub space_available: bool,
    /// FIFO ran empty while transmitting
    pub underflow: bool,
}

impl TxInterruptStatus {
    /// Create from the raw IIR and LSR values
    #[inline]
    pub const fn from_raw(iir: u8, lsr: u8) -> Self {
        Self {
            line_status: (iir & TX_IIR_TLS) != 0,
            space_available: (iir & TX_IIR_TSA) != 0,
            underflow: (lsr & TX_LSR_UNDERFLOW) != 0,
        }
    }

    /// Check if any interrupt is pending
    #[inline]
    pub const fn any(&self) -> bool {
        self.line_status || self.space_available
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
