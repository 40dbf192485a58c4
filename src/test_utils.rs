//! Testing utilities and mock implementations
//!
//! This module provides mock implementations for testing the channels
//! on the host without hardware access.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::cell::RefCell;
use std::boxed::Box;
use std::collections::HashMap;
use std::sync::Mutex;
use std::vec::Vec;

use crate::hal::bus::RegisterBus;
use crate::hal::signal::{SignalKind, SignalSink};

// =============================================================================
// Mock Register Bus
// =============================================================================

/// Register window of the FIFO (word `i` at byte offset `2 * i`)
const FIFO_WINDOW_END: usize = 0x800;
/// Interrupt identification byte (low byte of the RX status dword)
const IIR: usize = 0x800;
/// Line status byte
const LSR: usize = 0x801;
/// Word count register (RXC / TXC)
const COUNT: usize = 0x802;
/// Acknowledge register (RXA / TXA)
const ACK: usize = 0x804;
/// Subframe pointer register
const SUB_PTR: usize = 0x806;

/// Line status interrupt bit (RLS / TLS)
const IIR_LINE: u8 = 1 << 0;
/// Data interrupt bit (RDA / TSA)
const IIR_DATA: u8 = 1 << 1;

/// Which register block the mock imitates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockDirection {
    /// Receive block: the FIFO window is read, RXA consumes words
    #[default]
    Rx,
    /// Transmit block: the FIFO window is written, TXA adds occupancy
    Tx,
}

/// Mock register block for testing channels without hardware
///
/// Registers are stored byte by byte, so the RX status dword at 0x800
/// overlaps the LSR and RXC registers exactly as on the device. A few
/// offsets have side effects:
///
/// - Writing the LSR clears the written bits and the line status interrupt.
/// - Writing RXA subtracts from RXC and clears the data interrupt once the
///   FIFO is empty.
/// - Writing TXA adds to TXC and clears the trigger interrupt.
/// - Writing a TX FIFO slot appends the word to [`Self::tx_words`].
///
/// # Example
///
/// ```ignore
/// let bus = MockRegisterBus::rx();
/// bus.load_rx_words(&[0x247, 1, 2]);
/// let channel: RxChannel<_, 64> = RxChannel::new(&bus);
/// ```
#[derive(Debug, Default)]
pub struct MockRegisterBus {
    direction: MockDirection,
    /// Register bytes: offset -> value
    bytes: RefCell<HashMap<usize, u8>>,
    /// Record of writes: (offset, value)
    write_log: RefCell<Vec<(usize, u32)>>,
    /// Words written into the TX FIFO window
    tx_fifo: RefCell<Vec<u16>>,
}

impl MockRegisterBus {
    /// Create a mock receive block
    pub fn rx() -> Self {
        Self::default()
    }

    /// Create a mock transmit block
    pub fn tx() -> Self {
        Self {
            direction: MockDirection::Tx,
            ..Self::default()
        }
    }

    fn get(&self, offset: usize) -> u8 {
        self.bytes.borrow().get(&offset).copied().unwrap_or(0)
    }

    fn put(&self, offset: usize, value: u8) {
        self.bytes.borrow_mut().insert(offset, value);
    }

    fn get16(&self, offset: usize) -> u16 {
        u16::from_le_bytes([self.get(offset), self.get(offset + 1)])
    }

    fn put16(&self, offset: usize, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.put(offset, lo);
        self.put(offset + 1, hi);
    }

    /// Set an 8-bit register without logging
    pub fn set_register8(&self, offset: usize, value: u8) {
        self.put(offset, value);
    }

    /// Set a 16-bit register without logging
    pub fn set_register16(&self, offset: usize, value: u16) {
        self.put16(offset, value);
    }

    /// Current value of an 8-bit register
    pub fn register8(&self, offset: usize) -> u8 {
        self.get(offset)
    }

    /// Current value of a 16-bit register
    pub fn register16(&self, offset: usize) -> u16 {
        self.get16(offset)
    }

    /// All writes made through the bus
    pub fn writes(&self) -> Vec<(usize, u32)> {
        self.write_log.borrow().clone()
    }

    /// Values written to one offset, oldest first
    pub fn writes_to(&self, offset: usize) -> Vec<u32> {
        self.write_log
            .borrow()
            .iter()
            .filter(|(o, _)| *o == offset)
            .map(|(_, v)| *v)
            .collect()
    }

    /// Clear the write log
    pub fn clear_writes(&self) {
        self.write_log.borrow_mut().clear();
    }

    // =========================================================================
    // Receive Helpers
    // =========================================================================

    /// Place `words` in the RX FIFO and raise the data interrupt
    pub fn load_rx_words(&self, words: &[u16]) {
        for (i, word) in words.iter().enumerate() {
            self.put16(i * 2, *word);
        }
        self.put16(COUNT, words.len() as u16);
        self.put(IIR, self.get(IIR) | IIR_DATA);
    }

    /// Set the line status byte
    pub fn set_lsr(&self, lsr: u8) {
        self.put(LSR, lsr);
    }

    /// Set the subframe pointer register
    pub fn set_sub_ptr(&self, pointer: u16) {
        self.put16(SUB_PTR, pointer);
    }

    /// Raise a line status interrupt with `lsr_bits` set
    pub fn raise_line_status(&self, lsr_bits: u8) {
        self.put(LSR, self.get(LSR) | lsr_bits);
        self.put(IIR, self.get(IIR) | IIR_LINE);
    }

    // =========================================================================
    // Transmit Helpers
    // =========================================================================

    /// Raise the trigger-level interrupt
    pub fn raise_tx_trigger(&self) {
        self.put(IIR, self.get(IIR) | IIR_DATA);
    }

    /// Simulate the line shifting `count` words out of the TX FIFO
    pub fn shift_out(&self, count: u16) {
        self.put16(COUNT, self.get16(COUNT).saturating_sub(count));
    }

    /// Words written into the TX FIFO window, oldest first
    pub fn tx_words(&self) -> Vec<u16> {
        self.tx_fifo.borrow().clone()
    }
}

impl RegisterBus for MockRegisterBus {
    fn read8(&self, offset: usize) -> u8 {
        self.get(offset)
    }

    fn write8(&self, offset: usize, value: u8) {
        self.write_log.borrow_mut().push((offset, value as u32));
        if offset == LSR {
            // Write-1-to-clear, also drops the line status interrupt
            self.put(LSR, self.get(LSR) & !value);
            self.put(IIR, self.get(IIR) & !IIR_LINE);
        } else {
            self.put(offset, value);
        }
    }

    fn read16(&self, offset: usize) -> u16 {
        self.get16(offset)
    }

    fn write16(&self, offset: usize, value: u16) {
        self.write_log.borrow_mut().push((offset, value as u32));
        match (self.direction, offset) {
            (MockDirection::Tx, o) if o < FIFO_WINDOW_END => {
                self.tx_fifo.borrow_mut().push(value);
            }
            (MockDirection::Rx, ACK) => {
                let left = self.get16(COUNT).saturating_sub(value);
                self.put16(COUNT, left);
                if left == 0 {
                    self.put(IIR, self.get(IIR) & !IIR_DATA);
                }
            }
            (MockDirection::Tx, ACK) => {
                self.put16(COUNT, self.get16(COUNT).saturating_add(value));
                self.put(IIR, self.get(IIR) & !IIR_DATA);
            }
            _ => self.put16(offset, value),
        }
    }

    fn read32(&self, offset: usize) -> u32 {
        u32::from_le_bytes([
            self.get(offset),
            self.get(offset + 1),
            self.get(offset + 2),
            self.get(offset + 3),
        ])
    }
}

// =============================================================================
// Mock Delay
// =============================================================================

/// Mock delay for testing without actual timing
///
/// Records delays for verification without actually waiting.
#[derive(Debug, Default)]
pub struct MockDelay {
    /// Total nanoseconds delayed
    total_ns: RefCell<u64>,
    /// Number of individual delay calls
    calls: RefCell<u32>,
}

impl MockDelay {
    /// Create a new mock delay
    pub fn new() -> Self {
        Self::default()
    }

    /// Get total nanoseconds that were "delayed"
    pub fn total_ns(&self) -> u64 {
        *self.total_ns.borrow()
    }

    /// Get total milliseconds that were "delayed"
    pub fn total_ms(&self) -> u64 {
        self.total_ns() / 1_000_000
    }

    /// Number of delay calls
    pub fn calls(&self) -> u32 {
        *self.calls.borrow()
    }

    /// Reset the delay counter
    pub fn reset(&self) {
        *self.total_ns.borrow_mut() = 0;
        *self.calls.borrow_mut() = 0;
    }
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        *self.total_ns.borrow_mut() += ns as u64;
        *self.calls.borrow_mut() += 1;
    }

    fn delay_us(&mut self, us: u32) {
        self.delay_ns(us.saturating_mul(1_000));
    }
}

// =============================================================================
// Counting Sink
// =============================================================================

/// Notification sink that counts deliveries per kind
#[derive(Debug, Default)]
pub struct CountingSink {
    counts: Mutex<[u32; 4]>,
}

impl CountingSink {
    /// Create a sink with `'static` lifetime for installing on a signal
    pub fn leak() -> &'static Self {
        Box::leak(Box::default())
    }

    const fn index(kind: SignalKind) -> usize {
        match kind {
            SignalKind::RxFrame => 0,
            SignalKind::RxError => 1,
            SignalKind::TxFrame => 2,
            SignalKind::TxError => 3,
        }
    }

    /// Notifications received of `kind`
    pub fn count(&self, kind: SignalKind) -> u32 {
        self.counts.lock().map(|c| c[Self::index(kind)]).unwrap_or(0)
    }

    /// Notifications received of any kind
    pub fn total(&self) -> u32 {
        self.counts.lock().map(|c| c.iter().sum()).unwrap_or(0)
    }
}

impl SignalSink for CountingSink {
    fn notify(&self, kind: SignalKind) {
        if let Ok(mut counts) = self.counts.lock() {
            counts[Self::index(kind)] += 1;
        }
    }
}

// =============================================================================
// Self Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_dword_overlaps_byte_registers() {
        let bus = MockRegisterBus::rx();
        bus.set_lsr(0x10);
        bus.load_rx_words(&[1, 2, 3]);

        let stat = bus.read32(IIR);
        assert_eq!(stat & 0xFF, IIR_DATA as u32);
        assert_eq!((stat >> 8) & 0xFF, 0x10);
        assert_eq!(stat >> 16, 3);
        assert_eq!(bus.read16(2), 2);
    }

    #[test]
    fn rx_ack_consumes_words() {
        let bus = MockRegisterBus::rx();
        bus.load_rx_words(&[1, 2, 3]);
        bus.write16(ACK, 2);
        assert_eq!(bus.register16(COUNT), 1);
        assert_ne!(bus.register8(IIR) & IIR_DATA, 0);
        bus.write16(ACK, 1);
        assert_eq!(bus.register8(IIR) & IIR_DATA, 0);
    }

    #[test]
    fn lsr_write_clears_bits() {
        let bus = MockRegisterBus::rx();
        bus.raise_line_status(0x12);
        bus.write8(LSR, 0x02);
        assert_eq!(bus.register8(LSR), 0x10);
        assert_eq!(bus.register8(IIR) & IIR_LINE, 0);
        assert_eq!(bus.writes_to(LSR), [0x02]);
    }

    #[test]
    fn tx_fifo_writes_are_captured() {
        let bus = MockRegisterBus::tx();
        bus.raise_tx_trigger();
        bus.write16(0, 7);
        bus.write16(2, 8);
        bus.write16(ACK, 2);
        assert_eq!(bus.tx_words(), [7, 8]);
        assert_eq!(bus.register16(COUNT), 2);
        assert_eq!(bus.register8(IIR) & IIR_DATA, 0);

        bus.shift_out(2);
        assert_eq!(bus.register16(COUNT), 0);
    }

    #[test]
    fn counting_sink_counts_per_kind() {
        let sink = CountingSink::leak();
        sink.notify(SignalKind::RxFrame);
        sink.notify(SignalKind::RxFrame);
        sink.notify(SignalKind::TxError);
        assert_eq!(sink.count(SignalKind::RxFrame), 2);
        assert_eq!(sink.count(SignalKind::TxError), 1);
        assert_eq!(sink.total(), 3);
    }
}
