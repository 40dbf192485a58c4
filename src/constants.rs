//! Centralized Constants
//!
//! This module provides a single source of truth for the magic numbers
//! used throughout the ARINC717 framing driver.
//!
//! # Organization
//!
//! Constants are grouped by category:
//! - **Bus encoding**: ARINC717 sync words and word width
//! - **Frame sizes**: subframe and buffer limits
//! - **Timing**: reconfiguration wait budget
//!
//! # Note
//!
//! Hardware register bit definitions remain in their respective modules
//! (`register/rx.rs`, `register/tx.rs`) as they are specific to those
//! hardware blocks.

// =============================================================================
// Bus Encoding
// =============================================================================

/// Sync words marking the start of subframes 1 through 4
pub const SYNC_WORDS: [u16; 4] = [0x247, 0x5B8, 0xA47, 0xDB8];

/// Number of subframes in one major frame
pub const SUBFRAMES_PER_FRAME: usize = 4;

/// Significant bits in one ARINC717 word
pub const WORD_BITS: u32 = 12;

/// Mask of the significant bits in one ARINC717 word
pub const WORD_MASK: u16 = 0x0FFF;

// =============================================================================
// Frame Sizes
// =============================================================================

/// Subframe length at the slowest rate (64 words/s)
pub const MIN_SUBFRAME_WORDS: usize = 64;

/// Subframe length at the fastest rate (8192 words/s)
pub const MAX_SUBFRAME_WORDS: usize = 8192;

/// Largest TX write block per trigger interrupt
pub const MAX_WRITE_BLOCK_WORDS: usize = 512;

// =============================================================================
// Timing Constants
// =============================================================================

/// Retries waiting for the interrupt handler to exit during reconfiguration
pub const WAIT_RETRIES: u32 = 20;

/// Interval between exit checks in microseconds (100 ms)
pub const WAIT_INTERVAL_US: u32 = 100_000;
