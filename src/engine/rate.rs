//! Rate-to-buffer sizing shared by both directions.

use crate::driver::config::TriggerLevel;

/// Buffer sizing for one bus rate.
///
/// One published frame is one subframe: the RX side swaps buffers every
/// `subframe_words` words and the TX side expects frames of exactly that
/// length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RateProfile {
    /// Rate code this row was resolved from (after fallback)
    pub rate_code: u8,
    /// Words in one subframe
    pub subframe_words: usize,
    /// Words held by each buffer of the frame pair
    pub buffer_capacity_words: usize,
    /// Default RX FIFO trigger level
    pub fifo_trigger_level: TriggerLevel,
    /// Words the TX FIFO can accept per trigger interrupt
    pub write_block_words: usize,
}

const fn row(rate_code: u8, trigger: TriggerLevel, write_block_words: usize) -> RateProfile {
    let subframe_words = 64usize << rate_code;
    RateProfile {
        rate_code,
        subframe_words,
        buffer_capacity_words: subframe_words,
        fifo_trigger_level: trigger,
        write_block_words,
    }
}

const TABLE: [RateProfile; 8] = [
    row(0, TriggerLevel::Words8, 16),
    row(1, TriggerLevel::Words16, 32),
    row(2, TriggerLevel::Words32, 64),
    row(3, TriggerLevel::Words64, 128),
    row(4, TriggerLevel::Words128, 256),
    row(5, TriggerLevel::Words256, 512),
    row(6, TriggerLevel::Words256, 512),
    row(7, TriggerLevel::Words256, 512),
];

impl RateProfile {
    /// Look up the profile for a rate code.
    ///
    /// Codes outside 0..=7 fall back to code 0 (64 words/s). The
    /// configuration boundary validates codes before they get here; see
    /// [`DataRate::from_code`](crate::DataRate::from_code).
    #[must_use]
    pub const fn resolve(rate_code: u8) -> Self {
        if (rate_code as usize) < TABLE.len() {
            TABLE[rate_code as usize]
        } else {
            TABLE[0]
        }
    }

    /// Bytes in one frame as seen by block read / block write
    #[must_use]
    pub const fn frame_bytes(&self) -> usize {
        self.buffer_capacity_words * 2
    }
}

impl Default for RateProfile {
    fn default() -> Self {
        TABLE[0]
    }
}
