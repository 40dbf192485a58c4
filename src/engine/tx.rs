//! Transmit-side cyclic retransmission.
//!
//! [`TxCycleEngine`] refills the hardware FIFO from the hardware slot of a
//! [`FrameBufferPair`]. When a frame runs out it either adopts a freshly
//! staged frame or rewinds and repeats the current one, so the bus never
//! starves while a frame has been armed.

use super::buffer::FrameBufferPair;
use super::rate::RateProfile;

/// Transmit phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxPhase {
    /// No frame has been adopted yet
    #[default]
    Idle,
    /// Retransmitting the current frame
    Cycling,
}

/// Transmit line error counters, reset only on reconfiguration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxErrorCounters {
    /// FIFO underflow events
    pub underflow: u32,
}

/// Result of one FIFO refill
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillReport {
    /// Words handed to the FIFO
    pub written: usize,
    /// Staged frames adopted at a frame boundary
    pub adopted: u32,
    /// Frame boundaries where the current frame was repeated
    pub repeated: u32,
}

/// Interrupt-side transmit state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxCycleEngine {
    profile: RateProfile,
    phase: TxPhase,
    counters: TxErrorCounters,
    frames_started: u32,
    since_adoption: u32,
    adoptions: u32,
}

impl Default for TxCycleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TxCycleEngine {
    /// Engine at the default rate (64 words/s)
    #[must_use]
    pub const fn new() -> Self {
        Self {
            profile: RateProfile::resolve(0),
            phase: TxPhase::Idle,
            counters: TxErrorCounters { underflow: 0 },
            frames_started: 0,
            since_adoption: 0,
            adoptions: 0,
        }
    }

    /// Start a new configuration epoch
    pub fn configure(&mut self, profile: RateProfile) {
        *self = Self {
            profile,
            ..Self::new()
        };
    }

    /// Selected rate profile
    pub const fn profile(&self) -> RateProfile {
        self.profile
    }

    /// Current phase
    pub const fn phase(&self) -> TxPhase {
        self.phase
    }

    /// Line error counters
    pub const fn counters(&self) -> TxErrorCounters {
        self.counters
    }

    /// Frames started (adopted or repeated) in this epoch
    pub const fn frames_started(&self) -> u32 {
        self.frames_started
    }

    /// Frames started since the current frame was adopted
    pub const fn frames_since_adoption(&self) -> u32 {
        self.since_adoption
    }

    /// Staged frames adopted in this epoch
    pub const fn adoptions(&self) -> u32 {
        self.adoptions
    }

    /// Whether a trigger interrupt has anything to send
    pub fn has_work<const CAP: usize>(&self, frames: &FrameBufferPair<CAP>) -> bool {
        self.phase == TxPhase::Cycling || frames.is_fresh()
    }

    /// Count an underflow; returns the new count
    pub fn record_underflow(&mut self) -> u32 {
        self.counters.underflow = self.counters.underflow.saturating_add(1);
        self.counters.underflow
    }

    /// Next word to transmit.
    ///
    /// At a frame boundary a staged frame is adopted if one is fresh,
    /// otherwise the current frame is rewound. Returns `None` while idle
    /// with nothing staged.
    pub fn next_word<const CAP: usize>(
        &mut self,
        frames: &FrameBufferPair<CAP>,
        report: &mut FillReport,
    ) -> Option<u16> {
        if frames.remaining() == 0 {
            if frames.adopt_if_fresh() {
                self.phase = TxPhase::Cycling;
                self.adoptions = self.adoptions.wrapping_add(1);
                self.since_adoption = 0;
                report.adopted += 1;

                #[cfg(feature = "defmt")]
                defmt::debug!("TX frame adopted ({} words)", frames.remaining());
            } else if self.phase == TxPhase::Cycling {
                frames.rewind();
                report.repeated += 1;
            } else {
                return None;
            }
            self.frames_started = self.frames_started.wrapping_add(1);
            self.since_adoption = self.since_adoption.wrapping_add(1);
        }
        frames.read_word()
    }

    /// Produce up to `space` words, handing each to `emit` with its FIFO slot
    pub fn fill<const CAP: usize>(
        &mut self,
        space: usize,
        frames: &FrameBufferPair<CAP>,
        mut emit: impl FnMut(usize, u16),
    ) -> FillReport {
        let mut report = FillReport::default();
        for slot in 0..space {
            let Some(word) = self.next_word(frames, &mut report) else {
                break;
            };
            emit(slot, word);
            report.written += 1;
        }
        report
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
