//! Receive-side frame synchronization.
//!
//! [`RxSyncEngine`] holds the interrupt-only receive state: the selected
//! rate profile and sync mode, the synchronization state, and the line
//! error counters. The channel's interrupt handler reads the hardware and
//! feeds the engine; the engine decides where words go and when a frame
//! boundary has been crossed.

use super::buffer::FrameBufferPair;
use super::rate::RateProfile;
use crate::driver::config::SyncMode;
use crate::driver::interrupt::RxLineStatus;

/// Receive synchronization state.
///
/// One-way per configuration epoch: a channel only returns to
/// [`SyncState::Unsynced`] when it is reconfigured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncState {
    /// Waiting for the first data interrupt
    #[default]
    Unsynced,
    /// Frame boundary located
    Synced {
        /// Subframe (0..=3) in progress when sync was acquired
        subframe_index: u8,
        /// Ring index that marks the frame boundary
        sync_position: usize,
    },
}

/// Receive line error counters, reset only on reconfiguration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxErrorCounters {
    /// FIFO overrun events
    pub overrun: u32,
    /// Stream interruption events
    pub stream_interruption: u32,
    /// Lost sync events
    pub lost_sync: u32,
}

impl RxErrorCounters {
    /// Count every error flagged in `status`; returns whether any was
    pub fn record(&mut self, status: RxLineStatus) -> bool {
        if status.overrun {
            self.overrun = self.overrun.saturating_add(1);
        }
        if status.stream_interruption {
            self.stream_interruption = self.stream_interruption.saturating_add(1);
        }
        if status.lost_sync {
            self.lost_sync = self.lost_sync.saturating_add(1);
        }
        status.has_error()
    }

    /// Sum of all counters
    pub fn total(&self) -> u32 {
        self.overrun
            .saturating_add(self.stream_interruption)
            .saturating_add(self.lost_sync)
    }
}

/// Result of draining one burst of words
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Words stored in the ring
    pub drained: usize,
    /// Frame boundaries crossed
    pub boundaries: u32,
    /// Boundaries that published a frame to the caller
    pub published: u32,
}

/// Interrupt-side receive state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxSyncEngine {
    profile: RateProfile,
    sync_mode: SyncMode,
    state: SyncState,
    counters: RxErrorCounters,
    data_irqs: u32,
    boundaries: u32,
    skipped: u32,
}

impl Default for RxSyncEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RxSyncEngine {
    /// Engine at the default rate (64 words/s) with full sync
    #[must_use]
    pub const fn new() -> Self {
        Self {
            profile: RateProfile::resolve(0),
            sync_mode: SyncMode::Full,
            state: SyncState::Unsynced,
            counters: RxErrorCounters {
                overrun: 0,
                stream_interruption: 0,
                lost_sync: 0,
            },
            data_irqs: 0,
            boundaries: 0,
            skipped: 0,
        }
    }

    /// Start a new configuration epoch
    pub fn configure(&mut self, profile: RateProfile, sync_mode: SyncMode) {
        *self = Self {
            profile,
            sync_mode,
            ..Self::new()
        };
    }

    /// Selected rate profile
    pub const fn profile(&self) -> RateProfile {
        self.profile
    }

    /// Selected sync mode
    pub const fn sync_mode(&self) -> SyncMode {
        self.sync_mode
    }

    /// Current synchronization state
    pub const fn state(&self) -> SyncState {
        self.state
    }

    /// Whether the frame boundary has been located
    pub const fn is_synced(&self) -> bool {
        matches!(self.state, SyncState::Synced { .. })
    }

    /// Line error counters
    pub const fn counters(&self) -> RxErrorCounters {
        self.counters
    }

    /// Data interrupts serviced in this epoch
    pub const fn data_irqs(&self) -> u32 {
        self.data_irqs
    }

    /// Frame boundaries crossed in this epoch
    pub const fn boundaries(&self) -> u32 {
        self.boundaries
    }

    /// Boundaries that could not publish because the caller held its buffer
    pub const fn skipped_frames(&self) -> u32 {
        self.skipped
    }

    /// Whether the hardware line status lets a data event through
    pub const fn accepts(&self, lsr: RxLineStatus) -> bool {
        !self.sync_mode.requires_lock() || lsr.in_sync
    }

    /// Record a line status event; returns whether any error was counted
    pub fn record_line_errors(&mut self, lsr: RxLineStatus) -> bool {
        self.counters.record(lsr)
    }

    /// Note a data-available interrupt
    pub fn note_data_irq(&mut self) {
        self.data_irqs = self.data_irqs.wrapping_add(1);
    }

    /// Locate the frame boundary from the hardware subframe position.
    ///
    /// Only the first call in an epoch has an effect: the boundary is
    /// `subframe_index * subframe_words + pointer`, reduced modulo the ring
    /// capacity, and the ring head is moved there. Returns the boundary.
    pub fn acquire<const CAP: usize>(
        &mut self,
        subframe_index: u8,
        pointer: usize,
        frames: &FrameBufferPair<CAP>,
    ) -> usize {
        if let SyncState::Synced { sync_position, .. } = self.state {
            return sync_position;
        }

        let subframe_index = subframe_index & 0x3;
        let raw = subframe_index as usize * self.profile.subframe_words + pointer;
        let sync_position = raw % self.profile.buffer_capacity_words;
        frames.set_head(sync_position);
        self.state = SyncState::Synced {
            subframe_index,
            sync_position,
        };

        #[cfg(feature = "defmt")]
        defmt::info!(
            "RX sync acquired: subframe={} pointer={} position={}",
            subframe_index,
            pointer,
            sync_position
        );

        sync_position
    }

    /// Store a burst of words, publishing a frame at every boundary.
    ///
    /// Words drained before sync is acquired are stored but never cross a
    /// boundary.
    pub fn drain<const CAP: usize, I>(
        &mut self,
        words: I,
        frames: &FrameBufferPair<CAP>,
    ) -> DrainReport
    where
        I: IntoIterator<Item = u16>,
    {
        let boundary = match self.state {
            SyncState::Synced { sync_position, .. } => Some(sync_position),
            SyncState::Unsynced => None,
        };

        let mut report = DrainReport::default();
        for word in words {
            let head = frames.write_word(word);
            report.drained += 1;

            if boundary == Some(head) {
                report.boundaries += 1;
                if frames.mark_boundary_reached() {
                    report.published += 1;
                } else {
                    self.skipped = self.skipped.wrapping_add(1);
                }
            }
        }

        self.boundaries = self.boundaries.wrapping_add(report.boundaries);

        #[cfg(feature = "defmt")]
        if report.published > 0 {
            defmt::debug!("RX frame published ({} words drained)", report.drained);
        }

        report
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
