//! ARINC717 transmit channel
//!
//! [`TxChannel`] keeps the transmit FIFO fed from a [`FrameBufferPair`]. The
//! caller stages a frame with [`TxChannel::block_write`]; the interrupt
//! handler adopts it at the next frame boundary and repeats it until a
//! newer frame is staged.

use embedded_hal::delay::DelayNs;

use super::config::{DataRate, LineCoding, State, TriggerLevel, TxConfig};
use crate::error::{BufferError, ConfigError, IoError, IoResult, Result};
use super::interrupt::{IrqResult, TxInterruptStatus};
use crate::engine::{FrameBufferPair, TxCycleEngine, TxErrorCounters, TxPhase};
use crate::hal::bus::RegisterBus;
use crate::hal::signal::{Signal, SignalKind, SignalSink};
use crate::internal::register::fifo_offset;
use crate::internal::register::tx::{
    TX_FCR_OFFSET, TX_FCR_TRIGGER_MASK, TX_IER_DEFAULT, TX_IER_OFFSET, TX_IER_TLSIEN,
    TX_IER_TSAIEN, TX_IIR_OFFSET, TX_LCR_DEFAULT, TX_LCR_LOOPBACK, TX_LCR_MODE, TX_LCR_OFFSET,
    TX_LCR_RATE_MASK, TX_LCR_RATE_SHIFT, TX_LSR_OFFSET, TX_LSR_RESET, TX_RST_ASSERT,
    TX_RST_OFFSET, TX_RST_RELEASE, TX_TXA_OFFSET, TX_TXC_OFFSET,
};
use crate::sync::{CriticalSectionCell, IsrHandshake};

/// Line control value for a transmit configuration
const fn line_control(config: &TxConfig) -> u8 {
    let mut lcr = TX_LCR_DEFAULT;
    lcr |= (config.rate.code() << TX_LCR_RATE_SHIFT) & TX_LCR_RATE_MASK;
    if config.line_coding.is_bit_set() {
        lcr |= TX_LCR_MODE;
    }
    if config.loopback {
        lcr |= TX_LCR_LOOPBACK;
    }
    lcr
}

// =============================================================================
// Transmit Channel
// =============================================================================

/// ARINC717 transmit channel
///
/// # Type Parameters
/// * `B` - Register access for the transmit block
/// * `CAP` - Words of static storage per frame buffer
///
/// # Example
/// ```ignore
/// static TX: TxChannelDefault<MmioBus> = TxChannel::new(unsafe { MmioBus::new(0x4000_1000) });
///
/// TX.init(TxConfig::new(), &mut delay)?;
/// TX.block_write(&frame_bytes)?;
///
/// #[interrupt]
/// fn ARINC_TX() {
///     TX.on_interrupt();
/// }
/// ```
pub struct TxChannel<B: RegisterBus, const CAP: usize> {
    bus: B,
    engine: CriticalSectionCell<TxCycleEngine>,
    frames: FrameBufferPair<CAP>,
    frame_signal: Signal,
    error_signal: Signal,
    handshake: IsrHandshake,
    config: CriticalSectionCell<TxConfig>,
    state: CriticalSectionCell<State>,
}

impl<B: RegisterBus, const CAP: usize> TxChannel<B, CAP> {
    /// Create a new transmit channel in the `Uninitialized` state
    pub const fn new(bus: B) -> Self {
        Self {
            bus,
            engine: CriticalSectionCell::new(TxCycleEngine::new()),
            frames: FrameBufferPair::new(),
            frame_signal: Signal::new(),
            error_signal: Signal::new(),
            handshake: IsrHandshake::new(),
            config: CriticalSectionCell::new(TxConfig::new()),
            state: CriticalSectionCell::new(State::Uninitialized),
        }
    }

    /// Get the current state
    #[inline(always)]
    pub fn state(&self) -> State {
        self.state.get()
    }

    /// Get the current configuration
    #[inline(always)]
    pub fn config(&self) -> TxConfig {
        self.config.get()
    }

    /// Register block
    pub fn bus(&self) -> &B {
        &self.bus
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Configure the channel
    ///
    /// Only the line status interrupt is armed until a frame is staged.
    ///
    /// # Errors
    /// - `CapacityExceeded` - the rate needs more than `CAP` words per buffer
    /// - `Busy` - the interrupt handler did not exit within the retry budget
    pub fn init<D: DelayNs>(&self, config: TxConfig, delay: &mut D) -> Result<()> {
        self.apply(config, delay)?;

        #[cfg(feature = "defmt")]
        defmt::info!(
            "TX channel running: {} words/s, loopback {}",
            config.rate.words_per_sec(),
            config.loopback
        );

        Ok(())
    }

    /// Stop transmitting and release the buffers
    pub fn shutdown<D: DelayNs>(&self, delay: &mut D) -> Result<()> {
        match self.state() {
            State::Uninitialized => return Err(ConfigError::Unconfigured.into()),
            State::Shutdown => return Ok(()),
            State::Running => {}
        }

        let previous_ier = self.bus.read8(TX_IER_OFFSET);
        self.handshake
            .quiesce(self.config().quiesce, delay, || {
                self.bus.write8(TX_IER_OFFSET, 0);
            })
            .inspect_err(|_| self.bus.write8(TX_IER_OFFSET, previous_ier))?;

        self.bus.write8(TX_RST_OFFSET, TX_RST_ASSERT);
        if let Err(e) = self.frames.release() {
            self.resume(previous_ier);
            return Err(e);
        }
        self.state.with(|state| *state = State::Shutdown);

        #[cfg(feature = "defmt")]
        defmt::info!("TX channel shut down");

        Ok(())
    }

    fn apply<D: DelayNs>(&self, config: TxConfig, delay: &mut D) -> Result<()> {
        let profile = config.rate.profile();
        if profile.buffer_capacity_words > CAP {
            return Err(BufferError::CapacityExceeded.into());
        }

        let previous_ier = self.bus.read8(TX_IER_OFFSET);
        self.handshake
            .quiesce(config.quiesce, delay, || {
                self.bus.write8(TX_IER_OFFSET, 0);
            })
            .inspect_err(|_| self.bus.write8(TX_IER_OFFSET, previous_ier))?;

        if let Err(e) = self.frames.resize(profile.buffer_capacity_words) {
            self.resume(previous_ier);
            return Err(e);
        }

        self.bus.write8(TX_RST_OFFSET, TX_RST_ASSERT);
        self.engine.with(|engine| engine.configure(profile));
        self.bus.write8(TX_LCR_OFFSET, line_control(&config));
        self.bus.write8(
            TX_FCR_OFFSET,
            config.effective_trigger().code() & TX_FCR_TRIGGER_MASK,
        );
        self.bus.write8(TX_LSR_OFFSET, TX_LSR_RESET);
        self.bus.write8(TX_RST_OFFSET, TX_RST_RELEASE);

        self.config.with(|c| *c = config);
        self.state.with(|state| *state = State::Running);

        self.handshake.enable();
        self.bus.write8(TX_IER_OFFSET, TX_IER_TLSIEN);
        Ok(())
    }

    fn resume(&self, previous_ier: u8) {
        if self.state() == State::Running {
            self.handshake.enable();
            self.bus.write8(TX_IER_OFFSET, previous_ier);
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Get the configured data rate
    pub fn rate(&self) -> DataRate {
        self.config().rate
    }

    /// Change the data rate
    ///
    /// Drops any staged or cycling frame; the channel goes idle until the
    /// next [`Self::block_write`].
    pub fn set_rate<D: DelayNs>(&self, rate: DataRate, delay: &mut D) -> Result<()> {
        if self.state() != State::Running {
            return Err(ConfigError::Unconfigured.into());
        }
        self.apply(self.config().with_rate(rate), delay)?;

        #[cfg(feature = "defmt")]
        defmt::info!("TX rate set to {} words/s", rate.words_per_sec());

        Ok(())
    }

    /// Get the transmit line coding
    pub fn line_coding(&self) -> LineCoding {
        self.config().line_coding
    }

    /// Change the transmit line coding
    pub fn set_line_coding(&self, coding: LineCoding) {
        self.config.with(|c| c.line_coding = coding);
        self.bus.modify8(TX_LCR_OFFSET, |lcr| {
            if coding.is_bit_set() {
                lcr | TX_LCR_MODE
            } else {
                lcr & !TX_LCR_MODE
            }
        });
    }

    /// Whether the transmitter is looped back to the receiver
    pub fn loopback(&self) -> bool {
        self.config().loopback
    }

    /// Enable or disable internal loopback
    pub fn set_loopback(&self, enabled: bool) {
        self.config.with(|c| c.loopback = enabled);
        self.bus.modify8(TX_LCR_OFFSET, |lcr| {
            if enabled {
                lcr | TX_LCR_LOOPBACK
            } else {
                lcr & !TX_LCR_LOOPBACK
            }
        });
    }

    /// Get the FIFO trigger level in effect
    pub fn fifo_threshold(&self) -> TriggerLevel {
        self.config().effective_trigger()
    }

    /// Override the FIFO trigger level
    pub fn set_fifo_threshold(&self, level: TriggerLevel) {
        self.config.with(|c| c.trigger = Some(level));
        self.bus
            .write8(TX_FCR_OFFSET, level.code() & TX_FCR_TRIGGER_MASK);
    }

    /// Whether the trigger-level interrupt is currently armed
    pub fn trigger_irq_enabled(&self) -> bool {
        (self.bus.read8(TX_IER_OFFSET) & TX_IER_TSAIEN) != 0
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Transmit phase
    pub fn phase(&self) -> TxPhase {
        self.engine.with_ref(TxCycleEngine::phase)
    }

    /// Frames sent since the current frame was adopted
    pub fn frames_sent(&self) -> u32 {
        self.engine.with_ref(TxCycleEngine::frames_since_adoption)
    }

    /// Underflow events since the last configuration
    pub fn underflow_count(&self) -> u32 {
        self.counters().underflow
    }

    /// Line error counters since the last configuration
    pub fn counters(&self) -> TxErrorCounters {
        self.engine.with_ref(TxCycleEngine::counters)
    }

    /// Whether a staged frame is still waiting for adoption
    pub fn is_staged_pending(&self) -> bool {
        self.frames.is_fresh()
    }

    /// Bytes expected by [`Self::block_write`]
    pub fn frame_len_bytes(&self) -> usize {
        self.frames.frame_len() * 2
    }

    /// Number of frame swaps since creation
    pub fn frame_generation(&self) -> u32 {
        self.frames.generation()
    }

    // =========================================================================
    // Signals
    // =========================================================================

    /// Install the frame-adopted notification target
    pub fn install_frame_signal(&self, sink: &'static dyn SignalSink) -> Result<()> {
        Ok(self.frame_signal.install(sink)?)
    }

    /// Remove the frame-adopted notification target
    pub fn remove_frame_signal(&self) -> Result<()> {
        Ok(self.frame_signal.remove()?)
    }

    /// Install the underflow notification target
    pub fn install_error_signal(&self, sink: &'static dyn SignalSink) -> Result<()> {
        Ok(self.error_signal.install(sink)?)
    }

    /// Remove the underflow notification target
    pub fn remove_error_signal(&self) -> Result<()> {
        Ok(self.error_signal.remove()?)
    }

    // =========================================================================
    // Data Path
    // =========================================================================

    /// Stage one frame of little-endian words for transmission
    ///
    /// `data` must be exactly [`Self::frame_len_bytes`] long. The frame is
    /// adopted at the next frame boundary; staging again before that
    /// replaces it. Returns the number of bytes staged.
    ///
    /// # Errors
    /// - `SizeMismatch` - wrong length, or the channel is not configured
    /// - `CallerBusy` - another write is in progress
    pub fn block_write(&self, data: &[u8]) -> IoResult<usize> {
        let words = self.frames.frame_len();
        if words == 0 || data.len() != words * 2 {
            return Err(IoError::SizeMismatch);
        }
        self.frames.stage_with(words, |slot| {
            for (word, chunk) in slot.iter_mut().zip(data.chunks_exact(2)) {
                *word = u16::from_le_bytes([chunk[0], chunk[1]]);
            }
            Ok(())
        })?;
        self.arm_trigger();
        Ok(data.len())
    }

    /// Stage one frame of words; returns the number of words staged
    pub fn write_frame(&self, words: &[u16]) -> IoResult<usize> {
        let staged = self.frames.stage_new_frame(words)?;
        self.arm_trigger();
        Ok(staged)
    }

    /// Arm the trigger interrupt once work is available
    fn arm_trigger(&self) {
        critical_section::with(|_| {
            if !self.handshake.is_disabled() {
                self.bus.write8(TX_IER_OFFSET, TX_IER_DEFAULT);
            }
        });
    }

    // =========================================================================
    // Interrupt Handling
    // =========================================================================

    /// Service a transmit interrupt (call from the ISR)
    pub fn on_interrupt(&self) -> IrqResult {
        let status = TxInterruptStatus::from_raw(
            self.bus.read8(TX_IIR_OFFSET),
            self.bus.read8(TX_LSR_OFFSET),
        );

        if !self.handshake.enter() {
            self.bus.write8(TX_IER_OFFSET, 0);
            return if status.any() {
                IrqResult::Handled
            } else {
                IrqResult::NotMine
            };
        }

        if !status.any() {
            self.handshake.exit();
            return IrqResult::NotMine;
        }

        self.bus.write8(TX_IER_OFFSET, 0);

        if status.line_status {
            self.service_underflow();
        }
        if status.space_available {
            self.service_trigger();
        }

        // Decided under the same lock as `arm_trigger`
        critical_section::with(|_| {
            let has_work = self.engine.with_ref(|e| e.has_work(&self.frames));
            let mask = if has_work { TX_IER_DEFAULT } else { TX_IER_TLSIEN };
            self.handshake.exit_rearm(|| self.bus.write8(TX_IER_OFFSET, mask));
        });
        IrqResult::Handled
    }

    fn service_underflow(&self) {
        self.bus.write8(TX_LSR_OFFSET, TX_LSR_RESET);
        let _count = self.engine.with(TxCycleEngine::record_underflow);

        #[cfg(feature = "defmt")]
        defmt::warn!("TX underflow (count {})", _count);

        self.error_signal.send(SignalKind::TxError);
    }

    fn service_trigger(&self) {
        let occupancy = self.bus.read16(TX_TXC_OFFSET) as usize;
        let report = self.engine.with(|engine| {
            let space = engine
                .profile()
                .write_block_words
                .saturating_sub(occupancy);
            engine.fill(space, &self.frames, |slot, word| {
                self.bus.write16(fifo_offset(slot), word);
            })
        });

        if report.written > 0 {
            self.bus.write16(TX_TXA_OFFSET, report.written as u16);
        }
        for _ in 0..report.adopted {
            self.frame_signal.send(SignalKind::TxFrame);
        }
    }

    #[cfg(test)]
    pub(crate) fn handshake(&self) -> &IsrHandshake {
        &self.handshake
    }
}

// =============================================================================
// Type Aliases
// =============================================================================

/// Transmit channel sized for every rate (8192-word buffers)
pub type TxChannelDefault<B> = TxChannel<B, 8192>;

/// Transmit channel for rates up to 1024 words/s
pub type TxChannelSmall<B> = TxChannel<B, 1024>;

// =============================================================================
// Unit Tests
// =============================================================================
