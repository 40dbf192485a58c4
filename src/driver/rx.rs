//! ARINC717 receive channel
//!
//! [`RxChannel`] ties a receive register block to an [`RxSyncEngine`] and a
//! [`FrameBufferPair`]. The interrupt handler ([`RxChannel::on_interrupt`])
//! drains the hardware FIFO and publishes one frame per subframe; the caller
//! reads the latest frame with [`RxChannel::block_read`].
//!
//! All methods take `&self` so a channel can live in a `static` shared
//! between the interrupt handler and the caller.

use embedded_hal::delay::DelayNs;

use super::config::{
    DataRate, LineCoding, QuiesceConfig, RxConfig, State, SyncMode, TriggerLevel,
};
use crate::error::{BufferError, ConfigError, IoError, IoResult, Result};
use super::interrupt::{IrqResult, RxInterruptStatus};
use crate::engine::{FrameBufferPair, RxErrorCounters, RxSyncEngine, SyncState};
use crate::hal::bus::RegisterBus;
use crate::hal::signal::{Signal, SignalKind, SignalSink};
use crate::internal::register::fifo_offset;
use crate::internal::register::rx::{
    RX_FCR_OFFSET, RX_FCR_TRIGGER_MASK, RX_IER_DEFAULT, RX_IER_OFFSET, RX_IER_RDAIEN,
    RX_LCR_MODE, RX_LCR_OFFSET, RX_LCR_RATE_MASK, RX_LCR_RATE_SHIFT, RX_LCR_SYNC_MASK,
    RX_LSR_INSYNC, RX_LSR_OFFSET, RX_LSR_RESET, RX_RST_ASSERT, RX_RST_OFFSET, RX_RST_RELEASE,
    RX_RXA_OFFSET, RX_RXC_OFFSET, RX_STAT_OFFSET, RX_SUB_PTR_OFFSET,
};
use crate::sync::{CriticalSectionCell, IsrHandshake};

/// Line control value for a receive configuration
const fn line_control(config: &RxConfig) -> u8 {
    let mut lcr = config.sync_mode.code() & RX_LCR_SYNC_MASK;
    lcr |= (config.rate.code() << RX_LCR_RATE_SHIFT) & RX_LCR_RATE_MASK;
    if config.line_coding.is_bit_set() {
        lcr |= RX_LCR_MODE;
    }
    lcr
}

/// Interrupt enable mask while running
const fn interrupt_mask(error_irq: bool) -> u8 {
    if error_irq {
        RX_IER_DEFAULT
    } else {
        RX_IER_RDAIEN
    }
}

// =============================================================================
// Receive Channel
// =============================================================================

/// ARINC717 receive channel
///
/// # Type Parameters
/// * `B` - Register access for the receive block
/// * `CAP` - Words of static storage per frame buffer; must be at least the
///   subframe length of every rate the channel will be configured for
///
/// # Example
/// ```ignore
/// static RX: RxChannelDefault<MmioBus> = RxChannel::new(unsafe { MmioBus::new(0x4000_0000) });
///
/// RX.init(RxConfig::new().with_rate(DataRate::Wps256), &mut delay)?;
///
/// #[interrupt]
/// fn ARINC_RX() {
///     RX.on_interrupt();
/// }
///
/// let mut frame = [0u8; 512];
/// let bytes = RX.block_read(&mut frame)?;
/// ```
pub struct RxChannel<B: RegisterBus, const CAP: usize> {
    /// Register block
    bus: B,
    /// Interrupt-side state
    engine: CriticalSectionCell<RxSyncEngine>,
    /// Frame handoff between interrupt and caller
    frames: FrameBufferPair<CAP>,
    /// Frame-ready notifications
    frame_signal: Signal,
    /// Line error notifications
    error_signal: Signal,
    /// Interrupt exit handshake for reconfiguration
    handshake: IsrHandshake,
    /// Current configuration
    config: CriticalSectionCell<RxConfig>,
    /// Current state
    state: CriticalSectionCell<State>,
}

impl<B: RegisterBus, const CAP: usize> RxChannel<B, CAP> {
    /// Create a new receive channel
    ///
    /// This is a const function suitable for static initialization.
    /// The channel is created in the `Uninitialized` state with its
    /// interrupt handler disabled.
    pub const fn new(bus: B) -> Self {
        Self {
            bus,
            engine: CriticalSectionCell::new(RxSyncEngine::new()),
            frames: FrameBufferPair::new(),
            frame_signal: Signal::new(),
            error_signal: Signal::new(),
            handshake: IsrHandshake::new(),
            config: CriticalSectionCell::new(RxConfig::new()),
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
    pub fn config(&self) -> RxConfig {
        self.config.get()
    }

    /// Register block
    pub fn bus(&self) -> &B {
        &self.bus
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Configure the channel and start receiving
    ///
    /// Can be called in any state; a running channel is quiesced first.
    ///
    /// # Errors
    /// - `CapacityExceeded` - the rate needs more than `CAP` words per buffer
    /// - `Busy` - the interrupt handler did not exit within the retry budget
    pub fn init<D: DelayNs>(&self, config: RxConfig, delay: &mut D) -> Result<()> {
        self.apply(config, delay)?;

        #[cfg(feature = "defmt")]
        defmt::info!(
            "RX channel running: {} words/s, sync {}",
            config.rate.words_per_sec(),
            config.sync_mode
        );

        Ok(())
    }

    /// Stop the channel and release its buffers
    ///
    /// # Errors
    /// - `Unconfigured` - the channel was never initialized
    /// - `Busy` - the interrupt handler did not exit within the retry budget
    pub fn shutdown<D: DelayNs>(&self, delay: &mut D) -> Result<()> {
        match self.state() {
            State::Uninitialized => return Err(ConfigError::Unconfigured.into()),
            State::Shutdown => return Ok(()),
            State::Running => {}
        }

        let previous_ier = self.bus.read8(RX_IER_OFFSET);
        self.handshake
            .quiesce(self.config().quiesce, delay, || {
                self.bus.write8(RX_IER_OFFSET, 0);
            })
            .inspect_err(|_| self.bus.write8(RX_IER_OFFSET, previous_ier))?;

        self.bus.write8(RX_RST_OFFSET, RX_RST_ASSERT);
        if let Err(e) = self.frames.release() {
            self.resume(previous_ier);
            return Err(e);
        }
        self.state.with(|state| *state = State::Shutdown);

        #[cfg(feature = "defmt")]
        defmt::info!("RX channel shut down");

        Ok(())
    }

    /// Quiesce the interrupt handler, then resize buffers and program the block
    fn apply<D: DelayNs>(&self, config: RxConfig, delay: &mut D) -> Result<()> {
        let profile = config.rate.profile();
        if profile.buffer_capacity_words > CAP {
            return Err(BufferError::CapacityExceeded.into());
        }

        let previous_ier = self.bus.read8(RX_IER_OFFSET);
        self.handshake
            .quiesce(config.quiesce, delay, || {
                self.bus.write8(RX_IER_OFFSET, 0);
            })
            .inspect_err(|_| self.bus.write8(RX_IER_OFFSET, previous_ier))?;

        if let Err(e) = self.frames.resize(profile.buffer_capacity_words) {
            self.resume(previous_ier);
            return Err(e);
        }

        self.bus.write8(RX_RST_OFFSET, RX_RST_ASSERT);
        self.engine
            .with(|engine| engine.configure(profile, config.sync_mode));
        self.bus.write8(RX_LCR_OFFSET, line_control(&config));
        self.bus.write8(
            RX_FCR_OFFSET,
            config.effective_trigger().code() & RX_FCR_TRIGGER_MASK,
        );
        self.bus.write8(RX_LSR_OFFSET, RX_LSR_RESET);
        self.bus.write8(RX_RST_OFFSET, RX_RST_RELEASE);

        self.config.with(|c| *c = config);
        self.state.with(|state| *state = State::Running);

        self.handshake.enable();
        self.bus
            .write8(RX_IER_OFFSET, interrupt_mask(config.error_irq));
        Ok(())
    }

    /// Undo a quiesce after a failed reconfiguration
    fn resume(&self, previous_ier: u8) {
        if self.state() == State::Running {
            self.handshake.enable();
            self.bus.write8(RX_IER_OFFSET, previous_ier);
        }
    }

    /// Re-apply the current configuration with one field changed
    fn reconfigure<D: DelayNs>(
        &self,
        delay: &mut D,
        change: impl FnOnce(RxConfig) -> RxConfig,
    ) -> Result<()> {
        if self.state() != State::Running {
            return Err(ConfigError::Unconfigured.into());
        }
        self.apply(change(self.config()), delay)
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
    /// Resizes the frame buffers and restarts synchronization. On error the
    /// previous configuration stays in effect.
    pub fn set_rate<D: DelayNs>(&self, rate: DataRate, delay: &mut D) -> Result<()> {
        self.reconfigure(delay, |c| c.with_rate(rate))?;

        #[cfg(feature = "defmt")]
        defmt::info!("RX rate set to {} words/s", rate.words_per_sec());

        Ok(())
    }

    /// Get the configured sync mode
    pub fn sync_mode(&self) -> SyncMode {
        self.config().sync_mode
    }

    /// Change the sync mode
    ///
    /// Restarts synchronization.
    pub fn set_sync_mode<D: DelayNs>(&self, mode: SyncMode, delay: &mut D) -> Result<()> {
        self.reconfigure(delay, |c| c.with_sync_mode(mode))?;

        #[cfg(feature = "defmt")]
        defmt::info!("RX sync mode set to {}", mode);

        Ok(())
    }

    /// Get the receive line coding
    pub fn line_coding(&self) -> LineCoding {
        self.config().line_coding
    }

    /// Change the receive line coding
    pub fn set_line_coding(&self, coding: LineCoding) {
        self.config.with(|c| c.line_coding = coding);
        self.bus.modify8(RX_LCR_OFFSET, |lcr| {
            if coding.is_bit_set() {
                lcr | RX_LCR_MODE
            } else {
                lcr & !RX_LCR_MODE
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
            .write8(RX_FCR_OFFSET, level.code() & RX_FCR_TRIGGER_MASK);
    }

    /// Whether the line status (error) interrupt is enabled
    pub fn error_irq_enabled(&self) -> bool {
        self.config().error_irq
    }

    /// Enable or disable the line status (error) interrupt
    pub fn set_error_irq(&self, enabled: bool) {
        self.config.with(|c| c.error_irq = enabled);
        critical_section::with(|_| {
            if !self.handshake.is_disabled() && !self.handshake.is_active() {
                self.bus.write8(RX_IER_OFFSET, interrupt_mask(enabled));
            }
        });
    }

    /// Retry budget used when quiescing the interrupt handler
    pub fn quiesce_config(&self) -> QuiesceConfig {
        self.config().quiesce
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Whether the receiver is delivering synchronized frames
    ///
    /// True only when sync has been acquired, a published frame is waiting
    /// and the hardware still reports lock.
    pub fn in_sync(&self) -> bool {
        self.engine.with_ref(RxSyncEngine::is_synced)
            && self.frames.is_fresh()
            && (self.bus.read8(RX_LSR_OFFSET) & RX_LSR_INSYNC) != 0
    }

    /// Synchronization state
    pub fn sync_state(&self) -> SyncState {
        self.engine.with_ref(RxSyncEngine::state)
    }

    /// Bytes returned by a successful [`Self::block_read`]
    pub fn frame_len_bytes(&self) -> usize {
        self.frames.frame_len() * 2
    }

    /// Data interrupts serviced since the last configuration
    pub fn data_irq_count(&self) -> u32 {
        self.engine.with_ref(RxSyncEngine::data_irqs)
    }

    /// Line error counters since the last configuration
    pub fn counters(&self) -> RxErrorCounters {
        self.engine.with_ref(RxSyncEngine::counters)
    }

    /// Frames dropped because the caller was reading at the boundary
    pub fn skipped_frames(&self) -> u32 {
        self.engine.with_ref(RxSyncEngine::skipped_frames)
    }

    /// Number of frames published since creation
    pub fn frame_generation(&self) -> u32 {
        self.frames.generation()
    }

    // =========================================================================
    // Signals
    // =========================================================================

    /// Install the frame-ready notification target
    pub fn install_frame_signal(&self, sink: &'static dyn SignalSink) -> Result<()> {
        Ok(self.frame_signal.install(sink)?)
    }

    /// Remove the frame-ready notification target
    pub fn remove_frame_signal(&self) -> Result<()> {
        Ok(self.frame_signal.remove()?)
    }

    /// Install the line error notification target
    pub fn install_error_signal(&self, sink: &'static dyn SignalSink) -> Result<()> {
        Ok(self.error_signal.install(sink)?)
    }

    /// Remove the line error notification target
    pub fn remove_error_signal(&self) -> Result<()> {
        Ok(self.error_signal.remove()?)
    }

    // =========================================================================
    // Data Path
    // =========================================================================

    /// Copy the latest frame into `buffer` as little-endian words
    ///
    /// The frame stays available, so repeated reads return the same bytes
    /// until the next frame is published. Returns the number of bytes copied.
    ///
    /// # Errors
    /// - `NotReady` - no frame has been published since configuration
    /// - `BufferTooSmall` - `buffer` is shorter than [`Self::frame_len_bytes`]
    /// - `CallerBusy` - another read is in progress
    pub fn block_read(&self, buffer: &mut [u8]) -> IoResult<usize> {
        self.frames.read_caller(|frame| {
            let bytes = frame.len() * 2;
            let dest = buffer.get_mut(..bytes).ok_or(IoError::BufferTooSmall)?;
            for (chunk, word) in dest.chunks_exact_mut(2).zip(frame) {
                chunk.copy_from_slice(&word.to_le_bytes());
            }
            Ok(bytes)
        })
    }

    /// Copy the latest frame into `words`; returns the number of words
    pub fn read_frame(&self, words: &mut [u16]) -> IoResult<usize> {
        self.frames.snapshot_if_fresh(words)
    }

    // =========================================================================
    // Interrupt Handling
    // =========================================================================

    /// Service a receive interrupt (call from the ISR)
    ///
    /// Returns [`IrqResult::NotMine`] when the block has nothing pending or
    /// the event arrived while out of sync in a locking sync mode.
    pub fn on_interrupt(&self) -> IrqResult {
        let status = RxInterruptStatus::from_raw(self.bus.read32(RX_STAT_OFFSET));

        if !self.handshake.enter() {
            self.bus.write8(RX_IER_OFFSET, 0);
            return if status.any() {
                IrqResult::Handled
            } else {
                IrqResult::NotMine
            };
        }

        if !status.any() || !self.engine.with_ref(|e| e.accepts(status.lsr)) {
            self.handshake.exit();
            return IrqResult::NotMine;
        }

        self.bus.write8(RX_IER_OFFSET, 0);

        if status.line_status {
            self.service_line_status(status);
        } else if status.data_available {
            self.service_data(status);
        }

        let error_irq = self.config.with_ref(|c| c.error_irq);
        self.handshake.exit_rearm(|| {
            self.bus.write8(RX_IER_OFFSET, interrupt_mask(error_irq));
        });
        IrqResult::Handled
    }

    /// Discard pending words and count line errors
    fn service_line_status(&self, status: RxInterruptStatus) {
        let pending = self.bus.read16(RX_RXC_OFFSET);
        self.bus.write16(RX_RXA_OFFSET, pending);

        self.engine
            .with(|engine| engine.record_line_errors(status.lsr));
        self.bus.write8(RX_LSR_OFFSET, RX_LSR_RESET);

        #[cfg(feature = "defmt")]
        defmt::warn!(
            "RX line error ({} words discarded): {}",
            pending,
            self.counters()
        );

        self.error_signal.send(SignalKind::RxError);
    }

    /// Drain the FIFO into the frame buffers
    fn service_data(&self, status: RxInterruptStatus) {
        let words = status.received_words as usize;
        let report = self.engine.with(|engine| {
            engine.note_data_irq();
            if !engine.is_synced() {
                let pointer = self.bus.read16(RX_SUB_PTR_OFFSET) as usize;
                engine.acquire(status.lsr.subframe, pointer, &self.frames);
            }
            engine.drain(
                (0..words).map(|i| self.bus.read16(fifo_offset(i))),
                &self.frames,
            )
        });
        self.bus.write16(RX_RXA_OFFSET, status.received_words);

        for _ in 0..report.published {
            self.frame_signal.send(SignalKind::RxFrame);
        }
    }

    /// Hold the handshake as if the interrupt handler were mid-flight
    #[cfg(test)]
    pub(crate) fn handshake(&self) -> &IsrHandshake {
        &self.handshake
    }
}

// =============================================================================
// Type Aliases
// =============================================================================

/// Receive channel sized for every rate (8192-word buffers)
pub type RxChannelDefault<B> = RxChannel<B, 8192>;

/// Receive channel for rates up to 1024 words/s
pub type RxChannelSmall<B> = RxChannel<B, 1024>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    extern crate std;
    use std::vec::Vec;

    use super::*;
    use crate::error::Error;
    use crate::constants::SYNC_WORDS;
    use crate::internal::register::rx::{RX_LSR_LSE, RX_LSR_OE, RX_LSR_SUBFRAME_SHIFT};
    use crate::test_utils::{CountingSink, MockDelay, MockRegisterBus};

    fn running(bus: &MockRegisterBus, config: RxConfig) -> RxChannel<&MockRegisterBus, 1024> {
        let channel = RxChannel::new(bus);
        channel.init(config, &mut MockDelay::new()).unwrap();
        channel
    }

    /// One subframe of `len` words: sync word, then a counting payload
    fn subframe(sync: u16, len: usize) -> Vec<u16> {
        let mut words = Vec::with_capacity(len);
        words.push(sync);
        words.extend((1..len).map(|i| (i as u16 * 3) & 0x0FFF));
        words
    }

    /// Feed `words` in FIFO bursts of `burst` and run the interrupt handler
    fn feed(
        channel: &RxChannel<&MockRegisterBus, 1024>,
        bus: &MockRegisterBus,
        words: &[u16],
        burst: usize,
    ) {
        for chunk in words.chunks(burst) {
            bus.load_rx_words(chunk);
            assert_eq!(channel.on_interrupt(), IrqResult::Handled);
        }
    }

    // =========================================================================
    // Initialization Tests
    // =========================================================================

    #[test]
    fn new_channel_is_uninitialized() {
        let bus = MockRegisterBus::rx();
        let channel: RxChannel<&MockRegisterBus, 64> = RxChannel::new(&bus);
        assert_eq!(channel.state(), State::Uninitialized);
        assert_eq!(channel.frame_len_bytes(), 0);
        let mut buf = [0u8; 128];
        assert_eq!(channel.block_read(&mut buf), Err(IoError::NotReady));
    }

    #[test]
    fn init_programs_registers() {
        let bus = MockRegisterBus::rx();
        let config = RxConfig::new()
            .with_rate(DataRate::Wps512)
            .with_sync_mode(SyncMode::Partial)
            .with_line_coding(LineCoding::BipolarRtz);
        let channel = running(&bus, config);

        assert_eq!(channel.state(), State::Running);
        assert_eq!(channel.frame_len_bytes(), 1024);
        assert_eq!(bus.register8(RX_LCR_OFFSET), 0x01 | (3 << 2) | RX_LCR_MODE);
        assert_eq!(bus.register8(RX_FCR_OFFSET), TriggerLevel::Words64.code());
        assert_eq!(bus.register8(RX_IER_OFFSET), RX_IER_DEFAULT);
        assert_eq!(bus.writes_to(RX_RST_OFFSET), [1, 0]);
    }

    #[test]
    fn init_rejects_rate_beyond_storage() {
        let bus = MockRegisterBus::rx();
        let channel = running(&bus, RxConfig::new());

        let result = channel.set_rate(DataRate::Wps2048, &mut MockDelay::new());
        assert_eq!(result, Err(Error::Buffer(BufferError::CapacityExceeded)));
        assert_eq!(channel.rate(), DataRate::Wps64);
        assert_eq!(channel.frame_len_bytes(), 128);
    }

    #[test]
    fn setters_before_init_are_unconfigured() {
        let bus = MockRegisterBus::rx();
        let channel: RxChannel<&MockRegisterBus, 64> = RxChannel::new(&bus);
        let mut delay = MockDelay::new();
        assert_eq!(
            channel.set_rate(DataRate::Wps64, &mut delay),
            Err(Error::Config(ConfigError::Unconfigured))
        );
        assert_eq!(
            channel.shutdown(&mut delay),
            Err(Error::Config(ConfigError::Unconfigured))
        );
    }

    // =========================================================================
    // End-to-End Tests
    // =========================================================================

    #[test]
    fn end_to_end_at_64_words_per_second() {
        let bus = MockRegisterBus::rx();
        let channel = running(&bus, RxConfig::new());
        bus.set_lsr(RX_LSR_INSYNC);

        let words = subframe(SYNC_WORDS[0], 64);
        let mut buf = [0u8; 128];

        feed(&channel, &bus, &words[..56], 8);
        assert_eq!(channel.block_read(&mut buf), Err(IoError::NotReady));
        assert!(!channel.in_sync());

        feed(&channel, &bus, &words[56..], 8);
        assert_eq!(channel.block_read(&mut buf), Ok(128));
        for (i, word) in words.iter().enumerate() {
            assert_eq!(u16::from_le_bytes([buf[i * 2], buf[i * 2 + 1]]), *word);
        }
        assert!(channel.in_sync());
        assert_eq!(channel.data_irq_count(), 8);
        assert_eq!(bus.register16(RX_RXC_OFFSET), 0);
    }

    #[test]
    fn repeated_reads_return_the_same_frame() {
        let bus = MockRegisterBus::rx();
        let channel = running(&bus, RxConfig::new());
        bus.set_lsr(RX_LSR_INSYNC);
        feed(&channel, &bus, &subframe(SYNC_WORDS[0], 64), 16);

        let mut first = [0u8; 128];
        let mut second = [0u8; 128];
        channel.block_read(&mut first).unwrap();
        channel.block_read(&mut second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn small_buffer_is_rejected_after_ready() {
        let bus = MockRegisterBus::rx();
        let channel = running(&bus, RxConfig::new());
        bus.set_lsr(RX_LSR_INSYNC);

        let mut small = [0u8; 127];
        assert_eq!(channel.block_read(&mut small), Err(IoError::NotReady));

        feed(&channel, &bus, &subframe(SYNC_WORDS[0], 64), 32);
        assert_eq!(channel.block_read(&mut small), Err(IoError::BufferTooSmall));
    }

    #[test]
    fn four_subframes_publish_four_frames() {
        let bus = MockRegisterBus::rx();
        let channel = running(&bus, RxConfig::new());
        let sink = CountingSink::leak();
        channel.install_frame_signal(sink).unwrap();
        bus.set_lsr(RX_LSR_INSYNC);

        let mut stream = Vec::new();
        for sync in SYNC_WORDS {
            stream.extend(subframe(sync, 64));
        }
        feed(&channel, &bus, &stream, 16);

        assert_eq!(sink.count(SignalKind::RxFrame), 4);
        assert_eq!(channel.frame_generation(), 4);
        let mut words = [0u16; 64];
        channel.read_frame(&mut words).unwrap();
        assert_eq!(words[0], SYNC_WORDS[3]);
    }

    #[test]
    fn sync_position_follows_subframe_pointer() {
        let bus = MockRegisterBus::rx();
        let channel = running(&bus, RxConfig::new());
        bus.set_lsr(RX_LSR_INSYNC | (1 << RX_LSR_SUBFRAME_SHIFT));
        bus.set_sub_ptr(4);

        bus.load_rx_words(&[1, 2]);
        channel.on_interrupt();
        assert_eq!(
            channel.sync_state(),
            SyncState::Synced {
                subframe_index: 1,
                sync_position: 4
            }
        );
    }

    // =========================================================================
    // Gate Tests
    // =========================================================================

    #[test]
    fn idle_block_is_not_mine() {
        let bus = MockRegisterBus::rx();
        let channel = running(&bus, RxConfig::new());
        assert_eq!(channel.on_interrupt(), IrqResult::NotMine);
    }

    #[test]
    fn out_of_sync_data_is_not_mine_in_full_sync() {
        let bus = MockRegisterBus::rx();
        let channel = running(&bus, RxConfig::new());
        bus.load_rx_words(&[1, 2, 3]);

        assert_eq!(channel.on_interrupt(), IrqResult::NotMine);
        assert_eq!(channel.data_irq_count(), 0);
        assert_eq!(channel.sync_state(), SyncState::Unsynced);
    }

    #[test]
    fn no_sync_mode_accepts_unlocked_data() {
        let bus = MockRegisterBus::rx();
        let channel = running(&bus, RxConfig::new().with_sync_mode(SyncMode::NoSync));
        bus.load_rx_words(&[1, 2, 3]);

        assert_eq!(channel.on_interrupt(), IrqResult::Handled);
        assert_eq!(channel.data_irq_count(), 1);
        assert_eq!(bus.register8(RX_LCR_OFFSET) & RX_LCR_SYNC_MASK, 0);
    }

    // =========================================================================
    // Error Tests
    // =========================================================================

    #[test]
    fn overrun_counts_once_and_notifies_once() {
        let bus = MockRegisterBus::rx();
        let channel = running(&bus, RxConfig::new());
        let errors = CountingSink::leak();
        let frames = CountingSink::leak();
        channel.install_error_signal(errors).unwrap();
        channel.install_frame_signal(frames).unwrap();

        bus.set_lsr(RX_LSR_INSYNC);
        bus.load_rx_words(&[5, 6, 7]);
        bus.raise_line_status(RX_LSR_OE);

        assert_eq!(channel.on_interrupt(), IrqResult::Handled);
        assert_eq!(
            channel.counters(),
            RxErrorCounters {
                overrun: 1,
                stream_interruption: 0,
                lost_sync: 0
            }
        );
        assert_eq!(errors.count(SignalKind::RxError), 1);
        assert_eq!(errors.total(), 1);
        assert_eq!(frames.total(), 0);
        // Pending words were discarded and flags cleared
        assert_eq!(bus.register16(RX_RXC_OFFSET), 0);
        assert_eq!(bus.writes_to(RX_RXA_OFFSET), [3]);
        assert_eq!(bus.register8(RX_LSR_OFFSET), RX_LSR_INSYNC);
    }

    #[test]
    fn disabled_error_irq_stays_masked() {
        let bus = MockRegisterBus::rx();
        let channel = running(&bus, RxConfig::new().with_error_irq(false));
        assert_eq!(bus.register8(RX_IER_OFFSET), RX_IER_RDAIEN);
        assert!(!channel.error_irq_enabled());

        channel.set_error_irq(true);
        assert_eq!(bus.register8(RX_IER_OFFSET), RX_IER_DEFAULT);
    }

    #[test]
    fn lost_sync_is_counted_not_a_transition() {
        let bus = MockRegisterBus::rx();
        let channel = running(&bus, RxConfig::new());
        bus.set_lsr(RX_LSR_INSYNC);
        bus.load_rx_words(&[1]);
        channel.on_interrupt();
        assert!(matches!(channel.sync_state(), SyncState::Synced { .. }));

        bus.raise_line_status(RX_LSR_LSE);
        channel.on_interrupt();
        assert_eq!(channel.counters().lost_sync, 1);
        assert!(matches!(channel.sync_state(), SyncState::Synced { .. }));
    }

    // =========================================================================
    // Reconfiguration Tests
    // =========================================================================

    #[test]
    fn busy_handler_blocks_reconfiguration() {
        let bus = MockRegisterBus::rx();
        let channel = running(&bus, RxConfig::new().with_quiesce(3, 10));
        bus.set_lsr(RX_LSR_INSYNC);
        feed(&channel, &bus, &subframe(SYNC_WORDS[0], 64), 64);

        // Interrupt handler stuck mid-flight
        assert!(channel.handshake().enter());
        let mut delay = MockDelay::new();
        let result = channel.set_rate(DataRate::Wps128, &mut delay);

        assert_eq!(result, Err(Error::Config(ConfigError::Busy)));
        assert_eq!(delay.calls(), 3);
        assert_eq!(channel.rate(), DataRate::Wps64);
        assert_eq!(channel.frame_len_bytes(), 128);
        assert_eq!(bus.register8(RX_IER_OFFSET), RX_IER_DEFAULT);
        let mut buf = [0u8; 128];
        assert_eq!(channel.block_read(&mut buf), Ok(128));

        channel.handshake().exit();
        channel.set_rate(DataRate::Wps128, &mut delay).unwrap();
        assert_eq!(channel.frame_len_bytes(), 256);
    }

    #[test]
    fn reconfiguration_masks_again_once_handler_is_idle() {
        let bus = MockRegisterBus::rx();
        let channel = running(&bus, RxConfig::new());
        bus.clear_writes();

        channel
            .set_sync_mode(SyncMode::Partial, &mut MockDelay::new())
            .unwrap();

        // Mask, mask again after the exit check, then re-arm
        let expected = [0, 0, u32::from(RX_IER_DEFAULT)];
        assert_eq!(bus.writes_to(RX_IER_OFFSET), expected);
    }

    #[test]
    fn sync_mode_lands_in_line_control_sync_field() {
        for mode in [SyncMode::NoSync, SyncMode::Partial, SyncMode::Full] {
            let bus = MockRegisterBus::rx();
            let channel = running(&bus, RxConfig::new().with_sync_mode(mode));
            assert_eq!(bus.register8(RX_LCR_OFFSET) & RX_LCR_SYNC_MASK, mode.code());

            let other = if mode == SyncMode::Full {
                SyncMode::NoSync
            } else {
                SyncMode::Full
            };
            channel.set_sync_mode(other, &mut MockDelay::new()).unwrap();
            assert_eq!(bus.register8(RX_LCR_OFFSET) & RX_LCR_SYNC_MASK, other.code());
            assert_eq!(channel.sync_mode(), other);
        }
    }

    #[test]
    fn rate_change_restarts_sync() {
        let bus = MockRegisterBus::rx();
        let channel = running(&bus, RxConfig::new());
        bus.set_lsr(RX_LSR_INSYNC);
        feed(&channel, &bus, &subframe(SYNC_WORDS[0], 64), 64);

        channel
            .set_rate(DataRate::Wps256, &mut MockDelay::new())
            .unwrap();
        assert_eq!(channel.sync_state(), SyncState::Unsynced);
        assert_eq!(channel.data_irq_count(), 0);
        let mut buf = [0u8; 512];
        assert_eq!(channel.block_read(&mut buf), Err(IoError::NotReady));
        assert_eq!(channel.fifo_threshold(), TriggerLevel::Words32);
    }

    #[test]
    fn shutdown_masks_and_releases() {
        let bus = MockRegisterBus::rx();
        let channel = running(&bus, RxConfig::new());
        channel.shutdown(&mut MockDelay::new()).unwrap();

        assert_eq!(channel.state(), State::Shutdown);
        assert_eq!(bus.register8(RX_IER_OFFSET), 0);
        assert_eq!(channel.frame_len_bytes(), 0);

        // A late interrupt exits without re-arming
        bus.load_rx_words(&[1]);
        assert_eq!(channel.on_interrupt(), IrqResult::Handled);
        assert_eq!(bus.register8(RX_IER_OFFSET), 0);
        assert!(channel.handshake().has_exited());
    }

    #[test]
    fn signal_install_twice_fails() {
        let bus = MockRegisterBus::rx();
        let channel = running(&bus, RxConfig::new());
        channel.install_frame_signal(CountingSink::leak()).unwrap();
        assert_eq!(
            channel.install_frame_signal(CountingSink::leak()),
            Err(Error::Config(ConfigError::SignalAlreadyInstalled))
        );
        channel.remove_frame_signal().unwrap();
        assert_eq!(
            channel.remove_frame_signal(),
            Err(Error::Config(ConfigError::SignalNotInstalled))
        );
    }

    #[test]
    fn line_coding_and_threshold_update_registers() {
        let bus = MockRegisterBus::rx();
        let channel = running(&bus, RxConfig::new());

        channel.set_line_coding(LineCoding::BipolarRtz);
        assert_eq!(channel.line_coding(), LineCoding::BipolarRtz);
        assert_ne!(bus.register8(RX_LCR_OFFSET) & RX_LCR_MODE, 0);

        channel.set_fifo_threshold(TriggerLevel::Words128);
        assert_eq!(channel.fifo_threshold(), TriggerLevel::Words128);
        assert_eq!(bus.register8(RX_FCR_OFFSET), TriggerLevel::Words128.code());
    }
}
