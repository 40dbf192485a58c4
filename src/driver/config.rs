//! Configuration types for the ARINC717 framing driver

use crate::error::{ConfigError, ConfigResult};
use crate::engine::rate::RateProfile;
use crate::constants::{WAIT_INTERVAL_US, WAIT_RETRIES, WORD_BITS};

/// ARINC717 bus rate in words per second
///
/// The discriminant is the hardware rate code programmed into the line
/// control register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DataRate {
    /// 64 words/s
    #[default]
    Wps64 = 0,
    /// 128 words/s
    Wps128 = 1,
    /// 256 words/s
    Wps256 = 2,
    /// 512 words/s
    Wps512 = 3,
    /// 1024 words/s
    Wps1024 = 4,
    /// 2048 words/s
    Wps2048 = 5,
    /// 4096 words/s
    Wps4096 = 6,
    /// 8192 words/s
    Wps8192 = 7,
}

impl DataRate {
    /// All rates in ascending order
    pub const ALL: [DataRate; 8] = [
        DataRate::Wps64,
        DataRate::Wps128,
        DataRate::Wps256,
        DataRate::Wps512,
        DataRate::Wps1024,
        DataRate::Wps2048,
        DataRate::Wps4096,
        DataRate::Wps8192,
    ];

    /// Parse a hardware rate code, rejecting anything outside 0..=7
    pub const fn from_code(code: u8) -> ConfigResult<Self> {
        match code {
            0 => Ok(DataRate::Wps64),
            1 => Ok(DataRate::Wps128),
            2 => Ok(DataRate::Wps256),
            3 => Ok(DataRate::Wps512),
            4 => Ok(DataRate::Wps1024),
            5 => Ok(DataRate::Wps2048),
            6 => Ok(DataRate::Wps4096),
            7 => Ok(DataRate::Wps8192),
            _ => Err(ConfigError::InvalidRate),
        }
    }

    /// Hardware rate code
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Words per second
    #[must_use]
    pub const fn words_per_sec(self) -> u32 {
        64 << (self as u32)
    }

    /// Line bit rate (12 data bits per word)
    #[must_use]
    pub const fn bits_per_sec(self) -> u32 {
        self.words_per_sec() * WORD_BITS
    }

    /// Buffer sizing for this rate
    #[must_use]
    pub const fn profile(self) -> RateProfile {
        RateProfile::resolve(self as u8)
    }
}

impl TryFrom<u8> for DataRate {
    type Error = ConfigError;

    fn try_from(code: u8) -> ConfigResult<Self> {
        Self::from_code(code)
    }
}

/// Receive synchronization policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SyncMode {
    /// Accept words without waiting for sync word detection
    NoSync = 0,
    /// Start receiving once two sync words arrive in the correct order
    Partial = 1,
    /// Start receiving once all four sync words arrive in the correct order
    #[default]
    Full = 2,
}

impl SyncMode {
    /// Parse a hardware sync mode code (3 is reserved)
    pub const fn from_code(code: u8) -> ConfigResult<Self> {
        match code {
            0 => Ok(SyncMode::NoSync),
            1 => Ok(SyncMode::Partial),
            2 => Ok(SyncMode::Full),
            _ => Err(ConfigError::InvalidSyncMode),
        }
    }

    /// Hardware sync mode code
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Whether data is only accepted while the receiver reports lock
    #[must_use]
    pub const fn requires_lock(self) -> bool {
        !matches!(self, SyncMode::NoSync)
    }
}

impl TryFrom<u8> for SyncMode {
    type Error = ConfigError;

    fn try_from(code: u8) -> ConfigResult<Self> {
        Self::from_code(code)
    }
}

/// Physical line coding of the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineCoding {
    /// Harvard bi-phase
    #[default]
    HarvardBiPhase,
    /// Bipolar return-to-zero
    BipolarRtz,
}

impl LineCoding {
    /// Decode from the line control mode bit
    #[must_use]
    pub const fn from_bit(set: bool) -> Self {
        if set {
            LineCoding::BipolarRtz
        } else {
            LineCoding::HarvardBiPhase
        }
    }

    /// Whether the line control mode bit is set
    #[must_use]
    pub const fn is_bit_set(self) -> bool {
        matches!(self, LineCoding::BipolarRtz)
    }
}

/// FIFO trigger level
///
/// The hardware raises a data-available (RX) or space-available (TX)
/// interrupt once this many words are queued / free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum TriggerLevel {
    /// 8 words
    Words8 = 1,
    /// 16 words
    Words16 = 2,
    /// 32 words
    Words32 = 3,
    /// 64 words
    Words64 = 4,
    /// 128 words
    Words128 = 5,
    /// 256 words
    Words256 = 6,
    /// 512 words (reset value)
    #[default]
    Words512 = 7,
}

impl TriggerLevel {
    /// Parse a FIFO control trigger code, rejecting anything outside 1..=7
    pub const fn from_code(code: u8) -> ConfigResult<Self> {
        match code {
            1 => Ok(TriggerLevel::Words8),
            2 => Ok(TriggerLevel::Words16),
            3 => Ok(TriggerLevel::Words32),
            4 => Ok(TriggerLevel::Words64),
            5 => Ok(TriggerLevel::Words128),
            6 => Ok(TriggerLevel::Words256),
            7 => Ok(TriggerLevel::Words512),
            _ => Err(ConfigError::InvalidThreshold),
        }
    }

    /// FIFO control trigger code
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Trigger threshold in words
    #[must_use]
    pub const fn words(self) -> usize {
        4 << (self as usize)
    }
}

impl TryFrom<u8> for TriggerLevel {
    type Error = ConfigError;

    fn try_from(code: u8) -> ConfigResult<Self> {
        Self::from_code(code)
    }
}

/// Bounded wait used while quiescing the interrupt handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QuiesceConfig {
    /// Number of exit checks before giving up
    pub retries: u32,
    /// Delay between exit checks in microseconds
    pub interval_us: u32,
}

impl Default for QuiesceConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl QuiesceConfig {
    /// 20 checks, 100 ms apart
    #[must_use]
    pub const fn new() -> Self {
        Self {
            retries: WAIT_RETRIES,
            interval_us: WAIT_INTERVAL_US,
        }
    }
}

/// Receive channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxConfig {
    /// Bus rate
    pub rate: DataRate,
    /// Synchronization policy
    pub sync_mode: SyncMode,
    /// Line coding
    pub line_coding: LineCoding,
    /// FIFO trigger override (`None` follows the rate profile)
    pub trigger: Option<TriggerLevel>,
    /// Enable the line status (error) interrupt
    pub error_irq: bool,
    /// Reconfiguration wait budget
    pub quiesce: QuiesceConfig,
}

impl Default for RxConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RxConfig {
    /// Create a new configuration with defaults
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rate: DataRate::Wps64,
            sync_mode: SyncMode::Full,
            line_coding: LineCoding::HarvardBiPhase,
            trigger: None,
            error_irq: true,
            quiesce: QuiesceConfig::new(),
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Set the bus rate
    #[must_use]
    pub const fn with_rate(mut self, rate: DataRate) -> Self {
        self.rate = rate;
        self
    }

    /// Set the synchronization policy
    #[must_use]
    pub const fn with_sync_mode(mut self, mode: SyncMode) -> Self {
        self.sync_mode = mode;
        self
    }

    /// Set the line coding
    #[must_use]
    pub const fn with_line_coding(mut self, coding: LineCoding) -> Self {
        self.line_coding = coding;
        self
    }

    /// Override the FIFO trigger level
    #[must_use]
    pub const fn with_trigger(mut self, level: TriggerLevel) -> Self {
        self.trigger = Some(level);
        self
    }

    /// Enable or disable the line status interrupt
    #[must_use]
    pub const fn with_error_irq(mut self, enabled: bool) -> Self {
        self.error_irq = enabled;
        self
    }

    /// Set the reconfiguration wait budget
    #[must_use]
    pub const fn with_quiesce(mut self, retries: u32, interval_us: u32) -> Self {
        self.quiesce = QuiesceConfig {
            retries,
            interval_us,
        };
        self
    }

    /// FIFO trigger level in effect for this configuration
    #[must_use]
    pub const fn effective_trigger(&self) -> TriggerLevel {
        match self.trigger {
            Some(level) => level,
            None => self.rate.profile().fifo_trigger_level,
        }
    }
}

/// Transmit channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxConfig {
    /// Bus rate
    pub rate: DataRate,
    /// Line coding
    pub line_coding: LineCoding,
    /// Route the transmitter into the local receiver
    pub loopback: bool,
    /// FIFO trigger override (`None` follows the rate profile)
    pub trigger: Option<TriggerLevel>,
    /// Reconfiguration wait budget
    pub quiesce: QuiesceConfig,
}

impl Default for TxConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TxConfig {
    /// Create a new configuration with defaults
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rate: DataRate::Wps64,
            line_coding: LineCoding::HarvardBiPhase,
            loopback: false,
            trigger: None,
            quiesce: QuiesceConfig::new(),
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Set the bus rate
    #[must_use]
    pub const fn with_rate(mut self, rate: DataRate) -> Self {
        self.rate = rate;
        self
    }

    /// Set the line coding
    #[must_use]
    pub const fn with_line_coding(mut self, coding: LineCoding) -> Self {
        self.line_coding = coding;
        self
    }

    /// Enable or disable internal loopback
    #[must_use]
    pub const fn with_loopback(mut self, enabled: bool) -> Self {
        self.loopback = enabled;
        self
    }

    /// Override the FIFO trigger level
    #[must_use]
    pub const fn with_trigger(mut self, level: TriggerLevel) -> Self {
        self.trigger = Some(level);
        self
    }

    /// Set the reconfiguration wait budget
    #[must_use]
    pub const fn with_quiesce(mut self, retries: u32, interval_us: u32) -> Self {
        self.quiesce = QuiesceConfig {
            retries,
            interval_us,
        };
        self
    }

    /// FIFO trigger level in effect for this configuration
    #[must_use]
    pub const fn effective_trigger(&self) -> TriggerLevel {
        match self.trigger {
            Some(level) => level,
            None => self.rate.profile().fifo_trigger_level,
        }
    }
}

/// Channel lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Not yet initialized
    #[default]
    Uninitialized,
    /// Initialized, interrupts armed
    Running,
    /// Shut down, buffers released
    Shutdown,
}
