//! Error types for the ARINC717 framing driver
//!
//! Errors are organized by domain for better diagnostics:
//! - [`ConfigError`]: Configuration boundary failures (rate, mode, quiesce)
//! - [`BufferError`]: Frame buffer sizing failures during reconfiguration
//! - [`IoError`]: Caller misuse of the block read / block write boundary
//!
//! Hardware line errors (overrun, underflow, ...) are never returned from a
//! call. They are counted and reported through the notification signals.
//!
//! The unified [`Error`] enum wraps all domain errors and is returned
//! by the channel reconfiguration methods.

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration errors
///
/// These errors occur on the configuration boundary. A failed configuration
/// call leaves the channel exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Rate code outside 0..=7
    InvalidRate,
    /// Sync mode code outside 0..=2
    InvalidSyncMode,
    /// FIFO trigger level code outside 1..=7
    InvalidThreshold,
    /// Interrupt handler did not report a clean exit within the retry budget
    Busy,
    /// A notification target is already installed for this signal
    SignalAlreadyInstalled,
    /// No notification target is installed for this signal
    SignalNotInstalled,
    /// Channel has been shut down
    Unconfigured,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::InvalidRate => "invalid rate code",
            ConfigError::InvalidSyncMode => "invalid sync mode",
            ConfigError::InvalidThreshold => "invalid FIFO threshold",
            ConfigError::Busy => "interrupt handler busy",
            ConfigError::SignalAlreadyInstalled => "signal already installed",
            ConfigError::SignalNotInstalled => "signal not installed",
            ConfigError::Unconfigured => "channel shut down",
        }
    }
}

// =============================================================================
// Buffer Errors
// =============================================================================

/// Frame buffer errors
///
/// Raised when a rate change needs more frame storage than the channel was
/// built with. The previous configuration stays in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferError {
    /// Requested frame does not fit the channel's static storage
    CapacityExceeded,
}

impl core::fmt::Display for BufferError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BufferError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            BufferError::CapacityExceeded => "frame exceeds buffer capacity",
        }
    }
}

// =============================================================================
// I/O Errors
// =============================================================================

/// Block transfer errors
///
/// These errors describe caller misuse and never touch the hardware
/// error counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoError {
    /// No complete frame has been received yet
    NotReady,
    /// Destination buffer is smaller than the configured frame
    BufferTooSmall,
    /// Source buffer does not match the configured frame size
    SizeMismatch,
    /// Caller-side buffer is already claimed by another caller
    CallerBusy,
}

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IoError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            IoError::NotReady => "no frame ready",
            IoError::BufferTooSmall => "buffer too small for frame",
            IoError::SizeMismatch => "buffer size does not match frame",
            IoError::CallerBusy => "caller buffer busy",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// Match on the inner domain error for specific handling:
/// ```ignore
/// match rx.set_rate(DataRate::Wps512, &mut delay) {
///     Err(Error::Config(ConfigError::Busy)) => { /* retry later */ }
///     Err(Error::Buffer(BufferError::CapacityExceeded)) => { /* ... */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration error
    Config(ConfigError),
    /// Buffer sizing error
    Buffer(BufferError),
    /// I/O error
    Io(IoError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Buffer(e) => write!(f, "buffer: {}", e.as_str()),
            Error::Io(e) => write!(f, "io: {}", e.as_str()),
        }
    }
}

// From impls for automatic conversion
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<BufferError> for Error {
    fn from(e: BufferError) -> Self {
        Error::Buffer(e)
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Error::Io(e)
    }
}

/// Result type alias for driver operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for buffer operations
pub type BufferResult<T> = core::result::Result<T, BufferError>;

/// Result type alias for block transfer operations
pub type IoResult<T> = core::result::Result<T, IoError>;

// =============================================================================
// Unit Tests
// =============================================================================
