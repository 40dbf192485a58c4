//! Channel layer for the ARINC717 receive and transmit blocks.
//!
//! This module contains the building blocks for configuring and operating
//! a channel pair:
//!
//! - [`config`] - Rate, line and FIFO configuration with builder patterns
//! - [`interrupt`] - Decoded interrupt status and handler results
//! - [`rx`] - The receive channel
//! - [`tx`] - The transmit channel
//!
//! # Example
//!
//! ```ignore
//! use arinc717_link::driver::{DataRate, RxConfig, SyncMode};
//!
//! let config = RxConfig::new()
//!     .with_rate(DataRate::Wps1024)
//!     .with_sync_mode(SyncMode::Partial);
//! ```

// Submodules
pub mod config;
pub mod interrupt;
pub mod rx;
pub mod tx;

// Re-exports for convenience
pub use config::{
    DataRate, LineCoding, QuiesceConfig, RxConfig, State, SyncMode, TriggerLevel, TxConfig,
};
pub use crate::error::{
    BufferError, BufferResult, ConfigError, ConfigResult, Error, IoError, IoResult, Result,
};
pub use interrupt::{IrqResult, RxInterruptStatus, RxLineStatus, TxInterruptStatus};
pub use rx::{RxChannel, RxChannelDefault, RxChannelSmall};
pub use tx::{TxChannel, TxChannelDefault, TxChannelSmall};
