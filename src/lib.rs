//! ARINC717 Link Layer
//!
//! A `no_std`, `no_alloc` framing engine for ARINC717 flight-data buses.
//!
//! ARINC717 carries a continuous stream of 12-bit words grouped into
//! subframes that each start with a fixed sync word. This crate keeps an
//! interrupt-driven receive channel locked to the subframe boundary and
//! an interrupt-driven transmit channel cycling a frame without gaps,
//! while callers read and stage whole frames through a double-buffered
//! handoff.
//!
//! # Architecture
//!
//! The crate is organized into three layers:
//!
//! 1. **Channel Layer** ([`driver`]): [`RxChannel`] / [`TxChannel`] with
//!    configuration, interrupt handling and block transfers
//! 2. **Engine Layer** ([`engine`]): Rate sizing, [`FrameBufferPair`]
//!    handoff and the per-direction interrupt state machines
//! 3. **HAL Layer** ([`hal`]): Register bus and notification signals
//!
//! ## Bus Rates
//!
//! | Words/s | Subframe words | RX FIFO trigger | TX write block |
//! |---------|----------------|-----------------|----------------|
//! | 64      | 64             | 8               | 16             |
//! | 256     | 256            | 32              | 64             |
//! | 1024    | 1024           | 128             | 256            |
//! | 8192    | 8192           | 256             | 512            |
//!
//! # Features
//!
//! - `defmt`: Enable defmt logging and formatting for public types
//! - `async`: Enable async/await support with wakers
//!
//! # Example
//!
//! ```ignore
//! use arinc717_link::{DataRate, MmioBus, RxChannel, RxChannelDefault, RxConfig};
//!
//! static RX: RxChannelDefault<MmioBus> = RxChannel::new(unsafe { MmioBus::new(0x4000_0000) });
//!
//! // Your delay implementation (from your HAL)
//! let mut delay = /* your DelayNs implementation */;
//!
//! RX.init(RxConfig::new().with_rate(DataRate::Wps256), &mut delay).unwrap();
//!
//! #[interrupt]
//! fn ARINC_RX() {
//!     RX.on_interrupt();
//! }
//!
//! let mut frame = [0u8; 512];
//! if let Ok(bytes) = RX.block_read(&mut frame) {
//!     // one subframe, little-endian words
//! }
//! ```
//!
//! # Memory Requirements
//!
//! Each channel holds two buffers of `CAP` words. The default aliases
//! (`CAP = 8192`) use 32 KB per channel; the small aliases (`CAP = 1024`)
//! use 4 KB and support rates up to 1024 words/s.

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels live here; per-lint config is in Cargo.toml [lints].
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements,
    clippy::let_underscore_future
)]

// =============================================================================
// Modules
// =============================================================================

pub mod constants;
pub mod driver;
pub mod engine;
pub mod error;
pub mod hal;
pub mod sync;

// Internal implementation details (pub(crate) only)
mod internal;

// Test utilities (only available during testing)
#[cfg(test)]
pub(crate) mod test_utils;

// =============================================================================
// Re-exports
// =============================================================================

pub use driver::config::{
    DataRate, LineCoding, QuiesceConfig, RxConfig, State, SyncMode, TriggerLevel, TxConfig,
};
pub use error::{
    BufferError, BufferResult, ConfigError, ConfigResult, Error, IoError, IoResult, Result,
};
pub use driver::interrupt::{IrqResult, RxInterruptStatus, RxLineStatus, TxInterruptStatus};
pub use driver::rx::{RxChannel, RxChannelDefault, RxChannelSmall};
pub use driver::tx::{TxChannel, TxChannelDefault, TxChannelSmall};
pub use engine::{FrameBufferPair, RateProfile, RxErrorCounters, SyncState, TxErrorCounters, TxPhase};
pub use hal::{MmioBus, RegisterBus, Signal, SignalKind, SignalSink};

// Re-export async types when async feature is enabled
#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub use sync::asynch::{AsyncRxExt, AsyncTxExt};

/// Low-level register offsets and bit fields for advanced use.
///
/// # Safety
///
/// Direct register access bypasses the channels' interrupt handshake. Use
/// only while the channel owning the block is shut down.
pub mod unsafe_registers {
    pub use crate::internal::register::{rx, tx};
}

// =============================================================================
// Macro Helpers
// =============================================================================

/// Declare a static receive channel on a memory-mapped register block.
///
/// # Examples
///
/// ```ignore
/// arinc717_link::rx_channel_static!(RX, 0x4000_0000);
///
/// RX.init(RxConfig::new(), &mut delay).unwrap();
/// ```
#[macro_export]
macro_rules! rx_channel_static {
    ($name:ident, $base:expr) => {
        $crate::rx_channel_static!($name, $base, 8192);
    };
    ($name:ident, $base:expr, $cap:expr) => {
        // SAFETY: the caller names the base address of a receive block.
        static $name: $crate::RxChannel<$crate::MmioBus, $cap> =
            $crate::RxChannel::new(unsafe { $crate::MmioBus::new($base) });
    };
}

/// Declare a static transmit channel on a memory-mapped register block.
///
/// # Examples
///
/// ```ignore
/// arinc717_link::tx_channel_static!(TX, 0x4000_1000, 1024);
/// ```
#[macro_export]
macro_rules! tx_channel_static {
    ($name:ident, $base:expr) => {
        $crate::tx_channel_static!($name, $base, 8192);
    };
    ($name:ident, $base:expr, $cap:expr) => {
        // SAFETY: the caller names the base address of a transmit block.
        static $name: $crate::TxChannel<$crate::MmioBus, $cap> =
            $crate::TxChannel::new(unsafe { $crate::MmioBus::new($base) });
    };
}
