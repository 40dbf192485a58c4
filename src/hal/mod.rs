//! Hardware Abstraction Layer
//!
//! This module defines the two collaborators the channels depend on:
//!
//! - [`bus`]: Register access to one RX or TX register block
//! - [`signal`]: Notification targets for frame and error events
//!
//! # Delay Integration
//!
//! Reconfiguration waits use `embedded_hal::delay::DelayNs` directly.
//! Pass any delay implementation from your HAL.

pub mod bus;
pub mod signal;

// Re-export commonly used types
pub use bus::{MmioBus, RegisterBus};
pub use signal::{Signal, SignalKind, SignalSink};
