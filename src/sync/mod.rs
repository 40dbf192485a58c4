//! Synchronization and Concurrency Support
//!
//! This module provides the synchronization pieces shared by the channels'
//! interrupt handlers and their callers:
//!
//! - **Primitives** (`primitives`): Low-level synchronization types
//!   - [`CriticalSectionCell`] - ISR-safe interior mutability
//!   - [`AtomicWaker`] - Async waker storage for interrupts
//!
//! - **Handshake** (`handshake`): [`IsrHandshake`] lets reconfiguration wait,
//!   with a bounded retry budget, until the interrupt handler has exited
//!
//! - **Async Support** (`asynch`): Futures for frame reads and writes
//!
//! # Feature Flags
//!
//! - `async`: Enables `AtomicWaker` and the `asynch` module

mod handshake;
mod primitives;

pub use handshake::IsrHandshake;
pub use primitives::CriticalSectionCell;

#[cfg(feature = "async")]
pub use primitives::AtomicWaker;

// Async support (requires async feature)
#[cfg(feature = "async")]
pub mod asynch;

#[cfg(feature = "async")]
pub use asynch::{AsyncRxExt, AsyncTxExt, RxFrameFuture, TxStageFuture, RX_WAKER, TX_WAKER};
