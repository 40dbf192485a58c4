//! Framing engine: rate sizing, buffer handoff and the per-direction
//! interrupt state machines.
//!
//! - [`rate`] - Rate code to buffer sizing lookup
//! - [`buffer`] - Double-buffered handoff between interrupt and caller
//! - [`rx`] - Receive synchronization and frame publication
//! - [`tx`] - Cyclic transmit with boundary-aligned frame adoption
//!
//! Nothing in this module touches hardware registers. The channels in
//! [`crate::driver`] read the hardware and drive these engines.

pub mod buffer;
pub mod rate;
pub mod rx;
pub mod tx;

pub use buffer::{FrameBufferPair, RingBuffer};
pub use rate::RateProfile;
pub use rx::{DrainReport, RxErrorCounters, RxSyncEngine, SyncState};
pub use tx::{FillReport, TxCycleEngine, TxErrorCounters, TxPhase};
