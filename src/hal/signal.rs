//! Notification signals
//!
//! Each channel owns a frame signal and an error signal. A signal holds at
//! most one [`SignalSink`]; the interrupt handler calls [`Signal::send`]
//! and the sink decides how to wake the caller (flag, RTOS event, async
//! waker, ...).

use crate::error::{ConfigError, ConfigResult};
use crate::sync::CriticalSectionCell;

/// What a notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SignalKind {
    /// A complete receive frame was published
    RxFrame,
    /// A receive line error was counted
    RxError,
    /// A staged transmit frame was adopted
    TxFrame,
    /// A transmit underflow was counted
    TxError,
}

/// Notification target installed on a [`Signal`].
///
/// `notify` runs in interrupt context and must not block.
pub trait SignalSink: Sync {
    /// Deliver one notification
    fn notify(&self, kind: SignalKind);
}

/// Single-target notification slot
pub struct Signal {
    sink: CriticalSectionCell<Option<&'static dyn SignalSink>>,
}

impl Signal {
    /// Create an empty signal (const, suitable for static initialization)
    pub const fn new() -> Self {
        Self {
            sink: CriticalSectionCell::new(None),
        }
    }

    /// Install a notification target
    ///
    /// Fails with [`ConfigError::SignalAlreadyInstalled`] if one is present.
    pub fn install(&self, sink: &'static dyn SignalSink) -> ConfigResult<()> {
        self.sink.with(|slot| {
            if slot.is_some() {
                return Err(ConfigError::SignalAlreadyInstalled);
            }
            *slot = Some(sink);
            Ok(())
        })
    }

    /// Remove the notification target
    ///
    /// Fails with [`ConfigError::SignalNotInstalled`] if none is present.
    pub fn remove(&self) -> ConfigResult<()> {
        self.sink
            .with(|slot| slot.take().map(|_| ()).ok_or(ConfigError::SignalNotInstalled))
    }

    /// Whether a target is installed
    pub fn is_installed(&self) -> bool {
        self.sink.with(|slot| slot.is_some())
    }

    /// Notify the installed target, if any; returns whether one was notified
    pub fn send(&self, kind: SignalKind) -> bool {
        let sink = self.sink.with(|slot| *slot);
        match sink {
            Some(sink) => {
                sink.notify(kind);
                true
            }
            None => false,
        }
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::CountingSink;

    #[test]
    fn send_without_target_is_dropped() {
        let signal = Signal::new();
        assert!(!signal.is_installed());
        assert!(!signal.send(SignalKind::RxFrame));
    }

    #[test]
    fn install_then_send_notifies() {
        let sink = CountingSink::leak();
        let signal = Signal::new();
        signal.install(sink).unwrap();

        assert!(signal.send(SignalKind::RxError));
        assert!(signal.send(SignalKind::RxError));
        assert_eq!(sink.count(SignalKind::RxError), 2);
        assert_eq!(sink.count(SignalKind::RxFrame), 0);
    }

    #[test]
    fn install_over_existing_target_fails() {
        let signal = Signal::new();
        signal.install(CountingSink::leak()).unwrap();
        assert_eq!(
            signal.install(CountingSink::leak()),
            Err(ConfigError::SignalAlreadyInstalled)
        );
    }

    #[test]
    fn remove_without_target_fails() {
        let signal = Signal::new();
        assert_eq!(signal.remove(), Err(ConfigError::SignalNotInstalled));

        signal.install(CountingSink::leak()).unwrap();
        assert_eq!(signal.remove(), Ok(()));
        assert!(!signal.is_installed());
        assert_eq!(signal.remove(), Err(ConfigError::SignalNotInstalled));
    }
}
