//! Interrupt exit handshake used to quiesce a channel.
//!
//! Before a channel releases or resizes its buffers it must know the
//! interrupt handler is not running. The handler brackets its work with
//! [`IsrHandshake::enter`] / [`IsrHandshake::exit`]; the caller sets the
//! disable flag, masks the interrupt and polls [`IsrHandshake::is_active`]
//! with a bounded number of retries.

use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::delay::DelayNs;

use crate::driver::config::QuiesceConfig;
use crate::error::{ConfigError, ConfigResult};

/// Flags shared between a channel's interrupt handler and its caller
#[derive(Debug)]
pub struct IsrHandshake {
    disabled: AtomicBool,
    active: AtomicBool,
    exited: AtomicBool,
}

impl IsrHandshake {
    /// Create a handshake in the disabled state
    pub const fn new() -> Self {
        Self {
            disabled: AtomicBool::new(true),
            active: AtomicBool::new(false),
            exited: AtomicBool::new(true),
        }
    }

    // =========================================================================
    // Interrupt Side
    // =========================================================================

    /// Mark the handler as running; returns `false` if the channel is disabled
    #[inline]
    pub fn enter(&self) -> bool {
        self.active.store(true, Ordering::SeqCst);
        if self.disabled.load(Ordering::SeqCst) {
            self.exit();
            return false;
        }
        true
    }

    /// Mark the handler as finished without re-arming.
    ///
    /// When the channel was disabled meanwhile the exit is recorded for the
    /// waiting caller.
    #[inline]
    pub fn exit(&self) {
        if self.disabled.load(Ordering::SeqCst) {
            self.exited.store(true, Ordering::SeqCst);
        }
        self.active.store(false, Ordering::SeqCst);
    }

    /// Re-arm through `rearm` unless disabled, then mark the handler finished.
    ///
    /// `rearm` runs while the handler still counts as active, so a caller
    /// in [`Self::quiesce`] masks again after it. Returns whether `rearm`
    /// ran.
    #[inline]
    pub fn exit_rearm(&self, rearm: impl FnOnce()) -> bool {
        let rearmed = !self.disabled.load(Ordering::SeqCst);
        if rearmed {
            rearm();
        }
        self.exit();
        rearmed
    }

    // =========================================================================
    // Caller Side
    // =========================================================================

    /// Whether the handler is currently running
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Whether the channel is disabled
    #[inline]
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst)
    }

    /// Whether the handler recorded a clean exit since the last disable
    #[inline]
    pub fn has_exited(&self) -> bool {
        self.exited.load(Ordering::SeqCst)
    }

    /// Request the handler to stop re-arming
    pub fn disable(&self) {
        self.exited.store(false, Ordering::SeqCst);
        self.disabled.store(true, Ordering::SeqCst);
    }

    /// Allow the handler to run and re-arm again
    pub fn enable(&self) {
        self.disabled.store(false, Ordering::SeqCst);
    }

    /// Wait until the handler is not running.
    ///
    /// `mask` should clear the interrupt enable register. It is called after
    /// the disable flag is set and again once the handler is seen idle, which
    /// overrides a re-arm the handler made before it saw the flag. Polls
    /// every `interval_us` for up to `retries` checks and fails with
    /// [`ConfigError::Busy`] after that. On failure the previous enable state
    /// is restored.
    pub fn quiesce<D: DelayNs>(
        &self,
        config: QuiesceConfig,
        delay: &mut D,
        mut mask: impl FnMut(),
    ) -> ConfigResult<()> {
        let was_disabled = self.is_disabled();
        self.disable();
        mask();

        let mut attempts = 0u32;
        while self.is_active() {
            if attempts >= config.retries {
                #[cfg(feature = "defmt")]
                defmt::warn!("interrupt handler still active after {} checks", attempts);

                if !was_disabled {
                    self.enable();
                }
                return Err(ConfigError::Busy);
            }
            delay.delay_us(config.interval_us);
            attempts += 1;
        }
        mask();
        self.exited.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl Default for IsrHandshake {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockDelay;

    fn budget(retries: u32) -> QuiesceConfig {
        QuiesceConfig {
            retries,
            interval_us: 100,
        }
    }

    #[test]
    fn starts_disabled() {
        let handshake = IsrHandshake::new();
        assert!(handshake.is_disabled());
        assert!(!handshake.enter());
        assert!(!handshake.is_active());
    }

    #[test]
    fn enabled_handler_rearms_on_exit() {
        let handshake = IsrHandshake::new();
        handshake.enable();
        assert!(handshake.enter());
        assert!(handshake.is_active());
        let mut rearmed = false;
        assert!(handshake.exit_rearm(|| rearmed = true));
        assert!(rearmed);
        assert!(!handshake.is_active());
    }

    #[test]
    fn rearm_runs_before_handler_counts_as_idle() {
        let handshake = IsrHandshake::new();
        handshake.enable();
        assert!(handshake.enter());

        let mut active_during_rearm = false;
        handshake.exit_rearm(|| active_during_rearm = handshake.is_active());
        assert!(active_during_rearm);
        assert!(!handshake.is_active());
    }

    #[test]
    fn exit_after_disable_leaves_masked_and_records_exit() {
        let handshake = IsrHandshake::new();
        handshake.enable();
        assert!(handshake.enter());

        handshake.disable();
        assert!(!handshake.has_exited());
        assert!(!handshake.exit_rearm(|| panic!("disabled handler re-armed")));
        assert!(handshake.has_exited());
    }

    #[test]
    fn quiesce_idle_handler_succeeds_without_waiting() {
        let handshake = IsrHandshake::new();
        handshake.enable();
        let mut delay = MockDelay::new();
        let mut masks = 0;

        handshake.quiesce(budget(3), &mut delay, || masks += 1).unwrap();

        // Once on entry, once after the handler is seen idle
        assert_eq!(masks, 2);
        assert!(handshake.is_disabled());
        assert!(handshake.has_exited());
        assert_eq!(delay.total_ns(), 0);
    }

    #[test]
    fn quiesce_busy_handler_times_out() {
        let handshake = IsrHandshake::new();
        handshake.enable();
        assert!(handshake.enter());

        let mut delay = MockDelay::new();
        let mut masks = 0;
        let result = handshake.quiesce(budget(5), &mut delay, || masks += 1);

        assert_eq!(result, Err(ConfigError::Busy));
        assert_eq!(delay.total_ns(), 5 * 100 * 1_000);
        assert_eq!(masks, 1);
        // Previous enable state restored
        assert!(!handshake.is_disabled());
        assert!(handshake.is_active());
    }
}
