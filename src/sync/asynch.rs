//! Async/await support for the channels.
//!
//! An [`AtomicWaker`] doubles as a [`SignalSink`]: install it as a
//! channel's frame signal and the futures below are woken from the
//! interrupt handler.
//!
//! # Example
//!
//! ```ignore
//! use arinc717_link::sync::asynch::{AsyncRxExt, RX_WAKER};
//!
//! RX.install_frame_signal(&RX_WAKER)?;
//! let mut frame = [0u8; 128];
//! let bytes = RX.read_frame_async(&RX_WAKER, &mut frame).await?;
//! ```

use core::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use super::primitives::AtomicWaker;
use crate::driver::config::State;
use crate::error::{IoError, IoResult};
use crate::driver::{RxChannel, TxChannel};
use crate::hal::bus::RegisterBus;
use crate::hal::signal::{SignalKind, SignalSink};

/// Waker for receive frame events.
pub static RX_WAKER: AtomicWaker = AtomicWaker::new();

/// Waker for transmit adoption events.
pub static TX_WAKER: AtomicWaker = AtomicWaker::new();

impl SignalSink for AtomicWaker {
    #[inline]
    fn notify(&self, _kind: SignalKind) {
        self.wake();
    }
}

/// Future that resolves with the next published receive frame.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct RxFrameFuture<'a, B: RegisterBus, const CAP: usize> {
    channel: &'a RxChannel<B, CAP>,
    waker: &'a AtomicWaker,
    buffer: &'a mut [u8],
    seen: u32,
}

impl<'a, B: RegisterBus, const CAP: usize> RxFrameFuture<'a, B, CAP> {
    /// Create a future for the first frame published after this call.
    pub fn new(
        channel: &'a RxChannel<B, CAP>,
        waker: &'a AtomicWaker,
        buffer: &'a mut [u8],
    ) -> Self {
        let seen = channel.frame_generation();
        Self {
            channel,
            waker,
            buffer,
            seen,
        }
    }
}

impl<B: RegisterBus, const CAP: usize> Future for RxFrameFuture<'_, B, CAP> {
    type Output = IoResult<usize>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if this.channel.state() != State::Running {
            return Poll::Ready(Err(IoError::NotReady));
        }

        if this.channel.frame_generation() == this.seen {
            this.waker.register(cx.waker());
            if this.channel.frame_generation() == this.seen {
                return Poll::Pending;
            }
        }

        Poll::Ready(this.channel.block_read(this.buffer))
    }
}

/// Future that stages a transmit frame once the previous one was adopted.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct TxStageFuture<'a, B: RegisterBus, const CAP: usize> {
    channel: &'a TxChannel<B, CAP>,
    waker: &'a AtomicWaker,
    data: &'a [u8],
}

impl<'a, B: RegisterBus, const CAP: usize> TxStageFuture<'a, B, CAP> {
    /// Create a new staging future.
    pub fn new(
        channel: &'a TxChannel<B, CAP>,
        waker: &'a AtomicWaker,
        data: &'a [u8],
    ) -> Self {
        Self {
            channel,
            waker,
            data,
        }
    }
}

impl<B: RegisterBus, const CAP: usize> Future for TxStageFuture<'_, B, CAP> {
    type Output = IoResult<usize>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if this.channel.state() == State::Running && this.channel.is_staged_pending() {
            this.waker.register(cx.waker());
            if this.channel.is_staged_pending() {
                return Poll::Pending;
            }
        }

        Poll::Ready(this.channel.block_write(this.data))
    }
}

/// Extension trait providing async reads for receive channels.
pub trait AsyncRxExt<B: RegisterBus, const CAP: usize> {
    /// Wait for the next published frame and copy it into `buffer`.
    ///
    /// `waker` must be installed as the channel's frame signal.
    fn read_frame_async<'a>(
        &'a self,
        waker: &'a AtomicWaker,
        buffer: &'a mut [u8],
    ) -> RxFrameFuture<'a, B, CAP>;
}

impl<B: RegisterBus, const CAP: usize> AsyncRxExt<B, CAP> for RxChannel<B, CAP> {
    fn read_frame_async<'a>(
        &'a self,
        waker: &'a AtomicWaker,
        buffer: &'a mut [u8],
    ) -> RxFrameFuture<'a, B, CAP> {
        RxFrameFuture::new(self, waker, buffer)
    }
}

/// Extension trait providing async writes for transmit channels.
pub trait AsyncTxExt<B: RegisterBus, const CAP: usize> {
    /// Wait until no staged frame is pending, then stage `data`.
    ///
    /// `waker` must be installed as the channel's frame signal.
    fn write_frame_async<'a>(
        &'a self,
        waker: &'a AtomicWaker,
        data: &'a [u8],
    ) -> TxStageFuture<'a, B, CAP>;
}

impl<B: RegisterBus, const CAP: usize> AsyncTxExt<B, CAP> for TxChannel<B, CAP> {
    fn write_frame_async<'a>(
        &'a self,
        waker: &'a AtomicWaker,
        data: &'a [u8],
    ) -> TxStageFuture<'a, B, CAP> {
        TxStageFuture::new(self, waker, data)
    }
}
