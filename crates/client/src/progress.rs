//! Transfer progress reporting.
//!
//! Transports push [`Progress`] ticks into a [`ProgressSink`]; whoever started
//! the transfer reads them back from the paired [`ProgressStream`].

use std::pin::Pin;
use std::task::{Context, Poll};

use courier_core::Progress;
use futures_util::Stream;
use tokio::sync::mpsc;

/// Create a connected sink/stream pair.
pub fn progress_channel() -> (ProgressSink, ProgressStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ProgressSink { tx }, ProgressStream { rx })
}

/// Sending half. Cheap to clone; ticks sent after the stream is dropped are
/// discarded.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tx: mpsc::UnboundedSender<Progress>,
}

impl ProgressSink {
    pub fn send(&self, progress: Progress) {
        let _ = self.tx.send(progress);
    }

    pub fn report(&self, transferred: u64, total: Option<u64>) {
        self.send(Progress::new(transferred, total));
    }
}

/// Receiving half.
#[derive(Debug)]
pub struct ProgressStream {
    rx: mpsc::UnboundedReceiver<Progress>,
}

impl ProgressStream {
    /// Wait for the next tick. `None` once every sink is gone.
    pub async fn recv(&mut self) -> Option<Progress> {
        self.rx.recv().await
    }

    /// Take a tick that is already queued, without waiting.
    pub fn try_recv(&mut self) -> Option<Progress> {
        self.rx.try_recv().ok()
    }
}

impl Stream for ProgressStream {
    type Item = Progress;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
