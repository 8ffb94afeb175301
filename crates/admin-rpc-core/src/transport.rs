//! Message channel produced by every transport adapter.
//!
//! A transport adapter (WebSocket, line-delimited stream, in-memory pair)
//! pumps its concrete connection into a `Channel`: outbound text goes through
//! an unbounded queue so sending never blocks the caller, inbound text arrives
//! in order on a receiver. The receiver closing means the transport is lost.
//!
//! Dropping a channel stops the receive pump at once. The send pump keeps
//! running until every `Outbox` handle is gone, so messages enqueued just
//! before the drop still reach the peer and the connection closes cleanly.

use tokio::{sync::mpsc, task::JoinHandle};

use crate::TransportError;

/// Cloneable, non-blocking sending half of a channel.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<String>,
}

impl Outbox {
    /// Enqueue one message.
    ///
    /// # Errors
    /// Returns error if the transport has shut down.
    pub fn send(&self, message: String) -> Result<(), TransportError> {
        self.tx
            .send(message)
            .map_err(|_| TransportError::ChannelClosed)
    }

    /// Whether the transport has shut down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// One end of an ordered, bidirectional message stream.
pub struct Channel {
    outbox: Outbox,
    inbound: mpsc::UnboundedReceiver<String>,
    send_task: Option<JoinHandle<()>>,
    recv_tasks: Vec<JoinHandle<()>>,
}

impl Channel {
    /// Build a channel from raw queue halves.
    #[must_use]
    pub const fn new(
        outbound: mpsc::UnboundedSender<String>,
        inbound: mpsc::UnboundedReceiver<String>,
    ) -> Self {
        Self {
            outbox: Outbox { tx: outbound },
            inbound,
            send_task: None,
            recv_tasks: Vec::new(),
        }
    }

    /// Create two connected in-memory ends.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();
        (Self::new(a_tx, a_rx), Self::new(b_tx, b_rx))
    }

    /// Attach the task draining the outbound queue into the connection.
    ///
    /// It is never aborted: it ends once the queue is closed and empty.
    #[must_use]
    pub fn with_send_task(mut self, task: JoinHandle<()>) -> Self {
        self.send_task = Some(task);
        self
    }

    /// Attach a task feeding the inbound queue; it is aborted when the
    /// channel drops.
    #[must_use]
    pub fn with_recv_task(mut self, task: JoinHandle<()>) -> Self {
        self.recv_tasks.push(task);
        self
    }

    /// Get a sending handle.
    #[must_use]
    pub fn outbox(&self) -> Outbox {
        self.outbox.clone()
    }

    /// Enqueue one outbound message.
    ///
    /// # Errors
    /// Returns error if the transport has shut down.
    pub fn send(&self, message: String) -> Result<(), TransportError> {
        self.outbox.send(message)
    }

    /// Receive the next inbound message. `None` means the transport is lost.
    pub async fn recv(&mut self) -> Option<String> {
        self.inbound.recv().await
    }

    /// Receive without waiting.
    pub fn try_recv(&mut self) -> Option<String> {
        self.inbound.try_recv().ok()
    }

    /// Close the channel and wait until queued messages are written.
    ///
    /// Returns once every other `Outbox` handle has been dropped too.
    pub async fn close(mut self) {
        let send_task = self.send_task.take();
        drop(self);
        let Some(task) = send_task else {
            return;
        };
        if let Err(e) = task.await {
            tracing::warn!("Send task ended abnormally: {e}");
        }
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        for task in &self.recv_tasks {
            task.abort();
        }
    }
}
