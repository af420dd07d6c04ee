//! Inbound side of the transport
//!
//! A transport hands every context one [`Inbox`]: the single subscription
//! through which raw messages for that context arrive.

use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tokio_stream::Stream;

use crate::domain::TargetHandle;

/// A raw message as delivered by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    /// Serialized payload, not necessarily ours
    pub data: String,
    /// Origin of the sending context, as seen by the transport
    pub origin: String,
    /// The sending context, if known
    pub source: Option<TargetHandle>,
}

impl RawMessage {
    pub fn new(data: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            origin: origin.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: TargetHandle) -> Self {
        self.source = Some(source);
        self
    }
}

/// Receive half of one context's inbound notifications
#[derive(Debug)]
pub struct Inbox {
    receiver: mpsc::UnboundedReceiver<RawMessage>,
}

impl Inbox {
    /// Create a connected sender/inbox pair
    #[must_use]
    pub fn channel() -> (mpsc::UnboundedSender<RawMessage>, Self) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (sender, Self { receiver })
    }

    /// Wait for the next message; `None` once every sender is gone
    pub async fn recv(&mut self) -> Option<RawMessage> {
        self.receiver.recv().await
    }

    /// Take a message if one is already queued
    pub fn try_recv(&mut self) -> Option<RawMessage> {
        self.receiver.try_recv().ok()
    }
}

impl Stream for Inbox {
    type Item = RawMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
