use tokio::sync::mpsc;

use crate::types::StreamEvent;

/// Per-request event sink backed by a bounded tokio mpsc channel.
/// A sink without a receiver swallows every event.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::Sender<StreamEvent>>,
}

impl EventSink {
    /// Create a sink and the receiver that drains it.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<StreamEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink that discards everything (synchronous invocations).
    pub fn discard() -> Self {
        Self { tx: None }
    }

    pub async fn publish(&self, event: StreamEvent) {
        if let Some(tx) = &self.tx {
            // Ignore error if the receiver hung up
            let _ = tx.send(event).await;
        }
    }

    pub async fn status(&self, content: impl Into<String>) {
        self.publish(StreamEvent::status(content)).await;
    }

    pub async fn token(&self, content: impl Into<String>) {
        self.publish(StreamEvent::token(content)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let (sink, mut rx) = EventSink::channel(8);
        sink.status("retrieving").await;
        sink.token("a").await;
        sink.token("b").await;
        drop(sink);

        let mut got = Vec::new();
        while let Some(e) = rx.recv().await {
            got.push(e);
        }
        assert_eq!(
            got,
            vec![
                StreamEvent::status("retrieving"),
                StreamEvent::token("a"),
                StreamEvent::token("b"),
            ]
        );
    }

    #[tokio::test]
    async fn test_closed_receiver_is_ignored() {
        let (sink, rx) = EventSink::channel(1);
        drop(rx);
        sink.token("lost").await;
        EventSink::discard().token("also lost").await;
    }
}
