use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use upkeep_core::events::{ChangeEvent, ChangeSink};

/// Fans change notifications out to any number of subscribers.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<ChangeEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

impl ChangeSink for BroadcastSink {
    fn publish(&self, event: ChangeEvent) {
        // No subscribers is not an error.
        let _ = self.tx.send(event);
    }
}

pub(crate) fn spawn_change_logger(mut rx: broadcast::Receiver<ChangeEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let payload = serde_json::to_string(&event).unwrap_or_default();
                    tracing::info!(
                        kind = event.kind(),
                        list_id = event.list_id(),
                        payload = payload.as_str(),
                        "change"
                    );
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "change logger lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::debug!("change channel closed");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let sink = BroadcastSink::new(8);
        let mut rx = sink.subscribe();
        sink.publish(ChangeEvent::ListDeleted {
            list_id: "01HX".into(),
        });

        let event = rx.recv().await.expect("event");
        assert_eq!(event.kind(), "list_deleted");
        assert_eq!(event.list_id(), "01HX");
    }

    #[tokio::test]
    async fn publishing_without_subscribers_is_silent() {
        let sink = BroadcastSink::new(1);
        sink.publish(ChangeEvent::ListDeleted {
            list_id: "gone".into(),
        });
    }

    #[tokio::test]
    async fn logger_stops_when_channel_closes() {
        let sink = BroadcastSink::new(4);
        let handle = spawn_change_logger(sink.subscribe());
        sink.publish(ChangeEvent::TaskDeleted {
            list_id: "a".into(),
            task_id: "b".into(),
        });
        drop(sink);
        handle.await.expect("logger task");
    }
}
