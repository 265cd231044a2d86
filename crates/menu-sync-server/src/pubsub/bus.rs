use crate::metrics::Metrics;
use dashmap::DashMap;
use menu_proto::PushEvent;
use std::sync::Arc;
use tokio::sync::broadcast;

/// One broadcast channel per record key, created on first subscribe.
pub struct PubSubBus {
    channels: DashMap<String, broadcast::Sender<PushEvent>>,
    capacity: usize,
    metrics: Arc<Metrics>,
}

impl PubSubBus {
    pub fn new(capacity: usize, metrics: Arc<Metrics>) -> Self {
        Self {
            channels: DashMap::new(),
            capacity,
            metrics,
        }
    }

    pub fn publish(&self, event: PushEvent) {
        let mut stale = false;
        if let Some(sender) = self.channels.get(&event.key) {
            // at-most-once: no receivers means nobody is listening right now
            if sender.send(event.clone()).is_ok() {
                self.metrics.inc_published();
            } else {
                stale = true;
            }
        }
        if stale {
            self.channels
                .remove_if(&event.key, |_, tx| tx.receiver_count() == 0);
        }
    }

    pub fn subscribe(&self, key: &str) -> broadcast::Receiver<PushEvent> {
        let entry = self.channels.entry(key.to_string()).or_insert_with(|| {
            let (tx, _rx) = broadcast::channel(self.capacity);
            tx
        });
        entry.subscribe()
    }

    pub fn topic_count(&self) -> u64 {
        self.channels.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn event(key: &str, v: &'static [u8]) -> PushEvent {
        PushEvent {
            key: key.into(),
            value: Some(Bytes::from_static(v)),
            ts_ms: 0,
        }
    }

    #[tokio::test]
    async fn test_subscribers_receive_in_publish_order() {
        let bus = PubSubBus::new(8, Arc::new(Metrics::new()));
        let mut a = bus.subscribe("menu_v2");
        let mut b = bus.subscribe("menu_v2");

        bus.publish(event("menu_v2", b"1"));
        bus.publish(event("menu_v2", b"2"));
        bus.publish(event("other", b"x"));

        for rx in [&mut a, &mut b] {
            assert_eq!(rx.recv().await.unwrap().value.unwrap(), &b"1"[..]);
            assert_eq!(rx.recv().await.unwrap().value.unwrap(), &b"2"[..]);
        }
        assert_eq!(bus.topic_count(), 1);
    }

    #[test]
    fn test_channel_dropped_when_no_receivers() {
        let bus = PubSubBus::new(8, Arc::new(Metrics::new()));
        drop(bus.subscribe("menu_v2"));
        assert_eq!(bus.topic_count(), 1);
        bus.publish(event("menu_v2", b"1"));
        assert_eq!(bus.topic_count(), 0);
    }
}
