//! Per-hub publish/subscribe of list refreshes.
//!
//! Every connected viewer of a hub holds a receiver; mutation services publish
//! a [`RefreshEvent`] after a successful commit. Delivery is fire-and-forget:
//! a hub without viewers drops the event and a lagging viewer skips ahead.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tokio::sync::broadcast;

use crate::domain::types::HubId;
use crate::dto::terminations::RefreshEvent;

/// Sink for refresh events, implemented by the HTTP layer's broadcaster.
pub trait RefreshPublisher {
    fn publish(&self, hub_id: HubId, event: RefreshEvent);
}

/// Topic registry keyed by hub id.
pub struct TerminationBroadcaster {
    capacity: usize,
    channels: RwLock<HashMap<HubId, broadcast::Sender<RefreshEvent>>>,
}

impl TerminationBroadcaster {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            channels: RwLock::default(),
        }
    }

    /// Registers a new viewer of `hub_id`. Dropping the receiver unregisters it.
    pub fn subscribe(&self, hub_id: HubId) -> broadcast::Receiver<RefreshEvent> {
        let mut channels = self
            .channels
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        channels
            .entry(hub_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    pub fn subscriber_count(&self, hub_id: HubId) -> usize {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&hub_id)
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

impl RefreshPublisher for TerminationBroadcaster {
    fn publish(&self, hub_id: HubId, event: RefreshEvent) {
        let delivered = {
            let channels = self.channels.read().unwrap_or_else(PoisonError::into_inner);
            match channels.get(&hub_id) {
                Some(sender) => sender.send(event).ok(),
                None => return,
            }
        };

        match delivered {
            Some(receivers) => log::debug!("Refresh for hub {hub_id} sent to {receivers} viewers"),
            None => {
                // Every viewer has gone away; forget the topic.
                let mut channels = self
                    .channels
                    .write()
                    .unwrap_or_else(PoisonError::into_inner);
                if channels
                    .get(&hub_id)
                    .is_some_and(|sender| sender.receiver_count() == 0)
                {
                    channels.remove(&hub_id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::terminations::TerminationStatsDto;

    fn event(total: &str) -> RefreshEvent {
        RefreshEvent {
            terminations: vec![],
            stats: TerminationStatsDto {
                total_count: total.into(),
                recent_count: "0".into(),
            },
        }
    }

    #[tokio::test]
    async fn delivers_only_to_subscribers_of_the_same_hub() {
        let broadcaster = TerminationBroadcaster::new(4);
        let hub = HubId::new(1).unwrap();
        let other = HubId::new(2).unwrap();
        let mut first = broadcaster.subscribe(hub);
        let mut second = broadcaster.subscribe(hub);
        let mut foreign = broadcaster.subscribe(other);

        broadcaster.publish(hub, event("3"));

        assert_eq!(first.recv().await.unwrap(), event("3"));
        assert_eq!(second.recv().await.unwrap(), event("3"));
        assert!(foreign.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_a_no_op() {
        let broadcaster = TerminationBroadcaster::new(4);
        broadcaster.publish(HubId::new(1).unwrap(), event("1"));
        assert_eq!(broadcaster.subscriber_count(HubId::new(1).unwrap()), 0);
    }

    #[test]
    fn dropped_subscribers_are_forgotten() {
        let broadcaster = TerminationBroadcaster::new(4);
        let hub = HubId::new(1).unwrap();
        let receiver = broadcaster.subscribe(hub);
        assert_eq!(broadcaster.subscriber_count(hub), 1);

        drop(receiver);
        broadcaster.publish(hub, event("1"));

        assert_eq!(broadcaster.subscriber_count(hub), 0);
        assert!(broadcaster.channels.read().unwrap().is_empty());
    }
}
