//! In-process event bus
//!
//! Services publish billing facts (bill issued, payment recorded, ...) and
//! any number of subscribers receive every message. Delivery to customers
//! is someone else's job: the bus only fans messages out.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::domain::events::{Event, EventMessage};

const DEFAULT_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventMessage>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish and return how many subscribers got the message. Publishing
    /// with nobody listening is not an error.
    pub fn publish(&self, event: Event) -> usize {
        let message = EventMessage::new(event);
        let event_type = message.event.event_type();
        let customer_id = message.event.customer_id();

        metrics::counter!("billing_events_published_total", "event_type" => event_type)
            .increment(1);

        let delivered = self.sender.send(message).unwrap_or(0);
        debug!(event_type, ?customer_id, subscribers = delivered, "Event published");
        delivered
    }

    /// Every event, in publish order.
    pub fn subscribe(&self) -> EventSubscriber {
        EventSubscriber {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

pub struct EventSubscriber {
    receiver: broadcast::Receiver<EventMessage>,
}

impl EventSubscriber {
    /// Next message; `None` once the bus is gone. A subscriber that falls
    /// behind skips what it missed and carries on.
    pub async fn recv(&mut self) -> Option<EventMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(msg) => return Some(msg),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "Event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

pub type SharedEventBus = Arc<EventBus>;

pub fn create_event_bus() -> SharedEventBus {
    Arc::new(EventBus::new())
}
