//! Domain event publishing over NATS.

use tracing::{debug, info, warn};

use crate::domain::events::DomainEvent;

/// Publishes domain events when a NATS client is configured; otherwise the
/// events are only logged. Failures never reach the caller.
#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }

    pub fn disabled() -> Self { Self { nats: None } }

    pub async fn connect(url: &str) -> Self {
        match async_nats::connect(url).await {
            Ok(client) => {
                info!(url, "Connected to NATS");
                Self::new(Some(client))
            }
            Err(e) => {
                warn!(url, error = %e, "NATS unavailable, events will only be logged");
                Self::disabled()
            }
        }
    }

    pub async fn publish(&self, events: Vec<DomainEvent>) {
        for event in events {
            let subject = event.subject();
            let Some(client) = &self.nats else {
                debug!(subject, ?event, "Event (no bus)");
                continue;
            };
            let payload = match serde_json::to_vec(&event) {
                Ok(p) => p,
                Err(e) => {
                    warn!(subject, error = %e, "Failed to encode event");
                    continue;
                }
            };
            if let Err(e) = client.publish(subject.to_string(), payload.into()).await {
                warn!(subject, error = %e, "Failed to publish event");
            }
        }
    }
}
