//! Publishes domain events to NATS when a bus is configured.

use crate::domain::events::DomainEvent;

#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    /// A publisher that drops every event.
    pub fn disabled() -> Self {
        Self { nats: None }
    }

    pub fn new(client: async_nats::Client) -> Self {
        Self { nats: Some(client) }
    }

    /// Connects to `url`, falling back to a disabled publisher when the bus is
    /// unreachable.
    pub async fn connect(url: &str) -> Self {
        match async_nats::connect(url).await {
            Ok(client) => {
                tracing::info!(url, "Connected to NATS");
                Self::new(client)
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "NATS unavailable, events disabled");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.nats.is_some()
    }

    /// Fire-and-forget; a failed publish is logged and never reaches the caller.
    pub async fn publish(&self, event: DomainEvent) {
        let Some(client) = &self.nats else { return };
        let subject = event.subject();
        let payload = match serde_json::to_vec(&event) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(subject, error = %e, "Failed to encode event");
                return;
            }
        };
        if let Err(e) = client.publish(subject.to_string(), payload.into()).await {
            tracing::warn!(subject, error = %e, "Failed to publish event");
        }
    }
}
