use crate::domain::AuditEvent;
use crate::error::AuditResult;
use crate::ports::AuditLog;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::DeliveryId;

/// In-memory audit sink with snapshot queries.
#[derive(Default)]
pub struct InMemoryAuditLog {
    events: RwLock<Vec<AuditEvent>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events in append order.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.read().clone()
    }

    pub fn events_for(&self, delivery_id: DeliveryId) -> Vec<AuditEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.delivery_id == delivery_id)
            .cloned()
            .collect()
    }

    /// Number of events of `event_type` for a delivery.
    pub fn count(&self, delivery_id: DeliveryId, event_type: &str) -> usize {
        self.events
            .read()
            .iter()
            .filter(|e| e.delivery_id == delivery_id && e.event_type() == event_type)
            .count()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn append(&self, event: AuditEvent) -> AuditResult<()> {
        self.events.write().push(event);
        Ok(())
    }
}
