//! Log of payment webhook deliveries already handled.
//!
//! Dodo retries a delivery until it gets a 2xx, reusing its `webhook-id`.
//! A row per id turns retries into no-ops and keeps the payload around.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp};

use super::{SaveResult, WebhookEvent};

/// How a delivery was disposed of. Failed deliveries are not logged so the
/// vendor's retry gets another attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Processed,
    /// Acknowledged without side effects; carries the reason.
    Ignored(String),
}

impl WebhookOutcome {
    /// Value stored in `webhook_events.outcome`.
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookOutcome::Processed => "processed",
            WebhookOutcome::Ignored(_) => "ignored",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            WebhookOutcome::Processed => None,
            WebhookOutcome::Ignored(reason) => Some(reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEventRecord {
    /// `webhook-id` of the delivery.
    pub event_id: String,
    pub event_type: String,
    pub processed_at: Timestamp,
    pub outcome: WebhookOutcome,
    pub payload: serde_json::Value,
}

impl WebhookEventRecord {
    pub fn new(event: &WebhookEvent, outcome: WebhookOutcome) -> Self {
        Self {
            event_id: event.id.clone(),
            event_type: event.event_type.clone(),
            processed_at: Timestamp::now(),
            outcome,
            payload: event.payload.clone(),
        }
    }
}

/// Implementations insert with `ON CONFLICT (event_id) DO NOTHING`, so of
/// two concurrent deliveries only one sees [`SaveResult::Inserted`].
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError>;

    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::WebhookEventData;

    fn dispute() -> WebhookEvent {
        WebhookEvent {
            id: "msg_456".to_string(),
            event_type: "dispute.opened".to_string(),
            data: WebhookEventData::Other,
            payload: serde_json::json!({"type": "dispute.opened"}),
        }
    }

    #[test]
    fn webhook_event_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn WebhookEventRepository) {}
    }

    #[test]
    fn record_copies_delivery_identity_and_payload() {
        let record = WebhookEventRecord::new(&dispute(), WebhookOutcome::Processed);
        assert_eq!(record.event_id, "msg_456");
        assert_eq!(record.event_type, "dispute.opened");
        assert_eq!(record.payload["type"], "dispute.opened");
        assert!(record.outcome.reason().is_none());
    }

    #[test]
    fn ignored_outcome_keeps_its_reason() {
        let outcome = WebhookOutcome::Ignored("Unhandled event type".to_string());
        assert_eq!(outcome.as_str(), "ignored");
        assert_eq!(outcome.reason(), Some("Unhandled event type"));
    }
}
