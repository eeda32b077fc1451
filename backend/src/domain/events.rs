//! Append-only user events.
//!
//! Events serve both product analytics (generation and signup funnels) and
//! the audit trail for admin actions. Rows are immutable once written.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use uuid::Uuid;

/// Identifier assigned to an event row on insert.
pub type EventId = i64;

/// Event type recorded when an administrator changes a setting.
pub const SETTING_CHANGED_EVENT: &str = "admin_setting_changed";

/// Event type recorded when a payment completes verification.
pub const PAYMENT_COMPLETED_EVENT: &str = "payment_completed";

/// A stored event row.
#[derive(Debug, Clone, PartialEq)]
pub struct UserEvent {
    pub id: EventId,
    pub event_type: String,
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
    pub ip_address: String,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

/// Payload for appending one event.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub event_type: String,
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
    pub ip_address: String,
    pub metadata: Value,
}

/// Validation errors for [`NewEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EventValidationError {
    #[error("event type must not be empty")]
    EmptyEventType,
}

impl NewEvent {
    /// Build a validated event payload.
    pub fn new(
        event_type: impl Into<String>,
        user_id: Option<Uuid>,
        email: Option<String>,
        ip_address: impl Into<String>,
        metadata: Value,
    ) -> Result<Self, EventValidationError> {
        let event_type = event_type.into();
        if event_type.trim().is_empty() {
            return Err(EventValidationError::EmptyEventType);
        }
        Ok(Self {
            event_type,
            user_id,
            email,
            ip_address: ip_address.into(),
            metadata,
        })
    }

    /// Audit record for an admin settings change, capturing old and new
    /// values and a fingerprint of the acting credential.
    pub fn setting_audit(key: &str, old_value: Option<&str>, new_value: &str, actor: &str) -> Self {
        Self {
            event_type: SETTING_CHANGED_EVENT.to_owned(),
            user_id: None,
            email: None,
            ip_address: "internal".to_owned(),
            metadata: json!({
                "key": key,
                "oldValue": old_value,
                "newValue": new_value,
                "actor": actor,
            }),
        }
    }

    /// Audit record for a verified payment.
    pub fn payment_audit(gateway_order_id: &str, gateway_payment_id: &str) -> Self {
        Self {
            event_type: PAYMENT_COMPLETED_EVENT.to_owned(),
            user_id: None,
            email: None,
            ip_address: "internal".to_owned(),
            metadata: json!({
                "gatewayOrderId": gateway_order_id,
                "gatewayPaymentId": gateway_payment_id,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn rejects_empty_event_type() {
        let result = NewEvent::new("  ", None, None, "1.2.3.4", Value::Null);
        assert_eq!(result, Err(EventValidationError::EmptyEventType));
    }

    #[rstest]
    fn setting_audit_captures_old_and_new_values() {
        let event = NewEvent::setting_audit("visitor_tracking_enabled", Some("true"), "false", "a1b2c3");
        assert_eq!(event.event_type, SETTING_CHANGED_EVENT);
        assert_eq!(event.metadata["oldValue"], "true");
        assert_eq!(event.metadata["newValue"], "false");
        assert_eq!(event.metadata["actor"], "a1b2c3");
    }

    #[rstest]
    fn setting_audit_encodes_missing_old_value_as_null() {
        let event = NewEvent::setting_audit("visitor_tracking_enabled", None, "true", "a1b2c3");
        assert!(event.metadata["oldValue"].is_null());
    }
}
