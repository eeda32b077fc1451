//! Shared validation helpers for inbound HTTP adapters.
//!
//! Validation failures respond 400 with a field-level details payload so
//! clients can point at the offending input.

use serde_json::json;

use crate::domain::Error;

/// Error for a required field that is absent or empty.
pub(crate) fn missing_field_error(field: &str) -> Error {
    Error::invalid_request(format!("{field} is required")).with_details(json!({
        "field": field,
        "code": "missing_field",
    }))
}

/// Error for a field whose value fails validation.
pub(crate) fn invalid_field_error(field: &str, message: impl Into<String>, value: &str) -> Error {
    Error::invalid_request(message.into()).with_details(json!({
        "field": field,
        "value": value,
        "code": "invalid_value",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn missing_field_carries_field_name() {
        let error = missing_field_error("visitorId");
        assert_eq!(error.message(), "visitorId is required");
        let details = error.details().expect("details present");
        assert_eq!(details["field"], "visitorId");
        assert_eq!(details["code"], "missing_field");
    }

    #[rstest]
    fn invalid_field_carries_offending_value() {
        let error = invalid_field_error("device", "unknown device classification", "fridge");
        let details = error.details().expect("details present");
        assert_eq!(details["value"], "fridge");
        assert_eq!(details["code"], "invalid_value");
    }
}
