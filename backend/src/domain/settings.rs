//! Administrator-controlled settings, including the tracking kill-switch.

use chrono::{DateTime, Utc};

/// Setting key for the global visitor-tracking switch.
pub const TRACKING_ENABLED_KEY: &str = "visitor_tracking_enabled";

/// A stored `{key, value}` setting row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// Interpret the tracking switch from an optional setting row.
///
/// A missing row means the operator never touched the switch and tracking
/// defaults to enabled. Only an explicit `"false"` disables it. Storage
/// *unreachable* is a different situation and is handled fail-closed by the
/// status endpoint, not here.
pub fn tracking_enabled(setting: Option<&Setting>) -> bool {
    match setting {
        Some(row) => !row.value.trim().eq_ignore_ascii_case("false"),
        None => true,
    }
}

/// Canonical stored representation of the switch.
pub fn tracking_value(enabled: bool) -> &'static str {
    if enabled { "true" } else { "false" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn setting(value: &str) -> Setting {
        Setting {
            key: TRACKING_ENABLED_KEY.to_owned(),
            value: value.to_owned(),
            updated_at: Utc::now(),
        }
    }

    #[rstest]
    #[case(None, true)]
    #[case(Some("true"), true)]
    #[case(Some("false"), false)]
    #[case(Some("FALSE"), false)]
    #[case(Some(" false "), false)]
    #[case(Some("garbage"), true)]
    fn interprets_switch_with_enabled_default(#[case] value: Option<&str>, #[case] expected: bool) {
        let row = value.map(setting);
        assert_eq!(tracking_enabled(row.as_ref()), expected);
    }

    #[rstest]
    fn round_trips_canonical_values() {
        assert!(tracking_enabled(Some(&setting(tracking_value(true)))));
        assert!(!tracking_enabled(Some(&setting(tracking_value(false)))));
    }
}
