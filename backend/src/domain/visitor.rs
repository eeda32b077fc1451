//! Visitor identity records tracked by the marketing site.
//!
//! A visitor is a browser-identified entity keyed by a client-generated
//! `visitor_id`. Re-identification across sessions relies on durable client
//! storage, not a server-issued token, so the identifier is opaque here.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum accepted length for a client-generated visitor identifier.
pub const VISITOR_ID_MAX: usize = 128;

/// Client-generated stable visitor identifier.
///
/// ## Invariants
/// - Non-empty once trimmed.
/// - At most [`VISITOR_ID_MAX`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VisitorId(String);

/// Validation errors for [`VisitorId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VisitorIdValidationError {
    #[error("visitor id must not be empty")]
    Empty,
    #[error("visitor id must be at most {VISITOR_ID_MAX} characters")]
    TooLong,
}

impl VisitorId {
    /// Validate and wrap a raw identifier.
    pub fn new(raw: impl Into<String>) -> Result<Self, VisitorIdValidationError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(VisitorIdValidationError::Empty);
        }
        if trimmed.chars().count() > VISITOR_ID_MAX {
            return Err(VisitorIdValidationError::TooLong);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for VisitorId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VisitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for VisitorId {
    type Error = VisitorIdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<VisitorId> for String {
    fn from(value: VisitorId) -> Self {
        value.0
    }
}

/// Coarse device classification reported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    Mobile,
    Tablet,
    Desktop,
    Unknown,
}

/// Error returned when parsing a device classification from string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid device classification")]
pub struct ParseDeviceError;

impl Device {
    /// Lenient classification for ingestion: unrecognised values map to
    /// [`Device::Unknown`] rather than rejecting the event.
    pub fn classify(raw: &str) -> Self {
        raw.parse().unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mobile => f.write_str("mobile"),
            Self::Tablet => f.write_str("tablet"),
            Self::Desktop => f.write_str("desktop"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

impl FromStr for Device {
    type Err = ParseDeviceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mobile" => Ok(Self::Mobile),
            "tablet" => Ok(Self::Tablet),
            "desktop" => Ok(Self::Desktop),
            "unknown" => Ok(Self::Unknown),
            _ => Err(ParseDeviceError),
        }
    }
}

/// A stored visitor record.
#[derive(Debug, Clone, PartialEq)]
pub struct Visitor {
    pub visitor_id: VisitorId,
    pub email: Option<String>,
    pub ip_address: String,
    pub device: Device,
    pub utm_source: Option<String>,
    /// Accumulated time on site, in seconds.
    pub time_on_site: i32,
    /// Whether this visitor became a paying customer.
    pub converted: bool,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Ingestion payload for recording a visitor sighting.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitorSighting {
    pub visitor_id: VisitorId,
    pub email: Option<String>,
    pub ip_address: String,
    pub device: Device,
    pub utm_source: Option<String>,
}

/// Filters applied to admin visitor listings and exports.
///
/// `search` is a case-insensitive partial match across the visitor
/// identifier and email columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisitorFilter {
    pub search: Option<String>,
    pub converted: Option<bool>,
    pub device: Option<Device>,
}

/// One traffic source and its visitor count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SourceCount {
    pub source: String,
    pub count: i64,
}

/// One device classification and its visitor count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCount {
    pub device: Device,
    pub count: i64,
}

/// Stats block computed over the full, unfiltered visitor set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitorStats {
    pub total_visitors: i64,
    /// Distinct visitors seen in the trailing 24 hours.
    pub unique_last_24h: i64,
    /// Mean accumulated time on site, in seconds.
    pub avg_time_on_site: f64,
    /// Share of visitors marked converted, as a percentage.
    pub conversion_rate: f64,
    /// Top traffic sources by visitor count, largest first (at most five).
    pub top_sources: Vec<SourceCount>,
    pub device_breakdown: Vec<DeviceCount>,
}
