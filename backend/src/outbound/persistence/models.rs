//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{admin_settings, payments, trials, user_events, visitors};

/// Row struct for reading from the visitors table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = visitors)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct VisitorRow {
    #[expect(dead_code, reason = "surrogate key; the domain keys on visitor_id")]
    pub id: i64,
    pub visitor_id: String,
    pub email: Option<String>,
    pub ip_address: String,
    pub device: String,
    pub utm_source: Option<String>,
    pub time_on_site: i32,
    pub converted: bool,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Insertable struct for first-sighting visitor rows.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = visitors)]
pub(crate) struct NewVisitorRow<'a> {
    pub visitor_id: &'a str,
    pub email: Option<&'a str>,
    pub ip_address: &'a str,
    pub device: &'a str,
    pub utm_source: Option<&'a str>,
    pub time_on_site: i32,
    pub converted: bool,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Changeset applied when a sighting hits an existing visitor row.
///
/// `None` fields are skipped by Diesel, so an absent email or UTM source
/// never clears a previously captured value.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = visitors)]
pub(crate) struct VisitorSightingUpdate<'a> {
    pub email: Option<&'a str>,
    pub ip_address: &'a str,
    pub device: &'a str,
    pub utm_source: Option<&'a str>,
    pub last_seen: DateTime<Utc>,
}

/// Insertable struct for appending one event row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_events)]
pub(crate) struct NewEventRow<'a> {
    pub event_type: &'a str,
    pub user_id: Option<Uuid>,
    pub email: Option<&'a str>,
    pub ip_address: &'a str,
    pub metadata: &'a serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Row struct for reading from the trials table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = trials)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TrialRow {
    pub id: i64,
    pub email: String,
    pub ip_address: String,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for recording a trial claim.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = trials)]
pub(crate) struct NewTrialRow<'a> {
    pub email: &'a str,
    pub ip_address: &'a str,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Row struct for reading from the payments table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PaymentRow {
    pub id: i64,
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
    pub amount_minor: i64,
    pub currency: String,
    pub plan: String,
    pub gateway_order_id: String,
    pub gateway_payment_id: Option<String>,
    pub gateway_signature: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Insertable struct for creating a `created` payment record.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = payments)]
pub(crate) struct NewPaymentRow<'a> {
    pub user_id: Option<Uuid>,
    pub email: Option<&'a str>,
    pub amount_minor: i64,
    pub currency: &'a str,
    pub plan: &'a str,
    pub gateway_order_id: &'a str,
    pub status: &'a str,
    pub created_at: DateTime<Utc>,
}

/// Row struct for reading from the admin_settings table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = admin_settings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SettingRow {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for writing a setting row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = admin_settings)]
pub(crate) struct NewSettingRow<'a> {
    pub key: &'a str,
    pub value: &'a str,
    pub updated_at: DateTime<Utc>,
}
