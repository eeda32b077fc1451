//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are
//! used by Diesel for compile-time query validation and type-safe SQL
//! generation. Regenerate with `diesel print-schema` after migration
//! changes.

diesel::table! {
    /// Visitor identity records, one evolving row per `visitor_id`.
    visitors (id) {
        id -> Int8,
        /// Client-generated stable identifier; unique per browser install.
        visitor_id -> Varchar,
        email -> Nullable<Varchar>,
        ip_address -> Varchar,
        device -> Varchar,
        utm_source -> Nullable<Varchar>,
        /// Accumulated time on site, in seconds.
        time_on_site -> Int4,
        converted -> Bool,
        created_at -> Timestamptz,
        last_seen -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only product and audit events.
    user_events (id) {
        id -> Int8,
        event_type -> Varchar,
        user_id -> Nullable<Uuid>,
        email -> Nullable<Varchar>,
        ip_address -> Varchar,
        metadata -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Consumed free-trial entitlements, one per `{email, ip}` claim.
    trials (id) {
        id -> Int8,
        email -> Varchar,
        ip_address -> Varchar,
        email_verified -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Checkout payment records.
    payments (id) {
        id -> Int8,
        user_id -> Nullable<Uuid>,
        email -> Nullable<Varchar>,
        /// Amount in minor currency units.
        amount_minor -> Int8,
        currency -> Varchar,
        plan -> Varchar,
        gateway_order_id -> Varchar,
        gateway_payment_id -> Nullable<Varchar>,
        gateway_signature -> Nullable<Varchar>,
        status -> Varchar,
        created_at -> Timestamptz,
        paid_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Generic admin key/value settings.
    admin_settings (key) {
        key -> Varchar,
        value -> Text,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// User accounts, read-only in this service; owned by the auth
    /// provider sync.
    users (id) {
        id -> Uuid,
        email -> Varchar,
        plan -> Varchar,
        subscription_active -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Portrait generations, read-only in this service.
    generations (id) {
        id -> Int8,
        user_id -> Uuid,
        style -> Varchar,
        background -> Nullable<Varchar>,
        accessory -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(payments -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(payments, users);
