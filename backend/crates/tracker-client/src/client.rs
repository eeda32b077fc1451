//! The event tracker: kill-switch probe, visitor sightings, and
//! fire-and-forget event delivery.
//!
//! Telemetry calls return [`SoftResult`] instead of `Result`: callers on
//! non-critical paths ignore the error channel by contract, so a tracking
//! outage can never break the primary flow. Right-to-erasure is the one
//! hard-errored operation, because the caller must know whether the data
//! is actually gone.

use chrono::Utc;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::consent::should_track;
use crate::identity::IdentityManager;
use crate::store::StateStore;

/// Errors surfaced by the tracker.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// The endpoint URL could not be derived from the base URL.
    #[error("invalid tracker endpoint: {0}")]
    Endpoint(String),
    /// The request never reached the server.
    #[error("tracker transport failed: {0}")]
    Transport(String),
    /// The server answered with a non-success status.
    #[error("tracker request rejected with status {0}")]
    Status(u16),
}

/// Outcome of a fire-and-forget telemetry call.
///
/// Carries its failure as data. Non-critical callers drop the value;
/// tests and diagnostics can still inspect what happened.
#[derive(Debug)]
pub struct SoftResult {
    outcome: SoftOutcome,
}

#[derive(Debug)]
enum SoftOutcome {
    Sent,
    Suppressed,
    Failed(TrackerError),
}

impl SoftResult {
    fn sent() -> Self {
        Self {
            outcome: SoftOutcome::Sent,
        }
    }

    fn suppressed() -> Self {
        Self {
            outcome: SoftOutcome::Suppressed,
        }
    }

    fn failed(error: TrackerError) -> Self {
        Self {
            outcome: SoftOutcome::Failed(error),
        }
    }

    /// True when the event reached the server.
    pub fn was_sent(&self) -> bool {
        matches!(self.outcome, SoftOutcome::Sent)
    }

    /// True when the gate (kill-switch or consent) held the event back.
    pub fn was_suppressed(&self) -> bool {
        matches!(self.outcome, SoftOutcome::Suppressed)
    }

    /// The swallowed failure, if any.
    pub fn error(&self) -> Option<&TrackerError> {
        match &self.outcome {
            SoftOutcome::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Remote tracking switch state as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingStatus {
    Online,
    Offline,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: String,
}

/// Client-side tracker bound to one backend and one identity store.
pub struct TrackerClient<S: StateStore> {
    http: Client,
    base_url: Url,
    identity: IdentityManager<S>,
    /// Cached kill-switch state; `None` until the first probe, treated as
    /// offline so nothing tracks before the switch is confirmed.
    remote_enabled: Option<bool>,
}

impl<S: StateStore> TrackerClient<S> {
    /// Build a tracker against the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Transport`] when the HTTP client cannot be
    /// constructed.
    pub fn new(base_url: Url, identity: IdentityManager<S>) -> Result<Self, TrackerError> {
        let http = Client::builder()
            .build()
            .map_err(|err| TrackerError::Transport(err.to_string()))?;
        Ok(Self {
            http,
            base_url,
            identity,
            remote_enabled: None,
        })
    }

    /// Access the underlying identity and consent manager.
    pub fn identity_mut(&mut self) -> &mut IdentityManager<S> {
        &mut self.identity
    }

    fn endpoint(&self, path: &str) -> Result<Url, TrackerError> {
        self.base_url
            .join(path)
            .map_err(|err| TrackerError::Endpoint(err.to_string()))
    }

    /// Probe the remote kill-switch and cache the answer.
    ///
    /// Fails closed: a transport failure or an unexpected body reads as
    /// [`TrackingStatus::Offline`], because an unconfirmed switch must
    /// mean "do not track".
    pub async fn refresh_status(&mut self) -> TrackingStatus {
        let status = self.probe_status().await;
        self.remote_enabled = Some(status == TrackingStatus::Online);
        status
    }

    async fn probe_status(&self) -> TrackingStatus {
        let url = match self.endpoint("api/v1/tracking-status") {
            Ok(url) => url,
            Err(err) => {
                warn!(error = %err, "tracking status probe misconfigured");
                return TrackingStatus::Offline;
            }
        };
        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                debug!(error = %err, "tracking status probe failed; treating as offline");
                return TrackingStatus::Offline;
            }
        };
        if !response.status().is_success() {
            return TrackingStatus::Offline;
        }
        match response.json::<StatusBody>().await {
            Ok(body) if body.status == "online" => TrackingStatus::Online,
            Ok(_) => TrackingStatus::Offline,
            Err(err) => {
                debug!(error = %err, "tracking status body undecodable; treating as offline");
                TrackingStatus::Offline
            }
        }
    }

    /// True when both the cached kill-switch and unexpired consent allow
    /// tracking right now.
    pub fn tracking_allowed(&self) -> bool {
        should_track(
            self.remote_enabled.unwrap_or(false),
            self.identity.consent(Utc::now()),
        )
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<(), TrackerError> {
        let url = self.endpoint(path)?;
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| TrackerError::Transport(err.to_string()))?;
        if !response.status().is_success() {
            return Err(TrackerError::Status(response.status().as_u16()));
        }
        Ok(())
    }

    /// Record a visitor sighting for this identity.
    pub async fn record_visitor(
        &mut self,
        device: &str,
        utm_source: Option<&str>,
    ) -> SoftResult {
        if !self.tracking_allowed() {
            return SoftResult::suppressed();
        }
        let identity = self.identity.visitor_identity();
        let mut body = json!({
            "visitorId": identity.visitor_id,
            "device": device,
        });
        if let Some(source) = utm_source {
            body["utmSource"] = Value::String(source.to_owned());
        }
        match self.post_json("api/v1/track-visitor", &body).await {
            Ok(()) => SoftResult::sent(),
            Err(error) => {
                warn!(%error, "visitor sighting dropped");
                SoftResult::failed(error)
            }
        }
    }

    /// Record a page view. Call on initial load and on history
    /// navigation; same-page state changes do not count.
    pub async fn track_page_view(&mut self, path: &str) -> SoftResult {
        self.track_event("page_view", json!({ "path": path })).await
    }

    /// Fire one custom event. Metadata keys land in the event's open
    /// metadata untouched. No ordering is guaranteed between events fired
    /// in rapid succession; the server's timestamps decide.
    pub async fn track_event(&mut self, event: &str, metadata: Value) -> SoftResult {
        if !self.tracking_allowed() {
            return SoftResult::suppressed();
        }
        let identity = self.identity.visitor_identity();
        let mut body = json!({
            "event": event,
            "visitorId": identity.visitor_id,
        });
        if let Value::Object(extra) = metadata {
            let merged = body
                .as_object_mut()
                .unwrap_or_else(|| unreachable!("body is constructed as an object"));
            for (key, value) in extra {
                merged.entry(key).or_insert(value);
            }
        }
        match self.post_json("api/v1/analytics/track", &body).await {
            Ok(()) => SoftResult::sent(),
            Err(error) => {
                warn!(%error, event, "event dropped");
                SoftResult::failed(error)
            }
        }
    }

    /// Withdraw consent and erase this visitor's stored records.
    ///
    /// Erasure is compliance, not telemetry: failures surface as hard
    /// errors so the caller knows the data is still present.
    pub async fn revoke_and_erase(&mut self) -> Result<(), TrackerError> {
        let identity = self.identity.visitor_identity();
        self.identity.revoke_consent(Utc::now());

        let url = self.endpoint("api/v1/track-visitor")?;
        let response = self
            .http
            .delete(url)
            .json(&json!({ "visitorId": identity.visitor_id }))
            .send()
            .await
            .map_err(|err| TrackerError::Transport(err.to_string()))?;
        if !response.status().is_success() {
            return Err(TrackerError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}
