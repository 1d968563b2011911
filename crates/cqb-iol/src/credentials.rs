//! Bearer credential cache for the brokerage API.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use serde_json::Value;
use tokio::sync::Mutex;

use cqb_core::{config::BrokerConfig, errors::Error, Result};

/// Upper bound on any lifetime reported by the login endpoint.
pub const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Access token plus the instant after which it must not be used.
///
/// `expires_at` already has the safety margin subtracted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    access_token: String,
    expires_at: Instant,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, expires_at: Instant) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
        }
    }

    /// `issued_at + lifetime - margin`, saturating at `issued_at`. The lifetime
    /// is capped at [`MAX_TOKEN_LIFETIME`].
    pub fn issued(
        access_token: impl Into<String>,
        issued_at: Instant,
        lifetime: Duration,
        margin: Duration,
    ) -> Self {
        let ttl = lifetime.min(MAX_TOKEN_LIFETIME).saturating_sub(margin);
        let expires_at = issued_at.checked_add(ttl).unwrap_or(issued_at);
        Self::new(access_token, expires_at)
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn is_valid_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Owns the single cached credential and performs the password-grant login.
///
/// The cache lock is held across the login exchange, so concurrent callers that
/// need a refresh wait for the one in flight instead of logging in again.
pub struct CredentialManager {
    http: reqwest::Client,
    cfg: Arc<BrokerConfig>,
    cached: Mutex<Option<Credential>>,
}

impl CredentialManager {
    pub fn new(http: reqwest::Client, cfg: Arc<BrokerConfig>) -> Self {
        Self {
            http,
            cfg,
            cached: Mutex::new(None),
        }
    }

    /// Cached credential if still valid, otherwise a fresh login.
    pub async fn get_valid_credential(&self) -> Result<Credential> {
        let mut cached = self.cached.lock().await;
        if let Some(cred) = cached.as_ref().filter(|c| c.is_valid_at(Instant::now())) {
            return Ok(cred.clone());
        }
        self.login_locked(&mut cached).await
    }

    /// Unconditional login; replaces whatever was cached.
    pub async fn login(&self) -> Result<Credential> {
        let mut cached = self.cached.lock().await;
        self.login_locked(&mut cached).await
    }

    /// Called after the API rejected `rejected`. Logs in again unless another
    /// caller has already swapped in a different, still valid credential.
    pub async fn refresh_rejected(&self, rejected: &Credential) -> Result<Credential> {
        let mut cached = self.cached.lock().await;
        if let Some(cred) = cached
            .as_ref()
            .filter(|c| c.access_token != rejected.access_token)
            .filter(|c| c.is_valid_at(Instant::now()))
        {
            return Ok(cred.clone());
        }
        self.login_locked(&mut cached).await
    }

    #[cfg(test)]
    pub(crate) async fn cached_slot(&self) -> tokio::sync::MutexGuard<'_, Option<Credential>> {
        self.cached.lock().await
    }

    async fn login_locked(&self, slot: &mut Option<Credential>) -> Result<Credential> {
        let cred = self.exchange().await?;
        *slot = Some(cred.clone());
        Ok(cred)
    }

    async fn exchange(&self) -> Result<Credential> {
        let url = format!("{}/token", self.cfg.base_url);
        tracing::info!(user = %self.cfg.username, "logging in to brokerage API");

        let resp = self
            .http
            .post(&url)
            .form(&[
                ("username", self.cfg.username.as_str()),
                ("password", self.cfg.password.as_str()),
                ("grant_type", "password"),
            ])
            .send()
            .await
            .map_err(|e| Error::Auth(format!("login request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Auth(format!(
                "login rejected: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let v: Value = resp
            .json()
            .await
            .map_err(|e| Error::Auth(format!("login json error: {e}")))?;

        let cred = parse_token_response(
            &v,
            Instant::now(),
            self.cfg.default_token_lifetime,
            self.cfg.token_safety_margin,
        )?;
        tracing::debug!(
            valid_for_secs = cred.expires_at.saturating_duration_since(Instant::now()).as_secs(),
            "brokerage login succeeded"
        );
        Ok(cred)
    }
}

/// Extract `access_token` and `expires_in` (seconds, number or numeric string).
fn parse_token_response(
    v: &Value,
    now: Instant,
    default_lifetime: Duration,
    margin: Duration,
) -> Result<Credential> {
    let token = v
        .get("access_token")
        .and_then(|t| t.as_str())
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| Error::Auth("login response has no access_token".to_string()))?;

    let lifetime = v
        .get("expires_in")
        .and_then(|e| e.as_u64().or_else(|| e.as_str()?.trim().parse().ok()))
        .map(Duration::from_secs)
        .unwrap_or(default_lifetime);

    Ok(Credential::issued(token, now, lifetime, margin))
}
