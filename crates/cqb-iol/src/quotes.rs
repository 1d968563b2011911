//! Cauciones lookup with unauthorized-retry and endpoint fallback.

use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::Value;

use cqb_core::{config::BrokerConfig, domain::QuoteRecord, errors::Error, Result};

use crate::credentials::{Credential, CredentialManager};
use crate::normalize::normalize_records;

/// Equivalent paths for the cauciones board, primary spelling first.
pub fn candidate_paths(market: &str) -> Vec<String> {
    vec![
        format!("/api/v2/Cotizaciones/cauciones/{market}"),
        // some deployments are case-sensitive
        format!("/api/v2/cotizaciones/cauciones/{market}"),
    ]
}

/// Outcome of a single GET against one candidate.
#[derive(Debug)]
enum Attempt {
    Success(Value),
    Unauthorized,
    NotFound,
    Failed(String),
}

pub struct QuoteFetcher {
    http: reqwest::Client,
    base_url: String,
    candidates: Vec<String>,
    credentials: Arc<CredentialManager>,
}

impl QuoteFetcher {
    pub fn new(
        http: reqwest::Client,
        cfg: &BrokerConfig,
        credentials: Arc<CredentialManager>,
    ) -> Self {
        Self {
            http,
            base_url: cfg.base_url.clone(),
            candidates: candidate_paths(&cfg.market),
            credentials,
        }
    }

    /// Try each candidate in order; the first success wins.
    ///
    /// Login failures propagate as-is. Anything else a candidate does wrong only
    /// moves on to the next one, and the last such failure is reported once all
    /// candidates are exhausted.
    pub async fn fetch_quotes(&self) -> Result<Vec<QuoteRecord>> {
        let mut last_err = "no candidate endpoints configured".to_string();

        for path in &self.candidates {
            let url = format!("{}{}", self.base_url, path);

            let cred = self.credentials.get_valid_credential().await?;
            let mut attempt = self.request(&url, &cred).await;

            if matches!(attempt, Attempt::Unauthorized) {
                tracing::warn!(%path, "brokerage rejected token, logging in again");
                let fresh = self.credentials.refresh_rejected(&cred).await?;
                attempt = self.request(&url, &fresh).await;
            }

            match attempt {
                Attempt::Success(body) => {
                    let records = normalize_records(body);
                    tracing::info!(%path, count = records.len(), "fetched cauciones");
                    return Ok(records);
                }
                Attempt::Unauthorized => {
                    last_err = format!("{path}: 401 Unauthorized after re-login");
                }
                Attempt::NotFound => {
                    last_err = format!("{path}: 404 Not Found");
                }
                Attempt::Failed(reason) => {
                    last_err = format!("{path}: {reason}");
                }
            }
            tracing::debug!(error = %last_err, "candidate failed, trying next");
        }

        tracing::warn!(error = %last_err, "all cauciones endpoints failed");
        Err(Error::QuoteRetrieval(last_err))
    }

    async fn request(&self, url: &str, cred: &Credential) -> Attempt {
        let resp = match self
            .http
            .get(url)
            .bearer_auth(cred.access_token())
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return Attempt::Failed(format!("request error: {e}")),
        };

        match resp.status() {
            StatusCode::UNAUTHORIZED => Attempt::Unauthorized,
            StatusCode::NOT_FOUND => Attempt::NotFound,
            status if !status.is_success() => Attempt::Failed(status.to_string()),
            _ => match resp.json::<Value>().await {
                Ok(v) => Attempt::Success(v),
                Err(e) => Attempt::Failed(format!("invalid json body: {e}")),
            },
        }
    }
}
