//! InvertirOnline (IOL) brokerage adapter.
//!
//! Implements the `QuoteSource` port over the IOL REST API:
//! password-grant login with a cached bearer token, and the cauciones board
//! lookup with endpoint fallback.

use std::sync::Arc;

use async_trait::async_trait;

use cqb_core::{
    config::BrokerConfig, domain::QuoteRecord, errors::Error, ports::QuoteSource, Result,
};

pub mod credentials;
pub mod normalize;
pub mod quotes;

use credentials::CredentialManager;
use quotes::QuoteFetcher;

#[derive(Clone)]
pub struct IolClient {
    credentials: Arc<CredentialManager>,
    quotes: Arc<QuoteFetcher>,
}

impl IolClient {
    pub fn new(cfg: BrokerConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.request_timeout)
            .build()
            .map_err(|e| Error::External(format!("http client build error: {e}")))?;

        let cfg = Arc::new(cfg);
        let credentials = Arc::new(CredentialManager::new(http.clone(), cfg.clone()));
        let quotes = Arc::new(QuoteFetcher::new(http, &cfg, credentials.clone()));

        Ok(Self {
            credentials,
            quotes,
        })
    }

    pub fn credentials(&self) -> &CredentialManager {
        &self.credentials
    }
}

#[async_trait]
impl QuoteSource for IolClient {
    async fn cauciones(&self) -> Result<Vec<QuoteRecord>> {
        self.quotes.fetch_quotes().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::{GET, POST};
    use httpmock::MockServer;
    use serde_json::json;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn cauciones_end_to_end() {
        let server = MockServer::start_async().await;
        let login = server
            .mock_async(|when, then| {
                when.method(POST).path("/token");
                then.status(200)
                    .json_body(json!({"access_token": "T1", "expires_in": 600}));
            })
            .await;
        let primary = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v2/Cotizaciones/cauciones/BCBA");
                then.status(404);
            })
            .await;
        let fallback = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/v2/cotizaciones/cauciones/BCBA")
                    .header("Authorization", "Bearer T1");
                then.status(200).json_body(
                    json!({"titulos": [{"plazo": 1, "tasa": 30.5, "ultimoPrecio": 100}]}),
                );
            })
            .await;

        let client = IolClient::new(BrokerConfig::new(server.base_url(), "user", "secret")).unwrap();
        let source: &dyn QuoteSource = &client;
        let records = source.cauciones().await.unwrap();

        assert_eq!(
            serde_json::to_value(records).unwrap(),
            json!([{"plazo": 1, "tasa": 30.5, "ultimoPrecio": 100}])
        );
        login.assert_hits_async(1).await;
        primary.assert_hits_async(1).await;
        fallback.assert_hits_async(1).await;

        // second lookup reuses the cached token
        source.cauciones().await.unwrap();
        login.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn slow_endpoints_hit_the_configured_timeout() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/token");
                then.status(200).json_body(json!({"access_token": "T1"}));
            })
            .await;
        for path in quotes::candidate_paths("BCBA") {
            server
                .mock_async(|when, then| {
                    when.method(GET).path(path);
                    then.status(200)
                        .delay(Duration::from_secs(3))
                        .json_body(json!([{"plazo": 1}]));
                })
                .await;
        }

        let mut cfg = BrokerConfig::new(server.base_url(), "user", "secret");
        cfg.request_timeout = Duration::from_millis(200);
        let client = IolClient::new(cfg).unwrap();

        let started = Instant::now();
        let err = client.cauciones().await.unwrap_err();

        assert!(matches!(err, Error::QuoteRetrieval(msg) if msg.contains("request error")));
        assert!(started.elapsed() < Duration::from_secs(3));
    }
}
