use std::sync::Arc;

use cqb_core::{config::Config, ports::QuoteSource};
use cqb_iol::IolClient;

#[tokio::main]
async fn main() -> Result<(), cqb_core::Error> {
    cqb_core::logging::init("cqb")?;

    let cfg = Arc::new(Config::load()?);

    let iol = IolClient::new(cfg.broker.clone())?;

    // Warm the token cache; a failure here is retried on the first lookup.
    if let Err(e) = iol.credentials().login().await {
        tracing::warn!("initial brokerage login failed: {e}");
    }

    let quotes: Arc<dyn QuoteSource> = Arc::new(iol);

    cqb_telegram::router::run_polling(cfg, quotes)
        .await
        .map_err(|e| cqb_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
