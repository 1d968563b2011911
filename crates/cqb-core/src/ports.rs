use async_trait::async_trait;

use crate::{domain::QuoteRecord, Result};

/// Hexagonal port for quote lookups.
///
/// The brokerage adapter implements this over HTTP; handlers only see the trait,
/// so tests can swap in fakes.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Current cauciones for the configured market, in the order the remote sent them.
    async fn cauciones(&self) -> Result<Vec<QuoteRecord>>;
}
