//! Data access port trait.

use std::future::Future;
use std::pin::Pin;

use crate::domain::error::ProviderError;
use crate::domain::price::PriceSeries;

/// Provider of full daily price histories, one symbol per call.
///
/// Implementations are shared across concurrent analyses, so they must be
/// `Send + Sync` and must not keep per-call mutable state.
pub trait DataPort: Send + Sync {
    fn fetch_daily_series<'a>(
        &'a self,
        symbol: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<PriceSeries, ProviderError>> + Send + 'a>>;
}
