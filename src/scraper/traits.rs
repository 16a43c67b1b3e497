use crate::config::IndexConfig;
use crate::model::{DailyClose, Period, ScraperError, Ticker};

/// Supplies the ordered constituents of an index.
#[async_trait::async_trait]
pub trait TickerSource: Send + Sync {
    async fn tickers(&self, index: &IndexConfig) -> Result<Vec<Ticker>, ScraperError>;
}

/// Supplies daily closes of one ticker within a closed date range.
#[async_trait::async_trait]
pub trait PriceSource: Send + Sync {
    async fn daily_closes(
        &self,
        ticker: &Ticker,
        period: &Period,
    ) -> Result<Vec<DailyClose>, ScraperError>;
}
