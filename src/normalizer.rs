use crate::model::Ticker;
use std::collections::HashSet;

/// Normalizes scraped symbols to price-provider notation and drops duplicates,
/// keeping first-seen order.
pub fn normalize_all(tickers: &mut Vec<Ticker>) {
    let mut seen = HashSet::new();
    tickers.retain_mut(|ticker| {
        normalize_ticker(ticker);
        !ticker.0.is_empty() && seen.insert(ticker.clone())
    });
}

fn normalize_ticker(ticker: &mut Ticker) {
    // Wikipedia writes share classes as BRK.B, Yahoo as BRK-B.
    ticker.0 = ticker.0.trim().to_uppercase().replace('.', "-");
}
