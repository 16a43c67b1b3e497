use crate::model::{DailyClose, DownloadError, Period, ScraperError, Ticker};
use crate::scraper::PriceSource;
use crate::storage::SqliteStorage;
use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;
use tracing::warn;

/// Downloads the benchmark, then every ticker with up to `max_concurrent`
/// requests in flight.
///
/// The benchmark comes first in the result, followed by tickers in input
/// order. Tickers that fail or have no bars are logged and left out; the
/// benchmark failing either way is an error.
pub async fn download_closes(
    source: &dyn PriceSource,
    cache: Option<&Mutex<SqliteStorage>>,
    benchmark: &Ticker,
    tickers: Vec<Ticker>,
    period: &Period,
    max_concurrent: usize,
) -> Result<Vec<(Ticker, Vec<DailyClose>)>, DownloadError> {
    let benchmark_bars = fetch_cached(source, cache, benchmark, period)
        .await
        .map_err(|source| DownloadError::Benchmark {
            ticker: benchmark.clone(),
            source,
        })?;
    if benchmark_bars.is_empty() {
        return Err(DownloadError::EmptyBenchmark(benchmark.clone()));
    }

    let fetched: Vec<_> = stream::iter(tickers)
        .map(|ticker| async move {
            let result = fetch_cached(source, cache, &ticker, period).await;
            (ticker, result)
        })
        .buffered(max_concurrent.max(1))
        .collect()
        .await;

    let mut series = vec![(benchmark.clone(), benchmark_bars)];
    for (ticker, result) in fetched {
        match result {
            Ok(bars) if bars.is_empty() => warn!("{}: no closes in period, skipped", ticker),
            Ok(bars) => series.push((ticker, bars)),
            Err(e) => warn!("{}: fetch failed, skipped: {}", ticker, e),
        }
    }
    Ok(series)
}

/// Reads closes from the cache, falling back to the price source.
async fn fetch_cached(
    source: &dyn PriceSource,
    cache: Option<&Mutex<SqliteStorage>>,
    ticker: &Ticker,
    period: &Period,
) -> Result<Vec<DailyClose>, ScraperError> {
    if let Some(cache) = cache {
        match cache.lock().await.cached_closes(ticker, period) {
            Ok(Some(bars)) => return Ok(bars),
            Ok(None) => {}
            Err(e) => warn!("{}: cache read failed: {}", ticker, e),
        }
    }

    let bars = source.daily_closes(ticker, period).await?;
    if let Some(cache) = cache {
        if let Err(e) = cache.lock().await.save_closes(ticker, period, &bars) {
            warn!("{}: cache write failed: {}", ticker, e);
        }
    }
    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedPrices {
        bars: HashMap<&'static str, Vec<DailyClose>>,
        calls: AtomicUsize,
    }

    impl FixedPrices {
        fn new(entries: &[(&'static str, Vec<f64>)]) -> Self {
            let bars = entries
                .iter()
                .map(|(name, closes)| {
                    let bars = closes
                        .iter()
                        .zip(2..)
                        .map(|(close, d)| DailyClose {
                            date: NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
                            close: *close,
                        })
                        .collect();
                    (*name, bars)
                })
                .collect();
            Self {
                bars,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl PriceSource for FixedPrices {
        async fn daily_closes(
            &self,
            ticker: &Ticker,
            _period: &Period,
        ) -> Result<Vec<DailyClose>, ScraperError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.bars
                .get(ticker.as_str())
                .cloned()
                .ok_or_else(|| ScraperError::Status {
                    status: 404,
                    url: format!("chart/{}", ticker),
                })
        }
    }

    fn january() -> Period {
        Period {
            start: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        }
    }

    fn tickers(names: &[&str]) -> Vec<Ticker> {
        names.iter().map(|n| Ticker::from(*n)).collect()
    }

    fn names(series: &[(Ticker, Vec<DailyClose>)]) -> Vec<&str> {
        series.iter().map(|(t, _)| t.as_str()).collect()
    }

    #[tokio::test]
    async fn failed_and_empty_tickers_are_dropped() {
        let source = FixedPrices::new(&[
            ("^GSPC", vec![4742.83, 4704.81]),
            ("AAPL", vec![185.64, 184.25]),
            ("EMPTY", vec![]),
            ("MSFT", vec![370.87, 370.60]),
        ]);
        let series = download_closes(
            &source,
            None,
            &"^GSPC".into(),
            tickers(&["AAPL", "GONE", "EMPTY", "MSFT"]),
            &january(),
            2,
        )
        .await
        .unwrap();

        assert_eq!(names(&series), vec!["^GSPC", "AAPL", "MSFT"]);
        assert_eq!(series[1].1[1].close, 184.25);
    }

    #[tokio::test]
    async fn benchmark_failure_stops_the_download() {
        let source = FixedPrices::new(&[("AAPL", vec![185.64]), ("^NDX", vec![])]);
        let err = download_closes(
            &source,
            None,
            &"^GSPC".into(),
            tickers(&["AAPL"]),
            &january(),
            4,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DownloadError::Benchmark { ref ticker, .. } if ticker.as_str() == "^GSPC"));
        // constituents are not requested once the benchmark is gone
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        let err = download_closes(&source, None, &"^NDX".into(), tickers(&["AAPL"]), &january(), 4)
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::EmptyBenchmark(_)));
    }

    #[tokio::test]
    async fn closed_period_is_served_from_cache() {
        let cache = Mutex::new(SqliteStorage::in_memory().unwrap());
        let source = FixedPrices::new(&[("^GSPC", vec![4742.83]), ("AAPL", vec![185.64])]);
        let first = download_closes(
            &source,
            Some(&cache),
            &"^GSPC".into(),
            tickers(&["AAPL"]),
            &january(),
            1,
        )
        .await
        .unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        let offline = FixedPrices::new(&[]);
        let second = download_closes(
            &offline,
            Some(&cache),
            &"^GSPC".into(),
            tickers(&["AAPL"]),
            &january(),
            1,
        )
        .await
        .unwrap();
        assert_eq!(offline.calls.load(Ordering::SeqCst), 0);
        assert_eq!(second, first);
    }
}
