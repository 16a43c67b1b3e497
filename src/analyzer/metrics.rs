use crate::analyzer::table::{PriceTable, Series, SeriesKind};
use crate::model::{AnalysisError, Ticker};

/// Longest accepted moving-average window: one trading month.
pub const MAX_MA_WINDOW: usize = 21;

/// Rounds to two decimals, halves away from zero.
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Relative strength of one close against the benchmark close on the same date.
pub fn rs(stock_price: f64, market_price: f64) -> f64 {
    round_to_cents(stock_price / market_price)
}

/// Row-wise relative strength; undefined wherever either input is missing.
pub fn relative_strength(closes: &[Option<f64>], benchmark: &[Option<f64>]) -> Series {
    closes
        .iter()
        .zip(benchmark)
        .map(|(stock, market)| Some(rs((*stock)?, (*market)?)))
        .collect()
}

pub fn validate_window(window: usize) -> Result<(), AnalysisError> {
    if window == 0 || window > MAX_MA_WINDOW {
        return Err(AnalysisError::InvalidWindow(window));
    }
    Ok(())
}

/// Trailing arithmetic mean over `window` rows.
///
/// The first `window - 1` cells are undefined, as is every cell whose
/// window contains an undefined value.
pub fn moving_average(values: &[Option<f64>], window: usize) -> Result<Series, AnalysisError> {
    validate_window(window)?;
    let mut out = vec![None; values.len()];
    for (i, w) in values.windows(window).enumerate() {
        out[i + window - 1] = w
            .iter()
            .copied()
            .sum::<Option<f64>>()
            .map(|sum| sum / window as f64);
    }
    Ok(out)
}

/// Computes relative strength for every ticker against `benchmark`.
///
/// The benchmark leaves the screened columns and is kept as the table's
/// benchmark column.
pub fn with_relative_strength(
    table: &PriceTable,
    benchmark: &Ticker,
) -> Result<PriceTable, AnalysisError> {
    let mut out = table.clone();
    let market = out
        .take_benchmark(benchmark)
        .ok_or_else(|| AnalysisError::MissingBenchmark(benchmark.clone()))?
        .close()
        .to_vec();

    let derived: Vec<(Ticker, Series)> = out
        .columns()
        .map(|c| (c.ticker().clone(), relative_strength(c.close(), &market)))
        .collect();
    for (ticker, series) in derived {
        out.attach(&ticker, SeriesKind::Rs, series)?;
    }
    Ok(out)
}

/// Attaches the moving average of each ticker's relative strength.
pub fn with_rs_moving_average(
    table: &PriceTable,
    window: usize,
) -> Result<PriceTable, AnalysisError> {
    validate_window(window)?;
    let mut out = table.clone();
    let mut derived = Vec::new();
    for column in table.columns() {
        let rs = column.rs().ok_or_else(|| AnalysisError::MissingSeries {
            ticker: column.ticker().clone(),
            series: SeriesKind::Rs.name(),
        })?;
        derived.push((column.ticker().clone(), moving_average(rs, window)?));
    }
    for (ticker, series) in derived {
        out.attach(&ticker, SeriesKind::RsMa, series)?;
    }
    Ok(out)
}
