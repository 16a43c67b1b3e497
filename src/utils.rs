// Utility functions
use chrono::{Days, NaiveDate};

/// Calendar date early enough to hold `window - 1` trading days before `start`.
///
/// Five trading days span seven calendar days; ten extra days absorb holidays.
pub fn lookback_start(start: NaiveDate, window: usize) -> NaiveDate {
    let trading_days = window.saturating_sub(1) as u64;
    let calendar_days = (trading_days * 7).div_ceil(5) + 10;
    start - Days::new(calendar_days)
}

/// Number of `dates` on or after `start`. `dates` must be ascending.
pub fn visible_rows(dates: &[NaiveDate], start: NaiveDate) -> usize {
    dates.len() - dates.partition_point(|d| *d < start)
}
