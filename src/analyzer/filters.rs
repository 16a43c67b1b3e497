use crate::analyzer::table::{PriceTable, SeriesKind, TickerColumn};
use crate::model::AnalysisError;
use std::ops::ControlFlow;

fn attached<'a>(
    column: &'a TickerColumn,
    kind: SeriesKind,
) -> Result<&'a [Option<f64>], AnalysisError> {
    column.series(kind).ok_or_else(|| AnalysisError::MissingSeries {
        ticker: column.ticker().clone(),
        series: kind.name(),
    })
}

/// Keeps the tickers for which `decide` holds, failing fast on a missing series.
fn retain<F>(table: &PriceTable, mut decide: F) -> Result<PriceTable, AnalysisError>
where
    F: FnMut(&TickerColumn) -> Result<bool, AnalysisError>,
{
    let mut keep = Vec::new();
    for column in table.columns() {
        if decide(column)? {
            keep.push(column.ticker().clone());
        }
    }
    Ok(table.retain_tickers(|c| keep.contains(c.ticker())))
}

/// True when relative strength on the last row is strictly above the first row.
///
/// An undefined endpoint means growth cannot be judged and the ticker fails.
pub fn rs_grew(rs: &[Option<f64>]) -> bool {
    match (rs.first().copied().flatten(), rs.last().copied().flatten()) {
        (Some(start), Some(end)) => end > start,
        _ => false,
    }
}

/// Length of the unbroken run of rows, counted back from the last one, where
/// relative strength is strictly above its moving average.
///
/// The scan stops at the first row where the average is undefined or where
/// relative strength is below or equal to it.
pub fn rs_above_ma_streak(rs: &[Option<f64>], ma: &[Option<f64>]) -> usize {
    let scan = rs
        .iter()
        .zip(ma)
        .rev()
        .try_fold(0usize, |count, pair| match pair {
            (Some(rs), Some(ma)) if rs > ma => ControlFlow::Continue(count + 1),
            _ => ControlFlow::Break(count),
        });
    match scan {
        ControlFlow::Continue(count) | ControlFlow::Break(count) => count,
    }
}

/// Keeps tickers whose relative strength grew over the table's period.
pub fn has_rs_grown(table: &PriceTable) -> Result<PriceTable, AnalysisError> {
    if table.is_empty() {
        return Err(AnalysisError::EmptyTable);
    }
    retain(table, |column| Ok(rs_grew(attached(column, SeriesKind::Rs)?)))
}

/// Keeps tickers whose relative strength has held strictly above its moving
/// average for at least `days_rs_holds_above_ma` of the most recent rows.
pub fn has_rs_crossed_ma(
    table: &PriceTable,
    days_rs_holds_above_ma: usize,
) -> Result<PriceTable, AnalysisError> {
    if table.is_empty() {
        return Err(AnalysisError::EmptyTable);
    }
    retain(table, |column| {
        let rs = attached(column, SeriesKind::Rs)?;
        let ma = attached(column, SeriesKind::RsMa)?;
        Ok(rs_above_ma_streak(rs, ma) >= days_rs_holds_above_ma)
    })
}
