use crate::analyzer::filters::{has_rs_crossed_ma, has_rs_grown};
use crate::analyzer::metrics::{validate_window, with_relative_strength, with_rs_moving_average};
use crate::analyzer::table::PriceTable;
use crate::model::{AnalysisError, Ticker};
use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct ScreenParams {
    pub benchmark: Ticker,
    pub ma_window: usize,
    pub days_rs_holds_above_ma: usize,
    /// First user-visible date. Earlier rows only feed the moving average
    /// and are cut before filtering.
    pub start: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct Screening {
    /// Tickers that passed the growth stage, in table order.
    pub grown: Vec<Ticker>,
    /// Tickers that passed both stages, with every derived series.
    pub survivors: PriceTable,
}

impl Screening {
    pub fn tickers(&self) -> Vec<Ticker> {
        self.survivors.tickers().cloned().collect()
    }
}

/// Runs relative strength, its moving average, padding trim, then the
/// growth and crossover filters over `prices`.
pub fn screen(prices: &PriceTable, params: &ScreenParams) -> Result<Screening, AnalysisError> {
    validate_window(params.ma_window)?;
    if prices.is_empty() {
        return Err(AnalysisError::EmptyTable);
    }

    let with_rs = with_relative_strength(prices, &params.benchmark)?;
    let with_ma = with_rs_moving_average(&with_rs, params.ma_window)?;
    let visible = match params.start {
        Some(start) => with_ma.trim_before(start),
        None => with_ma,
    };

    let grown = has_rs_grown(&visible)?;
    let survivors = has_rs_crossed_ma(&grown, params.days_rs_holds_above_ma)?;
    Ok(Screening {
        grown: grown.tickers().cloned().collect(),
        survivors,
    })
}
