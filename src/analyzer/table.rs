use crate::model::{DailyClose, TableError, Ticker};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// One value per table row; `None` marks a missing or undefined cell.
pub type Series = Vec<Option<f64>>;

/// Derived series that can be attached to a ticker column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Rs,
    RsMa,
}

impl SeriesKind {
    pub fn name(self) -> &'static str {
        match self {
            SeriesKind::Rs => "rs",
            SeriesKind::RsMa => "rs_ma",
        }
    }
}

/// Close prices of one ticker plus whatever derived series were attached to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerColumn {
    ticker: Ticker,
    close: Series,
    #[serde(skip_serializing_if = "Option::is_none")]
    rs: Option<Series>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rs_ma: Option<Series>,
}

impl TickerColumn {
    fn new(ticker: Ticker, close: Series) -> Self {
        Self {
            ticker,
            close,
            rs: None,
            rs_ma: None,
        }
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn close(&self) -> &[Option<f64>] {
        &self.close
    }

    pub fn rs(&self) -> Option<&[Option<f64>]> {
        self.rs.as_deref()
    }

    pub fn rs_ma(&self) -> Option<&[Option<f64>]> {
        self.rs_ma.as_deref()
    }

    pub fn series(&self, kind: SeriesKind) -> Option<&[Option<f64>]> {
        match kind {
            SeriesKind::Rs => self.rs(),
            SeriesKind::RsMa => self.rs_ma(),
        }
    }

    fn slot(&mut self, kind: SeriesKind) -> &mut Option<Series> {
        match kind {
            SeriesKind::Rs => &mut self.rs,
            SeriesKind::RsMa => &mut self.rs_ma,
        }
    }

    fn slice_rows(&self, from: usize) -> Self {
        let cut = |s: &Series| s[from..].to_vec();
        Self {
            ticker: self.ticker.clone(),
            close: cut(&self.close),
            rs: self.rs.as_ref().map(cut),
            rs_ma: self.rs_ma.as_ref().map(cut),
        }
    }
}

/// Trading dates crossed with ticker columns.
///
/// Rows are strictly ascending by date and never reordered; row 0 is the
/// earliest date. Every column, including attached series, has exactly one
/// cell per row. Columns keep the order they were inserted in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    columns: Vec<TickerColumn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    benchmark: Option<TickerColumn>,
}

impl PriceTable {
    /// Creates a table with the given rows and no tickers.
    pub fn new(dates: Vec<NaiveDate>) -> Result<Self, TableError> {
        if let Some(row) = dates.windows(2).position(|w| w[0] >= w[1]) {
            return Err(TableError::UnorderedDates(row + 1));
        }
        Ok(Self {
            dates,
            columns: Vec::new(),
            benchmark: None,
        })
    }

    /// Aligns per-ticker closes on the union of their dates.
    pub fn from_closes(series: Vec<(Ticker, Vec<DailyClose>)>) -> Result<Self, TableError> {
        let dates: BTreeSet<NaiveDate> = series
            .iter()
            .flat_map(|(_, bars)| bars.iter().map(|b| b.date))
            .collect();
        let mut table = Self::new(dates.into_iter().collect())?;
        let row_of: HashMap<NaiveDate, usize> = table
            .dates
            .iter()
            .enumerate()
            .map(|(row, date)| (*date, row))
            .collect();

        for (ticker, bars) in series {
            let mut closes: Series = vec![None; table.len()];
            for bar in bars {
                let cell = &mut closes[row_of[&bar.date]];
                if cell.is_some() {
                    return Err(TableError::DuplicateDate {
                        ticker,
                        date: bar.date,
                    });
                }
                *cell = Some(bar.close);
            }
            table.insert_closes(ticker, closes)?;
        }
        Ok(table)
    }

    /// Adds a ticker column. Present closes must be positive and finite.
    pub fn insert_closes(&mut self, ticker: Ticker, closes: Series) -> Result<(), TableError> {
        if self.contains(&ticker) {
            return Err(TableError::DuplicateTicker(ticker));
        }
        self.check_len(&ticker, closes.len())?;
        if let Some((row, price)) = closes
            .iter()
            .enumerate()
            .find_map(|(row, c)| c.filter(|p| !(p.is_finite() && *p > 0.0)).map(|p| (row, p)))
        {
            return Err(TableError::InvalidPrice { ticker, row, price });
        }
        self.columns.push(TickerColumn::new(ticker, closes));
        Ok(())
    }

    /// Attaches a derived series to a ticker. Attached series are never replaced.
    pub fn attach(
        &mut self,
        ticker: &Ticker,
        kind: SeriesKind,
        values: Series,
    ) -> Result<(), TableError> {
        self.check_len(ticker, values.len())?;
        let column = self
            .columns
            .iter_mut()
            .find(|c| &c.ticker == ticker)
            .ok_or_else(|| TableError::UnknownTicker(ticker.clone()))?;
        let slot = column.slot(kind);
        if slot.is_some() {
            return Err(TableError::SeriesAlreadyAttached {
                ticker: ticker.clone(),
                series: kind.name(),
            });
        }
        *slot = Some(values);
        Ok(())
    }

    fn check_len(&self, ticker: &Ticker, got: usize) -> Result<(), TableError> {
        if got != self.len() {
            return Err(TableError::LengthMismatch {
                ticker: ticker.clone(),
                expected: self.len(),
                got,
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn contains(&self, ticker: &Ticker) -> bool {
        self.column(ticker).is_some()
    }

    pub fn column(&self, ticker: &Ticker) -> Option<&TickerColumn> {
        self.columns.iter().find(|c| &c.ticker == ticker)
    }

    pub fn columns(&self) -> impl Iterator<Item = &TickerColumn> {
        self.columns.iter()
    }

    pub fn tickers(&self) -> impl Iterator<Item = &Ticker> {
        self.columns.iter().map(|c| &c.ticker)
    }

    /// The benchmark column, once relative strength has been computed against it.
    pub fn benchmark(&self) -> Option<&TickerColumn> {
        self.benchmark.as_ref()
    }

    /// Moves `ticker` out of the screened columns into the benchmark slot.
    pub(crate) fn take_benchmark(&mut self, ticker: &Ticker) -> Option<&TickerColumn> {
        let idx = self.columns.iter().position(|c| &c.ticker == ticker)?;
        self.benchmark = Some(self.columns.remove(idx));
        self.benchmark.as_ref()
    }

    /// New table holding only the columns accepted by `keep`, rows untouched.
    pub fn retain_tickers<F>(&self, mut keep: F) -> PriceTable
    where
        F: FnMut(&TickerColumn) -> bool,
    {
        PriceTable {
            dates: self.dates.clone(),
            columns: self.columns.iter().filter(|c| keep(c)).cloned().collect(),
            benchmark: self.benchmark.clone(),
        }
    }

    /// New table without the rows dated before `start`.
    pub fn trim_before(&self, start: NaiveDate) -> PriceTable {
        let from = self.dates.partition_point(|d| *d < start);
        PriceTable {
            dates: self.dates[from..].to_vec(),
            columns: self.columns.iter().map(|c| c.slice_rows(from)).collect(),
            benchmark: self.benchmark.as_ref().map(|c| c.slice_rows(from)),
        }
    }
}
