// Core types: Ticker, DailyClose, Period and the error enums
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Opaque identifier of a tradable instrument or benchmark index.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ticker(pub String);

impl Ticker {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Ticker {
    fn from(s: &str) -> Self {
        Ticker(s.to_string())
    }
}

impl From<String> for Ticker {
    fn from(s: String) -> Self {
        Ticker(s)
    }
}

/// One daily bar reduced to its closing price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub close: f64,
}

/// Closed date range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Fatal errors of the relative-strength analytics.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("benchmark {0} is not present in the price table")]
    MissingBenchmark(Ticker),
    #[error("moving average window {0} is outside 1..=21")]
    InvalidWindow(usize),
    #[error("price table has no rows")]
    EmptyTable,
    #[error("ticker {ticker} has no {series} series attached")]
    MissingSeries { ticker: Ticker, series: &'static str },
    #[error(transparent)]
    Table(#[from] TableError),
}

/// Violations of the price table's structural invariants.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TableError {
    #[error("dates are not strictly ascending at row {0}")]
    UnorderedDates(usize),
    #[error("ticker {ticker} has more than one close for {date}")]
    DuplicateDate { ticker: Ticker, date: NaiveDate },
    #[error("series for {ticker} has {got} rows, table has {expected}")]
    LengthMismatch {
        ticker: Ticker,
        expected: usize,
        got: usize,
    },
    #[error("ticker {0} is already in the table")]
    DuplicateTicker(Ticker),
    #[error("ticker {0} is not in the table")]
    UnknownTicker(Ticker),
    #[error("close price {price} of {ticker} at row {row} is not a positive number")]
    InvalidPrice { ticker: Ticker, row: usize, price: f64 },
    #[error("{series} series of {ticker} is already attached")]
    SeriesAlreadyAttached { ticker: Ticker, series: &'static str },
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error(transparent)]
    Parser(#[from] ParserError),
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("invalid selector: {0}")]
    Selector(String),
    #[error("table #{0} not found on page")]
    TableNotFound(usize),
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no data: {0}")]
    NoData(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Failures that stop a download before any screening can happen.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("benchmark {ticker} could not be fetched: {source}")]
    Benchmark {
        ticker: Ticker,
        #[source]
        source: ScraperError,
    },
    #[error("no closes for benchmark {0}")]
    EmptyBenchmark(Ticker),
}
