use crate::analyzer::metrics::MAX_MA_WINDOW;
use crate::model::Ticker;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use thiserror::Error;

/// Where an index's constituents are listed and which ticker tracks the index itself.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct IndexConfig {
    pub name: String,
    pub url: String,
    /// Position of the constituents table among all tables on the page.
    pub table_nr: usize,
    /// Column holding the ticker symbol.
    #[serde(default)]
    pub column_nr: usize,
    pub benchmark: Ticker,
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub index: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default = "default_ma_window")]
    pub ma_window: usize,
    #[serde(default = "default_days_rs_holds_above_ma")]
    pub days_rs_holds_above_ma: usize,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    #[serde(default)]
    pub report_path: Option<String>,
    #[serde(default = "default_indexes")]
    pub indexes: Vec<IndexConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown index {0:?}")]
    UnknownIndex(String),
    #[error("start {start} is after end {end}")]
    InvalidPeriod { start: NaiveDate, end: NaiveDate },
    #[error("ma_window {0} is outside 1..=21")]
    InvalidWindow(usize),
}

impl AppConfig {
    /// The entry of `indexes` named by `index`.
    pub fn chosen_index(&self) -> Result<&IndexConfig, ConfigError> {
        self.indexes
            .iter()
            .find(|i| i.name == self.index)
            .ok_or_else(|| ConfigError::UnknownIndex(self.index.clone()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start > self.end {
            return Err(ConfigError::InvalidPeriod {
                start: self.start,
                end: self.end,
            });
        }
        if self.ma_window == 0 || self.ma_window > MAX_MA_WINDOW {
            return Err(ConfigError::InvalidWindow(self.ma_window));
        }
        self.chosen_index()?;
        Ok(())
    }
}

fn default_ma_window() -> usize {
    MAX_MA_WINDOW
}

fn default_days_rs_holds_above_ma() -> usize {
    1
}

fn default_database_path() -> String {
    "data.db".into()
}

fn default_max_concurrent_requests() -> usize {
    8
}

pub fn default_indexes() -> Vec<IndexConfig> {
    vec![
        IndexConfig {
            name: "S&P 500".into(),
            url: "https://en.wikipedia.org/wiki/List_of_S%26P_500_companies".into(),
            table_nr: 0,
            column_nr: 0,
            benchmark: "^GSPC".into(),
        },
        IndexConfig {
            name: "NASDAQ 100".into(),
            url: "https://en.wikipedia.org/wiki/Nasdaq-100".into(),
            table_nr: 3,
            column_nr: 0,
            benchmark: "^NDX".into(),
        },
    ]
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(content)?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}
