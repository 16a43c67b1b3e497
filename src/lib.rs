//! Relative-strength screener.
//!
//! Scrapes an index's constituents, downloads their daily closes alongside the
//! index itself, and keeps the tickers whose relative strength against the
//! index grew over the period and has held above its moving average for the
//! most recent trading days.

pub mod analyzer;
pub mod config;
pub mod market;
pub mod model;
pub mod normalizer;
pub mod parser;
pub mod scraper;
pub mod storage;
pub mod utils;
