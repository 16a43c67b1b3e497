// Yahoo Finance v8 chart payloads
use crate::model::{DailyClose, ParserError, Period};
use crate::parser::Parser;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Extracts daily closes inside `period` from a chart response.
///
/// Bars without a usable close are skipped; timestamps are shifted to the
/// exchange's local date.
pub struct ChartParser {
    period: Period,
}

impl ChartParser {
    pub fn new(period: Period) -> Self {
        Self { period }
    }

    fn local_date(ts: i64, gmtoffset: i64) -> Option<NaiveDate> {
        DateTime::from_timestamp(ts + gmtoffset, 0).map(|dt| dt.date_naive())
    }
}

impl Parser for ChartParser {
    type Output = Vec<DailyClose>;

    fn parse(&self, json: &str) -> Result<Vec<DailyClose>, ParserError> {
        let envelope: ChartEnvelope = serde_json::from_str(json)?;
        if let Some(err) = envelope.chart.error {
            return Err(ParserError::NoData(format!(
                "{}: {}",
                err.code,
                err.description.unwrap_or_default()
            )));
        }
        let result = envelope
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| ParserError::NoData("empty chart result".into()))?;
        let closes = result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default();

        let gmtoffset = result.meta.gmtoffset;
        let bars = result
            .timestamp
            .iter()
            .zip(closes)
            .filter_map(|(ts, close)| {
                let close = close.filter(|c| c.is_finite() && *c > 0.0)?;
                let date = Self::local_date(*ts, gmtoffset)?;
                Some(DailyClose { date, close })
            })
            .filter(|bar| self.period.start <= bar.date && bar.date <= self.period.end)
            .collect();
        Ok(bars)
    }
}
