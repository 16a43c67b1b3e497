use crate::model::{DailyClose, Period, ScraperError, Ticker};
use crate::parser::{ChartParser, Parser};
use crate::scraper::{PriceSource, ScraperImpl};
use chrono::{Days, NaiveDate, NaiveTime};
use tracing::debug;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Daily bars from Yahoo Finance's public chart endpoint.
pub struct YahooPriceSource {
    scraper: ScraperImpl,
    base_url: String,
}

impl YahooPriceSource {
    pub fn new(scraper: ScraperImpl) -> Self {
        Self {
            scraper,
            base_url: CHART_URL.to_string(),
        }
    }

    pub fn chart_url(&self, ticker: &Ticker, period: &Period) -> String {
        // period2 is exclusive, so ask up to midnight after the last day.
        let end = period.end + Days::new(1);
        format!(
            "{}/{}?period1={}&period2={}&interval=1d&events=history",
            self.base_url,
            ticker.as_str().replace('^', "%5E"),
            midnight_utc(period.start),
            midnight_utc(end),
        )
    }
}

fn midnight_utc(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

#[async_trait::async_trait]
impl PriceSource for YahooPriceSource {
    async fn daily_closes(
        &self,
        ticker: &Ticker,
        period: &Period,
    ) -> Result<Vec<DailyClose>, ScraperError> {
        let url = self.chart_url(ticker, period);
        let body = self.scraper.fetch(&url).await?;
        let bars = ChartParser::new(*period).parse(&body)?;
        debug!("{}: {} daily closes", ticker, bars.len());
        Ok(bars)
    }
}
