use crate::config::IndexConfig;
use crate::model::{ScraperError, Ticker};
use crate::parser::{Parser, WikiTableParser};
use crate::scraper::traits::TickerSource;
use reqwest::Client;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};

// Some pages, Wikipedia included, reject clients without a browser agent.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) RsScreener/0.1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

pub struct ScraperImpl {
    pub client: Client,
}

impl ScraperImpl {
    pub fn new() -> Result<Self, ScraperError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }

    /// GETs `url` and returns the body of a successful response.
    pub async fn fetch(&self, url: &str) -> Result<String, ScraperError> {
        debug!("GET {}", url);
        let response = timeout(REQUEST_TIMEOUT, self.client.get(url).send())
            .await
            .map_err(|_| ScraperError::Timeout(url.to_string()))??;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait::async_trait]
impl TickerSource for ScraperImpl {
    async fn tickers(&self, index: &IndexConfig) -> Result<Vec<Ticker>, ScraperError> {
        info!("Fetching {} constituents from {}", index.name, index.url);
        let html = self.fetch(&index.url).await?;
        let tickers = WikiTableParser::new(index.table_nr, index.column_nr).parse(&html)?;
        info!("Found {} tickers for {}", tickers.len(), index.name);
        Ok(tickers)
    }
}
