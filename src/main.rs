use chrono::Utc;
use rs_screener::analyzer::{PriceTable, ScreenParams, Screening, screen};
use rs_screener::config::{AppConfig, load_config};
use rs_screener::market::{YahooPriceSource, download_closes};
use rs_screener::model::{Period, Ticker};
use rs_screener::normalizer::normalize_all;
use rs_screener::scraper::{ScraperImpl, TickerSource};
use rs_screener::storage::{ScreenRun, SqliteStorage};
use rs_screener::utils::{lookback_start, visible_rows};
use std::error::Error;
use std::fs;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

type BoxError = Box<dyn Error + Send + Sync>;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Panic occurred: {:?}", panic_info);
    }));

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_string());
    let config = match load_config(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error: {}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = run(&config).await {
        error!("Screening aborted: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: &AppConfig) -> Result<(), BoxError> {
    let index = config.chosen_index()?;
    let storage = Mutex::new(SqliteStorage::new(&config.database_path)?);

    if let Ok(Some(prev)) = storage.lock().await.last_run(&index.name) {
        info!(
            "Previous run {} ({} .. {}, window {}, {} days): {} survivors",
            prev.ran_at,
            prev.period.start,
            prev.period.end,
            prev.ma_window,
            prev.days_rs_holds_above_ma,
            prev.survivors.len()
        );
    }

    let tickers_source = ScraperImpl::new()?;
    let mut tickers = tickers_source.tickers(index).await?;
    normalize_all(&mut tickers);
    tickers.retain(|t| t != &index.benchmark);

    // Moving averages need history before the first visible day; it is cut again in `screen`.
    let period = Period {
        start: lookback_start(config.start, config.ma_window),
        end: config.end,
    };
    info!(
        "Downloading {} tickers and {} for {} .. {}",
        tickers.len(),
        index.benchmark,
        period.start,
        period.end
    );

    let prices = YahooPriceSource::new(ScraperImpl::new()?);
    let series = download_closes(
        &prices,
        Some(&storage),
        &index.benchmark,
        tickers,
        &period,
        config.max_concurrent_requests,
    )
    .await?;

    let table = PriceTable::from_closes(series)?;
    info!(
        "Price table: {} rows x {} tickers",
        table.len(),
        table.columns().count()
    );
    let visible = visible_rows(table.dates(), config.start);
    if config.days_rs_holds_above_ma > visible {
        warn!(
            "days_rs_holds_above_ma {} exceeds the {} trading days from {}, nothing can pass",
            config.days_rs_holds_above_ma, visible, config.start
        );
    }

    let screening = screen(
        &table,
        &ScreenParams {
            benchmark: index.benchmark.clone(),
            ma_window: config.ma_window,
            days_rs_holds_above_ma: config.days_rs_holds_above_ma,
            start: Some(config.start),
        },
    )?;
    report(config, &screening)?;

    let run = ScreenRun {
        index_name: index.name.clone(),
        period: Period {
            start: config.start,
            end: config.end,
        },
        ma_window: config.ma_window,
        days_rs_holds_above_ma: config.days_rs_holds_above_ma,
        survivors: screening.tickers(),
        ran_at: Utc::now(),
    };
    if let Err(e) = storage.lock().await.record_run(&run) {
        warn!("Failed to record run: {}", e);
    }
    Ok(())
}

fn report(config: &AppConfig, screening: &Screening) -> Result<(), BoxError> {
    info!(
        "{} tickers grew, {} held above the {}-day average for {} days",
        screening.grown.len(),
        screening.survivors.columns().count(),
        config.ma_window,
        config.days_rs_holds_above_ma
    );
    let names: Vec<String> = screening.tickers().iter().map(Ticker::to_string).collect();
    println!("{}", names.join(", "));

    if let Some(path) = &config.report_path {
        fs::write(path, serde_json::to_string_pretty(&screening.survivors)?)?;
        info!("Saved report: {}", path);
    }
    Ok(())
}
