// Analyzer module: relative-strength analytics over an aligned price table.

pub mod filters;
pub mod metrics;
pub mod screener;
pub mod table;

// Re-export the pipeline entry point for ease of use.
pub use screener::{ScreenParams, Screening, screen};
pub use table::{PriceTable, Series, SeriesKind, TickerColumn};
