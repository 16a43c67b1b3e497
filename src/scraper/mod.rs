pub mod fetcher;
pub mod traits;

pub use fetcher::ScraperImpl;
pub use traits::{PriceSource, TickerSource};
