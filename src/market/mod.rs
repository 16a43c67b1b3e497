pub mod download;
pub mod yahoo;

pub use download::download_closes;
pub use yahoo::YahooPriceSource;
