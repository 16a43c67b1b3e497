// Parsers for scraped pages and provider payloads.

pub mod chart_parser;
pub mod wiki_parser;

use crate::model::ParserError;

pub use chart_parser::ChartParser;
pub use wiki_parser::WikiTableParser;

pub trait Parser {
    type Output;

    fn parse(&self, input: &str) -> Result<Self::Output, ParserError>;
}
