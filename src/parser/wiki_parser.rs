// Index membership tables as published on Wikipedia
use crate::model::{ParserError, Ticker};
use crate::parser::Parser;
use ::scraper::{ElementRef, Html, Selector};

/// Reads one column of the `table_nr`-th `<table>` on a page.
pub struct WikiTableParser {
    table_nr: usize,
    column_nr: usize,
}

impl WikiTableParser {
    pub fn new(table_nr: usize, column_nr: usize) -> Self {
        Self {
            table_nr,
            column_nr,
        }
    }
}

fn selector(css: &str) -> Result<Selector, ParserError> {
    Selector::parse(css).map_err(|e| ParserError::Selector(e.to_string()))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

impl Parser for WikiTableParser {
    type Output = Vec<Ticker>;

    fn parse(&self, html: &str) -> Result<Vec<Ticker>, ParserError> {
        let document = Html::parse_document(html);
        let table_selector = selector("table")?;
        let row_selector = selector("tr")?;
        let cell_selector = selector("td")?;

        let table = document
            .select(&table_selector)
            .nth(self.table_nr)
            .ok_or(ParserError::TableNotFound(self.table_nr))?;

        let tickers = table
            .select(&row_selector)
            .filter_map(|row| row.select(&cell_selector).nth(self.column_nr))
            .map(cell_text)
            .filter(|text| !text.is_empty())
            .map(Ticker::from)
            .collect();
        Ok(tickers)
    }
}
