mod detail;
mod listing;
pub mod text;

pub use detail::{DetailScraper, LevelPolicy, ERROR_MARKER, LASC_AREAS, ONLINE_MARKER};
pub use listing::{ListPage, ListingScraper};

use crate::error::{Result, ScraperError};
use scraper::{Html, Selector};

/// A fetched page, parsed once and read through one of the page-specific
/// scrapers.
pub struct Scraper {
    document: Html,
    raw: String,
}

impl Scraper {
    pub fn new(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
            raw: html.to_string(),
        }
    }

    pub fn listing(&self) -> ListingScraper<'_> {
        ListingScraper::new(&self.document)
    }

    pub fn detail(&self) -> DetailScraper<'_> {
        DetailScraper::new(&self.document, &self.raw)
    }
}

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScraperError::SelectorError(e.to_string()).into())
}
