use super::{Harvester, Source};
use crate::client::Fetch;
use crate::error::Result;
use crate::model::Term;
use crate::scraper::{ListPage, Scraper};
use crate::table::Table;

impl<F: Fetch> Harvester<F> {
    /// Subject codes offered in `term`, in the order the search form lists
    /// them.
    pub async fn subjects_for(&self, term: &Term) -> Result<Vec<String>> {
        let body = self.fetcher.fetch(&self.endpoints.search_root()).await?;
        Scraper::new(&body).listing().subjects(term.as_str())
    }

    /// The list-page rows for one source. `Ok(None)` means the source has
    /// no courses and should be skipped.
    pub async fn list_for(&self, source: &Source) -> Result<Option<Table>> {
        let (url, page) = match source {
            Source::Subject { code, term } => {
                (self.endpoints.subject_search(code, term), ListPage::Search)
            }
            Source::Course { id, term } => {
                (self.endpoints.course_detail(id, term), ListPage::Detail)
            }
        };
        let body = self.fetcher.fetch(&url).await?;
        Scraper::new(&body).listing().course_table(page)
    }
}
