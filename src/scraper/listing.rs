use super::selector;
use super::text::{decode_location, decrap};
use crate::error::{Result, ScraperError};
use crate::model::{DETAIL_COLUMNS, TERM_COLUMN, TIMESTAMP_COLUMN};
use crate::table::Table;
use crate::{log_debug, log_info};
use scraper::{ElementRef, Html};
use std::collections::HashSet;

/// Which page a course list table is being read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListPage {
    /// Subject search results, `table#resultsTable`.
    Search,
    /// A single course's detail page, `table.myplantable`.
    Detail,
}

impl ListPage {
    fn table_selector(&self) -> &'static str {
        match self {
            ListPage::Search => "table#resultsTable",
            ListPage::Detail => "table.myplantable",
        }
    }
}

pub struct ListingScraper<'a> {
    document: &'a Html,
}

impl<'a> ListingScraper<'a> {
    pub(crate) fn new(document: &'a Html) -> Self {
        Self { document }
    }

    /// Subject codes offered in `term`, read from the subject drop-down of the
    /// search form. Options carry the terms they are valid for as classes.
    pub fn subjects(&self, term: &str) -> Result<Vec<String>> {
        let select = self
            .document
            .select(&selector("select#subject")?)
            .next()
            .ok_or_else(|| ScraperError::MissingElement("select#subject".into()))?;

        let subjects: Vec<String> = select
            .select(&selector("option")?)
            .filter(|option| option.value().classes().any(|c| c == term))
            .filter_map(|option| option.value().attr("value"))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .collect();

        log_info!("[listing] {} subjects offered in {}", subjects.len(), term);
        Ok(subjects)
    }

    /// Reads the course list table. The first column holds action buttons and
    /// is skipped; the last column only carries the location inside an icon's
    /// `alt` text.
    ///
    /// Returns `Ok(None)` when the table has no rows and an error when the
    /// table itself is missing or a row does not line up with the headers.
    pub fn course_table(&self, page: ListPage) -> Result<Option<Table>> {
        let table_selector = page.table_selector();
        let results = self
            .document
            .select(&selector(table_selector)?)
            .next()
            .ok_or_else(|| ScraperError::MissingElement(table_selector.into()))?;

        let headers: Vec<String> = results
            .select(&selector("th")?)
            .skip(1)
            .map(|th| decrap(&th.text().collect::<String>()))
            .collect();
        let headers = dedupe_headers(headers);

        let mut table = Table::new(headers);
        for (idx, row) in results.select(&selector("tbody tr")?).enumerate() {
            let cells: Vec<ElementRef> = row
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|el| el.value().name() == "td")
                .collect();
            if cells.is_empty() {
                continue;
            }
            if cells.len() < 2 || cells.len() != table.columns().len() + 1 {
                return Err(ScraperError::MalformedRow {
                    row: idx,
                    found: cells.len(),
                    expected: table.columns().len() + 1,
                }
                .into());
            }

            let last = cells.len() - 1;
            let mut values: Vec<String> = cells[1..last]
                .iter()
                .map(|cell| decrap(&cell.text().collect::<String>()))
                .collect();
            values.push(location(&cells[last])?);
            table.push_row(values)?;
        }

        log_debug!("[listing] parsed {} course rows", table.len());
        if table.is_empty() {
            return Ok(None);
        }
        Ok(Some(table))
    }
}

fn location(cell: &ElementRef) -> Result<String> {
    Ok(cell
        .select(&selector("img")?)
        .next()
        .and_then(|img| img.value().attr("alt"))
        .map(decode_location)
        .unwrap_or_default())
}

/// Rows are keyed by column name, so a repeated header, or one named like a
/// column appended from the detail page, gets a numbered suffix.
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = DETAIL_COLUMNS
        .iter()
        .chain([TIMESTAMP_COLUMN, TERM_COLUMN].iter())
        .map(|c| c.to_string())
        .collect();
    headers
        .into_iter()
        .map(|h| {
            if taken.insert(h.clone()) {
                return h;
            }
            let mut n = 2;
            loop {
                let candidate = format!("{} ({})", h, n);
                if taken.insert(candidate.clone()) {
                    log_debug!("[listing] Renamed header {:?} to {:?}", h, candidate);
                    return candidate;
                }
                n += 1;
            }
        })
        .collect()
}
