use super::Harvester;
use crate::client::Fetch;
use crate::error::Result;
use crate::model::{CourseId, Term, ID_COLUMN, TERM_COLUMN};
use crate::scraper::ERROR_MARKER;
use crate::table::Table;
use crate::{log_debug, log_info};
use futures::{stream, StreamExt, TryStreamExt};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

impl<F: Fetch> Harvester<F> {
    /// Whether a course with this id is offered in `term`.
    pub async fn course_exists(&self, id: &CourseId, term: &Term) -> Result<bool> {
        let body = self
            .fetcher
            .fetch(&self.endpoints.course_detail(id, term))
            .await?;
        Ok(!body.contains(ERROR_MARKER))
    }

    /// Probes every id from 1 to `max_id` and keeps the ones with a real
    /// detail page. Existence is not monotonic in the id, so every candidate
    /// is fetched.
    pub async fn discover(&self, term: &Term, max_id: u32) -> Result<BTreeSet<CourseId>> {
        log_info!("[discovery] Working on {} (1..={})", term, max_id);

        let found: Vec<Option<CourseId>> = stream::iter(1..=max_id)
            .map(move |n| async move {
                let id = CourseId::from_number(n);
                log_debug!("[discovery] Checking {}", id);
                let exists = self.course_exists(&id, term).await?;
                Ok::<_, crate::error::AppError>(exists.then_some(id))
            })
            .buffered(self.options.concurrency.max(1))
            .try_collect()
            .await?;

        let ids: BTreeSet<CourseId> = found.into_iter().flatten().collect();
        log_info!("[discovery] Total of {} good course ids found", ids.len());
        Ok(ids)
    }
}

/// Writes discovered ids as `<term>-good-cids.csv`, a valid id-list input
/// for a later scrape.
pub fn write_discovery(ids: &BTreeSet<CourseId>, term: &Term, dir: &Path) -> Result<PathBuf> {
    crate::utils::ensure_directory(dir)?;
    let mut table = Table::new(vec![ID_COLUMN.to_string(), TERM_COLUMN.to_string()]);
    for id in ids {
        table.push_row(vec![id.to_string(), term.to_string()])?;
    }
    let path = dir.join(format!("{}-good-cids.csv", term));
    table.write_csv(&path)?;
    Ok(path)
}
