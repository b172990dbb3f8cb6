use super::Harvester;
use crate::client::Fetch;
use crate::error::Result;
use crate::model::{CourseDetail, CourseId, CourseRecord, Term, ID_COLUMN};
use crate::scraper::Scraper;
use crate::table::Table;
use crate::{log_info, log_warn};
use chrono::Utc;
use futures::{stream, StreamExt, TryStreamExt};

impl<F: Fetch> Harvester<F> {
    /// Fetches and reads one course's detail page.
    ///
    /// Error pages and unreachable pages both come back as the sentinel
    /// detail; only a strict course-level failure is returned as an error.
    pub async fn detail_for(&self, id: &CourseId, term: &Term) -> Result<CourseDetail> {
        let url = self.endpoints.course_detail(id, term);
        let body = match self.fetcher.fetch(&url).await {
            Ok(body) => body,
            Err(e) => {
                log_warn!("[aggregate] Could not fetch {}: {}", id, e);
                return Ok(CourseDetail::sentinel());
            }
        };

        let detail = Scraper::new(&body)
            .detail()
            .extract(self.options.level_policy)?;
        if detail.upstream_error {
            log_info!("[aggregate] Errored on {}", id);
        } else if !detail.enrolled.is_found() || !detail.size.is_found() {
            log_warn!("[aggregate] No enrollment numbers on the page for {}", id);
        }
        Ok(detail)
    }

    /// Joins every list row with its detail page, one record per row, in list
    /// order.
    pub async fn records_for(&self, list: &Table, term: &Term) -> Result<Vec<CourseRecord>> {
        let id_idx = list.column_index(ID_COLUMN).unwrap_or(0);

        stream::iter(list.rows())
            .map(move |row| async move {
                let fields: Vec<(String, String)> = list
                    .columns()
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect();
                let raw_id = row.get(id_idx).map(String::as_str).unwrap_or_default();

                let detail = match CourseId::parse(raw_id) {
                    Some(id) => self.detail_for(&id, term).await?,
                    None => {
                        log_warn!("[aggregate] Unusable course id {:?}", raw_id);
                        CourseDetail::sentinel()
                    }
                };

                Ok::<_, crate::error::AppError>(CourseRecord {
                    list: fields,
                    detail,
                    captured_at: Utc::now(),
                    term: term.clone(),
                })
            })
            .buffered(self.options.concurrency.max(1))
            .try_collect()
            .await
    }

    /// The batch table for one source: list columns, then the detail
    /// columns, timestamp and term.
    pub async fn batch_for(&self, list: &Table, term: &Term) -> Result<Table> {
        let records = self.records_for(list, term).await?;
        Ok(Table::from_records(&records))
    }
}
