use super::output::{RunOutput, FAILED_SOURCES_FILE};
use super::{Harvester, Source};
use crate::client::Fetch;
use crate::config::OutputConfig;
use crate::error::{AppError, Result, StorageError};
use crate::model::{CourseId, Term, ID_COLUMN, TERM_COLUMN};
use crate::table::Table;
use crate::utils::save_json;
use crate::{log_error, log_info, log_warn};
use chrono::{DateTime, Local};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Where the list of sources for a scrape comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Every subject offered in one term.
    Term(Term),
    /// Course ids and terms read from a CSV with `ID #` and `year_term`
    /// columns.
    IdList(PathBuf),
}

impl RunMode {
    /// Exactly one of the two inputs must be given.
    pub fn from_inputs(year_term: Option<String>, id_list: Option<PathBuf>) -> Result<Self> {
        match (year_term, id_list) {
            (Some(_), Some(_)) => Err(AppError::Usage(
                "Can only use one of --year-term and --cid-list".to_string(),
            )),
            (None, None) => Err(AppError::Usage(
                "Must use exactly one of --year-term and --cid-list".to_string(),
            )),
            (Some(term), None) => Ok(RunMode::Term(Term::new(term))),
            (None, Some(path)) => Ok(RunMode::IdList(path)),
        }
    }
}

/// Values shared by every stage of one run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub mode: RunMode,
    pub output: OutputConfig,
    pub started_at: DateTime<Local>,
}

impl RunContext {
    pub fn new(mode: RunMode, output: OutputConfig) -> Self {
        Self {
            mode,
            output,
            started_at: Local::now(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: Vec<String>,
    pub rows: usize,
    pub destination: PathBuf,
    pub aggregate: PathBuf,
}

/// Reads `(ID #, year_term)` pairs. Ids are padded to six digits and a pair
/// listed more than once is kept only the first time.
pub fn read_id_list(path: &Path) -> Result<Vec<Source>> {
    let table = Table::read_csv(path)?;
    let ids = table
        .column(ID_COLUMN)
        .ok_or_else(|| StorageError::MissingColumn(ID_COLUMN.to_string()))?;
    let terms = table
        .column(TERM_COLUMN)
        .ok_or_else(|| StorageError::MissingColumn(TERM_COLUMN.to_string()))?;

    let sources = ids
        .into_iter()
        .zip(terms)
        .map(|(id, term)| {
            let id = CourseId::parse(id).ok_or_else(|| {
                AppError::Usage(format!("{} is not a course id in {}", id, path.display()))
            })?;
            Ok(Source::Course {
                id,
                term: Term::new(term),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(dedupe_sources(sources))
}

/// Each source owns one checkpoint file, so repeats are dropped.
fn dedupe_sources(sources: Vec<Source>) -> Vec<Source> {
    let mut seen = HashSet::new();
    sources
        .into_iter()
        .filter(|source| {
            let fresh = seen.insert(source.label());
            if !fresh {
                log_warn!("[run] Ignoring repeated source {}", source.label());
            }
            fresh
        })
        .collect()
}

impl<F: Fetch> Harvester<F> {
    pub async fn sources_for(&self, mode: &RunMode) -> Result<Vec<Source>> {
        match mode {
            RunMode::Term(term) => Ok(dedupe_sources(
                self.subjects_for(term)
                    .await?
                    .into_iter()
                    .map(|code| Source::Subject {
                        code,
                        term: term.clone(),
                    })
                    .collect(),
            )),
            RunMode::IdList(path) => read_id_list(path),
        }
    }

    /// Runs a full scrape: every source becomes a checkpointed batch, and the
    /// stacked batches are written and verified as the run's aggregate.
    ///
    /// A source whose list page cannot be read is recorded as failed and
    /// skipped. Only output problems abort the run.
    pub async fn run(&self, ctx: &RunContext) -> Result<RunSummary> {
        let sources = self.sources_for(&ctx.mode).await?;
        log_info!("[run] {} sources to process", sources.len());

        let mut output = RunOutput::create(&ctx.output, &ctx.started_at)?;
        let mut aggregate = Table::default();
        let mut summary = RunSummary {
            destination: output.destination().to_path_buf(),
            ..RunSummary::default()
        };

        for source in &sources {
            let label = source.label();
            log_info!("[run] On source {}", label);

            let list = match self.list_for(source).await {
                Ok(Some(list)) => list,
                Ok(None) => {
                    log_info!("[run] No courses listed for {}, skipping", label);
                    summary.skipped += 1;
                    continue;
                }
                Err(err) => {
                    log_error!(err => "[run] Failed reading course list for {}", label);
                    summary.failed.push(label);
                    continue;
                }
            };

            let batch = match self.batch_for(&list, source.term()).await {
                Ok(batch) => batch,
                Err(err) => {
                    log_error!(err => "[run] Failed reading course details for {}", label);
                    summary.failed.push(label);
                    continue;
                }
            };

            output.checkpoint(&batch, &label)?;
            aggregate.vstack(&batch);
            summary.processed += 1;
        }

        if !summary.failed.is_empty() {
            log_warn!(
                "[run] {} sources failed: {}",
                summary.failed.len(),
                summary.failed.join(", ")
            );
            save_json(&summary.failed, output.destination().join(FAILED_SOURCES_FILE))?;
        }

        summary.rows = aggregate.len();
        summary.aggregate = output.finalize(&aggregate)?;
        log_info!(
            "[run] Done: {} processed, {} skipped, {} failed, {} rows",
            summary.processed,
            summary.skipped,
            summary.failed.len(),
            summary.rows
        );
        Ok(summary)
    }
}
