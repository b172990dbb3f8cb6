//! The scrape pipeline: find sources, read their course lists, join each row
//! with its detail page and persist the results.

mod aggregate;
mod discovery;
mod endpoints;
mod enumerate;
mod output;
mod run;

pub use discovery::write_discovery;
pub use endpoints::Endpoints;
pub use output::{point_latest, RunOutput, AGGREGATE_FILE, FAILED_SOURCES_FILE};
pub use run::{read_id_list, RunContext, RunMode, RunSummary};

use crate::client::Fetch;
use crate::config::Config;
use crate::model::{CourseId, Term};
use crate::scraper::LevelPolicy;

/// One unit of work that produces one batch and one checkpoint file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Every course listed under a subject code.
    Subject { code: String, term: Term },
    /// A single course offering, listed from its own detail page.
    Course { id: CourseId, term: Term },
}

impl Source {
    pub fn term(&self) -> &Term {
        match self {
            Source::Subject { term, .. } | Source::Course { term, .. } => term,
        }
    }

    /// Checkpoint file stem, unique per source within a run.
    pub fn label(&self) -> String {
        match self {
            Source::Subject { code, term } => format!("{}-{}", code, term),
            Source::Course { id, term } => format!("{}-{}", id, term),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HarvestOptions {
    pub level_policy: LevelPolicy,
    /// Detail pages fetched at once within one source.
    pub concurrency: usize,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            level_policy: LevelPolicy::Lenient,
            concurrency: 1,
        }
    }
}

impl HarvestOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            level_policy: if config.strict_course_level {
                LevelPolicy::Strict
            } else {
                LevelPolicy::Lenient
            },
            concurrency: config.concurrency.max(1),
        }
    }
}

pub struct Harvester<F> {
    fetcher: F,
    endpoints: Endpoints,
    options: HarvestOptions,
}

impl<F: Fetch> Harvester<F> {
    pub fn new(fetcher: F, endpoints: Endpoints, options: HarvestOptions) -> Self {
        Self {
            fetcher,
            endpoints,
            options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_scoped_to_term() {
        let subject = Source::Subject {
            code: "PHYS".into(),
            term: Term::new("20155"),
        };
        let course = Source::Course {
            id: CourseId::from_number(123),
            term: Term::new("20153"),
        };
        assert_eq!(subject.label(), "PHYS-20155");
        assert_eq!(course.label(), "000123-20153");
        assert_eq!(course.term().as_str(), "20153");
    }
}
