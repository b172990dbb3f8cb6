use crate::config::SiteConfig;
use crate::error::{ClientError, Result};
use crate::model::{CourseId, Term};
use url::Url;

const SEARCH_ROOT: &str = "basic.html";
const SUBJECT_SEARCH: &str = "advancedSubmit.html";
const COURSE_DETAIL: &str = "detail.html";

/// Builds the three page URLs the harvester needs.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
    campus_id: String,
    rc_id: String,
    result_limit: u32,
}

impl Endpoints {
    pub fn new(site: &SiteConfig) -> Result<Self> {
        let mut base_url = site.base_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base = Url::parse(&base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("Invalid base URL: {}", e)))?;

        Ok(Self {
            base,
            campus_id: site.campus_id.clone(),
            rc_id: site.rc_id.clone(),
            result_limit: site.result_limit,
        })
    }

    fn page(&self, path: &str) -> Url {
        // `path` is a fixed relative file name, joining it cannot fail
        self.base.join(path).unwrap_or_else(|_| self.base.clone())
    }

    /// Search form listing every subject with the terms it is offered in.
    pub fn search_root(&self) -> String {
        let mut url = self.page(SEARCH_ROOT);
        url.query_pairs_mut().append_pair("campusid", &self.campus_id);
        url.into()
    }

    pub fn subject_search(&self, subject: &str, term: &Term) -> String {
        let mut url = self.page(SUBJECT_SEARCH);
        let limit = self.result_limit.to_string();
        url.query_pairs_mut().extend_pairs([
            ("campusid", self.campus_id.as_str()),
            ("searchrcid", self.rc_id.as_str()),
            ("searchcampusid", self.campus_id.as_str()),
            ("yrtr", term.as_str()),
            ("subject", subject),
            ("courseNumber", ""),
            ("courseId", ""),
            ("openValue", "ALL"),
            ("showAdvanced", ""),
            ("delivery", "ALL"),
            ("starttime", ""),
            ("endtime", ""),
            ("mntransfer", ""),
            ("gened", ""),
            ("credittype", "ALL"),
            ("credits", ""),
            ("instructor", ""),
            ("keyword", ""),
            ("begindate", ""),
            ("site", ""),
            ("resultNumber", limit.as_str()),
        ]);
        url.into()
    }

    pub fn course_detail(&self, id: &CourseId, term: &Term) -> String {
        let mut url = self.page(COURSE_DETAIL);
        url.query_pairs_mut().extend_pairs([
            ("campusid", self.campus_id.as_str()),
            ("courseid", id.as_str()),
            ("yrtr", term.as_str()),
            ("rcid", self.rc_id.as_str()),
            ("localrcid", self.rc_id.as_str()),
            ("partnered", "false"),
            ("parent", "search"),
        ]);
        url.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints(base: &str) -> Endpoints {
        Endpoints::new(&SiteConfig {
            base_url: base.to_string(),
            ..SiteConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn detail_url_carries_course_and_term() {
        let url = endpoints("https://example.edu/registration/search")
            .course_detail(&CourseId::from_number(42), &Term::new("20155"));
        assert_eq!(
            url,
            "https://example.edu/registration/search/detail.html?campusid=072&courseid=000042&yrtr=20155&rcid=0072&localrcid=0072&partnered=false&parent=search"
        );
    }

    #[test]
    fn subject_search_is_bounded() {
        let url = endpoints("https://example.edu/search/").subject_search("PHYS", &Term::new("20153"));
        assert!(url.starts_with("https://example.edu/search/advancedSubmit.html?campusid=072"));
        assert!(url.contains("subject=PHYS"));
        assert!(url.contains("yrtr=20153"));
        assert!(url.ends_with("resultNumber=250"));
    }

    #[test]
    fn root_page_is_scoped_to_campus() {
        assert_eq!(
            endpoints("http://localhost:9000/").search_root(),
            "http://localhost:9000/basic.html?campusid=072"
        );
    }
}
