use super::text::decrap;
use crate::error::{Result, ScraperError};
use crate::model::{CourseDetail, Extraction, TuitionUnit, SIZE_SENTINEL, UNKNOWN_LEVEL};
use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::LazyLock;

/// Present in the body of every detail page the site failed to render.
pub const ERROR_MARKER: &str = "System Error";

/// Present when the course is delivered fully online.
pub const ONLINE_MARKER: &str = "18 On-Line";

const ENROLLED_LABEL: &str = "Enrolled";
const SIZE_LABEL: &str = "Size:";

/// Resident, non-resident and fees labels when tuition is charged per course.
const TUITION_COURSE_LABELS: [&str; 3] = [
    "Tuition -resident",
    "Tuition -nonresident",
    "Approximate Course Fees",
];

/// Same three fields when tuition is charged per credit, position for
/// position.
const TUITION_CREDIT_LABELS: [&str; 3] = [
    "Tuition per credit -resident",
    "Tuition per credit -nonresident",
    "Approximate Course Fees",
];

/// Liberal education and writing intensive areas as printed on detail
/// pages. The short code is everything before the first hyphen.
pub const LASC_AREAS: [&str; 14] = [
    "10-People and the Environment",
    "11-Information Literacy",
    "1A-Oral Communication",
    "1B-Written Communication",
    "2-Critical Thinking",
    "3-Natural Sciences",
    "3L-Natural Sciences with Lab",
    "4-Math/Logical Reasoning",
    "5-History and the Social Sciences",
    "6-Humanities and Fine Arts",
    "7-Human Diversity",
    "8-Global Perspective",
    "9-Ethical and Civic Responsibility",
    "WI-Writing Intensive",
];

// The level is free text between two headings, so whatever heading follows
// it has to be enumerated.
static COURSE_LEVEL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r".*Course Level\s+(\w+)\s+(Description|General/Liberal|Lectures/Labs|Corequisites|Add To Wait List)",
    )
    .expect("course level pattern is valid")
});

/// What to do when no course level can be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelPolicy {
    /// Record `Unknown` and keep going.
    #[default]
    Lenient,
    /// Deprecated: treat a missing level as an extraction failure. Kept only
    /// to reproduce older datasets.
    Strict,
}

pub struct DetailScraper<'a> {
    document: &'a Html,
    raw: &'a str,
}

impl<'a> DetailScraper<'a> {
    pub(crate) fn new(document: &'a Html, raw: &'a str) -> Self {
        Self { document, raw }
    }

    pub fn is_error_page(&self) -> bool {
        self.raw.contains(ERROR_MARKER)
    }

    /// Reads enrollment, tuition and attribute fields.
    ///
    /// An error page is an expected outcome and yields
    /// [`CourseDetail::sentinel`]. Fields missing from an otherwise valid page
    /// are recorded as [`Extraction::Sentinel`] values.
    pub fn extract(&self, policy: LevelPolicy) -> Result<CourseDetail> {
        if self.is_error_page() {
            return Ok(CourseDetail::sentinel());
        }

        let course_level = match (self.course_level(), policy) {
            (Some(level), _) => Extraction::Found(level),
            (None, LevelPolicy::Lenient) => Extraction::Sentinel(UNKNOWN_LEVEL.to_string()),
            (None, LevelPolicy::Strict) => return Err(ScraperError::CourseLevelMissing.into()),
        };

        let unit = self.tuition_unit();
        let labels = match unit {
            TuitionUnit::Credit => TUITION_CREDIT_LABELS,
            TuitionUnit::Course => TUITION_COURSE_LABELS,
        };

        Ok(CourseDetail {
            enrolled: self.size(ENROLLED_LABEL),
            size: self.size(SIZE_LABEL),
            tuition_resident: self.text(labels[0]),
            tuition_nonresident: self.text(labels[1]),
            course_fees: self.text(labels[2]),
            tuition_unit: Some(unit),
            lasc_wi: self.lasc_areas(),
            online: self.raw.contains(ONLINE_MARKER),
            course_level,
            upstream_error: false,
        })
    }

    pub fn tuition_unit(&self) -> TuitionUnit {
        if self.raw.contains(TUITION_CREDIT_LABELS[0]) {
            TuitionUnit::Credit
        } else {
            TuitionUnit::Course
        }
    }

    /// Comma separated short codes of every known area named on the page.
    pub fn lasc_areas(&self) -> String {
        LASC_AREAS
            .iter()
            .filter(|area| self.raw.contains(*area))
            .filter_map(|area| area.split('-').next())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn course_level(&self) -> Option<String> {
        let text: String = self.document.root_element().text().collect();
        COURSE_LEVEL_PATTERN
            .captures(&text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Finds the first element whose own text mentions `label` and returns
    /// whatever its parent's text has after the first colon.
    pub fn labeled_value(&self, label: &str) -> Option<String> {
        let element = self
            .document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|el| {
                el.children()
                    .filter_map(|child| child.value().as_text())
                    .any(|text| text.contains(label))
            })?;

        let container = element.parent().and_then(ElementRef::wrap).unwrap_or(element);
        let text: String = container.text().collect();
        text.split_once(':').map(|(_, value)| decrap(value))
    }

    fn text(&self, label: &str) -> Extraction<String> {
        match self.labeled_value(label) {
            Some(value) => Extraction::Found(value),
            None => Extraction::Sentinel(String::new()),
        }
    }

    fn size(&self, label: &str) -> Extraction<i64> {
        self.labeled_value(label)
            .as_deref()
            .and_then(|value| value.split_whitespace().next())
            .and_then(|token| token.parse().ok())
            .map(Extraction::Found)
            .unwrap_or(Extraction::Sentinel(SIZE_SENTINEL))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::Scraper;

    const PER_COURSE: &str = include_str!("../../tests/fixtures/detail_per_course.html");
    const PER_CREDIT: &str = include_str!("../../tests/fixtures/detail_per_credit.html");
    const ERROR_PAGE: &str = include_str!("../../tests/fixtures/detail_error.html");

    fn extract(html: &str) -> CourseDetail {
        Scraper::new(html).detail().extract(LevelPolicy::Lenient).unwrap()
    }

    #[test]
    fn error_page_yields_sentinel_sizes() {
        let detail = extract(ERROR_PAGE);
        assert!(detail.upstream_error);
        assert_eq!(*detail.enrolled.value(), -1);
        assert_eq!(*detail.size.value(), -1);
        assert_eq!(detail.course_level.value(), UNKNOWN_LEVEL);
    }

    #[test]
    fn error_page_is_not_an_error_even_when_strict() {
        let detail = Scraper::new(ERROR_PAGE)
            .detail()
            .extract(LevelPolicy::Strict)
            .unwrap();
        assert_eq!(*detail.size.value(), -1);
    }

    #[test]
    fn reads_sizes_and_per_course_tuition() {
        let detail = extract(PER_COURSE);
        assert!(!detail.upstream_error);
        assert_eq!(detail.enrolled, Extraction::Found(25));
        assert_eq!(detail.size, Extraction::Found(30));
        assert_eq!(detail.tuition_unit, Some(TuitionUnit::Course));
        assert_eq!(detail.tuition_resident.value(), "$702.50");
        assert_eq!(detail.tuition_nonresident.value(), "$1,404.00");
        assert_eq!(detail.course_fees.value(), "$15.00");
        assert_eq!(detail.course_level, Extraction::Found("Lower".to_string()));
    }

    #[test]
    fn per_credit_tuition_is_relabelled_as_per_course() {
        let detail = extract(PER_CREDIT);
        assert_eq!(detail.tuition_unit, Some(TuitionUnit::Credit));
        assert_eq!(detail.tuition_resident, Extraction::Found("$234.17".to_string()));
        assert_eq!(detail.tuition_nonresident.value(), "$468.34");

        let values = detail.values();
        assert_eq!(values[4], "$234.17");
        assert_eq!(values[5], "credit");
    }

    #[test]
    fn missing_course_level_is_unknown_not_fatal() {
        let detail = extract(PER_CREDIT);
        assert_eq!(
            detail.course_level,
            Extraction::Sentinel(UNKNOWN_LEVEL.to_string())
        );
    }

    #[test]
    fn strict_policy_rejects_missing_course_level() {
        let result = Scraper::new(PER_CREDIT).detail().extract(LevelPolicy::Strict);
        assert!(result.is_err());
    }

    #[test]
    fn lasc_codes_follow_known_area_order() {
        assert_eq!(extract(PER_COURSE).lasc_wi, "3L,WI");
        assert_eq!(extract(PER_CREDIT).lasc_wi, "");
    }

    #[test]
    fn every_known_area_maps_to_its_code() {
        let body = format!("<html><body><ul>{}</ul></body></html>", LASC_AREAS.map(|a| format!("<li>{}</li>", a)).join(""));
        let codes = Scraper::new(&body).detail().lasc_areas();
        assert_eq!(codes, "10,11,1A,1B,2,3,3L,4,5,6,7,8,9,WI");
    }

    #[test]
    fn online_flag_tracks_marker() {
        assert!(extract(PER_COURSE).online);
        assert!(!extract(PER_CREDIT).online);
    }

    #[test]
    fn missing_labels_degrade_to_empty_text() {
        let detail = extract("<html><body><p>Course Level Upper Description</p></body></html>");
        assert_eq!(detail.tuition_resident, Extraction::Sentinel(String::new()));
        assert_eq!(detail.size, Extraction::Sentinel(-1));
        assert_eq!(detail.course_level.value(), "Upper");
    }
}
