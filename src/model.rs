use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column holding the course identifier in list pages and id-list inputs.
pub const ID_COLUMN: &str = "ID #";
pub const TERM_COLUMN: &str = "year_term";
pub const TIMESTAMP_COLUMN: &str = "timestamp";

pub const ENROLLED: &str = "Enrolled";
pub const SIZE: &str = "Size:";
pub const LASC_WI: &str = "LASC/WI";
pub const ONLINE_18: &str = "18online";
pub const TUITION_RESIDENT: &str = "Tuition -resident";
pub const TUITION_NONRESIDENT: &str = "Tuition -nonresident";
pub const COURSE_FEES: &str = "Approximate Course Fees";
pub const TUITION_UNIT: &str = "Tuition unit";
pub const COURSE_LEVEL: &str = "Course level";

/// Detail columns in the order they are appended to a list table.
pub const DETAIL_COLUMNS: [&str; 9] = [
    ENROLLED,
    SIZE,
    LASC_WI,
    ONLINE_18,
    TUITION_RESIDENT,
    TUITION_UNIT,
    TUITION_NONRESIDENT,
    COURSE_LEVEL,
    COURSE_FEES,
];

pub const SIZE_SENTINEL: i64 = -1;
pub const UNKNOWN_LEVEL: &str = "Unknown";

/// Opaque academic year/session code such as `20155`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Term(String);

impl Term {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Six digit, zero padded course offering number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CourseId(String);

impl CourseId {
    pub const WIDTH: usize = 6;

    pub fn from_number(n: u32) -> Self {
        Self(format!("{:0width$}", n, width = Self::WIDTH))
    }

    /// Accepts `123`, `000123` and similar; anything non-numeric or wider
    /// than six digits is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw.len() > Self::WIDTH || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        raw.parse().ok().map(Self::from_number)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of looking up one field: either the page had it, or a stand-in
/// value was recorded because it did not.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction<T> {
    Found(T),
    Sentinel(T),
}

impl<T> Extraction<T> {
    pub fn value(&self) -> &T {
        match self {
            Extraction::Found(v) | Extraction::Sentinel(v) => v,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Extraction::Found(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuitionUnit {
    Credit,
    Course,
}

impl TuitionUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TuitionUnit::Credit => "credit",
            TuitionUnit::Course => "course",
        }
    }
}

/// Fields read from a course detail page.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseDetail {
    pub enrolled: Extraction<i64>,
    pub size: Extraction<i64>,
    pub tuition_resident: Extraction<String>,
    pub tuition_nonresident: Extraction<String>,
    pub course_fees: Extraction<String>,
    pub tuition_unit: Option<TuitionUnit>,
    pub lasc_wi: String,
    pub online: bool,
    pub course_level: Extraction<String>,
    /// The page carried the upstream error marker.
    pub upstream_error: bool,
}

impl CourseDetail {
    /// Stand-in for a course whose detail page was an error page.
    pub fn sentinel() -> Self {
        Self {
            enrolled: Extraction::Sentinel(SIZE_SENTINEL),
            size: Extraction::Sentinel(SIZE_SENTINEL),
            tuition_resident: Extraction::Sentinel(String::new()),
            tuition_nonresident: Extraction::Sentinel(String::new()),
            course_fees: Extraction::Sentinel(String::new()),
            tuition_unit: None,
            lasc_wi: String::new(),
            online: false,
            course_level: Extraction::Sentinel(UNKNOWN_LEVEL.to_string()),
            upstream_error: true,
        }
    }

    /// Values in [`DETAIL_COLUMNS`] order.
    pub fn values(&self) -> Vec<String> {
        vec![
            self.enrolled.value().to_string(),
            self.size.value().to_string(),
            self.lasc_wi.clone(),
            if self.online { "True" } else { "False" }.to_string(),
            self.tuition_resident.value().clone(),
            self.tuition_unit
                .map(|u| u.as_str().to_string())
                .unwrap_or_default(),
            self.tuition_nonresident.value().clone(),
            self.course_level.value().clone(),
            self.course_fees.value().clone(),
        ]
    }
}

/// One list row joined with its detail page, stamped at capture time.
#[derive(Debug, Clone)]
pub struct CourseRecord {
    pub list: Vec<(String, String)>,
    pub detail: CourseDetail,
    pub captured_at: DateTime<Utc>,
    pub term: Term,
}

impl CourseRecord {
    /// Every field name with its value: list columns as observed, then the
    /// detail columns, timestamp and term.
    pub fn fields(&self) -> Vec<(String, String)> {
        let mut fields = self.list.clone();
        fields.extend(
            DETAIL_COLUMNS
                .iter()
                .map(|c| c.to_string())
                .zip(self.detail.values()),
        );
        fields.push((TIMESTAMP_COLUMN.to_string(), epoch_seconds(&self.captured_at)));
        fields.push((TERM_COLUMN.to_string(), self.term.to_string()));
        fields
    }
}

fn epoch_seconds(at: &DateTime<Utc>) -> String {
    format!("{:.6}", at.timestamp_micros() as f64 / 1_000_000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_ids_are_zero_padded() {
        assert_eq!(CourseId::from_number(37).as_str(), "000037");
        assert_eq!(CourseId::parse("123").unwrap().as_str(), "000123");
        assert_eq!(CourseId::parse(" 004567 ").unwrap().as_str(), "004567");
        assert!(CourseId::parse("12a").is_none());
        assert!(CourseId::parse("1234567").is_none());
        assert!(CourseId::parse("").is_none());
    }

    #[test]
    fn sentinel_detail_fills_every_column() {
        let detail = CourseDetail::sentinel();
        let values = detail.values();
        assert_eq!(values.len(), DETAIL_COLUMNS.len());
        assert_eq!(values[0], "-1");
        assert_eq!(values[1], "-1");
        assert_eq!(values[7], UNKNOWN_LEVEL);
        assert!(!detail.enrolled.is_found());
    }

    #[test]
    fn record_fields_end_with_timestamp_and_term() {
        let record = CourseRecord {
            list: vec![("ID #".into(), "000010".into()), ("Subj".into(), "PHYS".into())],
            detail: CourseDetail::sentinel(),
            captured_at: DateTime::from_timestamp(1_700_000_000, 250_000_000).unwrap(),
            term: Term::new("20155"),
        };
        let fields = record.fields();
        assert_eq!(fields.len(), 2 + DETAIL_COLUMNS.len() + 2);
        assert_eq!(fields[0].1, "000010");
        assert_eq!(fields[2].0, ENROLLED);
        let n = fields.len();
        assert_eq!(fields[n - 2], ("timestamp".into(), "1700000000.250000".into()));
        assert_eq!(fields[n - 1], ("year_term".into(), "20155".into()));
    }
}
