//! Campus data store.
//!
//! Holds the three read-only tables the concierge answers from (events,
//! exams, placement drives) behind a trait so the tool layer receives its
//! store handle explicitly.

pub mod seed;
mod sqlite;

pub use sqlite::{SqliteCampusStore, TableCounts};

use crate::error::{ConciergeError, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Event category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Cultural,
    Technical,
    Other,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Cultural, Category::Technical, Category::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Cultural => "cultural",
            Category::Technical => "technical",
            Category::Other => "other",
        }
    }
}

impl FromStr for Category {
    type Err = ConciergeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cultural" => Ok(Category::Cultural),
            "technical" => Ok(Category::Technical),
            "other" => Ok(Category::Other),
            _ => Err(ConciergeError::Validation(format!(
                "unknown category '{}' (expected one of: cultural, technical, other)",
                s
            ))),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Academic department code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Department {
    Cse,
    Ece,
    Me,
    Ce,
    It,
    Eee,
}

impl Department {
    pub const ALL: [Department; 6] = [
        Department::Cse,
        Department::Ece,
        Department::Me,
        Department::Ce,
        Department::It,
        Department::Eee,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Department::Cse => "CSE",
            Department::Ece => "ECE",
            Department::Me => "ME",
            Department::Ce => "CE",
            Department::It => "IT",
            Department::Eee => "EEE",
        }
    }
}

impl FromStr for Department {
    type Err = ConciergeError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Department::ALL
            .into_iter()
            .find(|d| d.code().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                ConciergeError::Validation(format!(
                    "unknown department '{}' (expected one of: CSE, ECE, ME, CE, IT, EEE)",
                    s
                ))
            })
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Semester number, always within 1..=8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Semester(u8);

impl Semester {
    pub fn new(value: i64) -> Result<Self> {
        if (1..=8).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ConciergeError::Validation(format!(
                "semester {} is out of range (expected 1 to 8)",
                value
            )))
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Semester {
    type Error = ConciergeError;

    fn try_from(value: i64) -> Result<Self> {
        Semester::new(value)
    }
}

impl From<Semester> for u8 {
    fn from(semester: Semester) -> Self {
        semester.0
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inclusive date range; either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

impl DateRange {
    /// Build a range, rejecting one that ends before it starts.
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self> {
        if let (Some(start), Some(end)) = (from, to) {
            if start > end {
                return Err(ConciergeError::Validation(format!(
                    "date range starts after it ends ({} > {})",
                    start, end
                )));
            }
        }
        Ok(Self { from, to })
    }

    /// A range covering a single day.
    pub fn day(date: NaiveDate) -> Self {
        Self {
            from: Some(date),
            to: Some(date),
        }
    }

    pub fn from(&self) -> Option<NaiveDate> {
        self.from
    }

    pub fn to(&self) -> Option<NaiveDate> {
        self.to
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|start| date >= start) && self.to.is_none_or(|end| date <= end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self.from.map(|d| d.to_string()).unwrap_or_default();
        let end = self.to.map(|d| d.to_string()).unwrap_or_default();
        write!(f, "{}..{}", start, end)
    }
}

/// A campus event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub category: Category,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: String,
    pub organizer: String,
    pub description: Option<String>,
}

/// A scheduled examination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exam {
    pub id: i64,
    /// Sitting name, e.g. "Mid Semester Examination".
    pub name: String,
    pub subject: String,
    pub department: Department,
    pub semester: Semester,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub venue: String,
}

/// A company placement drive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementDrive {
    pub id: i64,
    pub company: String,
    pub roles: Vec<String>,
    pub departments: BTreeSet<Department>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub venue: String,
    pub description: Option<String>,
}

/// Filters for event lookups. Unset fields impose no filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    pub date_range: DateRange,
    pub category: Option<Category>,
    pub limit: Option<u32>,
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        self.date_range.contains(event.date) && self.category.is_none_or(|c| c == event.category)
    }
}

/// Filters for exam lookups. Unset fields impose no filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExamFilter {
    pub department: Option<Department>,
    pub semester: Option<Semester>,
    /// Case-insensitive substring of the subject.
    pub subject: Option<String>,
    pub limit: Option<u32>,
}

impl ExamFilter {
    pub fn matches(&self, exam: &Exam) -> bool {
        self.department.is_none_or(|d| d == exam.department)
            && self.semester.is_none_or(|s| s == exam.semester)
            && self
                .subject
                .as_ref()
                .is_none_or(|s| contains_ignore_case(&exam.subject, s))
    }
}

/// Filters for placement drive lookups. Unset fields impose no filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacementFilter {
    pub date_range: DateRange,
    /// Drives open to this department.
    pub department: Option<Department>,
    /// Case-insensitive substring of the company name.
    pub company: Option<String>,
    pub limit: Option<u32>,
}

impl PlacementFilter {
    pub fn matches(&self, drive: &PlacementDrive) -> bool {
        self.date_range.contains(drive.date)
            && self
                .department
                .is_none_or(|d| drive.departments.contains(&d))
            && self
                .company
                .as_ref()
                .is_none_or(|c| contains_ignore_case(&drive.company, c))
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    fold_case(haystack).contains(&fold_case(needle))
}

/// Unicode lower-casing shared by the in-memory filters and the SQL
/// `casefold()` function so both agree on non-ASCII text.
pub(crate) fn fold_case(s: &str) -> String {
    s.to_lowercase()
}

/// Read access to the campus tables.
///
/// Every lookup returns rows ordered by date ascending; an empty vector
/// means nothing matched.
#[async_trait]
pub trait CampusStore: Send + Sync {
    /// Find events matching the filter.
    async fn find_events(&self, filter: &EventFilter) -> Result<Vec<Event>>;

    /// Find exams matching the filter.
    async fn find_exams(&self, filter: &ExamFilter) -> Result<Vec<Exam>>;

    /// Find placement drives matching the filter.
    async fn find_placements(&self, filter: &PlacementFilter) -> Result<Vec<PlacementDrive>>;
}
