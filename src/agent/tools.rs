//! Data tools exposed to the agent.
//!
//! Each tool is a deterministic lookup over one campus table. The model's
//! raw arguments are validated into typed filters here, so nothing the
//! model invents ever reaches the store unchecked.

use super::model::ToolSpec;
use crate::error::{ConciergeError, Result};
use crate::store::{
    CampusStore, Category, DateRange, Department, Event, EventFilter, Exam, ExamFilter,
    PlacementDrive, PlacementFilter, Semester,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

pub const FIND_EVENTS: &str = "find_events";
pub const FIND_EXAMS: &str = "find_exams";
pub const FIND_PLACEMENTS: &str = "find_placements";

/// A validated tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    Events(EventFilter),
    Exams(ExamFilter),
    Placements(PlacementFilter),
}

impl ToolCall {
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::Events(_) => FIND_EVENTS,
            ToolCall::Exams(_) => FIND_EXAMS,
            ToolCall::Placements(_) => FIND_PLACEMENTS,
        }
    }

    /// Human-readable `key=value` list of the filters in effect.
    pub fn describe_arguments(&self) -> String {
        let mut parts = Vec::new();
        match self {
            ToolCall::Events(f) => {
                if !f.date_range.is_unbounded() {
                    parts.push(format!("dates={}", f.date_range));
                }
                if let Some(category) = f.category {
                    parts.push(format!("category={}", category));
                }
            }
            ToolCall::Exams(f) => {
                if let Some(department) = f.department {
                    parts.push(format!("department={}", department));
                }
                if let Some(semester) = f.semester {
                    parts.push(format!("semester={}", semester));
                }
                if let Some(subject) = &f.subject {
                    parts.push(format!("subject={:?}", subject));
                }
            }
            ToolCall::Placements(f) => {
                if !f.date_range.is_unbounded() {
                    parts.push(format!("dates={}", f.date_range));
                }
                if let Some(department) = f.department {
                    parts.push(format!("department={}", department));
                }
                if let Some(company) = &f.company {
                    parts.push(format!("company={:?}", company));
                }
            }
        }
        parts.join(", ")
    }
}

impl fmt::Display for ToolCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.describe_arguments())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct EventArgs {
    date_from: Option<String>,
    date_to: Option<String>,
    category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExamArgs {
    department: Option<String>,
    semester: Option<serde_json::Value>,
    subject: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlacementArgs {
    date_from: Option<String>,
    date_to: Option<String>,
    department: Option<String>,
    company: Option<String>,
}

/// Parse and validate a tool call from the model.
///
/// Every failure is a [`ConciergeError::Validation`].
pub fn parse_tool_call(name: &str, arguments: &str) -> Result<ToolCall> {
    match name {
        FIND_EVENTS => {
            let args: EventArgs = parse_arguments(name, arguments)?;
            Ok(ToolCall::Events(EventFilter {
                date_range: parse_range(args.date_from, args.date_to)?,
                category: non_empty(args.category)
                    .map(|c| c.parse::<Category>())
                    .transpose()?,
                limit: None,
            }))
        }
        FIND_EXAMS => {
            let args: ExamArgs = parse_arguments(name, arguments)?;
            Ok(ToolCall::Exams(ExamFilter {
                department: parse_department(args.department)?,
                semester: args.semester.map(parse_semester).transpose()?.flatten(),
                subject: non_empty(args.subject),
                limit: None,
            }))
        }
        FIND_PLACEMENTS => {
            let args: PlacementArgs = parse_arguments(name, arguments)?;
            Ok(ToolCall::Placements(PlacementFilter {
                date_range: parse_range(args.date_from, args.date_to)?,
                department: parse_department(args.department)?,
                company: non_empty(args.company),
                limit: None,
            }))
        }
        _ => Err(ConciergeError::Validation(format!(
            "unknown tool '{}' (available: {}, {}, {})",
            name, FIND_EVENTS, FIND_EXAMS, FIND_PLACEMENTS
        ))),
    }
}

fn parse_arguments<T>(tool: &str, arguments: &str) -> Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    let trimmed = arguments.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(T::default());
    }
    serde_json::from_str(trimmed)
        .map_err(|e| ConciergeError::Validation(format!("bad arguments for {}: {}", tool, e)))
}

/// Models often send "" for "no filter".
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_date(field: &str, value: Option<String>) -> Result<Option<NaiveDate>> {
    non_empty(value)
        .map(|v| {
            NaiveDate::parse_from_str(&v, "%Y-%m-%d").map_err(|_| {
                ConciergeError::Validation(format!(
                    "{} '{}' is not a valid date (expected YYYY-MM-DD)",
                    field, v
                ))
            })
        })
        .transpose()
}

fn parse_range(from: Option<String>, to: Option<String>) -> Result<DateRange> {
    DateRange::new(parse_date("date_from", from)?, parse_date("date_to", to)?)
}

fn parse_department(value: Option<String>) -> Result<Option<Department>> {
    non_empty(value).map(|d| d.parse::<Department>()).transpose()
}

fn parse_semester(value: serde_json::Value) -> Result<Option<Semester>> {
    let number = match &value {
        serde_json::Value::Null => return Ok(None),
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) if s.trim().is_empty() => return Ok(None),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    let number = number.ok_or_else(|| {
        ConciergeError::Validation(format!("semester {} is not a whole number", value))
    })?;
    Semester::new(number).map(Some)
}

/// Tool definitions shown to the model.
pub fn tool_specs() -> Vec<ToolSpec> {
    let categories: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
    let departments: Vec<&str> = Department::ALL.iter().map(|d| d.code()).collect();

    vec![
        ToolSpec {
            name: FIND_EVENTS,
            description: "Find campus events, optionally within a date range and of one category. \
                Use this for questions about fests, talks, workshops, hackathons and other events.",
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "date_from": {
                        "type": "string",
                        "description": "First day to include, YYYY-MM-DD"
                    },
                    "date_to": {
                        "type": "string",
                        "description": "Last day to include, YYYY-MM-DD"
                    },
                    "category": {
                        "type": "string",
                        "enum": categories,
                        "description": "Event category"
                    }
                },
                "additionalProperties": false
            }),
        },
        ToolSpec {
            name: FIND_EXAMS,
            description: "Find exam schedules, optionally by department, semester and subject. \
                Use this for questions about exams, tests and examination timetables.",
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "department": {
                        "type": "string",
                        "enum": departments,
                        "description": "Department code"
                    },
                    "semester": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 8,
                        "description": "Semester number"
                    },
                    "subject": {
                        "type": "string",
                        "description": "Part of the subject name, e.g. \"networks\""
                    }
                },
                "additionalProperties": false
            }),
        },
        ToolSpec {
            name: FIND_PLACEMENTS,
            description: "Find company placement drives, optionally within a date range, \
                open to one department, or for one company.",
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "date_from": {
                        "type": "string",
                        "description": "First day to include, YYYY-MM-DD"
                    },
                    "date_to": {
                        "type": "string",
                        "description": "Last day to include, YYYY-MM-DD"
                    },
                    "department": {
                        "type": "string",
                        "enum": departments,
                        "description": "Department whose students are eligible"
                    },
                    "company": {
                        "type": "string",
                        "description": "Part of the company name"
                    }
                },
                "additionalProperties": false
            }),
        },
    ]
}

/// Rows returned by one tool call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolOutput {
    Events(Vec<Event>),
    Exams(Vec<Exam>),
    Placements(Vec<PlacementDrive>),
}

impl ToolOutput {
    pub fn len(&self) -> usize {
        match self {
            ToolOutput::Events(rows) => rows.len(),
            ToolOutput::Exams(rows) => rows.len(),
            ToolOutput::Placements(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render the rows as prompt context for synthesis.
    ///
    /// A result that reached `max_rows` is flagged as possibly truncated.
    pub fn to_context(&self, max_rows: u32) -> Result<String> {
        if self.is_empty() {
            return Ok("No matching rows.".to_string());
        }
        let rows = serde_json::to_string_pretty(self)?;
        if self.len() >= max_rows as usize {
            Ok(format!(
                "{}\n(Showing the first {} rows; more may match.)",
                rows, max_rows
            ))
        } else {
            Ok(rows)
        }
    }
}

/// Tool execution context holding the store handle.
pub struct ToolContext {
    store: Arc<dyn CampusStore>,
    max_rows: u32,
}

impl ToolContext {
    /// Create a new tool context.
    pub fn new(store: Arc<dyn CampusStore>, max_rows: u32) -> Self {
        Self { store, max_rows }
    }

    /// Upper bound on rows returned per lookup.
    pub fn max_rows(&self) -> u32 {
        self.max_rows
    }

    /// Events matching the filter, bounded by the row cap.
    pub async fn find_events(&self, filter: &EventFilter) -> Result<Vec<Event>> {
        let filter = EventFilter {
            limit: Some(self.cap(filter.limit)),
            ..filter.clone()
        };
        self.store.find_events(&filter).await
    }

    /// Exams matching the filter, bounded by the row cap.
    pub async fn find_exams(&self, filter: &ExamFilter) -> Result<Vec<Exam>> {
        let filter = ExamFilter {
            limit: Some(self.cap(filter.limit)),
            ..filter.clone()
        };
        self.store.find_exams(&filter).await
    }

    /// Placement drives matching the filter, bounded by the row cap.
    pub async fn find_placements(&self, filter: &PlacementFilter) -> Result<Vec<PlacementDrive>> {
        let filter = PlacementFilter {
            limit: Some(self.cap(filter.limit)),
            ..filter.clone()
        };
        self.store.find_placements(&filter).await
    }

    /// Execute a validated tool call.
    #[instrument(skip(self), fields(tool = call.name()))]
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolOutput> {
        let output = match call {
            ToolCall::Events(filter) => ToolOutput::Events(self.find_events(filter).await?),
            ToolCall::Exams(filter) => ToolOutput::Exams(self.find_exams(filter).await?),
            ToolCall::Placements(filter) => {
                ToolOutput::Placements(self.find_placements(filter).await?)
            }
        };
        debug!("{} returned {} row(s)", call, output.len());
        Ok(output)
    }

    fn cap(&self, requested: Option<u32>) -> u32 {
        requested.map_or(self.max_rows, |n| n.min(self.max_rows))
    }
}
