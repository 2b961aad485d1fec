//! SQLite-backed campus store.
//!
//! The chat path only ever issues SELECTs; `replace_all` exists for the
//! `seed` command and tests.

use super::seed::SeedData;
use super::{
    fold_case, CampusStore, Category, DateRange, Department, Event, EventFilter, Exam,
    ExamFilter, PlacementDrive, PlacementFilter, Semester,
};
use crate::error::{ConciergeError, Result};
use async_trait::async_trait;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Type, Value, ValueRef};
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, params_from_iter, Connection, Row, ToSql};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    category TEXT NOT NULL CHECK(category IN ('cultural', 'technical', 'other')),
    date TEXT NOT NULL,
    time TEXT NOT NULL,
    location TEXT NOT NULL,
    organizer TEXT NOT NULL,
    description TEXT
);

CREATE INDEX IF NOT EXISTS idx_events_date ON events(date);

CREATE TABLE IF NOT EXISTS exams (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    subject TEXT NOT NULL,
    department TEXT NOT NULL CHECK(department IN ('CSE', 'ECE', 'ME', 'CE', 'IT', 'EEE')),
    semester INTEGER NOT NULL CHECK(semester BETWEEN 1 AND 8),
    date TEXT NOT NULL,
    time TEXT NOT NULL,
    venue TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_exams_date ON exams(date);

CREATE TABLE IF NOT EXISTS placements (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    company TEXT NOT NULL,
    roles TEXT NOT NULL,
    departments TEXT NOT NULL,
    date TEXT NOT NULL,
    time TEXT NOT NULL,
    venue TEXT NOT NULL,
    description TEXT
);

CREATE INDEX IF NOT EXISTS idx_placements_date ON placements(date);
"#;

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub events: usize,
    pub exams: usize,
    pub placements: usize,
}

/// SQLite campus store.
pub struct SqliteCampusStore {
    conn: Mutex<Connection>,
}

impl SqliteCampusStore {
    /// Open (or create) the campus database at `path`.
    #[instrument(skip_all)]
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        init(&conn)?;

        info!("Opened campus database at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ConciergeError::Store(format!("Failed to acquire lock: {}", e)))
    }

    /// Replace every row in all three tables with `data`.
    #[instrument(skip(self, data))]
    pub fn replace_all(&self, data: &SeedData) -> Result<TableCounts> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute_batch(
            "DELETE FROM events; DELETE FROM exams; DELETE FROM placements;",
        )?;

        for event in &data.events {
            tx.execute(
                r#"
                INSERT INTO events (id, title, category, date, time, location, organizer, description)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    event.id,
                    event.title,
                    event.category,
                    event.date,
                    event.time,
                    event.location,
                    event.organizer,
                    event.description,
                ],
            )?;
        }

        for exam in &data.exams {
            tx.execute(
                r#"
                INSERT INTO exams (id, name, subject, department, semester, date, time, venue)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    exam.id,
                    exam.name,
                    exam.subject,
                    exam.department,
                    exam.semester,
                    exam.date,
                    exam.time,
                    exam.venue,
                ],
            )?;
        }

        for drive in &data.placements {
            tx.execute(
                r#"
                INSERT INTO placements (id, company, roles, departments, date, time, venue, description)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    drive.id,
                    drive.company,
                    serde_json::to_string(&drive.roles)?,
                    serde_json::to_string(&drive.departments)?,
                    drive.date,
                    drive.time,
                    drive.venue,
                    drive.description,
                ],
            )?;
        }

        tx.commit()?;

        let counts = Self::count_rows(&conn)?;
        info!(
            "Loaded {} events, {} exams, {} placement drives",
            counts.events, counts.exams, counts.placements
        );
        Ok(counts)
    }

    /// Count the rows in each table.
    pub fn counts(&self) -> Result<TableCounts> {
        let conn = self.conn()?;
        Self::count_rows(&conn)
    }

    fn count_rows(conn: &Connection) -> Result<TableCounts> {
        let count = |table: &str| -> Result<usize> {
            let n: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
            Ok(n as usize)
        };

        Ok(TableCounts {
            events: count("events")?,
            exams: count("exams")?,
            placements: count("placements")?,
        })
    }

    fn query<T>(
        &self,
        query: &WhereClause,
        select: &str,
        limit: Option<u32>,
        map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        let conn = self.conn()?;
        let sql = query.build(select, limit);
        debug!("Running query: {}", sql);

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(query.params.iter()), map)?
            .collect::<rusqlite::Result<Vec<T>>>()?;
        Ok(rows)
    }
}

#[async_trait]
impl CampusStore for SqliteCampusStore {
    #[instrument(skip(self))]
    async fn find_events(&self, filter: &EventFilter) -> Result<Vec<Event>> {
        let mut query = WhereClause::default();
        query.date_range(&filter.date_range);
        if let Some(category) = filter.category {
            query.push("category = ?", Value::Text(category.as_str().to_string()));
        }

        let events = self.query(
            &query,
            "SELECT id, title, category, date, time, location, organizer, description FROM events",
            filter.limit,
            event_from_row,
        )?;

        debug!("Found {} events", events.len());
        Ok(events)
    }

    #[instrument(skip(self))]
    async fn find_exams(&self, filter: &ExamFilter) -> Result<Vec<Exam>> {
        let mut query = WhereClause::default();
        if let Some(department) = filter.department {
            query.push("department = ?", Value::Text(department.code().to_string()));
        }
        if let Some(semester) = filter.semester {
            query.push("semester = ?", Value::Integer(semester.get() as i64));
        }
        if let Some(subject) = &filter.subject {
            query.push(
                "casefold(subject) LIKE ? ESCAPE '\\'",
                Value::Text(like_pattern(subject)),
            );
        }

        let exams = self.query(
            &query,
            "SELECT id, name, subject, department, semester, date, time, venue FROM exams",
            filter.limit,
            exam_from_row,
        )?;

        debug!("Found {} exams", exams.len());
        Ok(exams)
    }

    #[instrument(skip(self))]
    async fn find_placements(&self, filter: &PlacementFilter) -> Result<Vec<PlacementDrive>> {
        let mut query = WhereClause::default();
        query.date_range(&filter.date_range);
        if let Some(department) = filter.department {
            query.push(
                "EXISTS (SELECT 1 FROM json_each(placements.departments) WHERE json_each.value = ?)",
                Value::Text(department.code().to_string()),
            );
        }
        if let Some(company) = &filter.company {
            query.push(
                "casefold(company) LIKE ? ESCAPE '\\'",
                Value::Text(like_pattern(company)),
            );
        }

        let drives = self.query(
            &query,
            "SELECT id, company, roles, departments, date, time, venue, description FROM placements",
            filter.limit,
            placement_from_row,
        )?;

        debug!("Found {} placement drives", drives.len());
        Ok(drives)
    }
}

/// Accumulates `AND`-joined conditions and their bound parameters.
#[derive(Default)]
struct WhereClause {
    conditions: Vec<&'static str>,
    params: Vec<Value>,
}

impl WhereClause {
    fn push(&mut self, condition: &'static str, value: Value) {
        self.conditions.push(condition);
        self.params.push(value);
    }

    fn date_range(&mut self, range: &DateRange) {
        if let Some(from) = range.from() {
            self.push("date >= ?", Value::Text(from.to_string()));
        }
        if let Some(to) = range.to() {
            self.push("date <= ?", Value::Text(to.to_string()));
        }
    }

    fn build(&self, select: &str, limit: Option<u32>) -> String {
        let mut sql = select.to_string();
        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY date ASC, time ASC, id ASC");
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        sql
    }
}

/// Register `casefold()` and create the schema.
///
/// SQLite's own `LOWER()` and `LIKE` only fold ASCII, so substring columns
/// are compared through `casefold()` against a pattern folded the same way.
fn init(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "casefold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: String = ctx.get(0)?;
            Ok(fold_case(&value))
        },
    )?;
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Case-folded `%substring%` pattern with LIKE wildcards escaped.
fn like_pattern(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len() + 2);
    escaped.push('%');
    for c in fold_case(input.trim()).chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        title: row.get(1)?,
        category: row.get(2)?,
        date: row.get(3)?,
        time: row.get(4)?,
        location: row.get(5)?,
        organizer: row.get(6)?,
        description: row.get(7)?,
    })
}

fn exam_from_row(row: &Row<'_>) -> rusqlite::Result<Exam> {
    Ok(Exam {
        id: row.get(0)?,
        name: row.get(1)?,
        subject: row.get(2)?,
        department: row.get(3)?,
        semester: row.get(4)?,
        date: row.get(5)?,
        time: row.get(6)?,
        venue: row.get(7)?,
    })
}

fn placement_from_row(row: &Row<'_>) -> rusqlite::Result<PlacementDrive> {
    let roles: String = row.get(2)?;
    let departments: String = row.get(3)?;

    Ok(PlacementDrive {
        id: row.get(0)?,
        company: row.get(1)?,
        roles: json_column::<Vec<String>>(2, &roles)?,
        departments: json_column::<BTreeSet<Department>>(3, &departments)?,
        date: row.get(4)?,
        time: row.get(5)?,
        venue: row.get(6)?,
        description: row.get(7)?,
    })
}

fn json_column<T: serde::de::DeserializeOwned>(index: usize, raw: &str) -> rusqlite::Result<T> {
    serde_json::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: ConciergeError| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for Department {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for Department {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: ConciergeError| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for Semester {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.get()))
    }
}

impl FromSql for Semester {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Semester::new(value.as_i64()?).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::seed::sample_data;
    use chrono::{Duration, NaiveDate, NaiveTime};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn seeded() -> SqliteCampusStore {
        let store = SqliteCampusStore::in_memory().unwrap();
        store.replace_all(&sample_data(today()).unwrap()).unwrap();
        store
    }

    fn assert_date_ordered<T>(rows: &[T], date: impl Fn(&T) -> NaiveDate) {
        assert!(rows.windows(2).all(|w| date(&w[0]) <= date(&w[1])));
    }

    #[tokio::test]
    async fn test_no_filters_returns_every_row() {
        let store = seeded();
        let counts = store.counts().unwrap();

        let events = store.find_events(&EventFilter::default()).await.unwrap();
        let exams = store.find_exams(&ExamFilter::default()).await.unwrap();
        let drives = store
            .find_placements(&PlacementFilter::default())
            .await
            .unwrap();

        assert_eq!(events.len(), counts.events);
        assert_eq!(exams.len(), counts.exams);
        assert_eq!(drives.len(), counts.placements);
        assert_date_ordered(&events, |e| e.date);
        assert_date_ordered(&exams, |e| e.date);
        assert_date_ordered(&drives, |d| d.date);
    }

    #[tokio::test]
    async fn test_events_by_category_and_day() {
        let store = seeded();
        let tomorrow = today() + Duration::days(1);
        let filter = EventFilter {
            date_range: DateRange::day(tomorrow),
            category: Some(Category::Technical),
            limit: None,
        };

        let events = store.find_events(&filter).await.unwrap();
        assert!(!events.is_empty());
        assert!(events.iter().all(|e| filter.matches(e)));
    }

    #[tokio::test]
    async fn test_events_same_day_ordered_by_time() {
        let store = seeded();
        let events = store
            .find_events(&EventFilter {
                date_range: DateRange::day(today()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(events.len() >= 2);
        assert!(events.windows(2).all(|w| w[0].time <= w[1].time));
    }

    #[tokio::test]
    async fn test_exams_every_row_satisfies_filters() {
        let store = seeded();
        let filter = ExamFilter {
            department: Some(Department::Cse),
            semester: Some(Semester::new(3).unwrap()),
            subject: None,
            limit: None,
        };

        let exams = store.find_exams(&filter).await.unwrap();
        assert_eq!(exams.len(), 1);
        assert!(exams.iter().all(|e| filter.matches(e)));
    }

    #[tokio::test]
    async fn test_exam_subject_is_case_insensitive_substring() {
        let store = seeded();
        let exams = store
            .find_exams(&ExamFilter {
                subject: Some("DATA".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let subjects: Vec<_> = exams.iter().map(|e| e.subject.as_str()).collect();
        assert_eq!(subjects, vec!["Data Structures", "Database Management Systems"]);
    }

    #[tokio::test]
    async fn test_like_wildcards_are_literal() {
        let store = seeded();
        let exams = store
            .find_exams(&ExamFilter {
                subject: Some("%".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(exams.is_empty());

        let drives = store
            .find_placements(&PlacementFilter {
                company: Some("_".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(drives.is_empty());
    }

    #[tokio::test]
    async fn test_company_match_folds_non_ascii_case() {
        let store = SqliteCampusStore::in_memory().unwrap();
        let drive = PlacementDrive {
            id: 1,
            company: "Ölwerk Énergie".to_string(),
            roles: vec!["Process Engineer".to_string()],
            departments: BTreeSet::from([Department::Me]),
            date: today(),
            time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            venue: "Seminar Hall".to_string(),
            description: None,
        };
        store
            .replace_all(&SeedData {
                events: Vec::new(),
                exams: Vec::new(),
                placements: vec![drive.clone()],
            })
            .unwrap();

        for query in ["Ölwerk", "ölWERK", "éNERGIE"] {
            let filter = PlacementFilter {
                company: Some(query.to_string()),
                ..Default::default()
            };
            let drives = store.find_placements(&filter).await.unwrap();
            assert_eq!(drives.len(), 1, "query {:?}", query);
            assert!(filter.matches(&drive), "query {:?}", query);
        }
    }

    #[tokio::test]
    async fn test_placements_by_department_membership() {
        let store = seeded();
        let ece = PlacementFilter {
            department: Some(Department::Ece),
            ..Default::default()
        };

        let drives = store.find_placements(&ece).await.unwrap();
        let companies: Vec<_> = drives.iter().map(|d| d.company.as_str()).collect();
        assert_eq!(companies, vec!["TCS", "Accenture"]);
        assert!(drives.iter().all(|d| ece.matches(d)));

        let me = store
            .find_placements(&PlacementFilter {
                department: Some(Department::Me),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(me.is_empty());
    }

    #[tokio::test]
    async fn test_placements_by_company_and_window() {
        let store = seeded();
        let filter = PlacementFilter {
            date_range: DateRange::new(Some(today()), Some(today() + Duration::days(7))).unwrap(),
            company: Some("tcs".to_string()),
            ..Default::default()
        };

        let drives = store.find_placements(&filter).await.unwrap();
        assert_eq!(drives.len(), 1);
        assert_eq!(drives[0].company, "TCS");
        assert_eq!(drives[0].roles, vec!["Assistant System Engineer".to_string()]);
        assert!(drives[0].departments.contains(&Department::Ece));
    }

    #[tokio::test]
    async fn test_limit_bounds_results() {
        let store = seeded();
        let events = store
            .find_events(&EventFilter {
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_table_returns_empty() {
        let store = SqliteCampusStore::in_memory().unwrap();
        let exams = store.find_exams(&ExamFilter::default()).await.unwrap();
        assert!(exams.is_empty());
    }

    #[test]
    fn test_replace_all_overwrites_previous_rows() {
        let store = seeded();
        let data = SeedData {
            events: vec![Event {
                id: 1,
                title: "Tech Fest".to_string(),
                category: Category::Technical,
                date: today(),
                time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                location: "Main Auditorium".to_string(),
                organizer: "Tech Club".to_string(),
                description: None,
            }],
            exams: Vec::new(),
            placements: Vec::new(),
        };

        let counts = store.replace_all(&data).unwrap();
        assert_eq!(
            counts,
            TableCounts {
                events: 1,
                exams: 0,
                placements: 0
            }
        );
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("campus.db");
        let store = SqliteCampusStore::open(&path).unwrap();
        assert_eq!(store.counts().unwrap(), TableCounts::default());
        assert!(path.exists());
    }

    #[test]
    fn test_like_pattern() {
        assert_eq!(like_pattern("Data"), "%data%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
