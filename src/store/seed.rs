//! Demo dataset, dated relative to a given day.

use super::{Category, Department, Event, Exam, PlacementDrive, Semester};
use crate::error::Result;
use chrono::{Duration, NaiveDate, NaiveTime};

/// Rows for all three tables.
#[derive(Debug, Clone, Default)]
pub struct SeedData {
    pub events: Vec<Event>,
    pub exams: Vec<Exam>,
    pub placements: Vec<PlacementDrive>,
}

fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

#[allow(clippy::too_many_arguments)]
fn event(
    id: i64,
    title: &str,
    category: Category,
    date: NaiveDate,
    time: NaiveTime,
    location: &str,
    organizer: &str,
    description: &str,
) -> Event {
    Event {
        id,
        title: title.to_string(),
        category,
        date,
        time,
        location: location.to_string(),
        organizer: organizer.to_string(),
        description: Some(description.to_string()),
    }
}

#[allow(clippy::too_many_arguments)]
fn exam(
    id: i64,
    name: &str,
    subject: &str,
    department: Department,
    semester: i64,
    date: NaiveDate,
    time: NaiveTime,
    venue: &str,
) -> Result<Exam> {
    Ok(Exam {
        id,
        name: name.to_string(),
        subject: subject.to_string(),
        department,
        semester: Semester::new(semester)?,
        date,
        time,
        venue: venue.to_string(),
    })
}

fn drive(
    id: i64,
    company: &str,
    roles: &[&str],
    departments: &[Department],
    date: NaiveDate,
    time: NaiveTime,
    venue: &str,
) -> PlacementDrive {
    PlacementDrive {
        id,
        company: company.to_string(),
        roles: roles.iter().map(|r| r.to_string()).collect(),
        departments: departments.iter().copied().collect(),
        date,
        time,
        venue: venue.to_string(),
        description: None,
    }
}

/// Build the demo dataset with dates counted from `today`.
pub fn sample_data(today: NaiveDate) -> Result<SeedData> {
    let day = |offset: i64| today + Duration::days(offset);

    let events = vec![
        event(
            1,
            "Tech Talk on AI and Machine Learning",
            Category::Technical,
            day(0),
            at(10, 0),
            "Seminar Hall A",
            "CSE Department",
            "Industry expert session on recent AI trends",
        ),
        event(
            2,
            "Annual Cultural Fest - Day 1",
            Category::Cultural,
            day(0),
            at(14, 0),
            "Open Auditorium",
            "Student Council",
            "Dance, music and cultural performances",
        ),
        event(
            3,
            "Hackathon: Code Sprint",
            Category::Technical,
            day(1),
            at(9, 0),
            "Computer Lab Block B",
            "Tech Club",
            "24-hour coding competition with prizes",
        ),
        event(
            4,
            "Traditional Day Celebrations",
            Category::Cultural,
            day(1),
            at(11, 0),
            "Main Ground",
            "Cultural Committee",
            "Celebrate diversity in traditional attire",
        ),
        event(
            5,
            "Blood Donation Camp",
            Category::Other,
            day(3),
            at(9, 30),
            "Health Centre",
            "NSS Unit",
            "Voluntary blood donation drive with the city hospital",
        ),
        event(
            6,
            "Workshop on Cloud Computing",
            Category::Technical,
            day(7),
            at(15, 0),
            "Seminar Hall C",
            "IT Department",
            "Hands-on workshop on public cloud platforms",
        ),
    ];

    let exams = [
        exam(
            1,
            "Mid Semester Examination",
            "Data Structures",
            Department::Cse,
            3,
            day(3),
            at(9, 30),
            "Block B - Room 204",
        ),
        exam(
            2,
            "Mid Semester Examination",
            "Digital Electronics",
            Department::Ece,
            3,
            day(4),
            at(14, 0),
            "Block A - Room 101",
        ),
        exam(
            3,
            "End Semester Examination",
            "Database Management Systems",
            Department::Cse,
            5,
            day(10),
            at(10, 0),
            "Block C - Room 305",
        ),
        exam(
            4,
            "Mid Semester Examination",
            "Engineering Mechanics",
            Department::Me,
            2,
            day(5),
            at(9, 30),
            "Block D - Room 102",
        ),
        exam(
            5,
            "End Semester Examination",
            "Computer Networks",
            Department::It,
            5,
            day(12),
            at(14, 0),
            "Block B - Room 201",
        ),
    ]
    .into_iter()
    .collect::<Result<Vec<_>>>()?;

    use Department::{Cse, Ece, It};
    let placements = vec![
        drive(
            1,
            "Infosys",
            &["System Engineer"],
            &[Cse, It],
            day(2),
            at(9, 0),
            "Placement Cell",
        ),
        drive(
            2,
            "TCS",
            &["Assistant System Engineer"],
            &[Cse, It, Ece],
            day(6),
            at(10, 0),
            "Seminar Hall A",
        ),
        drive(
            3,
            "Wipro",
            &["Project Engineer"],
            &[Cse, It],
            day(8),
            at(9, 30),
            "Placement Cell",
        ),
        drive(
            4,
            "Accenture",
            &["Software Developer", "Associate Software Engineer"],
            &[Cse, It, Ece],
            day(14),
            at(11, 0),
            "Auditorium",
        ),
        drive(
            5,
            "Cognizant",
            &["Programmer Analyst"],
            &[Cse, It],
            day(20),
            at(9, 0),
            "Placement Cell",
        ),
    ];

    Ok(SeedData {
        events,
        exams,
        placements,
    })
}
