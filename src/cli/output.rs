//! CLI output formatting utilities.

use crate::agent::ToolCallRecord;
use crate::store::{Event, Exam, PlacementDrive};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    pub fn tool_call(record: &ToolCallRecord) {
        println!("  {} {}", style("*").cyan(), style(record).dim());
    }

    pub fn event(event: &Event) {
        println!(
            "  {} {} {} ({}, {}) @ {}",
            style("*").cyan(),
            style(event.date).cyan(),
            style(&event.title).bold(),
            event.category,
            event.time.format("%H:%M"),
            event.location
        );
    }

    pub fn exam(exam: &Exam) {
        println!(
            "  {} {} {} - {} ({} sem {}, {}) @ {}",
            style("*").cyan(),
            style(exam.date).cyan(),
            style(&exam.subject).bold(),
            exam.name,
            exam.department,
            exam.semester,
            exam.time.format("%H:%M"),
            exam.venue
        );
    }

    pub fn placement(drive: &PlacementDrive) {
        let departments: Vec<&str> = drive.departments.iter().map(|d| d.code()).collect();
        println!(
            "  {} {} {} - {} [{}] ({}) @ {}",
            style("*").cyan(),
            style(drive.date).cyan(),
            style(&drive.company).bold(),
            drive.roles.join(", "),
            departments.join(", "),
            drive.time.format("%H:%M"),
            drive.venue
        );
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) =
            ProgressStyle::default_spinner().template("{spinner:.green} {msg}")
        {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}
