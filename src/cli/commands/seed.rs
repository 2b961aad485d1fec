//! Seed command implementation.

use super::open_store;
use crate::cli::Output;
use crate::config::Settings;
use crate::store::seed::sample_data;
use anyhow::Result;

/// Replace all campus data with the demo dataset.
pub fn run_seed(settings: Settings) -> Result<()> {
    let store = open_store(&settings)?;
    let today = chrono::Local::now().date_naive();

    let counts = store.replace_all(&sample_data(today)?)?;

    Output::success(&format!(
        "Seeded {} with demo data dated from {}",
        settings.database_path().display(),
        today
    ));
    Output::kv("Events", &counts.events.to_string());
    Output::kv("Exams", &counts.exams.to_string());
    Output::kv("Placement drives", &counts.placements.to_string());

    Ok(())
}
