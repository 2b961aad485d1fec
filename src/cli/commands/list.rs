//! List command implementation.

use super::open_store;
use crate::agent::ToolContext;
use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, Table};
use crate::config::Settings;
use crate::store::{EventFilter, ExamFilter, PlacementFilter};
use anyhow::Result;

/// Run the list command.
pub async fn run_list(table: Table, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::List, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let tools = ToolContext::new(open_store(&settings)?, settings.tools.max_rows);

    let shown = match table {
        Table::Events => {
            let rows = tools.find_events(&EventFilter::default()).await?;
            Output::header(&format!("Events ({})", rows.len()));
            rows.iter().for_each(Output::event);
            rows.len()
        }
        Table::Exams => {
            let rows = tools.find_exams(&ExamFilter::default()).await?;
            Output::header(&format!("Exams ({})", rows.len()));
            rows.iter().for_each(Output::exam);
            rows.len()
        }
        Table::Placements => {
            let rows = tools.find_placements(&PlacementFilter::default()).await?;
            Output::header(&format!("Placement drives ({})", rows.len()));
            rows.iter().for_each(Output::placement);
            rows.len()
        }
    };

    if shown == 0 {
        Output::info("Nothing here yet. Use 'concierge seed' to load demo data.");
    } else if shown as u32 == settings.tools.max_rows {
        Output::warning(&format!("Showing the first {} rows (tools.max_rows).", shown));
    }

    Ok(())
}
