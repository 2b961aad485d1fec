//! Ask command implementation.

use super::open_store;
use crate::agent::Agent;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(query: &str, model: Option<String>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Chat, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let store = open_store(&settings)?;
    let agent = Agent::from_settings(&settings, store, model.as_deref())?;

    let spinner = Output::spinner("Looking that up...");

    match agent.answer(query, "cli").await {
        Ok(response) => {
            spinner.finish_and_clear();

            println!("\n{}\n", response.answer);

            if !response.tool_calls.is_empty() {
                Output::header("Lookups");
                for record in &response.tool_calls {
                    Output::tool_call(record);
                }
            }
            if response.fallback {
                Output::warning("The question could not be mapped to a lookup.");
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
