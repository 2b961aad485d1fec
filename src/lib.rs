//! Campus Concierge
//!
//! A chat assistant that answers student questions about campus events,
//! exam schedules and placement drives.
//!
//! # Overview
//!
//! Each question goes through one bounded turn:
//! - the LLM picks zero or more data tools and their filters
//! - the filters are validated and the tools query the campus store
//! - the LLM phrases an answer from the rows it got back
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `store` - Campus data types, the store trait and its SQLite implementation
//! - `agent` - Tool definitions, the chat model abstraction and the per-turn workflow
//! - `api` - HTTP surface (`POST /chat`)
//! - `cli` - Command-line interface
//!
//! # Example
//!
//! ```rust,no_run
//! use concierge::agent::Agent;
//! use concierge::config::Settings;
//! use concierge::store::SqliteCampusStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let store = Arc::new(SqliteCampusStore::open(&settings.database_path())?);
//!     let agent = Agent::from_settings(&settings, store, None)?;
//!
//!     let response = agent.answer("Any technical events tomorrow?", "demo").await?;
//!     println!("{}", response.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod openai;
pub mod store;

pub use error::{ConciergeError, Result};
