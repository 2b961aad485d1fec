//! CLI command implementations.

mod ask;
mod config;
mod list;
mod seed;
mod serve;

pub use ask::run_ask;
pub use config::run_config;
pub use list::run_list;
pub use seed::run_seed;
pub use serve::run_serve;

use crate::config::Settings;
use crate::store::SqliteCampusStore;
use std::sync::Arc;

/// Open the configured campus database.
fn open_store(settings: &Settings) -> crate::error::Result<Arc<SqliteCampusStore>> {
    Ok(Arc::new(SqliteCampusStore::open(&settings.database_path())?))
}
