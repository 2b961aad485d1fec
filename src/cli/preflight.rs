//! Pre-flight checks before operations that need the LLM.
//!
//! Fails early with a helpful message instead of midway through a request.

use crate::config::Settings;
use crate::error::{ConciergeError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Serving and asking need the API key and the database.
    Chat,
    /// Listing only needs the database.
    List,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Chat => {
            check_api_key(settings)?;
            check_database(settings)?;
        }
        Operation::List => {
            check_database(settings)?;
        }
    }
    Ok(())
}

fn check_api_key(settings: &Settings) -> Result<()> {
    let var = &settings.llm.api_key_env;
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        Ok(_) => Err(ConciergeError::Config(format!(
            "{} is empty. Set it with: export {}='sk-...'",
            var, var
        ))),
        Err(_) => Err(ConciergeError::Config(format!(
            "{} not set. Set it with: export {}='sk-...'",
            var, var
        ))),
    }
}

fn check_database(settings: &Settings) -> Result<()> {
    let path = settings.database_path();
    if path.exists() {
        Ok(())
    } else {
        Err(ConciergeError::Config(format!(
            "No campus database at {}. Create one with: concierge seed",
            path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_database_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.database.path = dir.path().join("missing.db").to_string_lossy().to_string();

        let err = check(Operation::List, &settings).unwrap_err();
        assert!(err.to_string().contains("concierge seed"));
    }

    #[test]
    fn test_missing_api_key_is_reported() {
        let mut settings = Settings::default();
        settings.llm.api_key_env = "CONCIERGE_PREFLIGHT_KEY_NEVER_SET".to_string();

        let err = check(Operation::Chat, &settings).unwrap_err();
        assert!(err.to_string().contains("CONCIERGE_PREFLIGHT_KEY_NEVER_SET"));
    }
}
