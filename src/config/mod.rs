//! Configuration module for the concierge.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, SelectionPrompts, SynthesisPrompts};
pub use settings::{
    DatabaseSettings, GeneralSettings, LlmSettings, PromptSettings, ServerSettings, Settings,
    ToolSettings,
};
