//! Prompt templates for the concierge.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub selection: SelectionPrompts,
    pub synthesis: SynthesisPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for the tool selection call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionPrompts {
    pub system: String,
    /// Sent after a rejected tool call, before the single retry.
    pub retry: String,
    /// Answer returned when selection fails twice.
    pub fallback: String,
}

impl Default for SelectionPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are the Campus Concierge for a college campus.

You only help students with:
1. Campus events (cultural, technical, other)
2. Examination schedules
3. Placement drives

You have three tools:
- find_events: events, optionally filtered by date range and category
- find_exams: exams, optionally filtered by department, semester and subject
- find_placements: placement drives, optionally filtered by date range, department and company

Rules:
- Call a tool whenever the question is about events, exams or placements
- Only pass filters the student actually asked for; leave the rest out
- Dates are ISO format (YYYY-MM-DD). Resolve words like "today", "tomorrow" or "this week" against the current date
- Categories are: cultural, technical, other
- Departments are: CSE, ECE, ME, CE, IT, EEE
- Semesters are integers from 1 to 8
- You may call more than one tool if the question spans several topics
- For greetings or out-of-scope questions, do not call any tool

Current date: {{current_date}}"#
                .to_string(),

            retry: r#"Your previous tool call was rejected: {{error}}

Correct the arguments using only the allowed values and call the tool again, or call no tool if the question cannot be answered from campus data."#
                .to_string(),

            fallback: "Sorry, I could not understand that request. Try asking about campus events, exam schedules, or placement drives, for example \"Any technical events this week?\" or \"When is the CSE semester 3 exam?\"".to_string(),
        }
    }
}

/// Prompts for the answer synthesis call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisPrompts {
    pub system: String,
    pub user: String,
    /// User prompt when no tool was selected.
    pub no_data: String,
}

impl Default for SynthesisPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are the Campus Concierge for a college campus. You answer student questions about campus events, exam schedules and placement drives.

Guidelines:
- Answer using only the tool results provided; never invent dates, times, venues or companies
- If a tool returned no matching rows, say clearly that nothing was found for that request
- Be friendly, concise and student-oriented
- Use short lists when there are several items
- If the question is outside events, exams and placements, politely say you can only help with those

Current date: {{current_date}}"#
                .to_string(),

            user: r#"Question: {{question}}

Campus data looked up for this question:

{{results}}

Answer the question based on the data above."#
                .to_string(),

            no_data: r#"Question: {{question}}

No campus data was looked up for this message. Reply briefly; if the student seems to want campus information, tell them what you can help with."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let selection_path = custom_path.join("selection.toml");
            if selection_path.exists() {
                let content = std::fs::read_to_string(&selection_path)?;
                prompts.selection = toml::from_str(&content)?;
            }

            let synthesis_path = custom_path.join("synthesis.toml");
            if synthesis_path.exists() {
                let content = std::fs::read_to_string(&synthesis_path)?;
                prompts.synthesis = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are expanded in a single pass: substituted values are
    /// copied as-is, and unknown `{{name}}` placeholders are left in place.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                result.push_str(&rest[start..]);
                return result;
            };
            match vars.get(&after[..end]) {
                Some(value) => result.push_str(value),
                None => result.push_str(&rest[start..start + 2 + end + 2]),
            }
            rest = &after[end + 2..];
        }
        result.push_str(rest);
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.selection.system.contains("{{current_date}}"));
        assert!(prompts.selection.retry.contains("{{error}}"));
        assert!(prompts.synthesis.user.contains("{{results}}"));
        assert!(!prompts.selection.fallback.is_empty());
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} exams.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Asha".to_string());
        vars.insert("count".to_string(), "2".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Asha, you have 2 exams.");
    }

    #[test]
    fn test_substituted_values_are_not_expanded_again() {
        let template = "Question: {{question}}\nRows: {{results}}\nKeep {{unknown}} and {{open";
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "what is {{results}}?".to_string());
        vars.insert("results".to_string(), "[]".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(
            result,
            "Question: what is {{results}}?\nRows: []\nKeep {{unknown}} and {{open"
        );
    }

    #[test]
    fn test_provided_vars_override_custom() {
        let mut custom = HashMap::new();
        custom.insert("campus".to_string(), "North".to_string());
        custom.insert("current_date".to_string(), "never".to_string());
        let prompts = Prompts::load(None, Some(&custom)).unwrap();

        let mut vars = HashMap::new();
        vars.insert("current_date".to_string(), "2026-10-16".to_string());

        let rendered = prompts.render_with_custom("{{campus}} on {{current_date}}", &vars);
        assert_eq!(rendered, "North on 2026-10-16");
    }

    #[test]
    fn test_custom_dir_overrides_one_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("synthesis.toml"),
            "system = \"Answer like a pirate.\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.synthesis.system, "Answer like a pirate.");
        // Fields missing from the file fall back to defaults.
        assert!(prompts.synthesis.user.contains("{{question}}"));
        assert!(prompts.selection.system.contains("find_events"));
    }
}
