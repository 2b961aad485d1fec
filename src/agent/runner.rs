//! Agent entry point: one bounded chat turn per query.

use super::model::{ChatModel, ModelReply, OpenAIChatModel, PromptMessage, ToolSpec};
use super::tools::ToolContext;
use super::workflow::ChatTurn;
use crate::config::{Prompts, Settings};
use crate::error::{ConciergeError, Result};
use crate::store::CampusStore;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// Routes a student query to the data tools and phrases the answer.
pub struct Agent {
    model: Arc<dyn ChatModel>,
    tools: ToolContext,
    prompts: Prompts,
    llm_timeout: Duration,
    today: Option<NaiveDate>,
}

impl Agent {
    /// Create a new agent with the given model and tool context.
    pub fn new(model: Arc<dyn ChatModel>, tools: ToolContext) -> Self {
        Self {
            model,
            tools,
            prompts: Prompts::default(),
            llm_timeout: Duration::from_secs(30),
            today: None,
        }
    }

    /// Build an agent from settings, talking to the configured provider.
    pub fn from_settings(
        settings: &Settings,
        store: Arc<dyn CampusStore>,
        model_override: Option<&str>,
    ) -> Result<Self> {
        let mut model = OpenAIChatModel::from_settings(&settings.llm)?;
        if let Some(name) = model_override {
            model = model.with_model(name);
        }

        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        Ok(Self::new(
            Arc::new(model),
            ToolContext::new(store, settings.tools.max_rows),
        )
        .with_prompts(prompts)
        .with_timeout(settings.llm.timeout()))
    }

    /// Use custom prompt templates.
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Set the deadline for each LLM call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = timeout;
        self
    }

    /// Pin the date used to resolve relative dates.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    pub fn prompts(&self) -> &Prompts {
        &self.prompts
    }

    pub fn tools(&self) -> &ToolContext {
        &self.tools
    }

    /// Answer one query.
    pub async fn answer(&self, query: &str, session_id: &str) -> Result<AgentResponse> {
        let request_id = Uuid::new_v4();
        let span = info_span!("chat", session_id = %session_id, request_id = %request_id);

        async {
            info!("Handling query ({} chars)", query.chars().count());
            let response = ChatTurn::new(self, query).run().await?;
            info!(
                "Answered with {} tool call(s) after {} selection attempt(s){}",
                response.tool_calls.len(),
                response.selection_attempts,
                if response.fallback { " (fallback)" } else { "" }
            );
            Ok::<_, ConciergeError>(response)
        }
        .instrument(span)
        .await
    }

    /// Call the model, bounded by the LLM deadline.
    pub(crate) async fn call_model(
        &self,
        messages: &[PromptMessage],
        tools: &[ToolSpec],
    ) -> Result<ModelReply> {
        match tokio::time::timeout(self.llm_timeout, self.model.chat(messages, tools)).await {
            Ok(reply) => reply,
            Err(_) => Err(ConciergeError::Timeout(self.llm_timeout)),
        }
    }
}

/// Result of one chat turn.
#[derive(Debug, Clone, Serialize)]
pub struct AgentResponse {
    /// The answer shown to the student.
    pub answer: String,
    /// Tools executed for this answer, in selection order.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of selection calls made (1 or 2).
    pub selection_attempts: u32,
    /// Whether the canned fallback answer was used.
    pub fallback: bool,
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// Filters in effect, as `key=value` pairs.
    pub arguments: String,
    /// Number of rows returned.
    pub rows: usize,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({}) -> {} row(s)", self.name, self.arguments, self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::model::testing::{Scripted, ScriptedModel};
    use crate::agent::model::RequestedToolCall;
    use crate::store::seed::{sample_data, SeedData};
    use crate::store::{Category, Event, SqliteCampusStore};
    use chrono::NaiveTime;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn store_with(data: &SeedData) -> Arc<dyn CampusStore> {
        let store = SqliteCampusStore::in_memory().unwrap();
        store.replace_all(data).unwrap();
        Arc::new(store)
    }

    fn agent(model: Arc<ScriptedModel>, data: &SeedData) -> Agent {
        Agent::new(model, ToolContext::new(store_with(data), 100)).with_today(today())
    }

    fn user_prompt(model: &ScriptedModel, call: usize) -> String {
        let (messages, _) = model.request(call);
        match messages.last() {
            Some(PromptMessage::User(text)) => text.clone(),
            other => panic!("Expected user message, got {:?}", other),
        }
    }

    #[test]
    fn test_tool_call_record_display() {
        let record = ToolCallRecord {
            name: "find_exams".to_string(),
            arguments: "department=CSE, semester=3".to_string(),
            rows: 1,
        };
        assert_eq!(
            format!("{}", record),
            "find_exams(department=CSE, semester=3) -> 1 row(s)"
        );
    }

    #[tokio::test]
    async fn test_technical_events_tomorrow() {
        let mut data = SeedData::default();
        data.events.push(Event {
            id: 1,
            title: "Tech Fest".to_string(),
            category: Category::Technical,
            date: today().succ_opt().unwrap(),
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            location: "Main Auditorium".to_string(),
            organizer: "Tech Club".to_string(),
            description: None,
        });

        let model = Arc::new(ScriptedModel::replies(vec![
            ModelReply::tool_call(
                "find_events",
                r#"{"date_from": "2026-10-17", "date_to": "2026-10-17", "category": "technical"}"#,
            ),
            ModelReply::text("Tomorrow there is Tech Fest at 10:00 in the Main Auditorium."),
        ]));
        let agent = agent(model.clone(), &data);

        let response = agent
            .answer("Are there any technical events tomorrow?", "s1")
            .await
            .unwrap();

        assert!(response.answer.contains("Tech Fest"));
        assert!(!response.fallback);
        assert_eq!(response.selection_attempts, 1);
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].rows, 1);

        // Selection sees tools and today's date; synthesis sees the rows and no tools.
        let (selection, tool_count) = model.request(0);
        assert_eq!(tool_count, 3);
        match &selection[0] {
            PromptMessage::System(text) => assert!(text.contains("2026-10-16")),
            other => panic!("Expected system message, got {:?}", other),
        }
        let (_, tool_count) = model.request(1);
        assert_eq!(tool_count, 0);
        assert!(user_prompt(&model, 1).contains("\"Tech Fest\""));
    }

    #[tokio::test]
    async fn test_no_tool_selected_still_synthesizes() {
        let model = Arc::new(ScriptedModel::replies(vec![
            ModelReply::text("Hello!"),
            ModelReply::text("Hi! Ask me about events, exams or placements."),
        ]));
        let agent = agent(model.clone(), &SeedData::default());

        let response = agent.answer("hello", "s1").await.unwrap();

        assert!(response.tool_calls.is_empty());
        assert_eq!(model.calls(), 2);
        assert!(user_prompt(&model, 1).contains("No campus data was looked up"));
    }

    #[tokio::test]
    async fn test_retry_after_validation_error() {
        let data = sample_data(today()).unwrap();
        let model = Arc::new(ScriptedModel::replies(vec![
            ModelReply::tool_call("find_events", r#"{"category": "sports"}"#),
            ModelReply::tool_call("find_events", r#"{"category": "other"}"#),
            ModelReply::text("There is a Blood Donation Camp."),
        ]));
        let agent = agent(model.clone(), &data);

        let response = agent.answer("any sports events?", "s1").await.unwrap();

        assert_eq!(response.selection_attempts, 2);
        assert!(!response.fallback);
        assert_eq!(response.tool_calls[0].arguments, "category=other");

        let (retry, _) = model.request(1);
        assert_eq!(retry.len(), 4);
        assert!(matches!(&retry[2], PromptMessage::Assistant(text) if text.contains("sports")));
        assert!(user_prompt(&model, 1).contains("unknown category 'sports'"));
    }

    #[tokio::test]
    async fn test_two_failed_selections_fall_back() {
        let model = Arc::new(ScriptedModel::replies(vec![
            ModelReply::tool_call("find_exams", r#"{"department": "MBA"}"#),
            ModelReply::tool_call("find_hostels", "{}"),
        ]));
        let agent = agent(model.clone(), &sample_data(today()).unwrap());

        let response = agent.answer("when is my exam", "s1").await.unwrap();

        assert!(response.fallback);
        assert_eq!(response.answer, Prompts::default().selection.fallback);
        assert!(response.tool_calls.is_empty());
        // No synthesis call after the fallback.
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_exam_not_found() {
        let model = Arc::new(ScriptedModel::replies(vec![
            ModelReply::tool_call("find_exams", r#"{"department": "CSE", "semester": 3}"#),
            ModelReply::text("I couldn't find any CSE semester 3 exam in the schedule."),
        ]));
        let agent = agent(model.clone(), &SeedData::default());

        let response = agent
            .answer("When is the CSE semester 3 exam?", "s1")
            .await
            .unwrap();

        assert_eq!(response.tool_calls[0].rows, 0);
        assert!(response.answer.contains("couldn't find"));
        assert!(user_prompt(&model, 1).contains("No matching rows."));
    }

    #[tokio::test]
    async fn test_multiple_tools_are_merged() {
        let model = Arc::new(ScriptedModel::replies(vec![
            ModelReply {
                content: None,
                tool_calls: vec![
                    RequestedToolCall {
                        name: "find_exams".to_string(),
                        arguments: r#"{"department": "CSE", "semester": 3}"#.to_string(),
                    },
                    RequestedToolCall {
                        name: "find_placements".to_string(),
                        arguments: r#"{"company": "infosys"}"#.to_string(),
                    },
                ],
            },
            ModelReply::text("Your exam is first, then the Infosys drive."),
        ]));
        let agent = agent(model.clone(), &sample_data(today()).unwrap());

        let response = agent
            .answer("My CSE sem 3 exam and the Infosys drive?", "s1")
            .await
            .unwrap();

        let names: Vec<_> = response.tool_calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["find_exams", "find_placements"]);

        let prompt = user_prompt(&model, 1);
        let exams = prompt.find("### find_exams").unwrap();
        let placements = prompt.find("### find_placements").unwrap();
        assert!(exams < placements);
        assert!(prompt.contains("Data Structures"));
        assert!(prompt.contains("Infosys"));
    }

    #[tokio::test]
    async fn test_llm_timeout() {
        let model = Arc::new(ScriptedModel::new(vec![Scripted::Stall]));
        let agent = agent(model, &SeedData::default()).with_timeout(Duration::from_millis(50));

        let err = agent.answer("any events?", "s1").await.unwrap_err();
        assert!(matches!(err, ConciergeError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_synthesis_timeout() {
        let model = Arc::new(ScriptedModel::new(vec![
            Scripted::Reply(ModelReply::tool_call("find_events", "{}")),
            Scripted::Stall,
        ]));
        let agent = agent(model.clone(), &sample_data(today()).unwrap())
            .with_timeout(Duration::from_millis(50));

        let err = agent.answer("any events?", "s1").await.unwrap_err();
        assert!(matches!(err, ConciergeError::Timeout(_)));
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_upstream_error_propagates() {
        let model = Arc::new(ScriptedModel::new(vec![Scripted::Fail(ConciergeError::Llm(
            "rate limited".to_string(),
        ))]));
        let agent = agent(model, &SeedData::default());

        let err = agent.answer("any events?", "s1").await.unwrap_err();
        assert!(matches!(err, ConciergeError::Llm(_)));
    }
}
