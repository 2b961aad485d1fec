//! Per-request chat workflow: select tools, then synthesize an answer.

use super::model::PromptMessage;
use super::runner::{Agent, AgentResponse, ToolCallRecord};
use super::tools::{parse_tool_call, tool_specs, ToolCall, ToolOutput};
use crate::config::Prompts;
use crate::error::{ConciergeError, Result};
use futures::future::try_join_all;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Selection is tried once, then retried once with the validation error.
pub const MAX_SELECTION_ATTEMPTS: u32 = 2;

/// Where a turn currently is.
#[derive(Debug)]
pub enum TurnState {
    /// Asking the model which tools to call. `attempt` starts at 1.
    Selecting { attempt: u32 },
    /// Tools have run; asking the model to phrase the answer.
    Synthesizing {
        calls: Vec<ToolCall>,
        outputs: Vec<ToolOutput>,
    },
    Done(AgentResponse),
}

/// One chat turn driven through [`TurnState`].
pub struct ChatTurn<'a> {
    agent: &'a Agent,
    query: &'a str,
    vars: HashMap<String, String>,
    /// Selection conversation, extended on retry.
    messages: Vec<PromptMessage>,
    records: Vec<ToolCallRecord>,
    selection_attempts: u32,
    state: TurnState,
}

impl<'a> ChatTurn<'a> {
    pub fn new(agent: &'a Agent, query: &'a str) -> Self {
        let mut vars = HashMap::new();
        vars.insert(
            "current_date".to_string(),
            agent.today().format("%Y-%m-%d (%A)").to_string(),
        );
        vars.insert("question".to_string(), query.to_string());

        let prompts = agent.prompts();
        let messages = vec![
            PromptMessage::System(prompts.render_with_custom(&prompts.selection.system, &vars)),
            PromptMessage::User(query.to_string()),
        ];

        Self {
            agent,
            query,
            vars,
            messages,
            records: Vec::new(),
            selection_attempts: 0,
            state: TurnState::Selecting { attempt: 1 },
        }
    }

    pub fn state(&self) -> &TurnState {
        &self.state
    }

    /// Run one step. A finished turn stays finished.
    pub async fn advance(mut self) -> Result<Self> {
        let state = std::mem::replace(&mut self.state, TurnState::Selecting { attempt: 0 });
        self.state = match state {
            TurnState::Selecting { attempt } => self.select(attempt).await?,
            TurnState::Synthesizing { calls, outputs } => self.synthesize(&calls, &outputs).await?,
            done @ TurnState::Done(_) => done,
        };
        Ok(self)
    }

    /// Drive the turn to completion.
    pub async fn run(self) -> Result<AgentResponse> {
        let mut turn = self;
        loop {
            if let TurnState::Done(response) = turn.state {
                return Ok(response);
            }
            turn = turn.advance().await?;
        }
    }

    fn prompts(&self) -> &'a Prompts {
        self.agent.prompts()
    }

    async fn select(&mut self, attempt: u32) -> Result<TurnState> {
        self.selection_attempts = attempt;
        let agent = self.agent;
        let reply = agent.call_model(&self.messages, &tool_specs()).await?;

        let parsed = reply
            .tool_calls
            .iter()
            .map(|call| parse_tool_call(&call.name, &call.arguments))
            .collect::<Result<Vec<_>>>();

        match parsed {
            Ok(calls) => {
                info!("Selected {} tool(s) on attempt {}", calls.len(), attempt);
                let outputs =
                    try_join_all(calls.iter().map(|call| agent.tools().execute(call))).await?;

                self.records = calls
                    .iter()
                    .zip(&outputs)
                    .map(|(call, output)| ToolCallRecord {
                        name: call.name().to_string(),
                        arguments: call.describe_arguments(),
                        rows: output.len(),
                    })
                    .collect();

                Ok(TurnState::Synthesizing { calls, outputs })
            }
            Err(ConciergeError::Validation(error)) => {
                warn!("Tool selection rejected on attempt {}: {}", attempt, error);

                if attempt >= MAX_SELECTION_ATTEMPTS {
                    return Ok(TurnState::Done(AgentResponse {
                        answer: self.prompts().selection.fallback.clone(),
                        tool_calls: Vec::new(),
                        selection_attempts: attempt,
                        fallback: true,
                    }));
                }

                let attempted = reply
                    .tool_calls
                    .iter()
                    .map(|call| format!("{}({})", call.name, call.arguments))
                    .collect::<Vec<_>>()
                    .join(", ");
                self.messages
                    .push(PromptMessage::Assistant(format!("Calling tools: {}", attempted)));

                let mut vars = self.vars.clone();
                vars.insert("error".to_string(), error);
                let prompts = self.prompts();
                let retry = prompts.render_with_custom(&prompts.selection.retry, &vars);
                self.messages.push(PromptMessage::User(retry));

                Ok(TurnState::Selecting {
                    attempt: attempt + 1,
                })
            }
            Err(other) => Err(other),
        }
    }

    async fn synthesize(
        &mut self,
        calls: &[ToolCall],
        outputs: &[ToolOutput],
    ) -> Result<TurnState> {
        let prompts = self.prompts();
        let system = prompts.render_with_custom(&prompts.synthesis.system, &self.vars);

        let user = if calls.is_empty() {
            prompts.render_with_custom(&prompts.synthesis.no_data, &self.vars)
        } else {
            let mut vars = self.vars.clone();
            let results = render_results(calls, outputs, self.agent.tools().max_rows())?;
            vars.insert("results".to_string(), results);
            prompts.render_with_custom(&prompts.synthesis.user, &vars)
        };

        let messages = [PromptMessage::System(system), PromptMessage::User(user)];
        let reply = self.agent.call_model(&messages, &[]).await?;

        let answer = reply
            .content
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ConciergeError::Llm("Model returned an empty answer".to_string()))?;

        debug!("Answered {:?} in {} chars", self.query, answer.len());

        Ok(TurnState::Done(AgentResponse {
            answer,
            tool_calls: std::mem::take(&mut self.records),
            selection_attempts: self.selection_attempts,
            fallback: false,
        }))
    }
}

/// One labelled block per tool call, in selection order.
fn render_results(calls: &[ToolCall], outputs: &[ToolOutput], max_rows: u32) -> Result<String> {
    let blocks = calls
        .iter()
        .zip(outputs)
        .map(|(call, output)| Ok(format!("### {}\n{}", call, output.to_context(max_rows)?)))
        .collect::<Result<Vec<_>>>()?;
    Ok(blocks.join("\n\n"))
}
