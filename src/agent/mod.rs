//! Tool-calling agent for campus questions.
//!
//! Each query runs one [`ChatTurn`]: the model selects data tools, the
//! tools query the campus store, and a second model call phrases the
//! answer from the rows.

mod model;
mod runner;
mod tools;
mod workflow;

pub use model::{ChatModel, ModelReply, OpenAIChatModel, PromptMessage, RequestedToolCall, ToolSpec};
pub use runner::{Agent, AgentResponse, ToolCallRecord};
pub use tools::{parse_tool_call, tool_specs, ToolCall, ToolContext, ToolOutput};
pub use workflow::{ChatTurn, TurnState, MAX_SELECTION_ATTEMPTS};

#[cfg(test)]
pub(crate) use model::testing;
