//! Single round-trip tool-call orchestration.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::{Client, ClientError};
use crate::model::{Message, Usage};
use crate::receipt::SYSTEM_PROMPT;
use crate::tools::{ToolDefinition, ToolError, ToolService};

/// Errors that end an orchestration run.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// Steps of a run. Transitions only move forward; `Done` and `Failed` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Requesting,
    Dispatching,
    Finalizing,
    Done,
    Failed,
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The model's final natural-language answer.
    pub answer: String,
    /// Every message of the run, ending with the model's answer.
    pub conversation: Vec<Message>,
    /// Output of the local tool, if one was called.
    pub tool_result: Option<Value>,
    /// Token usage summed over both requests; `None` if the server reported none.
    pub usage: Option<Usage>,
}

/// Drives one tool-calling exchange with the model.
///
/// 1. Sends the conversation together with the tool definitions
/// 2. Executes the first requested tool call locally
/// 3. Appends the call and its result to the conversation
/// 4. Asks the model again, without tools, for the final answer
///
/// If the model answers directly in step 1, that answer is returned and no
/// tool runs.
///
/// # Example
/// ```no_run
/// use toolcall::providers::LmStudio;
/// use toolcall::receipt::ReceiptTool;
/// use toolcall::tools::ToolRegistry;
/// use toolcall::Orchestrator;
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let tools = ToolRegistry::new().register(ReceiptTool)?;
/// let orchestrator = Orchestrator::new(LmStudio::from_env()?, tools);
/// let outcome = orchestrator
///     .run("Please give me a receipt for order number 1017.")
///     .await?;
/// println!("{}", outcome.answer);
/// # Ok(())
/// # }
/// ```
pub struct Orchestrator<C: Client, S: ToolService> {
    client: C,
    tools: S,
    system_prompt: Option<String>,
    require_tool_call: bool,
}

impl<C: Client, S: ToolService> Orchestrator<C, S> {
    pub fn new(client: C, tools: S) -> Self {
        Self {
            client,
            tools,
            system_prompt: None,
            require_tool_call: false,
        }
    }

    /// System prompt for `run`. Defaults to the client's `ModelOptions::system`,
    /// then to [`receipt::SYSTEM_PROMPT`](crate::receipt::SYSTEM_PROMPT).
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Fail with `MalformedResponse` when the model answers without calling a tool.
    pub fn require_tool_call(mut self, required: bool) -> Self {
        self.require_tool_call = required;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn tools(&self) -> &S {
        &self.tools
    }

    /// Start a run from a single user prompt.
    pub async fn run(&self, user_prompt: impl Into<String>) -> Result<RunOutcome, AgentError> {
        let system = self
            .system_prompt
            .clone()
            .or_else(|| self.client.model_options().system.clone())
            .unwrap_or_else(|| SYSTEM_PROMPT.to_string());

        let conversation = vec![Message::system(system), Message::user(user_prompt)];
        self.run_conversation(conversation).await
    }

    /// Start a run from a conversation the caller already built.
    pub async fn run_conversation(
        &self,
        conversation: Vec<Message>,
    ) -> Result<RunOutcome, AgentError> {
        enter(RunState::Init);
        let result = self.drive(conversation).await;
        match &result {
            Ok(_) => enter(RunState::Done),
            Err(e) => {
                enter(RunState::Failed);
                warn!("Tool-call run failed: {}", e);
            }
        }
        result
    }

    async fn drive(&self, mut conversation: Vec<Message>) -> Result<RunOutcome, AgentError> {
        enter(RunState::Requesting);
        let definitions = self.tools.list_tools();
        debug!(
            "Requesting completion with {} messages and {} tools",
            conversation.len(),
            definitions.len()
        );
        let mut usage = None;
        let reply = self.ask(&conversation, definitions, &mut usage).await?;

        let Some(call) = reply.tool_calls().first().cloned() else {
            if self.require_tool_call {
                return Err(ClientError::MalformedResponse(
                    "expected a tool call, got a plain answer".to_string(),
                )
                .into());
            }
            debug!("No tool call requested, answering directly");
            let answer = answer_text(&reply)?;
            conversation.push(reply);
            return Ok(RunOutcome {
                answer,
                conversation,
                tool_result: None,
                usage,
            });
        };

        enter(RunState::Dispatching);
        let requested = reply.tool_calls().len();
        if requested > 1 {
            warn!(
                "Model requested {} tool calls; only `{}` will be executed",
                requested, call.name
            );
        }

        info!("Tool call requested: {}", call.name);
        debug!("Tool arguments: {}", call.arguments);
        let result = self.tools.call_tool(&call.name, &call.arguments).await?;
        info!("Tool {} executed successfully", call.name);
        debug!("Tool result: {}", result);

        let content = serde_json::to_string(&result)
            .map_err(|e| ToolError::Execution(e.to_string()))?;
        let tool_call_id = call.id.clone();
        conversation.push(Message::assistant_tool_calls(vec![call]));
        conversation.push(Message::tool(tool_call_id, content));

        enter(RunState::Finalizing);
        let final_reply = self.ask(&conversation, Vec::new(), &mut usage).await?;
        let answer = answer_text(&final_reply)?;
        conversation.push(final_reply);

        Ok(RunOutcome {
            answer,
            conversation,
            tool_result: Some(result),
            usage,
        })
    }

    /// One completion request; returns the first choice and adds the
    /// reported usage to `total`.
    async fn ask(
        &self,
        conversation: &[Message],
        tools: Vec<ToolDefinition>,
        total: &mut Option<Usage>,
    ) -> Result<Message, ClientError> {
        let response = self.client.request(conversation.to_vec(), tools).await?;
        if let Some(usage) = response.usage {
            debug!("Request usage: {:?}", usage);
            *total.get_or_insert_with(Usage::default) += usage;
        }
        response.data.into_iter().next().ok_or_else(|| {
            ClientError::MalformedResponse("response contained no choices".to_string())
        })
    }
}

fn enter(state: RunState) {
    info!("Run state: {:?}", state);
}

fn answer_text(reply: &Message) -> Result<String, ClientError> {
    reply
        .content()
        .map(str::to_string)
        .ok_or_else(|| ClientError::MalformedResponse("assistant reply had no content".to_string()))
}
