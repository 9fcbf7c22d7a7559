//! OpenAI Chat Completions API client implementation.
//!
//! Works against any server that speaks the chat-completions protocol,
//! including LM Studio and Ollama running locally.
//! See: <https://platform.openai.com/docs/api-reference/chat>

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{Client, ClientError};
use crate::http::{add_extra_headers, build_http_client, with_retry, RequestBuilderExt, ResponseExt};
use crate::model::{FinishReason, Message, Response, ToolCall, Usage};
use crate::options::{ModelOptions, TransportOptions};
use crate::schema::ParameterSchema;
use crate::tools::ToolDefinition;

/// Trait for models compatible with OpenAI's Chat Completions API.
pub trait OpenAiCompatibleModel:
    Send + Sync + Default + Serialize + for<'de> Deserialize<'de> + Clone
{
    fn default_api_base() -> &'static str;
    fn default_model() -> &'static str;
}

/// Generic client for OpenAI-compatible Chat Completions APIs.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleClient<M> {
    api_key: String,
    base_url: String,
    model_options: ModelOptions<M>,
    transport_options: TransportOptions,
}

impl<M: OpenAiCompatibleModel> OpenAiCompatibleClient<M> {
    /// Create a new client.
    pub fn new(
        api_key: String,
        base_url: String,
        model_options: ModelOptions<M>,
        transport_options: TransportOptions,
    ) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model_options,
            transport_options,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    /// Handle error responses.
    fn handle_error_response(status: reqwest::StatusCode, body: &str) -> ClientError {
        let message = match serde_json::from_str::<ChatErrorResponse>(body) {
            Ok(error_resp) => match error_resp.error.error_type {
                Some(kind) => format!("{}: {}", kind, error_resp.error.message),
                None => error_resp.error.message,
            },
            Err(_) => body.to_string(),
        };
        ClientError::Remote {
            status: status.as_u16(),
            message,
        }
    }

    async fn send(&self, request_body: &ChatRequest<M>) -> Result<ChatResponse, ClientError> {
        let http_client = build_http_client(&self.transport_options)?;

        let mut req = http_client
            .post(self.endpoint())
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(CONTENT_TYPE, "application/json");

        req = add_extra_headers(req, &self.transport_options);

        let response = req.json_logged(request_body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text_logged().await?;
            return Err(Self::handle_error_response(status, &body));
        }

        response.json_logged().await
    }
}

#[async_trait]
impl<M: OpenAiCompatibleModel> Client for OpenAiCompatibleClient<M> {
    type ModelProvider = M;

    async fn request(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
    ) -> Result<Response, ClientError> {
        if self.model_options.model.is_empty() {
            return Err(ClientError::Config("Model must be specified".to_string()));
        }

        let request_body = ChatRequest::new(messages, &self.model_options, tools);
        debug!(
            "Sending {} messages to {} (model {})",
            request_body.messages.len(),
            self.endpoint(),
            request_body.model
        );

        let policy = self.transport_options.retry_policy();
        let chat_response = with_retry(policy, || self.send(&request_body)).await?;
        Ok(chat_response.into())
    }

    fn model_options(&self) -> &ModelOptions<Self::ModelProvider> {
        &self.model_options
    }

    fn transport_options(&self) -> &TransportOptions {
        &self.transport_options
    }
}

impl<M: OpenAiCompatibleModel> ChatRequest<M> {
    fn new(
        messages_in: Vec<Message>,
        model_options: &ModelOptions<M>,
        tool_defs: Vec<ToolDefinition>,
    ) -> Self {
        let messages = messages_in.into_iter().map(ChatMessage::from).collect();

        let tools = if tool_defs.is_empty() {
            None
        } else {
            Some(tool_defs.into_iter().map(ChatTool::from).collect())
        };

        ChatRequest {
            model: model_options.model.clone(),
            messages,
            temperature: model_options.temperature,
            top_p: model_options.top_p,
            max_tokens: model_options.max_tokens,
            tools,
            provider_options: model_options.provider.clone(),
        }
    }
}

impl From<ToolDefinition> for ChatTool {
    fn from(tool: ToolDefinition) -> Self {
        ChatTool {
            tool_type: "function".to_string(),
            function: ChatFunction {
                name: tool.name,
                description: Some(tool.description),
                parameters: tool.parameters,
            },
        }
    }
}

impl From<ChatTool> for ToolDefinition {
    fn from(tool: ChatTool) -> Self {
        ToolDefinition {
            name: tool.function.name,
            description: tool.function.description.unwrap_or_default(),
            parameters: tool.function.parameters,
        }
    }
}

impl From<ToolCall> for ChatToolCall {
    fn from(call: ToolCall) -> Self {
        ChatToolCall {
            id: Some(call.id),
            tool_type: Some("function".to_string()),
            function: ChatFunctionCall {
                name: call.name,
                arguments: call.arguments,
            },
        }
    }
}

impl From<ChatToolCall> for ToolCall {
    fn from(call: ChatToolCall) -> Self {
        ToolCall {
            // Some local servers omit the id; the tool reply still needs one.
            id: call
                .id
                .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().simple())),
            name: call.function.name,
            arguments: call.function.arguments,
        }
    }
}

impl From<Message> for ChatMessage {
    fn from(msg: Message) -> Self {
        match msg {
            Message::System { content } => ChatMessage::text("system", content),
            Message::User { content } => ChatMessage::text("user", content),
            Message::Assistant {
                content,
                tool_calls,
            } => ChatMessage {
                role: "assistant".to_string(),
                content,
                tool_calls: if tool_calls.is_empty() {
                    None
                } else {
                    Some(tool_calls.into_iter().map(ChatToolCall::from).collect())
                },
                tool_call_id: None,
            },
            Message::Tool {
                tool_call_id,
                content,
            } => ChatMessage {
                role: "tool".to_string(),
                content: Some(content),
                tool_calls: None,
                tool_call_id: Some(tool_call_id),
            },
        }
    }
}

impl From<ChatResponse> for Response {
    fn from(chat_resp: ChatResponse) -> Self {
        let finish = chat_resp
            .choices
            .first()
            .and_then(|c| c.finish_reason.as_deref())
            .map(FinishReason::from_wire)
            .unwrap_or_default();

        let data = chat_resp
            .choices
            .into_iter()
            .map(|choice| choice.message.into_assistant())
            .collect();

        Response {
            data,
            usage: chat_resp.usage.map(|u| Usage {
                prompt_tokens: Some(u.prompt_tokens),
                completion_tokens: Some(u.completion_tokens),
            }),
            finish,
        }
    }
}

// --- Chat Completions API Types ---

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
struct ChatRequest<M> {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: Option<f32>,
    top_p: Option<f32>,
    max_tokens: Option<u32>,
    tools: Option<Vec<ChatTool>>,
    #[serde(flatten)]
    provider_options: M,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: Option<String>,
    tool_calls: Option<Vec<ChatToolCall>>,
    tool_call_id: Option<String>,
}

impl ChatMessage {
    fn text(role: &str, content: String) -> Self {
        ChatMessage {
            role: role.to_string(),
            content: Some(content),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Choices always come from the model, whatever role the server reports.
    fn into_assistant(self) -> Message {
        Message::Assistant {
            content: self.content.filter(|c| !c.is_empty()),
            tool_calls: self
                .tool_calls
                .unwrap_or_default()
                .into_iter()
                .map(ToolCall::from)
                .collect(),
        }
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatToolCall {
    id: Option<String>,
    #[serde(rename = "type")]
    tool_type: Option<String>,
    function: ChatFunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: ChatFunction,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatFunction {
    name: String,
    description: Option<String>,
    parameters: ParameterSchema,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatErrorResponse {
    error: ChatError,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatError {
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receipt::ReceiptTool;
    use crate::tools::{ToolRegistry, ToolService};
    use serde_json::json;

    fn receipt_definition() -> ToolDefinition {
        ToolRegistry::new()
            .register(ReceiptTool)
            .unwrap()
            .list_tools()
            .remove(0)
    }

    #[test]
    fn tool_definition_round_trips_through_wire_format() {
        let original = receipt_definition();
        let wire = serde_json::to_value(ChatTool::from(original.clone())).unwrap();

        assert_eq!(wire["type"], "function");
        assert_eq!(wire["function"]["name"], "generate_receipt");
        assert_eq!(wire["function"]["parameters"]["additionalProperties"], false);

        let parsed: ChatTool = serde_json::from_value(wire).unwrap();
        let parsed = ToolDefinition::from(parsed);
        assert_eq!(parsed.name, original.name);
        assert_eq!(parsed.description, original.description);
        assert_eq!(parsed.parameters.required(), original.parameters.required());
    }

    #[test]
    fn tool_call_serializes_with_function_envelope() {
        let call = ToolCall {
            id: "call_abc".into(),
            name: "generate_receipt".into(),
            arguments: r#"{"order_id":"1017"}"#.into(),
        };
        let wire = serde_json::to_value(ChatToolCall::from(call)).unwrap();
        assert_eq!(
            wire,
            json!({
                "id": "call_abc",
                "type": "function",
                "function": {"name": "generate_receipt", "arguments": "{\"order_id\":\"1017\"}"}
            })
        );
    }

    #[test]
    fn assistant_tool_call_message_omits_content() {
        let msg = Message::assistant_tool_calls(vec![ToolCall {
            id: "call_1".into(),
            name: "generate_receipt".into(),
            arguments: "{}".into(),
        }]);
        let wire = serde_json::to_value(ChatMessage::from(msg)).unwrap();

        assert_eq!(wire["role"], "assistant");
        assert!(wire.get("content").is_none());
        assert_eq!(wire["tool_calls"][0]["id"], "call_1");
    }

    #[test]
    fn tool_message_carries_call_id() {
        let wire = serde_json::to_value(ChatMessage::from(Message::tool("call_1", "{}"))).unwrap();
        assert_eq!(wire, json!({"role": "tool", "content": "{}", "tool_call_id": "call_1"}));
    }

    #[test]
    fn response_with_tool_calls_converts() {
        let body = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_9",
                        "type": "function",
                        "function": {"name": "generate_receipt", "arguments": "{\"order_id\":\"1017\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        });
        let response: Response = serde_json::from_value::<ChatResponse>(body).unwrap().into();

        assert_eq!(response.finish, FinishReason::ToolCalls);
        assert_eq!(response.usage.unwrap().prompt_tokens, Some(12));
        let calls = response.data[0].tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_9");
        assert_eq!(calls[0].arguments, r#"{"order_id":"1017"}"#);
        assert_eq!(response.data[0].content(), None);
    }

    #[test]
    fn missing_tool_call_id_is_generated() {
        let call: ChatToolCall = serde_json::from_value(json!({
            "function": {"name": "generate_receipt", "arguments": "{}"}
        }))
        .unwrap();
        let call = ToolCall::from(call);
        assert!(call.id.starts_with("call_"));
        assert!(call.id.len() > "call_".len());
    }

    #[test]
    fn error_envelope_becomes_remote_error() {
        let err = OpenAiCompatibleClient::<crate::providers::LmStudioModel>::handle_error_response(
            reqwest::StatusCode::NOT_FOUND,
            r#"{"error":{"type":"invalid_request_error","message":"model not loaded"}}"#,
        );
        match err {
            ClientError::Remote { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "invalid_request_error: model not loaded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
