use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::{Message, MessageRole, Oracle, OracleFuture, OracleResponse, ToolSpec};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct Claude {
    key: String,
    model: String,
    messages: Vec<Message>,
    tools: Vec<ToolSpec>,
}

impl Claude {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            model: DEFAULT_MODEL.to_string(),
            messages: Vec::new(),
            tools: Vec::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        if !model.trim().is_empty() {
            self.model = model;
        }
        self
    }

    fn find_tool(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.iter().find(|tool| tool.name == name)
    }
}

impl Oracle for Claude {
    fn append_system_input(mut self, input: String) -> Self {
        self.messages.push(Message::system(input));
        self
    }

    fn append_user_input(mut self, input: String) -> Self {
        self.messages.push(Message::user(input));
        self
    }

    fn register_tool(mut self, tool: ToolSpec) -> Self {
        self.tools.push(tool);
        self
    }

    fn call_tool(self, tool_name: &str) -> OracleFuture {
        let tool_name = tool_name.to_string();
        Box::pin(async move {
            let tool = self
                .find_tool(&tool_name)
                .cloned()
                .ok_or_else(|| anyhow!("tool '{}' not registered", tool_name))?;
            let client = reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .map_err(|err| anyhow!("failed to build HTTP client: {}", err))?;
            let url = base_url();

            let (system_inputs, user_inputs): (Vec<Message>, Vec<Message>) = self
                .messages
                .into_iter()
                .partition(|message| matches!(message.role, MessageRole::System));

            let system = system_inputs
                .into_iter()
                .map(|message| message.content)
                .collect::<Vec<_>>()
                .join("\n\n");
            let messages = user_inputs
                .into_iter()
                .map(|message| json!({"role": "user", "content": message.content}))
                .collect::<Vec<_>>();

            let system_value = if system.trim().is_empty() {
                json!(null)
            } else {
                json!(system)
            };

            let body = json!({
                "model": self.model,
                "max_tokens": 512,
                "messages": messages,
                "system": system_value,
                "tools": [
                    {
                        "name": tool.name,
                        "description": tool.description,
                        "input_schema": tool.parameters
                    }
                ],
                "tool_choice": {"type": "tool", "name": tool.name}
            });

            let response = client
                .post(&url)
                .header("x-api-key", self.key.clone())
                .header("anthropic-version", "2023-06-01")
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            if !status.is_success() {
                return Err(anyhow!(
                    "Claude API error ({}): {}",
                    status,
                    extract_error(&text).unwrap_or(text)
                ));
            }
            extract_tool_response(&text, &tool_name, &self.model)
        })
    }
}

fn base_url() -> String {
    std::env::var("ANTHROPIC_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
}

fn extract_tool_response(
    text: &str,
    tool_name: &str,
    fallback_model: &str,
) -> Result<OracleResponse> {
    let payload: ClaudeResponse = serde_json::from_str(text)
        .map_err(|err| anyhow!("failed to parse Claude response JSON: {}", err))?;
    for block in &payload.content {
        if block.kind == "tool_use" && block.name.as_deref() == Some(tool_name) {
            let args = block
                .input
                .clone()
                .ok_or_else(|| anyhow!("Claude tool_use missing input"))?;
            let model = payload
                .model
                .filter(|value| !value.trim().is_empty())
                .or_else(|| Some(fallback_model.to_string()));
            return Ok(OracleResponse { args, model });
        }
    }
    Err(anyhow!("no tool call returned from Claude"))
}

fn extract_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<ClaudeError>,
    }

    #[derive(Deserialize)]
    struct ClaudeError {
        #[serde(rename = "type")]
        kind: Option<String>,
        message: Option<String>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let error = parsed.error?;
    match (error.message, error.kind) {
        (Some(message), Some(kind)) if !message.trim().is_empty() => {
            Some(format!("{} (type: {})", message, kind))
        }
        (Some(message), None) if !message.trim().is_empty() => Some(message),
        (_, Some(kind)) => Some(format!("type: {}", kind)),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClaudeContent {
    #[serde(rename = "type")]
    kind: String,
    name: Option<String>,
    input: Option<serde_json::Value>,
}
