use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::{Message, MessageRole, Oracle, OracleFuture, OracleResponse, ToolSpec};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct OpenAi {
    key: String,
    model: String,
    messages: Vec<Message>,
    tools: Vec<ToolSpec>,
}

impl OpenAi {
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

    fn find_tool(&self, name: &str) -> Result<&ToolSpec> {
        self.tools
            .iter()
            .find(|tool| tool.name == name)
            .ok_or_else(|| anyhow!("tool '{}' not registered", name))
    }
}

impl Oracle for OpenAi {
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
            let tool = self.find_tool(&tool_name)?.clone();
            call_chat_completions(self, tool, &tool_name).await
        })
    }
}

fn base_url() -> String {
    std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
}

/// Single attempt, no retries: suggestions are best-effort and the caller
/// falls back to local heuristics on any failure.
async fn call_chat_completions(
    oracle: OpenAi,
    tool: ToolSpec,
    tool_name: &str,
) -> Result<OracleResponse> {
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .with_context(|| "failed to build HTTP client")?;
    let url = format!("{}/chat/completions", base_url());

    let messages = oracle
        .messages
        .iter()
        .map(|message| {
            let role = match message.role {
                MessageRole::System => "system",
                MessageRole::User => "user",
            };
            json!({"role": role, "content": message.content})
        })
        .collect::<Vec<_>>();

    let body = json!({
        "model": oracle.model,
        "messages": messages,
        "tools": [
            {
                "type": "function",
                "function": {
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.parameters
                }
            }
        ],
        "tool_choice": {"type": "function", "function": {"name": tool.name}}
    });

    let response = client
        .post(&url)
        .bearer_auth(oracle.key.clone())
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(anyhow!(
            "OpenAI API error ({}): {}",
            status,
            extract_error(&text).unwrap_or(text)
        ));
    }
    extract_tool_response(&text, tool_name, &oracle.model)
}

fn extract_tool_response(
    text: &str,
    tool_name: &str,
    fallback_model: &str,
) -> Result<OracleResponse> {
    let payload: OpenAiResponse =
        serde_json::from_str(text).with_context(|| "failed to parse OpenAI response JSON")?;
    let tool_call = payload
        .choices
        .first()
        .and_then(|choice| choice.message.tool_calls.first())
        .ok_or_else(|| anyhow!("no tool call returned from OpenAI"))?;

    if tool_call.function.name != tool_name {
        return Err(anyhow!(
            "unexpected tool name '{}' from OpenAI",
            tool_call.function.name
        ));
    }

    let args: serde_json::Value = serde_json::from_str(&tool_call.function.arguments)
        .with_context(|| "failed to parse OpenAI tool arguments")?;
    let model = payload
        .model
        .filter(|value| !value.trim().is_empty())
        .or_else(|| Some(fallback_model.to_string()));
    Ok(OracleResponse { args, model })
}

fn extract_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<OpenAiError>,
    }

    #[derive(Deserialize)]
    struct OpenAiError {
        message: Option<String>,
        #[serde(rename = "type")]
        kind: Option<String>,
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
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    tool_calls: Vec<OpenAiToolCall>,
}

#[derive(Debug, Deserialize)]
struct OpenAiToolCall {
    function: OpenAiFunction,
}

#[derive(Debug, Deserialize)]
struct OpenAiFunction {
    name: String,
    arguments: String,
}

#[cfg(test)]
mod tests {
    use super::extract_tool_response;

    #[test]
    fn extracts_tool_arguments() {
        let payload = r#"{
            "model": "gpt-4o-mini",
            "choices": [{
                "message": {
                    "tool_calls": [{
                        "function": {
                            "name": "deliver_headline",
                            "arguments": "{\"headline\": \"Prefeito anuncia nova obra\"}"
                        }
                    }]
                }
            }]
        }"#;
        let response = extract_tool_response(payload, "deliver_headline", "gpt-4o-mini").unwrap();
        assert_eq!(
            response.args["headline"].as_str(),
            Some("Prefeito anuncia nova obra")
        );
        assert_eq!(response.model.as_deref(), Some("gpt-4o-mini"));
    }

    #[test]
    fn rejects_mismatched_tool_names() {
        let payload = r#"{
            "choices": [{
                "message": {
                    "tool_calls": [{
                        "function": {"name": "other_tool", "arguments": "{}"}
                    }]
                }
            }]
        }"#;
        assert!(extract_tool_response(payload, "deliver_headline", "gpt-4o-mini").is_err());
    }
}
