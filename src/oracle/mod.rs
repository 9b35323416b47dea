use anyhow::{anyhow, Result};
use std::future::Future;
use std::pin::Pin;

mod claude;
mod openai;
mod suggest;

pub use claude::Claude;
pub use openai::OpenAi;
pub use suggest::{
    render_caption_prompt, render_emphasis_prompt, render_headline_prompt, render_tag_prompt,
    suggest_caption, suggest_emphasis, suggest_headline, suggest_tag,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleKind {
    OpenAi,
    Claude,
}

impl OracleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OracleKind::OpenAi => "openai",
            OracleKind::Claude => "claude",
        }
    }
}

/// Tool exposed to the oracle; the JSON schema constrains the reply shape so
/// validation happens on structured data, not free text.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct OracleResponse {
    pub args: serde_json::Value,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub enum MessageRole {
    System,
    User,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: String) -> Self {
        Self {
            role: MessageRole::System,
            content,
        }
    }

    pub fn user(content: String) -> Self {
        Self {
            role: MessageRole::User,
            content,
        }
    }
}

pub type OracleFuture = Pin<Box<dyn Future<Output = Result<OracleResponse>> + Send>>;

/// Remote text-generation collaborator. Advisory only: every response is
/// validated by the caller and every stage has a local fallback.
pub trait Oracle: Clone + Send + Sync {
    fn append_system_input(self, input: String) -> Self;
    fn append_user_input(self, input: String) -> Self;
    fn register_tool(self, tool: ToolSpec) -> Self;
    fn call_tool(self, tool_name: &str) -> OracleFuture;
}

#[derive(Debug, Clone)]
pub enum OracleImpl {
    OpenAi(OpenAi),
    Claude(Claude),
}

impl Oracle for OracleImpl {
    fn append_system_input(self, input: String) -> Self {
        match self {
            OracleImpl::OpenAi(oracle) => OracleImpl::OpenAi(oracle.append_system_input(input)),
            OracleImpl::Claude(oracle) => OracleImpl::Claude(oracle.append_system_input(input)),
        }
    }

    fn append_user_input(self, input: String) -> Self {
        match self {
            OracleImpl::OpenAi(oracle) => OracleImpl::OpenAi(oracle.append_user_input(input)),
            OracleImpl::Claude(oracle) => OracleImpl::Claude(oracle.append_user_input(input)),
        }
    }

    fn register_tool(self, tool: ToolSpec) -> Self {
        match self {
            OracleImpl::OpenAi(oracle) => OracleImpl::OpenAi(oracle.register_tool(tool)),
            OracleImpl::Claude(oracle) => OracleImpl::Claude(oracle.register_tool(tool)),
        }
    }

    fn call_tool(self, tool_name: &str) -> OracleFuture {
        match self {
            OracleImpl::OpenAi(oracle) => oracle.call_tool(tool_name),
            OracleImpl::Claude(oracle) => oracle.call_tool(tool_name),
        }
    }
}

/// Builds the configured oracle from environment keys, or `None` when no key
/// is present; the pipeline then runs purely on local heuristics.
pub fn resolve_oracle(model_setting: Option<&str>) -> Option<OracleImpl> {
    let (kind, model) = match model_setting {
        Some(value) => parse_model_setting(value).ok()?,
        None => (default_kind()?, None),
    };
    let key = resolve_key(kind)?;
    let oracle = match kind {
        OracleKind::OpenAi => {
            let mut oracle = OpenAi::new(key);
            if let Some(model) = model {
                oracle = oracle.with_model(model);
            }
            OracleImpl::OpenAi(oracle)
        }
        OracleKind::Claude => {
            let mut oracle = Claude::new(key);
            if let Some(model) = model {
                oracle = oracle.with_model(model);
            }
            OracleImpl::Claude(oracle)
        }
    };
    Some(oracle)
}

fn parse_model_setting(value: &str) -> Result<(OracleKind, Option<String>)> {
    let raw = value.trim();
    if raw.is_empty() {
        return Err(anyhow!("oracle model setting is empty"));
    }
    let (kind_part, model_part) = raw.split_once(':').unwrap_or((raw, ""));
    let kind = match kind_part.to_lowercase().as_str() {
        "openai" => OracleKind::OpenAi,
        "claude" | "anthropic" => OracleKind::Claude,
        _ => {
            return Err(anyhow!(
                "unknown oracle provider '{}'. Use openai:MODEL or claude:MODEL",
                kind_part
            ))
        }
    };
    let model = if model_part.trim().is_empty() {
        None
    } else {
        Some(model_part.trim().to_string())
    };
    Ok((kind, model))
}

fn default_kind() -> Option<OracleKind> {
    if get_env("OPENAI_API_KEY").is_some() {
        return Some(OracleKind::OpenAi);
    }
    if get_env("ANTHROPIC_API_KEY").is_some() {
        return Some(OracleKind::Claude);
    }
    None
}

fn resolve_key(kind: OracleKind) -> Option<String> {
    match kind {
        OracleKind::OpenAi => get_env("OPENAI_API_KEY"),
        OracleKind::Claude => get_env("ANTHROPIC_API_KEY"),
    }
}

fn get_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}
