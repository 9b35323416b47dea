use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tera::{Context as TeraContext, Tera};
use tracing::warn;

use super::{Oracle, OracleResponse, ToolSpec};
use crate::caption::CAPTION_MAX_CHARS;
use crate::headline::{is_banned_ending, is_nomination_participle, locate_literal, EmphasisSpan};

pub const HEADLINE_TOOL: &str = "deliver_headline";
pub const EMPHASIS_TOOL: &str = "deliver_emphasis";
pub const TAG_TOOL: &str = "deliver_tag";
pub const CAPTION_TOOL: &str = "deliver_caption";

const TAG_MAX_CHARS: usize = 18;
const EMPHASIS_MAX_WORDS: usize = 2;

fn headline_tool_spec() -> ToolSpec {
    ToolSpec {
        name: HEADLINE_TOOL.to_string(),
        description: "Return the rewritten headline.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "headline": {"type": "string"}
            },
            "required": ["headline"]
        }),
    }
}

fn emphasis_tool_spec() -> ToolSpec {
    ToolSpec {
        name: EMPHASIS_TOOL.to_string(),
        description: "Return the contiguous words to emphasize.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "words": {"type": "string"}
            },
            "required": ["words"]
        }),
    }
}

fn tag_tool_spec() -> ToolSpec {
    ToolSpec {
        name: TAG_TOOL.to_string(),
        description: "Return the short category tag.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "tag": {"type": "string"}
            },
            "required": ["tag"]
        }),
    }
}

fn caption_tool_spec() -> ToolSpec {
    ToolSpec {
        name: CAPTION_TOOL.to_string(),
        description: "Return the social media caption.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "caption": {"type": "string"}
            },
            "required": ["caption"]
        }),
    }
}

pub fn render_headline_prompt(budget: usize) -> Result<String> {
    let mut context = TeraContext::new();
    context.insert("budget", &budget);
    context.insert("tool_name", HEADLINE_TOOL);
    Tera::one_off(include_str!("prompts/headline.tera"), &context, false)
        .with_context(|| "failed to render headline prompt")
}

pub fn render_emphasis_prompt() -> Result<String> {
    let mut context = TeraContext::new();
    context.insert("min_words", &1_usize);
    context.insert("max_words", &EMPHASIS_MAX_WORDS);
    context.insert("tool_name", EMPHASIS_TOOL);
    Tera::one_off(include_str!("prompts/emphasis.tera"), &context, false)
        .with_context(|| "failed to render emphasis prompt")
}

pub fn render_tag_prompt() -> Result<String> {
    let mut context = TeraContext::new();
    context.insert("max_chars", &TAG_MAX_CHARS);
    context.insert("tool_name", TAG_TOOL);
    Tera::one_off(include_str!("prompts/tag.tera"), &context, false)
        .with_context(|| "failed to render tag prompt")
}

pub fn render_caption_prompt() -> Result<String> {
    let mut context = TeraContext::new();
    context.insert("tool_name", CAPTION_TOOL);
    Tera::one_off(include_str!("prompts/caption.tera"), &context, false)
        .with_context(|| "failed to render caption prompt")
}

/// One attempt with a hard timeout; any failure is logged and swallowed so the
/// caller drops to its local heuristic.
async fn call_stage<O: Oracle>(
    oracle: &O,
    tool: ToolSpec,
    system_prompt: String,
    user_input: String,
    timeout: Duration,
    stage: &str,
) -> Option<OracleResponse> {
    let tool_name = tool.name.clone();
    let call = oracle
        .clone()
        .register_tool(tool)
        .append_system_input(system_prompt)
        .append_user_input(user_input)
        .call_tool(&tool_name);
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(response)) => Some(response),
        Ok(Err(err)) => {
            warn!(stage, error = %err, "oracle call failed; using local fallback");
            None
        }
        Err(_) => {
            warn!(stage, "oracle call timed out; using local fallback");
            None
        }
    }
}

/// Asks the oracle for a rewritten headline under the budget. Accepted only
/// when the reply honors the same guarantees the local shortener gives.
pub async fn suggest_headline<O: Oracle>(
    oracle: &O,
    headline: &str,
    description: Option<&str>,
    budget: usize,
    timeout: Duration,
) -> Option<String> {
    #[derive(Deserialize)]
    struct Args {
        headline: String,
    }

    let prompt = match render_headline_prompt(budget) {
        Ok(prompt) => prompt,
        Err(err) => {
            warn!(error = %err, "headline prompt failed to render");
            return None;
        }
    };
    let mut user_input = format!("Manchete: {}", headline);
    if let Some(description) = description {
        if !description.trim().is_empty() {
            user_input.push_str(&format!("\nDescricao: {}", description.trim()));
        }
    }

    let response = call_stage(
        oracle,
        headline_tool_spec(),
        prompt,
        user_input,
        timeout,
        "headline",
    )
    .await?;
    let args: Args = match serde_json::from_value(response.args) {
        Ok(args) => args,
        Err(err) => {
            warn!(error = %err, "malformed headline suggestion");
            return None;
        }
    };
    validate_headline(&args.headline, budget)
}

fn validate_headline(candidate: &str, budget: usize) -> Option<String> {
    let candidate = candidate.trim();
    if candidate.is_empty() || candidate.chars().count() > budget {
        return None;
    }
    if candidate.contains("...") || candidate.contains('\u{2026}') {
        return None;
    }
    let last = candidate.split(' ').next_back()?;
    if is_banned_ending(last) || is_nomination_participle(last) {
        return None;
    }
    Some(candidate.to_string())
}

/// Asks the oracle which words to emphasize; the suggestion must exist
/// verbatim (modulo case and accents) and contiguously in the headline.
pub async fn suggest_emphasis<O: Oracle>(
    oracle: &O,
    words: &[String],
    timeout: Duration,
) -> Option<EmphasisSpan> {
    #[derive(Deserialize)]
    struct Args {
        words: String,
    }

    let prompt = match render_emphasis_prompt() {
        Ok(prompt) => prompt,
        Err(err) => {
            warn!(error = %err, "emphasis prompt failed to render");
            return None;
        }
    };
    let response = call_stage(
        oracle,
        emphasis_tool_spec(),
        prompt,
        format!("Manchete: {}", words.join(" ")),
        timeout,
        "emphasis",
    )
    .await?;
    let args: Args = match serde_json::from_value(response.args) {
        Ok(args) => args,
        Err(err) => {
            warn!(error = %err, "malformed emphasis suggestion");
            return None;
        }
    };

    let suggested = args.words.trim();
    let word_count = suggested.split_whitespace().count();
    if word_count == 0 || word_count > EMPHASIS_MAX_WORDS {
        warn!(suggested, "emphasis suggestion out of contract");
        return None;
    }
    let span = locate_literal(words, suggested);
    if span.is_none() {
        warn!(suggested, "emphasis suggestion not found in headline");
    }
    span
}

pub async fn suggest_tag<O: Oracle>(
    oracle: &O,
    headline: &str,
    timeout: Duration,
) -> Option<String> {
    #[derive(Deserialize)]
    struct Args {
        tag: String,
    }

    let prompt = match render_tag_prompt() {
        Ok(prompt) => prompt,
        Err(err) => {
            warn!(error = %err, "tag prompt failed to render");
            return None;
        }
    };
    let response = call_stage(
        oracle,
        tag_tool_spec(),
        prompt,
        format!("Manchete: {}", headline),
        timeout,
        "tag",
    )
    .await?;
    let args: Args = match serde_json::from_value(response.args) {
        Ok(args) => args,
        Err(err) => {
            warn!(error = %err, "malformed tag suggestion");
            return None;
        }
    };

    let tag = args.tag.trim().to_uppercase();
    let word_count = tag.split_whitespace().count();
    if tag.is_empty() || tag.chars().count() > TAG_MAX_CHARS || word_count > 2 {
        warn!(tag = %tag, "tag suggestion out of contract");
        return None;
    }
    Some(tag)
}

pub async fn suggest_caption<O: Oracle>(
    oracle: &O,
    headline: &str,
    description: Option<&str>,
    timeout: Duration,
) -> Option<String> {
    #[derive(Deserialize)]
    struct Args {
        caption: String,
    }

    let prompt = match render_caption_prompt() {
        Ok(prompt) => prompt,
        Err(err) => {
            warn!(error = %err, "caption prompt failed to render");
            return None;
        }
    };
    let mut user_input = format!("Manchete: {}", headline);
    if let Some(description) = description {
        if !description.trim().is_empty() {
            user_input.push_str(&format!("\nDescricao: {}", description.trim()));
        }
    }
    let response = call_stage(
        oracle,
        caption_tool_spec(),
        prompt,
        user_input,
        timeout,
        "caption",
    )
    .await?;
    let args: Args = match serde_json::from_value(response.args) {
        Ok(args) => args,
        Err(err) => {
            warn!(error = %err, "malformed caption suggestion");
            return None;
        }
    };

    let caption = args.caption.trim();
    if caption.is_empty()
        || caption.chars().count() > CAPTION_MAX_CHARS
        || caption.contains('\u{2026}')
    {
        warn!("caption suggestion out of contract");
        return None;
    }
    Some(caption.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{OracleFuture, OracleResponse};

    #[derive(Clone)]
    struct StubOracle {
        response: serde_json::Value,
    }

    impl Oracle for StubOracle {
        fn append_system_input(self, _input: String) -> Self {
            self
        }

        fn append_user_input(self, _input: String) -> Self {
            self
        }

        fn register_tool(self, _tool: ToolSpec) -> Self {
            self
        }

        fn call_tool(self, _tool_name: &str) -> OracleFuture {
            let args = self.response;
            Box::pin(async move {
                Ok(OracleResponse {
                    args,
                    model: Some("stub".to_string()),
                })
            })
        }
    }

    fn timeout() -> Duration {
        Duration::from_secs(1)
    }

    #[tokio::test]
    async fn valid_headline_suggestion_is_accepted() {
        let oracle = StubOracle {
            response: json!({"headline": "Prefeito anuncia nova obra"}),
        };
        let result = suggest_headline(&oracle, "manchete longa", None, 55, timeout()).await;
        assert_eq!(result.as_deref(), Some("Prefeito anuncia nova obra"));
    }

    #[tokio::test]
    async fn over_budget_headline_is_rejected() {
        let oracle = StubOracle {
            response: json!({"headline": "Prefeito anuncia nova obra"}),
        };
        let result = suggest_headline(&oracle, "manchete", None, 10, timeout()).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn headline_with_banned_ending_is_rejected() {
        let oracle = StubOracle {
            response: json!({"headline": "Advogado Neto foi nomeado"}),
        };
        let result = suggest_headline(&oracle, "manchete", None, 55, timeout()).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn headline_with_ellipsis_is_rejected() {
        let oracle = StubOracle {
            response: json!({"headline": "Prefeito anuncia..."}),
        };
        let result = suggest_headline(&oracle, "manchete", None, 55, timeout()).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn emphasis_must_exist_verbatim() {
        let words: Vec<String> = "Pedro II inaugura ponte"
            .split(' ')
            .map(str::to_string)
            .collect();

        let good = StubOracle {
            response: json!({"words": "pedro ii"}),
        };
        let span = suggest_emphasis(&good, &words, timeout()).await;
        assert_eq!(span, Some(EmphasisSpan { start: 0, len: 2 }));

        let absent = StubOracle {
            response: json!({"words": "nova escola"}),
        };
        assert!(suggest_emphasis(&absent, &words, timeout()).await.is_none());

        let too_long = StubOracle {
            response: json!({"words": "Pedro II inaugura ponte"}),
        };
        assert!(suggest_emphasis(&too_long, &words, timeout()).await.is_none());
    }

    #[tokio::test]
    async fn malformed_args_fall_through() {
        let oracle = StubOracle {
            response: json!({"unexpected": true}),
        };
        assert!(suggest_headline(&oracle, "m", None, 55, timeout()).await.is_none());
        assert!(suggest_tag(&oracle, "m", timeout()).await.is_none());
    }

    #[tokio::test]
    async fn tag_suggestion_is_uppercased_and_bounded() {
        let oracle = StubOracle {
            response: json!({"tag": "obras"}),
        };
        assert_eq!(
            suggest_tag(&oracle, "manchete", timeout()).await.as_deref(),
            Some("OBRAS")
        );

        let oracle = StubOracle {
            response: json!({"tag": "uma etiqueta longa demais para caber"}),
        };
        assert!(suggest_tag(&oracle, "manchete", timeout()).await.is_none());
    }
}
