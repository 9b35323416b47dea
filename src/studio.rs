use anyhow::{anyhow, Result};
use std::time::Duration;
use tracing::{debug, info};

use crate::caption::build_caption;
use crate::headline::{
    select_emphasis, shorten, EmphasisOverride, EmphasisSpan, Headline,
};
use crate::layout::{plan, Category, ImageKind, LayoutPlan};
use crate::oracle::{
    suggest_caption, suggest_emphasis, suggest_headline, suggest_tag, Oracle,
};
use crate::render::render_card;
use crate::settings::Settings;

/// One card-generation request. Everything beyond the title is optional and
/// has a deterministic default.
#[derive(Debug, Clone, Default)]
pub struct CardRequest {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub kind: Option<ImageKind>,
    pub max_chars: Option<usize>,
    pub emphasis: Option<EmphasisOverride>,
    pub tag: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CardOutcome {
    pub image: Vec<u8>,
    pub mime: String,
    pub headline: String,
    pub caption: String,
    pub plan: LayoutPlan,
}

/// Runs the pipeline: normalize, shorten, pick emphasis, plan the layout,
/// rasterize, assemble the caption. The oracle is consulted per stage and
/// every suggestion is validated; any failure falls back to the local
/// heuristics, so the output shape never depends on the oracle.
#[derive(Debug, Clone)]
pub struct CardStudio<O: Oracle> {
    oracle: Option<O>,
    settings: Settings,
}

impl<O: Oracle> CardStudio<O> {
    pub fn new(oracle: Option<O>, settings: Settings) -> Self {
        Self { oracle, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.oracle_timeout_secs)
    }

    pub async fn generate(&self, request: &CardRequest, photo: &[u8]) -> Result<CardOutcome> {
        let headline = self.resolve_headline(request).await?;
        let parsed = Headline::parse(&headline)
            .ok_or_else(|| anyhow!("headline is empty after normalization"))?;

        let span = self.resolve_emphasis(&parsed, request.emphasis.as_ref()).await;
        debug!(start = span.start, len = span.len, "emphasis span");

        let category = Category::parse(request.category.as_deref().unwrap_or(""));
        let kind = request.kind.unwrap_or(ImageKind::Card);
        let tag = self.resolve_tag(request, parsed.text()).await;
        let layout = plan(parsed.words(), span, category, kind, tag.as_deref());

        let image = render_card(&layout, photo, &self.settings)?;
        let caption = self.resolve_caption(request, parsed.text()).await;
        info!(
            headline = %parsed.text(),
            lines = layout.title_lines.len(),
            "card generated"
        );

        Ok(CardOutcome {
            image,
            mime: self.settings.output_mime.clone(),
            headline,
            caption,
            plan: layout,
        })
    }

    /// Oracle rewrite first, local shortening rules as the fallback. Both
    /// paths go through the same normalizer so the invariants hold either way.
    async fn resolve_headline(&self, request: &CardRequest) -> Result<String> {
        let normalized = Headline::parse(&request.title)
            .ok_or_else(|| anyhow!("title is empty"))?;
        let config = self.settings.shorten_config(request.max_chars);

        if normalized.text().chars().count() <= config.budget {
            return Ok(normalized.text().to_string());
        }

        if let Some(oracle) = &self.oracle {
            if let Some(suggestion) = suggest_headline(
                oracle,
                normalized.text(),
                request.description.as_deref(),
                config.budget,
                self.oracle_timeout(),
            )
            .await
            {
                // Suggestions are re-normalized; the oracle is never the
                // last writer of on-card text.
                if let Some(headline) = Headline::parse(&suggestion) {
                    return Ok(headline.text().to_string());
                }
            }
        }

        Ok(shorten(normalized.text(), &config))
    }

    /// Explicit override wins, then a validated oracle suggestion, then the
    /// deterministic scorer.
    async fn resolve_emphasis(
        &self,
        headline: &Headline,
        explicit: Option<&EmphasisOverride>,
    ) -> EmphasisSpan {
        if explicit.is_some() {
            return select_emphasis(headline.words(), explicit);
        }
        if let Some(oracle) = &self.oracle {
            if let Some(span) =
                suggest_emphasis(oracle, headline.words(), self.oracle_timeout()).await
            {
                return span;
            }
        }
        select_emphasis(headline.words(), None)
    }

    async fn resolve_tag(&self, request: &CardRequest, headline: &str) -> Option<String> {
        if let Some(tag) = request.tag.as_deref() {
            let tag = tag.trim();
            if !tag.is_empty() {
                return Some(tag.to_uppercase());
            }
        }
        // Only consult the oracle when no category was given: a known
        // category already carries its own label.
        if request.category.is_none() {
            if let Some(oracle) = &self.oracle {
                return suggest_tag(oracle, headline, self.oracle_timeout()).await;
            }
        }
        None
    }

    async fn resolve_caption(&self, request: &CardRequest, headline: &str) -> String {
        if let Some(oracle) = &self.oracle {
            if let Some(caption) = suggest_caption(
                oracle,
                headline,
                request.description.as_deref(),
                self.oracle_timeout(),
            )
            .await
            {
                return build_caption(headline, Some(&caption), &self.settings);
            }
        }
        build_caption(headline, request.description.as_deref(), &self.settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{OracleFuture, ToolSpec};

    #[derive(Clone)]
    struct SilentOracle;

    impl Oracle for SilentOracle {
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
            Box::pin(async { Err(anyhow!("offline")) })
        }
    }

    fn studio() -> CardStudio<SilentOracle> {
        CardStudio::new(Some(SilentOracle), Settings::default())
    }

    #[tokio::test]
    async fn short_titles_pass_through_untouched() {
        let request = CardRequest {
            title: "Prefeitura inaugura ponte".to_string(),
            ..CardRequest::default()
        };
        let headline = studio().resolve_headline(&request).await.unwrap();
        assert_eq!(headline, "Prefeitura inaugura ponte");
    }

    #[tokio::test]
    async fn oracle_failure_falls_back_to_local_shortening() {
        let request = CardRequest {
            title: "O governador do estado anunciou nesta quarta-feira um grande pacote \
                     de investimentos em infraestrutura"
                .to_string(),
            ..CardRequest::default()
        };
        let headline = studio().resolve_headline(&request).await.unwrap();
        assert!(headline.chars().count() <= 55);
        assert!(!headline.is_empty());
    }

    #[tokio::test]
    async fn empty_title_is_rejected() {
        let request = CardRequest {
            title: "   ".to_string(),
            ..CardRequest::default()
        };
        assert!(studio().resolve_headline(&request).await.is_err());
    }

    #[tokio::test]
    async fn explicit_emphasis_wins_over_everything() {
        let headline = Headline::parse("Pedro II inaugura nova ponte").unwrap();
        let span = studio()
            .resolve_emphasis(
                &headline,
                Some(&EmphasisOverride::Range { start: 2, end: 4 }),
            )
            .await;
        assert_eq!(span, EmphasisSpan { start: 2, len: 2 });
    }

    #[tokio::test]
    async fn explicit_tag_is_uppercased() {
        let request = CardRequest {
            title: "Manchete".to_string(),
            tag: Some("exclusivo".to_string()),
            ..CardRequest::default()
        };
        let tag = studio().resolve_tag(&request, "Manchete").await;
        assert_eq!(tag.as_deref(), Some("EXCLUSIVO"));
    }
}
