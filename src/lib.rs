use anyhow::{anyhow, Context, Result};
use std::path::Path;

pub mod caption;
pub mod extract;
pub mod headline;
pub mod layout;
pub mod logging;
pub mod oracle;
pub mod publish;
mod render;
pub mod server;
pub mod settings;
mod studio;

pub use headline::{EmphasisOverride, EmphasisSpan, Headline};
pub use layout::{Category, ImageKind, LayoutPlan};
pub use oracle::{Oracle, OracleImpl, OracleKind};
pub use studio::{CardOutcome, CardRequest, CardStudio};

/// One CLI invocation: title plus optional knobs, resolved against settings.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub title: Option<String>,
    pub url: Option<String>,
    pub image_path: Option<String>,
    pub category: Option<String>,
    pub kind: Option<String>,
    pub max_chars: Option<usize>,
    pub emphasis: Option<String>,
    pub emphasis_range: Option<(usize, usize)>,
    pub tag: Option<String>,
    pub model: Option<String>,
    pub settings_path: Option<String>,
}

pub struct RunOutput {
    pub image: Vec<u8>,
    pub mime: String,
    pub headline: String,
    pub caption: String,
}

pub async fn run(config: Config) -> Result<RunOutput> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path)?;

    let (title, description, photo) = resolve_inputs(&config).await?;
    let title = title.ok_or_else(|| anyhow!("no title: pass --title or --url"))?;
    let photo = photo.ok_or_else(|| anyhow!("no photo: pass --image or --url"))?;

    let kind = match config.kind.as_deref() {
        Some(value) => Some(
            ImageKind::parse(value).ok_or_else(|| anyhow!("unknown image kind '{}'", value))?,
        ),
        None => None,
    };
    let emphasis = match config.emphasis_range {
        Some((start, end)) => Some(EmphasisOverride::Range { start, end }),
        None => config
            .emphasis
            .as_deref()
            .map(str::trim)
            .filter(|literal| !literal.is_empty())
            .map(|literal| EmphasisOverride::Literal(literal.to_string())),
    };

    let request = CardRequest {
        title,
        description,
        category: config.category,
        kind,
        max_chars: config.max_chars,
        emphasis,
        tag: config.tag,
    };

    let model_setting = config.model.as_deref().or(settings.oracle_model.as_deref());
    let oracle = oracle::resolve_oracle(model_setting);
    let studio = CardStudio::new(oracle, settings);
    let outcome = studio.generate(&request, &photo).await?;

    Ok(RunOutput {
        image: outcome.image,
        mime: outcome.mime,
        headline: outcome.headline,
        caption: outcome.caption,
    })
}

/// The page scrape only fills in what the caller left blank: an explicit
/// --title or --image always wins over the extracted metadata.
async fn resolve_inputs(
    config: &Config,
) -> Result<(Option<String>, Option<String>, Option<Vec<u8>>)> {
    let mut title = config.title.clone().filter(|title| !title.trim().is_empty());
    let mut description = None;
    let mut photo = match config.image_path.as_deref() {
        Some(path) => Some(
            std::fs::read(path).with_context(|| format!("failed to read image {}", path))?,
        ),
        None => None,
    };

    if let Some(url) = config.url.as_deref() {
        let meta = extract::fetch_page_meta(url).await?;
        if title.is_none() {
            title = meta.title;
        }
        description = meta.description;
        if photo.is_none() {
            let image_url = meta
                .image_url
                .ok_or_else(|| anyhow!("page has no og:image; pass --image"))?;
            photo = Some(extract::download_image(&image_url).await?);
        }
    }

    Ok((title, description, photo))
}
