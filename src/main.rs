use std::io::{self, IsTerminal, Read};

use anyhow::{anyhow, Result};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "news-card-rust",
    version,
    about = "Typeset a news headline into a social card"
)]
struct Cli {
    /// Headline text (falls back to stdin, then to the page title from --url)
    #[arg(short = 't', long = "title")]
    title: Option<String>,

    /// Article URL to scrape for title/description/photo
    #[arg(short = 'u', long = "url")]
    url: Option<String>,

    /// Photo file (overrides the og:image from --url)
    #[arg(short = 'd', long = "image")]
    image: Option<String>,

    /// Category driving the tag color (policia, politica, esportes, ...)
    #[arg(short = 'c', long = "category")]
    category: Option<String>,

    /// Canvas kind: card (1080x1350) or story (1080x1920)
    #[arg(short = 'k', long = "kind")]
    kind: Option<String>,

    /// Output image path
    #[arg(short = 'o', long = "out")]
    out: Option<String>,

    /// Headline character budget (default from settings)
    #[arg(long = "max-chars")]
    max_chars: Option<usize>,

    /// Words to emphasize, as a literal substring of the headline
    #[arg(short = 'e', long = "emphasis")]
    emphasis: Option<String>,

    /// Words to emphasize, as word indices START:END (end exclusive)
    #[arg(long = "emphasis-range")]
    emphasis_range: Option<String>,

    /// Tag bar label (overrides the category label)
    #[arg(long = "tag")]
    tag: Option<String>,

    /// Oracle model or provider:model (e.g. openai:MODEL_ID, claude)
    #[arg(short = 'm', long = "model")]
    model: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Run the HTTP server instead of generating one card
    #[arg(long = "serve")]
    serve: bool,

    /// Server bind address
    #[arg(long = "addr", default_value = "127.0.0.1:8080")]
    addr: String,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    news_card_rust::logging::init(cli.verbose);

    if cli.serve {
        let settings_path = cli.read_settings.as_deref().map(std::path::Path::new);
        let settings = news_card_rust::settings::load_settings(settings_path)?;
        return news_card_rust::server::run_server(settings, cli.addr).await;
    }

    let title = match cli.title {
        Some(title) => Some(title),
        None if !io::stdin().is_terminal() => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            let trimmed = buffer.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        None => None,
    };

    let emphasis_range = cli
        .emphasis_range
        .as_deref()
        .map(parse_emphasis_range)
        .transpose()?;

    let output = news_card_rust::run(news_card_rust::Config {
        title,
        url: cli.url,
        image_path: cli.image,
        category: cli.category,
        kind: cli.kind,
        max_chars: cli.max_chars,
        emphasis: cli.emphasis,
        emphasis_range,
        tag: cli.tag,
        model: cli.model,
        settings_path: cli.read_settings,
    })
    .await?;

    let out_path = cli.out.unwrap_or_else(|| {
        if output.mime == "image/jpeg" {
            "card.jpg".to_string()
        } else {
            "card.png".to_string()
        }
    });
    std::fs::write(&out_path, &output.image)?;
    println!("{}", out_path);
    println!("{}", output.headline);
    if !output.caption.is_empty() {
        println!();
        println!("{}", output.caption);
    }
    Ok(())
}

/// Accepts "START:END" or "START..END", end exclusive.
fn parse_emphasis_range(value: &str) -> Result<(usize, usize)> {
    let (start, end) = value
        .split_once(':')
        .or_else(|| value.split_once(".."))
        .ok_or_else(|| anyhow!("emphasis range must look like START:END"))?;
    let start: usize = start.trim().parse()?;
    let end: usize = end.trim().parse()?;
    if end <= start {
        return Err(anyhow!("emphasis range end must be greater than start"));
    }
    Ok((start, end))
}
