use anyhow::{anyhow, Context, Result};
use kuchiki::traits::*;
use serde::Serialize;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_IMAGE_BYTES: usize = 15 * 1024 * 1024;

/// Metadata scraped from an article page. Every field is best-effort.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PageMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

pub async fn fetch_page_meta(url: &str) -> Result<PageMeta> {
    let client = build_client()?;
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("failed to fetch {}", url))?;
    let status = response.status();
    if !status.is_success() {
        return Err(anyhow!("page fetch returned {} for {}", status, url));
    }
    let html = response
        .text()
        .await
        .with_context(|| "failed to read page body")?;
    Ok(parse_page_meta(&html))
}

pub async fn download_image(url: &str) -> Result<Vec<u8>> {
    let client = build_client()?;
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("failed to fetch image {}", url))?;
    let status = response.status();
    if !status.is_success() {
        return Err(anyhow!("image fetch returned {} for {}", status, url));
    }
    let bytes = response
        .bytes()
        .await
        .with_context(|| "failed to read image body")?;
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(anyhow!("image is too large ({} bytes)", bytes.len()));
    }
    let is_image = infer::get(&bytes)
        .map(|kind| kind.mime_type().starts_with("image/"))
        .unwrap_or(false);
    if !is_image {
        return Err(anyhow!("url did not return an image: {}", url));
    }
    Ok(bytes.to_vec())
}

fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .with_context(|| "failed to build http client")
}

/// og: tags win over twitter: tags, which win over plain document tags.
fn parse_page_meta(html: &str) -> PageMeta {
    let document = kuchiki::parse_html().one(html);
    let mut meta = PageMeta::default();

    if let Ok(nodes) = document.select("meta") {
        for node in nodes {
            let attrs = node.attributes.borrow();
            let key = attrs
                .get("property")
                .or_else(|| attrs.get("name"))
                .unwrap_or("");
            let content = match attrs.get("content") {
                Some(content) if !content.trim().is_empty() => content.trim().to_string(),
                _ => continue,
            };
            match key {
                "og:title" => meta.title = Some(content),
                "og:description" => meta.description = Some(content),
                "og:image" => meta.image_url = Some(content),
                "twitter:title" if meta.title.is_none() => meta.title = Some(content),
                "twitter:description" if meta.description.is_none() => {
                    meta.description = Some(content)
                }
                "twitter:image" if meta.image_url.is_none() => meta.image_url = Some(content),
                "description" if meta.description.is_none() => meta.description = Some(content),
                _ => {}
            }
        }
    }

    if meta.title.is_none() {
        if let Ok(title) = document.select_first("title") {
            let text = title.text_contents().trim().to_string();
            if !text.is_empty() {
                meta.title = Some(text);
            }
        }
    }

    meta
}
