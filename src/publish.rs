use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::info;

use crate::layout::ImageKind;
use crate::settings::Settings;

const PUBLISH_TIMEOUT: Duration = Duration::from_secs(15);

pub const TOKEN_ENV: &str = "GRAPH_API_TOKEN";
pub const PAGE_ID_ENV: &str = "GRAPH_PAGE_ID";

/// The single sponsor card the publisher keeps between runs. Stored as JSON
/// next to the sponsor image itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SponsorCard {
    pub image_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub saved_at: String,
}

pub fn load_sponsor_card(path: &Path) -> Result<Option<SponsorCard>> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err).with_context(|| format!("failed to read {}", path.display())),
    };
    let card = serde_json::from_str(&data)
        .with_context(|| format!("sponsor card file is corrupt: {}", path.display()))?;
    Ok(Some(card))
}

/// Replaces the sponsor card atomically so concurrent readers never observe a
/// half-written file.
pub fn save_sponsor_card(path: &Path, card: &SponsorCard) -> Result<()> {
    let dir = path.parent().filter(|dir| !dir.as_os_str().is_empty());
    let dir = match dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            dir.to_path_buf()
        }
        None => PathBuf::from("."),
    };
    let mut file = tempfile::Builder::new()
        .prefix("sponsor-card-")
        .suffix(".json")
        .tempfile_in(&dir)
        .with_context(|| "failed to create temp file")?;
    let json = serde_json::to_string_pretty(card)?;
    file.write_all(json.as_bytes())
        .with_context(|| "failed to write sponsor card")?;
    file.persist(path)
        .with_context(|| format!("failed to persist {}", path.display()))?;
    Ok(())
}

/// Writes the sponsor image next to the card file, named by content digest so
/// a re-upload of the same bytes lands on the same path.
pub fn store_sponsor_image(card_path: &Path, bytes: &[u8], mime: &str) -> Result<PathBuf> {
    let extension = match mime {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        other => return Err(anyhow!("unsupported sponsor image mime '{}'", other)),
    };
    let digest = format!("{:x}", md5::compute(bytes));
    let dir = card_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let target = dir.join(format!("sponsor-{}.{}", digest, extension));
    let mut file = tempfile::Builder::new()
        .prefix("sponsor-image-")
        .tempfile_in(&dir)
        .with_context(|| "failed to create temp file")?;
    file.write_all(bytes)
        .with_context(|| "failed to write sponsor image")?;
    file.persist(&target)
        .with_context(|| format!("failed to persist {}", target.display()))?;
    Ok(target)
}

pub fn new_sponsor_card(
    image_path: &Path,
    link: Option<String>,
    caption: Option<String>,
) -> Result<SponsorCard> {
    let saved_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .with_context(|| "failed to format timestamp")?;
    Ok(SponsorCard {
        image_path: image_path.to_string_lossy().into_owned(),
        link,
        caption,
        saved_at,
    })
}

#[derive(Debug, Deserialize)]
struct GraphObjectResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GraphErrorResponse {
    error: Option<GraphErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GraphErrorDetail {
    message: String,
}

fn credentials() -> Result<(String, String)> {
    let token = std::env::var(TOKEN_ENV)
        .map_err(|_| anyhow!("{} is not set", TOKEN_ENV))?;
    let page_id = std::env::var(PAGE_ID_ENV)
        .map_err(|_| anyhow!("{} is not set", PAGE_ID_ENV))?;
    Ok((token, page_id))
}

/// Publishes a hosted image to the page feed or to stories. One attempt,
/// no retries; failures surface to the caller as-is.
pub async fn publish_image(
    settings: &Settings,
    image_url: &str,
    caption: Option<&str>,
    kind: ImageKind,
) -> Result<String> {
    let (token, page_id) = credentials()?;
    let client = reqwest::Client::builder()
        .timeout(PUBLISH_TIMEOUT)
        .build()
        .with_context(|| "failed to build http client")?;

    match kind {
        ImageKind::Card => {
            let mut params = vec![
                ("url", image_url.to_string()),
                ("access_token", token.clone()),
            ];
            if let Some(caption) = caption {
                params.push(("caption", caption.to_string()));
            }
            let url = format!("{}/{}/photos", settings.graph_api_base, page_id);
            let id = graph_post(&client, &url, &params).await?;
            info!(post_id = %id, "published feed photo");
            Ok(id)
        }
        ImageKind::Story => {
            // Stories take two calls: upload the photo unpublished, then
            // promote it to a story.
            let upload_url = format!("{}/{}/photos", settings.graph_api_base, page_id);
            let photo_id = graph_post(
                &client,
                &upload_url,
                &[
                    ("url", image_url.to_string()),
                    ("published", "false".to_string()),
                    ("access_token", token.clone()),
                ],
            )
            .await?;
            let story_url = format!("{}/{}/photo_stories", settings.graph_api_base, page_id);
            let id = graph_post(
                &client,
                &story_url,
                &[("photo_id", photo_id), ("access_token", token)],
            )
            .await?;
            info!(story_id = %id, "published story");
            Ok(id)
        }
    }
}

async fn graph_post(
    client: &reqwest::Client,
    url: &str,
    params: &[(&str, String)],
) -> Result<String> {
    let response = client
        .post(url)
        .form(params)
        .send()
        .await
        .with_context(|| "graph api request failed")?;
    let status = response.status();
    let body = response
        .text()
        .await
        .with_context(|| "failed to read graph api response")?;
    if !status.is_success() {
        let message = serde_json::from_str::<GraphErrorResponse>(&body)
            .ok()
            .and_then(|parsed| parsed.error)
            .map(|detail| detail.message)
            .unwrap_or(body);
        return Err(anyhow!("graph api returned {}: {}", status, message));
    }
    let parsed: GraphObjectResponse =
        serde_json::from_str(&body).with_context(|| "unexpected graph api response shape")?;
    Ok(parsed.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sponsor_card_round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sponsor_card.json");
        let card = new_sponsor_card(
            &dir.path().join("sponsor-abc.png"),
            Some("https://example.com".to_string()),
            Some("Oferecimento".to_string()),
        )
        .unwrap();
        save_sponsor_card(&path, &card).unwrap();
        let loaded = load_sponsor_card(&path).unwrap().unwrap();
        assert_eq!(loaded, card);
    }

    #[test]
    fn missing_card_file_is_none() {
        let dir = tempdir().unwrap();
        let loaded = load_sponsor_card(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn corrupt_card_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sponsor_card.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_sponsor_card(&path).is_err());
    }

    #[test]
    fn sponsor_image_path_is_content_addressed() {
        let dir = tempdir().unwrap();
        let card_path = dir.path().join("sponsor_card.json");
        let first = store_sponsor_image(&card_path, b"payload", "image/png").unwrap();
        let second = store_sponsor_image(&card_path, b"payload", "image/png").unwrap();
        assert_eq!(first, second);
        assert_eq!(std::fs::read(&first).unwrap(), b"payload");

        let other = store_sponsor_image(&card_path, b"different", "image/png").unwrap();
        assert_ne!(first, other);
    }

    #[test]
    fn unknown_sponsor_image_mime_is_rejected() {
        let dir = tempdir().unwrap();
        let card_path = dir.path().join("sponsor_card.json");
        assert!(store_sponsor_image(&card_path, b"x", "image/gif").is_err());
    }
}
