use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::path::Path;

use crate::extract;
use crate::headline::EmphasisOverride;
use crate::layout::ImageKind;
use crate::oracle::resolve_oracle;
use crate::publish;
use crate::studio::{CardRequest, CardStudio};

use super::models::{
    CardApiRequest, CardApiResponse, PublishApiRequest, PublishApiResponse, SponsorApiRequest,
};
use super::state::ServerState;

#[derive(Debug)]
pub(crate) struct ServerError {
    pub(crate) status: axum::http::StatusCode,
    pub(crate) message: String,
}

impl ServerError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: axum::http::StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::internal(err.to_string())
    }
}

pub(crate) async fn card_request(
    state: &ServerState,
    request: CardApiRequest,
) -> Result<CardApiResponse, ServerError> {
    let title = request
        .title
        .as_deref()
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .ok_or_else(|| ServerError::bad_request("title is required"))?
        .to_string();

    let photo = resolve_photo(&request).await?;
    let kind = parse_kind(request.kind.as_deref())?;
    let emphasis = resolve_emphasis_override(&request);

    let card_request = CardRequest {
        title,
        description: request.description.clone(),
        category: request.category.clone(),
        kind,
        max_chars: request.max_chars,
        emphasis,
        tag: request.tag.clone(),
    };

    let model_setting = request
        .model
        .as_deref()
        .or(state.settings.oracle_model.as_deref());
    let oracle = resolve_oracle(model_setting);
    let studio = CardStudio::new(oracle, state.settings.clone());
    let outcome = studio.generate(&card_request, &photo).await?;

    Ok(CardApiResponse {
        image_base64: BASE64.encode(&outcome.image),
        mime: outcome.mime,
        headline: outcome.headline,
        caption: outcome.caption,
    })
}

async fn resolve_photo(request: &CardApiRequest) -> Result<Vec<u8>, ServerError> {
    match (request.image_base64.as_deref(), request.image_url.as_deref()) {
        (Some(_), Some(_)) => Err(ServerError::bad_request(
            "image_base64 and image_url cannot be provided together",
        )),
        (Some(encoded), None) => BASE64
            .decode(encoded.trim())
            .map_err(|err| ServerError::bad_request(format!("invalid image_base64: {}", err))),
        (None, Some(url)) => extract::download_image(url)
            .await
            .map_err(|err| ServerError::bad_request(err.to_string())),
        (None, None) => Err(ServerError::bad_request(
            "either image_base64 or image_url is required",
        )),
    }
}

fn parse_kind(value: Option<&str>) -> Result<Option<ImageKind>, ServerError> {
    match value {
        None => Ok(None),
        Some(value) => ImageKind::parse(value)
            .map(Some)
            .ok_or_else(|| ServerError::bad_request(format!("unknown image kind '{}'", value))),
    }
}

/// Index ranges take precedence over literal substrings.
fn resolve_emphasis_override(request: &CardApiRequest) -> Option<EmphasisOverride> {
    if let Some([start, end]) = request.emphasis_range {
        return Some(EmphasisOverride::Range { start, end });
    }
    request
        .emphasis
        .as_deref()
        .map(str::trim)
        .filter(|literal| !literal.is_empty())
        .map(|literal| EmphasisOverride::Literal(literal.to_string()))
}

pub(crate) async fn publish_request(
    state: &ServerState,
    request: PublishApiRequest,
) -> Result<PublishApiResponse, ServerError> {
    let image_url = request
        .image_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ServerError::bad_request("image_url is required"))?;
    let kind = parse_kind(request.kind.as_deref())?.unwrap_or(ImageKind::Card);
    let id = publish::publish_image(
        &state.settings,
        image_url,
        request.caption.as_deref(),
        kind,
    )
    .await?;
    Ok(PublishApiResponse { id })
}

pub(crate) fn sponsor_get(state: &ServerState) -> Result<publish::SponsorCard, ServerError> {
    let path = Path::new(&state.settings.sponsor_card_path);
    publish::load_sponsor_card(path)?
        .ok_or_else(|| ServerError {
            status: axum::http::StatusCode::NOT_FOUND,
            message: "no sponsor card is set".to_string(),
        })
}

pub(crate) fn sponsor_set(
    state: &ServerState,
    request: SponsorApiRequest,
) -> Result<publish::SponsorCard, ServerError> {
    let encoded = request
        .image_base64
        .as_deref()
        .ok_or_else(|| ServerError::bad_request("image_base64 is required"))?;
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|err| ServerError::bad_request(format!("invalid image_base64: {}", err)))?;
    let mime = infer::get(&bytes)
        .map(|kind| kind.mime_type())
        .filter(|mime| mime.starts_with("image/"))
        .ok_or_else(|| ServerError::bad_request("sponsor image is not a recognized image"))?;

    let card_path = Path::new(&state.settings.sponsor_card_path);
    let image_path = publish::store_sponsor_image(card_path, &bytes, mime)?;
    let card = publish::new_sponsor_card(&image_path, request.link.clone(), request.caption.clone())?;
    publish::save_sponsor_card(card_path, &card)?;
    Ok(card)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_override_wins_over_literal() {
        let request = CardApiRequest {
            emphasis: Some("Pedro II".to_string()),
            emphasis_range: Some([1, 3]),
            ..CardApiRequest::default()
        };
        match resolve_emphasis_override(&request) {
            Some(EmphasisOverride::Range { start: 1, end: 3 }) => {}
            other => panic!("unexpected override: {:?}", other),
        }
    }

    #[test]
    fn blank_literal_is_no_override() {
        let request = CardApiRequest {
            emphasis: Some("   ".to_string()),
            ..CardApiRequest::default()
        };
        assert!(resolve_emphasis_override(&request).is_none());
    }

    #[test]
    fn unknown_kind_is_a_bad_request() {
        let error = parse_kind(Some("poster")).unwrap_err();
        assert_eq!(error.status, axum::http::StatusCode::BAD_REQUEST);
    }
}
