use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(crate) struct CardApiRequest {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) image_base64: Option<String>,
    pub(crate) image_url: Option<String>,
    pub(crate) category: Option<String>,
    pub(crate) kind: Option<String>,
    pub(crate) max_chars: Option<usize>,
    pub(crate) emphasis: Option<String>,
    pub(crate) emphasis_range: Option<[usize; 2]>,
    pub(crate) tag: Option<String>,
    pub(crate) model: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CardApiResponse {
    pub(crate) image_base64: String,
    pub(crate) mime: String,
    pub(crate) headline: String,
    pub(crate) caption: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExtractQuery {
    pub(crate) url: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(crate) struct PublishApiRequest {
    pub(crate) image_url: Option<String>,
    pub(crate) caption: Option<String>,
    pub(crate) kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PublishApiResponse {
    pub(crate) id: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(crate) struct SponsorApiRequest {
    pub(crate) image_base64: Option<String>,
    pub(crate) link: Option<String>,
    pub(crate) caption: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}
