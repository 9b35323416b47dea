use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tracing::info;

use crate::extract;
use crate::publish::SponsorCard;
use crate::settings;

use super::generate::{card_request, publish_request, sponsor_get, sponsor_set, ServerError};
use super::models::{
    CardApiRequest, CardApiResponse, ErrorResponse, ExtractQuery, PublishApiRequest,
    PublishApiResponse, SponsorApiRequest,
};
use super::state::ServerState;

type ApiError = (StatusCode, Json<ErrorResponse>);

pub async fn run_server(settings: settings::Settings, addr: String) -> Result<()> {
    let state = Arc::new(ServerState { settings });
    let app = Router::new()
        .route("/health", get(health))
        .route("/card", post(card))
        .route("/extract", get(extract_meta))
        .route("/publish", post(publish_card))
        .route("/sponsor", get(sponsor_current).post(sponsor_update))
        .with_state(state)
        .layer(axum::middleware::from_fn(cors_middleware));
    info!(addr = %addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| "failed to bind server address")?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return Ok(response);
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type,authorization"),
    );
}

fn into_api_error(err: ServerError) -> ApiError {
    (err.status, Json(ErrorResponse { error: err.message }))
}

async fn card(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<CardApiRequest>,
) -> Result<Json<CardApiResponse>, ApiError> {
    card_request(state.as_ref(), payload)
        .await
        .map(Json)
        .map_err(into_api_error)
}

async fn extract_meta(
    Query(query): Query<ExtractQuery>,
) -> Result<Json<extract::PageMeta>, ApiError> {
    extract::fetch_page_meta(&query.url)
        .await
        .map(Json)
        .map_err(|err| {
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: err.to_string(),
                }),
            )
        })
}

async fn publish_card(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<PublishApiRequest>,
) -> Result<Json<PublishApiResponse>, ApiError> {
    publish_request(state.as_ref(), payload)
        .await
        .map(Json)
        .map_err(into_api_error)
}

async fn sponsor_current(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<SponsorCard>, ApiError> {
    sponsor_get(state.as_ref()).map(Json).map_err(into_api_error)
}

async fn sponsor_update(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<SponsorApiRequest>,
) -> Result<Json<SponsorCard>, ApiError> {
    sponsor_set(state.as_ref(), payload)
        .map(Json)
        .map_err(into_api_error)
}
