use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::sync::Arc;
use tracing::info;

use super::models::{
    CardPayload, ChannelListResponse, ChannelPayload, ErrorResponse, MutationResponse,
    RenderApiRequest, RenderApiResponse,
};
use super::state::ServerState;
use crate::channels::{ChannelKey, FileChannelStore};
use crate::pipeline::{CardComposer, LineCard};
use crate::render::CardRenderer;
use crate::script::contains_han;
use crate::settings::Settings;

type ApiError = (StatusCode, Json<ErrorResponse>);

pub async fn run_server(settings: Settings, addr: String) -> Result<()> {
    let registry = Arc::new(
        FileChannelStore::load(&settings.channels_path).context("failed to open channel store")?,
    );
    let composer = CardComposer::new(
        CardRenderer::new(settings.render_config()),
        Arc::new(settings.translator()),
    );
    let state = Arc::new(ServerState {
        settings,
        composer,
        registry,
    });

    let app = Router::new()
        .route("/health", get(health))
        .route("/render", post(render_cards))
        .route(
            "/channels",
            get(list_channels).post(add_channel).delete(remove_channel),
        )
        .with_state(state)
        .layer(axum::middleware::from_fn(cors_middleware));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind server address {addr}"))?;
    info!("listening on {}", addr);
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
        HeaderValue::from_static("GET,POST,DELETE,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type,authorization"),
    );
}

async fn render_cards(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<RenderApiRequest>,
) -> Result<Json<RenderApiResponse>, ApiError> {
    let text = payload.text.trim().to_string();
    if text.is_empty() {
        return Err(bad_request("text is required"));
    }

    let composer = match payload.target_lang.as_deref() {
        Some(lang) if !lang.trim().is_empty() => state.composer.with_translator(Arc::new(
            state.settings.translator_for_target(Some(lang)),
        )),
        _ => state.composer.clone(),
    };

    let mut cards = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || !contains_han(line) {
            continue;
        }
        match composer.compose(line).await {
            Some(card) => cards.push(card_payload(&card)),
            None => {
                return Err(internal(format!("failed to render line: {line}")));
            }
        }
    }

    Ok(Json(RenderApiResponse { cards }))
}

fn card_payload(card: &LineCard) -> CardPayload {
    CardPayload {
        line: card.original.clone(),
        phonetic: card.phonetic.clone(),
        translation: card.translation.clone(),
        image_base64: BASE64.encode(&card.image.png),
    }
}

async fn list_channels(State(state): State<Arc<ServerState>>) -> Json<ChannelListResponse> {
    let channels = state
        .registry
        .list()
        .await
        .into_iter()
        .map(ChannelPayload::from)
        .collect();
    Json(ChannelListResponse { channels })
}

async fn add_channel(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<ChannelPayload>,
) -> Result<Json<MutationResponse>, ApiError> {
    validate_channel(&payload)?;
    let changed = state
        .registry
        .add(ChannelKey::from(payload))
        .await
        .map_err(|err| internal(err.to_string()))?;
    Ok(Json(MutationResponse { changed }))
}

async fn remove_channel(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<ChannelPayload>,
) -> Result<Json<MutationResponse>, ApiError> {
    validate_channel(&payload)?;
    let changed = state
        .registry
        .remove(&ChannelKey::from(payload))
        .await
        .map_err(|err| internal(err.to_string()))?;
    Ok(Json(MutationResponse { changed }))
}

fn validate_channel(payload: &ChannelPayload) -> Result<(), ApiError> {
    if payload.channel.trim().is_empty() {
        return Err(bad_request("channel is required"));
    }
    Ok(())
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn internal(message: impl Into<String>) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}
