// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// HTTP surface for the arena UI.
//
// Thin by design: the UI is an external collaborator and every route maps
// onto one ArenaService operation. Generation responses are SSE streams of
// joint snapshots — one event per orchestrator poll pass, so a slow lane
// still renders the fast lane's progress.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;

use crate::application::orchestrator::ClientOrigin;
use crate::application::service::{ArenaService, RoundId, ServiceError};
use crate::domain::chat::GenerationParams;
use crate::domain::conversation::RoundSnapshot;
use crate::domain::store::Vote;

/// Header a fronting proxy uses to carry the real client address.
const FORWARDED_IP_HEADER: &str = "cf-connecting-ip";

pub fn app(service: Arc<ArenaService>) -> Router {
    Router::new()
        .route("/api/rounds", post(new_round))
        .route("/api/rounds/{id}/message", post(send_message))
        .route("/api/rounds/{id}/regenerate", post(regenerate))
        .route("/api/rounds/{id}/vote", post(vote))
        .route("/api/models", get(models))
        .route("/api/examples", get(examples))
        .route("/api/leaderboard", get(leaderboard))
        .with_state(service)
}

#[derive(Deserialize)]
struct MessageRequest {
    message: String,
    #[serde(default)]
    temperature: Option<f32>,
    #[serde(default)]
    top_p: Option<f32>,
    #[serde(default)]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct RegenerateRequest {
    #[serde(default)]
    temperature: Option<f32>,
    #[serde(default)]
    top_p: Option<f32>,
    #[serde(default)]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct VoteRequest {
    vote: Vote,
}

fn params_from(temperature: Option<f32>, top_p: Option<f32>, max_tokens: Option<u32>) -> GenerationParams {
    let defaults = GenerationParams::default();
    GenerationParams {
        temperature: temperature.unwrap_or(defaults.temperature),
        top_p: top_p.unwrap_or(defaults.top_p),
        max_tokens: max_tokens.unwrap_or(defaults.max_tokens),
    }
    .clamped()
}

fn origin_from(headers: &HeaderMap, peer: SocketAddr) -> ClientOrigin {
    ClientOrigin {
        forwarded_ip: headers
            .get(FORWARDED_IP_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        peer_ip: peer.ip().to_string(),
    }
}

fn error_response(error: ServiceError) -> Response {
    let status = match error {
        ServiceError::UnknownRound(_) => StatusCode::NOT_FOUND,
        ServiceError::NothingToRegenerate(_) => StatusCode::CONFLICT,
    };
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}

fn snapshot_sse(
    snapshots: impl Stream<Item = RoundSnapshot> + Send + 'static,
) -> Response {
    let events = snapshots.map(|snapshot| {
        Ok::<_, Infallible>(
            Event::default().data(serde_json::to_string(&snapshot).unwrap_or_default()),
        )
    });
    Sse::new(events).keep_alive(KeepAlive::default()).into_response()
}

async fn new_round(State(service): State<Arc<ArenaService>>) -> impl IntoResponse {
    let round = service.new_round();
    Json(json!({ "round_id": round }))
}

async fn send_message(
    State(service): State<Arc<ArenaService>>,
    Path(round): Path<RoundId>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(request): Json<MessageRequest>,
) -> Response {
    let params = params_from(request.temperature, request.top_p, request.max_tokens);
    let origin = origin_from(&headers, peer);
    match service.send_message(round, request.message, params, origin) {
        Ok(snapshots) => snapshot_sse(snapshots),
        Err(e) => error_response(e),
    }
}

async fn regenerate(
    State(service): State<Arc<ArenaService>>,
    Path(round): Path<RoundId>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(request): Json<RegenerateRequest>,
) -> Response {
    let params = params_from(request.temperature, request.top_p, request.max_tokens);
    let origin = origin_from(&headers, peer);
    match service.regenerate(round, params, origin) {
        Ok(snapshots) => snapshot_sse(snapshots),
        Err(e) => error_response(e),
    }
}

async fn vote(
    State(service): State<Arc<ArenaService>>,
    Path(round): Path<RoundId>,
    Json(request): Json<VoteRequest>,
) -> Response {
    match service.vote(round, request.vote).await {
        Ok((left, right)) => Json(json!({ "models": [left, right] })).into_response(),
        Err(e) => error_response(e),
    }
}

async fn models(State(service): State<Arc<ArenaService>>) -> impl IntoResponse {
    Json(json!({ "models": service.model_names() }))
}

async fn examples(State(service): State<Arc<ArenaService>>) -> impl IntoResponse {
    Json(json!({ "examples": service.example_prompts() }))
}

async fn leaderboard(State(service): State<Arc<ArenaService>>) -> impl IntoResponse {
    Json(json!({ "leaderboard": service.leaderboard().await }))
}
