//! Route handlers and router assembly.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::auth::JwtManager;
use crate::decision::DecisionService;
use crate::quota::QuotaLedger;
use crate::storage::{Decision, PrivacyLevel, PublicDecision};

use super::error::ApiError;
use super::extract::AuthUser;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service: DecisionService,
    pub ledger: QuotaLedger,
    pub jwt: Arc<JwtManager>,
}

/// Assemble the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/healthz", get(healthz))
        .route("/api/decisions", post(create_decision))
        .route("/api/decisions/history", get(decision_history))
        .route("/api/decisions/public", get(public_feed))
        .route("/api/decisions/{id}/roll", post(roll_decision))
        .route("/api/decisions/{id}/outcome", post(record_outcome))
        .route("/api/decisions/{id}/privacy", post(change_privacy))
        .route("/api/quota", get(quota_status))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// =============================================================================
// Request/response bodies
// =============================================================================

#[derive(Deserialize)]
struct CreateDecisionRequest {
    text: String,
    privacy_level: String,
}

#[derive(Serialize)]
struct CreateDecisionResponse {
    decision_id: String,
    alternatives: Vec<String>,
}

#[derive(Serialize)]
struct RollResponse {
    selected_index: usize,
    selected_text: String,
}

#[derive(Deserialize)]
struct OutcomeRequest {
    implemented: bool,
}

#[derive(Deserialize)]
struct PrivacyRequest {
    privacy_level: String,
}

#[derive(Serialize)]
struct OkResponse {
    ok: bool,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Deserialize)]
struct PageParams {
    #[serde(default)]
    skip: u32,
    #[serde(default = "default_limit")]
    limit: u32,
}

const fn default_limit() -> u32 {
    20
}

#[derive(Serialize)]
struct QuotaStatusResponse {
    is_premium: bool,
    queries_used_today: u32,
    /// `null` = unbounded (premium).
    queries_remaining: Option<u32>,
    daily_limit: u32,
}

/// A decision as seen by its owner.
#[derive(Serialize)]
struct DecisionView {
    id: String,
    text: String,
    alternatives: Vec<String>,
    privacy_level: String,
    resolution_state: String,
    selected_index: Option<i64>,
    implemented: Option<bool>,
    created_at: i64,
}

impl DecisionView {
    fn from_record(record: &Decision) -> Result<Self, ApiError> {
        let alternatives = record.alternatives_vec().map_err(|e| {
            ApiError::from(crate::decision::DecisionError::Serialization(e))
        })?;
        Ok(Self {
            id: record.id.clone(),
            text: record.text.clone(),
            alternatives,
            privacy_level: record.privacy_level.clone(),
            resolution_state: record.resolution_state.clone(),
            selected_index: record.selected_index,
            implemented: record.implemented_flag(),
            created_at: record.created_at,
        })
    }
}

/// A resolved public decision as seen by anyone.
#[derive(Serialize)]
struct PublicDecisionView {
    id: String,
    username: String,
    text: String,
    selected_text: Option<String>,
    implemented: Option<bool>,
    created_at: i64,
}

impl PublicDecisionView {
    fn from_record(record: &PublicDecision) -> Result<Self, ApiError> {
        let alternatives: Vec<String> =
            serde_json::from_str(&record.alternatives).map_err(|e| {
                ApiError::from(crate::decision::DecisionError::Serialization(e))
            })?;
        #[allow(clippy::cast_sign_loss)]
        let selected_text = record
            .selected_index
            .filter(|i| *i >= 0)
            .and_then(|i| alternatives.get(i as usize).cloned());
        Ok(Self {
            id: record.id.clone(),
            username: record.username.clone(),
            text: record.text.clone(),
            selected_text,
            implemented: record.implemented.map(|v| v != 0),
            created_at: record.created_at,
        })
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok", version: env!("CARGO_PKG_VERSION") })
}

async fn create_decision(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateDecisionRequest>,
) -> Result<(StatusCode, Json<CreateDecisionResponse>), ApiError> {
    let privacy = parse_privacy(&req.privacy_level)?;

    let created = state.service.create(&user.user_id, &req.text, privacy).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateDecisionResponse {
            decision_id: created.decision_id,
            alternatives: created.alternatives,
        }),
    ))
}

async fn roll_decision(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<RollResponse>, ApiError> {
    let resolution = state.service.resolve(&id, &user.user_id).await?;
    Ok(Json(RollResponse {
        selected_index: resolution.selected_index,
        selected_text: resolution.selected_text,
    }))
}

async fn record_outcome(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<OutcomeRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    state.service.annotate_outcome(&id, &user.user_id, req.implemented).await?;
    Ok(Json(OkResponse { ok: true }))
}

async fn change_privacy(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<PrivacyRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    let privacy = parse_privacy(&req.privacy_level)?;
    state.service.set_privacy(&id, &user.user_id, privacy).await?;
    Ok(Json(OkResponse { ok: true }))
}

async fn decision_history(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<DecisionView>>, ApiError> {
    let records = state.service.list_history(&user.user_id).await?;
    let views = records
        .iter()
        .map(DecisionView::from_record)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(views))
}

async fn public_feed(
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
) -> Result<Json<Vec<PublicDecisionView>>, ApiError> {
    let records = state.service.list_public(page.skip, page.limit).await?;
    let views = records
        .iter()
        .map(PublicDecisionView::from_record)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(views))
}

async fn quota_status(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<QuotaStatusResponse>, ApiError> {
    let status = state.ledger.status(&user.user_id).await?;
    Ok(Json(QuotaStatusResponse {
        is_premium: status.is_premium,
        queries_used_today: status.queries_used_today,
        queries_remaining: status.queries_remaining,
        daily_limit: status.daily_limit,
    }))
}

fn parse_privacy(value: &str) -> Result<PrivacyLevel, ApiError> {
    PrivacyLevel::parse(value).ok_or_else(|| {
        ApiError::invalid_input(format!(
            "privacy_level must be one of public, followers, private (got {value:?})"
        ))
    })
}
