use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::Config;
use crate::fit::scorer::compute_qualitative_fit;
use crate::fit::QualitativeResult;
use crate::input::{parse_fit_form, parse_loan_form, ParseMode, RawFitForm, RawLoanForm};
use crate::loan::engine::LoanEligibilityEngine;
use crate::loan::whatif::simulate_whatif;
use crate::loan::{LoanField, LoanInputs, LoanResult, WhatIfResult};
use crate::policy::{PolicyPreset, PolicyTable};

#[derive(Clone)]
struct ApiState {
    policy: Arc<PolicyTable>,
    mode: ParseMode,
}

#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    ok: bool,
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn unprocessable(error: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorBody {
            ok: false,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Clone, Default, Deserialize)]
struct PolicyContextRequest {
    preset: Option<String>,
    strict: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
struct LoanRequest {
    #[serde(flatten)]
    context: PolicyContextRequest,
    #[serde(flatten)]
    form: RawLoanForm,
}

#[derive(Debug, Clone, Deserialize)]
struct FitRequest {
    #[serde(flatten)]
    context: PolicyContextRequest,
    #[serde(flatten)]
    form: RawFitForm,
}

#[derive(Debug, Clone, Deserialize)]
struct FieldChangeInput {
    field: String,
    to: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct WhatIfRequest {
    #[serde(flatten)]
    context: PolicyContextRequest,
    #[serde(flatten)]
    form: RawLoanForm,
    #[serde(default)]
    changes: Vec<FieldChangeInput>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct PolicyResponse {
    fingerprint: String,
    policy: PolicyTable,
}

#[derive(Debug, Serialize)]
struct PresetsResponse {
    active: String,
    presets: Vec<PolicyTable>,
}

#[derive(Debug, Serialize)]
struct LoanResponse {
    policy: String,
    inputs: LoanInputs,
    result: LoanResult,
}

#[derive(Debug, Serialize)]
struct FitResponse {
    policy: String,
    result: QualitativeResult,
}

#[derive(Debug, Serialize)]
struct WhatIfResponse {
    policy: String,
    result: WhatIfResult,
}

fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/presets", get(presets))
        .route("/v1/policy", get(active_policy))
        .route("/v1/loan", post(loan))
        .route("/v1/fit", post(fit))
        .route("/v1/whatif", post(whatif))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server(config: Config, bind: SocketAddr) -> Result<()> {
    let policy = config.resolve_policy()?;
    info!(policy = %policy.id, fingerprint = %policy.fingerprint(), "active policy loaded");
    let state = ApiState {
        policy: Arc::new(policy),
        mode: config.parse_mode(),
    };

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("REST API listening on http://{bind}");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health() -> Json<ApiResponse<HealthResponse>> {
    ok(HealthResponse { status: "ok" })
}

async fn presets(State(state): State<ApiState>) -> Json<ApiResponse<PresetsResponse>> {
    ok(PresetsResponse {
        active: state.policy.id.clone(),
        presets: PolicyPreset::ALL.iter().map(|p| p.table()).collect(),
    })
}

async fn active_policy(State(state): State<ApiState>) -> Json<ApiResponse<PolicyResponse>> {
    ok(PolicyResponse {
        fingerprint: state.policy.fingerprint(),
        policy: state.policy.as_ref().clone(),
    })
}

async fn loan(
    State(state): State<ApiState>,
    Json(request): Json<LoanRequest>,
) -> ApiResult<LoanResponse> {
    let (policy, mode) = resolve_context(&state, &request.context)?;
    let inputs = parse_loan_form(&request.form, mode).map_err(ApiError::unprocessable)?;
    let result = LoanEligibilityEngine::new(&policy).compute(&inputs);
    Ok(ok(LoanResponse {
        policy: policy.id.clone(),
        inputs,
        result,
    }))
}

async fn fit(
    State(state): State<ApiState>,
    Json(request): Json<FitRequest>,
) -> ApiResult<FitResponse> {
    let (policy, _) = resolve_context(&state, &request.context)?;
    let inputs = parse_fit_form(&request.form).map_err(ApiError::unprocessable)?;
    let result = compute_qualitative_fit(&inputs, &policy).map_err(ApiError::unprocessable)?;
    Ok(ok(FitResponse {
        policy: policy.id.clone(),
        result,
    }))
}

async fn whatif(
    State(state): State<ApiState>,
    Json(request): Json<WhatIfRequest>,
) -> ApiResult<WhatIfResponse> {
    let (policy, mode) = resolve_context(&state, &request.context)?;
    let inputs = parse_loan_form(&request.form, mode).map_err(ApiError::unprocessable)?;

    let changes = request
        .changes
        .iter()
        .map(|change| {
            LoanField::from_str(&change.field)
                .map(|field| (field, change.to))
                .map_err(|error| ApiError::bad_request(error.to_string()))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;
    if changes.is_empty() {
        return Err(ApiError::bad_request("at least one field change is required"));
    }

    let engine = LoanEligibilityEngine::new(&policy);
    let result = simulate_whatif(&engine, &inputs, &changes);
    Ok(ok(WhatIfResponse {
        policy: policy.id.clone(),
        result,
    }))
}

fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { ok: true, data })
}

/// A per-request preset replaces the server's policy for that request only.
fn resolve_context(
    state: &ApiState,
    context: &PolicyContextRequest,
) -> std::result::Result<(Arc<PolicyTable>, ParseMode), ApiError> {
    let policy = match context.preset.as_deref() {
        Some(raw) => {
            let preset =
                PolicyPreset::from_str(raw).map_err(|e| ApiError::bad_request(e.to_string()))?;
            Arc::new(preset.table())
        }
        None => state.policy.clone(),
    };
    let mode = context
        .strict
        .map(ParseMode::from_strict_flag)
        .unwrap_or(state.mode);
    Ok((policy, mode))
}
