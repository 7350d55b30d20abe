//! API handlers for the oracle registry

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use oracle_registry::{ConsensusStatus, EventRecord, OracleRecord, RegistryError};
use serde_json::{json, Value};
use validator::Validate;

use crate::app_state::AppState;
use crate::models::{
    parse_data_hash, parse_event_id, parse_identity, AddAdminRequest, ApiResponse, AuditQuery,
    DeregisterOracleRequest, EmergencyOverrideRequest, ListOraclesQuery, RegisterOracleRequest,
    ScheduleEventRequest, SubmitAttestationRequest, UpdateConsensusRequest,
    UpdateCooldownRequest, UpdateSignaturesRequest,
};
use crate::services::registry_service::{EventDetails, RegistrySummary};

/// Failed request: rendered as an `ApiResponse` with `success: false`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<RegistryError> for ApiError {
    fn from(error: RegistryError) -> Self {
        Self::new(status_for(&error), error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::err(self.message))).into_response()
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// HTTP status for a rejected registry call.
pub fn status_for(error: &RegistryError) -> StatusCode {
    match error {
        RegistryError::Unauthorized => StatusCode::UNAUTHORIZED,
        RegistryError::NotAuthorized => StatusCode::FORBIDDEN,
        RegistryError::NotRegistered | RegistryError::UnknownEvent => StatusCode::NOT_FOUND,
        RegistryError::AlreadyRegistered
        | RegistryError::DuplicateAttestation
        | RegistryError::DuplicateApprover
        | RegistryError::AdminAlreadyExists
        | RegistryError::RoundClosed
        | RegistryError::RoundInProgress { .. } => StatusCode::CONFLICT,
        RegistryError::AttestationTooEarly { .. } => {
            StatusCode::from_u16(425).unwrap_or(StatusCode::BAD_REQUEST)
        }
        RegistryError::OverrideCooldown { .. } => StatusCode::TOO_MANY_REQUESTS,
        RegistryError::NoQuorumPossible => StatusCode::SERVICE_UNAVAILABLE,
        RegistryError::InvalidConfig(_)
        | RegistryError::OracleLimitReached { .. }
        | RegistryError::InvalidOutcome { .. }
        | RegistryError::InsufficientApprovers { .. } => StatusCode::BAD_REQUEST,
    }
}

fn validate(request: &impl Validate) -> Result<(), ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::bad_request(format!("Validation error: {}", e)))
}

fn respond<T>(result: Result<T, RegistryError>) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(result?)))
}

pub async fn root() -> &'static str {
    "BoxMeOut Oracle Registry"
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

// ===== Registry =====

pub async fn get_registry(State(app_state): State<AppState>) -> Json<ApiResponse<RegistrySummary>> {
    Json(ApiResponse::ok(app_state.registry_service.summary().await))
}

pub async fn update_consensus(
    State(app_state): State<AppState>,
    Json(request): Json<UpdateConsensusRequest>,
) -> ApiResult<EventRecord> {
    validate(&request)?;
    let caller = request.approval.to_caller().map_err(ApiError::bad_request)?;
    respond(
        app_state
            .registry_service
            .set_required_consensus(&caller, request.required_consensus)
            .await,
    )
}

pub async fn update_signatures(
    State(app_state): State<AppState>,
    Json(request): Json<UpdateSignaturesRequest>,
) -> ApiResult<EventRecord> {
    validate(&request)?;
    let caller = request.approval.to_caller().map_err(ApiError::bad_request)?;
    respond(
        app_state
            .registry_service
            .set_required_signatures(&caller, request.required_signatures)
            .await,
    )
}

pub async fn update_cooldown(
    State(app_state): State<AppState>,
    Json(request): Json<UpdateCooldownRequest>,
) -> ApiResult<EventRecord> {
    validate(&request)?;
    let caller = request.approval.to_caller().map_err(ApiError::bad_request)?;
    respond(
        app_state
            .registry_service
            .set_override_cooldown(&caller, request.cooldown_secs)
            .await,
    )
}

pub async fn add_admin(
    State(app_state): State<AppState>,
    Json(request): Json<AddAdminRequest>,
) -> ApiResult<EventRecord> {
    validate(&request)?;
    let caller = request.approval.to_caller().map_err(ApiError::bad_request)?;
    let admin = parse_identity(&request.admin).map_err(ApiError::bad_request)?;
    respond(app_state.registry_service.add_admin_signer(&caller, admin).await)
}

// ===== Oracles =====

pub async fn register_oracle(
    State(app_state): State<AppState>,
    Json(request): Json<RegisterOracleRequest>,
) -> ApiResult<EventRecord> {
    validate(&request)?;
    let caller = request.approval.to_caller().map_err(ApiError::bad_request)?;
    let oracle = parse_identity(&request.oracle).map_err(ApiError::bad_request)?;
    respond(
        app_state
            .registry_service
            .register_oracle(&caller, oracle, &request.name)
            .await,
    )
}

pub async fn list_oracles(
    State(app_state): State<AppState>,
    Query(query): Query<ListOraclesQuery>,
) -> Json<ApiResponse<Vec<OracleRecord>>> {
    let oracles = app_state
        .registry_service
        .list_oracles(query.include_inactive.unwrap_or(false))
        .await;
    Json(ApiResponse::ok(oracles))
}

pub async fn get_oracle(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<OracleRecord> {
    let identity = parse_identity(&id).map_err(ApiError::bad_request)?;
    match app_state.registry_service.oracle(&identity).await {
        Some(record) => Ok(Json(ApiResponse::ok(record))),
        None => Err(ApiError::new(StatusCode::NOT_FOUND, "Oracle not found")),
    }
}

pub async fn deregister_oracle(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<DeregisterOracleRequest>,
) -> ApiResult<EventRecord> {
    validate(&request)?;
    let oracle = parse_identity(&id).map_err(ApiError::bad_request)?;
    let caller = request.approval.to_caller().map_err(ApiError::bad_request)?;
    respond(
        app_state
            .registry_service
            .deregister_oracle(&caller, oracle)
            .await,
    )
}

// ===== Events =====

pub async fn schedule_event(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ScheduleEventRequest>,
) -> ApiResult<EventRecord> {
    validate(&request)?;
    let event_id = parse_event_id(&id).map_err(ApiError::bad_request)?;
    let caller = request.approval.to_caller().map_err(ApiError::bad_request)?;
    respond(
        app_state
            .registry_service
            .schedule_event(&caller, event_id, request.resolution_time)
            .await,
    )
}

pub async fn submit_attestation(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SubmitAttestationRequest>,
) -> ApiResult<EventRecord> {
    validate(&request)?;
    let event_id = parse_event_id(&id).map_err(ApiError::bad_request)?;
    let data_hash = parse_data_hash(&request.data_hash).map_err(ApiError::bad_request)?;
    let caller = request.to_caller().map_err(ApiError::bad_request)?;
    respond(
        app_state
            .registry_service
            .submit_attestation(&caller, event_id, request.outcome, data_hash)
            .await,
    )
}

pub async fn get_event(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<EventDetails> {
    let event_id = parse_event_id(&id).map_err(ApiError::bad_request)?;
    match app_state.registry_service.event_details(&event_id).await {
        Some(details) => Ok(Json(ApiResponse::ok(details))),
        None => Err(RegistryError::UnknownEvent.into()),
    }
}

pub async fn check_consensus(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ConsensusStatus> {
    let event_id = parse_event_id(&id).map_err(ApiError::bad_request)?;
    respond(app_state.registry_service.check_consensus(&event_id).await)
}

pub async fn emergency_override(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<EmergencyOverrideRequest>,
) -> ApiResult<EventRecord> {
    validate(&request)?;
    let event_id = parse_event_id(&id).map_err(ApiError::bad_request)?;
    let justification_hash = parse_data_hash(&request.justification_hash).map_err(ApiError::bad_request)?;
    let approvals = request
        .approvals
        .iter()
        .map(|approval| approval.to_caller())
        .collect::<Result<Vec<_>, _>>()
        .map_err(ApiError::bad_request)?;
    respond(
        app_state
            .registry_service
            .emergency_override(&approvals, event_id, request.forced_outcome, justification_hash)
            .await,
    )
}

// ===== Audit =====

pub async fn audit_log(
    State(app_state): State<AppState>,
    Query(query): Query<AuditQuery>,
) -> Json<ApiResponse<Vec<EventRecord>>> {
    let records = app_state
        .registry_service
        .audit_since(query.since.unwrap_or(0), query.limit())
        .await;
    Json(ApiResponse::ok(records))
}
