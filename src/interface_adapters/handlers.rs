// HTTP handlers: thin translations from requests onto registry
// operations, plus the error-to-status mapping.

use crate::domain::progression;
use crate::interface_adapters::protocol::{
    ArenaSummary, DeathRequest, ErrorResponse, JoinRandomRequest, JoinRequest, JoinResponse,
    PlayerRequest, PositionRequest, SetupAdvanceRequest, SetupPositionRequest, SetupStartRequest,
    SetupStepResponse, StatsResponse,
};
use crate::interface_adapters::state::AppState;
use crate::use_cases::setup::SetupError;
use crate::use_cases::EngineError;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use uuid::Uuid;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn engine_error(error: EngineError) -> ApiError {
    let (status, message) = match error {
        EngineError::ArenaNotFound { arena } => {
            (StatusCode::NOT_FOUND, format!("arena '{arena}' not found"))
        }
        EngineError::ArenaInvalid { problems } => (
            StatusCode::CONFLICT,
            format!("arena is not playable: {}", problems.join("; ")),
        ),
        EngineError::ArenaFull => (StatusCode::CONFLICT, "arena is full".to_string()),
        EngineError::AlreadyInMatch => {
            (StatusCode::CONFLICT, "player is already in a match".to_string())
        }
        EngineError::NotInMatch => (StatusCode::NOT_FOUND, "player is not in a match".to_string()),
        EngineError::MatchInProgress => (
            StatusCode::CONFLICT,
            "match already in progress, try another arena".to_string(),
        ),
        EngineError::InvalidTransition => (
            StatusCode::CONFLICT,
            "operation is not valid in the current match state".to_string(),
        ),
    };
    (status, Json(ErrorResponse { message }))
}

fn setup_error(error: SetupError) -> ApiError {
    let (status, message) = match error {
        SetupError::ArenaExists { arena } => (
            StatusCode::CONFLICT,
            format!("arena '{arena}' already exists"),
        ),
        SetupError::NotInSetup => (
            StatusCode::NOT_FOUND,
            "no setup session for this admin".to_string(),
        ),
        SetupError::StepIncomplete { step } => {
            (StatusCode::CONFLICT, format!("step not complete: {step}"))
        }
        SetupError::Invalid { problems } => (
            StatusCode::CONFLICT,
            format!("arena is not valid: {}", problems.join("; ")),
        ),
        SetupError::Storage { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
    };
    (status, Json(ErrorResponse { message }))
}

pub async fn join(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, ApiError> {
    if request.display_name.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                message: "display_name is required".to_string(),
            }),
        ));
    }

    let team = state
        .registry
        .join(&request.arena, request.player_id, request.display_name.trim())
        .await
        .map_err(engine_error)?;
    Ok(Json(JoinResponse {
        arena: request.arena,
        team,
    }))
}

pub async fn join_random(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JoinRandomRequest>,
) -> Result<Json<JoinResponse>, ApiError> {
    let (arena, team) = state
        .registry
        .join_random(request.player_id, request.display_name.trim())
        .await
        .map_err(engine_error)?;
    Ok(Json(JoinResponse { arena, team }))
}

pub async fn leave(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PlayerRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .registry
        .leave(request.player_id)
        .await
        .map_err(engine_error)?;
    Ok(StatusCode::OK)
}

// Movement and interaction reports are fire-and-forget: unknown players
// simply produce no transition.
pub async fn position(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PositionRequest>,
) -> StatusCode {
    state
        .registry
        .position_update(request.player_id, request.position)
        .await;
    StatusCode::ACCEPTED
}

pub async fn interact(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PositionRequest>,
) -> StatusCode {
    state
        .registry
        .interact(request.player_id, request.position)
        .await;
    StatusCode::ACCEPTED
}

pub async fn drop_flag(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PlayerRequest>,
) -> StatusCode {
    state.registry.drop_flag(request.player_id).await;
    StatusCode::ACCEPTED
}

pub async fn death(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DeathRequest>,
) -> StatusCode {
    state
        .registry
        .report_death(request.player_id, request.killer_id)
        .await;
    StatusCode::ACCEPTED
}

pub async fn attack(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PlayerRequest>,
) -> StatusCode {
    state.registry.report_attack(request.player_id).await;
    StatusCode::ACCEPTED
}

pub async fn list_arenas(State(state): State<Arc<AppState>>) -> Json<Vec<ArenaSummary>> {
    let mut summaries = Vec::new();
    for arena in state.registry.arenas().await {
        let snapshot = state.registry.snapshot(&arena.name).await;
        summaries.push(ArenaSummary::from_parts(
            arena.name.clone(),
            arena.display_name.clone(),
            arena.enabled,
            arena.is_valid(),
            arena.max_players,
            snapshot.as_ref(),
        ));
    }
    Json(summaries)
}

pub async fn force_start(
    State(state): State<Arc<AppState>>,
    Path(arena): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .registry
        .force_start(&arena)
        .await
        .map_err(engine_error)?;
    Ok(StatusCode::OK)
}

pub async fn force_end(
    State(state): State<Arc<AppState>>,
    Path(arena): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .registry
        .force_end(&arena)
        .await
        .map_err(engine_error)?;
    Ok(StatusCode::OK)
}

pub async fn enable(
    State(state): State<Arc<AppState>>,
    Path(arena): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .registry
        .set_enabled(&arena, true)
        .await
        .map_err(engine_error)?;
    Ok(StatusCode::OK)
}

pub async fn disable(
    State(state): State<Arc<AppState>>,
    Path(arena): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .registry
        .set_enabled(&arena, false)
        .await
        .map_err(engine_error)?;
    Ok(StatusCode::OK)
}

pub async fn player_stats(
    State(state): State<Arc<AppState>>,
    Path(player): Path<Uuid>,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.store.load_player_stats(player).await.map_err(|message| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse { message }),
        )
    })?;
    Ok(Json(StatsResponse {
        level: progression::level_for(stats.experience),
        stats,
    }))
}

pub async fn setup_start(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetupStartRequest>,
) -> Result<Json<SetupStepResponse>, ApiError> {
    let step = state
        .registry
        .start_setup(request.admin_id, &request.arena, &request.world)
        .await
        .map_err(setup_error)?;
    Ok(Json(SetupStepResponse {
        next_step: Some(step.describe().to_string()),
    }))
}

pub async fn setup_position(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetupPositionRequest>,
) -> Result<Json<SetupStepResponse>, ApiError> {
    let step = state
        .registry
        .setup_position(request.admin_id, request.position)
        .await
        .map_err(setup_error)?;
    Ok(Json(SetupStepResponse {
        next_step: Some(step.describe().to_string()),
    }))
}

pub async fn setup_advance(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetupAdvanceRequest>,
) -> Result<Json<SetupStepResponse>, ApiError> {
    let step = state
        .registry
        .setup_advance(request.admin_id)
        .await
        .map_err(setup_error)?;
    Ok(Json(SetupStepResponse {
        next_step: step.map(|s| s.describe().to_string()),
    }))
}

pub async fn setup_cancel(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetupAdvanceRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .registry
        .cancel_setup(request.admin_id)
        .await
        .map_err(setup_error)?;
    Ok(StatusCode::OK)
}
