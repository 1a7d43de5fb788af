use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::PlayerService,
    types::{PlayerRegisterRequest, PlayerResponse, PlayerUpdateRequest},
};
use crate::auth::AuthClaims;
use crate::shared::{AppError, AppState};

fn player_service(state: &AppState) -> PlayerService {
    PlayerService::new(
        Arc::clone(&state.player_repository),
        Arc::clone(&state.user_repository),
        Arc::clone(&state.clock),
    )
}

/// HTTP handler for player registration
///
/// POST /api/players
/// Creates the account and the player profile, returns the profile
#[instrument(name = "register_player", skip(state, request))]
pub async fn register_player(
    State(state): State<AppState>,
    Json(request): Json<PlayerRegisterRequest>,
) -> Result<Json<PlayerResponse>, AppError> {
    info!(username = %request.username, "Registering new player");

    let service = player_service(&state);
    let response = service.register(request).await?;

    info!(player_id = %response.id, "Player registered");

    Ok(Json(response))
}

/// HTTP handler for listing all players
///
/// GET /api/players
#[instrument(name = "list_players", skip(state))]
pub async fn list_players(
    State(state): State<AppState>,
) -> Result<Json<Vec<PlayerResponse>>, AppError> {
    let service = player_service(&state);
    let players = service.list_players().await?;

    Ok(Json(players))
}

/// HTTP handler for fetching one player
///
/// GET /api/players/:id
#[instrument(name = "get_player", skip(state))]
pub async fn get_player(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> Result<Json<PlayerResponse>, AppError> {
    let service = player_service(&state);
    let response = service.get_player(&player_id).await?;

    Ok(Json(response))
}

/// HTTP handler for the authenticated caller's own profile
///
/// GET /api/players/me
#[instrument(name = "me", skip(state, claims))]
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
) -> Result<Json<PlayerResponse>, AppError> {
    let service = player_service(&state);
    let response = service.get_player_for_user(&claims.sub).await?;

    Ok(Json(response))
}

/// HTTP handler for profile updates
///
/// PUT /api/players/:id
#[instrument(name = "update_player", skip(state, claims, request))]
pub async fn update_player(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
    Extension(claims): Extension<AuthClaims>,
    Json(request): Json<PlayerUpdateRequest>,
) -> Result<Json<PlayerResponse>, AppError> {
    let service = player_service(&state);
    let response = service.update_profile(&player_id, request, &claims).await?;

    Ok(Json(response))
}
