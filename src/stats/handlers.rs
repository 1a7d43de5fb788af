use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    models::{RankedEntry, SortCriterion, StatsView},
    service::StatsService,
};
use crate::auth::AuthClaims;
use crate::shared::{AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct GameResultRequest {
    pub score: i64,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub criterion: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct RankingsQuery {
    pub criterion: Option<String>,
}

fn stats_service(state: &AppState) -> StatsService {
    StatsService::new(
        Arc::clone(&state.player_repository),
        Arc::clone(&state.clock),
    )
}

/// Players may report their own results; staff may report for anyone
fn authorize_player_mutation(claims: &AuthClaims, player_id: &str) -> Result<(), AppError> {
    if claims.is_staff || claims.player_id.as_deref() == Some(player_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You may only record results for your own player".to_string(),
        ))
    }
}

/// HTTP handler for recording a game result
///
/// POST /api/players/:id/games
/// Returns the player's updated stats view
#[instrument(name = "record_game", skip(state, claims, request))]
pub async fn record_game(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
    Extension(claims): Extension<AuthClaims>,
    Json(request): Json<GameResultRequest>,
) -> Result<Json<StatsView>, AppError> {
    authorize_player_mutation(&claims, &player_id)?;

    info!(player_id = %player_id, score = request.score, "Recording game result");

    let service = stats_service(&state);
    let view = service.record_game_result(&player_id, request.score).await?;

    Ok(Json(view))
}

/// HTTP handler for recording a win
///
/// POST /api/players/:id/wins
/// Returns the player's updated stats view
#[instrument(name = "record_win", skip(state, claims))]
pub async fn record_win(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
    Extension(claims): Extension<AuthClaims>,
) -> Result<Json<StatsView>, AppError> {
    authorize_player_mutation(&claims, &player_id)?;

    info!(player_id = %player_id, "Recording win");

    let service = stats_service(&state);
    let view = service.record_win(&player_id).await?;

    Ok(Json(view))
}

/// HTTP handler for the authenticated caller's own stats
///
/// GET /api/players/me/stats
#[instrument(name = "my_stats", skip(state, claims))]
pub async fn my_stats(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
) -> Result<Json<StatsView>, AppError> {
    let player_id = claims
        .player_id
        .ok_or_else(|| AppError::NotFound("No player for this account".to_string()))?;

    let service = stats_service(&state);
    let view = service.player_stats(&player_id).await?;

    Ok(Json(view))
}

/// HTTP handler for the capped leaderboard
///
/// GET /api/players/leaderboard?criterion=total_score&limit=10
/// Unrecognized criteria fall back to total_score
#[instrument(name = "leaderboard", skip(state))]
pub async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<StatsView>>, AppError> {
    let criterion = SortCriterion::from_param(query.criterion.as_deref());

    let service = stats_service(&state);
    let board = service.leaderboard(criterion, query.limit).await?;

    info!(%criterion, count = board.len(), "Leaderboard served");

    Ok(Json(board))
}

/// HTTP handler for the full rankings enumeration
///
/// GET /api/players/rankings?criterion=total_score
#[instrument(name = "rankings", skip(state))]
pub async fn rankings(
    State(state): State<AppState>,
    Query(query): Query<RankingsQuery>,
) -> Result<Json<Vec<RankedEntry>>, AppError> {
    let criterion = SortCriterion::from_param(query.criterion.as_deref());

    let service = stats_service(&state);
    let entries = service.rankings(criterion).await?;

    info!(%criterion, count = entries.len(), "Rankings served");

    Ok(Json(entries))
}
