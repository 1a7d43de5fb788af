use axum::{extract::State, Extension, Json};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::AuthService,
    types::{
        AuthClaims, AuthenticatedUserResponse, DetailResponse, LoginRequest, LoginResponse,
        RefreshRequest, TokenPairResponse, VerifyRequest,
    },
};
use crate::shared::{AppError, AppState};

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(
        Arc::clone(&state.user_repository),
        Arc::clone(&state.player_repository),
        Arc::clone(&state.token_blacklist),
        state.token_config.clone(),
        Arc::clone(&state.clock),
    )
}

/// HTTP handler for credential login
///
/// POST /api/auth/login
/// Returns an access/refresh token pair plus the caller's player id
#[instrument(name = "login", skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    info!(username = %request.username, "Login requested");

    let service = auth_service(&state);
    let response = service.login(&request.username, &request.password).await?;

    Ok(Json(response))
}

/// HTTP handler for refresh-token rotation
///
/// POST /api/auth/refresh
#[instrument(name = "refresh", skip(state, request))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokenPairResponse>, AppError> {
    let service = auth_service(&state);
    let response = service.refresh(&request.refresh).await?;

    Ok(Json(response))
}

/// HTTP handler for token verification
///
/// POST /api/auth/verify
#[instrument(name = "verify", skip(state, request))]
pub async fn verify(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<DetailResponse>, AppError> {
    let service = auth_service(&state);
    service.verify(&request.token).await?;

    Ok(Json(DetailResponse {
        detail: "Token is valid".to_string(),
    }))
}

/// HTTP handler for logout (refresh-token revocation)
///
/// POST /api/auth/logout
#[instrument(name = "logout", skip(state, request))]
pub async fn logout(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<DetailResponse>, AppError> {
    let service = auth_service(&state);
    service.logout(&request.refresh).await?;

    Ok(Json(DetailResponse {
        detail: "Logged out".to_string(),
    }))
}

/// HTTP handler returning the authenticated caller's account
///
/// GET /api/auth/me
#[instrument(name = "authenticated_user", skip(state, claims))]
pub async fn authenticated_user(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
) -> Result<Json<AuthenticatedUserResponse>, AppError> {
    let service = auth_service(&state);
    let response = service.authenticated_user(&claims.sub).await?;

    Ok(Json(response))
}
