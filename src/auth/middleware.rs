use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{instrument, warn};

use super::types::{AuthClaims, TokenKind};
use crate::shared::{AppError, AppState};

/// JWT authentication middleware - validates Authorization Bearer header and adds AuthClaims to request.
/// Usage: .layer(middleware::from_fn_with_state(app_state.clone(), auth::jwt_auth))
/// Handlers can then extract Extension(claims): Extension<AuthClaims>.
#[instrument(skip(state, req, next))]
pub async fn jwt_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Extract token from Authorization Bearer header
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| {
            warn!("Missing Authorization header in request");
            AppError::Unauthorized("Missing authorization header".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        warn!("Invalid Authorization header format (expected Bearer token)");
        AppError::Unauthorized("Invalid authorization header format".to_string())
    })?;

    let claims = match state.token_config.validate_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            warn!("JWT authentication failed: {}", e);
            return Err(e);
        }
    };

    // Refresh tokens only work against the refresh endpoint
    if claims.kind != TokenKind::Access {
        warn!(username = %claims.username, "Refresh token used as bearer credential");
        return Err(AppError::Unauthorized(
            "Refresh tokens cannot be used for authentication".to_string(),
        ));
    }

    // Add claims to request extensions for handlers to use
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Best-effort variant of [`jwt_auth`] for public endpoints whose response
/// is richer for authenticated callers. A valid access token adds claims to
/// the request; anything else leaves the request anonymous instead of
/// failing it.
#[instrument(skip(state, req, next))]
pub async fn optional_jwt_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "));

    if let Some(token) = token {
        if let Ok(claims) = state.token_config.validate_token(token) {
            if claims.kind == TokenKind::Access {
                req.extensions_mut().insert(claims);
            }
        }
    }

    next.run(req).await
}

/// Guard for admin-only operations
pub fn require_staff(claims: &AuthClaims) -> Result<(), AppError> {
    if claims.is_staff {
        Ok(())
    } else {
        warn!(username = %claims.username, "Staff-only operation attempted by non-staff user");
        Err(AppError::Forbidden(
            "You do not have permission to perform this action".to_string(),
        ))
    }
}
