use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{auth, offers, player, shared::AppState, stats};

/// Builds the full API route table.
///
/// Authentication is applied per method router: `jwt_auth` rejects requests
/// without a valid access token, `optional_jwt_auth` only enriches the
/// request when one is present (public endpoints with a richer staff view).
pub fn api_router(state: AppState) -> Router {
    let auth_required = middleware::from_fn_with_state(state.clone(), auth::jwt_auth);
    let auth_optional = middleware::from_fn_with_state(state.clone(), auth::optional_jwt_auth);

    Router::new()
        // authentication
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/verify", post(auth::verify))
        .route("/api/auth/logout", post(auth::logout))
        .route(
            "/api/auth/me",
            get(auth::authenticated_user).route_layer(auth_required.clone()),
        )
        // players: registration is public, everything else needs a session
        .route("/api/players", post(player::register_player))
        .route(
            "/api/players",
            get(player::list_players).route_layer(auth_required.clone()),
        )
        .route(
            "/api/players/me",
            get(player::me).route_layer(auth_required.clone()),
        )
        .route(
            "/api/players/me/stats",
            get(stats::my_stats).route_layer(auth_required.clone()),
        )
        // leaderboard and rankings are public reads
        .route("/api/players/leaderboard", get(stats::leaderboard))
        .route("/api/players/rankings", get(stats::rankings))
        .route(
            "/api/players/:id",
            get(player::get_player)
                .put(player::update_player)
                .route_layer(auth_required.clone()),
        )
        .route(
            "/api/players/:id/games",
            post(stats::record_game).route_layer(auth_required.clone()),
        )
        .route(
            "/api/players/:id/wins",
            post(stats::record_win).route_layer(auth_required.clone()),
        )
        // offers: public reads, staff-only writes
        .route(
            "/api/offers",
            get(offers::list_offers).route_layer(auth_optional),
        )
        .route(
            "/api/offers",
            post(offers::create_offer).route_layer(auth_required.clone()),
        )
        .route("/api/offers/active", get(offers::active_offers))
        .route("/api/offers/featured", get(offers::featured_offers))
        .route("/api/offers/upcoming", get(offers::upcoming_offers))
        .route("/api/offers/for_home", get(offers::home_offers))
        .route(
            "/api/offers/expired",
            get(offers::expired_offers).route_layer(auth_required.clone()),
        )
        .route("/api/offers/:id", get(offers::get_offer))
        .route(
            "/api/offers/:id",
            put(offers::update_offer)
                .delete(offers::delete_offer)
                .route_layer(auth_required.clone()),
        )
        .route(
            "/api/offers/:id/activate",
            post(offers::activate_offer).route_layer(auth_required.clone()),
        )
        .route(
            "/api/offers/:id/deactivate",
            post(offers::deactivate_offer).route_layer(auth_required.clone()),
        )
        .route(
            "/api/offers/:id/toggle_featured",
            post(offers::toggle_featured).route_layer(auth_required.clone()),
        )
        .route(
            "/api/offers/:id/toggle_exclusive",
            post(offers::toggle_exclusive).route_layer(auth_required),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
