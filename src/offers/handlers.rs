use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::OfferService,
    types::{
        HomeOffersResponse, OfferCreateRequest, OfferQuery, OfferResponse, OfferUpdateRequest,
    },
};
use crate::auth::{require_staff, AuthClaims};
use crate::shared::{AppError, AppState};

fn offer_service(state: &AppState) -> OfferService {
    OfferService::new(
        Arc::clone(&state.offer_repository),
        Arc::clone(&state.clock),
    )
}

/// HTTP handler for the filtered offer listing
///
/// GET /api/offers
/// Anonymous and regular callers see only live offers; staff see everything
/// and may filter by status
#[instrument(name = "list_offers", skip(state, claims))]
pub async fn list_offers(
    State(state): State<AppState>,
    claims: Option<Extension<AuthClaims>>,
    Query(query): Query<OfferQuery>,
) -> Result<Json<Vec<OfferResponse>>, AppError> {
    let is_staff = claims.map(|Extension(c)| c.is_staff).unwrap_or(false);

    let service = offer_service(&state);
    let offers = service.list_offers(&query, is_staff).await?;

    Ok(Json(offers))
}

/// HTTP handler for fetching one offer
///
/// GET /api/offers/:id
#[instrument(name = "get_offer", skip(state))]
pub async fn get_offer(
    State(state): State<AppState>,
    Path(offer_id): Path<String>,
) -> Result<Json<OfferResponse>, AppError> {
    let service = offer_service(&state);
    let offer = service.get_offer(&offer_id).await?;

    Ok(Json(offer))
}

/// HTTP handler for currently active offers (public)
///
/// GET /api/offers/active
#[instrument(name = "active_offers", skip(state))]
pub async fn active_offers(
    State(state): State<AppState>,
    Query(query): Query<OfferQuery>,
) -> Result<Json<Vec<OfferResponse>>, AppError> {
    let service = offer_service(&state);
    let offers = service
        .active_offers(query.offer_type, query.is_featured)
        .await?;

    Ok(Json(offers))
}

/// HTTP handler for featured active offers (public)
///
/// GET /api/offers/featured
#[instrument(name = "featured_offers", skip(state))]
pub async fn featured_offers(
    State(state): State<AppState>,
    Query(query): Query<OfferQuery>,
) -> Result<Json<Vec<OfferResponse>>, AppError> {
    let service = offer_service(&state);
    let offers = service.featured_offers(query.offer_type).await?;

    Ok(Json(offers))
}

/// HTTP handler for upcoming offers (public)
///
/// GET /api/offers/upcoming
#[instrument(name = "upcoming_offers", skip(state))]
pub async fn upcoming_offers(
    State(state): State<AppState>,
    Query(query): Query<OfferQuery>,
) -> Result<Json<Vec<OfferResponse>>, AppError> {
    let service = offer_service(&state);
    let offers = service
        .upcoming_offers(query.offer_type, query.is_featured)
        .await?;

    Ok(Json(offers))
}

/// HTTP handler for expired offers (staff only)
///
/// GET /api/offers/expired
#[instrument(name = "expired_offers", skip(state, claims))]
pub async fn expired_offers(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    Query(query): Query<OfferQuery>,
) -> Result<Json<Vec<OfferResponse>>, AppError> {
    require_staff(&claims)?;

    let service = offer_service(&state);
    let offers = service.expired_offers(query.offer_type).await?;

    Ok(Json(offers))
}

/// HTTP handler for the home screen offer groups (public)
///
/// GET /api/offers/for_home
#[instrument(name = "home_offers", skip(state))]
pub async fn home_offers(
    State(state): State<AppState>,
    Query(query): Query<OfferQuery>,
) -> Result<Json<HomeOffersResponse>, AppError> {
    let service = offer_service(&state);
    let response = service.home_offers(query.offer_type).await?;

    Ok(Json(response))
}

/// HTTP handler for creating an offer (staff only)
///
/// POST /api/offers
#[instrument(name = "create_offer", skip(state, claims, request))]
pub async fn create_offer(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    Json(request): Json<OfferCreateRequest>,
) -> Result<Json<OfferResponse>, AppError> {
    require_staff(&claims)?;

    info!(title = %request.title, "Creating new offer");

    let service = offer_service(&state);
    let offer = service.create_offer(request, Some(claims.sub)).await?;

    info!(offer_id = %offer.id, "Offer created successfully");

    Ok(Json(offer))
}

/// HTTP handler for updating an offer (staff only)
///
/// PUT /api/offers/:id
#[instrument(name = "update_offer", skip(state, claims, request))]
pub async fn update_offer(
    State(state): State<AppState>,
    Path(offer_id): Path<String>,
    Extension(claims): Extension<AuthClaims>,
    Json(request): Json<OfferUpdateRequest>,
) -> Result<Json<OfferResponse>, AppError> {
    require_staff(&claims)?;

    let service = offer_service(&state);
    let offer = service.update_offer(&offer_id, request).await?;

    Ok(Json(offer))
}

/// HTTP handler for deleting an offer (staff only)
///
/// DELETE /api/offers/:id
#[instrument(name = "delete_offer", skip(state, claims))]
pub async fn delete_offer(
    State(state): State<AppState>,
    Path(offer_id): Path<String>,
    Extension(claims): Extension<AuthClaims>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_staff(&claims)?;

    let service = offer_service(&state);
    service.delete_offer(&offer_id).await?;

    Ok(Json(serde_json::json!({ "detail": "Offer deleted" })))
}

/// HTTP handler for activating an offer (staff only)
///
/// POST /api/offers/:id/activate
#[instrument(name = "activate_offer", skip(state, claims))]
pub async fn activate_offer(
    State(state): State<AppState>,
    Path(offer_id): Path<String>,
    Extension(claims): Extension<AuthClaims>,
) -> Result<Json<OfferResponse>, AppError> {
    require_staff(&claims)?;

    let service = offer_service(&state);
    let offer = service.activate(&offer_id).await?;

    Ok(Json(offer))
}

/// HTTP handler for deactivating an offer (staff only)
///
/// POST /api/offers/:id/deactivate
#[instrument(name = "deactivate_offer", skip(state, claims))]
pub async fn deactivate_offer(
    State(state): State<AppState>,
    Path(offer_id): Path<String>,
    Extension(claims): Extension<AuthClaims>,
) -> Result<Json<OfferResponse>, AppError> {
    require_staff(&claims)?;

    let service = offer_service(&state);
    let offer = service.deactivate(&offer_id).await?;

    Ok(Json(offer))
}

/// HTTP handler for toggling the featured flag (staff only)
///
/// POST /api/offers/:id/toggle_featured
#[instrument(name = "toggle_featured", skip(state, claims))]
pub async fn toggle_featured(
    State(state): State<AppState>,
    Path(offer_id): Path<String>,
    Extension(claims): Extension<AuthClaims>,
) -> Result<Json<OfferResponse>, AppError> {
    require_staff(&claims)?;

    let service = offer_service(&state);
    let offer = service.toggle_featured(&offer_id).await?;

    Ok(Json(offer))
}

/// HTTP handler for toggling the exclusive flag (staff only)
///
/// POST /api/offers/:id/toggle_exclusive
#[instrument(name = "toggle_exclusive", skip(state, claims))]
pub async fn toggle_exclusive(
    State(state): State<AppState>,
    Path(offer_id): Path<String>,
    Extension(claims): Extension<AuthClaims>,
) -> Result<Json<OfferResponse>, AppError> {
    require_staff(&claims)?;

    let service = offer_service(&state);
    let offer = service.toggle_exclusive(&offer_id).await?;

    Ok(Json(offer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::offers::models::{OfferStatus, OfferType};
    use crate::offers::repository::{InMemoryOfferRepository, OfferRepository};
    use crate::offers::OfferModel;
    use crate::shared::test_utils::AppStateBuilder;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn pinned_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn offer(title: &str, status: OfferStatus, now: DateTime<Utc>) -> OfferModel {
        OfferModel {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: String::new(),
            color: "#1565C0".to_string(),
            image_url: None,
            offer_type: OfferType::Event,
            start_date: now - Duration::days(1),
            end_date: now + Duration::days(1),
            status,
            is_featured: false,
            is_exclusive: false,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    async fn seeded_state() -> AppState {
        let now = pinned_now();
        let repo = Arc::new(InMemoryOfferRepository::new());
        repo.create_offer(&offer("live", OfferStatus::Active, now))
            .await
            .unwrap();
        repo.create_offer(&offer("hidden draft", OfferStatus::Draft, now))
            .await
            .unwrap();

        AppStateBuilder::new()
            .with_offer_repository(repo)
            .with_clock(Arc::new(FixedClock(now)))
            .build()
    }

    #[tokio::test]
    async fn test_list_offers_anonymous_sees_live_only() {
        let state = seeded_state().await;
        let app = Router::new()
            .route("/api/offers", axum::routing::get(list_offers))
            .with_state(state);

        let request = Request::builder()
            .method("GET")
            .uri("/api/offers")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let offers: Vec<OfferResponse> = serde_json::from_slice(&body).unwrap();

        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].title, "live");
        assert!(offers[0].is_active);
    }

    #[tokio::test]
    async fn test_active_offers_endpoint() {
        let state = seeded_state().await;
        let app = Router::new()
            .route("/api/offers/active", axum::routing::get(active_offers))
            .with_state(state);

        let request = Request::builder()
            .method("GET")
            .uri("/api/offers/active?type=EVENT")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let offers: Vec<OfferResponse> = serde_json::from_slice(&body).unwrap();
        assert_eq!(offers.len(), 1);
    }

    #[tokio::test]
    async fn test_create_offer_requires_staff() {
        let state = seeded_state().await;
        let app = Router::new()
            .route("/api/offers", axum::routing::post(create_offer))
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                crate::auth::jwt_auth,
            ))
            .with_state(state);

        // No token at all
        let request = Request::builder()
            .method("POST")
            .uri("/api/offers")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"title": "x", "start_date": "2024-06-01T00:00:00Z", "end_date": "2024-06-10T00:00:00Z"}"#,
            ))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
