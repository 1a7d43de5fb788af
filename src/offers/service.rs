use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{
    models::{OfferModel, OfferStatus, OfferType, DEFAULT_OFFER_COLOR},
    repository::OfferRepository,
    types::{
        HomeOffersCount, HomeOffersResponse, OfferCreateRequest, OfferQuery, OfferResponse,
        OfferUpdateRequest,
    },
};
use crate::clock::Clock;
use crate::shared::AppError;

/// Service for offer business logic: time-window activation, listing
/// filters and the admin lifecycle operations
pub struct OfferService {
    repository: Arc<dyn OfferRepository + Send + Sync>,
    clock: Arc<dyn Clock>,
}

impl OfferService {
    pub fn new(repository: Arc<dyn OfferRepository + Send + Sync>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Lists offers with the caller's filters applied. Non-staff callers
    /// only ever see ACTIVE or UPCOMING offers that have not ended yet.
    #[instrument(skip(self, query))]
    pub async fn list_offers(
        &self,
        query: &OfferQuery,
        is_staff: bool,
    ) -> Result<Vec<OfferResponse>, AppError> {
        let now = self.clock.now();
        let mut offers = self.repository.list_offers().await?;

        if is_staff {
            if let Some(status) = query.status {
                offers.retain(|o| o.status == status);
            }
        } else {
            offers.retain(|o| {
                (o.status == OfferStatus::Active || o.status == OfferStatus::Upcoming)
                    && o.end_date >= now
            });
        }

        if let Some(offer_type) = query.offer_type {
            offers.retain(|o| o.offer_type == offer_type);
        }
        if let Some(is_featured) = query.is_featured {
            offers.retain(|o| o.is_featured == is_featured);
        }
        if let Some(is_exclusive) = query.is_exclusive {
            offers.retain(|o| o.is_exclusive == is_exclusive);
        }
        if let Some(is_active) = query.is_active {
            offers.retain(|o| o.is_active(now) == is_active);
        }

        sort_featured_first(&mut offers);

        debug!(count = offers.len(), is_staff, "Offers listed");

        Ok(to_responses(&offers, now))
    }

    #[instrument(skip(self))]
    pub async fn get_offer(&self, offer_id: &str) -> Result<OfferResponse, AppError> {
        let offer = self.load(offer_id).await?;
        Ok(OfferResponse::from_model(&offer, self.clock.now()))
    }

    /// All offers currently inside their active window
    #[instrument(skip(self))]
    pub async fn active_offers(
        &self,
        offer_type: Option<OfferType>,
        is_featured: Option<bool>,
    ) -> Result<Vec<OfferResponse>, AppError> {
        let now = self.clock.now();
        let mut offers = self.repository.list_offers().await?;

        offers.retain(|o| o.is_active(now));
        if let Some(offer_type) = offer_type {
            offers.retain(|o| o.offer_type == offer_type);
        }
        if let Some(is_featured) = is_featured {
            offers.retain(|o| o.is_featured == is_featured);
        }

        sort_featured_first(&mut offers);

        Ok(to_responses(&offers, now))
    }

    /// Featured offers inside their active window, newest first
    #[instrument(skip(self))]
    pub async fn featured_offers(
        &self,
        offer_type: Option<OfferType>,
    ) -> Result<Vec<OfferResponse>, AppError> {
        let now = self.clock.now();
        let mut offers = self.repository.list_offers().await?;

        offers.retain(|o| o.is_featured && o.is_active(now));
        if let Some(offer_type) = offer_type {
            offers.retain(|o| o.offer_type == offer_type);
        }

        offers.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(to_responses(&offers, now))
    }

    /// Offers announced but not yet started, soonest first
    #[instrument(skip(self))]
    pub async fn upcoming_offers(
        &self,
        offer_type: Option<OfferType>,
        is_featured: Option<bool>,
    ) -> Result<Vec<OfferResponse>, AppError> {
        let now = self.clock.now();
        let mut offers = self.repository.list_offers().await?;

        offers.retain(|o| o.status == OfferStatus::Upcoming && o.start_date > now);
        if let Some(offer_type) = offer_type {
            offers.retain(|o| o.offer_type == offer_type);
        }
        if let Some(is_featured) = is_featured {
            offers.retain(|o| o.is_featured == is_featured);
        }

        offers.sort_by(|a, b| a.start_date.cmp(&b.start_date));

        Ok(to_responses(&offers, now))
    }

    /// Offers marked expired or past their end date, most recently ended first
    #[instrument(skip(self))]
    pub async fn expired_offers(
        &self,
        offer_type: Option<OfferType>,
    ) -> Result<Vec<OfferResponse>, AppError> {
        let now = self.clock.now();
        let mut offers = self.repository.list_offers().await?;

        offers.retain(|o| o.status == OfferStatus::Expired || o.end_date < now);
        if let Some(offer_type) = offer_type {
            offers.retain(|o| o.offer_type == offer_type);
        }

        offers.sort_by(|a, b| b.end_date.cmp(&a.end_date));

        Ok(to_responses(&offers, now))
    }

    /// Grouped view for the home screen: featured, other active, upcoming
    #[instrument(skip(self))]
    pub async fn home_offers(
        &self,
        offer_type: Option<OfferType>,
    ) -> Result<HomeOffersResponse, AppError> {
        let now = self.clock.now();
        let mut offers = self.repository.list_offers().await?;

        if let Some(offer_type) = offer_type {
            offers.retain(|o| o.offer_type == offer_type);
        }

        let mut featured: Vec<OfferModel> = offers
            .iter()
            .filter(|o| o.is_featured && o.is_active(now))
            .cloned()
            .collect();
        featured.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut active: Vec<OfferModel> = offers
            .iter()
            .filter(|o| !o.is_featured && o.is_active(now))
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut upcoming: Vec<OfferModel> = offers
            .iter()
            .filter(|o| o.status == OfferStatus::Upcoming && o.start_date > now)
            .cloned()
            .collect();
        upcoming.sort_by(|a, b| a.start_date.cmp(&b.start_date));

        Ok(HomeOffersResponse {
            count: HomeOffersCount {
                featured: featured.len(),
                active: active.len(),
                upcoming: upcoming.len(),
            },
            featured: to_responses(&featured, now),
            active: to_responses(&active, now),
            upcoming: to_responses(&upcoming, now),
        })
    }

    /// Creates an offer, stamping the creating staff account
    #[instrument(skip(self, request))]
    pub async fn create_offer(
        &self,
        request: OfferCreateRequest,
        created_by: Option<String>,
    ) -> Result<OfferResponse, AppError> {
        validate_window(request.start_date, request.end_date)?;

        let now = self.clock.now();
        let offer = OfferModel {
            id: Uuid::new_v4().to_string(),
            title: request.title,
            description: request.description,
            color: request
                .color
                .unwrap_or_else(|| DEFAULT_OFFER_COLOR.to_string()),
            image_url: request.image_url,
            offer_type: request.offer_type.unwrap_or(OfferType::Other),
            start_date: request.start_date,
            end_date: request.end_date,
            status: request.status.unwrap_or(OfferStatus::Draft),
            is_featured: request.is_featured,
            is_exclusive: request.is_exclusive,
            created_by,
            created_at: now,
            updated_at: now,
        };

        self.repository.create_offer(&offer).await?;

        info!(offer_id = %offer.id, title = %offer.title, "Offer created");

        Ok(OfferResponse::from_model(&offer, now))
    }

    /// Applies a partial update, revalidating the date window
    #[instrument(skip(self, request))]
    pub async fn update_offer(
        &self,
        offer_id: &str,
        request: OfferUpdateRequest,
    ) -> Result<OfferResponse, AppError> {
        let mut offer = self.load(offer_id).await?;

        if let Some(title) = request.title {
            offer.title = title;
        }
        if let Some(description) = request.description {
            offer.description = description;
        }
        if let Some(color) = request.color {
            offer.color = color;
        }
        if let Some(image_url) = request.image_url {
            offer.image_url = Some(image_url);
        }
        if let Some(offer_type) = request.offer_type {
            offer.offer_type = offer_type;
        }
        if let Some(start_date) = request.start_date {
            offer.start_date = start_date;
        }
        if let Some(end_date) = request.end_date {
            offer.end_date = end_date;
        }
        if let Some(status) = request.status {
            offer.status = status;
        }
        if let Some(is_featured) = request.is_featured {
            offer.is_featured = is_featured;
        }
        if let Some(is_exclusive) = request.is_exclusive {
            offer.is_exclusive = is_exclusive;
        }

        validate_window(offer.start_date, offer.end_date)?;

        let now = self.clock.now();
        offer.updated_at = now;
        self.repository.update_offer(&offer).await?;

        info!(offer_id = %offer_id, "Offer updated");

        Ok(OfferResponse::from_model(&offer, now))
    }

    #[instrument(skip(self))]
    pub async fn delete_offer(&self, offer_id: &str) -> Result<(), AppError> {
        self.repository.delete_offer(offer_id).await?;
        info!(offer_id = %offer_id, "Offer deleted");
        Ok(())
    }

    /// Marks an offer ACTIVE; refuses when it already is
    #[instrument(skip(self))]
    pub async fn activate(&self, offer_id: &str) -> Result<OfferResponse, AppError> {
        let mut offer = self.load(offer_id).await?;

        if offer.status == OfferStatus::Active {
            return Err(AppError::Validation(
                "Offer is already active".to_string(),
            ));
        }

        offer.status = OfferStatus::Active;
        let now = self.clock.now();
        offer.updated_at = now;
        self.repository.update_offer(&offer).await?;

        info!(offer_id = %offer_id, "Offer activated");

        Ok(OfferResponse::from_model(&offer, now))
    }

    /// Marks an ACTIVE offer EXPIRED; refuses for any other state
    #[instrument(skip(self))]
    pub async fn deactivate(&self, offer_id: &str) -> Result<OfferResponse, AppError> {
        let mut offer = self.load(offer_id).await?;

        if offer.status != OfferStatus::Active {
            return Err(AppError::Validation("Offer is not active".to_string()));
        }

        offer.status = OfferStatus::Expired;
        let now = self.clock.now();
        offer.updated_at = now;
        self.repository.update_offer(&offer).await?;

        info!(offer_id = %offer_id, "Offer deactivated");

        Ok(OfferResponse::from_model(&offer, now))
    }

    #[instrument(skip(self))]
    pub async fn toggle_featured(&self, offer_id: &str) -> Result<OfferResponse, AppError> {
        let mut offer = self.load(offer_id).await?;
        offer.is_featured = !offer.is_featured;

        let now = self.clock.now();
        offer.updated_at = now;
        self.repository.update_offer(&offer).await?;

        info!(offer_id = %offer_id, is_featured = offer.is_featured, "Featured flag toggled");

        Ok(OfferResponse::from_model(&offer, now))
    }

    #[instrument(skip(self))]
    pub async fn toggle_exclusive(&self, offer_id: &str) -> Result<OfferResponse, AppError> {
        let mut offer = self.load(offer_id).await?;
        offer.is_exclusive = !offer.is_exclusive;

        let now = self.clock.now();
        offer.updated_at = now;
        self.repository.update_offer(&offer).await?;

        info!(offer_id = %offer_id, is_exclusive = offer.is_exclusive, "Exclusive flag toggled");

        Ok(OfferResponse::from_model(&offer, now))
    }

    async fn load(&self, offer_id: &str) -> Result<OfferModel, AppError> {
        self.repository
            .get_offer(offer_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Offer not found".to_string()))
    }
}

/// Default listing order: featured offers first, newest first within a group
fn sort_featured_first(offers: &mut [OfferModel]) {
    offers.sort_by(|a, b| {
        b.is_featured
            .cmp(&a.is_featured)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

fn to_responses(offers: &[OfferModel], now: DateTime<Utc>) -> Vec<OfferResponse> {
    offers
        .iter()
        .map(|o| OfferResponse::from_model(o, now))
        .collect()
}

fn validate_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), AppError> {
    if start >= end {
        return Err(AppError::Validation(
            "End date must be after start date".to_string(),
        ));
    }
    Ok(())
}
