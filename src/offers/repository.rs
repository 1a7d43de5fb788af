use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::{OfferModel, OfferStatus, OfferType};
use crate::shared::AppError;

/// Trait for offer repository operations
#[async_trait]
pub trait OfferRepository {
    async fn create_offer(&self, offer: &OfferModel) -> Result<(), AppError>;
    async fn get_offer(&self, offer_id: &str) -> Result<Option<OfferModel>, AppError>;
    async fn list_offers(&self) -> Result<Vec<OfferModel>, AppError>;
    async fn update_offer(&self, offer: &OfferModel) -> Result<(), AppError>;
    async fn delete_offer(&self, offer_id: &str) -> Result<(), AppError>;
}

/// In-memory implementation of OfferRepository for development and testing
pub struct InMemoryOfferRepository {
    offers: Mutex<HashMap<String, OfferModel>>,
}

impl Default for InMemoryOfferRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryOfferRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            offers: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl OfferRepository for InMemoryOfferRepository {
    #[instrument(skip(self, offer))]
    async fn create_offer(&self, offer: &OfferModel) -> Result<(), AppError> {
        debug!(offer_id = %offer.id, title = %offer.title, "Creating offer in memory");

        let mut offers = self.offers.lock().unwrap();
        if offers.contains_key(&offer.id) {
            warn!(offer_id = %offer.id, "Offer already exists in memory");
            return Err(AppError::DatabaseError("Offer already exists".to_string()));
        }
        offers.insert(offer.id.clone(), offer.clone());

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_offer(&self, offer_id: &str) -> Result<Option<OfferModel>, AppError> {
        let offers = self.offers.lock().unwrap();
        Ok(offers.get(offer_id).cloned())
    }

    #[instrument(skip(self))]
    async fn list_offers(&self) -> Result<Vec<OfferModel>, AppError> {
        let offers = self.offers.lock().unwrap();
        Ok(offers.values().cloned().collect())
    }

    #[instrument(skip(self, offer))]
    async fn update_offer(&self, offer: &OfferModel) -> Result<(), AppError> {
        let mut offers = self.offers.lock().unwrap();
        if !offers.contains_key(&offer.id) {
            warn!(offer_id = %offer.id, "Offer not found for update in memory");
            return Err(AppError::NotFound("Offer not found".to_string()));
        }
        offers.insert(offer.id.clone(), offer.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_offer(&self, offer_id: &str) -> Result<(), AppError> {
        let mut offers = self.offers.lock().unwrap();
        if offers.remove(offer_id).is_none() {
            warn!(offer_id = %offer_id, "Offer not found for deletion in memory");
            return Err(AppError::NotFound("Offer not found".to_string()));
        }
        Ok(())
    }
}

/// PostgreSQL implementation of the offer repository
pub struct PostgresOfferRepository {
    pool: PgPool,
}

impl PostgresOfferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_offer(row: &sqlx::postgres::PgRow) -> Result<OfferModel, AppError> {
        let status: String = row.get("status");
        let status = OfferStatus::try_from(status.as_str())
            .map_err(|s| AppError::DatabaseError(format!("Unknown offer status: {}", s)))?;
        let offer_type: String = row.get("offer_type");
        let offer_type = OfferType::try_from(offer_type.as_str())
            .map_err(|t| AppError::DatabaseError(format!("Unknown offer type: {}", t)))?;

        Ok(OfferModel {
            id: row.get("id"),
            title: row.get("title"),
            description: row.get("description"),
            color: row.get("color"),
            image_url: row.get("image_url"),
            offer_type,
            start_date: row.get("start_date"),
            end_date: row.get("end_date"),
            status,
            is_featured: row.get("is_featured"),
            is_exclusive: row.get("is_exclusive"),
            created_by: row.get("created_by"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

const OFFER_COLUMNS: &str = "id, title, description, color, image_url, offer_type, start_date, \
     end_date, status, is_featured, is_exclusive, created_by, created_at, updated_at";

#[async_trait]
impl OfferRepository for PostgresOfferRepository {
    #[instrument(skip(self, offer))]
    async fn create_offer(&self, offer: &OfferModel) -> Result<(), AppError> {
        debug!(offer_id = %offer.id, title = %offer.title, "Creating offer in database");

        sqlx::query(
            "INSERT INTO offers (id, title, description, color, image_url, offer_type, \
             start_date, end_date, status, is_featured, is_exclusive, created_by, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(&offer.id)
        .bind(&offer.title)
        .bind(&offer.description)
        .bind(&offer.color)
        .bind(&offer.image_url)
        .bind(offer.offer_type.to_string())
        .bind(offer.start_date)
        .bind(offer.end_date)
        .bind(offer.status.to_string())
        .bind(offer.is_featured)
        .bind(offer.is_exclusive)
        .bind(&offer.created_by)
        .bind(offer.created_at)
        .bind(offer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create offer in database");
            AppError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_offer(&self, offer_id: &str) -> Result<Option<OfferModel>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM offers WHERE id = $1",
            OFFER_COLUMNS
        ))
        .bind(offer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, offer_id = %offer_id, "Failed to fetch offer from database");
            AppError::DatabaseError(e.to_string())
        })?;

        row.as_ref().map(Self::row_to_offer).transpose()
    }

    #[instrument(skip(self))]
    async fn list_offers(&self) -> Result<Vec<OfferModel>, AppError> {
        let rows = sqlx::query(&format!("SELECT {} FROM offers", OFFER_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to list offers from database");
                AppError::DatabaseError(e.to_string())
            })?;

        rows.iter().map(Self::row_to_offer).collect()
    }

    #[instrument(skip(self, offer))]
    async fn update_offer(&self, offer: &OfferModel) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE offers SET title = $2, description = $3, color = $4, image_url = $5, \
             offer_type = $6, start_date = $7, end_date = $8, status = $9, is_featured = $10, \
             is_exclusive = $11, updated_at = $12 WHERE id = $1",
        )
        .bind(&offer.id)
        .bind(&offer.title)
        .bind(&offer.description)
        .bind(&offer.color)
        .bind(&offer.image_url)
        .bind(offer.offer_type.to_string())
        .bind(offer.start_date)
        .bind(offer.end_date)
        .bind(offer.status.to_string())
        .bind(offer.is_featured)
        .bind(offer.is_exclusive)
        .bind(offer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, offer_id = %offer.id, "Failed to update offer in database");
            AppError::DatabaseError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            warn!(offer_id = %offer.id, "Offer not found for update");
            return Err(AppError::NotFound("Offer not found".to_string()));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_offer(&self, offer_id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM offers WHERE id = $1")
            .bind(offer_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, offer_id = %offer_id, "Failed to delete offer from database");
                AppError::DatabaseError(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            warn!(offer_id = %offer_id, "Offer not found for deletion");
            return Err(AppError::NotFound("Offer not found".to_string()));
        }

        Ok(())
    }
}
