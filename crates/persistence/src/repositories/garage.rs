//! Garage repository: profile lookups and proximity search.

use async_trait::async_trait;
use domain::models::{GeoPoint, Responder, SearchArea};
use domain::services::{ResponderDirectory, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db_error;
use crate::entities::garage::{GarageEntity, GARAGE_COLUMNS};
use crate::metrics::QueryTimer;

/// Mean earth radius in meters, as used by the haversine formula.
const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Repository for garage database operations.
#[derive(Clone)]
pub struct GarageRepository {
    pool: PgPool,
}

impl GarageRepository {
    /// Creates a new GarageRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(
        &self,
        query_name: &'static str,
        column: &str,
        value: Uuid,
    ) -> Result<Option<Responder>, StoreError> {
        let timer = QueryTimer::new(query_name);
        let result = sqlx::query_as::<_, GarageEntity>(&format!(
            "SELECT {GARAGE_COLUMNS} FROM garages WHERE {column} = $1"
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        Ok(result.map_err(db_error)?.map(Responder::from))
    }
}

#[async_trait]
impl ResponderDirectory for GarageRepository {
    async fn find_responder(&self, id: Uuid) -> Result<Option<Responder>, StoreError> {
        self.find_one("find_garage_by_id", "id", id).await
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Option<Responder>, StoreError> {
        self.find_one("find_garage_by_owner", "owner_id", owner_id).await
    }

    async fn find_active(
        &self,
        center: GeoPoint,
        area: SearchArea,
    ) -> Result<Vec<Responder>, StoreError> {
        let result = match area {
            SearchArea::Nationwide => {
                let timer = QueryTimer::new("find_active_garages_nationwide");
                let result = sqlx::query_as::<_, GarageEntity>(&format!(
                    "SELECT {GARAGE_COLUMNS} FROM garages WHERE is_active = TRUE ORDER BY name"
                ))
                .fetch_all(&self.pool)
                .await;
                timer.record();
                result
            }
            SearchArea::Within { radius_meters } => {
                let timer = QueryTimer::new("find_active_garages_within");
                let result = sqlx::query_as::<_, GarageEntity>(&format!(
                    r#"
                    SELECT {GARAGE_COLUMNS}
                    FROM (
                        SELECT {GARAGE_COLUMNS},
                            $4 * 2 * ASIN(LEAST(1.0, SQRT(
                                POWER(SIN(RADIANS(latitude - $2) / 2), 2)
                                + COS(RADIANS($2)) * COS(RADIANS(latitude))
                                * POWER(SIN(RADIANS(longitude - $1) / 2), 2)
                            ))) AS distance_meters
                        FROM garages
                        WHERE is_active = TRUE
                    ) nearby
                    WHERE distance_meters <= $3
                    ORDER BY distance_meters
                    "#
                ))
                .bind(center.longitude)
                .bind(center.latitude)
                .bind(radius_meters)
                .bind(EARTH_RADIUS_METERS)
                .fetch_all(&self.pool)
                .await;
                timer.record();
                result
            }
        };

        Ok(result
            .map_err(db_error)?
            .into_iter()
            .map(Responder::from)
            .collect())
    }
}
