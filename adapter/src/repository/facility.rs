use async_trait::async_trait;
use derive_new::new;
use kernel::model::facility::Facility;
use kernel::model::id::{FacilityId, VenueId};
use kernel::repository::facility::FacilityRepository;
use shared::error::{AppError, AppResult};

use crate::database::model::facility::FacilityRow;
use crate::database::ConnectionPool;

#[derive(new)]
pub struct FacilityRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl FacilityRepository for FacilityRepositoryImpl {
    async fn find_all(&self, venue_id: Option<VenueId>) -> AppResult<Vec<Facility>> {
        let rows: Vec<FacilityRow> = sqlx::query_as(
            r#"
                SELECT facility_id, venue_id, facility_name, price,
                       cancellation_deadline_hours, is_active
                FROM facilities
                WHERE $1::uuid IS NULL OR venue_id = $1
                ORDER BY facility_name ASC
            "#,
        )
        .bind(venue_id)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(rows.into_iter().map(Facility::from).collect())
    }

    async fn find_by_id(&self, facility_id: FacilityId) -> AppResult<Option<Facility>> {
        let row: Option<FacilityRow> = sqlx::query_as(
            r#"
                SELECT facility_id, venue_id, facility_name, price,
                       cancellation_deadline_hours, is_active
                FROM facilities
                WHERE facility_id = $1
            "#,
        )
        .bind(facility_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(row.map(Facility::from))
    }
}
