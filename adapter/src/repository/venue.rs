use async_trait::async_trait;
use chrono::NaiveDate;
use derive_new::new;
use kernel::model::id::VenueId;
use kernel::model::venue::{Venue, VenueSchedule};
use kernel::repository::venue::VenueRepository;
use shared::error::{AppError, AppResult};

use crate::database::model::venue::{VenueRow, VenueScheduleRow};
use crate::database::ConnectionPool;

#[derive(new)]
pub struct VenueRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl VenueRepository for VenueRepositoryImpl {
    async fn find_by_id(&self, venue_id: VenueId) -> AppResult<Option<Venue>> {
        let row: Option<VenueRow> = sqlx::query_as(
            r#"
                SELECT venue_id, venue_name, timezone, address
                FROM venues
                WHERE venue_id = $1
            "#,
        )
        .bind(venue_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        row.map(Venue::try_from).transpose()
    }

    async fn find_schedule(&self, venue_id: VenueId) -> AppResult<Vec<VenueSchedule>> {
        let rows: Vec<VenueScheduleRow> = sqlx::query_as(
            r#"
                SELECT venue_id, day_of_week, is_open, opening_time, closing_time
                FROM venue_schedules
                WHERE venue_id = $1
                ORDER BY day_of_week ASC
            "#,
        )
        .bind(venue_id)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(rows.into_iter().map(VenueSchedule::from).collect())
    }

    async fn find_holidays(&self, venue_id: VenueId) -> AppResult<Vec<NaiveDate>> {
        let rows: Vec<(NaiveDate,)> = sqlx::query_as(
            r#"
                SELECT holiday_on
                FROM venue_holidays
                WHERE venue_id = $1
                ORDER BY holiday_on ASC
            "#,
        )
        .bind(venue_id)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(rows.into_iter().map(|(holiday_on,)| holiday_on).collect())
    }
}
