use async_trait::async_trait;
use chrono::NaiveDate;
use shared::error::AppResult;

use crate::model::id::VenueId;
use crate::model::venue::{Venue, VenueSchedule};

#[async_trait]
pub trait VenueRepository: Send + Sync {
    async fn find_by_id(&self, venue_id: VenueId) -> AppResult<Option<Venue>>;
    // 会場の曜日別営業時間を取得する
    async fn find_schedule(&self, venue_id: VenueId) -> AppResult<Vec<VenueSchedule>>;
    // 会場の祝日カレンダーを取得する
    async fn find_holidays(&self, venue_id: VenueId) -> AppResult<Vec<NaiveDate>>;
}
