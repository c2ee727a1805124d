use async_trait::async_trait;
use shared::error::AppResult;

use crate::model::facility::Facility;
use crate::model::id::{FacilityId, VenueId};

// 設備ディレクトリは外部コラボレーターが管理する読み取り専用の台帳
#[async_trait]
pub trait FacilityRepository: Send + Sync {
    // 設備一覧を取得する。venue_id 指定時はその会場の設備に絞る
    async fn find_all(&self, venue_id: Option<VenueId>) -> AppResult<Vec<Facility>>;
    async fn find_by_id(&self, facility_id: FacilityId) -> AppResult<Option<Facility>>;
}
