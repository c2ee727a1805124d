use crate::model::id::{FacilityId, VenueId};

#[derive(Debug, Clone)]
pub struct Facility {
    pub facility_id: FacilityId,
    pub venue_id: VenueId,
    pub facility_name: String,
    // 1 スロットあたりの固定料金（通貨最小単位）。このエンジンは読むだけで、
    // 料金計算そのものは行わない。
    pub price: i32,
    // キャンセル猶予期間（時間）。期限超過は記録と通知のみで、
    // キャンセル自体は妨げない。
    pub cancellation_deadline_hours: i32,
    pub is_active: bool,
}
