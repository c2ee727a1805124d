use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use derive_new::new;

use crate::model::id::{FacilityId, ReservationId, UserId};
use crate::model::role::Role;

// 利用者による予約作成。成功すると PENDING 状態で作られる。
#[derive(Debug, new)]
pub struct CreateReservation {
    pub facility_id: FacilityId,
    pub reserved_by: UserId,
    pub reserved_on: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub reserved_at: DateTime<Utc>,
}

// 運営者による管理ブロック。利用者を持たない BLOCKED 行として作られる。
#[derive(Debug, new)]
pub struct BlockSlot {
    pub facility_id: FacilityId,
    pub reserved_on: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub reason: String,
    pub blocked_at: DateTime<Utc>,
}

// 決済確定後の予約確定。payment_ref は外部で決済済みの参照であること。
#[derive(Debug, new)]
pub struct ConfirmReservation {
    pub reservation_id: ReservationId,
    pub payment_ref: String,
}

#[derive(Debug, new)]
pub struct CancelReservation {
    pub reservation_id: ReservationId,
    pub actor_id: UserId,
    pub actor_role: Role,
    pub reason: String,
    pub cancelled_at: DateTime<Utc>,
}

#[derive(Debug, new)]
pub struct UnblockSlot {
    pub reservation_id: ReservationId,
    pub actor_role: Role,
}
