use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use strum::{Display, EnumString};

use crate::model::id::{FacilityId, ReservationId, UserId};

pub mod event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Blocked,
}

impl ReservationStatus {
    /// 同一スロットの占有としてカウントされる状態かどうか。
    /// Cancelled は履歴として残るが競合チェックからは除外される。
    pub fn occupies_slot(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed | Self::Blocked)
    }
}

#[derive(Debug, Clone)]
pub struct Reservation {
    pub reservation_id: ReservationId,
    pub facility_id: FacilityId,
    // 管理ブロックでは None
    pub reserved_by: Option<UserId>,
    pub reserved_on: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: ReservationStatus,
    // Cancelled / Blocked のとき必須
    pub reason: Option<String>,
    pub payment_ref: Option<String>,
    pub reserved_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

// 空き照会が参照する占有情報の射影。予約一覧とは独立に、
// スロット分類に必要な最小限のフィールドだけを持つ。
#[derive(Debug, Clone)]
pub struct Occupant {
    pub start_time: NaiveTime,
    pub status: ReservationStatus,
    pub reason: Option<String>,
    pub reserved_by: Option<UserId>,
}
