use strum::{Display, EnumString};

use crate::model::id::{PaymentId, ReservationId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

// 確定済み予約と 1:1 で紐づく決済記録。Paid になった後は変更しない。
#[derive(Debug, Clone)]
pub struct Payment {
    pub payment_id: PaymentId,
    pub reservation_id: ReservationId,
    pub amount: i32,
    pub status: PaymentStatus,
    // 決済ゲートウェイ側の参照。発行・照会は外部コラボレーターの責務。
    pub external_ref: String,
}
