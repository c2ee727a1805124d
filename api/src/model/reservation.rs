use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use garde::Validate;
use kernel::model::id::{FacilityId, ReservationId, UserId};
use kernel::model::reservation::{Reservation, ReservationStatus};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReservationStatusName {
    Pending,
    Confirmed,
    Cancelled,
    Blocked,
}

impl From<ReservationStatus> for ReservationStatusName {
    fn from(value: ReservationStatus) -> Self {
        match value {
            ReservationStatus::Pending => Self::Pending,
            ReservationStatus::Confirmed => Self::Confirmed,
            ReservationStatus::Cancelled => Self::Cancelled,
            ReservationStatus::Blocked => Self::Blocked,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    #[garde(skip)]
    pub date: NaiveDate,
    #[garde(skip)]
    pub start_time: NaiveTime,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BlockSlotRequest {
    #[garde(skip)]
    pub date: NaiveDate,
    #[garde(skip)]
    pub start_time: NaiveTime,
    #[garde(length(min = 1))]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmReservationRequest {
    #[garde(length(min = 1))]
    pub payment_ref: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CancelReservationRequest {
    #[garde(length(min = 1))]
    pub reason: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationCreatedResponse {
    pub reservation_id: ReservationId,
    pub status: ReservationStatusName,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelledResponse {
    pub reservation_id: ReservationId,
    // 猶予期限を過ぎたキャンセルかどうか。超過しても成立は妨げず、
    // 違約金の計算は外部の料金側に委ねる
    pub late_cancellation: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResponse {
    pub reservation_id: ReservationId,
    pub facility_id: FacilityId,
    pub reserved_by: Option<UserId>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: ReservationStatusName,
    pub reason: Option<String>,
    pub payment_ref: Option<String>,
    pub reserved_at: DateTime<Utc>,
}

impl From<Reservation> for ReservationResponse {
    fn from(value: Reservation) -> Self {
        let Reservation {
            reservation_id,
            facility_id,
            reserved_by,
            reserved_on,
            start_time,
            end_time,
            status,
            reason,
            payment_ref,
            reserved_at,
            cancelled_at: _,
        } = value;
        Self {
            reservation_id,
            facility_id,
            reserved_by,
            date: reserved_on,
            start_time,
            end_time,
            status: status.into(),
            reason,
            payment_ref,
            reserved_at,
        }
    }
}
