use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use kernel::model::id::{FacilityId, PaymentId, ReservationId, UserId};
use kernel::model::payment::{Payment, PaymentStatus};
use kernel::model::reservation::{Occupant, Reservation, ReservationStatus};
use shared::error::AppError;

#[derive(sqlx::FromRow)]
pub struct ReservationRow {
    pub reservation_id: ReservationId,
    pub facility_id: FacilityId,
    pub user_id: Option<UserId>,
    pub reserved_on: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: String,
    pub reason: Option<String>,
    pub payment_ref: Option<String>,
    pub reserved_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = AppError;

    fn try_from(value: ReservationRow) -> Result<Self, Self::Error> {
        let ReservationRow {
            reservation_id,
            facility_id,
            user_id,
            reserved_on,
            start_time,
            end_time,
            status,
            reason,
            payment_ref,
            reserved_at,
            cancelled_at,
        } = value;
        let status = status
            .parse::<ReservationStatus>()
            .map_err(|e| AppError::ConversionEntityError(e.to_string()))?;
        Ok(Reservation {
            reservation_id,
            facility_id,
            reserved_by: user_id,
            reserved_on,
            start_time,
            end_time,
            status,
            reason,
            payment_ref,
            reserved_at,
            cancelled_at,
        })
    }
}

// 占有射影の行。空き照会用に必要な列だけを引く
#[derive(sqlx::FromRow)]
pub struct OccupantRow {
    pub start_time: NaiveTime,
    pub status: String,
    pub reason: Option<String>,
    pub user_id: Option<UserId>,
}

impl TryFrom<OccupantRow> for Occupant {
    type Error = AppError;

    fn try_from(value: OccupantRow) -> Result<Self, Self::Error> {
        let OccupantRow {
            start_time,
            status,
            reason,
            user_id,
        } = value;
        let status = status
            .parse::<ReservationStatus>()
            .map_err(|e| AppError::ConversionEntityError(e.to_string()))?;
        Ok(Occupant {
            start_time,
            status,
            reason,
            reserved_by: user_id,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct PaymentRow {
    pub payment_id: PaymentId,
    pub reservation_id: ReservationId,
    pub amount: i32,
    pub status: String,
    pub external_ref: String,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = AppError;

    fn try_from(value: PaymentRow) -> Result<Self, Self::Error> {
        let PaymentRow {
            payment_id,
            reservation_id,
            amount,
            status,
            external_ref,
        } = value;
        let status = status
            .parse::<PaymentStatus>()
            .map_err(|e| AppError::ConversionEntityError(e.to_string()))?;
        Ok(Payment {
            payment_id,
            reservation_id,
            amount,
            status,
            external_ref,
        })
    }
}
