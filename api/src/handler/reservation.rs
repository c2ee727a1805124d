use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use garde::Validate;
use kernel::model::facility::Facility;
use kernel::model::id::{FacilityId, ReservationId};
use kernel::model::reservation::event::{
    BlockSlot, CancelReservation, ConfirmReservation, CreateReservation, UnblockSlot,
};
use kernel::model::reservation::Reservation;
use kernel::model::schedule::{effective_rule, generate_slots};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

use crate::extractor::AuthorizedUser;
use crate::model::reservation::{
    BlockSlotRequest, CancelReservationRequest, CancelledResponse, ConfirmReservationRequest,
    CreateReservationRequest, ReservationCreatedResponse, ReservationResponse,
};

// 予約を作成する。成立すると PENDING で返り、決済確定を待つ
pub async fn reserve_slot(
    user: AuthorizedUser,
    Path(facility_id): Path<FacilityId>,
    State(registry): State<AppRegistry>,
    Json(req): Json<CreateReservationRequest>,
) -> AppResult<impl IntoResponse> {
    req.validate(&())?;

    let facility = find_facility(&registry, facility_id).await?;
    let (start_time, end_time) =
        resolve_slot(&registry, &facility, req.date, req.start_time).await?;

    let reservation_id = registry
        .reservation_repository()
        .create(CreateReservation::new(
            facility_id,
            user.id(),
            req.date,
            start_time,
            end_time,
            Utc::now(),
        ))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReservationCreatedResponse {
            reservation_id,
            status: kernel::model::reservation::ReservationStatus::Pending.into(),
        }),
    ))
}

// 決済確定済みの参照で予約を確定する。同一参照の再送は成功として扱われる
pub async fn confirm_reservation(
    _user: AuthorizedUser,
    Path(reservation_id): Path<ReservationId>,
    State(registry): State<AppRegistry>,
    Json(req): Json<ConfirmReservationRequest>,
) -> AppResult<StatusCode> {
    req.validate(&())?;

    registry
        .reservation_repository()
        .confirm(ConfirmReservation::new(reservation_id, req.payment_ref))
        .await?;

    Ok(StatusCode::OK)
}

pub async fn cancel_reservation(
    user: AuthorizedUser,
    Path(reservation_id): Path<ReservationId>,
    State(registry): State<AppRegistry>,
    Json(req): Json<CancelReservationRequest>,
) -> AppResult<Json<CancelledResponse>> {
    req.validate(&())?;

    let reservation = registry
        .reservation_repository()
        .find_by_id(reservation_id)
        .await?;
    let facility = find_facility(&registry, reservation.facility_id).await?;
    let venue = registry
        .venue_repository()
        .find_by_id(facility.venue_id)
        .await?
        .ok_or_else(|| {
            AppError::EntityNotFound(format!(
                "会場（{}）が見つかりませんでした。",
                facility.venue_id
            ))
        })?;

    let now = Utc::now();
    registry
        .reservation_repository()
        .cancel(CancelReservation::new(
            reservation_id,
            user.id(),
            user.role,
            req.reason,
            now,
        ))
        .await?;

    // 猶予期限を過ぎたキャンセルは記録と通知のみ。違約金の計算は
    // 料金側の責務で、ここでは成立を妨げない
    let late_cancellation = is_late_cancellation(&reservation, &facility, venue.timezone, now);
    if late_cancellation {
        tracing::warn!(
            reservation_id = %reservation_id,
            facility_id = %facility.facility_id,
            "cancellation accepted after the grace deadline"
        );
    }

    Ok(Json(CancelledResponse {
        reservation_id,
        late_cancellation,
    }))
}

pub async fn show_reservation(
    _user: AuthorizedUser,
    Path(reservation_id): Path<ReservationId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<ReservationResponse>> {
    registry
        .reservation_repository()
        .find_by_id(reservation_id)
        .await
        .map(ReservationResponse::from)
        .map(Json)
}

// 運営者によるスロットのブロック
pub async fn block_slot(
    user: AuthorizedUser,
    Path(facility_id): Path<FacilityId>,
    State(registry): State<AppRegistry>,
    Json(req): Json<BlockSlotRequest>,
) -> AppResult<impl IntoResponse> {
    if !user.is_admin() {
        return Err(AppError::ForbiddenOperation);
    }
    req.validate(&())?;

    let facility = find_facility(&registry, facility_id).await?;
    let (start_time, end_time) =
        resolve_slot(&registry, &facility, req.date, req.start_time).await?;

    let reservation_id = registry
        .reservation_repository()
        .block(BlockSlot::new(
            facility_id,
            req.date,
            start_time,
            end_time,
            req.reason,
            Utc::now(),
        ))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReservationCreatedResponse {
            reservation_id,
            status: kernel::model::reservation::ReservationStatus::Blocked.into(),
        }),
    ))
}

pub async fn unblock_slot(
    user: AuthorizedUser,
    Path(reservation_id): Path<ReservationId>,
    State(registry): State<AppRegistry>,
) -> AppResult<StatusCode> {
    registry
        .reservation_repository()
        .unblock(UnblockSlot::new(reservation_id, user.role))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn find_facility(registry: &AppRegistry, facility_id: FacilityId) -> AppResult<Facility> {
    registry
        .facility_repository()
        .find_by_id(facility_id)
        .await?
        .ok_or_else(|| {
            AppError::EntityNotFound(format!("設備（{facility_id}）が見つかりませんでした。"))
        })
}

// 依頼された開始時刻を、その日の有効ルールが生成するスロットに突き合わせる。
// 終了時刻はルールの枠長から導出され、リクエスト側からは受け取らない
async fn resolve_slot(
    registry: &AppRegistry,
    facility: &Facility,
    date: NaiveDate,
    start_time: NaiveTime,
) -> AppResult<(NaiveTime, NaiveTime)> {
    let holidays = registry
        .venue_repository()
        .find_holidays(facility.venue_id)
        .await?;
    let versions = registry
        .schedule_rule_repository()
        .find_versions(facility.facility_id)
        .await?;

    let now = Utc::now();
    let Some(rule) = effective_rule(&versions, date, holidays.contains(&date), now) else {
        return Err(AppError::UnprocessableEntity(format!(
            "設備（{}）の {date} に予約枠はありません。",
            facility.facility_id
        )));
    };

    if !generate_slots(rule).contains(&start_time) {
        return Err(AppError::InvalidRange(format!(
            "開始時刻（{start_time}）に一致する予約枠がありません。"
        )));
    }

    let end_time = start_time
        .overflowing_add_signed(Duration::minutes(rule.slot_duration_minutes as i64))
        .0;
    Ok((start_time, end_time))
}

// 会場のタイムゾーンで予約開始の瞬間を求め、猶予期限と比較する
fn is_late_cancellation(
    reservation: &Reservation,
    facility: &Facility,
    timezone: Tz,
    now: DateTime<Utc>,
) -> bool {
    let local_start = reservation.reserved_on.and_time(reservation.start_time);
    let Some(start_at) = timezone.from_local_datetime(&local_start).earliest() else {
        return false;
    };
    let deadline = start_at.with_timezone(&Utc)
        - Duration::hours(facility.cancellation_deadline_hours as i64);
    now > deadline
}
