use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use kernel::model::id::FacilityId;
use kernel::model::schedule::{effective_rule, generate_slots};
use kernel::model::slot::classify;
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

use crate::extractor::AuthorizedUser;
use crate::model::availability::{AvailabilityQuery, AvailabilityResponse};

// 指定日の空き状況を返す読み取り経路。
// ルール解決 → 枠生成 → 占有情報との突き合わせを毎回やり直し、
// この層は状態を持たない。
pub async fn query_availability(
    user: AuthorizedUser,
    Path(facility_id): Path<FacilityId>,
    Query(query): Query<AvailabilityQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<AvailabilityResponse>> {
    let facility = registry
        .facility_repository()
        .find_by_id(facility_id)
        .await?
        .ok_or_else(|| {
            AppError::EntityNotFound(format!("設備（{facility_id}）が見つかりませんでした。"))
        })?;

    let holidays = registry
        .venue_repository()
        .find_holidays(facility.venue_id)
        .await?;
    let versions = registry
        .schedule_rule_repository()
        .find_versions(facility_id)
        .await?;

    let now = Utc::now();
    let slots = match effective_rule(&versions, query.date, holidays.contains(&query.date), now) {
        // その日に適用されるルールが無ければ休業扱い
        None => Vec::new(),
        Some(rule) => {
            let occupants = registry
                .reservation_repository()
                .find_occupants(facility_id, query.date)
                .await?;
            classify(&generate_slots(rule), rule.slot_duration_minutes, &occupants)
        }
    };

    Ok(Json(AvailabilityResponse::new(
        facility_id,
        query.date,
        slots,
        user.is_admin(),
    )))
}
