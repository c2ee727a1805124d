use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use garde::Validate;
use kernel::model::id::{FacilityId, RuleId};
use kernel::model::schedule::event::{DeleteScheduleRule, UpsertScheduleRule};
use registry::AppRegistry;
use shared::error::{AppError, AppResult};

use crate::extractor::AuthorizedUser;
use crate::model::schedule::{RuleEffectiveResponse, UpsertScheduleRuleRequest};

// ルールの新設・変更。適用開始は猶予窓を経た後になる
pub async fn upsert_schedule_rule(
    user: AuthorizedUser,
    Path(facility_id): Path<FacilityId>,
    State(registry): State<AppRegistry>,
    Json(req): Json<UpsertScheduleRuleRequest>,
) -> AppResult<Json<RuleEffectiveResponse>> {
    if !user.is_admin() {
        return Err(AppError::ForbiddenOperation);
    }
    req.validate(&())?;

    let effective_from = registry
        .schedule_rule_repository()
        .upsert(UpsertScheduleRule::new(
            facility_id,
            req.day_key.into(),
            req.opening_time,
            req.closing_time,
            req.slot_duration_minutes,
            Utc::now(),
        ))
        .await?;

    Ok(Json(RuleEffectiveResponse { effective_from }))
}

pub async fn delete_schedule_rule(
    user: AuthorizedUser,
    Path(rule_id): Path<RuleId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<RuleEffectiveResponse>> {
    if !user.is_admin() {
        return Err(AppError::ForbiddenOperation);
    }

    let effective_from = registry
        .schedule_rule_repository()
        .delete(DeleteScheduleRule::new(rule_id, Utc::now()))
        .await?;

    Ok(Json(RuleEffectiveResponse { effective_from }))
}
