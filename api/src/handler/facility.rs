use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use kernel::model::schedule::current_rules;
use registry::AppRegistry;
use shared::error::AppResult;

use crate::extractor::AuthorizedUser;
use crate::model::facility::{FacilitiesResponse, FacilityListQuery, FacilityResponse};
use crate::model::schedule::ScheduleRuleResponse;

// 設備一覧を現在有効なルールと一緒に返す
pub async fn show_facility_list(
    _user: AuthorizedUser,
    Query(query): Query<FacilityListQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<FacilitiesResponse>> {
    let facilities = registry
        .facility_repository()
        .find_all(query.location_id)
        .await?;

    let now = Utc::now();
    let mut items = Vec::with_capacity(facilities.len());
    for facility in facilities {
        let versions = registry
            .schedule_rule_repository()
            .find_versions(facility.facility_id)
            .await?;
        let rules = current_rules(&versions, now)
            .into_iter()
            .map(ScheduleRuleResponse::from)
            .collect();
        items.push(FacilityResponse::new(facility, rules));
    }

    Ok(Json(FacilitiesResponse { items }))
}
