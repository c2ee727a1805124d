use chrono::{DateTime, NaiveTime, Utc};
use kernel::model::id::{FacilityId, RuleId};
use kernel::model::schedule::{DayKey, ScheduleRule};
use shared::error::AppError;

#[derive(sqlx::FromRow)]
pub struct ScheduleRuleRow {
    pub rule_id: RuleId,
    pub facility_id: FacilityId,
    pub day_key: String,
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
    pub slot_duration_minutes: i32,
    pub effective_from: DateTime<Utc>,
    pub is_delete: bool,
}

impl TryFrom<ScheduleRuleRow> for ScheduleRule {
    type Error = AppError;

    fn try_from(value: ScheduleRuleRow) -> Result<Self, Self::Error> {
        let ScheduleRuleRow {
            rule_id,
            facility_id,
            day_key,
            opening_time,
            closing_time,
            slot_duration_minutes,
            effective_from,
            is_delete,
        } = value;
        let day_key = day_key
            .parse::<DayKey>()
            .map_err(|e| AppError::ConversionEntityError(e.to_string()))?;
        Ok(ScheduleRule {
            rule_id,
            facility_id,
            day_key,
            opening_time,
            closing_time,
            slot_duration_minutes,
            effective_from,
            is_delete,
        })
    }
}
