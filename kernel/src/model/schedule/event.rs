use chrono::{DateTime, NaiveTime, Utc};
use derive_new::new;

use crate::model::id::{FacilityId, RuleId};
use crate::model::schedule::DayKey;

// ルールの新設・変更。適用は submitted_at + 猶予窓から。
#[derive(Debug, new)]
pub struct UpsertScheduleRule {
    pub facility_id: FacilityId,
    pub day_key: DayKey,
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
    pub slot_duration_minutes: i32,
    pub submitted_at: DateTime<Utc>,
}

// ルールの削除。墓標バージョンの追記として扱われ、同じ猶予窓に従う。
#[derive(Debug, new)]
pub struct DeleteScheduleRule {
    pub rule_id: RuleId,
    pub submitted_at: DateTime<Utc>,
}
