use chrono::{DateTime, NaiveTime, Utc};
use garde::Validate;
use kernel::model::id::RuleId;
use kernel::model::schedule::{DayKey, ScheduleRule};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DayKeyName {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
    Holiday,
    All,
}

impl From<DayKey> for DayKeyName {
    fn from(value: DayKey) -> Self {
        match value {
            DayKey::Monday => Self::Monday,
            DayKey::Tuesday => Self::Tuesday,
            DayKey::Wednesday => Self::Wednesday,
            DayKey::Thursday => Self::Thursday,
            DayKey::Friday => Self::Friday,
            DayKey::Saturday => Self::Saturday,
            DayKey::Sunday => Self::Sunday,
            DayKey::Holiday => Self::Holiday,
            DayKey::All => Self::All,
        }
    }
}

impl From<DayKeyName> for DayKey {
    fn from(value: DayKeyName) -> Self {
        match value {
            DayKeyName::Monday => Self::Monday,
            DayKeyName::Tuesday => Self::Tuesday,
            DayKeyName::Wednesday => Self::Wednesday,
            DayKeyName::Thursday => Self::Thursday,
            DayKeyName::Friday => Self::Friday,
            DayKeyName::Saturday => Self::Saturday,
            DayKeyName::Sunday => Self::Sunday,
            DayKeyName::Holiday => Self::Holiday,
            DayKeyName::All => Self::All,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertScheduleRuleRequest {
    #[garde(skip)]
    pub day_key: DayKeyName,
    #[garde(skip)]
    pub opening_time: NaiveTime,
    #[garde(skip)]
    pub closing_time: NaiveTime,
    #[garde(range(min = 1))]
    pub slot_duration_minutes: i32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRuleResponse {
    pub rule_id: RuleId,
    pub day_key: DayKeyName,
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
    pub slot_duration_minutes: i32,
    pub effective_from: DateTime<Utc>,
}

impl From<&ScheduleRule> for ScheduleRuleResponse {
    fn from(value: &ScheduleRule) -> Self {
        Self {
            rule_id: value.rule_id,
            day_key: value.day_key.into(),
            opening_time: value.opening_time,
            closing_time: value.closing_time,
            slot_duration_minutes: value.slot_duration_minutes,
            effective_from: value.effective_from,
        }
    }
}

// ルール書き込みの応答。猶予窓を経た適用開始時刻を知らせる
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleEffectiveResponse {
    pub effective_from: DateTime<Utc>,
}
