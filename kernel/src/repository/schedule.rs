use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::error::AppResult;

use crate::model::id::FacilityId;
use crate::model::schedule::event::{DeleteScheduleRule, UpsertScheduleRule};
use crate::model::schedule::ScheduleRule;

#[async_trait]
pub trait ScheduleRuleRepository: Send + Sync {
    // ルールの全履歴バージョンを effective_from 昇順で取得する
    async fn find_versions(&self, facility_id: FacilityId) -> AppResult<Vec<ScheduleRule>>;
    // ルールを新設・変更する。適用開始時刻を返す
    async fn upsert(&self, event: UpsertScheduleRule) -> AppResult<DateTime<Utc>>;
    // ルールを削除する（墓標バージョンの追記）。適用開始時刻を返す
    async fn delete(&self, event: DeleteScheduleRule) -> AppResult<DateTime<Utc>>;
}
