use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use derive_new::new;
use kernel::model::id::{FacilityId, RuleId, VenueId};
use kernel::model::schedule::{
    event::{DeleteScheduleRule, UpsertScheduleRule},
    validate_rule_window, ScheduleRule, RULE_PROPAGATION_DAYS,
};
use kernel::model::venue::VenueSchedule;
use kernel::repository::schedule::ScheduleRuleRepository;
use shared::error::{AppError, AppResult};

use crate::database::model::schedule::ScheduleRuleRow;
use crate::database::model::venue::VenueScheduleRow;
use crate::database::ConnectionPool;

#[derive(new)]
pub struct ScheduleRuleRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl ScheduleRuleRepository for ScheduleRuleRepositoryImpl {
    async fn find_versions(&self, facility_id: FacilityId) -> AppResult<Vec<ScheduleRule>> {
        let rows: Vec<ScheduleRuleRow> = sqlx::query_as(
            r#"
                SELECT rule_id, facility_id, day_key, opening_time, closing_time,
                       slot_duration_minutes, effective_from, is_delete
                FROM schedule_rules
                WHERE facility_id = $1
                ORDER BY effective_from ASC
            "#,
        )
        .bind(facility_id)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        rows.into_iter().map(ScheduleRule::try_from).collect()
    }

    // ルールの新設・変更操作を行う
    async fn upsert(&self, event: UpsertScheduleRule) -> AppResult<DateTime<Utc>> {
        let mut tx = self.db.begin().await?;

        // 会場の営業時間を読み、時間窓の検証を通してから履歴へ追記する
        let venue_id = self.venue_of(&mut tx, event.facility_id).await?;
        let venue_schedules = self.venue_schedules(&mut tx, venue_id).await?;
        validate_rule_window(
            event.day_key,
            event.opening_time,
            event.closing_time,
            event.slot_duration_minutes,
            &venue_schedules,
        )?;

        // 書き込みは即時には効かない。適用は提出時刻 + 猶予窓から
        let effective_from = event.submitted_at + Duration::days(RULE_PROPAGATION_DAYS);
        let res = sqlx::query(
            r#"
                INSERT INTO schedule_rules
                (rule_id, facility_id, day_key, opening_time, closing_time,
                slot_duration_minutes, effective_from, is_delete)
                VALUES ($1, $2, $3, $4, $5, $6, $7, FALSE)
            "#,
        )
        .bind(RuleId::new())
        .bind(event.facility_id)
        .bind(event.day_key.to_string())
        .bind(event.opening_time)
        .bind(event.closing_time)
        .bind(event.slot_duration_minutes)
        .bind(effective_from)
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(
                "No schedule rule version has been created".into(),
            ));
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(effective_from)
    }

    // ルール削除操作を行う。既存バージョンは残したまま墓標を追記する
    async fn delete(&self, event: DeleteScheduleRule) -> AppResult<DateTime<Utc>> {
        let mut tx = self.db.begin().await?;

        let row: Option<ScheduleRuleRow> = sqlx::query_as(
            r#"
                SELECT rule_id, facility_id, day_key, opening_time, closing_time,
                       slot_duration_minutes, effective_from, is_delete
                FROM schedule_rules
                WHERE rule_id = $1
            "#,
        )
        .bind(event.rule_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        let Some(row) = row else {
            return Err(AppError::EntityNotFound(format!(
                "スケジュールルール（{}）が見つかりませんでした。",
                event.rule_id
            )));
        };
        let rule = ScheduleRule::try_from(row)?;

        let effective_from = event.submitted_at + Duration::days(RULE_PROPAGATION_DAYS);
        let res = sqlx::query(
            r#"
                INSERT INTO schedule_rules
                (rule_id, facility_id, day_key, opening_time, closing_time,
                slot_duration_minutes, effective_from, is_delete)
                VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE)
            "#,
        )
        .bind(RuleId::new())
        .bind(rule.facility_id)
        .bind(rule.day_key.to_string())
        .bind(rule.opening_time)
        .bind(rule.closing_time)
        .bind(rule.slot_duration_minutes)
        .bind(effective_from)
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            return Err(AppError::NoRowsAffectedError(
                "No schedule rule tombstone has been created".into(),
            ));
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(effective_from)
    }
}

impl ScheduleRuleRepositoryImpl {
    async fn venue_of(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        facility_id: FacilityId,
    ) -> AppResult<VenueId> {
        let venue: Option<(VenueId,)> =
            sqlx::query_as("SELECT venue_id FROM facilities WHERE facility_id = $1")
                .bind(facility_id)
                .fetch_optional(&mut **tx)
                .await
                .map_err(AppError::SpecificOperationError)?;

        venue.map(|(venue_id,)| venue_id).ok_or_else(|| {
            AppError::EntityNotFound(format!("設備（{facility_id}）が見つかりませんでした。"))
        })
    }

    async fn venue_schedules(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        venue_id: VenueId,
    ) -> AppResult<Vec<VenueSchedule>> {
        let rows: Vec<VenueScheduleRow> = sqlx::query_as(
            r#"
                SELECT venue_id, day_of_week, is_open, opening_time, closing_time
                FROM venue_schedules
                WHERE venue_id = $1
                ORDER BY day_of_week ASC
            "#,
        )
        .bind(venue_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(rows.into_iter().map(VenueSchedule::from).collect())
    }
}
