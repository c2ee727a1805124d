use async_trait::async_trait;
use derive_new::new;
use kernel::model::id::{FacilityId, PaymentId, ReservationId};
use kernel::model::payment::Payment;
use kernel::model::reservation::{
    event::{BlockSlot, CancelReservation, ConfirmReservation, CreateReservation, UnblockSlot},
    Occupant, Reservation, ReservationStatus,
};
use kernel::model::role::Role;
use kernel::repository::reservation::ReservationRepository;
use shared::error::{AppError, AppResult};

use crate::database::model::reservation::{OccupantRow, PaymentRow, ReservationRow};
use crate::database::ConnectionPool;

#[derive(new)]
pub struct ReservationRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl ReservationRepository for ReservationRepositoryImpl {
    // 予約操作を行う
    async fn create(&self, event: CreateReservation) -> AppResult<ReservationId> {
        let mut tx = self.db.begin().await?;

        // トランザクション分離レベルを SERIALIZABLE に設定する
        self.set_transaction_serializable(&mut tx).await?;

        // 事前のチェックとして、指定の設備が存在し利用可能かを調べる
        self.ensure_facility_available(&mut tx, event.facility_id)
            .await?;

        // 競合チェックは INSERT と分離しない。有効状態の行に張られた
        // 部分一意インデックス (facility_id, reserved_on, start_time) が
        // 同時リクエストの敗者を一意制約違反として弾く
        let reservation_id = ReservationId::new();
        let res = sqlx::query(
            r#"
                INSERT INTO reservations
                (reservation_id, facility_id, user_id, reserved_on,
                start_time, end_time, status, reserved_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(reservation_id)
        .bind(event.facility_id)
        .bind(event.reserved_by)
        .bind(event.reserved_on)
        .bind(event.start_time)
        .bind(event.end_time)
        .bind(ReservationStatus::Pending.to_string())
        .bind(event.reserved_at)
        .execute(&mut *tx)
        .await;

        match res {
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(AppError::SlotConflict(format!(
                    "設備（{}）の {} {} はすでに予約されています。",
                    event.facility_id, event.reserved_on, event.start_time
                )));
            }
            Err(e) => return Err(AppError::SpecificOperationError(e)),
            Ok(res) if res.rows_affected() < 1 => {
                return Err(AppError::NoRowsAffectedError(
                    "No reservation record has been created".into(),
                ));
            }
            Ok(_) => {}
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(reservation_id)
    }

    // 管理ブロック操作を行う
    async fn block(&self, event: BlockSlot) -> AppResult<ReservationId> {
        if event.reason.trim().is_empty() {
            return Err(AppError::ReasonRequired);
        }

        let mut tx = self.db.begin().await?;
        self.set_transaction_serializable(&mut tx).await?;
        self.ensure_facility_available(&mut tx, event.facility_id)
            .await?;

        // ブロックは利用者を持たない予約行。競合規則は予約作成と同一
        let reservation_id = ReservationId::new();
        let res = sqlx::query(
            r#"
                INSERT INTO reservations
                (reservation_id, facility_id, user_id, reserved_on,
                start_time, end_time, status, reason, reserved_at)
                VALUES ($1, $2, NULL, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(reservation_id)
        .bind(event.facility_id)
        .bind(event.reserved_on)
        .bind(event.start_time)
        .bind(event.end_time)
        .bind(ReservationStatus::Blocked.to_string())
        .bind(&event.reason)
        .bind(event.blocked_at)
        .execute(&mut *tx)
        .await;

        match res {
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(AppError::SlotConflict(format!(
                    "設備（{}）の {} {} はすでに占有されています。",
                    event.facility_id, event.reserved_on, event.start_time
                )));
            }
            Err(e) => return Err(AppError::SpecificOperationError(e)),
            Ok(res) if res.rows_affected() < 1 => {
                return Err(AppError::NoRowsAffectedError(
                    "No block record has been created".into(),
                ));
            }
            Ok(_) => {}
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(reservation_id)
    }

    // 予約確定操作を行う
    async fn confirm(&self, event: ConfirmReservation) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        self.set_transaction_serializable(&mut tx).await?;

        // 現在状態を前提条件とする楽観的な更新。PENDING の行だけが動く
        let updated = sqlx::query(
            r#"
                UPDATE reservations
                SET status = $2, payment_ref = $3
                WHERE reservation_id = $1 AND status = $4
            "#,
        )
        .bind(event.reservation_id)
        .bind(ReservationStatus::Confirmed.to_string())
        .bind(&event.payment_ref)
        .bind(ReservationStatus::Pending.to_string())
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        if updated.rows_affected() == 1 {
            // 設備の固定料金で決済記録を添付する
            let res = sqlx::query(
                r#"
                    INSERT INTO payments
                    (payment_id, reservation_id, amount, status, external_ref)
                    SELECT $1, r.reservation_id, f.price, $3, $4
                    FROM reservations AS r
                    INNER JOIN facilities AS f ON r.facility_id = f.facility_id
                    WHERE r.reservation_id = $2
                "#,
            )
            .bind(PaymentId::new())
            .bind(event.reservation_id)
            .bind(kernel::model::payment::PaymentStatus::Paid.to_string())
            .bind(&event.payment_ref)
            .execute(&mut *tx)
            .await
            .map_err(AppError::SpecificOperationError)?;

            if res.rows_affected() < 1 {
                return Err(AppError::NoRowsAffectedError(
                    "No payment record has been created".into(),
                ));
            }

            tx.commit().await.map_err(AppError::TransactionError)?;
            return Ok(());
        }

        // 行が動かなかった場合のみ現在状態を読み直して理由を判定する
        let row: Option<ReservationRow> = sqlx::query_as(
            r#"
                SELECT reservation_id, facility_id, user_id, reserved_on,
                       start_time, end_time, status, reason, payment_ref,
                       reserved_at, cancelled_at
                FROM reservations
                WHERE reservation_id = $1
            "#,
        )
        .bind(event.reservation_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        let Some(row) = row else {
            return Err(AppError::EntityNotFound(format!(
                "予約（{}）が見つかりませんでした。",
                event.reservation_id
            )));
        };
        let reservation = Reservation::try_from(row)?;

        // 決済コールバックは再送されうるため、同一 payment_ref での
        // 再確定は成功として扱う（決済記録は増やさない）
        if reservation.status == ReservationStatus::Confirmed
            && reservation.payment_ref.as_deref() == Some(event.payment_ref.as_str())
        {
            return Ok(());
        }

        Err(AppError::NotPending(format!(
            "予約（{}）は PENDING ではないため確定できません。",
            event.reservation_id
        )))
    }

    // キャンセル操作を行う
    async fn cancel(&self, event: CancelReservation) -> AppResult<()> {
        if event.reason.trim().is_empty() {
            return Err(AppError::ReasonRequired);
        }

        let mut tx = self.db.begin().await?;
        self.set_transaction_serializable(&mut tx).await?;

        let row: Option<ReservationRow> = sqlx::query_as(
            r#"
                SELECT reservation_id, facility_id, user_id, reserved_on,
                       start_time, end_time, status, reason, payment_ref,
                       reserved_at, cancelled_at
                FROM reservations
                WHERE reservation_id = $1
            "#,
        )
        .bind(event.reservation_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        let Some(row) = row else {
            return Err(AppError::EntityNotFound(format!(
                "予約（{}）が見つかりませんでした。",
                event.reservation_id
            )));
        };
        let reservation = Reservation::try_from(row)?;

        // キャンセルできるのは予約の所有者か運営者のみ
        if event.actor_role != Role::Admin && reservation.reserved_by != Some(event.actor_id) {
            return Err(AppError::ForbiddenOperation);
        }

        // 現在状態を前提条件とする楽観的な更新
        let updated = sqlx::query(
            r#"
                UPDATE reservations
                SET status = $2, reason = $3, cancelled_at = $4
                WHERE reservation_id = $1 AND status IN ($5, $6)
            "#,
        )
        .bind(event.reservation_id)
        .bind(ReservationStatus::Cancelled.to_string())
        .bind(&event.reason)
        .bind(event.cancelled_at)
        .bind(ReservationStatus::Pending.to_string())
        .bind(ReservationStatus::Confirmed.to_string())
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        if updated.rows_affected() < 1 {
            return Err(AppError::NotCancellable(format!(
                "予約（{}）はキャンセルできない状態です。",
                event.reservation_id
            )));
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(())
    }

    // ブロック解除操作を行う。該当行は物理削除する
    async fn unblock(&self, event: UnblockSlot) -> AppResult<()> {
        if event.actor_role != Role::Admin {
            return Err(AppError::ForbiddenOperation);
        }

        let mut tx = self.db.begin().await?;
        self.set_transaction_serializable(&mut tx).await?;

        let deleted = sqlx::query(
            r#"
                DELETE FROM reservations
                WHERE reservation_id = $1 AND status = $2
            "#,
        )
        .bind(event.reservation_id)
        .bind(ReservationStatus::Blocked.to_string())
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        if deleted.rows_affected() < 1 {
            // 行が消えなかった理由を区別して返す
            let exists: Option<(ReservationId,)> =
                sqlx::query_as("SELECT reservation_id FROM reservations WHERE reservation_id = $1")
                    .bind(event.reservation_id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(AppError::SpecificOperationError)?;
            return match exists {
                None => Err(AppError::EntityNotFound(format!(
                    "予約（{}）が見つかりませんでした。",
                    event.reservation_id
                ))),
                Some(_) => Err(AppError::NotCancellable(format!(
                    "予約（{}）はブロックではないため解除できません。",
                    event.reservation_id
                ))),
            };
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(())
    }

    async fn find_by_id(&self, reservation_id: ReservationId) -> AppResult<Reservation> {
        let row: ReservationRow = sqlx::query_as(
            r#"
                SELECT reservation_id, facility_id, user_id, reserved_on,
                       start_time, end_time, status, reason, payment_ref,
                       reserved_at, cancelled_at
                FROM reservations
                WHERE reservation_id = $1
            "#,
        )
        .bind(reservation_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?
        .ok_or_else(|| {
            AppError::EntityNotFound(format!("予約（{reservation_id}）が見つかりませんでした。"))
        })?;

        Reservation::try_from(row)
    }

    // 指定日の占有情報を取得する。予約テーブルそのものが唯一の情報源で、
    // キャッシュは挟まない
    async fn find_occupants(
        &self,
        facility_id: FacilityId,
        reserved_on: chrono::NaiveDate,
    ) -> AppResult<Vec<Occupant>> {
        let rows: Vec<OccupantRow> = sqlx::query_as(
            r#"
                SELECT start_time, status, reason, user_id
                FROM reservations
                WHERE facility_id = $1
                  AND reserved_on = $2
                  AND status IN ($3, $4, $5)
                ORDER BY start_time ASC
            "#,
        )
        .bind(facility_id)
        .bind(reserved_on)
        .bind(ReservationStatus::Pending.to_string())
        .bind(ReservationStatus::Confirmed.to_string())
        .bind(ReservationStatus::Blocked.to_string())
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        rows.into_iter().map(Occupant::try_from).collect()
    }

    async fn find_payment(&self, reservation_id: ReservationId) -> AppResult<Option<Payment>> {
        let row: Option<PaymentRow> = sqlx::query_as(
            r#"
                SELECT payment_id, reservation_id, amount, status, external_ref
                FROM payments
                WHERE reservation_id = $1
            "#,
        )
        .bind(reservation_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        row.map(Payment::try_from).transpose()
    }
}

impl ReservationRepositoryImpl {
    // create / block / confirm / cancel でのトランザクションを利用するにあたり
    // トランザクション分離レベルを SERIALIZABLE にするために内部的に使うメソッド
    async fn set_transaction_serializable(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> AppResult<()> {
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut **tx)
            .await
            .map_err(AppError::SpecificOperationError)?;
        Ok(())
    }

    // 設備が存在し、利用可能であることを確認する
    async fn ensure_facility_available(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        facility_id: FacilityId,
    ) -> AppResult<()> {
        let facility: Option<(FacilityId, bool)> =
            sqlx::query_as("SELECT facility_id, is_active FROM facilities WHERE facility_id = $1")
                .bind(facility_id)
                .fetch_optional(&mut **tx)
                .await
                .map_err(AppError::SpecificOperationError)?;

        match facility {
            None => Err(AppError::EntityNotFound(format!(
                "設備（{facility_id}）が見つかりませんでした。"
            ))),
            Some((_, false)) => Err(AppError::UnprocessableEntity(format!(
                "設備（{facility_id}）は現在利用できません。"
            ))),
            Some((_, true)) => Ok(()),
        }
    }
}
