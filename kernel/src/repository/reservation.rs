use async_trait::async_trait;
use chrono::NaiveDate;
use shared::error::AppResult;

use crate::model::id::{FacilityId, ReservationId};
use crate::model::payment::Payment;
use crate::model::reservation::{
    event::{BlockSlot, CancelReservation, ConfirmReservation, CreateReservation, UnblockSlot},
    Occupant, Reservation,
};

// 予約・ブロック状態を変更できるのはこのリポジトリだけ
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    // 予約を作成する。競合チェックと挿入は単一の原子的操作で行う
    async fn create(&self, event: CreateReservation) -> AppResult<ReservationId>;
    // 管理ブロックを作成する。競合規則は予約作成と同じ
    async fn block(&self, event: BlockSlot) -> AppResult<ReservationId>;
    // PENDING → CONFIRMED。同一 payment_ref の再確定は成功扱いの no-op
    async fn confirm(&self, event: ConfirmReservation) -> AppResult<()>;
    // PENDING | CONFIRMED → CANCELLED
    async fn cancel(&self, event: CancelReservation) -> AppResult<()>;
    // BLOCKED 行の物理削除。運営者のみ
    async fn unblock(&self, event: UnblockSlot) -> AppResult<()>;
    async fn find_by_id(&self, reservation_id: ReservationId) -> AppResult<Reservation>;
    // 指定日の占有（PENDING / CONFIRMED / BLOCKED）を取得する。
    // ライフサイクル側の書き込みを同一リクエスト内で即座に反映すること
    async fn find_occupants(
        &self,
        facility_id: FacilityId,
        reserved_on: NaiveDate,
    ) -> AppResult<Vec<Occupant>>;
    // 予約に紐づく決済記録を取得する
    async fn find_payment(&self, reservation_id: ReservationId) -> AppResult<Option<Payment>>;
}
