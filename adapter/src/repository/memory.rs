use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use derive_new::new;
use kernel::model::facility::Facility;
use kernel::model::id::{FacilityId, PaymentId, ReservationId, RuleId, VenueId};
use kernel::model::payment::{Payment, PaymentStatus};
use kernel::model::reservation::{
    event::{BlockSlot, CancelReservation, ConfirmReservation, CreateReservation, UnblockSlot},
    Occupant, Reservation, ReservationStatus,
};
use kernel::model::role::Role;
use kernel::model::schedule::{
    event::{DeleteScheduleRule, UpsertScheduleRule},
    validate_rule_window, ScheduleRule, RULE_PROPAGATION_DAYS,
};
use kernel::model::venue::{Venue, VenueSchedule};
use kernel::repository::facility::FacilityRepository;
use kernel::repository::reservation::ReservationRepository;
use kernel::repository::schedule::ScheduleRuleRepository;
use kernel::repository::venue::VenueRepository;
use shared::error::{AppError, AppResult};

#[derive(Default)]
struct StoreState {
    venues: HashMap<VenueId, Venue>,
    venue_schedules: Vec<VenueSchedule>,
    venue_holidays: Vec<(VenueId, NaiveDate)>,
    facilities: HashMap<FacilityId, Facility>,
    rule_versions: Vec<ScheduleRule>,
    reservations: HashMap<ReservationId, Reservation>,
    payments: Vec<Payment>,
}

// リポジトリトレイト群のインメモリ実装が共有する単一ストア。
// Postgres 実装と同じ検証・競合規則を単一 Mutex の臨界区域内で再現する。
// 予約テーブルに相当する reservations がそのまま占有照会の情報源になるため、
// ライフサイクル側の書き込みは同一リクエスト内で即座に読み出しへ反映される。
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_venue(
        &self,
        venue: Venue,
        schedules: Vec<VenueSchedule>,
        holidays: Vec<NaiveDate>,
    ) {
        let mut state = self.lock();
        let venue_id = venue.venue_id;
        state.venues.insert(venue_id, venue);
        state.venue_schedules.extend(schedules);
        state
            .venue_holidays
            .extend(holidays.into_iter().map(|d| (venue_id, d)));
    }

    pub fn add_facility(&self, facility: Facility) {
        self.lock().facilities.insert(facility.facility_id, facility);
    }

    // 猶予窓を経由せずに履歴へバージョンを直接投入するテスト用フック
    pub fn seed_rule(&self, rule: ScheduleRule) {
        self.lock().rule_versions.push(rule);
    }
}

#[derive(new)]
pub struct InMemoryFacilityRepository {
    store: Arc<InMemoryStore>,
}

#[async_trait]
impl FacilityRepository for InMemoryFacilityRepository {
    async fn find_all(&self, venue_id: Option<VenueId>) -> AppResult<Vec<Facility>> {
        let state = self.store.lock();
        let mut facilities: Vec<Facility> = state
            .facilities
            .values()
            .filter(|f| venue_id.map_or(true, |v| f.venue_id == v))
            .cloned()
            .collect();
        facilities.sort_by(|a, b| a.facility_name.cmp(&b.facility_name));
        Ok(facilities)
    }

    async fn find_by_id(&self, facility_id: FacilityId) -> AppResult<Option<Facility>> {
        Ok(self.store.lock().facilities.get(&facility_id).cloned())
    }
}

#[derive(new)]
pub struct InMemoryVenueRepository {
    store: Arc<InMemoryStore>,
}

#[async_trait]
impl VenueRepository for InMemoryVenueRepository {
    async fn find_by_id(&self, venue_id: VenueId) -> AppResult<Option<Venue>> {
        Ok(self.store.lock().venues.get(&venue_id).cloned())
    }

    async fn find_schedule(&self, venue_id: VenueId) -> AppResult<Vec<VenueSchedule>> {
        Ok(self
            .store
            .lock()
            .venue_schedules
            .iter()
            .filter(|s| s.venue_id == venue_id)
            .cloned()
            .collect())
    }

    async fn find_holidays(&self, venue_id: VenueId) -> AppResult<Vec<NaiveDate>> {
        Ok(self
            .store
            .lock()
            .venue_holidays
            .iter()
            .filter(|(v, _)| *v == venue_id)
            .map(|(_, d)| *d)
            .collect())
    }
}

#[derive(new)]
pub struct InMemoryScheduleRuleRepository {
    store: Arc<InMemoryStore>,
}

#[async_trait]
impl ScheduleRuleRepository for InMemoryScheduleRuleRepository {
    async fn find_versions(&self, facility_id: FacilityId) -> AppResult<Vec<ScheduleRule>> {
        let state = self.store.lock();
        let mut versions: Vec<ScheduleRule> = state
            .rule_versions
            .iter()
            .filter(|r| r.facility_id == facility_id)
            .cloned()
            .collect();
        versions.sort_by_key(|r| r.effective_from);
        Ok(versions)
    }

    async fn upsert(&self, event: UpsertScheduleRule) -> AppResult<chrono::DateTime<chrono::Utc>> {
        let mut state = self.store.lock();
        let facility = state.facilities.get(&event.facility_id).ok_or_else(|| {
            AppError::EntityNotFound(format!(
                "設備（{}）が見つかりませんでした。",
                event.facility_id
            ))
        })?;
        let venue_id = facility.venue_id;
        let venue_schedules: Vec<VenueSchedule> = state
            .venue_schedules
            .iter()
            .filter(|s| s.venue_id == venue_id)
            .cloned()
            .collect();
        validate_rule_window(
            event.day_key,
            event.opening_time,
            event.closing_time,
            event.slot_duration_minutes,
            &venue_schedules,
        )?;

        let effective_from = event.submitted_at + Duration::days(RULE_PROPAGATION_DAYS);
        state.rule_versions.push(ScheduleRule {
            rule_id: RuleId::new(),
            facility_id: event.facility_id,
            day_key: event.day_key,
            opening_time: event.opening_time,
            closing_time: event.closing_time,
            slot_duration_minutes: event.slot_duration_minutes,
            effective_from,
            is_delete: false,
        });
        Ok(effective_from)
    }

    async fn delete(&self, event: DeleteScheduleRule) -> AppResult<chrono::DateTime<chrono::Utc>> {
        let mut state = self.store.lock();
        let rule = state
            .rule_versions
            .iter()
            .find(|r| r.rule_id == event.rule_id)
            .cloned()
            .ok_or_else(|| {
                AppError::EntityNotFound(format!(
                    "スケジュールルール（{}）が見つかりませんでした。",
                    event.rule_id
                ))
            })?;

        let effective_from = event.submitted_at + Duration::days(RULE_PROPAGATION_DAYS);
        state.rule_versions.push(ScheduleRule {
            rule_id: RuleId::new(),
            effective_from,
            is_delete: true,
            ..rule
        });
        Ok(effective_from)
    }
}

#[derive(new)]
pub struct InMemoryReservationRepository {
    store: Arc<InMemoryStore>,
}

#[async_trait]
impl ReservationRepository for InMemoryReservationRepository {
    async fn create(&self, event: CreateReservation) -> AppResult<ReservationId> {
        // 競合チェックと挿入をひとつのロック区間で行う
        let mut state = self.store.lock();
        ensure_facility_available(&state, event.facility_id)?;
        ensure_slot_free(&state, event.facility_id, event.reserved_on, event.start_time)?;

        let reservation_id = ReservationId::new();
        state.reservations.insert(
            reservation_id,
            Reservation {
                reservation_id,
                facility_id: event.facility_id,
                reserved_by: Some(event.reserved_by),
                reserved_on: event.reserved_on,
                start_time: event.start_time,
                end_time: event.end_time,
                status: ReservationStatus::Pending,
                reason: None,
                payment_ref: None,
                reserved_at: event.reserved_at,
                cancelled_at: None,
            },
        );
        Ok(reservation_id)
    }

    async fn block(&self, event: BlockSlot) -> AppResult<ReservationId> {
        if event.reason.trim().is_empty() {
            return Err(AppError::ReasonRequired);
        }

        let mut state = self.store.lock();
        ensure_facility_available(&state, event.facility_id)?;
        ensure_slot_free(&state, event.facility_id, event.reserved_on, event.start_time)?;

        let reservation_id = ReservationId::new();
        state.reservations.insert(
            reservation_id,
            Reservation {
                reservation_id,
                facility_id: event.facility_id,
                reserved_by: None,
                reserved_on: event.reserved_on,
                start_time: event.start_time,
                end_time: event.end_time,
                status: ReservationStatus::Blocked,
                reason: Some(event.reason),
                payment_ref: None,
                reserved_at: event.blocked_at,
                cancelled_at: None,
            },
        );
        Ok(reservation_id)
    }

    async fn confirm(&self, event: ConfirmReservation) -> AppResult<()> {
        let mut state = self.store.lock();
        let Some(reservation) = state.reservations.get(&event.reservation_id).cloned() else {
            return Err(AppError::EntityNotFound(format!(
                "予約（{}）が見つかりませんでした。",
                event.reservation_id
            )));
        };

        match reservation.status {
            ReservationStatus::Pending => {
                let amount = state
                    .facilities
                    .get(&reservation.facility_id)
                    .map(|f| f.price)
                    .unwrap_or_default();
                if let Some(updated) = state.reservations.get_mut(&event.reservation_id) {
                    updated.status = ReservationStatus::Confirmed;
                    updated.payment_ref = Some(event.payment_ref.clone());
                }
                state.payments.push(Payment {
                    payment_id: PaymentId::new(),
                    reservation_id: event.reservation_id,
                    amount,
                    status: PaymentStatus::Paid,
                    external_ref: event.payment_ref,
                });
                Ok(())
            }
            // 同一 payment_ref での再確定は成功扱いの no-op
            ReservationStatus::Confirmed
                if reservation.payment_ref.as_deref() == Some(event.payment_ref.as_str()) =>
            {
                Ok(())
            }
            _ => Err(AppError::NotPending(format!(
                "予約（{}）は PENDING ではないため確定できません。",
                event.reservation_id
            ))),
        }
    }

    async fn cancel(&self, event: CancelReservation) -> AppResult<()> {
        if event.reason.trim().is_empty() {
            return Err(AppError::ReasonRequired);
        }

        let mut state = self.store.lock();
        let Some(reservation) = state.reservations.get_mut(&event.reservation_id) else {
            return Err(AppError::EntityNotFound(format!(
                "予約（{}）が見つかりませんでした。",
                event.reservation_id
            )));
        };

        if event.actor_role != Role::Admin && reservation.reserved_by != Some(event.actor_id) {
            return Err(AppError::ForbiddenOperation);
        }

        match reservation.status {
            ReservationStatus::Pending | ReservationStatus::Confirmed => {
                reservation.status = ReservationStatus::Cancelled;
                reservation.reason = Some(event.reason);
                reservation.cancelled_at = Some(event.cancelled_at);
                Ok(())
            }
            _ => Err(AppError::NotCancellable(format!(
                "予約（{}）はキャンセルできない状態です。",
                event.reservation_id
            ))),
        }
    }

    async fn unblock(&self, event: UnblockSlot) -> AppResult<()> {
        if event.actor_role != Role::Admin {
            return Err(AppError::ForbiddenOperation);
        }

        let mut state = self.store.lock();
        match state.reservations.get(&event.reservation_id) {
            None => Err(AppError::EntityNotFound(format!(
                "予約（{}）が見つかりませんでした。",
                event.reservation_id
            ))),
            Some(reservation) if reservation.status != ReservationStatus::Blocked => {
                Err(AppError::NotCancellable(format!(
                    "予約（{}）はブロックではないため解除できません。",
                    event.reservation_id
                )))
            }
            Some(_) => {
                state.reservations.remove(&event.reservation_id);
                Ok(())
            }
        }
    }

    async fn find_by_id(&self, reservation_id: ReservationId) -> AppResult<Reservation> {
        self.store
            .lock()
            .reservations
            .get(&reservation_id)
            .cloned()
            .ok_or_else(|| {
                AppError::EntityNotFound(format!(
                    "予約（{reservation_id}）が見つかりませんでした。"
                ))
            })
    }

    async fn find_occupants(
        &self,
        facility_id: FacilityId,
        reserved_on: NaiveDate,
    ) -> AppResult<Vec<Occupant>> {
        let state = self.store.lock();
        let mut occupants: Vec<Occupant> = state
            .reservations
            .values()
            .filter(|r| {
                r.facility_id == facility_id
                    && r.reserved_on == reserved_on
                    && r.status.occupies_slot()
            })
            .map(|r| Occupant {
                start_time: r.start_time,
                status: r.status,
                reason: r.reason.clone(),
                reserved_by: r.reserved_by,
            })
            .collect();
        occupants.sort_by_key(|o| o.start_time);
        Ok(occupants)
    }

    async fn find_payment(&self, reservation_id: ReservationId) -> AppResult<Option<Payment>> {
        Ok(self
            .store
            .lock()
            .payments
            .iter()
            .find(|p| p.reservation_id == reservation_id)
            .cloned())
    }
}

fn ensure_facility_available(state: &StoreState, facility_id: FacilityId) -> AppResult<()> {
    match state.facilities.get(&facility_id) {
        None => Err(AppError::EntityNotFound(format!(
            "設備（{facility_id}）が見つかりませんでした。"
        ))),
        Some(facility) if !facility.is_active => Err(AppError::UnprocessableEntity(format!(
            "設備（{facility_id}）は現在利用できません。"
        ))),
        Some(_) => Ok(()),
    }
}

fn ensure_slot_free(
    state: &StoreState,
    facility_id: FacilityId,
    reserved_on: NaiveDate,
    start_time: chrono::NaiveTime,
) -> AppResult<()> {
    let taken = state.reservations.values().any(|r| {
        r.facility_id == facility_id
            && r.reserved_on == reserved_on
            && r.start_time == start_time
            && r.status.occupies_slot()
    });
    if taken {
        return Err(AppError::SlotConflict(format!(
            "設備（{facility_id}）の {reserved_on} {start_time} はすでに占有されています。"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveTime, TimeZone, Utc};
    use kernel::model::id::UserId;
    use kernel::model::schedule::{effective_rule, generate_slots, DayKey};
    use kernel::model::slot::{classify, SlotState};

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    // 2025-06-02 は月曜
    fn monday() -> NaiveDate {
        date(2025, 6, 2)
    }

    struct Fixture {
        store: Arc<InMemoryStore>,
        reservations: InMemoryReservationRepository,
        rules: InMemoryScheduleRuleRepository,
        venue_id: VenueId,
        facility_id: FacilityId,
        user_id: UserId,
    }

    fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let venue_id = VenueId::new();
        store.add_venue(
            Venue {
                venue_id,
                venue_name: "中央スポーツパーク".into(),
                timezone: "Asia/Tokyo".parse().unwrap(),
                address: "東京都中央区 1-2-3".into(),
            },
            (0..7)
                .map(|day_of_week| VenueSchedule {
                    venue_id,
                    day_of_week,
                    is_open: true,
                    opening_time: time(6, 0),
                    closing_time: time(23, 0),
                })
                .collect(),
            Vec::new(),
        );
        let facility_id = FacilityId::new();
        store.add_facility(Facility {
            facility_id,
            venue_id,
            facility_name: "テニスコート A".into(),
            price: 1500,
            cancellation_deadline_hours: 24,
            is_active: true,
        });
        // 月曜 08:00〜10:00、60 分枠のルールを適用済みの状態で投入する
        store.seed_rule(ScheduleRule {
            rule_id: RuleId::new(),
            facility_id,
            day_key: DayKey::Monday,
            opening_time: time(8, 0),
            closing_time: time(10, 0),
            slot_duration_minutes: 60,
            effective_from: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            is_delete: false,
        });
        Fixture {
            reservations: InMemoryReservationRepository::new(store.clone()),
            rules: InMemoryScheduleRuleRepository::new(store.clone()),
            store,
            venue_id,
            facility_id,
            user_id: UserId::new(),
        }
    }

    fn create_event(fx: &Fixture, start: NaiveTime) -> CreateReservation {
        let end = start.overflowing_add_signed(Duration::hours(1)).0;
        CreateReservation::new(fx.facility_id, fx.user_id, monday(), start, end, now())
    }

    #[tokio::test]
    async fn create_yields_pending_reservation() -> anyhow::Result<()> {
        let fx = fixture();
        let id = fx.reservations.create(create_event(&fx, time(8, 0))).await?;
        let reservation = fx.reservations.find_by_id(id).await?;
        assert_eq!(reservation.status, ReservationStatus::Pending);
        assert_eq!(reservation.reserved_by, Some(fx.user_id));
        assert!(reservation.payment_ref.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn second_create_for_same_slot_is_a_conflict() -> anyhow::Result<()> {
        let fx = fixture();
        fx.reservations.create(create_event(&fx, time(8, 0))).await?;
        let err = fx
            .reservations
            .create(create_event(&fx, time(8, 0)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SlotConflict(_)));
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_creates_yield_exactly_one_winner() -> anyhow::Result<()> {
        let fx = fixture();
        let repo = Arc::new(InMemoryReservationRepository::new(fx.store.clone()));

        let first = {
            let repo = repo.clone();
            let event = create_event(&fx, time(9, 0));
            tokio::spawn(async move { repo.create(event).await })
        };
        let second = {
            let repo = repo.clone();
            let event = create_event(&fx, time(9, 0));
            tokio::spawn(async move { repo.create(event).await })
        };
        let results = [first.await?, second.await?];

        let winners = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(AppError::SlotConflict(_))))
            .count();
        assert_eq!(winners, 1);
        assert_eq!(conflicts, 1);
        Ok(())
    }

    #[tokio::test]
    async fn cancel_frees_the_slot_immediately() -> anyhow::Result<()> {
        let fx = fixture();
        let id = fx.reservations.create(create_event(&fx, time(8, 0))).await?;
        assert_eq!(fx.reservations.find_occupants(fx.facility_id, monday()).await?.len(), 1);

        fx.reservations
            .cancel(CancelReservation::new(
                id,
                fx.user_id,
                Role::User,
                "予定が変わったため".into(),
                now(),
            ))
            .await?;

        // 占有射影から即座に消え、空き照会は Available へ戻る
        let occupants = fx.reservations.find_occupants(fx.facility_id, monday()).await?;
        assert!(occupants.is_empty());
        let versions = fx.rules.find_versions(fx.facility_id).await?;
        let rule = effective_rule(&versions, monday(), false, now()).unwrap();
        let slots = classify(&generate_slots(rule), rule.slot_duration_minutes, &occupants);
        assert!(slots.iter().all(|s| s.state == SlotState::Available));

        // キャンセル済みの行は履歴として残る
        let reservation = fx.reservations.find_by_id(id).await?;
        assert_eq!(reservation.status, ReservationStatus::Cancelled);
        assert_eq!(reservation.reason.as_deref(), Some("予定が変わったため"));
        Ok(())
    }

    #[tokio::test]
    async fn confirm_attaches_payment_once_and_is_idempotent() -> anyhow::Result<()> {
        let fx = fixture();
        let id = fx.reservations.create(create_event(&fx, time(8, 0))).await?;

        fx.reservations
            .confirm(ConfirmReservation::new(id, "pay_123".into()))
            .await?;
        // 決済コールバックの再送を想定した同一参照での再確定
        fx.reservations
            .confirm(ConfirmReservation::new(id, "pay_123".into()))
            .await?;

        let reservation = fx.reservations.find_by_id(id).await?;
        assert_eq!(reservation.status, ReservationStatus::Confirmed);
        let payment = fx.reservations.find_payment(id).await?.unwrap();
        assert_eq!(payment.amount, 1500);
        assert_eq!(payment.external_ref, "pay_123");
        // 決済記録は増えていない
        assert_eq!(fx.store.lock().payments.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn confirm_with_other_payment_ref_fails() -> anyhow::Result<()> {
        let fx = fixture();
        let id = fx.reservations.create(create_event(&fx, time(8, 0))).await?;
        fx.reservations
            .confirm(ConfirmReservation::new(id, "pay_123".into()))
            .await?;

        let err = fx
            .reservations
            .confirm(ConfirmReservation::new(id, "pay_456".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotPending(_)));
        Ok(())
    }

    #[tokio::test]
    async fn confirm_unknown_reservation_is_not_found() {
        let fx = fixture();
        let err = fx
            .reservations
            .confirm(ConfirmReservation::new(ReservationId::new(), "pay_123".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EntityNotFound(_)));
    }

    #[tokio::test]
    async fn cancel_requires_reason_and_ownership() -> anyhow::Result<()> {
        let fx = fixture();
        let id = fx.reservations.create(create_event(&fx, time(8, 0))).await?;

        let err = fx
            .reservations
            .cancel(CancelReservation::new(id, fx.user_id, Role::User, "  ".into(), now()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ReasonRequired));

        // 他の利用者はキャンセルできない
        let err = fx
            .reservations
            .cancel(CancelReservation::new(
                id,
                UserId::new(),
                Role::User,
                "身に覚えのない予約".into(),
                now(),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ForbiddenOperation));

        // 運営者はキャンセルできる
        fx.reservations
            .cancel(CancelReservation::new(
                id,
                UserId::new(),
                Role::Admin,
                "設備点検のため".into(),
                now(),
            ))
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn cancelled_reservation_is_terminal() -> anyhow::Result<()> {
        let fx = fixture();
        let id = fx.reservations.create(create_event(&fx, time(8, 0))).await?;
        fx.reservations
            .cancel(CancelReservation::new(id, fx.user_id, Role::User, "都合により".into(), now()))
            .await?;

        let err = fx
            .reservations
            .cancel(CancelReservation::new(id, fx.user_id, Role::User, "再度".into(), now()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotCancellable(_)));

        let err = fx
            .reservations
            .confirm(ConfirmReservation::new(id, "pay_123".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotPending(_)));
        Ok(())
    }

    #[tokio::test]
    async fn blocked_slot_surfaces_reason_in_availability() -> anyhow::Result<()> {
        let fx = fixture();
        fx.reservations
            .block(BlockSlot::new(
                fx.facility_id,
                monday(),
                time(9, 0),
                time(10, 0),
                "maintenance".into(),
                now(),
            ))
            .await?;

        let versions = fx.rules.find_versions(fx.facility_id).await?;
        let rule = effective_rule(&versions, monday(), false, now()).unwrap();
        let occupants = fx.reservations.find_occupants(fx.facility_id, monday()).await?;
        let slots = classify(&generate_slots(rule), rule.slot_duration_minutes, &occupants);

        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].start_time, time(8, 0));
        assert_eq!(slots[0].state, SlotState::Available);
        assert_eq!(slots[1].start_time, time(9, 0));
        assert_eq!(
            slots[1].state,
            SlotState::Blocked {
                reason: "maintenance".into()
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn block_requires_reason() {
        let fx = fixture();
        let err = fx
            .reservations
            .block(BlockSlot::new(
                fx.facility_id,
                monday(),
                time(9, 0),
                time(10, 0),
                "".into(),
                now(),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ReasonRequired));
    }

    #[tokio::test]
    async fn unblock_is_admin_only_and_removes_the_row() -> anyhow::Result<()> {
        let fx = fixture();
        let id = fx
            .reservations
            .block(BlockSlot::new(
                fx.facility_id,
                monday(),
                time(9, 0),
                time(10, 0),
                "maintenance".into(),
                now(),
            ))
            .await?;

        let err = fx
            .reservations
            .unblock(UnblockSlot::new(id, Role::User))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ForbiddenOperation));

        fx.reservations.unblock(UnblockSlot::new(id, Role::Admin)).await?;
        // 物理削除されるため参照も失敗する
        let err = fx.reservations.find_by_id(id).await.unwrap_err();
        assert!(matches!(err, AppError::EntityNotFound(_)));
        Ok(())
    }

    #[tokio::test]
    async fn unblock_rejects_non_blocked_rows() -> anyhow::Result<()> {
        let fx = fixture();
        let id = fx.reservations.create(create_event(&fx, time(8, 0))).await?;
        let err = fx
            .reservations
            .unblock(UnblockSlot::new(id, Role::Admin))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotCancellable(_)));
        Ok(())
    }

    #[tokio::test]
    async fn inactive_facility_rejects_new_reservations() -> anyhow::Result<()> {
        let fx = fixture();
        let inactive_id = FacilityId::new();
        fx.store.add_facility(Facility {
            facility_id: inactive_id,
            venue_id: fx.venue_id,
            facility_name: "休止中コート".into(),
            price: 1000,
            cancellation_deadline_hours: 0,
            is_active: false,
        });

        let err = fx
            .reservations
            .create(CreateReservation::new(
                inactive_id,
                fx.user_id,
                monday(),
                time(8, 0),
                time(9, 0),
                now(),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));
        Ok(())
    }

    #[tokio::test]
    async fn rule_change_takes_effect_after_propagation_window() -> anyhow::Result<()> {
        let fx = fixture();
        let effective_from = fx
            .rules
            .upsert(UpsertScheduleRule::new(
                fx.facility_id,
                DayKey::Monday,
                time(9, 0),
                time(12, 0),
                30,
                now(),
            ))
            .await?;
        assert_eq!(effective_from, now() + Duration::days(RULE_PROPAGATION_DAYS));

        let versions = fx.rules.find_versions(fx.facility_id).await?;

        // 窓の内側では既存ルールのまま
        let before = effective_from - Duration::seconds(1);
        let rule = effective_rule(&versions, monday(), false, before).unwrap();
        assert_eq!(rule.slot_duration_minutes, 60);

        // 境界以降は新ルールが見える
        let rule = effective_rule(&versions, monday(), false, effective_from).unwrap();
        assert_eq!(rule.slot_duration_minutes, 30);
        assert_eq!(generate_slots(rule).len(), 6);
        Ok(())
    }

    #[tokio::test]
    async fn rule_delete_is_a_tombstone_with_the_same_window() -> anyhow::Result<()> {
        let fx = fixture();
        let seeded = fx.rules.find_versions(fx.facility_id).await?;
        let rule_id = seeded[0].rule_id;

        let effective_from = fx
            .rules
            .delete(DeleteScheduleRule::new(rule_id, now()))
            .await?;

        let versions = fx.rules.find_versions(fx.facility_id).await?;
        // 窓の内側ではまだ生成される
        assert!(effective_rule(&versions, monday(), false, effective_from - Duration::seconds(1)).is_some());
        // 窓を越えると閉鎖扱い
        assert!(effective_rule(&versions, monday(), false, effective_from).is_none());
        Ok(())
    }

    #[tokio::test]
    async fn rule_write_validation_rejects_bad_windows() {
        let fx = fixture();

        let err = fx
            .rules
            .upsert(UpsertScheduleRule::new(
                fx.facility_id,
                DayKey::Monday,
                time(12, 0),
                time(9, 0),
                60,
                now(),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRange(_)));

        // 会場の営業開始（06:00）より早い窓は登録できない
        let err = fx
            .rules
            .upsert(UpsertScheduleRule::new(
                fx.facility_id,
                DayKey::Monday,
                time(5, 0),
                time(9, 0),
                60,
                now(),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::OutOfVenueHours(_)));
    }
}
