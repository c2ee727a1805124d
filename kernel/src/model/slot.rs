use chrono::{Duration, NaiveTime};

use crate::model::id::UserId;
use crate::model::reservation::{Occupant, ReservationStatus};

/// 空き照会 1 スロット分の分類結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState {
    Available,
    Blocked { reason: String },
    ReservedPending,
    // 占有者は運営者ビューでの管理キャンセルに使う。
    // 一般利用者への応答では DTO 変換時に落とす。
    ReservedConfirmed { reserved_by: Option<UserId> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub start_time: NaiveTime,
    // 名目上の終了時刻。最終スロットでは閉店時刻を超えることがある
    pub end_time: NaiveTime,
    pub state: SlotState,
}

/// 生成済みスロット列と占有情報を突き合わせ、スロットごとの状態を返す。
///
/// 突き合わせは開始時刻の完全一致のみ。粒度の異なる時間帯の部分的な
/// 重なりはこの層では衝突と見なさない（その正しさは書き込み時の
/// 競合チェックが担う）。読み込みのたびに再計算され、状態は持たない。
pub fn classify(
    starts: &[NaiveTime],
    slot_duration_minutes: i32,
    occupants: &[Occupant],
) -> Vec<Slot> {
    let step = Duration::minutes(slot_duration_minutes as i64);
    starts
        .iter()
        .map(|&start_time| {
            let (end_time, _) = start_time.overflowing_add_signed(step);
            let state = match occupants.iter().find(|o| o.start_time == start_time) {
                None => SlotState::Available,
                Some(occupant) => match occupant.status {
                    ReservationStatus::Blocked => SlotState::Blocked {
                        reason: occupant.reason.clone().unwrap_or_default(),
                    },
                    ReservationStatus::Pending => SlotState::ReservedPending,
                    ReservationStatus::Confirmed => SlotState::ReservedConfirmed {
                        reserved_by: occupant.reserved_by,
                    },
                    // 占有射影には現れない想定だが、現れても空き扱いにする
                    ReservationStatus::Cancelled => SlotState::Available,
                },
            };
            Slot {
                start_time,
                end_time,
                state,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn occupant(start: NaiveTime, status: ReservationStatus, reason: Option<&str>) -> Occupant {
        Occupant {
            start_time: start,
            status,
            reason: reason.map(Into::into),
            reserved_by: None,
        }
    }

    #[test]
    fn every_generated_slot_is_classified() {
        let starts = vec![time(8, 0), time(9, 0), time(10, 0)];
        let occupants = vec![occupant(time(9, 0), ReservationStatus::Pending, None)];
        let slots = classify(&starts, 60, &occupants);
        assert_eq!(slots.len(), starts.len());
        let available = slots
            .iter()
            .filter(|s| s.state == SlotState::Available)
            .count();
        let occupied = slots.len() - available;
        assert_eq!(available, 2);
        assert_eq!(occupied, 1);
    }

    #[test]
    fn blocked_slot_surfaces_reason() {
        let starts = vec![time(8, 0), time(9, 0)];
        let occupants = vec![occupant(
            time(9, 0),
            ReservationStatus::Blocked,
            Some("maintenance"),
        )];
        let slots = classify(&starts, 60, &occupants);
        assert_eq!(slots[0].state, SlotState::Available);
        assert_eq!(
            slots[1].state,
            SlotState::Blocked {
                reason: "maintenance".into()
            }
        );
    }

    #[test]
    fn match_is_exact_start_time_only() {
        // 9:30 開始の占有は 9:00 スロットとは突き合わせない
        let starts = vec![time(9, 0)];
        let occupants = vec![occupant(time(9, 30), ReservationStatus::Confirmed, None)];
        let slots = classify(&starts, 60, &occupants);
        assert_eq!(slots[0].state, SlotState::Available);
    }

    #[test]
    fn end_time_follows_slot_duration() {
        let slots = classify(&[time(9, 0)], 90, &[]);
        assert_eq!(slots[0].end_time, time(10, 30));
    }
}
