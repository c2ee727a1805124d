use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use shared::error::{AppError, AppResult};
use strum::{Display, EnumString};

use crate::model::id::{FacilityId, RuleId};
use crate::model::venue::VenueSchedule;

pub mod event;

// ルール変更が枠生成へ反映されるまでの猶予日数。
// この窓の内側の日付は、変更前のルールで取られた予約を守るため
// 旧バージョンのままで生成される。
pub const RULE_PROPAGATION_DAYS: i64 = 7;

/// ルールが適用される日の種別。具体的な曜日指定は All を、
/// 祝日には Holiday 指定が曜日指定を覆い隠す。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum DayKey {
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

impl DayKey {
    pub fn from_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => Self::Monday,
            Weekday::Tue => Self::Tuesday,
            Weekday::Wed => Self::Wednesday,
            Weekday::Thu => Self::Thursday,
            Weekday::Fri => Self::Friday,
            Weekday::Sat => Self::Saturday,
            Weekday::Sun => Self::Sunday,
        }
    }

    /// 会場スケジュールの曜日番号（0 = 日曜）。Holiday / All は特定の曜日を持たない。
    pub fn day_of_week(self) -> Option<u8> {
        match self {
            Self::Sunday => Some(0),
            Self::Monday => Some(1),
            Self::Tuesday => Some(2),
            Self::Wednesday => Some(3),
            Self::Thursday => Some(4),
            Self::Friday => Some(5),
            Self::Saturday => Some(6),
            Self::Holiday | Self::All => None,
        }
    }
}

// スケジュールルールの履歴 1 バージョン分。更新は常に新バージョンの追記で、
// 既存行を書き換えることはない。削除も is_delete を立てた墓標バージョンとして
// 追記される。
#[derive(Debug, Clone)]
pub struct ScheduleRule {
    pub rule_id: RuleId,
    pub facility_id: FacilityId,
    pub day_key: DayKey,
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
    pub slot_duration_minutes: i32,
    pub effective_from: DateTime<Utc>,
    pub is_delete: bool,
}

/// (設備, 日付) に対して生成時点 as_of で有効なルールをひとつに解決する。
///
/// day_key ごとに effective_from <= as_of の最新バージョンを採り、
/// 祝日なら Holiday、次に具体的な曜日、最後に All の順で引き当てる。
/// 墓標バージョンが最新ならその day_key は空き扱いとなり、次の候補へ落ちる。
/// 曜日・祝日の判定はここだけが行う。
pub fn effective_rule(
    versions: &[ScheduleRule],
    date: NaiveDate,
    is_holiday: bool,
    as_of: DateTime<Utc>,
) -> Option<&ScheduleRule> {
    let latest = |key: DayKey| {
        versions
            .iter()
            .filter(|r| r.day_key == key && r.effective_from <= as_of)
            .max_by_key(|r| r.effective_from)
            .filter(|r| !r.is_delete)
    };

    if is_holiday {
        if let Some(rule) = latest(DayKey::Holiday) {
            return Some(rule);
        }
    }
    latest(DayKey::from_weekday(date.weekday())).or_else(|| latest(DayKey::All))
}

/// 一覧表示用に、as_of 時点で有効な最新バージョンを day_key ごと 1 件に畳む。
pub fn current_rules(versions: &[ScheduleRule], as_of: DateTime<Utc>) -> Vec<&ScheduleRule> {
    let mut latest: BTreeMap<DayKey, &ScheduleRule> = BTreeMap::new();
    for rule in versions.iter().filter(|r| r.effective_from <= as_of) {
        latest
            .entry(rule.day_key)
            .and_modify(|current| {
                if rule.effective_from >= current.effective_from {
                    *current = rule;
                }
            })
            .or_insert(rule);
    }
    latest.into_values().filter(|r| !r.is_delete).collect()
}

/// 開店時刻から閉店時刻まで slot_duration 刻みで歩き、
/// 開始が閉店より手前のスロットの開始時刻だけを昇順で返す。
///
/// 枠の長さが窓を割り切らない場合、最後のスロットの名目上の終了は
/// 閉店時刻を超えうる。既存予約と価格がこのスロット集合そのものに
/// 依存しているため、丸めずにこの挙動を維持する。
pub fn generate_slots(rule: &ScheduleRule) -> Vec<NaiveTime> {
    if rule.slot_duration_minutes <= 0 {
        return Vec::new();
    }
    let step = Duration::minutes(rule.slot_duration_minutes as i64);
    let mut slots = Vec::new();
    let mut cursor = rule.opening_time;
    while cursor < rule.closing_time {
        slots.push(cursor);
        let (next, wrapped) = cursor.overflowing_add_signed(step);
        if wrapped != 0 {
            // 日付を跨いだら打ち切る
            break;
        }
        cursor = next;
    }
    slots
}

/// ルール書き込み前の検証。
///
/// 開始 >= 終了や非正の枠長は InvalidRange。会場の営業時間から
/// はみ出す窓、休業日の曜日への登録は OutOfVenueHours。
/// 会場スケジュールに行がない曜日は休業扱いとする。
/// All / Holiday は適用されうるすべての営業日の枠に収まる必要がある。
pub fn validate_rule_window(
    day_key: DayKey,
    opening_time: NaiveTime,
    closing_time: NaiveTime,
    slot_duration_minutes: i32,
    venue_schedules: &[VenueSchedule],
) -> AppResult<()> {
    if opening_time >= closing_time {
        return Err(AppError::InvalidRange(format!(
            "開始時刻（{opening_time}）は終了時刻（{closing_time}）より前である必要があります。"
        )));
    }
    if slot_duration_minutes <= 0 {
        return Err(AppError::InvalidRange(
            "スロットの長さは 1 分以上である必要があります。".into(),
        ));
    }

    let window_of = |day_of_week: u8| {
        venue_schedules
            .iter()
            .find(|s| s.day_of_week == day_of_week)
            .filter(|s| s.is_open)
    };
    let fits = |schedule: &VenueSchedule| {
        opening_time >= schedule.opening_time && closing_time <= schedule.closing_time
    };

    match day_key.day_of_week() {
        Some(day_of_week) => {
            let Some(schedule) = window_of(day_of_week) else {
                return Err(AppError::OutOfVenueHours(
                    "会場の休業日にはルールを登録できません。".into(),
                ));
            };
            if !fits(schedule) {
                return Err(AppError::OutOfVenueHours(format!(
                    "指定の時間帯（{opening_time}〜{closing_time}）は会場の営業時間の外です。"
                )));
            }
        }
        // All と Holiday はどの営業日にも展開されうるため、
        // すべての営業日の枠に収まることを課す
        None => {
            let open_days: Vec<&VenueSchedule> =
                venue_schedules.iter().filter(|s| s.is_open).collect();
            if open_days.is_empty() {
                return Err(AppError::OutOfVenueHours(
                    "営業日のない会場にはルールを登録できません。".into(),
                ));
            }
            for schedule in open_days {
                if !fits(schedule) {
                    return Err(AppError::OutOfVenueHours(format!(
                        "指定の時間帯（{opening_time}〜{closing_time}）は会場の営業時間の外です。"
                    )));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn rule(day_key: DayKey, open: NaiveTime, close: NaiveTime, minutes: i32) -> ScheduleRule {
        ScheduleRule {
            rule_id: RuleId::new(),
            facility_id: FacilityId::new(),
            day_key,
            opening_time: open,
            closing_time: close,
            slot_duration_minutes: minutes,
            effective_from: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            is_delete: false,
        }
    }

    fn venue_schedule(day_of_week: u8, is_open: bool, open: NaiveTime, close: NaiveTime) -> VenueSchedule {
        VenueSchedule {
            venue_id: crate::model::id::VenueId::new(),
            day_of_week,
            is_open,
            opening_time: open,
            closing_time: close,
        }
    }

    // 2025-06-02 は月曜
    const MONDAY: (i32, u32, u32) = (2025, 6, 2);

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(MONDAY.0, MONDAY.1, MONDAY.2).unwrap()
    }

    #[test]
    fn monday_rule_yields_hourly_slots() {
        let r = rule(DayKey::Monday, time(8, 0), time(10, 0), 60);
        assert_eq!(generate_slots(&r), vec![time(8, 0), time(9, 0)]);
    }

    #[test]
    fn slots_are_strictly_increasing_and_deterministic() {
        let r = rule(DayKey::All, time(9, 0), time(17, 0), 45);
        let first = generate_slots(&r);
        let second = generate_slots(&r);
        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn trailing_partial_slot_is_kept_when_start_is_before_close() {
        // 90 分の窓に 60 分枠。最後のスロットは 10:00 開始で
        // 名目上の終了 11:00 は閉店 10:30 を超えるが、そのまま出す。
        let r = rule(DayKey::Monday, time(9, 0), time(10, 30), 60);
        assert_eq!(generate_slots(&r), vec![time(9, 0), time(10, 0)]);
    }

    #[test]
    fn non_positive_duration_yields_no_slots() {
        let r = rule(DayKey::Monday, time(9, 0), time(10, 0), 0);
        assert!(generate_slots(&r).is_empty());
    }

    #[test]
    fn slot_walk_stops_at_midnight_wrap() {
        let r = rule(DayKey::Monday, time(23, 0), time(23, 59), 90);
        assert_eq!(generate_slots(&r), vec![time(23, 0)]);
    }

    #[test]
    fn no_rule_for_date_means_closed() {
        let versions = vec![rule(DayKey::Tuesday, time(8, 0), time(10, 0), 60)];
        let as_of = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        assert!(effective_rule(&versions, monday(), false, as_of).is_none());
    }

    #[test]
    fn specific_day_rule_shadows_all_rule() {
        let versions = vec![
            rule(DayKey::All, time(8, 0), time(20, 0), 60),
            rule(DayKey::Monday, time(10, 0), time(12, 0), 30),
        ];
        let as_of = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let resolved = effective_rule(&versions, monday(), false, as_of).unwrap();
        assert_eq!(resolved.day_key, DayKey::Monday);
    }

    #[test]
    fn holiday_rule_shadows_weekday_on_holidays() {
        let versions = vec![
            rule(DayKey::Monday, time(8, 0), time(20, 0), 60),
            rule(DayKey::Holiday, time(10, 0), time(15, 0), 60),
        ];
        let as_of = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let resolved = effective_rule(&versions, monday(), true, as_of).unwrap();
        assert_eq!(resolved.day_key, DayKey::Holiday);
        // 祝日ルールが無い日はそのまま曜日解決へ落ちる
        let weekday_only = vec![rule(DayKey::Monday, time(8, 0), time(20, 0), 60)];
        let resolved = effective_rule(&weekday_only, monday(), true, as_of).unwrap();
        assert_eq!(resolved.day_key, DayKey::Monday);
    }

    #[test]
    fn rule_change_is_invisible_before_effective_from() {
        let submitted_at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let mut old = rule(DayKey::Monday, time(8, 0), time(10, 0), 60);
        old.effective_from = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut new = rule(DayKey::Monday, time(9, 0), time(18, 0), 30);
        new.effective_from = submitted_at + Duration::days(RULE_PROPAGATION_DAYS);
        let versions = vec![old, new];

        // 猶予窓の内側では旧ルールのまま
        let before = submitted_at + Duration::days(RULE_PROPAGATION_DAYS) - Duration::seconds(1);
        let resolved = effective_rule(&versions, monday(), false, before).unwrap();
        assert_eq!(resolved.slot_duration_minutes, 60);

        // 境界ちょうどから新ルールが見える
        let at_boundary = submitted_at + Duration::days(RULE_PROPAGATION_DAYS);
        let resolved = effective_rule(&versions, monday(), false, at_boundary).unwrap();
        assert_eq!(resolved.slot_duration_minutes, 30);
    }

    #[test]
    fn tombstone_blanks_day_and_falls_back_to_all() {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let all = rule(DayKey::All, time(8, 0), time(20, 0), 60);
        let mut monday_rule = rule(DayKey::Monday, time(10, 0), time(12, 0), 30);
        monday_rule.effective_from = base;
        let mut tombstone = rule(DayKey::Monday, time(10, 0), time(12, 0), 30);
        tombstone.effective_from = base + Duration::days(30);
        tombstone.is_delete = true;
        let versions = vec![all, monday_rule, tombstone];

        let as_of = base + Duration::days(60);
        let resolved = effective_rule(&versions, monday(), false, as_of).unwrap();
        assert_eq!(resolved.day_key, DayKey::All);
    }

    #[test]
    fn current_rules_keeps_latest_version_per_day_key() {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut v1 = rule(DayKey::Monday, time(8, 0), time(10, 0), 60);
        v1.effective_from = base;
        let mut v2 = rule(DayKey::Monday, time(9, 0), time(12, 0), 60);
        v2.effective_from = base + Duration::days(10);
        let all = rule(DayKey::All, time(8, 0), time(20, 0), 60);
        let versions = vec![v1, v2, all];

        let resolved = current_rules(&versions, base + Duration::days(20));
        assert_eq!(resolved.len(), 2);
        let monday_rule = resolved.iter().find(|r| r.day_key == DayKey::Monday).unwrap();
        assert_eq!(monday_rule.opening_time, time(9, 0));
    }

    #[test]
    fn rejects_inverted_window() {
        let schedules = vec![venue_schedule(1, true, time(6, 0), time(22, 0))];
        let err = validate_rule_window(DayKey::Monday, time(10, 0), time(9, 0), 60, &schedules)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRange(_)));
    }

    #[test]
    fn rejects_window_outside_venue_hours() {
        let schedules = vec![venue_schedule(1, true, time(9, 0), time(18, 0))];
        let err = validate_rule_window(DayKey::Monday, time(8, 0), time(12, 0), 60, &schedules)
            .unwrap_err();
        assert!(matches!(err, AppError::OutOfVenueHours(_)));
    }

    #[test]
    fn rejects_rule_on_closed_day() {
        let schedules = vec![venue_schedule(1, false, time(9, 0), time(18, 0))];
        let err = validate_rule_window(DayKey::Monday, time(10, 0), time(12, 0), 60, &schedules)
            .unwrap_err();
        assert!(matches!(err, AppError::OutOfVenueHours(_)));
    }

    #[test]
    fn all_rule_must_fit_every_open_day() {
        let schedules = vec![
            venue_schedule(1, true, time(8, 0), time(22, 0)),
            venue_schedule(2, true, time(10, 0), time(18, 0)),
            venue_schedule(3, false, time(0, 0), time(0, 0)),
        ];
        // 火曜の枠（10:00〜18:00）からはみ出すため不可
        let err = validate_rule_window(DayKey::All, time(9, 0), time(17, 0), 60, &schedules)
            .unwrap_err();
        assert!(matches!(err, AppError::OutOfVenueHours(_)));
        // 共通部分に収まる窓は通る
        validate_rule_window(DayKey::All, time(10, 0), time(17, 0), 60, &schedules).unwrap();
    }
}
