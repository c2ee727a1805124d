use chrono::NaiveTime;
use chrono_tz::Tz;

use crate::model::id::VenueId;

#[derive(Debug, Clone)]
pub struct Venue {
    pub venue_id: VenueId,
    pub venue_name: String,
    // 会場配下の日時比較はすべてこのタイムゾーンの壁時計で行う
    pub timezone: Tz,
    pub address: String,
}

// 会場全体の曜日別営業時間。設備のルールはこの枠の上限を超えられず、
// is_open が false の曜日にはいかなるルールも登録できない。
#[derive(Debug, Clone)]
pub struct VenueSchedule {
    pub venue_id: VenueId,
    // 0 = 日曜 .. 6 = 土曜
    pub day_of_week: u8,
    pub is_open: bool,
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
}
