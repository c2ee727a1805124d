use chrono::NaiveTime;
use chrono_tz::Tz;
use kernel::model::id::VenueId;
use kernel::model::venue::{Venue, VenueSchedule};
use shared::error::AppError;

#[derive(sqlx::FromRow)]
pub struct VenueRow {
    pub venue_id: VenueId,
    pub venue_name: String,
    pub timezone: String,
    pub address: String,
}

impl TryFrom<VenueRow> for Venue {
    type Error = AppError;

    fn try_from(value: VenueRow) -> Result<Self, Self::Error> {
        let VenueRow {
            venue_id,
            venue_name,
            timezone,
            address,
        } = value;
        // タイムゾーンは IANA 名で永続化されている
        let timezone = timezone
            .parse::<Tz>()
            .map_err(|e| AppError::ConversionEntityError(e.to_string()))?;
        Ok(Venue {
            venue_id,
            venue_name,
            timezone,
            address,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct VenueScheduleRow {
    pub venue_id: VenueId,
    pub day_of_week: i16,
    pub is_open: bool,
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
}

impl From<VenueScheduleRow> for VenueSchedule {
    fn from(value: VenueScheduleRow) -> Self {
        let VenueScheduleRow {
            venue_id,
            day_of_week,
            is_open,
            opening_time,
            closing_time,
        } = value;
        VenueSchedule {
            venue_id,
            day_of_week: day_of_week as u8,
            is_open,
            opening_time,
            closing_time,
        }
    }
}
