use kernel::model::facility::Facility;
use kernel::model::id::{FacilityId, VenueId};

#[derive(sqlx::FromRow)]
pub struct FacilityRow {
    pub facility_id: FacilityId,
    pub venue_id: VenueId,
    pub facility_name: String,
    pub price: i32,
    pub cancellation_deadline_hours: i32,
    pub is_active: bool,
}

impl From<FacilityRow> for Facility {
    fn from(value: FacilityRow) -> Self {
        let FacilityRow {
            facility_id,
            venue_id,
            facility_name,
            price,
            cancellation_deadline_hours,
            is_active,
        } = value;
        Facility {
            facility_id,
            venue_id,
            facility_name,
            price,
            cancellation_deadline_hours,
            is_active,
        }
    }
}
