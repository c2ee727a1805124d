use kernel::model::facility::Facility;
use kernel::model::id::{FacilityId, VenueId};
use serde::{Deserialize, Serialize};

use crate::model::schedule::ScheduleRuleResponse;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityListQuery {
    pub location_id: Option<VenueId>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilitiesResponse {
    pub items: Vec<FacilityResponse>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityResponse {
    pub facility_id: FacilityId,
    pub venue_id: VenueId,
    pub facility_name: String,
    pub price: i32,
    pub cancellation_deadline_hours: i32,
    pub is_active: bool,
    pub rules: Vec<ScheduleRuleResponse>,
}

impl FacilityResponse {
    pub fn new(facility: Facility, rules: Vec<ScheduleRuleResponse>) -> Self {
        let Facility {
            facility_id,
            venue_id,
            facility_name,
            price,
            cancellation_deadline_hours,
            is_active,
        } = facility;
        Self {
            facility_id,
            venue_id,
            facility_name,
            price,
            cancellation_deadline_hours,
            is_active,
            rules,
        }
    }
}
