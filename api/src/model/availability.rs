use chrono::{NaiveDate, NaiveTime};
use kernel::model::id::{FacilityId, UserId};
use kernel::model::slot::{Slot, SlotState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlotStateName {
    Available,
    Blocked,
    ReservedPending,
    ReservedConfirmed,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotResponse {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub state: SlotStateName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_by: Option<UserId>,
}

impl SlotResponse {
    // 占有者の身元は運営者ビューにだけ出す
    fn from_slot(value: Slot, expose_occupant: bool) -> Self {
        let Slot {
            start_time,
            end_time,
            state,
        } = value;
        let (state, reason, reserved_by) = match state {
            SlotState::Available => (SlotStateName::Available, None, None),
            SlotState::Blocked { reason } => (SlotStateName::Blocked, Some(reason), None),
            SlotState::ReservedPending => (SlotStateName::ReservedPending, None, None),
            SlotState::ReservedConfirmed { reserved_by } => (
                SlotStateName::ReservedConfirmed,
                None,
                expose_occupant.then_some(reserved_by).flatten(),
            ),
        };
        Self {
            start_time,
            end_time,
            state,
            reason,
            reserved_by,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub facility_id: FacilityId,
    pub date: NaiveDate,
    pub slots: Vec<SlotResponse>,
}

impl AvailabilityResponse {
    pub fn new(
        facility_id: FacilityId,
        date: NaiveDate,
        slots: Vec<Slot>,
        expose_occupant: bool,
    ) -> Self {
        Self {
            facility_id,
            date,
            slots: slots
                .into_iter()
                .map(|s| SlotResponse::from_slot(s, expose_occupant))
                .collect(),
        }
    }
}
