use axum::{
    routing::{get, post, put},
    Router,
};
use registry::AppRegistry;

use crate::handler::availability::query_availability;
use crate::handler::facility::show_facility_list;
use crate::handler::reservation::{block_slot, reserve_slot};
use crate::handler::schedule::upsert_schedule_rule;

pub fn build_facility_routers() -> Router<AppRegistry> {
    let facility_routers = Router::new()
        .route("/", get(show_facility_list))
        .route("/:facility_id/availability", get(query_availability))
        .route("/:facility_id/reservations", post(reserve_slot))
        .route("/:facility_id/blocks", post(block_slot))
        .route("/:facility_id/schedule-rules", put(upsert_schedule_rule));

    Router::new().nest("/facilities", facility_routers)
}
