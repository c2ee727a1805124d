use axum::Router;
use registry::AppRegistry;

use super::{
    facility::build_facility_routers, health::build_health_check_routers,
    reservation::build_reservation_routers, schedule::build_schedule_rule_routers,
};

pub fn routes() -> Router<AppRegistry> {
    let router = Router::new()
        .merge(build_health_check_routers())
        .merge(build_facility_routers())
        .merge(build_reservation_routers())
        .merge(build_schedule_rule_routers());
    Router::new().nest("/api/v1", router)
}
