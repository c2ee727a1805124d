use axum::{routing::delete, Router};
use registry::AppRegistry;

use crate::handler::schedule::delete_schedule_rule;

pub fn build_schedule_rule_routers() -> Router<AppRegistry> {
    let schedule_routers = Router::new().route("/:rule_id", delete(delete_schedule_rule));

    Router::new().nest("/schedule-rules", schedule_routers)
}
