use axum::{
    routing::{delete, get, put},
    Router,
};
use registry::AppRegistry;

use crate::handler::reservation::{
    cancel_reservation, confirm_reservation, show_reservation, unblock_slot,
};

pub fn build_reservation_routers() -> Router<AppRegistry> {
    let reservation_routers = Router::new()
        .route("/:reservation_id", get(show_reservation))
        .route("/:reservation_id/confirm", put(confirm_reservation))
        .route("/:reservation_id/cancel", put(cancel_reservation))
        .route("/:reservation_id/block", delete(unblock_slot));

    Router::new().nest("/reservations", reservation_routers)
}
